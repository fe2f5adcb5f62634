//! Schema creation
//!
//! Every statement is idempotent, so `run` is safe on each startup.

use sqlx::PgPool;

use super::repos::DbError;

const SCHEMA: &[(&str, &str)] = &[
    (
        "players",
        r#"
        CREATE TABLE IF NOT EXISTS players (
            player_id BIGSERIAL PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            membership_tier TEXT NOT NULL DEFAULT 'basic',
            subscription_status TEXT NOT NULL DEFAULT 'free',
            early_access_code TEXT,
            timezone TEXT NOT NULL DEFAULT 'UTC',
            x_url TEXT,
            tiktok_url TEXT,
            website_url TEXT,
            notification_preferences JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "player_stats",
        r#"
        CREATE TABLE IF NOT EXISTS player_stats (
            player_id BIGINT PRIMARY KEY REFERENCES players(player_id) ON DELETE CASCADE,
            total_makes INTEGER NOT NULL DEFAULT 0,
            total_misses INTEGER NOT NULL DEFAULT 0,
            total_putts INTEGER NOT NULL DEFAULT 0,
            best_streak INTEGER NOT NULL DEFAULT 0,
            fastest_21_makes DOUBLE PRECISION,
            total_duration DOUBLE PRECISION NOT NULL DEFAULT 0,
            sessions_played INTEGER NOT NULL DEFAULT 0,
            last_updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "sessions",
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            session_id BIGSERIAL PRIMARY KEY,
            player_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'completed')),
            start_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            end_time TIMESTAMPTZ,
            total_putts INTEGER NOT NULL DEFAULT 0,
            total_makes INTEGER NOT NULL DEFAULT 0,
            total_misses INTEGER NOT NULL DEFAULT 0,
            best_streak INTEGER NOT NULL DEFAULT 0,
            fastest_21_makes DOUBLE PRECISION,
            most_makes_in_60_seconds INTEGER,
            putts_per_minute DOUBLE PRECISION NOT NULL DEFAULT 0,
            makes_per_minute DOUBLE PRECISION NOT NULL DEFAULT 0,
            session_duration DOUBLE PRECISION NOT NULL DEFAULT 0,
            makes_by_category JSONB,
            misses_by_category JSONB,
            client_session_id TEXT,
            putt_list JSONB,
            CHECK (total_putts = total_makes + total_misses),
            CHECK (best_streak <= total_makes)
        )
        "#,
    ),
    (
        "sessions_player_start_idx",
        "CREATE INDEX IF NOT EXISTS sessions_player_start_idx ON sessions (player_id, start_time DESC)",
    ),
    (
        "sessions_client_session_idx",
        "CREATE UNIQUE INDEX IF NOT EXISTS sessions_client_session_idx \
         ON sessions (player_id, client_session_id) WHERE client_session_id IS NOT NULL",
    ),
    (
        "calibrations",
        r#"
        CREATE TABLE IF NOT EXISTS calibrations (
            player_id BIGINT PRIMARY KEY REFERENCES players(player_id) ON DELETE CASCADE,
            is_calibrated BOOLEAN NOT NULL DEFAULT FALSE,
            calibration_date TIMESTAMPTZ,
            camera_index INTEGER,
            roi_coordinates JSONB,
            calibration_quality TEXT,
            notes TEXT,
            desktop_connected BOOLEAN NOT NULL DEFAULT FALSE,
            last_updated TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "duels",
        r#"
        CREATE TABLE IF NOT EXISTS duels (
            duel_id BIGSERIAL PRIMARY KEY,
            creator_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            invited_player_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'pending',
            session_duration_limit_minutes INTEGER NOT NULL,
            invitation_expiry_minutes INTEGER NOT NULL,
            invitation_expires_at TIMESTAMPTZ NOT NULL,
            creator_session_id BIGINT REFERENCES sessions(session_id) ON DELETE SET NULL,
            invited_session_id BIGINT REFERENCES sessions(session_id) ON DELETE SET NULL,
            creator_score INTEGER,
            invited_score INTEGER,
            winner_id BIGINT REFERENCES players(player_id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            completed_at TIMESTAMPTZ,
            CHECK (creator_id <> invited_player_id),
            CHECK (winner_id IS NULL OR winner_id IN (creator_id, invited_player_id))
        )
        "#,
    ),
    (
        "leagues",
        r#"
        CREATE TABLE IF NOT EXISTS leagues (
            league_id BIGSERIAL PRIMARY KEY,
            creator_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            privacy_type TEXT NOT NULL DEFAULT 'private',
            status TEXT NOT NULL DEFAULT 'registering',
            settings JSONB NOT NULL,
            start_time TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "league_members",
        r#"
        CREATE TABLE IF NOT EXISTS league_members (
            league_id BIGINT NOT NULL REFERENCES leagues(league_id) ON DELETE CASCADE,
            player_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'invited')),
            invited_by BIGINT REFERENCES players(player_id) ON DELETE SET NULL,
            joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (league_id, player_id)
        )
        "#,
    ),
    (
        "league_rounds",
        r#"
        CREATE TABLE IF NOT EXISTS league_rounds (
            round_id BIGSERIAL PRIMARY KEY,
            league_id BIGINT NOT NULL REFERENCES leagues(league_id) ON DELETE CASCADE,
            round_number INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            start_time TIMESTAMPTZ NOT NULL,
            end_time TIMESTAMPTZ NOT NULL,
            UNIQUE (league_id, round_number),
            CHECK (end_time > start_time)
        )
        "#,
    ),
    (
        "league_round_submissions",
        r#"
        CREATE TABLE IF NOT EXISTS league_round_submissions (
            submission_id BIGSERIAL PRIMARY KEY,
            round_id BIGINT NOT NULL REFERENCES league_rounds(round_id) ON DELETE CASCADE,
            player_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            session_id BIGINT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
            score INTEGER NOT NULL,
            points_awarded INTEGER,
            submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (round_id, player_id)
        )
        "#,
    ),
    (
        "fundraisers",
        r#"
        CREATE TABLE IF NOT EXISTS fundraisers (
            fundraiser_id BIGSERIAL PRIMARY KEY,
            creator_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            charity_name TEXT NOT NULL,
            charity_wallet_address TEXT,
            target_amount DOUBLE PRECISION,
            sat_per_putt BIGINT,
            start_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            end_date TIMESTAMPTZ,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CHECK (end_date IS NULL OR end_date > start_date)
        )
        "#,
    ),
    (
        "pledges",
        r#"
        CREATE TABLE IF NOT EXISTS pledges (
            pledge_id BIGSERIAL PRIMARY KEY,
            fundraiser_id BIGINT NOT NULL REFERENCES fundraisers(fundraiser_id) ON DELETE CASCADE,
            pledger_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            amount_per_putt DOUBLE PRECISION NOT NULL CHECK (amount_per_putt > 0),
            max_amount DOUBLE PRECISION CHECK (max_amount IS NULL OR max_amount > 0),
            status TEXT NOT NULL DEFAULT 'active',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "notifications",
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id BIGSERIAL PRIMARY KEY,
            player_id BIGINT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            link_path TEXT,
            details JSONB,
            read_status BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "notifications_player_idx",
        "CREATE INDEX IF NOT EXISTS notifications_player_idx ON notifications (player_id, created_at DESC)",
    ),
    (
        "desktop_heartbeats",
        r#"
        CREATE TABLE IF NOT EXISTS desktop_heartbeats (
            player_id BIGINT PRIMARY KEY REFERENCES players(player_id) ON DELETE CASCADE,
            desktop_version TEXT,
            capabilities JSONB,
            last_ping TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

/// Create all tables and indexes.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running migrations...");

    for (name, sql) in SCHEMA {
        tracing::debug!(object = name, "applying");
        sqlx::query(sql).execute(pool).await?;
    }

    tracing::info!(objects = SCHEMA.len(), "Migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_precede_their_references() {
        let position = |name: &str| SCHEMA.iter().position(|(n, _)| *n == name).unwrap();
        assert!(position("players") < position("sessions"));
        assert!(position("sessions") < position("sessions_client_session_idx"));
        assert!(position("sessions") < position("duels"));
        assert!(position("league_rounds") < position("league_round_submissions"));
        assert!(position("fundraisers") < position("pledges"));
    }

    #[test]
    fn every_statement_is_idempotent() {
        for (name, sql) in SCHEMA {
            assert!(sql.contains("IF NOT EXISTS"), "{name} is not idempotent");
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn run_twice() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");
    }
}
