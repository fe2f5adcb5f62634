//! End-to-end API flows against a real database.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p proofputt-server -- --ignored

use std::sync::atomic::{AtomicU32, Ordering};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use proofputt_server::db::migrations;
use proofputt_server::{build_router, create_pool, AppState, ServerConfig};

static SEQ: AtomicU32 = AtomicU32::new(0);

async fn setup() -> (Router, PgPool) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = create_pool(&url).await.expect("pool creation failed");
    migrations::run(&pool).await.expect("migrations failed");

    let config = ServerConfig::default();
    let app = build_router(AppState::new(pool.clone(), &config), config.request_timeout);
    (app, pool)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn unique_email(tag: &str) -> String {
    format!(
        "{tag}-{}-{}@example.com",
        Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

async fn register(app: &Router, name: &str) -> i64 {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/register",
        Some(json!({"name": name, "email": unique_email(name), "password": "putt-putt-42"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["player_id"].as_i64().unwrap()
}

async fn calibrate(app: &Router, player_id: i64) {
    let (status, body) = call(
        app,
        Method::POST,
        &format!("/api/player/{player_id}/calibration"),
        Some(json!({
            "is_calibrated": true,
            "roi_coordinates": {"x": 0, "y": 0, "width": 10, "height": 10}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

/// Start and finish a session with the given makes, returning its id.
async fn play_session(app: &Router, player_id: i64, makes: u32, misses: u32) -> i64 {
    let (status, started) = call(
        app,
        Method::POST,
        "/api/sessions",
        Some(json!({"player_id": player_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{started}");
    let session_id = started["session_id"].as_i64().unwrap();

    let (status, finished) = call(
        app,
        Method::PUT,
        "/api/sessions",
        Some(json!({
            "session_id": session_id,
            "player_id": player_id,
            "total_makes": makes,
            "total_misses": misses,
            "best_streak": makes.min(3),
            "session_duration": 120.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{finished}");
    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["total_putts"], makes + misses);
    session_id
}

async fn calibration_rows(pool: &PgPool, player_id: i64) -> i64 {
    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM calibrations WHERE player_id = $1")
        .bind(player_id)
        .fetch_one(pool)
        .await
        .unwrap();
    rows
}

#[tokio::test]
#[ignore = "requires database"]
async fn calibration_upsert_keeps_one_row_and_round_trips() {
    let (app, pool) = setup().await;
    let player_id = register(&app, "cal").await;

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/player/{player_id}/calibration"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_calibrated"], false);
    assert!(body["notes"].as_str().unwrap().starts_with("No calibration found"));

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/player/{player_id}/calibration"),
        Some(json!({"is_calibrated": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calibration_rows(&pool, player_id).await, 0);

    let roi = json!({"x": 0, "y": 0, "width": 10, "height": 10});
    for method in [Method::POST, Method::PUT] {
        let (status, body) = call(
            &app,
            method,
            &format!("/api/player/{player_id}/calibration"),
            Some(json!({"is_calibrated": true, "roi_coordinates": roi})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], true);
        assert_eq!(body["roi_coordinates"], roi);
        assert_eq!(body["calibration_quality"], "unknown");
    }

    assert_eq!(calibration_rows(&pool, player_id).await, 1);

    // A rejected update leaves the stored calibration alone.
    for method in [Method::POST, Method::PUT] {
        let (status, _) = call(
            &app,
            method,
            &format!("/api/player/{player_id}/calibration"),
            Some(json!({"is_calibrated": true, "notes": "moved the camera"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert_eq!(calibration_rows(&pool, player_id).await, 1);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/player/{player_id}/calibration"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_calibrated"], true);
    assert_eq!(body["roi_coordinates"], roi);
    assert_ne!(body["notes"], "moved the camera");

    let (_, data) = call(&app, Method::GET, &format!("/api/player/{player_id}/data"), None).await;
    assert_eq!(data["calibration_data"]["roi_coordinates"], roi);
}

#[tokio::test]
#[ignore = "requires database"]
async fn unknown_player_is_404() {
    let (app, _pool) = setup().await;
    let (status, body) = call(&app, Method::GET, "/api/player/999999999/data", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "player '999999999' not found");
}

#[tokio::test]
#[ignore = "requires database"]
async fn register_then_login() {
    let (app, _pool) = setup().await;
    let email = unique_email("login");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/register",
        Some(json!({"name": "Lin", "email": email.to_uppercase(), "password": "12345678", "early_access_code": "early"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["is_new_user"], true);
    assert_eq!(body["email"], email);
    assert_eq!(body["membership_tier"], "premium");
    assert_eq!(body["stats"]["total_putts"], 0);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/register",
        Some(json!({"name": "Lin again", "email": email, "password": "12345678"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"email": email, "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"email": email.to_uppercase(), "password": "12345678"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_new_user"], false);
}

#[tokio::test]
#[ignore = "requires database"]
async fn sessions_need_calibration_and_lock_for_free_players() {
    let (app, _pool) = setup().await;
    let player_id = register(&app, "sess").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/sessions",
        Some(json!({"player_id": player_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    calibrate(&app, player_id).await;
    let first = play_session(&app, player_id, 8, 2).await;
    play_session(&app, player_id, 5, 5).await;

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/sessions",
        Some(json!({"session_id": first, "player_id": player_id, "total_makes": 1, "total_misses": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, data) = call(&app, Method::GET, &format!("/api/player/{player_id}/data"), None).await;
    assert_eq!(data["stats"]["total_makes"], 13);
    assert_eq!(data["stats"]["total_putts"], 20);
    assert_eq!(data["stats"]["sessions_played"], 2);
    let sessions = data["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["is_locked"], false);
    assert_eq!(sessions[1]["is_locked"], true);

    let (status, page) = call(
        &app,
        Method::GET,
        &format!("/api/player/{player_id}/sessions?page=1&limit=1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_sessions"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn leaderboard_ranks_strictly_increase() {
    let (app, _pool) = setup().await;
    let player_id = register(&app, "lb").await;
    calibrate(&app, player_id).await;
    play_session(&app, player_id, 30, 1).await;

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/leaderboards?type=global&timeframe=all_time",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timeframe"], "all_time");
    assert_eq!(body["type"], "global");

    let top = body["top_makes"].as_array().unwrap();
    assert!(!top.is_empty());
    for pair in top.windows(2) {
        assert!(pair[0]["rank"].as_i64() < pair[1]["rank"].as_i64());
        assert!(pair[0]["value"].as_f64() >= pair[1]["value"].as_f64());
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn duel_lifecycle() {
    let (app, _pool) = setup().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    calibrate(&app, alice).await;
    calibrate(&app, bob).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/duels",
        Some(json!({"creator_id": alice, "invited_player_id": alice})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, duel) = call(
        &app,
        Method::POST,
        "/api/duels",
        Some(json!({"creator_id": alice, "invited_player_id": bob})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{duel}");
    assert_eq!(duel["status"], "pending");
    let duel_id = duel["duel_id"].as_i64().unwrap();

    let (_, inbox) = call(&app, Method::GET, &format!("/api/notifications/{bob}"), None).await;
    assert_eq!(inbox["notifications"][0]["type"], "duel_invite");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/duels/{duel_id}/respond"),
        Some(json!({"player_id": alice, "response": "accept"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, duel) = call(
        &app,
        Method::POST,
        &format!("/api/duels/{duel_id}/respond"),
        Some(json!({"player_id": bob, "response": "Accepted"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(duel["status"], "active");

    let alice_session = play_session(&app, alice, 10, 2).await;
    let bob_session = play_session(&app, bob, 7, 5).await;

    let (status, duel) = call(
        &app,
        Method::POST,
        &format!("/api/duels/{duel_id}/submit"),
        Some(json!({"player_id": alice, "session_id": alice_session})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{duel}");
    assert_eq!(duel["status"], "active");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/duels/{duel_id}/submit"),
        Some(json!({"player_id": alice, "session_id": alice_session})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, duel) = call(
        &app,
        Method::POST,
        &format!("/api/duels/{duel_id}/submit"),
        Some(json!({"player_id": bob, "session_id": bob_session})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{duel}");
    assert_eq!(duel["status"], "completed");
    assert_eq!(duel["winner_id"], alice);
    assert_eq!(duel["creator_score"], 10);
    assert_eq!(duel["invited_score"], 7);

    let (status, h2h) = call(
        &app,
        Method::GET,
        &format!("/api/players/{alice}/vs/{bob}/duels"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h2h["head_to_head"]["player1_wins"], 1);
    assert_eq!(h2h["head_to_head"]["player2_wins"], 0);
    assert_eq!(h2h["head_to_head"]["total_duels"], 1);

    let (_, count) = call(
        &app,
        Method::GET,
        &format!("/api/notifications/{bob}/unread_count"),
        None,
    )
    .await;
    assert_eq!(count["unread_count"], 2);

    let (status, marked) = call(&app, Method::POST, &format!("/api/notifications/{bob}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["updated"], 2);
}

#[tokio::test]
#[ignore = "requires database"]
async fn league_flow() {
    let (app, _pool) = setup().await;
    let host = register(&app, "host").await;
    let guest = register(&app, "guest").await;
    calibrate(&app, guest).await;

    let start = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let (status, league) = call(
        &app,
        Method::POST,
        "/api/leagues",
        Some(json!({
            "creator_id": host,
            "name": "Evening Putters",
            "settings": {"num_rounds": 3, "round_duration_hours": 24},
            "start_time": start
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{league}");
    let league_id = league["league_id"].as_i64().unwrap();
    let rounds = league["rounds"].as_array().unwrap();
    assert_eq!(rounds.len(), 3);
    for (i, round) in rounds.iter().enumerate() {
        assert_eq!(round["round_number"], i as i64 + 1);
    }
    assert_eq!(rounds[0]["end_time"], rounds[1]["start_time"]);
    assert_eq!(rounds[0]["status"], "active");
    assert_eq!(league["status"], "active");

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/leagues/{league_id}"),
        Some(json!({"editor_id": host, "name": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let join_uri = format!("/api/leagues/{league_id}/join");
    let (status, _) = call(&app, Method::POST, &join_uri, Some(json!({"player_id": guest}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::POST, &join_uri, Some(json!({"player_id": guest}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let round_id = rounds[0]["round_id"].as_i64().unwrap();
    let session_id = play_session(&app, guest, 12, 3).await;
    let submit_uri = format!("/api/leagues/{league_id}/rounds/{round_id}/submit");
    let body = json!({"player_id": guest, "session_id": session_id});

    let (status, submission) = call(&app, Method::POST, &submit_uri, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{submission}");
    assert_eq!(submission["score"], 12);
    assert!(submission["points_awarded"].is_null());

    let (status, _) = call(&app, Method::POST, &submit_uri, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, boards) = call(
        &app,
        Method::GET,
        &format!("/api/leagues/{league_id}/leaderboard"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(boards["top_makes"][0]["player_id"], guest);
    assert_eq!(boards["top_makes"][0]["rank"], 1);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/leagues/{league_id}/join?player_id={host}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/leagues/{league_id}/join?player_id={guest}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires database"]
async fn league_edit_blank_description_clears_it() {
    let (app, _pool) = setup().await;
    let host = register(&app, "editor").await;

    let start = (Utc::now() + Duration::days(2)).to_rfc3339();
    let (status, league) = call(
        &app,
        Method::POST,
        "/api/leagues",
        Some(json!({
            "creator_id": host,
            "name": "Morning Ladder",
            "description": "Ten minutes before work",
            "start_time": start
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{league}");
    assert_eq!(league["status"], "registering");
    let uri = format!("/api/leagues/{}", league["league_id"]);

    let (status, edited) = call(&app, Method::PUT, &uri, Some(json!({"editor_id": host, "name": "Dawn Ladder"}))).await;
    assert_eq!(status, StatusCode::OK, "{edited}");
    assert_eq!(edited["description"], "Ten minutes before work");

    let (status, edited) = call(&app, Method::PUT, &uri, Some(json!({"editor_id": host, "description": "   "}))).await;
    assert_eq!(status, StatusCode::OK, "{edited}");
    assert!(edited["description"].is_null());
    assert_eq!(edited["name"], "Dawn Ladder");
}

fn desktop_upload(player_id: i64, tracker_id: &str) -> Value {
    let mut entries: Vec<Value> = (0..21)
        .map(|i| {
            json!({
                "classification": "MAKE",
                "detailed_classification": "MAKE - TOP",
                "current_frame_time": 10.0 + i as f64
            })
        })
        .collect();
    entries.push(json!({
        "classification": "MISS",
        "detailed_classification": "MISS - RETURN",
        "current_frame_time": 45.0
    }));
    entries.push(json!({"classification": "IDLE", "current_frame_time": 50.0}));

    json!({
        "session_data": {
            "metadata": {"session_id": tracker_id, "player_id": player_id},
            "putt_log_entries": entries,
            "session_summary": {"total_putts": 22}
        },
        "verification": {"classification_count": 22},
        "source": "desktop",
        "version": "test"
    })
}

#[tokio::test]
#[ignore = "requires database"]
async fn desktop_upload_is_stored_verified_and_counted() {
    let (app, _pool) = setup().await;
    let player_id = register(&app, "desk").await;
    let tracker_id = unique_email("tracker");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/sessions/submit",
        Some(desktop_upload(player_id, &tracker_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["putts_processed"], 22);
    assert_eq!(body["statistics"]["total_makes"], 21);
    assert_eq!(body["statistics"]["best_streak"], 21);
    assert_eq!(body["statistics"]["fastest_21_makes"], 20.0);
    assert_eq!(body["statistics"]["session_duration"], 45.0);
    let session_id = body["session_id"].as_i64().unwrap();

    let (status, verified) = call(
        &app,
        Method::GET,
        &format!("/api/sessions/{session_id}/verify"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["verified"], true);
    assert_eq!(verified["putt_count"], 22);
    assert_eq!(verified["client_session_id"], tracker_id.as_str());
    assert!(verified["processed_at"].is_string());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/sessions/submit",
        Some(desktop_upload(player_id, &tracker_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, data) = call(&app, Method::GET, &format!("/api/player/{player_id}/data"), None).await;
    assert_eq!(data["stats"]["total_makes"], 21);
    assert_eq!(data["stats"]["sessions_played"], 1);
    assert_eq!(data["sessions"][0]["session_id"], session_id);

    let (status, _) = call(&app, Method::GET, "/api/sessions/9000000000000/verify", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/sessions/submit",
        Some(desktop_upload(9_000_000_000_000, "orphan")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn fundraiser_progress_is_capped() {
    let (app, _pool) = setup().await;
    let owner = register(&app, "owner").await;
    let backer = register(&app, "backer").await;
    calibrate(&app, owner).await;

    let (status, fundraiser) = call(
        &app,
        Method::POST,
        "/api/fundraisers",
        Some(json!({
            "creator_id": owner,
            "title": "Putts for Pups",
            "charity_name": "Local Shelter",
            "start_date": (Utc::now() - Duration::minutes(5)).to_rfc3339()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{fundraiser}");
    let fundraiser_id = fundraiser["fundraiser_id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/fundraisers/{fundraiser_id}/pledge"),
        Some(json!({"pledger_id": backer, "amount_per_putt": 0.5, "max_amount": 4.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    play_session(&app, owner, 20, 0).await;

    let (status, detail) = call(
        &app,
        Method::GET,
        &format!("/api/fundraisers/{fundraiser_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["putts_made"], 20);
    assert_eq!(detail["pledges"][0]["accrued"], 4.0);
    assert_eq!(detail["amount_raised"], 4.0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn desktop_heartbeat_marks_connected() {
    let (app, _pool) = setup().await;
    let player_id = register(&app, "desk").await;

    let (_, status_body) = call(
        &app,
        Method::GET,
        &format!("/api/desktop/status?player_id={player_id}"),
        None,
    )
    .await;
    assert_eq!(status_body["connected"], false);
    assert_eq!(status_body["status"], "disconnected");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/desktop/heartbeat",
        Some(json!({"player_id": player_id, "desktop_version": "1.4.0"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status_body) = call(
        &app,
        Method::GET,
        &format!("/api/desktop/status?player_id={player_id}"),
        None,
    )
    .await;
    assert_eq!(status_body["connected"], true);
    assert_eq!(status_body["status"], "active");
    assert_eq!(status_body["desktop_version"], "1.4.0");
}
