//! HTTP server command
//!
//! Connects to PostgreSQL, optionally applies the schema, then serves the
//! API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use proofputt_server::db::pool::DEFAULT_MAX_CONNECTIONS;
use proofputt_server::db::{create_pool_with_options, migrations};
use proofputt_server::http::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "PROOFPUTT_BIND", default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,

    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "PROOFPUTT_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Per-request timeout in seconds
    #[arg(long, env = "PROOFPUTT_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Seconds without a heartbeat before the desktop app counts as disconnected
    #[arg(long, env = "PROOFPUTT_HEARTBEAT_TIMEOUT_SECS", default_value_t = 60)]
    pub heartbeat_timeout_secs: u64,

    /// Apply the schema before serving
    #[arg(long)]
    pub migrate: bool,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            heartbeat_timeout: Duration::from_secs(self.heartbeat_timeout_secs),
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let database_url = args
        .database_url
        .as_deref()
        .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

    anyhow::ensure!(args.max_connections > 0, "--max-connections must be at least 1");
    anyhow::ensure!(args.request_timeout_secs > 0, "--request-timeout-secs must be at least 1");

    tracing::info!(max_connections = args.max_connections, "Connecting to database");
    let pool = create_pool_with_options(database_url, args.max_connections)
        .await
        .context("Failed to create database pool")?;

    if args.migrate {
        migrations::run(&pool)
            .await
            .context("Failed to apply database schema")?;
        tracing::info!("Database schema is up to date");
    }

    // Run server (blocks until shutdown)
    run_server(pool, args.server_config())
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_args() {
        let args = ServeArgs::parse_from([
            "serve",
            "--bind",
            "0.0.0.0:8080",
            "--database-url",
            "postgres://localhost/proofputt",
            "--heartbeat-timeout-secs",
            "90",
        ]);
        let config = args.server_config();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(90));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn max_connections_follows_pool_default() {
        let args = ServeArgs::parse_from(["serve", "--database-url", "postgres://localhost/proofputt"]);
        assert_eq!(args.max_connections, DEFAULT_MAX_CONNECTIONS);

        let args = ServeArgs::parse_from(["serve", "--max-connections", "12"]);
        assert_eq!(args.max_connections, 12);
    }
}
