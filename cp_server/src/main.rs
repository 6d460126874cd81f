//! Live tournament pairing server.
//!
//! Runs one room actor per live tournament behind an axum HTTP/WebSocket
//! front end, backed by PostgreSQL or, with `--memory`, by in-process
//! services.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use club_pairing::{
    db::Database,
    room::RoomRegistry,
    services::Services,
    tournament::PlayerProfile,
};
use cp_server::{
    api::{self, auth::TokenVerifier},
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;
use tracing::{error, info, warn};

const HELP: &str = "\
Run the live tournament pairing server

USAGE:
  cp_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6970]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --memory                 Keep players and tournaments in memory (development)
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:6970)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               Access token secret (required, at least 32 characters)
  METRICS_BIND             Prometheus listener address (disabled when unset)
  ROOM_*                   Room tuning, see .env.example
  (See .env.example for all configuration options)
";

/// Members seeded into the in-memory directory
const DEMO_MEMBERS: i64 = 12;

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        memory: pargs.contains("--memory"),
    };

    let config = ServerConfig::from_env(args.bind, args.database_url, args.memory)?;

    logging::init();
    info!("Starting tournament pairing server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let (services, database) = match &config.database {
        Some(db_config) => {
            info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            db.ensure_schema()
                .await
                .context("Failed to prepare database schema")?;
            info!("Database connected successfully");

            (Services::postgres(db.pool().clone()), Some(db))
        }
        None => {
            warn!("Running on in-memory services, nothing survives a restart");
            let (services, players, _) = Services::in_memory();
            for id in 1..=DEMO_MEMBERS {
                players
                    .insert(PlayerProfile {
                        id,
                        nickname: format!("member{}", id),
                        rating: 1200 + 50 * id as u32,
                    })
                    .await;
            }
            info!("Seeded {} demo members", DEMO_MEMBERS);

            (services, None)
        }
    };

    let registry = RoomRegistry::new(config.rooms.clone(), services);

    let state = api::AppState {
        registry: registry.clone(),
        tokens: Arc::new(TokenVerifier::new(&config.security.jwt_secret)),
        database: database.clone(),
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    registry.shutdown().await;

    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
