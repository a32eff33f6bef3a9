//! Authentication API server.
//!
//! Serves registration, login and token endpoints backed by PostgreSQL, or by
//! an in-memory store when started with `--memory`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use eco_server::{
    api::{self, AppState, RoutingVariant},
    config::{CliOverrides, ServerConfig},
    logging, metrics,
};
use eco_tech::{
    auth::AuthManager,
    db::{Database, MemoryUserRepository, PgUserRepository, UserRepository},
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the eco_tech authentication API server

USAGE:
  eco_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8000]
  --db-url        URL      Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/eco_tech]
  --routes        VARIANT  Mounted auth endpoints: standard | register-only  [default: env AUTH_ROUTES or standard]
  --metrics-bind  IP:PORT  Prometheus exporter address  [default: env METRICS_BIND, disabled when unset]

FLAGS:
  --memory                 Keep accounts in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  JWT_SECRET                   JWT signing secret (at least 32 characters)
  PASSWORD_PEPPER              Password hashing pepper (at least 16 characters)
  ACCESS_TOKEN_LIFETIME_SECS   Access token lifetime  [default: 300]
  REFRESH_TOKEN_LIFETIME_SECS  Refresh token lifetime  [default: 86400]
  DB_MAX_CONNECTIONS, DB_MIN_CONNECTIONS, DB_CONNECTION_TIMEOUT_SECS,
  DB_IDLE_TIMEOUT_SECS, DB_MAX_LIFETIME_SECS
                               Connection pool settings
  RUST_LOG                     Log filter  [default: info,sqlx=warn,hyper=warn]
";

fn parse_args() -> Result<CliOverrides, Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        routes: pargs.opt_value_from_fn("--routes", |s| s.parse::<RoutingVariant>())?,
        use_memory_store: pargs.contains("--memory"),
        metrics_bind: pargs.opt_value_from_str::<_, SocketAddr>("--metrics-bind")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}", remaining);
    }

    Ok(overrides)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let overrides = parse_args()?;

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let (users, database): (Arc<dyn UserRepository>, Option<Arc<Database>>) =
        if config.use_memory_store {
            info!("Using in-memory account store; accounts are lost on exit");
            (Arc::new(MemoryUserRepository::new()), None)
        } else {
            info!("Connecting to database");
            let db = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            db.ensure_schema()
                .await
                .context("Failed to prepare database schema")?;
            info!("Database connected successfully");

            let db = Arc::new(db);
            (
                Arc::new(PgUserRepository::new(db.pool().clone())),
                Some(db),
            )
        };

    let auth_manager = Arc::new(AuthManager::new(
        users,
        config.security.password_pepper.clone(),
        &config.security.jwt_secret,
        config.tokens,
    ));

    let state = AppState {
        auth_manager,
        database: database.clone(),
    };

    info!("Mounting {} auth routes", config.routes);
    let app = api::create_router(state, config.routes);

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
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
