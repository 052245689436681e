//! Command line entry point: `serve` (default) and `migrate`.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::app::{self, AppState, HttpSettings};
use crate::auth::password::PasswordHasher;
use crate::auth::{TokenService, DEFAULT_TTL_HOURS};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore};
use crate::generation::{Generator, HttpGenerator};

#[derive(Debug, Parser)]
#[command(name = "taverna-api")]
#[command(about = "Taverna do Mestre - campaign management API")]
#[command(version)]
pub struct Cli {
    /// Overrides PORT.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Default, Subcommand)]
pub enum Command {
    #[default]
    #[command(about = "Run the HTTP server")]
    Serve,

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let database = DatabaseManager::connect_lazy(&config.database).context("invalid database configuration")?;

    match cli.command.unwrap_or_default() {
        Command::Migrate => {
            database.migrate().await.context("migration failed")?;
            database.close().await;
            Ok(())
        }
        Command::Serve => serve(config, database).await,
    }
}

async fn serve(config: AppConfig, database: DatabaseManager) -> anyhow::Result<()> {
    info!("Starting Taverna API in {:?} mode", config.environment);

    let generator = Arc::new(HttpGenerator::new(&config.generation).context("generation client")?);
    let probe = generator.clone();
    tokio::spawn(async move {
        match probe.health().await {
            Ok(()) => info!("Generation service is healthy"),
            Err(e) => warn!("Generation service unavailable at startup: {}", e),
        }
    });

    let ttl_hours = i64::try_from(config.security.jwt_expiry_hours).unwrap_or(DEFAULT_TTL_HOURS);
    let tokens = TokenService::new(config.security.jwt_secret.as_deref(), ttl_hours);
    if !tokens.is_configured() {
        warn!("JWT_SECRET is not set; protected routes will answer 401");
    }

    let state = AppState::new(
        Arc::new(PgStore::new(&database)),
        generator,
        tokens,
        PasswordHasher::new(config.security.bcrypt_cost),
    );
    let settings = HttpSettings {
        cors_origin: config.security.cors_origin.clone(),
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
    };
    let router = app::router(state, &settings);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Taverna API listening on http://{}", bind_addr);

    // In-flight requests get a bounded window to finish once a signal arrives.
    let deadline = Duration::from_secs(config.server.shutdown_timeout_secs);
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });

    tokio::select! {
        result = server.into_future() => result.context("server error")?,
        _ = async {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(deadline).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => warn!("Shutdown deadline of {}s passed; dropping open connections", deadline.as_secs()),
    }

    database.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
