use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, auth};
use service::auth::{Passwords, TokenKeys};
use service::business::RegistrationConfig;
use service::store::{seaorm::SeaOrmStore, DirectoryStore};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire the services over `store` from validated configuration.
pub fn build_state(cfg: &AppConfig, store: Arc<dyn DirectoryStore>) -> anyhow::Result<auth::ServerState> {
    let passwords = Passwords::new(
        cfg.auth.argon2_memory_kib,
        cfg.auth.argon2_iterations,
        cfg.auth.argon2_parallelism,
    )?;
    let tokens = TokenKeys::new(
        cfg.auth.jwt_signing_key.as_bytes(),
        &cfg.auth.jwt_algorithm,
        chrono::Duration::hours(cfg.auth.jwt_expiration_hours),
    )?;
    let registration = RegistrationConfig {
        min_password_length: cfg.auth.min_password_length,
        transaction_timeout: Duration::from_secs(cfg.registration.transaction_timeout_secs),
    };
    Ok(auth::ServerState::new(store, passwords, Arc::new(tokens), registration))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        return;
    }
    info!("received Ctrl+C, shutting down");
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    let store: Arc<dyn DirectoryStore> = Arc::new(SeaOrmStore::new(db));

    let state = build_state(&cfg, store)?;
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}
