use std::{future::Future, future::IntoFuture, io, sync::Arc, time::Duration};

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, ORIGIN},
    HeaderValue, Method,
};
use axum::Router;
use configs::{AppConfig, CorsConfig};
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use service::auth::TokenAuth;
use service::voucher::{
    repo::seaorm::SeaOrmVoucherRepository, repository::VoucherRepository, service::VoucherConfig, VoucherService,
};

use crate::{errors::StartupError, routes, state::ServerState};

/// `.env`, optional TOML file, environment overrides, then validation.
pub fn load_config() -> Result<AppConfig, StartupError> {
    dotenvy::dotenv().ok();
    AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

/// CORS from the configured origin list. `*` allows any origin without credentials.
pub fn build_cors(cfg: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT, AUTHORIZATION])
        .expose_headers([CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(12 * 60 * 60));

    if cfg.allows_any_origin() {
        return layer.allow_origin(AllowOrigin::any());
    }
    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "cors_origin_ignored");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}

/// Wire the SeaORM repository, voucher service and token check into handler state
pub fn build_state(cfg: &AppConfig, db: DatabaseConnection) -> ServerState {
    let repo: Arc<dyn VoucherRepository> = Arc::new(SeaOrmVoucherRepository::new(db));
    let vouchers = VoucherService::new(
        repo,
        VoucherConfig { query_timeout: cfg.query.timeout(), csv_max_bytes: cfg.csv.max_size_bytes() },
    );
    ServerState::new(vouchers, TokenAuth::new(cfg.auth.token.clone()))
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
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
    info!(event = "shutdown_signal", "shutting down gracefully");
}

/// Drive `server` to completion. Once `stopping` resolves, in-flight work gets `grace`
/// to drain; connections still open after that are dropped with the server future.
pub async fn drain_with_deadline<S, F>(server: S, stopping: F, grace: Duration) -> io::Result<()>
where
    S: Future<Output = io::Result<()>>,
    F: Future<Output = ()>,
{
    tokio::pin!(server);
    tokio::select! {
        biased;
        res = &mut server => return res,
        _ = stopping => {}
    }
    match tokio::time::timeout(grace, server).await {
        Ok(res) => res,
        Err(_) => {
            warn!(grace_ms = grace.as_millis() as u64, event = "shutdown_drain_timeout", "dropping connections still open");
            Ok(())
        }
    }
}

/// Public entry: connect, migrate, build the app and serve until a shutdown signal
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    // DB connection + schema
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!(event = "migrations_applied", "database schema up to date");

    let state = build_state(&cfg, db.clone());
    let app: Router = routes::build_router(state, build_cors(&cfg.cors), cfg.server.request_timeout());

    // Bind and serve
    let addr = cfg.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, env = %cfg.env, "starting server crate");

    let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });
    let stopping = async move {
        let _ = stop_rx.changed().await;
    };
    drain_with_deadline(server.into_future(), stopping, cfg.server.shutdown_timeout()).await?;

    db.close().await?;
    info!(event = "db_closed", "database pool closed");
    Ok(())
}
