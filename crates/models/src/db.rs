use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use configs::DatabaseConfig;

/// Open a pooled connection using the configured bounds and timeouts.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    cfg.validate()?;
    let mut opt = ConnectOptions::new(cfg.url.clone());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(cfg.connect_timeout())
        .acquire_timeout(cfg.acquire_timeout())
        .idle_timeout(cfg.idle_timeout())
        .max_lifetime(cfg.max_lifetime())
        .sqlx_logging(cfg.sqlx_logging);

    let db = Database::connect(opt).await?;
    info!(
        max_connections = cfg.max_connections,
        min_connections = cfg.min_connections,
        "database_connected"
    );
    Ok(db)
}

/// Connect with defaults for everything but the URL. Used by tests and tooling.
pub async fn connect(url: &str) -> anyhow::Result<DatabaseConnection> {
    let cfg = DatabaseConfig { url: url.to_string(), ..DatabaseConfig::default() };
    connect_with_config(&cfg).await
}
