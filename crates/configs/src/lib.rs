use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub csv: CsvConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Whole-request deadline at the HTTP layer, body included.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How long in-flight requests may drain after a shutdown signal.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            worker_threads: None,
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub token: String,
}

impl Default for AuthConfig {
    fn default() -> Self { Self { token: "123456".into() } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsvConfig {
    pub max_size_mb: u64,
}

impl Default for CsvConfig {
    fn default() -> Self { Self { max_size_mb: 5 } }
}

impl CsvConfig {
    pub fn max_size_bytes(&self) -> u64 { self.max_size_mb.saturating_mul(1024 * 1024) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self { Self { timeout_secs: 5 } }
}

impl QueryConfig {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self { Self { allowed_origins: vec!["*".into()] } }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.len() == 1 && self.allowed_origins[0] == "*"
    }
}

/// Upper bound for `csv.max_size_mb`; uploads are buffered in memory.
pub const MAX_CSV_SIZE_MB: u64 = 1024;

fn default_env() -> String { "development".into() }
fn default_request_timeout() -> u64 { 15 }
fn default_shutdown_timeout() -> u64 { 10 }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 300 }
fn default_max_lifetime() -> u64 { 7200 }
fn default_acquire_timeout() -> u64 { 30 }

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// File first (when present), then environment overrides, then validation.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay values from an environment lookup. Blank values are ignored and
    /// unparsable numbers keep whatever the file or defaults provided.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("APP_ENV") { self.env = v; }
        if let Some(v) = get("SERVER_HOST") { self.server.host = v; }
        if let Some(p) = get("SERVER_PORT").and_then(|v| v.parse().ok()) { self.server.port = p; }
        if let Some(w) = get("TOKIO_WORKER_THREADS").and_then(|v| v.parse().ok()) { self.server.worker_threads = Some(w); }
        if let Some(n) = get("SERVER_REQUEST_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) { self.server.request_timeout_secs = n; }
        if let Some(n) = get("SERVER_SHUTDOWN_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) { self.server.shutdown_timeout_secs = n; }
        if let Some(v) = get("DATABASE_URL") { self.database.url = v; }
        if let Some(n) = get("DATABASE_MAX_CONNS").and_then(|v| v.parse().ok()) { self.database.max_connections = n; }
        if let Some(n) = get("DATABASE_MIN_CONNS").and_then(|v| v.parse().ok()) { self.database.min_connections = n; }
        if let Some(v) = get("AUTH_TOKEN") { self.auth.token = v; }
        if let Some(n) = get("CSV_MAX_SIZE_MB").and_then(|v| v.parse().ok()) { self.csv.max_size_mb = n; }
        if let Some(n) = get("QUERY_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) { self.query.timeout_secs = n; }
        if let Some(v) = get("CORS_ALLOWED_ORIGINS") { self.cors.allowed_origins = parse_origins(&v); }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        if self.env.trim().is_empty() {
            self.env = default_env();
        }
        self.server.normalize()?;
        self.database.validate()?;
        if self.auth.token.trim().is_empty() {
            return Err(anyhow!("auth.token must not be empty"));
        }
        if self.csv.max_size_mb == 0 || self.csv.max_size_mb > MAX_CSV_SIZE_MB {
            return Err(anyhow!("csv.max_size_mb must be within 1..={}", MAX_CSV_SIZE_MB));
        }
        if self.query.timeout_secs == 0 {
            return Err(anyhow!("query.timeout_secs must be a positive number of seconds"));
        }
        if self.cors.allowed_origins.is_empty() {
            self.cors.allowed_origins = vec!["*".into()];
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "0.0.0.0".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        if self.request_timeout_secs == 0 || self.shutdown_timeout_secs == 0 {
            return Err(anyhow!("server timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
    pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }
    pub fn shutdown_timeout(&self) -> Duration { Duration::from_secs(self.shutdown_timeout_secs) }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("DATABASE_URL is required; set it in the environment or database.url in config.toml"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration { Duration::from_secs(self.connect_timeout_secs) }
    pub fn idle_timeout(&self) -> Duration { Duration::from_secs(self.idle_timeout_secs) }
    pub fn max_lifetime(&self) -> Duration { Duration::from_secs(self.max_lifetime_secs) }
    pub fn acquire_timeout(&self) -> Duration { Duration::from_secs(self.acquire_timeout_secs) }
}

/// Split a comma separated origin list; an empty result means "any origin".
pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() { vec!["*".into()] } else { origins }
}
