use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info";
const DEVELOPMENT_FILTER: &str = "info,server=debug,service=debug,tower_http=debug,sqlx=warn";

/// Initialize tracing subscriber with sensible defaults and stdout writer.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info,tower_http=info,axum=info`
pub fn init_logging_default() {
    init_compact(DEFAULT_FILTER);
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set, defaults to `info`
/// - Writes to stdout for consistent container logging behavior
pub fn init_logging_json() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the subscriber flavour from the deployment environment name.
/// `production` logs JSON at info; `development` logs compact lines with
/// debug enabled for the workspace crates; anything else uses the default.
pub fn init_logging_for_env(env: &str) {
    if env.eq_ignore_ascii_case("production") {
        init_logging_json();
    } else if env.eq_ignore_ascii_case("development") {
        init_compact(DEVELOPMENT_FILTER);
    } else {
        init_logging_default();
    }
}

fn init_compact(fallback: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}
