use std::process::ExitCode;

use tracing::{error, info};
use uuid::Uuid;

use common::utils::logging::{init_logging_default, init_logging_for_env};

fn main() -> ExitCode {
    // Config decides the log format, so it is loaded before logging exists
    let cfg = match server::startup::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_logging_default();
            error!(service = "voucher_manager", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging_for_env(&cfg.env);
    info!(service = "voucher_manager", event = "logger_init", env = %cfg.env, "tracing subscriber initialized");

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "voucher_manager",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let worker_threads = cfg.server.worker_threads;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads { builder.worker_threads(w); }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "voucher_manager", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "voucher_manager",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "voucher manager starting"
    );

    // server::run returns once the graceful shutdown has drained connections
    rt.block_on(async move {
        match server::run(cfg).await {
            Ok(()) => {
                info!(service = "voucher_manager", event = "stop", %service_id, pid, "server stopped normally");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "voucher_manager", event = "run_failed", error = %e, "server::run returned error");
                ExitCode::FAILURE
            }
        }
    })
}
