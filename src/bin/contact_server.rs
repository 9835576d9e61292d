//! Contact-form web service.
//!
//! Environment: `CONTACTS_DB` (SQLite file), `BIND_ADDR`, `STATIC_DIR`,
//! `RUST_LOG`.

use sortdir::contacts::{RetryPolicy, ServerConfig, connect_with_retry, router};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = ServerConfig::from_env();

    let store = match connect_with_retry(&config.db_path, RetryPolicy::default()).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "giving up on database");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(addr = %config.bind_addr, db = %config.db_path.display(), "contact server listening");
    if let Err(e) = axum::serve(listener, router(store, config.static_dir)).await {
        error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
