//! Contact-form web service.
//!
//! A small HTTP API that stores name/email pairs in SQLite:
//!
//! - `POST /aggiungi` with `{"nome": ..., "email": ...}` stores a contact and
//!   answers `{"status": "successo"}` (or `"errore"` if storage fails)
//! - `GET /lista` returns every stored contact as `[{id, nome, email}]`
//! - `GET /` serves `static/index.html`; `/static/*` serves the directory
//!
//! The table is created on startup. Because the database may not be ready
//! when the service starts, opening it is retried a bounded number of times.

mod routes;
mod store;

pub use routes::{AppState, StatusResponse, router};
pub use store::{Contact, ContactError, ContactStore, NewContact, RetryPolicy, connect_with_retry};

use std::path::PathBuf;

/// Default SQLite file when `CONTACTS_DB` is unset.
pub const DEFAULT_DB_PATH: &str = "contatti.db";
/// Default listen address when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
/// Default directory for the page and its assets.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Reads `CONTACTS_DB`, `BIND_ADDR` and `STATIC_DIR`, with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            db_path: lookup("CONTACTS_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}
