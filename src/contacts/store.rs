//! SQLite storage for submitted contacts.

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS contatti (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    email TEXT NOT NULL
)";

/// A stored contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub nome: String,
    pub email: String,
}

/// Body of a contact submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub nome: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("Database unavailable after {attempts} attempts: {last_error}")]
    Unavailable {
        attempts: u32,
        #[source]
        last_error: rusqlite::Error,
    },
}

/// How often and how patiently to try opening the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(3),
        }
    }
}

/// Shared handle to the contacts table. Cloning shares the connection.
#[derive(Clone)]
pub struct ContactStore {
    conn: Arc<Mutex<Connection>>,
}

impl ContactStore {
    /// Opens (or creates) the database at `path` and ensures the table exists.
    pub fn open(path: &Path) -> Result<Self, ContactError> {
        Ok(Self::from_connection(Connection::open(path)?)?)
    }

    /// An empty in-memory store, used by tests and throwaway instances.
    pub fn in_memory() -> Result<Self, ContactError> {
        Ok(Self::from_connection(Connection::open_in_memory()?)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ContactError> {
        self.conn.lock().map_err(|_| ContactError::LockPoisoned)
    }

    /// Stores a contact and returns its id.
    pub fn add(&self, contact: &NewContact) -> Result<i64, ContactError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO contatti (nome, email) VALUES (?1, ?2)",
            params![contact.nome, contact.email],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, "contact stored");
        Ok(id)
    }

    /// All contacts in insertion order.
    pub fn list(&self) -> Result<Vec<Contact>, ContactError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, nome, email FROM contatti ORDER BY id")?;
        let contacts = stmt
            .query_map([], |row| {
                Ok(Contact {
                    id: row.get(0)?,
                    nome: row.get(1)?,
                    email: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contacts)
    }
}

/// Opens the store at `path`, retrying per `policy` while the database is
/// not ready.
///
/// # Errors
///
/// Returns [`ContactError::Unavailable`] with the last failure once every
/// attempt has failed.
pub async fn connect_with_retry(path: &Path, policy: RetryPolicy) -> Result<ContactStore, ContactError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        let error = match Connection::open(path).and_then(ContactStore::from_connection) {
            Ok(store) => {
                info!(path = %path.display(), attempt, "database ready");
                return Ok(store);
            }
            Err(error) => error,
        };

        if attempt >= attempts {
            return Err(ContactError::Unavailable {
                attempts,
                last_error: error,
            });
        }
        warn!(
            path = %path.display(),
            attempt,
            max_attempts = attempts,
            error = %error,
            "database not ready, retrying in {:?}",
            policy.delay
        );
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}
