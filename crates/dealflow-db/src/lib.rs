//! # dealflow-db
//!
//! libSQL persistence for dealflow.
//!
//! Handles all relational state: funds, investors, tracked companies,
//! LinkedIn profiles, signal links, cached tags, admission events and the
//! public feed. [`service::FlowService`] implements the
//! [`ProjectStore`](dealflow_core::capabilities::ProjectStore),
//! [`Publisher`](dealflow_core::capabilities::Publisher) and
//! [`EventSink`](dealflow_core::capabilities::EventSink) collaborator traits.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
mod store;
pub mod trail;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for all dealflow state.
///
/// Constructed once and wrapped by [`service::FlowService`], which is passed
/// by reference into every pipeline and admission call.
pub struct FlowDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl FlowDb {
    /// Open a local database at the given path, or `:memory:`.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Other(e.into()))?;
                }
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Foreign keys are per-connection in SQLite.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let flow_db = Self { db, conn };
        flow_db.run_migrations().await?;
        Ok(flow_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Row id of the last successful insert on this connection.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }
}
