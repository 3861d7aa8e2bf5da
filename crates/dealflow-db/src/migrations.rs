//! Database migration runner.
//!
//! Embeds the SQL schema at compile time and executes it on database open.
//! All statements use `IF NOT EXISTS` for idempotent re-running.

use crate::FlowDb;
use crate::error::DatabaseError;

/// Initial schema: 9 tables, 6 indexes.
const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

impl FlowDb {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        Ok(())
    }
}
