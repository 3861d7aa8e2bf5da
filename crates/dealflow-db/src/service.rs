//! Service layer pairing the database with the JSONL event trail.
//!
//! `FlowService` wraps `FlowDb` (raw database access) and `TrailWriter`
//! (JSONL persistence of admission events). All repo methods are
//! implemented as `impl FlowService`.

use std::path::PathBuf;

use crate::FlowDb;
use crate::error::DatabaseError;
use crate::trail::writer::TrailWriter;

/// Store, publisher and event sink backed by one libSQL database.
pub struct FlowService {
    db: FlowDb,
    trail: TrailWriter,
}

impl FlowService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `trail_dir` - Directory for JSONL trail files. Pass `None` to disable
    ///   trail writing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the trail
    /// directory cannot be created.
    pub async fn new_local(
        db_path: &str,
        trail_dir: Option<PathBuf>,
    ) -> Result<Self, DatabaseError> {
        let db = FlowDb::open_local(db_path).await?;
        let trail = match trail_dir {
            Some(dir) => TrailWriter::new(dir)?,
            None => TrailWriter::disabled(),
        };
        Ok(Self { db, trail })
    }

    /// Create from an existing `FlowDb`.
    #[must_use]
    pub const fn from_db(db: FlowDb, trail: TrailWriter) -> Self {
        Self { db, trail }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &FlowDb {
        &self.db
    }

    /// Access the trail writer.
    #[must_use]
    pub const fn trail(&self) -> &TrailWriter {
        &self.trail
    }

    /// Access the trail writer mutably (e.g., to disable during rebuild).
    pub const fn trail_mut(&mut self) -> &mut TrailWriter {
        &mut self.trail
    }
}
