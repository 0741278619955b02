//! # redb-backed Project Storage
//!
//! Each project snapshot is one record in the `projects` table, encoded with
//! [`crate::formats::state_to_bytes`]. The next project id lives in the
//! `metadata` table and is written in the same transaction that reserves it,
//! so ids survive restarts and are never reused.

use super::ProjectStore;
use crate::formats::{state_from_bytes, state_to_bytes};
use crate::progression::ProjectState;
use crate::{ProjectId, StageGateError};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for projects: ProjectId(u64) -> snapshot bytes
const PROJECTS: TableDefinition<u64, &[u8]> = TableDefinition::new("projects");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_PROJECT_ID: &str = "next_project_id";

fn io_err(e: impl std::fmt::Display) -> StageGateError {
    StageGateError::IoError(e.to_string())
}

/// A disk-backed project store using redb.
pub struct RedbStore {
    db: Database,
    /// Last id handed out; 0 when none has been.
    last_id: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("last_id", &self.last_id)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a project database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StageGateError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Create tables on first open
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(PROJECTS).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        let last_id = {
            let read_txn = db.begin_read().map_err(io_err)?;
            let table = read_txn.open_table(METADATA).map_err(io_err)?;
            table
                .get(NEXT_PROJECT_ID)
                .map_err(io_err)?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        tracing::debug!(path = %path.as_ref().display(), last_id, "Opened project database");
        Ok(Self { db, last_id })
    }
}

impl ProjectStore for RedbStore {
    fn allocate_id(&mut self) -> Result<ProjectId, StageGateError> {
        let next = self.last_id.saturating_add(1);

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert(NEXT_PROJECT_ID, next).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        self.last_id = next;
        Ok(ProjectId(next))
    }

    fn save(&mut self, state: &ProjectState) -> Result<(), StageGateError> {
        let bytes = state_to_bytes(state)?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut projects = write_txn.open_table(PROJECTS).map_err(io_err)?;
            projects
                .insert(state.project.id.0, bytes.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn load(&self, id: ProjectId) -> Result<Option<ProjectState>, StageGateError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let projects = read_txn.open_table(PROJECTS).map_err(io_err)?;
        match projects.get(id.0).map_err(io_err)? {
            Some(guard) => state_from_bytes(guard.value()).map(Some),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<ProjectState>, StageGateError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let projects = read_txn.open_table(PROJECTS).map_err(io_err)?;

        let mut states = Vec::new();
        for entry in projects.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            states.push(state_from_bytes(value.value())?);
        }
        Ok(states)
    }

    fn len(&self) -> Result<usize, StageGateError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let projects = read_txn.open_table(PROJECTS).map_err(io_err)?;
        let len = projects.len().map_err(io_err)?;
        Ok(usize::try_from(len).unwrap_or(usize::MAX))
    }
}
