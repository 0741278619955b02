//! # Project Storage
//!
//! Snapshot stores keyed by [`ProjectId`]. Each store hands out project ids
//! and saves whole [`ProjectState`] snapshots; the engine never sees storage.
//!
//! - [`MemoryStore`]: `BTreeMap`, volatile.
//! - [`RedbStore`]: redb database, one ACID transaction per save.

mod redb_store;

pub use redb_store::RedbStore;

use crate::progression::ProjectState;
use crate::{ProjectId, StageGateError};
use std::collections::BTreeMap;

/// Storage of project snapshots.
pub trait ProjectStore {
    /// Reserve the next unused project id.
    fn allocate_id(&mut self) -> Result<ProjectId, StageGateError>;

    /// Insert or overwrite a snapshot. Last writer wins.
    fn save(&mut self, state: &ProjectState) -> Result<(), StageGateError>;

    fn load(&self, id: ProjectId) -> Result<Option<ProjectState>, StageGateError>;

    /// All snapshots in id order.
    fn list(&self) -> Result<Vec<ProjectState>, StageGateError>;

    fn len(&self) -> Result<usize, StageGateError>;

    fn is_empty(&self) -> Result<bool, StageGateError> {
        Ok(self.len()? == 0)
    }
}

/// In-memory snapshot store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    projects: BTreeMap<ProjectId, ProjectState>,
    next_id: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryStore {
    fn allocate_id(&mut self) -> Result<ProjectId, StageGateError> {
        self.next_id = self.next_id.saturating_add(1);
        Ok(ProjectId(self.next_id))
    }

    fn save(&mut self, state: &ProjectState) -> Result<(), StageGateError> {
        self.projects.insert(state.project.id, state.clone());
        Ok(())
    }

    fn load(&self, id: ProjectId) -> Result<Option<ProjectState>, StageGateError> {
        Ok(self.projects.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<ProjectState>, StageGateError> {
        Ok(self.projects.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, StageGateError> {
        Ok(self.projects.len())
    }
}
