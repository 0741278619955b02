//! # Session Module
//!
//! Binds a [`ProgressionEngine`] to a project store.
//!
//! Every mutating call follows the same shape: load the snapshot, apply one
//! engine operation, save the snapshot. A failed operation saves nothing.
//!
//! ## Storage Backends
//!
//! - `InMemory`: [`MemoryStore`] (fast, volatile)
//! - `Persistent`: [`RedbStore`] (disk-backed, ACID)

use crate::progression::{ProgressionEngine, ProjectState, StageEvaluation, WriteOutcome};
use crate::registry::StageCatalog;
use crate::storage::{MemoryStore, ProjectStore, RedbStore};
use crate::{ProjectId, StageGateError, StageId, WritingMode};
use std::path::Path;
use std::sync::Arc;

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory map (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    fn store(&self) -> &dyn ProjectStore {
        match self {
            StorageBackend::InMemory(s) => s,
            StorageBackend::Persistent(s) => s,
        }
    }

    fn store_mut(&mut self) -> &mut dyn ProjectStore {
        match self {
            StorageBackend::InMemory(s) => s,
            StorageBackend::Persistent(s) => s,
        }
    }
}

/// An engine plus the store its projects live in.
#[derive(Debug)]
pub struct Session {
    engine: ProgressionEngine,
    backend: StorageBackend,
}

impl Session {
    /// Session with in-memory storage.
    #[must_use]
    pub fn new(catalog: Arc<StageCatalog>) -> Self {
        Self::with_backend(ProgressionEngine::new(catalog), StorageBackend::default())
    }

    /// Session with persistent redb storage at `path`.
    pub fn with_redb(path: impl AsRef<Path>, catalog: Arc<StageCatalog>) -> Result<Self, StageGateError> {
        let store = RedbStore::open(path)?;
        Ok(Self::with_backend(
            ProgressionEngine::new(catalog),
            StorageBackend::Persistent(store),
        ))
    }

    #[must_use]
    pub fn with_backend(engine: ProgressionEngine, backend: StorageBackend) -> Self {
        Self { engine, backend }
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    #[must_use]
    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<StageCatalog> {
        self.engine.catalog()
    }

    /// Create and store a project. A `None` word limit takes the track default.
    pub fn create_project(
        &mut self,
        title: &str,
        mode: WritingMode,
        word_limit: Option<u32>,
    ) -> Result<ProjectState, StageGateError> {
        // Validate the mode before consuming an id.
        self.engine.registry(mode)?;
        let id = self.backend.store_mut().allocate_id()?;
        let state = self.engine.start_project(id, title, mode, word_limit)?;
        self.backend.store_mut().save(&state)?;
        Ok(state)
    }

    pub fn project(&self, id: ProjectId) -> Result<ProjectState, StageGateError> {
        self.backend
            .store()
            .load(id)?
            .ok_or(StageGateError::ProjectNotFound(id))
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectState>, StageGateError> {
        self.backend.store().list()
    }

    pub fn project_count(&self) -> Result<usize, StageGateError> {
        self.backend.store().len()
    }

    pub fn write_content(
        &mut self,
        id: ProjectId,
        stage_id: &StageId,
        content: &str,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, StageGateError> {
        let mut state = self.project(id)?;
        let outcome = self
            .engine
            .write_content(&mut state, stage_id, content, expected_version)?;
        self.backend.store_mut().save(&state)?;
        Ok(outcome)
    }

    pub fn evaluate_stage(
        &mut self,
        id: ProjectId,
        stage_id: &StageId,
    ) -> Result<StageEvaluation, StageGateError> {
        let mut state = self.project(id)?;
        let before = state.clone();
        let evaluation = self.engine.evaluate(&mut state, stage_id)?;
        if state != before {
            self.backend.store_mut().save(&state)?;
        }
        Ok(evaluation)
    }

    pub fn archive_project(&mut self, id: ProjectId) -> Result<ProjectState, StageGateError> {
        let mut state = self.project(id)?;
        self.engine.archive(&mut state);
        self.backend.store_mut().save(&state)?;
        Ok(state)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProjectStatus, StageStatus};
    use tempfile::tempdir;

    fn session() -> Session {
        Session::new(Arc::new(StageCatalog::builtin()))
    }

    #[test]
    fn create_and_fetch() {
        let mut session = session();
        let state = session
            .create_project("Climate", WritingMode::Essay, None)
            .expect("create");
        let loaded = session.project(state.project.id).expect("load");
        assert_eq!(loaded, state);
        assert_eq!(session.project_count().expect("count"), 1);
    }

    #[test]
    fn missing_project_is_not_found() {
        let session = session();
        assert!(matches!(
            session.project(ProjectId(5)),
            Err(StageGateError::ProjectNotFound(ProjectId(5)))
        ));
    }

    #[test]
    fn failed_write_is_not_persisted() {
        let mut session = session();
        let id = session
            .create_project("Climate", WritingMode::Essay, None)
            .expect("create")
            .project
            .id;
        let err = session.write_content(id, &StageId::new("conclusion"), "text", None);
        assert!(matches!(err, Err(StageGateError::StageLocked(_))));
        let state = session.project(id).expect("load");
        assert_eq!(state.stage_status(&StageId::new("conclusion")), StageStatus::Locked);
    }

    #[test]
    fn write_then_evaluate_persists() {
        let mut session = session();
        let id = session
            .create_project("Climate", WritingMode::Essay, None)
            .expect("create")
            .project
            .id;
        let stage = StageId::new("thesis_statement");
        let text = "I argue that city governments must fund public transit because \
                    congestion and emissions are rising faster than any other policy can address.";
        session.write_content(id, &stage, text, None).expect("write");
        let eval = session.evaluate_stage(id, &stage).expect("evaluate");
        assert!(eval.result.is_completed, "{:?}", eval.result.detailed_feedback);

        let state = session.project(id).expect("load");
        assert_eq!(state.stage_status(&stage), StageStatus::Completed);
        assert_eq!(state.project.current_stage_id.as_str(), "planning");
    }

    #[test]
    fn archive_is_persisted() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("session.redb");
        let catalog = Arc::new(StageCatalog::builtin());

        let id = {
            let mut session = Session::with_redb(&db_path, Arc::clone(&catalog)).expect("open");
            assert!(session.is_persistent());
            let id = session
                .create_project("Thesis", WritingMode::Thesis, None)
                .expect("create")
                .project
                .id;
            session.archive_project(id).expect("archive");
            id
        };

        let session = Session::with_redb(&db_path, catalog).expect("reopen");
        let state = session.project(id).expect("load");
        assert_eq!(state.project.status, ProjectStatus::Archived);
    }
}
