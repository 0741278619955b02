//! # stagegate-core
//!
//! The stage-progression engine for gated writing workflows - THE LOGIC.
//!
//! A writer may not move to the next stage of an essay or thesis until the
//! current stage's content satisfies its declarative requirements. This crate
//! holds everything with real invariants:
//!
//! - `evaluator`: pure pass/fail rules and feedback text
//! - `registry`: the immutable stage catalog, one track per writing mode
//! - `progression`: the per-stage state machine and word-budget accounting
//!
//! plus the project store that persists snapshots between calls.
//!
//! ## Architectural Constraints
//!
//! - No async, no network
//! - Integer arithmetic only
//! - The catalog is passed in explicitly; there is no global registry
//! - All fallible operations return [`StageGateError`]; nothing panics

// =============================================================================
// MODULES
// =============================================================================

pub mod evaluator;
pub mod formats;
pub mod metrics;
pub mod primitives;
pub mod progression;
pub mod registry;
pub mod requirement;
pub mod score;
pub mod session;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    ProjectId, ProjectStatus, RequirementId, StageGateError, StageId, StageStatus, WritingMode,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use evaluator::{
    BudgetCheck, EvaluationContext, EvaluationResult, RequirementOutcome, evaluate_requirement,
    evaluate_stage, require_content, select_feedback,
};
pub use metrics::ContentMetrics;
pub use progression::{
    AdvanceDecision, ProgressionEngine, Project, ProjectState, StageEvaluation, StageProgress,
    Transition, WriteOutcome, advance_stage,
};
pub use registry::{
    RegistryConfig, StageCatalog, StageConfig, StageDefinition, StageRegistry, TrackConfig,
};
pub use requirement::{RequirementDraft, RequirementKind, RequirementSpec};
pub use score::{FixedCreditScorer, ScoreHeuristic, format_score};

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use formats::{PersistenceHeader, state_from_bytes, state_to_bytes};
pub use session::{Session, StorageBackend};
pub use storage::{MemoryStore, ProjectStore, RedbStore};
