//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the stage-progression engine:
//! - Identifiers (`ProjectId`, `StageId`, `RequirementId`)
//! - Lifecycle enums (`StageStatus`, `ProjectStatus`, `WritingMode`)
//! - Error types (`StageGateError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a writing project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a stage within a track (e.g. `thesis_statement`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId(pub String);

impl StageId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a requirement, unique within its stage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequirementId(pub String);

impl RequirementId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequirementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// LIFECYCLE ENUMS
// =============================================================================

/// Lifecycle of a single stage within a project.
///
/// `Locked < Unlocked < InProgress < Completed`; transitions only move forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Locked,
    Unlocked,
    InProgress,
    Completed,
}

impl StageStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Locked => "locked",
            StageStatus::Unlocked => "unlocked",
            StageStatus::InProgress => "in_progress",
            StageStatus::Completed => "completed",
        }
    }

    /// Whether content may still be written to a stage in this status.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, StageStatus::Unlocked | StageStatus::InProgress)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a project as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Archived,
}

impl ProjectStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The writing track a project follows. Each mode has its own stage registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum WritingMode {
    #[default]
    Essay,
    Thesis,
}

impl WritingMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WritingMode::Essay => "essay",
            WritingMode::Thesis => "thesis",
        }
    }

    /// Parse a mode name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "essay" => Some(WritingMode::Essay),
            "thesis" => Some(WritingMode::Thesis),
            _ => None,
        }
    }
}

impl fmt::Display for WritingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the stagegate engine.
///
/// - No silent failures
/// - Requirement evaluation itself never fails; only input validation and
///   state-machine guards produce errors
/// - The engine never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum StageGateError {
    /// Content was missing or not a string.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// Content exceeds the accepted size.
    #[error("Content length {len} exceeds maximum {max} bytes")]
    ContentTooLarge { len: usize, max: usize },

    /// The stage id is not part of the project's track.
    #[error("Unknown stage: {0}")]
    UnknownStage(StageId),

    /// The stage has not been unlocked yet.
    #[error("Stage is locked: {0}")]
    StageLocked(StageId),

    /// The stage is completed and no longer accepts edits.
    #[error("Stage is already completed: {0}")]
    StageCompleted(StageId),

    /// Unlock requested before the preceding stage completed.
    #[error("Cannot unlock {stage}: preceding stage {predecessor} is not completed")]
    PredecessorIncomplete { stage: StageId, predecessor: StageId },

    /// No project with this id exists.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The project is archived and read-only.
    #[error("Project is archived: {0}")]
    ProjectArchived(ProjectId),

    /// Optimistic version check failed on a content write.
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// The stage catalog configuration is invalid.
    #[error("Invalid registry: {0}")]
    InvalidRegistry(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl StageGateError {
    /// Whether the error was caused by caller input rather than engine state.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            StageGateError::InvalidContent(_)
                | StageGateError::ContentTooLarge { .. }
                | StageGateError::UnknownStage(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
