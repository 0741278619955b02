//! # Engine Primitives
//!
//! Hardcoded runtime constants for the stagegate engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Stage catalogs are configuration; the limits and messages below are not.

/// Magic bytes for the stagegate snapshot format header.
pub const MAGIC_BYTES: &[u8; 4] = b"SGTE";

/// Current snapshot serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum accepted content length in bytes (1 MiB).
///
/// Content longer than this is rejected before any evaluation runs.
pub const MAX_CONTENT_LENGTH: usize = 1024 * 1024;

/// Maximum number of requirements evaluated for a single stage.
pub const MAX_REQUIREMENTS_PER_STAGE: usize = 64;

// =============================================================================
// BUDGET
// =============================================================================

/// Synthetic requirement id recorded for the global word-limit check.
pub const WORD_LIMIT_REQUIREMENT_ID: &str = "word_limit";

/// Default word limit for newly created essay projects.
pub const DEFAULT_ESSAY_WORD_LIMIT: u32 = 500;

// =============================================================================
// SCORE HEURISTIC
// =============================================================================

/// Per-stage credit (tenths of a point, out of 100) when the stage has feedback.
pub const STAGE_CREDIT_WITH_FEEDBACK: u16 = 85;

/// Per-stage credit (tenths of a point) when the stage has no feedback.
pub const STAGE_CREDIT_WITHOUT_FEEDBACK: u16 = 50;

/// Upper bound of the score scale, in tenths (10.0).
pub const MAX_SCORE_TENTHS: u16 = 100;

// =============================================================================
// FEEDBACK MESSAGES
// =============================================================================

/// Final stage completed with every requirement passing.
pub const FEEDBACK_PROJECT_COMPLETE: &str =
    "Excellent! Your work is complete and meets all requirements. Congratulations!";

/// Non-final stage completed with every requirement passing.
pub const FEEDBACK_ADVANCE: &str = "All requirements met! You can proceed to the next stage.";

/// No requirement passed.
pub const FEEDBACK_INSUFFICIENT: &str =
    "Try adding more content and ensure you address all requirements.";
