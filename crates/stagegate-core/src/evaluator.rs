//! # Requirement Evaluator
//!
//! Pure functions deciding pass/fail for a stage's requirements and producing
//! human-readable feedback.
//!
//! ## Rules
//!
//! | Kind | Passes when |
//! |------|-------------|
//! | `word_count` | `min <= words <= max` (absent bounds are open) |
//! | `contains_keywords` | any keyword occurs, case-insensitively; empty list passes |
//! | `structure_check` | paragraphs >= `min_paragraphs` (absent minimum passes) |
//! | unknown | always (logged as a diagnostic) |
//!
//! The global word limit is checked independently of the stage's own
//! requirements and recorded under [`WORD_LIMIT_REQUIREMENT_ID`]. Exceeding it
//! blocks completion but never blocks saving content.

use crate::metrics::ContentMetrics;
use crate::primitives::{
    FEEDBACK_ADVANCE, FEEDBACK_INSUFFICIENT, FEEDBACK_PROJECT_COMPLETE, MAX_CONTENT_LENGTH,
    WORD_LIMIT_REQUIREMENT_ID,
};
use crate::requirement::{RequirementKind, RequirementSpec};
use crate::{RequirementId, StageGateError};
use serde::{Deserialize, Serialize};

// =============================================================================
// INPUT VALIDATION
// =============================================================================

/// Reject absent content. This is the only fatal input condition.
pub fn require_content(content: Option<&str>) -> Result<&str, StageGateError> {
    let content = content.ok_or_else(|| {
        StageGateError::InvalidContent("Content is required and must be a string".to_string())
    })?;
    validate_content(content)?;
    Ok(content)
}

/// Reject content larger than [`MAX_CONTENT_LENGTH`].
pub fn validate_content(content: &str) -> Result<(), StageGateError> {
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(StageGateError::ContentTooLarge {
            len: content.len(),
            max: MAX_CONTENT_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// PER-REQUIREMENT EVALUATION
// =============================================================================

/// Result of evaluating one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementOutcome {
    pub id: RequirementId,
    pub passed: bool,
    pub message: String,
}

/// Evaluate a single requirement against content and its derived metrics.
#[must_use]
pub fn evaluate_requirement(
    spec: &RequirementSpec,
    content: &str,
    metrics: &ContentMetrics,
) -> RequirementOutcome {
    let (passed, message) = match &spec.kind {
        RequirementKind::WordCount { min, max } => check_word_count(metrics.word_count, *min, *max),
        RequirementKind::ContainsKeywords { keywords } => check_keywords(content, keywords),
        RequirementKind::StructureCheck { min_paragraphs } => {
            check_paragraphs(metrics.paragraph_count, *min_paragraphs)
        }
        RequirementKind::Unknown { kind } => {
            tracing::warn!(
                requirement = %spec.id,
                kind = %kind,
                "Unknown requirement kind; treating as passed"
            );
            (true, format!("Unknown requirement type: {}", kind))
        }
    };

    RequirementOutcome {
        id: spec.id.clone(),
        passed,
        message,
    }
}

fn check_word_count(words: u32, min: Option<u32>, max: Option<u32>) -> (bool, String) {
    let min = min.unwrap_or(0);
    match max {
        _ if words < min => (
            false,
            format!("Too short: {} words (minimum {})", words, min),
        ),
        Some(max) if words > max => (
            false,
            format!("Too long: {} words (maximum {})", words, max),
        ),
        _ => (true, format!("Good length: {} words", words)),
    }
}

fn check_keywords(content: &str, keywords: &[String]) -> (bool, String) {
    if keywords.is_empty() {
        return (true, "No keywords specified to check".to_string());
    }

    let haystack = content.to_lowercase();
    let found: Vec<&str> = keywords
        .iter()
        .filter(|k| haystack.contains(&k.to_lowercase()))
        .map(String::as_str)
        .collect();

    if found.is_empty() {
        (
            false,
            format!("Missing required keywords: {}", keywords.join(", ")),
        )
    } else {
        (true, format!("Found keywords: {}", found.join(", ")))
    }
}

fn check_paragraphs(paragraphs: u32, min_paragraphs: Option<u32>) -> (bool, String) {
    let Some(min) = min_paragraphs else {
        return (true, "No paragraph minimum specified".to_string());
    };
    if paragraphs >= min {
        (
            true,
            format!("Found {} paragraphs (minimum {})", paragraphs, min),
        )
    } else {
        (
            false,
            format!("Too few paragraphs: {} (minimum {})", paragraphs, min),
        )
    }
}

// =============================================================================
// STAGE EVALUATION
// =============================================================================

/// Caller-supplied facts the evaluator cannot derive from content alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Global counted-word ceiling; `None` means unbounded.
    pub word_limit: Option<u32>,
    /// Counted words in every other counted stage of the project.
    pub counted_words_excluding_this_stage: Option<u32>,
    pub is_final_stage: bool,
}

/// Outcome of the global word-budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCheck {
    pub limit: u32,
    /// Counted words with this stage's contribution replaced by the new content.
    pub projected: u32,
    pub exceeded: bool,
}

impl BudgetCheck {
    #[must_use]
    pub fn project(limit: u32, counted_elsewhere: u32, stage_words: u32) -> Self {
        let projected = counted_elsewhere.saturating_add(stage_words);
        Self {
            limit,
            projected,
            exceeded: projected > limit,
        }
    }

    fn message(&self) -> String {
        if self.exceeded {
            format!("Exceeds word limit: {} > {}", self.projected, self.limit)
        } else {
            format!("Within word limit: {}/{}", self.projected, self.limit)
        }
    }
}

/// Result of evaluating a stage's full requirement set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub passed_requirement_ids: Vec<RequirementId>,
    pub failed_requirement_ids: Vec<RequirementId>,
    pub is_completed: bool,
    pub feedback: String,
    pub detailed_feedback: Vec<String>,
    pub word_count: u32,
    pub character_count: u32,
    /// Per-requirement outcomes in requirement order.
    pub outcomes: Vec<RequirementOutcome>,
    /// Present when a word limit applied to this evaluation.
    pub budget: Option<BudgetCheck>,
}

impl EvaluationResult {
    /// Whether the global word budget was exceeded.
    #[must_use]
    pub fn over_word_limit(&self) -> bool {
        self.budget.is_some_and(|b| b.exceeded)
    }

    #[must_use]
    pub fn total_checks(&self) -> usize {
        self.passed_requirement_ids
            .len()
            .saturating_add(self.failed_requirement_ids.len())
    }
}

/// Evaluate content against a stage's requirements.
///
/// Requirements are independent; the feedback list keeps their order.
pub fn evaluate_stage(
    content: &str,
    requirements: &[RequirementSpec],
    context: &EvaluationContext,
) -> Result<EvaluationResult, StageGateError> {
    validate_content(content)?;

    let metrics = ContentMetrics::from_content(content);
    let mut passed = Vec::new();
    let mut failed = Vec::new();
    let mut detailed = Vec::with_capacity(requirements.len().saturating_add(1));

    let budget = context.word_limit.map(|limit| {
        BudgetCheck::project(
            limit,
            context.counted_words_excluding_this_stage.unwrap_or(0),
            metrics.word_count,
        )
    });

    if let Some(check) = budget {
        if check.exceeded {
            tracing::warn!(
                projected = check.projected,
                limit = check.limit,
                "Counted words exceed the project word limit"
            );
            failed.push(RequirementId::new(WORD_LIMIT_REQUIREMENT_ID));
        } else {
            passed.push(RequirementId::new(WORD_LIMIT_REQUIREMENT_ID));
        }
        detailed.push(check.message());
    }

    let outcomes: Vec<RequirementOutcome> = requirements
        .iter()
        .map(|spec| {
            let outcome = evaluate_requirement(spec, content, &metrics);
            detailed.push(format!("{}: {}", spec.label(), outcome.message));
            if outcome.passed {
                passed.push(outcome.id.clone());
            } else {
                failed.push(outcome.id.clone());
            }
            outcome
        })
        .collect();

    let is_completed = failed.is_empty();
    let feedback = select_feedback(passed.len(), failed.len(), context.is_final_stage);

    tracing::debug!(
        passed = passed.len(),
        failed = failed.len(),
        words = metrics.word_count,
        "Stage evaluated"
    );

    Ok(EvaluationResult {
        passed_requirement_ids: passed,
        failed_requirement_ids: failed,
        is_completed,
        feedback,
        detailed_feedback: detailed,
        word_count: metrics.word_count,
        character_count: metrics.character_count,
        outcomes,
        budget,
    })
}

/// Pick the aggregate feedback message, in priority order.
#[must_use]
pub fn select_feedback(passed: usize, failed: usize, is_final_stage: bool) -> String {
    if failed == 0 && is_final_stage {
        FEEDBACK_PROJECT_COMPLETE.to_string()
    } else if failed == 0 {
        FEEDBACK_ADVANCE.to_string()
    } else if passed == 0 {
        FEEDBACK_INSUFFICIENT.to_string()
    } else {
        format!(
            "Good progress! {} of {} requirements met. Review the feedback below.",
            passed,
            passed.saturating_add(failed)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
