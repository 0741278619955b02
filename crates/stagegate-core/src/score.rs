//! # Score Heuristic
//!
//! Aggregate score assigned when a project's final stage completes.
//!
//! This is a placeholder proxy, not a quality assessment: it only looks at
//! whether each stage has recorded feedback. Swap the [`ScoreHeuristic`]
//! implementation to change it; the state machine does not depend on the rule.
//!
//! Scores are integer tenths of a point on a 0..=100 scale (`85` renders as `8.5/10`).

use crate::primitives::{MAX_SCORE_TENTHS, STAGE_CREDIT_WITH_FEEDBACK, STAGE_CREDIT_WITHOUT_FEEDBACK};
use crate::progression::ProjectState;
use crate::registry::StageRegistry;

/// Computes a project's aggregate score on completion.
pub trait ScoreHeuristic: std::fmt::Debug + Send + Sync {
    /// Score in tenths of a point, `0..=MAX_SCORE_TENTHS`.
    fn score(&self, registry: &StageRegistry, state: &ProjectState) -> u16;
}

/// Mean of a fixed per-stage credit over every stage of the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCreditScorer {
    pub with_feedback: u16,
    pub without_feedback: u16,
}

impl Default for FixedCreditScorer {
    fn default() -> Self {
        Self {
            with_feedback: STAGE_CREDIT_WITH_FEEDBACK,
            without_feedback: STAGE_CREDIT_WITHOUT_FEEDBACK,
        }
    }
}

impl ScoreHeuristic for FixedCreditScorer {
    fn score(&self, registry: &StageRegistry, state: &ProjectState) -> u16 {
        let stages = registry.stages();
        if stages.is_empty() {
            return 0;
        }

        let total: u64 = stages
            .iter()
            .map(|def| {
                let has_feedback = state
                    .stages
                    .get(&def.id)
                    .is_some_and(|p| p.feedback.is_some());
                if has_feedback {
                    u64::from(self.with_feedback)
                } else {
                    u64::from(self.without_feedback)
                }
            })
            .sum();

        let count = u64::try_from(stages.len()).unwrap_or(u64::MAX);
        // Round half up.
        let mean = total
            .saturating_mul(2)
            .saturating_add(count)
            .checked_div(count.saturating_mul(2))
            .unwrap_or(0);
        u16::try_from(mean)
            .unwrap_or(MAX_SCORE_TENTHS)
            .min(MAX_SCORE_TENTHS)
    }
}

/// Render a tenths score as `X.Y/10`.
#[must_use]
pub fn format_score(tenths: u16) -> String {
    format!("{}.{}/10", tenths / 10, tenths % 10)
}
