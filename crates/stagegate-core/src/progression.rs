//! # Stage Progression State Machine
//!
//! Owns the lifecycle of each stage of a project:
//!
//! ```text
//! locked --(predecessor completed)--> unlocked --(non-empty write)--> in_progress
//!    unlocked / in_progress --(evaluation with no failures)--> completed
//! ```
//!
//! `completed` is terminal: further writes are rejected and re-evaluation
//! leaves the stage untouched. A `StageProgress` record exists only for stages
//! that have been unlocked; a stage without a record is locked.
//!
//! The engine works on an in-memory [`ProjectState`] snapshot. Callers load the
//! snapshot, apply one operation, and store it back; serialising concurrent
//! operations on the same project is the caller's job.

use crate::evaluator::{BudgetCheck, EvaluationContext, EvaluationResult, evaluate_stage, validate_content};
use crate::metrics::word_count;
use crate::registry::{StageCatalog, StageRegistry};
use crate::requirement::RequirementSpec;
use crate::score::{FixedCreditScorer, ScoreHeuristic};
use crate::{
    ProjectId, ProjectStatus, RequirementId, StageGateError, StageId, StageStatus, WritingMode,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// =============================================================================
// STATE RECORDS
// =============================================================================

/// A writing project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub mode: WritingMode,
    /// Stage the writer is on. Never points at a locked stage; only moves forward.
    pub current_stage_id: StageId,
    /// Ceiling on counted words; `None` is unbounded.
    pub word_limit: Option<u32>,
    pub status: ProjectStatus,
    /// Tenths of a point, set when the final stage completes.
    pub overall_score: Option<u16>,
}

impl Project {
    #[must_use]
    pub fn new(
        id: ProjectId,
        title: impl Into<String>,
        mode: WritingMode,
        word_limit: Option<u32>,
        first_stage: StageId,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            mode,
            current_stage_id: first_stage,
            word_limit,
            status: ProjectStatus::Draft,
            overall_score: None,
        }
    }
}

/// Per-stage progress of one project. Created when the stage is unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    pub project_id: ProjectId,
    pub stage_id: StageId,
    pub content: String,
    /// Content as it was before the most recent write.
    pub previous_content: Option<String>,
    pub status: StageStatus,
    /// Requirement set seeded from the registry at unlock time.
    pub requirements: Vec<RequirementSpec>,
    /// Replaced wholesale by every evaluation.
    pub passed_requirement_ids: BTreeSet<RequirementId>,
    pub failed_requirement_ids: BTreeSet<RequirementId>,
    pub feedback: Option<String>,
    pub detailed_feedback: Vec<String>,
    pub evaluation_count: u32,
    /// Bumped on every content write.
    pub version: u64,
}

impl StageProgress {
    /// A freshly unlocked stage with no content.
    #[must_use]
    pub fn new(project_id: ProjectId, stage_id: StageId, requirements: Vec<RequirementSpec>) -> Self {
        Self {
            project_id,
            stage_id,
            content: String::new(),
            previous_content: None,
            status: StageStatus::Unlocked,
            requirements,
            passed_requirement_ids: BTreeSet::new(),
            failed_requirement_ids: BTreeSet::new(),
            feedback: None,
            detailed_feedback: Vec::new(),
            evaluation_count: 0,
            version: 0,
        }
    }

    #[must_use]
    pub fn word_count(&self) -> u32 {
        word_count(&self.content)
    }
}

/// A project together with its stage records: the unit the engine operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    pub project: Project,
    pub stages: BTreeMap<StageId, StageProgress>,
}

impl ProjectState {
    #[must_use]
    pub fn stage(&self, id: &StageId) -> Option<&StageProgress> {
        self.stages.get(id)
    }

    /// Status of a stage; stages without a record are locked.
    #[must_use]
    pub fn stage_status(&self, id: &StageId) -> StageStatus {
        self.stages.get(id).map_or(StageStatus::Locked, |p| p.status)
    }

    /// Sum of word counts over all stages that count toward the budget.
    #[must_use]
    pub fn counted_words(&self, registry: &StageRegistry) -> u32 {
        self.counted_words_excluding(registry, None)
    }

    /// Counted words, leaving out `excluded` if given.
    #[must_use]
    pub fn counted_words_excluding(&self, registry: &StageRegistry, excluded: Option<&StageId>) -> u32 {
        self.stages
            .values()
            .filter(|p| Some(&p.stage_id) != excluded)
            .filter(|p| registry.counts_toward_budget(&p.stage_id))
            .fold(0u32, |acc, p| acc.saturating_add(p.word_count()))
    }

    /// Counted words if `stage` held `new_words` words instead of its current content.
    #[must_use]
    pub fn projected_counted_words(&self, registry: &StageRegistry, stage: &StageId, new_words: u32) -> u32 {
        let others = self.counted_words_excluding(registry, Some(stage));
        if registry.counts_toward_budget(stage) {
            others.saturating_add(new_words)
        } else {
            others
        }
    }

    fn ensure_active(&self) -> Result<(), StageGateError> {
        if self.project.status == ProjectStatus::Archived {
            return Err(StageGateError::ProjectArchived(self.project.id));
        }
        Ok(())
    }
}

// =============================================================================
// OPERATION RESULTS
// =============================================================================

/// Result of a content write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub stage_id: StageId,
    pub version: u64,
    pub status: StageStatus,
    pub word_count: u32,
    /// Projected budget, when the stage counts and the project has a limit.
    pub budget: Option<BudgetCheck>,
}

impl WriteOutcome {
    /// Advisory: the write was saved but the project is now over its limit.
    #[must_use]
    pub fn over_word_limit(&self) -> bool {
        self.budget.is_some_and(|b| b.exceeded)
    }
}

/// What an evaluation did to the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Some requirement failed; the stage stays open.
    Pending,
    /// The stage was already completed; nothing changed.
    Unchanged,
    /// The stage completed and its successor was unlocked.
    Advanced { next_stage_id: StageId },
    /// The final stage completed.
    ProjectCompleted { overall_score: u16 },
}

/// Result of evaluating a project stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEvaluation {
    pub stage_id: StageId,
    pub result: EvaluationResult,
    pub transition: Transition,
}

/// Pure advance decision for a stage given its evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceDecision {
    /// Successor in the track, or `None` if the stage is terminal or unknown.
    pub next_stage_id: Option<StageId>,
    pub should_unlock: bool,
}

/// Decide whether an evaluation unlocks the next stage.
///
/// Unlock happens only when the evaluation completed the stage with no failed
/// requirements and a successor exists. A result that claims completion while
/// listing failures does not unlock.
#[must_use]
pub fn advance_stage(
    registry: &StageRegistry,
    current: &StageId,
    result: &EvaluationResult,
) -> AdvanceDecision {
    let next_stage_id = registry.successor(current).map(|s| s.id.clone());
    let should_unlock = result.is_completed
        && result.failed_requirement_ids.is_empty()
        && next_stage_id.is_some();
    AdvanceDecision {
        next_stage_id,
        should_unlock,
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Applies state-machine operations to project snapshots.
#[derive(Debug, Clone)]
pub struct ProgressionEngine {
    catalog: Arc<StageCatalog>,
    scorer: Arc<dyn ScoreHeuristic>,
}

impl ProgressionEngine {
    /// Engine with the default [`FixedCreditScorer`].
    #[must_use]
    pub fn new(catalog: Arc<StageCatalog>) -> Self {
        Self::with_scorer(catalog, Arc::new(FixedCreditScorer::default()))
    }

    #[must_use]
    pub fn with_scorer(catalog: Arc<StageCatalog>, scorer: Arc<dyn ScoreHeuristic>) -> Self {
        Self { catalog, scorer }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<StageCatalog> {
        &self.catalog
    }

    pub fn registry(&self, mode: WritingMode) -> Result<&StageRegistry, StageGateError> {
        self.catalog.registry(mode)
    }

    /// Create a project with its first stage unlocked.
    ///
    /// A `None` word limit takes the track's default.
    pub fn start_project(
        &self,
        id: ProjectId,
        title: impl Into<String>,
        mode: WritingMode,
        word_limit: Option<u32>,
    ) -> Result<ProjectState, StageGateError> {
        let registry = self.registry(mode)?;
        let first = registry.first().ok_or_else(|| {
            StageGateError::InvalidRegistry(format!("track '{}' has no stages", mode))
        })?;

        let project = Project::new(
            id,
            title,
            mode,
            word_limit.or(registry.default_word_limit()),
            first.id.clone(),
        );
        let progress = StageProgress::new(id, first.id.clone(), first.requirements.clone());

        let mut stages = BTreeMap::new();
        stages.insert(first.id.clone(), progress);

        tracing::info!(project = %id, mode = %mode, first_stage = %first.id, "Project started");
        Ok(ProjectState { project, stages })
    }

    /// Unlock `stage_id` if its predecessor is completed.
    ///
    /// Returns `true` when the stage transitioned, `false` if it was already open.
    pub fn unlock(&self, state: &mut ProjectState, stage_id: &StageId) -> Result<bool, StageGateError> {
        state.ensure_active()?;
        let registry = self.registry(state.project.mode)?;
        let definition = registry
            .get(stage_id)
            .ok_or_else(|| StageGateError::UnknownStage(stage_id.clone()))?;

        if let Some(predecessor) = registry.predecessor(stage_id) {
            if state.stage_status(&predecessor.id) != StageStatus::Completed {
                return Err(StageGateError::PredecessorIncomplete {
                    stage: stage_id.clone(),
                    predecessor: predecessor.id.clone(),
                });
            }
        }

        if state.stage_status(stage_id) != StageStatus::Locked {
            return Ok(false);
        }

        state.stages.insert(
            stage_id.clone(),
            StageProgress::new(
                state.project.id,
                stage_id.clone(),
                definition.requirements.clone(),
            ),
        );
        tracing::debug!(project = %state.project.id, stage = %stage_id, "Stage unlocked");
        Ok(true)
    }

    /// Overwrite a stage's content.
    ///
    /// The write is saved even when it pushes the project over its word limit;
    /// the outcome reports the projected budget instead.
    pub fn write_content(
        &self,
        state: &mut ProjectState,
        stage_id: &StageId,
        content: &str,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, StageGateError> {
        validate_content(content)?;
        state.ensure_active()?;
        let registry = self.registry(state.project.mode)?;
        if !registry.contains(stage_id) {
            return Err(StageGateError::UnknownStage(stage_id.clone()));
        }

        let new_words = word_count(content);
        let budget = match state.project.word_limit {
            Some(limit) if registry.counts_toward_budget(stage_id) => Some(BudgetCheck::project(
                limit,
                state.counted_words_excluding(registry, Some(stage_id)),
                new_words,
            )),
            _ => None,
        };

        let progress = state
            .stages
            .get_mut(stage_id)
            .ok_or_else(|| StageGateError::StageLocked(stage_id.clone()))?;
        match progress.status {
            StageStatus::Locked => return Err(StageGateError::StageLocked(stage_id.clone())),
            StageStatus::Completed => return Err(StageGateError::StageCompleted(stage_id.clone())),
            StageStatus::Unlocked | StageStatus::InProgress => {}
        }
        if let Some(expected) = expected_version {
            if expected != progress.version {
                return Err(StageGateError::VersionConflict {
                    expected,
                    actual: progress.version,
                });
            }
        }

        let previous = std::mem::replace(&mut progress.content, content.to_string());
        progress.previous_content = Some(previous);
        progress.version = progress.version.saturating_add(1);

        let has_text = !content.trim().is_empty();
        if has_text && progress.status == StageStatus::Unlocked {
            progress.status = StageStatus::InProgress;
        }
        let outcome = WriteOutcome {
            stage_id: stage_id.clone(),
            version: progress.version,
            status: progress.status,
            word_count: new_words,
            budget,
        };

        if has_text && state.project.status == ProjectStatus::Draft {
            state.project.status = ProjectStatus::InProgress;
        }
        if let Some(check) = budget.filter(|b| b.exceeded) {
            tracing::warn!(
                project = %state.project.id,
                stage = %stage_id,
                projected = check.projected,
                limit = check.limit,
                "Write accepted over the project word limit"
            );
        }

        Ok(outcome)
    }

    /// Evaluate a stage's current content and apply the resulting transition.
    pub fn evaluate(
        &self,
        state: &mut ProjectState,
        stage_id: &StageId,
    ) -> Result<StageEvaluation, StageGateError> {
        state.ensure_active()?;
        let registry = self.registry(state.project.mode)?;
        if !registry.contains(stage_id) {
            return Err(StageGateError::UnknownStage(stage_id.clone()));
        }

        let context = EvaluationContext {
            word_limit: state
                .project
                .word_limit
                .filter(|_| registry.counts_toward_budget(stage_id)),
            counted_words_excluding_this_stage: Some(
                state.counted_words_excluding(registry, Some(stage_id)),
            ),
            is_final_stage: registry.is_final(stage_id),
        };

        let progress = state
            .stages
            .get_mut(stage_id)
            .ok_or_else(|| StageGateError::StageLocked(stage_id.clone()))?;
        let result = evaluate_stage(&progress.content, &progress.requirements, &context)?;

        match progress.status {
            StageStatus::Locked => return Err(StageGateError::StageLocked(stage_id.clone())),
            StageStatus::Completed => {
                return Ok(StageEvaluation {
                    stage_id: stage_id.clone(),
                    result,
                    transition: Transition::Unchanged,
                });
            }
            StageStatus::Unlocked | StageStatus::InProgress => {}
        }

        progress.passed_requirement_ids = result.passed_requirement_ids.iter().cloned().collect();
        progress.failed_requirement_ids = result.failed_requirement_ids.iter().cloned().collect();
        progress.feedback = Some(result.feedback.clone());
        progress.detailed_feedback = result.detailed_feedback.clone();
        progress.evaluation_count = progress.evaluation_count.saturating_add(1);

        if !result.is_completed {
            tracing::debug!(
                project = %state.project.id,
                stage = %stage_id,
                failed = result.failed_requirement_ids.len(),
                "Stage evaluated; requirements outstanding"
            );
            return Ok(StageEvaluation {
                stage_id: stage_id.clone(),
                result,
                transition: Transition::Pending,
            });
        }

        progress.status = StageStatus::Completed;
        tracing::info!(project = %state.project.id, stage = %stage_id, "Stage completed");

        let decision = advance_stage(registry, stage_id, &result);
        let transition = match decision.next_stage_id {
            Some(next) if decision.should_unlock => {
                self.unlock(state, &next)?;
                let moves_forward = registry.position(&next) > registry.position(&state.project.current_stage_id);
                if moves_forward {
                    state.project.current_stage_id = next.clone();
                }
                Transition::Advanced {
                    next_stage_id: next,
                }
            }
            _ => {
                let overall_score = self.scorer.score(registry, state);
                state.project.status = ProjectStatus::Completed;
                state.project.overall_score = Some(overall_score);
                tracing::info!(
                    project = %state.project.id,
                    score = overall_score,
                    "Project completed"
                );
                Transition::ProjectCompleted { overall_score }
            }
        };

        Ok(StageEvaluation {
            stage_id: stage_id.clone(),
            result,
            transition,
        })
    }

    /// Archive a project. Archived projects are read-only.
    pub fn archive(&self, state: &mut ProjectState) {
        if state.project.status != ProjectStatus::Archived {
            state.project.status = ProjectStatus::Archived;
            tracing::info!(project = %state.project.id, "Project archived");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
