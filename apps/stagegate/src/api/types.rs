//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. Field names are `camelCase` on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stagegate_core::{
    EvaluationResult, ProjectState, RequirementDraft, RequirementId, RequirementSpec,
    StageEvaluation, StageId, StageRegistry, Transition, WriteOutcome, WritingMode, format_score,
};

fn ids(ids: &[RequirementId]) -> Vec<String> {
    ids.iter().map(|id| id.0.clone()).collect()
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Generic error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// CHECK REQUIREMENTS
// =============================================================================

/// Stateless evaluation request.
///
/// `content` and `requirements` stay loosely typed so that a wrong type is
/// reported as a validation error (content) or degraded (requirements)
/// instead of failing the whole body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckRequirementsRequest {
    pub project_id: Option<Value>,
    pub stage_id: Option<String>,
    pub content: Option<Value>,
    pub requirements: Option<Value>,
    /// `0` or absent means no limit.
    pub word_limit: Option<u32>,
    pub counted_words_excluding_this_stage: Option<u32>,
    pub current_stage_index: Option<u32>,
    pub is_last_stage: Option<bool>,
}

impl CheckRequirementsRequest {
    /// Parse the requirement list. Non-arrays yield no requirements.
    pub fn requirement_specs(&self) -> Vec<RequirementSpec> {
        match &self.requirements {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| parse_requirement(item, i))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn effective_word_limit(&self) -> Option<u32> {
        self.word_limit.filter(|limit| *limit > 0)
    }
}

/// Parse one requirement object. Anything unparseable becomes an unknown kind.
pub fn parse_requirement(value: &Value, position: usize) -> RequirementSpec {
    match serde_json::from_value::<RequirementDraft>(value.clone()) {
        Ok(draft) => draft.into_spec(position),
        Err(e) => {
            tracing::warn!(position, error = %e, "Malformed requirement; treating as unknown");
            RequirementDraft {
                id: value.get("id").and_then(Value::as_str).map(str::to_string),
                kind: Some("malformed".to_string()),
                description: value
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                ..RequirementDraft::default()
            }
            .into_spec(position)
        }
    }
}

/// Stateless evaluation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequirementsResponse {
    pub passed_requirements: Vec<String>,
    pub failed_requirements: Vec<String>,
    pub is_completed: bool,
    pub feedback: String,
    pub detailed_feedback: Vec<String>,
    pub word_count: u32,
    pub character_count: u32,
    pub is_last_stage_completed: bool,
    /// RFC 3339.
    pub timestamp: String,
}

impl CheckRequirementsResponse {
    pub fn from_result(result: EvaluationResult, is_last_stage: bool, timestamp: String) -> Self {
        Self {
            passed_requirements: ids(&result.passed_requirement_ids),
            failed_requirements: ids(&result.failed_requirement_ids),
            is_completed: result.is_completed,
            is_last_stage_completed: is_last_stage && result.is_completed,
            feedback: result.feedback,
            detailed_feedback: result.detailed_feedback,
            word_count: result.word_count,
            character_count: result.character_count,
            timestamp,
        }
    }
}

/// Error body of the check endpoint: the error plus an empty result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequirementsError {
    pub error: String,
    pub passed_requirements: Vec<String>,
    pub failed_requirements: Vec<String>,
    pub is_completed: bool,
    pub feedback: String,
    pub detailed_feedback: Vec<String>,
}

impl CheckRequirementsError {
    pub fn new(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            detailed_feedback: vec![format!("Error: {}", error)],
            error,
            passed_requirements: Vec::new(),
            failed_requirements: Vec::new(),
            is_completed: false,
            feedback: "Error checking requirements. Please try again.".to_string(),
        }
    }
}

// =============================================================================
// ADVANCE
// =============================================================================

/// Evaluation facts the advance decision needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluationSummary {
    pub is_completed: bool,
    pub passed_requirements: Vec<String>,
    pub failed_requirements: Vec<String>,
}

impl From<EvaluationSummary> for EvaluationResult {
    fn from(summary: EvaluationSummary) -> Self {
        let is_completed = summary.is_completed && summary.failed_requirements.is_empty();
        EvaluationResult {
            passed_requirement_ids: summary
                .passed_requirements
                .into_iter()
                .map(RequirementId::new)
                .collect(),
            failed_requirement_ids: summary
                .failed_requirements
                .into_iter()
                .map(RequirementId::new)
                .collect(),
            is_completed,
            ..EvaluationResult::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    #[serde(default)]
    pub mode: WritingMode,
    pub current_stage_id: String,
    pub evaluation_result: EvaluationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    pub next_stage_id: Option<String>,
    pub should_unlock: bool,
}

// =============================================================================
// STAGE CATALOG
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageJson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub order: usize,
    pub counts_toward_budget: bool,
    pub requirements: Vec<RequirementDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagesResponse {
    pub mode: WritingMode,
    pub default_word_limit: Option<u32>,
    pub stages: Vec<StageJson>,
}

impl From<&StageRegistry> for StagesResponse {
    fn from(registry: &StageRegistry) -> Self {
        Self {
            mode: registry.mode(),
            default_word_limit: registry.default_word_limit(),
            stages: registry
                .stages()
                .iter()
                .map(|s| StageJson {
                    id: s.id.0.clone(),
                    title: s.title.clone(),
                    description: s.description.clone(),
                    order: s.order,
                    counts_toward_budget: s.counts_toward_budget,
                    requirements: s.requirements.iter().map(RequirementDraft::from).collect(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub mode: WritingMode,
    /// Absent takes the track's default limit.
    #[serde(default)]
    pub word_limit: Option<u32>,
}

/// One stage of a project, including locked stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgressJson {
    pub stage_id: String,
    pub title: String,
    pub status: String,
    pub counts_toward_budget: bool,
    pub content: String,
    pub previous_content: Option<String>,
    pub version: u64,
    pub word_count: u32,
    pub passed_requirements: Vec<String>,
    pub failed_requirements: Vec<String>,
    pub feedback: Option<String>,
    pub detailed_feedback: Vec<String>,
    pub evaluation_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectJson {
    pub id: u64,
    pub title: String,
    pub mode: WritingMode,
    pub status: String,
    pub current_stage_id: String,
    pub word_limit: Option<u32>,
    pub counted_words: u32,
    /// `X.Y/10` once the project is complete.
    pub overall_score: Option<String>,
    pub stages: Vec<StageProgressJson>,
}

impl ProjectJson {
    pub fn from_state(state: &ProjectState, registry: &StageRegistry) -> Self {
        let stages = registry
            .stages()
            .iter()
            .map(|def| {
                let progress = state.stage(&def.id);
                StageProgressJson {
                    stage_id: def.id.0.clone(),
                    title: def.title.clone(),
                    status: state.stage_status(&def.id).as_str().to_string(),
                    counts_toward_budget: def.counts_toward_budget,
                    content: progress.map(|p| p.content.clone()).unwrap_or_default(),
                    previous_content: progress.and_then(|p| p.previous_content.clone()),
                    version: progress.map_or(0, |p| p.version),
                    word_count: progress.map_or(0, |p| p.word_count()),
                    passed_requirements: progress
                        .map(|p| p.passed_requirement_ids.iter().map(|id| id.0.clone()).collect())
                        .unwrap_or_default(),
                    failed_requirements: progress
                        .map(|p| p.failed_requirement_ids.iter().map(|id| id.0.clone()).collect())
                        .unwrap_or_default(),
                    feedback: progress.and_then(|p| p.feedback.clone()),
                    detailed_feedback: progress
                        .map(|p| p.detailed_feedback.clone())
                        .unwrap_or_default(),
                    evaluation_count: progress.map_or(0, |p| p.evaluation_count),
                }
            })
            .collect();

        Self {
            id: state.project.id.0,
            title: state.project.title.clone(),
            mode: state.project.mode,
            status: state.project.status.as_str().to_string(),
            current_stage_id: state.project.current_stage_id.0.clone(),
            word_limit: state.project.word_limit,
            counted_words: state.counted_words(registry),
            overall_score: state.project.overall_score.map(format_score),
            stages,
        }
    }
}

/// List entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: u64,
    pub title: String,
    pub mode: WritingMode,
    pub status: String,
    pub current_stage_id: String,
}

impl From<&ProjectState> for ProjectSummary {
    fn from(state: &ProjectState) -> Self {
        Self {
            id: state.project.id.0,
            title: state.project.title.clone(),
            mode: state.project.mode,
            status: state.project.status.as_str().to_string(),
            current_stage_id: state.project.current_stage_id.0.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteContentRequest {
    pub content: Option<Value>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteContentResponse {
    pub stage_id: String,
    pub version: u64,
    pub status: String,
    pub word_count: u32,
    pub over_word_limit: bool,
    pub projected_counted_words: Option<u32>,
    pub word_limit: Option<u32>,
}

impl From<WriteOutcome> for WriteContentResponse {
    fn from(outcome: WriteOutcome) -> Self {
        Self {
            over_word_limit: outcome.over_word_limit(),
            stage_id: outcome.stage_id.0,
            version: outcome.version,
            status: outcome.status.as_str().to_string(),
            word_count: outcome.word_count,
            projected_counted_words: outcome.budget.map(|b| b.projected),
            word_limit: outcome.budget.map(|b| b.limit),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub stage_id: String,
    pub passed_requirements: Vec<String>,
    pub failed_requirements: Vec<String>,
    pub is_completed: bool,
    pub feedback: String,
    pub detailed_feedback: Vec<String>,
    pub word_count: u32,
    pub character_count: u32,
    /// `pending`, `unchanged`, `advanced` or `project_completed`.
    pub transition: String,
    pub next_stage_id: Option<String>,
    pub overall_score: Option<String>,
}

impl From<StageEvaluation> for EvaluateResponse {
    fn from(evaluation: StageEvaluation) -> Self {
        let (transition, next_stage_id, overall_score) = match evaluation.transition {
            Transition::Pending => ("pending", None, None),
            Transition::Unchanged => ("unchanged", None, None),
            Transition::Advanced { next_stage_id } => {
                ("advanced", Some(next_stage_id.0), None)
            }
            Transition::ProjectCompleted { overall_score } => {
                ("project_completed", None, Some(format_score(overall_score)))
            }
        };
        let result = evaluation.result;
        Self {
            stage_id: evaluation.stage_id.0,
            passed_requirements: ids(&result.passed_requirement_ids),
            failed_requirements: ids(&result.failed_requirement_ids),
            is_completed: result.is_completed,
            feedback: result.feedback,
            detailed_feedback: result.detailed_feedback,
            word_count: result.word_count,
            character_count: result.character_count,
            transition: transition.to_string(),
            next_stage_id,
            overall_score,
        }
    }
}

/// Path parameters for stage routes.
#[derive(Debug, Clone, Deserialize)]
pub struct StagePath {
    pub id: u64,
    pub stage_id: String,
}

impl StagePath {
    pub fn stage(&self) -> StageId {
        StageId::new(self.stage_id.clone())
    }
}
