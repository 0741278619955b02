//! # API Endpoint Handlers
//!
//! Thin adapters between JSON and the engine. All state-machine rules live in
//! `stagegate-core`; handlers only parse, lock, call and map errors.

use super::{
    AppState,
    types::{
        AdvanceRequest, AdvanceResponse, CheckRequirementsError, CheckRequirementsRequest,
        CheckRequirementsResponse, CreateProjectRequest, ErrorResponse, EvaluateResponse,
        HealthResponse, ProjectJson, ProjectSummary, StagePath, StagesResponse,
        WriteContentRequest, WriteContentResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use stagegate_core::{
    EvaluationContext, EvaluationResult, ProjectId, ProjectState, Session, StageGateError,
    StageId, WritingMode, advance_stage, evaluate_stage,
    primitives::MAX_REQUIREMENTS_PER_STAGE, require_content,
};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for an engine error. Input problems are never 5xx.
pub fn error_status(error: &StageGateError) -> StatusCode {
    match error {
        StageGateError::InvalidContent(_)
        | StageGateError::ContentTooLarge { .. }
        | StageGateError::UnknownStage(_)
        | StageGateError::InvalidRegistry(_) => StatusCode::BAD_REQUEST,
        StageGateError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
        StageGateError::StageLocked(_)
        | StageGateError::StageCompleted(_)
        | StageGateError::PredecessorIncomplete { .. }
        | StageGateError::ProjectArchived(_)
        | StageGateError::VersionConflict { .. } => StatusCode::CONFLICT,
        StageGateError::SerializationError(_)
        | StageGateError::DeserializationError(_)
        | StageGateError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &StageGateError) -> Response {
    let status = error_status(error);
    if status.is_server_error() {
        tracing::error!(error = %error, "Request failed");
    } else {
        tracing::debug!(error = %error, "Request rejected");
    }
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}

fn rejection_response(rejection: &JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(rejection.body_text())),
    )
        .into_response()
}

fn project_response(session: &Session, state: &ProjectState) -> Response {
    match session.engine().registry(state.project.mode) {
        Ok(registry) => Json(ProjectJson::from_state(state, registry)).into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// CHECK REQUIREMENTS HANDLER
// =============================================================================

/// Stateless evaluation of content against supplied requirements.
///
/// Every failure is a 400 carrying the empty-result shape.
pub async fn check_requirements_handler(
    payload: Result<Json<CheckRequirementsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CheckRequirementsError::new(rejection.body_text())),
            )
                .into_response();
        }
    };

    match check_requirements(&request) {
        Ok(result) => {
            let is_last_stage = request.is_last_stage.unwrap_or(false);
            let timestamp = chrono::Utc::now().to_rfc3339();
            Json(CheckRequirementsResponse::from_result(
                result,
                is_last_stage,
                timestamp,
            ))
            .into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(CheckRequirementsError::new(match e {
                StageGateError::InvalidContent(message) => message,
                other => other.to_string(),
            })),
        )
            .into_response(),
    }
}

fn check_requirements(request: &CheckRequirementsRequest) -> Result<EvaluationResult, StageGateError> {
    let content = require_content(request.content.as_ref().and_then(Value::as_str))?;

    let requirements = request.requirement_specs();
    if requirements.len() > MAX_REQUIREMENTS_PER_STAGE {
        return Err(StageGateError::InvalidContent(format!(
            "Too many requirements: {} (maximum {})",
            requirements.len(),
            MAX_REQUIREMENTS_PER_STAGE
        )));
    }

    tracing::debug!(
        project = ?request.project_id,
        stage = ?request.stage_id,
        stage_index = ?request.current_stage_index,
        requirements = requirements.len(),
        "Checking requirements"
    );

    let context = EvaluationContext {
        word_limit: request.effective_word_limit(),
        counted_words_excluding_this_stage: request.counted_words_excluding_this_stage,
        is_final_stage: request.is_last_stage.unwrap_or(false),
    };
    evaluate_stage(content, &requirements, &context)
}

// =============================================================================
// ADVANCE HANDLER
// =============================================================================

/// Pure advance decision for a stage of a track.
pub async fn advance_handler(
    State(state): State<AppState>,
    payload: Result<Json<AdvanceRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    let session = state.session.read().await;
    let registry = match session.engine().registry(request.mode) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };

    let current = StageId::new(request.current_stage_id);
    let result = EvaluationResult::from(request.evaluation_result);
    let decision = advance_stage(registry, &current, &result);

    Json(AdvanceResponse {
        next_stage_id: decision.next_stage_id.map(|id| id.0),
        should_unlock: decision.should_unlock,
    })
    .into_response()
}

// =============================================================================
// STAGES HANDLER
// =============================================================================

/// The stage registry of one writing mode.
pub async fn stages_handler(
    State(state): State<AppState>,
    Path(mode): Path<String>,
) -> Response {
    let Some(mode) = WritingMode::parse(&mode) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Unknown writing mode: {}", mode))),
        )
            .into_response();
    };

    let session = state.session.read().await;
    match session.engine().registry(mode) {
        Ok(registry) => Json(StagesResponse::from(registry)).into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// PROJECT HANDLERS
// =============================================================================

/// Create a project with its first stage unlocked.
pub async fn create_project_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };
    if request.title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Title is required")),
        )
            .into_response();
    }

    let mut session = state.session.write().await;
    match session.create_project(request.title.trim(), request.mode, request.word_limit) {
        Ok(project) => {
            let mut response = project_response(&session, &project);
            if response.status() == StatusCode::OK {
                *response.status_mut() = StatusCode::CREATED;
            }
            response
        }
        Err(e) => error_response(&e),
    }
}

/// List all projects.
pub async fn list_projects_handler(State(state): State<AppState>) -> Response {
    let session = state.session.read().await;
    match session.list_projects() {
        Ok(projects) => {
            let summaries: Vec<ProjectSummary> = projects.iter().map(ProjectSummary::from).collect();
            Json(summaries).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Full project view including every stage.
pub async fn get_project_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Response {
    let session = state.session.read().await;
    match session.project(ProjectId(id)) {
        Ok(project) => project_response(&session, &project),
        Err(e) => error_response(&e),
    }
}

/// Overwrite a stage's content.
pub async fn write_content_handler(
    State(state): State<AppState>,
    Path(path): Path<StagePath>,
    payload: Result<Json<WriteContentRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };
    let content = match require_content(request.content.as_ref().and_then(Value::as_str)) {
        Ok(content) => content,
        Err(e) => return error_response(&e),
    };

    let mut session = state.session.write().await;
    match session.write_content(
        ProjectId(path.id),
        &path.stage(),
        content,
        request.expected_version,
    ) {
        Ok(outcome) => Json(WriteContentResponse::from(outcome)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Evaluate a stage and apply the resulting transition.
pub async fn evaluate_handler(
    State(state): State<AppState>,
    Path(path): Path<StagePath>,
) -> Response {
    let mut session = state.session.write().await;
    match session.evaluate_stage(ProjectId(path.id), &path.stage()) {
        Ok(evaluation) => Json(EvaluateResponse::from(evaluation)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Archive a project.
pub async fn archive_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let mut session = state.session.write().await;
    match session.archive_project(ProjectId(id)) {
        Ok(project) => project_response(&session, &project),
        Err(e) => error_response(&e),
    }
}
