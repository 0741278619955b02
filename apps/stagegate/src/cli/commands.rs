//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! JSON output reuses the HTTP wire types so both surfaces agree.

use super::Backend;
use crate::api::{
    self,
    types::{
        CheckRequirementsResponse, EvaluateResponse, ProjectJson, ProjectSummary, StagesResponse,
        WriteContentResponse,
    },
};
use crate::config::load_catalog;
use serde::Serialize;
use stagegate_core::{
    EvaluationContext, ProjectId, ProjectState, Session, StageCatalog, StageGateError, StageId,
    StageRegistry, Transition, WritingMode, evaluate_stage, format_score,
    primitives::MAX_CONTENT_LENGTH,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub database: PathBuf,
    pub backend: Backend,
    pub registry: Option<PathBuf>,
    pub json_mode: bool,
    pub verbose: bool,
}

// =============================================================================
// FILE INPUT
// =============================================================================

/// Read a content file, rejecting anything over the content size limit.
fn read_content_file(path: &Path) -> Result<String, StageGateError> {
    let canonical = path.canonicalize().map_err(|e| {
        StageGateError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(StageGateError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| StageGateError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_CONTENT_LENGTH as u64 {
        return Err(StageGateError::ContentTooLarge {
            len: metadata.len() as usize,
            max: MAX_CONTENT_LENGTH,
        });
    }

    std::fs::read_to_string(&canonical)
        .map_err(|e| StageGateError::InvalidContent(format!("Content must be UTF-8 text: {}", e)))
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SESSION HELPERS
// =============================================================================

/// Load the catalog and open the configured backend.
pub fn open_session(ctx: &CommandContext) -> Result<Session, StageGateError> {
    let catalog = Arc::new(load_catalog(ctx.registry.as_deref())?);
    match ctx.backend {
        Backend::Redb => Session::with_redb(&ctx.database, catalog),
        Backend::Memory => Ok(Session::new(catalog)),
    }
}

fn print_project(state: &ProjectState, registry: &StageRegistry) {
    let project = &state.project;
    println!("Project #{}: {}", project.id, project.title);
    println!("==================");
    println!("Mode:          {}", project.mode);
    println!("Status:        {}", project.status.as_str());
    println!("Current stage: {}", registry.title(&project.current_stage_id));
    match project.word_limit {
        Some(limit) => println!(
            "Words:         {}/{}",
            state.counted_words(registry),
            limit
        ),
        None => println!("Words:         {}", state.counted_words(registry)),
    }
    if let Some(score) = project.overall_score {
        println!("Score:         {}", format_score(score));
    }
    println!();
    for stage in registry.stages() {
        let words = state.stage(&stage.id).map_or(0, |p| p.word_count());
        println!(
            "  {:<2} {:<24} {:<12} {} words{}",
            stage.order + 1,
            stage.id.as_str(),
            state.stage_status(&stage.id).as_str(),
            words,
            if stage.counts_toward_budget {
                ""
            } else {
                " (not counted)"
            }
        );
    }
}

fn print_feedback(feedback: &str, detailed: &[String]) {
    println!("{}", feedback);
    for line in detailed {
        println!("  - {}", line);
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(ctx: &CommandContext, host: &str, port: u16) -> Result<(), StageGateError> {
    let session = open_session(ctx)?;

    println!("stagegate server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", ctx.backend.as_str());
    println!("  Database: {:?}", ctx.database);
    if let Some(registry) = &ctx.registry {
        println!("  Registry: {:?}", registry);
    }
    println!();
    println!("Endpoints:");
    println!("  POST /check-requirements                    - Stateless evaluation");
    println!("  POST /advance                               - Advance decision");
    println!("  GET  /stages/{{mode}}                         - Stage registry");
    println!("  POST /projects, GET /projects               - Create and list projects");
    println!("  GET  /projects/{{id}}                         - Project detail");
    println!("  PUT  /projects/{{id}}/stages/{{stage}}          - Write content");
    println!("  POST /projects/{{id}}/stages/{{stage}}/evaluate - Evaluate a stage");
    println!("  POST /projects/{{id}}/archive                 - Archive a project");
    println!("  GET  /health                                - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, session).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(ctx: &CommandContext, force: bool) -> Result<(), StageGateError> {
    if ctx.backend == Backend::Memory {
        println!("Memory backend needs no initialization");
        return Ok(());
    }

    if ctx.database.exists() {
        if !force {
            return Err(StageGateError::IoError(format!(
                "Database already exists at {:?}. Use --force to overwrite.",
                ctx.database
            )));
        }
        std::fs::remove_file(&ctx.database)
            .map_err(|e| StageGateError::IoError(format!("Remove database: {}", e)))?;
    }

    let session = open_session(ctx)?;
    tracing::info!(database = ?ctx.database, "Initialized database");
    println!(
        "Initialized database at {:?} ({} projects)",
        ctx.database,
        session.project_count()?
    );
    Ok(())
}

// =============================================================================
// STAGES COMMAND
// =============================================================================

/// Show the stage registry of a mode.
pub fn cmd_stages(ctx: &CommandContext, mode: WritingMode) -> Result<(), StageGateError> {
    let catalog = load_catalog(ctx.registry.as_deref())?;
    let registry = catalog.registry(mode)?;

    if ctx.json_mode {
        print_json(&StagesResponse::from(registry));
        return Ok(());
    }

    println!("{} stages", mode);
    println!("==================");
    if let Some(limit) = registry.default_word_limit() {
        println!("Default word limit: {}", limit);
        println!();
    }
    for stage in registry.stages() {
        println!(
            "{}. {} ({}){}",
            stage.order + 1,
            stage.title,
            stage.id,
            if stage.counts_toward_budget {
                ""
            } else {
                " [not counted]"
            }
        );
        if ctx.verbose && !stage.description.is_empty() {
            println!("   {}", stage.description);
        }
        for requirement in &stage.requirements {
            println!(
                "   - {} [{}] {}",
                requirement.id,
                requirement.kind.name(),
                requirement.description
            );
        }
    }
    Ok(())
}

// =============================================================================
// PROJECT COMMANDS
// =============================================================================

/// Create a project.
pub fn cmd_new(
    ctx: &CommandContext,
    title: &str,
    mode: WritingMode,
    word_limit: Option<u32>,
) -> Result<(), StageGateError> {
    if title.trim().is_empty() {
        return Err(StageGateError::InvalidContent("Title is required".to_string()));
    }

    let mut session = open_session(ctx)?;
    let state = session.create_project(title.trim(), mode, word_limit)?;
    let registry = session.engine().registry(mode)?;

    if ctx.json_mode {
        print_json(&ProjectJson::from_state(&state, registry));
        return Ok(());
    }

    println!("Created project #{}: {}", state.project.id, state.project.title);
    println!(
        "First stage: {} ({})",
        registry.title(&state.project.current_stage_id),
        state.project.current_stage_id
    );
    Ok(())
}

/// Write a stage's content from a file.
pub fn cmd_write(
    ctx: &CommandContext,
    project: u64,
    stage: &str,
    file: &Path,
    expected_version: Option<u64>,
) -> Result<(), StageGateError> {
    let content = read_content_file(file)?;
    let mut session = open_session(ctx)?;
    let outcome = session.write_content(
        ProjectId(project),
        &StageId::new(stage),
        &content,
        expected_version,
    )?;

    if ctx.json_mode {
        print_json(&WriteContentResponse::from(outcome));
        return Ok(());
    }

    println!(
        "Saved {} (version {}, {} words, {})",
        outcome.stage_id,
        outcome.version,
        outcome.word_count,
        outcome.status.as_str()
    );
    if let Some(budget) = outcome.budget {
        if budget.exceeded {
            println!(
                "Warning: project would exceed its word limit ({} > {})",
                budget.projected, budget.limit
            );
        } else if ctx.verbose {
            println!("Word budget: {}/{}", budget.projected, budget.limit);
        }
    }
    Ok(())
}

/// Evaluate a stored stage and apply the transition.
pub fn cmd_check(ctx: &CommandContext, project: u64, stage: &str) -> Result<(), StageGateError> {
    let mut session = open_session(ctx)?;
    let evaluation = session.evaluate_stage(ProjectId(project), &StageId::new(stage))?;

    if ctx.json_mode {
        print_json(&EvaluateResponse::from(evaluation));
        return Ok(());
    }

    print_feedback(
        &evaluation.result.feedback,
        &evaluation.result.detailed_feedback,
    );
    println!();
    match &evaluation.transition {
        Transition::Pending => println!("Stage {} is not complete yet", evaluation.stage_id),
        Transition::Unchanged => println!("Stage {} was already complete", evaluation.stage_id),
        Transition::Advanced { next_stage_id } => {
            println!("Unlocked next stage: {}", next_stage_id);
        }
        Transition::ProjectCompleted { overall_score } => {
            println!("Project complete. Score: {}", format_score(*overall_score));
        }
    }
    Ok(())
}

/// List projects, or show one.
pub fn cmd_status(ctx: &CommandContext, project: Option<u64>) -> Result<(), StageGateError> {
    let session = open_session(ctx)?;

    if let Some(id) = project {
        let state = session.project(ProjectId(id))?;
        let registry = session.engine().registry(state.project.mode)?;
        if ctx.json_mode {
            print_json(&ProjectJson::from_state(&state, registry));
        } else {
            print_project(&state, registry);
        }
        return Ok(());
    }

    let projects = session.list_projects()?;
    if ctx.json_mode {
        let summaries: Vec<ProjectSummary> = projects.iter().map(ProjectSummary::from).collect();
        print_json(&summaries);
        return Ok(());
    }

    println!("stagegate Projects");
    println!("==================");
    println!("Database: {:?}", ctx.database);
    println!("Backend:  {}", ctx.backend.as_str());
    println!();
    if projects.is_empty() {
        println!("No projects yet. Create one with `stagegate new --title <TITLE>`.");
    }
    for state in &projects {
        println!(
            "#{:<4} {:<32} {:<7} {:<12} {}",
            state.project.id.0,
            state.project.title,
            state.project.mode.as_str(),
            state.project.status.as_str(),
            state.project.current_stage_id
        );
    }
    Ok(())
}

/// Archive a project.
pub fn cmd_archive(ctx: &CommandContext, project: u64) -> Result<(), StageGateError> {
    let mut session = open_session(ctx)?;
    let state = session.archive_project(ProjectId(project))?;

    if ctx.json_mode {
        let registry = session.engine().registry(state.project.mode)?;
        print_json(&ProjectJson::from_state(&state, registry));
        return Ok(());
    }

    println!("Archived project #{}: {}", state.project.id, state.project.title);
    Ok(())
}

// =============================================================================
// EVALUATE COMMAND
// =============================================================================

/// Build the evaluation context for a stage evaluated outside any project.
///
/// A word limit of `0` disables the budget check, and stages outside the
/// counted budget never receive one.
pub fn stateless_context(
    registry: &StageRegistry,
    stage: &StageId,
    word_limit: Option<u32>,
    counted_words: Option<u32>,
) -> EvaluationContext {
    EvaluationContext {
        word_limit: word_limit
            .or(registry.default_word_limit())
            .filter(|limit| *limit > 0)
            .filter(|_| registry.counts_toward_budget(stage)),
        counted_words_excluding_this_stage: counted_words,
        is_final_stage: registry.is_final(stage),
    }
}

/// Evaluate a text file against a stage's requirements. Nothing is stored.
pub fn cmd_evaluate(
    ctx: &CommandContext,
    mode: WritingMode,
    stage: &str,
    file: &Path,
    word_limit: Option<u32>,
    counted_words: Option<u32>,
) -> Result<(), StageGateError> {
    let catalog: StageCatalog = load_catalog(ctx.registry.as_deref())?;
    let registry = catalog.registry(mode)?;
    let stage_id = StageId::new(stage);
    if !registry.contains(&stage_id) {
        return Err(StageGateError::UnknownStage(stage_id));
    }

    let content = read_content_file(file)?;
    let context = stateless_context(registry, &stage_id, word_limit, counted_words);
    let result = evaluate_stage(&content, registry.requirements(&stage_id), &context)?;

    if ctx.json_mode {
        let timestamp = chrono::Utc::now().to_rfc3339();
        print_json(&CheckRequirementsResponse::from_result(
            result,
            context.is_final_stage,
            timestamp,
        ));
        return Ok(());
    }

    println!(
        "{} - {} ({} words, {} characters)",
        mode,
        registry.title(&stage_id),
        result.word_count,
        result.character_count
    );
    println!();
    print_feedback(&result.feedback, &result.detailed_feedback);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn memory_ctx() -> CommandContext {
        CommandContext {
            database: PathBuf::from("unused.db"),
            backend: Backend::Memory,
            registry: None,
            json_mode: true,
            verbose: false,
        }
    }

    #[test]
    fn read_content_file_reads_text() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"I argue that tests matter.").expect("write");
        let content = read_content_file(file.path()).expect("read");
        assert_eq!(content, "I argue that tests matter.");
    }

    #[test]
    fn read_content_file_rejects_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(matches!(
            read_content_file(dir.path()),
            Err(StageGateError::IoError(_))
        ));
    }

    #[test]
    fn stateless_context_uses_track_default() {
        let catalog = StageCatalog::builtin();
        let essay = catalog.registry(WritingMode::Essay).expect("essay");
        let conclusion = StageId::new("conclusion");

        let ctx = stateless_context(essay, &conclusion, None, Some(100));
        assert_eq!(ctx.word_limit, Some(500));
        assert_eq!(ctx.counted_words_excluding_this_stage, Some(100));
        assert!(ctx.is_final_stage);

        let unlimited = stateless_context(essay, &conclusion, Some(0), None);
        assert_eq!(unlimited.word_limit, None);
    }

    #[test]
    fn stateless_context_skips_limit_for_uncounted_stage() {
        let catalog = StageCatalog::builtin();
        let essay = catalog.registry(WritingMode::Essay).expect("essay");
        let planning = StageId::new("planning");

        let ctx = stateless_context(essay, &planning, None, None);
        assert_eq!(ctx.word_limit, None);
        let explicit = stateless_context(essay, &planning, Some(100), Some(400));
        assert_eq!(explicit.word_limit, None);

        let long_plan = "plan ".repeat(600);
        let result = evaluate_stage(&long_plan, essay.requirements(&planning), &ctx)
            .expect("evaluate");
        assert!(result.is_completed);
        assert!(result.failed_requirement_ids.is_empty());
        assert_eq!(result.word_count, 600);
    }

    #[test]
    fn redb_session_persists_between_opens() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ctx = CommandContext {
            database: dir.path().join("cli.db"),
            backend: Backend::Redb,
            ..memory_ctx()
        };

        cmd_init(&ctx, false).expect("init");
        cmd_new(&ctx, "Persisted", WritingMode::Essay, None).expect("new");
        {
            let session = open_session(&ctx).expect("reopen");
            assert_eq!(session.project_count().expect("count"), 1);
        }

        assert!(cmd_init(&ctx, false).is_err());
        cmd_init(&ctx, true).expect("force init");
        let session = open_session(&ctx).expect("reopen");
        assert_eq!(session.project_count().expect("count"), 0);
    }

    #[test]
    fn evaluate_rejects_unknown_stage() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let result = cmd_evaluate(
            &memory_ctx(),
            WritingMode::Essay,
            "epilogue",
            file.path(),
            None,
            None,
        );
        assert!(matches!(result, Err(StageGateError::UnknownStage(_))));
    }

    #[test]
    fn new_rejects_blank_title() {
        let result = cmd_new(&memory_ctx(), "   ", WritingMode::Essay, None);
        assert!(matches!(result, Err(StageGateError::InvalidContent(_))));
    }
}
