//! # stagegate CLI Module
//!
//! Command-line interface over the progression engine.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `stages` - Show the stage registry of a writing mode
//! - `new` - Create a project
//! - `write` - Write a stage's content from a file
//! - `check` - Evaluate a project's stage and apply the transition
//! - `status` - List projects or show one project
//! - `evaluate` - Stateless evaluation of a text file against a stage
//! - `archive` - Archive a project

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use stagegate_core::{StageGateError, WritingMode};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// stagegate - gated writing workflows
///
/// A writer may not move on to the next stage of an essay or thesis until
/// the current stage meets its requirements.
#[derive(Parser, Debug)]
#[command(name = "stagegate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the project database
    #[arg(short = 'D', long, global = true, default_value = "stagegate.db")]
    pub database: PathBuf,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum, default_value_t = Backend::Redb)]
    pub backend: Backend,

    /// TOML stage registry replacing the built-in tracks
    #[arg(long, global = true, env = "STAGEGATE_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where projects are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// ACID database file (redb)
    Redb,
    /// Volatile, lost on exit
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Redb => "redb",
            Backend::Memory => "memory",
        }
    }
}

/// Parse a writing mode argument.
fn parse_mode(s: &str) -> Result<WritingMode, String> {
    WritingMode::parse(s).ok_or_else(|| format!("unknown writing mode '{}' (essay, thesis)", s))
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show the stages of a writing mode
    Stages {
        #[arg(short, long, default_value = "essay", value_parser = parse_mode)]
        mode: WritingMode,
    },

    /// Create a project
    New {
        /// Project title
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "essay", value_parser = parse_mode)]
        mode: WritingMode,

        /// Total word limit (defaults to the track's limit)
        #[arg(short, long)]
        word_limit: Option<u32>,
    },

    /// Write a stage's content from a text file
    Write {
        /// Project ID
        #[arg(short, long)]
        project: u64,

        /// Stage ID
        #[arg(short, long)]
        stage: String,

        /// Path to the content file
        #[arg(short, long)]
        file: PathBuf,

        /// Reject the write unless the stage is at this version
        #[arg(long)]
        expected_version: Option<u64>,
    },

    /// Evaluate a project's stage and apply the resulting transition
    Check {
        /// Project ID
        #[arg(short, long)]
        project: u64,

        /// Stage ID
        #[arg(short, long)]
        stage: String,
    },

    /// List projects, or show one project
    Status {
        /// Project ID
        #[arg(short, long)]
        project: Option<u64>,
    },

    /// Evaluate a text file against a stage's requirements without storing anything
    Evaluate {
        #[arg(short, long, default_value = "essay", value_parser = parse_mode)]
        mode: WritingMode,

        /// Stage ID
        #[arg(short, long)]
        stage: String,

        /// Path to the content file
        #[arg(short, long)]
        file: PathBuf,

        /// Total word limit (defaults to the track's limit, 0 for none)
        #[arg(short, long)]
        word_limit: Option<u32>,

        /// Words already counted in other stages
        #[arg(short, long)]
        counted_words: Option<u32>,
    },

    /// Archive a project
    Archive {
        /// Project ID
        #[arg(short, long)]
        project: u64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), StageGateError> {
    let ctx = CommandContext {
        database: cli.database,
        backend: cli.backend,
        registry: cli.registry,
        json_mode: cli.json_mode,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&ctx, &host, port).await,
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Stages { mode }) => cmd_stages(&ctx, mode),
        Some(Commands::New {
            title,
            mode,
            word_limit,
        }) => cmd_new(&ctx, &title, mode, word_limit),
        Some(Commands::Write {
            project,
            stage,
            file,
            expected_version,
        }) => cmd_write(&ctx, project, &stage, &file, expected_version),
        Some(Commands::Check { project, stage }) => cmd_check(&ctx, project, &stage),
        Some(Commands::Status { project }) => cmd_status(&ctx, project),
        Some(Commands::Evaluate {
            mode,
            stage,
            file,
            word_limit,
            counted_words,
        }) => cmd_evaluate(&ctx, mode, &stage, &file, word_limit, counted_words),
        Some(Commands::Archive { project }) => cmd_archive(&ctx, project),
        // No subcommand - list projects by default
        None => cmd_status(&ctx, None),
    }
}

// =============================================================================
// TESTS
// =============================================================================
