use clap::{Parser, Subcommand};

use crate::cli::{NextArgs, ValidateArgs, WalkArgs};

/// Validate and walk declarative research task definitions
///
/// A task is a JSON list of steps (instructions, questions, result
/// summaries and nested sections) whose order depends on explicit jumps,
/// answers and the participant's cohorts. `pw` loads a definition, checks
/// it, and shows how a participant would move through it.
#[derive(Parser)]
#[command(version, about, name = "pw")]
pub struct Args {
    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print machine-readable JSON instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Decode and validate a task, printing its step outline
    #[command(alias = "v")]
    Validate(ValidateArgs),
    /// Walk a task from start to finish with scripted answers
    #[command(alias = "w")]
    Walk(WalkArgs),
    /// Ask which top-level step follows another
    #[command(alias = "n")]
    Next(NextArgs),
}
