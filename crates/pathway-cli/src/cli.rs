//! Command arguments and their handlers.
//!
//! Each command has a clap argument struct that converts into the core's
//! parameter types, keeping clap out of `pathway-core`:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Operations → Markdown / JSON
//! ```

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use pathway_core::{
    display::StepOutline,
    models::Task,
    operations::{next_step, walk_task},
    params::{NextStep, WalkScript, WalkTask, DEFAULT_MAX_STEPS},
    storage, NavigatorOptions, TaskBuilder,
};
use serde::Serialize;
use serde_json::Value;

use crate::renderer::TerminalRenderer;

/// Options shared by every command that loads a task.
#[derive(Args)]
pub struct TaskArgs {
    /// Path to the task definition (JSON)
    pub task: PathBuf,

    /// Maximum cohort-rule redirects honoured per navigation call
    #[arg(long, value_name = "N")]
    pub max_redirects: Option<usize>,
}

impl TaskArgs {
    fn load(&self) -> Result<Task> {
        let mut builder = TaskBuilder::from_path(&self.task);
        if let Some(max_cohort_redirects) = self.max_redirects {
            builder = builder.with_options(NavigatorOptions {
                max_cohort_redirects,
            });
        }
        builder
            .build()
            .with_context(|| format!("Failed to load task from {}", self.task.display()))
    }
}

/// Decode and validate a task
#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub task: TaskArgs,
}

/// Walk a task with scripted answers
#[derive(Args)]
pub struct WalkArgs {
    #[command(flatten)]
    pub task: TaskArgs,

    /// Cohort the participant starts in (repeatable)
    #[arg(short, long = "cohort", value_name = "COHORT")]
    pub cohorts: Vec<String>,

    /// JSON file with `answers`, `skipTo`, `goBackAt` and `cohorts`
    #[arg(short, long)]
    pub answers: Option<PathBuf>,

    /// Stop after this many navigation events
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: usize,

    /// Save the result under $XDG_DATA_HOME/pathway/results
    #[arg(long)]
    pub save: bool,

    /// Save the result to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl WalkArgs {
    fn into_params(self) -> Result<WalkTask> {
        let script = match &self.answers {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read answers from {}", path.display()))?;
                serde_json::from_str::<WalkScript>(&text)
                    .with_context(|| format!("Invalid answers file {}", path.display()))?
            }
            None => WalkScript::default(),
        };
        Ok(WalkTask {
            script,
            cohorts: self.cohorts,
            max_steps: self.max_steps,
        })
    }
}

/// Ask which top-level step follows another
#[derive(Args)]
pub struct NextArgs {
    #[command(flatten)]
    pub task: TaskArgs,

    /// Step being left; omit to ask for the first step
    #[arg(long)]
    pub after: Option<String>,

    /// Cohort the participant belongs to (repeatable)
    #[arg(short, long = "cohort", value_name = "COHORT")]
    pub cohorts: Vec<String>,

    /// Recorded answer as IDENTIFIER=VALUE; VALUE is parsed as JSON when it
    /// can be (repeatable)
    #[arg(long = "answer", value_name = "IDENTIFIER=VALUE", value_parser = parse_answer)]
    pub answers: Vec<(String, Value)>,

    /// Ignore overrides and survey-rule jumps
    #[arg(long)]
    pub peek: bool,
}

impl From<NextArgs> for NextStep {
    fn from(val: NextArgs) -> Self {
        NextStep {
            after: val.after,
            cohorts: val.cohorts,
            answers: val.answers.into_iter().collect(),
            peek: val.peek,
        }
    }
}

fn parse_answer(raw: &str) -> std::result::Result<(String, Value), String> {
    let (identifier, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected IDENTIFIER=VALUE, got '{raw}'"))?;
    if identifier.is_empty() {
        return Err("answer identifier is empty".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((identifier.to_string(), value))
}

/// Runs commands and renders their output.
pub struct Cli {
    renderer: TerminalRenderer,
    json: bool,
}

impl Cli {
    pub fn new(renderer: TerminalRenderer, json: bool) -> Self {
        Self { renderer, json }
    }

    fn emit<T: Serialize>(&self, value: &T, markdown: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            self.renderer.render_json(value)
        } else {
            self.renderer.render(&markdown())
        }
    }

    pub fn validate(&self, args: ValidateArgs) -> Result<()> {
        let task = args.task.load()?;
        info!("Validated task '{}'", task.identifier);
        self.emit(&task, || {
            format!(
                "# Task: {}\n\n{}",
                task.identifier,
                StepOutline(&task.navigator)
            )
        })
    }

    pub fn walk(&self, args: WalkArgs) -> Result<()> {
        let task = args.task.load()?;
        let save = args.save || args.output.is_some();
        let output = args.output.clone();
        let params = args.into_params()?;

        let report = walk_task(&task, &params)
            .with_context(|| format!("Failed to walk task '{}'", task.identifier))?;
        info!(
            "Walked task '{}' in {} events",
            task.identifier,
            report.events.len()
        );
        self.emit(&report, || report.to_string())?;

        if save {
            let path = storage::save_result(&report.result, output.as_deref())
                .context("Failed to save result")?;
            if !self.json {
                self.renderer
                    .render(&format!("\nSaved result to `{}`\n", path.display()))?;
            }
        }
        Ok(())
    }

    pub fn next(&self, args: NextArgs) -> Result<()> {
        let task = args.task.load()?;
        let report = next_step(&task, &args.into())
            .with_context(|| format!("Failed to navigate task '{}'", task.identifier))?;
        self.emit(&report, || report.to_string())
    }
}
