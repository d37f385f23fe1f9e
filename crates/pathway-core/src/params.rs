//! Parameter structures for pathway operations.
//!
//! These structures are shared by every host of the core (the `pw` CLI,
//! tests, embedding applications) and carry no framework-specific derives
//! beyond serde. Interface layers define their own argument types and
//! convert into these.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │    │   Operations    │
//! │  (clap derives) │───▶│ (serde derives) │───▶│  (walk, next)   │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Walks longer than this are stopped, so a cycle of jumps cannot run
/// forever.
pub const DEFAULT_MAX_STEPS: usize = 500;

/// Scripted participant input for a walk.
///
/// ```json
/// {
///   "answers": { "age": 42, "smokes": true },
///   "skipTo": { "intro": "vitals" },
///   "goBackAt": ["summary"],
///   "cohorts": ["pilot"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WalkScript {
    /// Answer values keyed by question identifier
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,

    /// One-shot navigation overrides keyed by the step they are set on
    #[serde(default)]
    pub skip_to: BTreeMap<String, String>,

    /// Steps at which the participant goes back once, on first arrival
    #[serde(default)]
    pub go_back_at: BTreeSet<String>,

    /// Initial cohorts, merged with any given on the command line
    #[serde(default)]
    pub cohorts: Vec<String>,
}

/// Parameters for walking a task from start to finish.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkTask {
    pub script: WalkScript,
    /// Initial cohorts in addition to the script's
    pub cohorts: Vec<String>,
    pub max_steps: usize,
}

impl Default for WalkTask {
    fn default() -> Self {
        Self {
            script: WalkScript::default(),
            cohorts: Vec::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Parameters for a single navigation query over a task's top-level steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStep {
    /// Step being left; the first step is queried when omitted
    pub after: Option<String>,
    #[serde(default)]
    pub cohorts: Vec<String>,
    /// Answers recorded before the query
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,
    /// Ignore overrides and survey-rule jumps
    #[serde(default)]
    pub peek: bool,
}
