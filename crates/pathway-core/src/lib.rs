//! Core library for pathway: step navigation and conditional branching for
//! declarative research tasks.
//!
//! A task is an ordered list of steps decoded from JSON. Steps may be
//! questions, instructions, result summaries, or sections that nest further
//! step lists. Navigation decides which step follows or precedes the current
//! one from the steps' explicit jumps, the participant's answers and the
//! cohorts they belong to.
//!
//! # Layers
//!
//! - **Models** ([`models`]): steps, results, cohort and survey rules
//! - **Navigator** ([`navigator`]): pure queries over one step list
//! - **Task path** ([`path`]): a stateful run that descends into sections and
//!   folds their results back into a tree
//! - **Factory** ([`factory`]) and **builder** ([`builder`]): JSON decoding
//! - **Display** ([`display`]): markdown formatting for the terminal
//!
//! # Quick Start
//!
//! ```rust
//! use pathway_core::{path::{TaskRun, Transition}, TaskBuilder};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let task = TaskBuilder::from_value(json!({
//!     "identifier": "intake",
//!     "steps": [
//!         { "identifier": "consent", "type": "instruction" },
//!         { "identifier": "vitals", "type": "section", "steps": [
//!             { "identifier": "pulse", "type": "simpleQuestion" }
//!         ] },
//!         { "identifier": "thanks", "type": "completion" }
//!     ]
//! }))
//! .build()?;
//!
//! let mut run = TaskRun::new(&task);
//! run.start()?;
//! let transition = run.go_forward()?;
//! assert_eq!(run.full_path(), vec!["intake", "vitals", "pulse"]);
//! assert!(matches!(transition, Transition::Arrived { .. }));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod display;
pub mod error;
pub mod factory;
pub mod models;
pub mod navigator;
pub mod operations;
pub mod params;
pub mod path;
pub mod storage;

pub use builder::TaskBuilder;
pub use error::{NavigatorError, Result};
pub use factory::StepFactory;
pub use navigator::{NavigatorOptions, StepNavigator};
pub use path::{SharedTaskRun, TaskRun};
