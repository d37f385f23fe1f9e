//! Data models for steps, results and cohort rules.
//!
//! This module contains the domain types that describe a task definition
//! and the records produced by running it. Display implementations for these
//! models are located in [`crate::display::models`] to keep data structures
//! and presentation apart.
//!
//! # Layout
//!
//! - [`step`]: the immutable [`Step`] description and its variants
//! - [`step_type`]: the `type` tag used for decoding
//! - [`task`]: a named top-level step list
//! - [`result`]: identifier-keyed results with find-or-replace collections
//! - [`answer`]: answer types describing the JSON shape of a value
//! - [`cohort`]: cohort rules and their evaluation
//! - [`survey`]: answer-driven survey rules for questions
//! - [`identifier`]: reserved navigation identifiers
//!
//! # Wire format
//!
//! All models use camelCase JSON keys. Results are discriminated by a
//! `type` field:
//!
//! ```json
//! { "type": "answer", "identifier": "age", "answerType": { "type": "integer" }, "value": 42,
//!   "startDate": "2024-05-01T10:00:00Z" }
//! ```

pub mod answer;
pub mod cohort;
pub mod identifier;
pub mod result;
pub mod step;
pub mod step_type;
pub mod survey;
pub mod task;

#[cfg(test)]
mod tests;

pub use answer::{AnswerType, BaseType};
pub use cohort::{first_match, CohortChange, CohortOperator, CohortRule, CohortSet, RulePhase};
pub use identifier::{NavigationTarget, EXIT, NEXT_SECTION, NEXT_STEP};
pub use result::{
    AnswerResult, BaseResult, CollectionResult, ErrorResult, StepResult, TaskResult,
};
pub use step::{Question, ResultSummary, SectionStep, Step, StepHeader, StepKind};
pub use step_type::StepType;
pub use survey::{evaluate_rules, SurveyRule, SurveyRuleOperator};
pub use task::Task;
