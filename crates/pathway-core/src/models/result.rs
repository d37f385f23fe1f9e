//! Result model: the records produced by visiting steps.
//!
//! Every result is keyed by the identifier of the step (or task) that produced
//! it. Collections are keyed by identifier with find-or-replace semantics, so
//! a collection never holds two children with the same identifier.
//!
//! The one-shot `skipToIdentifier` carried by results is a navigation
//! override: the host sets it while the step is on screen, the navigator
//! honours it once when moving forward (never while peeking) and the task run
//! then clears it with [`StepResult::take_skip_to`].

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::answer::AnswerType;

fn now() -> Timestamp {
    Timestamp::now()
}

/// A result for one step, or for a whole task or section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StepResult {
    /// A result carrying no data beyond its timestamps
    Base(BaseResult),

    /// A single typed answer
    Answer(AnswerResult),

    /// An ordered, identifier-keyed group of results
    Collection(CollectionResult),

    /// The result of a whole task
    Task(TaskResult),

    /// The result of a section or subtask nested inside a task
    Section(TaskResult),

    /// A step that failed to produce data
    Error(ErrorResult),
}

/// A result with timestamps only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaseResult {
    pub identifier: String,
    #[serde(default = "now")]
    pub start_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_identifier: Option<String>,
}

/// A single typed answer value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_type: Option<AnswerType>,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(default = "now")]
    pub start_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_identifier: Option<String>,
}

/// An ordered group of child results keyed by identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResult {
    pub identifier: String,
    #[serde(default = "now")]
    pub start_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(default, alias = "inputResults")]
    pub children: Vec<StepResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_identifier: Option<String>,
}

/// The result of a task or section.
///
/// `children` is the navigation view: one entry per visited step, the latest
/// visit replacing earlier ones. `step_history` is the audit trail: every
/// committed visit in order, never replaced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub identifier: String,
    #[serde(default = "now")]
    pub start_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub children: Vec<StepResult>,
    #[serde(default)]
    pub step_history: Vec<StepResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub async_results: Vec<StepResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_identifier: Option<String>,
}

/// A step that failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResult {
    pub identifier: String,
    pub error_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default = "now")]
    pub start_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
}

/// Remove any entry with the same identifier, then append. Returns the
/// removed entry.
fn find_or_replace(list: &mut Vec<StepResult>, result: StepResult) -> Option<StepResult> {
    let previous = list
        .iter()
        .position(|r| r.identifier() == result.identifier())
        .map(|idx| list.remove(idx));
    list.push(result);
    previous
}

fn find_answer_in<'a>(list: &'a [StepResult], identifier: &str) -> Option<&'a AnswerResult> {
    list.iter().rev().find_map(|r| r.find_answer_result(identifier))
}

impl BaseResult {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            start_date: now(),
            end_date: None,
            skip_to_identifier: None,
        }
    }
}

impl AnswerResult {
    /// Create an answer, inferring the answer type from the value.
    pub fn new(identifier: impl Into<String>, value: Value) -> Self {
        Self {
            identifier: identifier.into(),
            answer_type: AnswerType::infer(&value),
            value,
            question_text: None,
            start_date: now(),
            end_date: None,
            skip_to_identifier: None,
        }
    }

    /// Create an unanswered result of a known type.
    pub fn empty(identifier: impl Into<String>, answer_type: Option<AnswerType>) -> Self {
        Self {
            identifier: identifier.into(),
            answer_type,
            value: Value::Null,
            question_text: None,
            start_date: now(),
            end_date: None,
            skip_to_identifier: None,
        }
    }

    /// Returns true if a non-null value has been stored.
    pub fn has_value(&self) -> bool {
        !self.value.is_null()
    }
}

impl CollectionResult {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            start_date: now(),
            end_date: None,
            children: Vec::new(),
            skip_to_identifier: None,
        }
    }

    /// Append a child, replacing any child with the same identifier.
    ///
    /// Returns the replaced child, if there was one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pathway_core::models::{AnswerResult, CollectionResult, StepResult};
    /// use serde_json::json;
    ///
    /// let mut collection = CollectionResult::new("form");
    /// collection.append_input_result(AnswerResult::new("a", json!(3)).into());
    /// let previous = collection.append_input_result(AnswerResult::new("a", json!(8)).into());
    ///
    /// assert_eq!(previous.and_then(|r| r.answer_value().cloned()), Some(json!(3)));
    /// assert_eq!(collection.find_answer_result("a").map(|a| &a.value), Some(&json!(8)));
    /// assert_eq!(collection.children.len(), 1);
    /// ```
    pub fn append_input_result(&mut self, result: StepResult) -> Option<StepResult> {
        find_or_replace(&mut self.children, result)
    }

    /// Remove the child with the given identifier.
    pub fn remove_input_result(&mut self, identifier: &str) -> Option<StepResult> {
        let idx = self.children.iter().position(|r| r.identifier() == identifier)?;
        Some(self.children.remove(idx))
    }

    /// Find a direct child by identifier.
    pub fn find_result(&self, identifier: &str) -> Option<&StepResult> {
        self.children.iter().find(|r| r.identifier() == identifier)
    }

    /// Find an answer anywhere below this collection.
    pub fn find_answer_result(&self, identifier: &str) -> Option<&AnswerResult> {
        find_answer_in(&self.children, identifier)
    }
}

impl TaskResult {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            start_date: now(),
            end_date: None,
            children: Vec::new(),
            step_history: Vec::new(),
            async_results: Vec::new(),
            skip_to_identifier: None,
        }
    }

    /// Record a departed step.
    ///
    /// The result is appended to the audit trail and replaces any earlier
    /// navigation entry with the same identifier, which is returned.
    pub fn append_step_history(&mut self, result: StepResult) -> Option<StepResult> {
        self.step_history.push(result.clone());
        find_or_replace(&mut self.children, result)
    }

    /// Remove the navigation entry for `identifier` and every entry after it.
    ///
    /// Used when navigating backward. The audit trail is left untouched.
    /// Returns the removed entries in order; empty if `identifier` has no
    /// entry.
    pub fn remove_step_history(&mut self, identifier: &str) -> Vec<StepResult> {
        match self.children.iter().position(|r| r.identifier() == identifier) {
            Some(idx) => self.children.split_off(idx),
            None => Vec::new(),
        }
    }

    /// Append an asynchronous result, replacing one with the same identifier.
    pub fn append_async_result(&mut self, result: StepResult) -> Option<StepResult> {
        find_or_replace(&mut self.async_results, result)
    }

    /// Latest navigation entry for the given identifier.
    pub fn find_result(&self, identifier: &str) -> Option<&StepResult> {
        self.children.iter().find(|r| r.identifier() == identifier)
    }

    /// Mutable access to the latest navigation entry for the identifier.
    pub fn find_result_mut(&mut self, identifier: &str) -> Option<&mut StepResult> {
        self.children.iter_mut().find(|r| r.identifier() == identifier)
    }

    /// Find an answer anywhere in the result tree, including async results.
    pub fn find_answer_result(&self, identifier: &str) -> Option<&AnswerResult> {
        find_answer_in(&self.children, identifier)
            .or_else(|| find_answer_in(&self.async_results, identifier))
    }

    /// Identifiers of the navigation entries, in the order they were last
    /// visited.
    pub fn visited_identifiers(&self) -> Vec<&str> {
        self.children.iter().map(StepResult::identifier).collect()
    }

    /// The step path as a comma separated list of identifiers.
    pub fn step_path(&self) -> String {
        self.visited_identifiers().join(", ")
    }
}

impl ErrorResult {
    pub fn new(identifier: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            error_description: description.into(),
            error_code: None,
            start_date: now(),
            end_date: None,
        }
    }
}

impl StepResult {
    /// Identifier of the step or task this result belongs to.
    pub fn identifier(&self) -> &str {
        match self {
            Self::Base(r) => &r.identifier,
            Self::Answer(r) => &r.identifier,
            Self::Collection(r) => &r.identifier,
            Self::Task(r) | Self::Section(r) => &r.identifier,
            Self::Error(r) => &r.identifier,
        }
    }

    pub fn start_date(&self) -> Timestamp {
        match self {
            Self::Base(r) => r.start_date,
            Self::Answer(r) => r.start_date,
            Self::Collection(r) => r.start_date,
            Self::Task(r) | Self::Section(r) => r.start_date,
            Self::Error(r) => r.start_date,
        }
    }

    pub fn end_date(&self) -> Option<Timestamp> {
        match self {
            Self::Base(r) => r.end_date,
            Self::Answer(r) => r.end_date,
            Self::Collection(r) => r.end_date,
            Self::Task(r) | Self::Section(r) => r.end_date,
            Self::Error(r) => r.end_date,
        }
    }

    pub fn set_end_date(&mut self, date: Timestamp) {
        let slot = match self {
            Self::Base(r) => &mut r.end_date,
            Self::Answer(r) => &mut r.end_date,
            Self::Collection(r) => &mut r.end_date,
            Self::Task(r) | Self::Section(r) => &mut r.end_date,
            Self::Error(r) => &mut r.end_date,
        };
        *slot = Some(date);
    }

    /// The one-shot navigation override, if any.
    pub fn skip_to_identifier(&self) -> Option<&str> {
        match self {
            Self::Base(r) => r.skip_to_identifier.as_deref(),
            Self::Answer(r) => r.skip_to_identifier.as_deref(),
            Self::Collection(r) => r.skip_to_identifier.as_deref(),
            Self::Task(r) | Self::Section(r) => r.skip_to_identifier.as_deref(),
            Self::Error(_) => None,
        }
    }

    /// Set the one-shot navigation override. Error results cannot carry one.
    pub fn set_skip_to_identifier(&mut self, identifier: Option<String>) {
        match self {
            Self::Base(r) => r.skip_to_identifier = identifier,
            Self::Answer(r) => r.skip_to_identifier = identifier,
            Self::Collection(r) => r.skip_to_identifier = identifier,
            Self::Task(r) | Self::Section(r) => r.skip_to_identifier = identifier,
            Self::Error(_) => {}
        }
    }

    /// Consume the navigation override.
    ///
    /// When not peeking, returns the override together with the result with
    /// the override cleared. When peeking, returns `None` and the result
    /// unchanged.
    pub fn take_skip_to(mut self, is_peeking: bool) -> (Option<String>, StepResult) {
        if is_peeking {
            return (None, self);
        }
        let skip_to = self.skip_to_identifier().map(str::to_string);
        self.set_skip_to_identifier(None);
        (skip_to, self)
    }

    /// Find an answer with the given identifier in this result or below it.
    pub fn find_answer_result(&self, identifier: &str) -> Option<&AnswerResult> {
        match self {
            Self::Answer(r) if r.identifier == identifier => Some(r),
            Self::Collection(r) => r.find_answer_result(identifier),
            Self::Task(r) | Self::Section(r) => r.find_answer_result(identifier),
            _ => None,
        }
    }

    /// The value if this is an answer result.
    pub fn answer_value(&self) -> Option<&Value> {
        match self {
            Self::Answer(r) => Some(&r.value),
            _ => None,
        }
    }

    pub fn as_task_result(&self) -> Option<&TaskResult> {
        match self {
            Self::Task(r) | Self::Section(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_task_result(self) -> Option<TaskResult> {
        match self {
            Self::Task(r) | Self::Section(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut CollectionResult> {
        match self {
            Self::Collection(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_answer_mut(&mut self) -> Option<&mut AnswerResult> {
        match self {
            Self::Answer(r) => Some(r),
            _ => None,
        }
    }

    /// Short type tag used for display.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Base(_) => "base",
            Self::Answer(_) => "answer",
            Self::Collection(_) => "collection",
            Self::Task(_) => "task",
            Self::Section(_) => "section",
            Self::Error(_) => "error",
        }
    }
}

impl From<AnswerResult> for StepResult {
    fn from(result: AnswerResult) -> Self {
        Self::Answer(result)
    }
}

impl From<CollectionResult> for StepResult {
    fn from(result: CollectionResult) -> Self {
        Self::Collection(result)
    }
}

impl From<BaseResult> for StepResult {
    fn from(result: BaseResult) -> Self {
        Self::Base(result)
    }
}

impl From<ErrorResult> for StepResult {
    fn from(result: ErrorResult) -> Self {
        Self::Error(result)
    }
}
