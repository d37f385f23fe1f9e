//! Step model definition and related functionality.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{
    answer::AnswerType,
    cohort::{CohortChange, CohortRule},
    result::{AnswerResult, BaseResult, StepResult, TaskResult},
    step_type::StepType,
    survey::{evaluate_rules, SurveyRule},
    task::Task,
};
use crate::navigator::StepNavigator;

/// An immutable description of one unit of task content.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Identifier, unique within the containing step list
    pub identifier: String,

    /// Type tag used for decoding and presentation
    pub step_type: StepType,

    /// Optional display title
    pub title: Option<String>,

    /// Optional display text
    pub text: Option<String>,

    /// Explicit forward-jump target
    pub next_step_identifier: Option<String>,

    /// Rules tested before the step is shown
    pub before_cohort_rules: Vec<CohortRule>,

    /// Rules tested after the step is left
    pub after_cohort_rules: Vec<CohortRule>,

    /// Variant-specific content
    pub kind: StepKind,
}

/// Variant-specific step content.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// Instruction, overview, active and countdown steps
    Ui { duration: Option<f64> },

    /// Feedback and completion steps that display an earlier answer
    ResultSummary(ResultSummary),

    /// A question with optional survey rules
    Question(Question),

    /// An ordered group of child steps
    Section(SectionStep),

    /// A nested task
    Subtask(Box<Task>),
}

/// Configuration of a result-summary step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    /// Answer to display; the step is skipped while it has no value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_identifier: Option<String>,

    /// Step result that holds the answer, when it is not unique in the tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_result_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_text: Option<String>,
}

/// Configuration of a question step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_type: Option<AnswerType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub survey_rules: Vec<SurveyRule>,

    /// Jump target used when the question is left without an answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_if_nil: Option<String>,
}

/// A section: child steps walked by their own navigator.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionStep {
    /// Navigator over the child steps and their progress markers
    pub navigator: StepNavigator,

    /// Async action configurations, carried but not interpreted
    pub async_actions: Vec<Value>,
}

/// Fields shared by every step on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepHeader {
    pub identifier: String,

    #[serde(rename = "type")]
    pub step_type: StepType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, alias = "detail", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_cohort_rules: Vec<CohortRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_cohort_rules: Vec<CohortRule>,
}

impl StepHeader {
    /// Combine with variant content into a step.
    pub fn into_step(self, kind: StepKind) -> Step {
        Step {
            identifier: self.identifier,
            step_type: self.step_type,
            title: self.title,
            text: self.text,
            next_step_identifier: self.next_step_identifier,
            before_cohort_rules: self.before_cohort_rules,
            after_cohort_rules: self.after_cohort_rules,
            kind,
        }
    }
}

impl Step {
    /// Create an instruction step.
    pub fn instruction(identifier: impl Into<String>) -> Self {
        Self::new(identifier, StepType::Instruction, StepKind::Ui { duration: None })
    }

    /// Create a step of the given type and content with no rules.
    pub fn new(identifier: impl Into<String>, step_type: StepType, kind: StepKind) -> Self {
        Self {
            identifier: identifier.into(),
            step_type,
            title: None,
            text: None,
            next_step_identifier: None,
            before_cohort_rules: Vec::new(),
            after_cohort_rules: Vec::new(),
            kind,
        }
    }

    /// Create a section step over the given navigator.
    pub fn section(identifier: impl Into<String>, navigator: StepNavigator) -> Self {
        Self::new(
            identifier,
            StepType::Section,
            StepKind::Section(SectionStep {
                navigator,
                async_actions: Vec::new(),
            }),
        )
    }

    /// Create a feedback step summarising the answer with the given identifier.
    pub fn result_summary(identifier: impl Into<String>, result_identifier: impl Into<String>) -> Self {
        Self::new(
            identifier,
            StepType::Feedback,
            StepKind::ResultSummary(ResultSummary {
                result_identifier: Some(result_identifier.into()),
                ..Default::default()
            }),
        )
    }

    /// Create a question step.
    pub fn question(identifier: impl Into<String>, question: Question) -> Self {
        Self::new(identifier, StepType::SimpleQuestion, StepKind::Question(question))
    }

    /// Set the explicit forward-jump target.
    pub fn with_next_step(mut self, identifier: impl Into<String>) -> Self {
        self.next_step_identifier = Some(identifier.into());
        self
    }

    /// Append a before-cohort rule.
    pub fn with_before_rule(mut self, rule: CohortRule) -> Self {
        self.before_cohort_rules.push(rule);
        self
    }

    /// Append an after-cohort rule.
    pub fn with_after_rule(mut self, rule: CohortRule) -> Self {
        self.after_cohort_rules.push(rule);
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Identifier of the step to jump to after this one, if any.
    ///
    /// When not peeking, a one-shot `skipToIdentifier` on this step's latest
    /// result wins, then the survey rules of a question. Otherwise the
    /// immutable `nextStepIdentifier` is returned.
    pub fn next_step_identifier(&self, result: &TaskResult, is_peeking: bool) -> Option<String> {
        if !is_peeking {
            if let Some(skip_to) = result
                .find_result(&self.identifier)
                .and_then(StepResult::skip_to_identifier)
            {
                return Some(skip_to.to_string());
            }
            if let StepKind::Question(question) = &self.kind {
                let answer = result.find_answer_result(&self.identifier);
                if let Some(target) = evaluate_rules(
                    &question.survey_rules,
                    question.skip_to_if_nil.as_deref(),
                    answer,
                ) {
                    return Some(target.to_string());
                }
            }
        }
        self.next_step_identifier.clone()
    }

    /// Step-specific skip check.
    ///
    /// A result summary with a `result_identifier` is skipped until that
    /// answer has a value somewhere in the result tree.
    pub fn should_skip(&self, result: &TaskResult, _is_peeking: bool) -> bool {
        let StepKind::ResultSummary(summary) = &self.kind else {
            return false;
        };
        let Some(result_identifier) = summary.result_identifier.as_deref() else {
            return false;
        };
        let answer = match summary.step_result_identifier.as_deref() {
            Some(step_identifier) => result
                .find_result(step_identifier)
                .and_then(|r| r.find_answer_result(result_identifier)),
            None => result.find_answer_result(result_identifier),
        };
        !answer.is_some_and(AnswerResult::has_value)
    }

    /// Cohorts a question assigns once answered.
    pub fn cohorts_to_apply(&self, result: &TaskResult) -> Option<CohortChange> {
        let StepKind::Question(question) = &self.kind else {
            return None;
        };
        let answer = result.find_answer_result(&self.identifier);
        let mut change = CohortChange::default();
        for rule in &question.survey_rules {
            let Some(cohort) = rule.cohort.as_ref() else {
                continue;
            };
            if rule.matches(answer) {
                change.add.insert(cohort.clone());
            } else {
                change.remove.insert(cohort.clone());
            }
        }
        (!change.is_empty()).then_some(change)
    }

    /// A fresh, empty result for this step, stamped with the current time.
    pub fn instantiate_result(&self) -> StepResult {
        match &self.kind {
            StepKind::Section(_) | StepKind::Subtask(_) => {
                StepResult::Section(TaskResult::new(&self.identifier))
            }
            StepKind::Question(question) => {
                AnswerResult::empty(&self.identifier, question.answer_type.clone()).into()
            }
            _ => BaseResult::new(&self.identifier).into(),
        }
    }

    /// The navigator of a section or subtask.
    pub fn child_navigator(&self) -> Option<&StepNavigator> {
        match &self.kind {
            StepKind::Section(section) => Some(&section.navigator),
            StepKind::Subtask(task) => Some(&task.navigator),
            _ => None,
        }
    }

    /// Returns true if the step is walked through its own child navigator.
    pub fn is_container(&self) -> bool {
        self.child_navigator().is_some()
    }

    /// A deep copy with a new identifier.
    pub fn copy_with_identifier(&self, identifier: impl Into<String>) -> Step {
        let mut copy = self.clone();
        copy.identifier = identifier.into();
        if let StepKind::Subtask(task) = &mut copy.kind {
            task.identifier.clone_from(&copy.identifier);
        }
        copy
    }

    /// The wire representation of the step.
    pub fn to_json(&self) -> Value {
        let header = StepHeader {
            identifier: self.identifier.clone(),
            step_type: self.step_type.clone(),
            title: self.title.clone(),
            text: self.text.clone(),
            next_step_identifier: self.next_step_identifier.clone(),
            before_cohort_rules: self.before_cohort_rules.clone(),
            after_cohort_rules: self.after_cohort_rules.clone(),
        };
        let mut map = match serde_json::to_value(header) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        match &self.kind {
            StepKind::Ui { duration } => {
                if let Some(duration) = duration {
                    map.insert("duration".into(), Value::from(*duration));
                }
            }
            StepKind::ResultSummary(summary) => merge_into(&mut map, summary),
            StepKind::Question(question) => merge_into(&mut map, question),
            StepKind::Section(section) => {
                if let Value::Object(nav) = section.navigator.to_json() {
                    map.extend(nav);
                }
                if !section.async_actions.is_empty() {
                    map.insert(
                        "asyncActions".into(),
                        Value::Array(section.async_actions.clone()),
                    );
                }
            }
            StepKind::Subtask(task) => {
                map.insert("task".into(), task.to_json());
            }
        }
        Value::Object(map)
    }
}

fn merge_into<T: Serialize>(map: &mut Map<String, Value>, value: &T) {
    if let Ok(Value::Object(fields)) = serde_json::to_value(value) {
        map.extend(fields);
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
