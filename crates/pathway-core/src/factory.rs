//! Step decoding by type tag.
//!
//! A [`StepFactory`] maps each step `type` tag to a decode function. Hosts
//! construct one explicitly and pass it wherever tasks are decoded; custom
//! tags are added with [`StepFactory::register`]. A tag with no registered
//! decoder is rejected with `NavigatorError::UnknownType`.
//!
//! ```rust
//! use pathway_core::factory::{decode_ui_step, StepFactory};
//! use serde_json::json;
//!
//! let mut factory = StepFactory::new();
//! factory.register("consent", decode_ui_step);
//!
//! let step = factory
//!     .decode_step(&json!({ "identifier": "c1", "type": "consent" }))
//!     .unwrap();
//! assert_eq!(step.step_type.as_str(), "consent");
//! ```

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    error::{NavigatorError, Result},
    models::{
        Question, ResultSummary, SectionStep, Step, StepHeader, StepKind, StepType, Task,
    },
    navigator::StepNavigator,
};

/// Signature of a step decoder.
pub type DecodeFn = fn(&StepFactory, &Value) -> Result<Step>;

/// Registry of step decoders keyed by type tag.
#[derive(Clone)]
pub struct StepFactory {
    decoders: BTreeMap<String, DecodeFn>,
}

impl std::fmt::Debug for StepFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepFactory")
            .field("tags", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for StepFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl StepFactory {
    /// A factory with decoders for every built-in step type.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        for tag in [
            StepType::Instruction,
            StepType::Overview,
            StepType::Active,
            StepType::Countdown,
        ] {
            factory.register(tag.as_str(), decode_ui_step);
        }
        for tag in [StepType::Feedback, StepType::Completion] {
            factory.register(tag.as_str(), decode_result_summary_step);
        }
        for tag in StepType::STANDARD.iter().filter(|t| t.is_question()) {
            factory.register(tag.as_str(), decode_question_step);
        }
        factory.register(StepType::Section.as_str(), decode_section_step);
        factory.register(StepType::Transform.as_str(), decode_transform_step);
        factory.register(StepType::Subtask.as_str(), decode_subtask_step);
        factory.register(StepType::TaskInfo.as_str(), decode_subtask_step);
        factory
    }

    /// A factory with no decoders.
    pub fn empty() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    /// Register a decoder for a tag, returning the one it replaces.
    pub fn register(&mut self, tag: impl Into<String>, decoder: DecodeFn) -> Option<DecodeFn> {
        self.decoders.insert(tag.into(), decoder)
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    /// Decode one step, dispatching on its `type` tag.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::InvalidInput` when `type` is missing and
    /// `NavigatorError::UnknownType` when no decoder is registered for it.
    pub fn decode_step(&self, value: &Value) -> Result<Step> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| NavigatorError::invalid_input("type").with_reason("step has no type tag"))?;
        let decoder = self
            .decoders
            .get(tag)
            .ok_or_else(|| NavigatorError::UnknownType {
                kind: "step",
                tag: tag.to_string(),
            })?;
        decoder(self, value)
    }

    /// Decode a navigator from an object with `steps` and optional
    /// `progressMarkers` and `insertAfterIdentifier`.
    pub fn decode_navigator(&self, value: &Value) -> Result<StepNavigator> {
        let fields = NavigatorFields::deserialize(value)?;
        let steps = fields
            .steps
            .iter()
            .map(|step| self.decode_step(step))
            .collect::<Result<Vec<_>>>()?;
        let mut navigator = StepNavigator::new(steps)?;
        if let Some(markers) = fields.progress_markers {
            navigator = navigator.with_progress_markers(markers);
        }
        if let Some(anchor) = fields.insert_after_identifier {
            navigator = navigator.with_insert_after(anchor);
        }
        Ok(navigator)
    }

    /// Decode a task from a flat object with `identifier` and the
    /// navigator fields.
    pub fn decode_task(&self, value: &Value) -> Result<Task> {
        let identifier = value
            .get("identifier")
            .and_then(Value::as_str)
            .ok_or_else(|| NavigatorError::invalid_input("identifier").with_reason("task has no identifier"))?;
        Task::new(identifier, self.decode_navigator(value)?)
    }

    /// Copy a step under a new identifier, overlaying replacement fields.
    ///
    /// Top-level overlay fields replace the step's fields. An overlay
    /// `steps` array is merged into a section's children by identifier.
    /// The merged definition is decoded again, so the copy is validated
    /// like any other step.
    pub fn copy_with_overlay(&self, step: &Step, identifier: &str, overlay: &Value) -> Result<Step> {
        let mut json = step.to_json();
        merge_overlay(&mut json, overlay)?;
        if let Value::Object(map) = &mut json {
            map.insert("identifier".into(), Value::String(identifier.to_string()));
        }
        self.decode_step(&json)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavigatorFields {
    #[serde(default)]
    steps: Vec<Value>,
    #[serde(default)]
    progress_markers: Option<Vec<String>>,
    #[serde(default)]
    insert_after_identifier: Option<String>,
}

/// Decoder for instruction-like steps.
pub fn decode_ui_step(_factory: &StepFactory, value: &Value) -> Result<Step> {
    let header = StepHeader::deserialize(value)?;
    let duration = value.get("duration").and_then(Value::as_f64);
    Ok(header.into_step(StepKind::Ui { duration }))
}

/// Decoder for feedback and completion steps.
pub fn decode_result_summary_step(_factory: &StepFactory, value: &Value) -> Result<Step> {
    let header = StepHeader::deserialize(value)?;
    let summary = ResultSummary::deserialize(value)?;
    Ok(header.into_step(StepKind::ResultSummary(summary)))
}

/// Decoder for question steps. Rejects survey rules that can never match.
pub fn decode_question_step(_factory: &StepFactory, value: &Value) -> Result<Step> {
    let header = StepHeader::deserialize(value)?;
    let question = Question::deserialize(value)?;
    if let Some(position) = question.survey_rules.iter().position(|rule| !rule.is_valid()) {
        return Err(NavigatorError::invalid_input(format!(
            "{}.surveyRules[{position}]",
            header.identifier
        ))
        .with_reason("rule has no matching answer and does not test for a skipped question"));
    }
    Ok(header.into_step(StepKind::Question(question)))
}

/// Decoder for section steps.
pub fn decode_section_step(factory: &StepFactory, value: &Value) -> Result<Step> {
    let header = StepHeader::deserialize(value)?;
    let navigator = factory.decode_navigator(value)?;
    let async_actions = match value.get("asyncActions") {
        Some(Value::Array(actions)) => actions.clone(),
        _ => Vec::new(),
    };
    Ok(header.into_step(StepKind::Section(SectionStep {
        navigator,
        async_actions,
    })))
}

/// Decoder for transform steps: an embedded `section` definition with
/// optional `replacementSteps` overlays, resolved to a section step that
/// carries the transform's identifier.
pub fn decode_transform_step(factory: &StepFactory, value: &Value) -> Result<Step> {
    let header = StepHeader::deserialize(value)?;
    let Some(Value::Object(section)) = value.get("section") else {
        return Err(NavigatorError::invalid_input(format!("{}.section", header.identifier))
            .with_reason("transform step has no embedded section"));
    };

    let mut resolved = section.clone();
    if let Value::Object(fields) = serde_json::to_value(&header)? {
        for (key, field) in fields {
            if key != "type" {
                resolved.insert(key, field);
            }
        }
    }
    resolved.insert("type".into(), Value::String(StepType::Section.to_string()));

    let mut resolved = Value::Object(resolved);
    if let Some(replacements) = value.get("replacementSteps") {
        let overlay = Value::Object(Map::from_iter([("steps".to_string(), replacements.clone())]));
        merge_overlay(&mut resolved, &overlay)?;
    }
    debug!("Resolved transform '{}' to a section", header.identifier);
    decode_section_step(factory, &resolved)
}

/// Decoder for subtask and task-info steps with an inline `task`.
pub fn decode_subtask_step(factory: &StepFactory, value: &Value) -> Result<Step> {
    let header = StepHeader::deserialize(value)?;
    let Some(task_json) = value.get("task") else {
        return Err(NavigatorError::invalid_input(format!("{}.task", header.identifier))
            .with_reason("subtask step has no inline task"));
    };
    let mut task_json = task_json.clone();
    if let Value::Object(map) = &mut task_json {
        map.entry("identifier")
            .or_insert_with(|| Value::String(header.identifier.clone()));
    }
    let task = factory.decode_task(&task_json)?;
    Ok(header.into_step(StepKind::Subtask(Box::new(task))))
}

/// Merge `overlay` into the step definition `base`.
fn merge_overlay(base: &mut Value, overlay: &Value) -> Result<()> {
    let (Value::Object(base), Value::Object(overlay)) = (base, overlay) else {
        return Err(NavigatorError::invalid_input("overlay").with_reason("overlay must be an object"));
    };
    for (key, field) in overlay {
        match (key.as_str(), base.get_mut(key), field) {
            ("steps", Some(Value::Array(children)), Value::Array(replacements)) => {
                for replacement in replacements {
                    let identifier = replacement
                        .get("identifier")
                        .and_then(Value::as_str)
                        .ok_or_else(|| {
                            NavigatorError::invalid_input("steps")
                                .with_reason("replacement step has no identifier")
                        })?;
                    let child = children
                        .iter_mut()
                        .find(|child| child.get("identifier").and_then(Value::as_str) == Some(identifier))
                        .ok_or_else(|| NavigatorError::invalid_input("steps").with_reason(format!(
                            "replacement step '{identifier}' matches no step"
                        )))?;
                    merge_overlay(child, replacement)?;
                }
            }
            _ => {
                base.insert(key.clone(), field.clone());
            }
        }
    }
    Ok(())
}
