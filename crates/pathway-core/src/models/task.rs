//! Task model: a named step list.

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::result::TaskResult;
use crate::error::Result;
use crate::navigator::StepNavigator;

/// A task: an identifier plus the navigator over its top-level steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub identifier: String,
    pub navigator: StepNavigator,
}

impl Task {
    /// Create a task, validating identifier uniqueness at every level.
    pub fn new(identifier: impl Into<String>, navigator: StepNavigator) -> Result<Self> {
        let task = Self {
            identifier: identifier.into(),
            navigator,
        };
        task.validate()?;
        Ok(task)
    }

    /// Validate the step tree.
    pub fn validate(&self) -> Result<()> {
        self.navigator.validate(&self.identifier)
    }

    /// A fresh, empty task result.
    pub fn instantiate_result(&self) -> TaskResult {
        TaskResult::new(&self.identifier)
    }

    /// A deep copy with a new identifier.
    pub fn copy_with_identifier(&self, identifier: impl Into<String>) -> Task {
        Task {
            identifier: identifier.into(),
            navigator: self.navigator.clone(),
        }
    }

    /// The wire representation: a flat object with the navigator's fields.
    pub fn to_json(&self) -> Value {
        let mut json = self.navigator.to_json();
        if let Value::Object(map) = &mut json {
            map.insert("identifier".into(), Value::String(self.identifier.clone()));
        }
        json
    }
}

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
