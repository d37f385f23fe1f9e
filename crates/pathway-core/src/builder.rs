//! Builder for loading and configuring tasks.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde_json::Value;

use crate::{
    error::{NavigatorError, Result},
    factory::StepFactory,
    models::{Step, Task},
    navigator::NavigatorOptions,
};

#[derive(Debug, Clone)]
enum Source {
    Json(String),
    Value(Value),
    File(PathBuf),
}

/// Builder for decoding a [`Task`] from JSON.
///
/// ```rust
/// use pathway_core::TaskBuilder;
///
/// let task = TaskBuilder::from_json(
///     r#"{ "identifier": "intake", "steps": [
///         { "identifier": "welcome", "type": "instruction" },
///         { "identifier": "age", "type": "simpleQuestion" }
///     ] }"#,
/// )
/// .build()
/// .unwrap();
///
/// assert_eq!(task.identifier, "intake");
/// assert_eq!(task.navigator.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    source: Source,
    factory: Option<StepFactory>,
    options: Option<NavigatorOptions>,
    identifier: Option<String>,
    insertions: Vec<(Step, Option<String>)>,
}

impl TaskBuilder {
    fn with_source(source: Source) -> Self {
        Self {
            source,
            factory: None,
            options: None,
            identifier: None,
            insertions: Vec::new(),
        }
    }

    /// Load from a JSON document.
    pub fn from_json(json: impl Into<String>) -> Self {
        Self::with_source(Source::Json(json.into()))
    }

    /// Load from an already parsed JSON value.
    pub fn from_value(value: Value) -> Self {
        Self::with_source(Source::Value(value))
    }

    /// Load from a JSON file. A definition without an `identifier` takes the
    /// file stem.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::with_source(Source::File(path.as_ref().to_path_buf()))
    }

    /// Decode with a custom factory instead of the standard one.
    pub fn with_factory(mut self, factory: StepFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Apply navigator options to every step list in the task.
    pub fn with_options(mut self, options: NavigatorOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Override the task identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Insert a step into the top-level list after decoding.
    ///
    /// With no `after`, the step goes after the list's
    /// `insertAfterIdentifier` anchor.
    pub fn insert_step(mut self, step: Step, after: Option<&str>) -> Self {
        self.insertions.push((step, after.map(str::to_string)));
        self
    }

    /// Decode, apply insertions and options, and validate the task.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::FileSystem` if the file cannot be read,
    /// `NavigatorError::Serialization` for malformed JSON, and any decode or
    /// validation error from the factory.
    pub fn build(self) -> Result<Task> {
        let (mut value, fallback_id) = match self.source {
            Source::Json(json) => (serde_json::from_str(&json)?, None),
            Source::Value(value) => (value, None),
            Source::File(path) => {
                debug!("Loading task from {}", path.display());
                let text = fs::read_to_string(&path).map_err(|e| NavigatorError::FileSystem {
                    path: path.clone(),
                    source: e,
                })?;
                let stem = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned());
                (serde_json::from_str(&text)?, stem)
            }
        };

        let Value::Object(map) = &mut value else {
            return Err(NavigatorError::invalid_input("task").with_reason("expected a JSON object"));
        };
        if let Some(identifier) = self.identifier.or_else(|| {
            (!map.contains_key("identifier"))
                .then_some(fallback_id)
                .flatten()
        }) {
            map.insert("identifier".into(), Value::String(identifier));
        }

        let factory = self.factory.unwrap_or_default();
        let mut task = factory.decode_task(&value)?;
        for (step, after) in self.insertions {
            task.navigator.insert(step, after.as_deref())?;
        }
        if let Some(options) = self.options {
            task.navigator = task.navigator.with_options(options);
        }
        task.validate()?;

        info!(
            "Loaded task '{}' with {} top-level steps",
            task.identifier,
            task.navigator.len()
        );
        Ok(task)
    }
}
