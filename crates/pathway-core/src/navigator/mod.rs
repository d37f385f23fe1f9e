//! Conditional step navigation.
//!
//! A [`StepNavigator`] owns an ordered list of steps and answers navigation
//! questions about it: which step follows a given one, which step precedes
//! it, how far along the participant is, and whether any step remains. It
//! holds no cursor. Every call is a pure function of the step list, the
//! participant's cohorts and the task result passed in, so hosts can peek at
//! what navigation would do without committing anything.
//!
//! ## Submodules
//!
//! - [`walk`]: forward and backward navigation
//! - [`progress`]: "step N of M" computation from progress markers
//! - [`mutation`]: construction-time insertion and removal of steps
//!
//! # Forward precedence
//!
//! ```text
//! leave current step:  afterCohortRules ─▶ one-shot override ─▶ survey rules ─▶ nextStepIdentifier
//!                               │ (first that applies wins; none = declaration order)
//!                               ▼
//! each candidate:      should_skip ─▶ beforeCohortRules ─▶ shown
//! ```
//!
//! # Usage
//!
//! ```rust
//! use pathway_core::models::{CohortSet, Step, TaskResult};
//! use pathway_core::navigator::StepNavigator;
//!
//! # fn example() -> pathway_core::Result<()> {
//! let navigator = StepNavigator::new(vec![
//!     Step::instruction("s1").with_next_step("s3"),
//!     Step::instruction("s2"),
//!     Step::instruction("s3"),
//! ])?;
//! let result = TaskResult::new("task");
//! let cohorts = CohortSet::new();
//!
//! let next = navigator.step_after(Some("s1"), &result, &cohorts, false)?;
//! assert_eq!(next.step.map(|s| s.identifier.as_str()), Some("s3"));
//!
//! let previous = navigator.step_before("s3", &result, &cohorts)?;
//! assert_eq!(previous.map(|s| s.identifier.as_str()), Some("s2"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{NavigatorError, Result},
    models::{Step, StepKind},
};

pub mod mutation;
pub mod progress;
pub mod walk;

#[cfg(test)]
mod tests;

pub use progress::Progress;

/// Tunables for a navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorOptions {
    /// Maximum number of before-cohort-rule redirects honoured by one
    /// navigation call. Further redirecting matches are ignored.
    pub max_cohort_redirects: usize,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            max_cohort_redirects: 1,
        }
    }
}

/// Direction of a navigation move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    /// A jump landed on a step that already has a result
    Reverse,
    None,
}

/// Outcome of a forward navigation query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationResult<'a> {
    /// The step to show, or `None` when this step list is exhausted
    pub step: Option<&'a Step>,
    pub direction: Direction,
    /// True when a rule or override targeted `exit`
    pub exit_early: bool,
}

impl<'a> NavigationResult<'a> {
    pub(crate) fn shown(step: &'a Step, direction: Direction) -> Self {
        Self {
            step: Some(step),
            direction,
            exit_early: false,
        }
    }

    pub(crate) fn end() -> Self {
        Self {
            step: None,
            direction: Direction::Forward,
            exit_early: false,
        }
    }

    pub(crate) fn exit() -> Self {
        Self {
            step: None,
            direction: Direction::Forward,
            exit_early: true,
        }
    }

    /// Identifier of the step to show, if any.
    pub fn identifier(&self) -> Option<&'a str> {
        self.step.map(|step| step.identifier.as_str())
    }
}

/// An ordered list of steps with optional progress markers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepNavigator {
    steps: Vec<Step>,
    progress_markers: Option<Vec<String>>,
    insert_after_identifier: Option<String>,
    options: NavigatorOptions,
}

impl StepNavigator {
    /// Create a navigator, rejecting duplicate identifiers in the list.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        let navigator = Self {
            steps,
            ..Default::default()
        };
        navigator.check_unique("step list")?;
        Ok(navigator)
    }

    /// Set the progress markers.
    pub fn with_progress_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.progress_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Set the anchor after which sections are inserted.
    pub fn with_insert_after(mut self, identifier: impl Into<String>) -> Self {
        self.insert_after_identifier = Some(identifier.into());
        self
    }

    /// Replace the navigator options, recursively for nested navigators.
    pub fn with_options(mut self, options: NavigatorOptions) -> Self {
        self.set_options(options);
        self
    }

    pub(crate) fn set_options(&mut self, options: NavigatorOptions) {
        self.options = options;
        for step in &mut self.steps {
            match &mut step.kind {
                StepKind::Section(section) => section.navigator.set_options(options),
                StepKind::Subtask(task) => task.navigator.set_options(options),
                _ => {}
            }
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn progress_markers(&self) -> Option<&[String]> {
        self.progress_markers.as_deref()
    }

    pub fn insert_after_identifier(&self) -> Option<&str> {
        self.insert_after_identifier.as_deref()
    }

    pub fn options(&self) -> NavigatorOptions {
        self.options
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Position of the step with the given identifier.
    pub fn index_of(&self, identifier: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.identifier == identifier)
    }

    /// The step with the given identifier.
    pub fn step_with_identifier(&self, identifier: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.identifier == identifier)
    }

    /// Like [`Self::step_with_identifier`] but fails with `StepNotFound`.
    pub(crate) fn require(&self, identifier: &str) -> Result<(usize, &Step)> {
        self.steps
            .iter()
            .enumerate()
            .find(|(_, step)| step.identifier == identifier)
            .ok_or_else(|| NavigatorError::step_not_found(identifier))
    }

    /// Check identifier uniqueness in this list and every nested list.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::DuplicateIdentifier` naming the offending
    /// identifier and the containing scope.
    pub fn validate(&self, scope: &str) -> Result<()> {
        self.check_unique(scope)?;
        for step in &self.steps {
            if let Some(navigator) = step.child_navigator() {
                navigator.validate(&step.identifier)?;
            }
        }
        Ok(())
    }

    fn check_unique(&self, scope: &str) -> Result<()> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.identifier.as_str()) {
                return Err(NavigatorError::DuplicateIdentifier {
                    identifier: step.identifier.clone(),
                    scope: scope.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Wire representation: `steps`, plus `progressMarkers` and
    /// `insertAfterIdentifier` when set.
    pub fn to_json(&self) -> Value {
        let steps: Vec<Value> = self.steps.iter().map(Step::to_json).collect();
        let mut json = json!({ "steps": steps });
        if let Value::Object(map) = &mut json {
            if let Some(markers) = &self.progress_markers {
                map.insert("progressMarkers".into(), json!(markers));
            }
            if let Some(anchor) = &self.insert_after_identifier {
                map.insert("insertAfterIdentifier".into(), json!(anchor));
            }
        }
        json
    }
}
