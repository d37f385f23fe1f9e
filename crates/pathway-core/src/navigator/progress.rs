//! Progress through a step list.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{walk::is_hidden, StepNavigator};
use crate::{
    error::Result,
    models::{CohortSet, TaskResult},
};

/// "Step `current` of `total`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    /// True when computed without progress markers
    pub is_estimated: bool,
}

impl StepNavigator {
    /// Progress for the step with the given identifier.
    ///
    /// With progress markers, `current` is one past the last marker reached
    /// (visited, or the queried step itself) and `total` the marker count;
    /// once navigation is beyond the final marker there is no progress to
    /// show. Without markers, progress is estimated from the visited steps
    /// and the steps that would not currently be skipped.
    ///
    /// Returns `None` for lists of fewer than two steps.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::StepNotFound` if the identifier is not in
    /// the list.
    pub fn progress(
        &self,
        identifier: &str,
        result: &TaskResult,
        cohorts: &CohortSet,
    ) -> Result<Option<Progress>> {
        self.require(identifier)?;
        if self.len() < 2 {
            return Ok(None);
        }
        let visited = result.visited_identifiers();

        let Some(markers) = self.progress_markers() else {
            let mut total: BTreeSet<&str> = visited.iter().copied().collect();
            total.insert(identifier);
            total.extend(
                self.steps()
                    .iter()
                    .filter(|step| !is_hidden(step, result, cohorts))
                    .map(|step| step.identifier.as_str()),
            );
            let done: BTreeSet<&str> = visited
                .iter()
                .copied()
                .filter(|id| *id != identifier)
                .collect();
            return Ok(Some(Progress {
                current: done.len() + 1,
                total: total.len(),
                is_estimated: true,
            }));
        };

        let reached = |marker: &String| marker == identifier || visited.contains(&marker.as_str());
        let Some(index) = markers.iter().rposition(reached) else {
            return Ok(None);
        };
        let current = index + 1;
        if current == markers.len() && !markers.iter().any(|marker| marker == identifier) {
            return Ok(None);
        }
        Ok(Some(Progress {
            current,
            total: markers.len(),
            is_estimated: false,
        }))
    }
}
