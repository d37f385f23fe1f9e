//! Construction-time edits to a step list.
//!
//! Used to splice alternate-path sections in or out before a run starts.
//! Progress markers follow the edit so that progress display stays
//! consistent.

use log::debug;

use super::StepNavigator;
use crate::{
    error::{NavigatorError, Result},
    models::Step,
};

impl StepNavigator {
    /// Insert a step, typically a section or subtask.
    ///
    /// The step lands after `after` when given, otherwise after the
    /// navigator's `insertAfterIdentifier` anchor, otherwise at position 1.
    /// It becomes the new anchor, so repeated insertions keep their order.
    /// When progress markers are present, the new identifier is placed after
    /// the last marker that precedes it in the list, or first if none does.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::DuplicateIdentifier` if the identifier is
    /// already in the list and `NavigatorError::StepNotFound` if `after`
    /// names a missing step.
    pub fn insert(&mut self, step: Step, after: Option<&str>) -> Result<()> {
        if self.index_of(&step.identifier).is_some() {
            return Err(NavigatorError::DuplicateIdentifier {
                identifier: step.identifier,
                scope: "step list".to_string(),
            });
        }
        let index = match after {
            Some(anchor) => self.require(anchor)?.0 + 1,
            None => self
                .insert_after_identifier()
                .and_then(|anchor| self.index_of(anchor))
                .map_or(1, |idx| idx + 1),
        }
        .min(self.len());

        if let Some(markers) = self.progress_markers.as_mut() {
            let position = self.steps[..index]
                .iter()
                .rev()
                .find_map(|prior| markers.iter().position(|m| *m == prior.identifier))
                .map_or(0, |idx| idx + 1);
            markers.insert(position, step.identifier.clone());
        }

        debug!("Inserting '{}' at position {index}", step.identifier);
        self.insert_after_identifier = Some(step.identifier.clone());
        self.steps.insert(index, step);
        Ok(())
    }

    /// Remove the steps with the given identifiers, and their progress
    /// markers. Unknown identifiers are ignored.
    pub fn remove<S: AsRef<str>>(&mut self, identifiers: &[S]) {
        let doomed = |id: &str| identifiers.iter().any(|d| d.as_ref() == id);
        self.steps.retain(|step| !doomed(&step.identifier));
        if let Some(markers) = self.progress_markers.as_mut() {
            markers.retain(|marker| !doomed(marker));
        }
    }

    /// A copy of this navigator with the step inserted.
    pub fn copy_and_insert(&self, step: Step, after: Option<&str>) -> Result<Self> {
        let mut copy = self.clone();
        copy.insert(step, after)?;
        Ok(copy)
    }

    /// A copy of this navigator without the given steps.
    pub fn copy_and_remove<S: AsRef<str>>(&self, identifiers: &[S]) -> Self {
        let mut copy = self.clone();
        copy.remove(identifiers);
        copy
    }
}
