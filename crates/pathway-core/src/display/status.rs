//! One-line progress messages.

use std::fmt;

use crate::navigator::Progress;

/// A label followed by its progress, for example `vitals / pulse (1 of 2)`.
///
/// ```rust
/// use pathway_core::{display::ProgressLine, navigator::Progress};
///
/// let line = ProgressLine::new("pulse", Some(Progress { current: 1, total: 2, is_estimated: false }));
/// assert_eq!(line.to_string(), "pulse (1 of 2)");
/// assert_eq!(ProgressLine::new("pulse", None).to_string(), "pulse");
/// ```
pub struct ProgressLine<'a> {
    pub label: &'a str,
    pub progress: Option<Progress>,
}

impl<'a> ProgressLine<'a> {
    pub fn new(label: &'a str, progress: Option<Progress>) -> Self {
        Self { label, progress }
    }
}

impl fmt::Display for ProgressLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.progress {
            Some(progress) => write!(f, "{} ({progress})", self.label),
            None => write!(f, "{}", self.label),
        }
    }
}
