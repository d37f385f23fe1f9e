//! Wrapper types for displaying step trees and navigation traces.

use std::fmt;

use super::status::ProgressLine;
use crate::{
    models::{Step, StepKind},
    navigator::StepNavigator,
    operations::TraceEvent,
    path::Transition,
};

/// A step list rendered as a nested markdown outline.
///
/// # Examples
///
/// ```rust
/// use pathway_core::{display::StepOutline, models::Step, navigator::StepNavigator};
///
/// let inner = StepNavigator::new(vec![Step::instruction("pulse")]).unwrap();
/// let outer = StepNavigator::new(vec![
///     Step::instruction("intro"),
///     Step::section("vitals", inner),
/// ])
/// .unwrap();
///
/// let output = StepOutline(&outer).to_string();
/// assert!(output.contains("- `intro` (instruction)"));
/// assert!(output.contains("  - `pulse` (instruction)"));
/// ```
pub struct StepOutline<'a>(pub &'a StepNavigator);

impl StepOutline<'_> {
    fn write_level(
        f: &mut fmt::Formatter<'_>,
        navigator: &StepNavigator,
        depth: usize,
    ) -> fmt::Result {
        let indent = "  ".repeat(depth);
        let markers = navigator.progress_markers().unwrap_or_default();
        for step in navigator.steps() {
            write!(f, "{indent}- `{}` ({})", step.identifier, step.step_type)?;
            if markers.contains(&step.identifier) {
                write!(f, " ◆")?;
            }
            write_annotations(f, step)?;
            writeln!(f)?;
            if let Some(child) = step.child_navigator() {
                Self::write_level(f, child, depth + 1)?;
            }
        }
        Ok(())
    }
}

fn write_annotations(f: &mut fmt::Formatter<'_>, step: &Step) -> fmt::Result {
    if let Some(next) = &step.next_step_identifier {
        write!(f, " → {next}")?;
    }
    if !step.before_cohort_rules.is_empty() {
        write!(f, " [before: {}]", step.before_cohort_rules.len())?;
    }
    if !step.after_cohort_rules.is_empty() {
        write!(f, " [after: {}]", step.after_cohort_rules.len())?;
    }
    if let StepKind::Question(question) = &step.kind {
        if !question.survey_rules.is_empty() {
            write!(f, " [rules: {}]", question.survey_rules.len())?;
        }
    }
    Ok(())
}

impl fmt::Display for StepOutline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No steps.");
        }
        Self::write_level(f, self.0, 0)
    }
}

/// Navigation events of a walk as a numbered list.
pub struct Trace<'a>(pub &'a [TraceEvent]);

impl fmt::Display for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No navigation events.");
        }
        for (idx, event) in self.0.iter().enumerate() {
            write!(f, "{}. ", idx + 1)?;
            match &event.transition {
                Transition::Arrived { .. } => {
                    let path = event.path.get(1..).unwrap_or_default().join(" / ");
                    writeln!(
                        f,
                        "{} · {}",
                        event.transition,
                        ProgressLine::new(&path, event.progress)
                    )?;
                }
                other => writeln!(f, "**{other}**")?,
            }
        }
        Ok(())
    }
}
