//! Display implementations for domain models.
//!
//! Steps and results render as markdown for the terminal renderer; small
//! value types render as a single word.

use std::fmt;

use super::datetime::{Elapsed, LocalDateTime};
use crate::{
    models::{
        CohortOperator, CohortRule, Step, StepKind, StepResult, SurveyRuleOperator, TaskResult,
    },
    navigator::{Direction, Progress},
    path::Transition,
};

impl fmt::Display for CohortOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CohortOperator::All => write!(f, "all"),
            CohortOperator::Any => write!(f, "any"),
        }
    }
}

impl fmt::Display for CohortRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cohorts: Vec<&str> = self.required_cohorts.iter().map(String::as_str).collect();
        write!(f, "{} of [{}]", self.operator(), cohorts.join(", "))?;
        if let Some(target) = &self.skip_to_identifier {
            write!(f, " → {target}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SurveyRuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelling = match self {
            SurveyRuleOperator::Skip => "de",
            SurveyRuleOperator::Equal => "eq",
            SurveyRuleOperator::NotEqual => "ne",
            SurveyRuleOperator::LessThan => "lt",
            SurveyRuleOperator::GreaterThan => "gt",
            SurveyRuleOperator::LessThanEqual => "le",
            SurveyRuleOperator::GreaterThanEqual => "ge",
            SurveyRuleOperator::OtherThan => "ot",
        };
        write!(f, "{spelling}")
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::None => "none",
        };
        write!(f, "{word}")
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_estimated {
            write!(f, "about {} of {}", self.current, self.total)
        } else {
            write!(f, "{} of {}", self.current, self.total)
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Arrived {
                identifier,
                direction: Direction::Reverse,
            } => write!(f, "back to `{identifier}`"),
            Transition::Arrived { identifier, .. } => write!(f, "at `{identifier}`"),
            Transition::Finished { exit_early: true } => write!(f, "exited early"),
            Transition::Finished { exit_early: false } => write!(f, "finished"),
            Transition::Stayed => write!(f, "stayed"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {} ({})", self.identifier, self.step_type)?;
        writeln!(f)?;

        if let Some(title) = &self.title {
            writeln!(f, "**{title}**")?;
            writeln!(f)?;
        }
        if let Some(text) = &self.text {
            writeln!(f, "{text}")?;
            writeln!(f)?;
        }

        if let Some(next) = &self.next_step_identifier {
            writeln!(f, "- Next: {next}")?;
        }
        for rule in &self.before_cohort_rules {
            writeln!(f, "- Before: {rule}")?;
        }
        for rule in &self.after_cohort_rules {
            writeln!(f, "- After: {rule}")?;
        }

        match &self.kind {
            StepKind::Ui {
                duration: Some(duration),
            } => writeln!(f, "- Duration: {duration}s")?,
            StepKind::Ui { duration: None } => {}
            StepKind::ResultSummary(summary) => {
                if let Some(id) = &summary.result_identifier {
                    writeln!(f, "- Shows: {id}")?;
                }
            }
            StepKind::Question(question) => {
                for rule in &question.survey_rules {
                    let value = rule
                        .matching_answer
                        .as_ref()
                        .map_or_else(String::new, |v| format!(" {v}"));
                    write!(f, "- Rule: {}{value} → {}", rule.operator(), rule.skip_target())?;
                    match &rule.cohort {
                        Some(cohort) => writeln!(f, " (cohort {cohort})")?,
                        None => writeln!(f)?,
                    }
                }
                if let Some(target) = &question.skip_to_if_nil {
                    writeln!(f, "- If skipped: {target}")?;
                }
            }
            StepKind::Section(section) => {
                writeln!(f, "- Steps: {}", section.navigator.len())?;
            }
            StepKind::Subtask(task) => {
                writeln!(f, "- Task: {} ({} steps)", task.identifier, task.navigator.len())?;
            }
        }
        Ok(())
    }
}

/// Write one result line, recursing into nested task results.
fn write_result(f: &mut fmt::Formatter<'_>, result: &StepResult, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    write!(
        f,
        "{indent}- `{}` ({}, {})",
        result.identifier(),
        result.type_tag(),
        Elapsed::new(result.start_date(), result.end_date())
    )?;
    match result {
        StepResult::Answer(answer) if answer.has_value() => writeln!(f, ": {}", answer.value),
        StepResult::Answer(_) => writeln!(f, ": _skipped_"),
        StepResult::Error(error) => writeln!(f, ": {}", error.error_description),
        StepResult::Collection(collection) => {
            writeln!(f)?;
            for child in &collection.children {
                write_result(f, child, depth + 1)?;
            }
            Ok(())
        }
        StepResult::Task(task) | StepResult::Section(task) => {
            writeln!(f)?;
            for child in &task.children {
                write_result(f, child, depth + 1)?;
            }
            Ok(())
        }
        StepResult::Base(_) => writeln!(f),
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_result(f, self, 0)
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Result: {}", self.identifier)?;
        writeln!(f)?;
        writeln!(f, "- Started: {}", LocalDateTime(&self.start_date))?;
        match &self.end_date {
            Some(end) => writeln!(f, "- Finished: {}", LocalDateTime(end))?,
            None => writeln!(f, "- Finished: in progress")?,
        }
        writeln!(f, "- Visits: {}", self.step_history.len())?;

        if self.children.is_empty() {
            writeln!(f, "\nNo steps visited.")?;
        } else {
            writeln!(f, "\n## Steps")?;
            writeln!(f)?;
            for child in &self.children {
                write_result(f, child, 0)?;
            }
        }

        if !self.async_results.is_empty() {
            writeln!(f, "\n## Background results")?;
            writeln!(f)?;
            for child in &self.async_results {
                write_result(f, child, 0)?;
            }
        }
        Ok(())
    }
}
