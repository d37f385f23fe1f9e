//! Display implementations for operation reports.

use std::fmt;

use super::{collections::Trace, status::ProgressLine};
use crate::operations::{NextReport, WalkReport};

impl fmt::Display for WalkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Walk: {}", self.result.identifier)?;
        writeln!(f)?;
        let outcome = match (self.completed, self.exit_early) {
            (true, true) => "exited early",
            (true, false) => "completed",
            (false, _) => "stopped at step limit",
        };
        writeln!(f, "- Outcome: {outcome}")?;
        if self.cohorts.is_empty() {
            writeln!(f, "- Cohorts: none")?;
        } else {
            let cohorts: Vec<&str> = self.cohorts.iter().map(String::as_str).collect();
            writeln!(f, "- Cohorts: {}", cohorts.join(", "))?;
        }

        writeln!(f, "\n## Trace")?;
        writeln!(f)?;
        write!(f, "{}", Trace(&self.events))?;
        writeln!(f)?;
        write!(f, "{}", self.result)
    }
}

impl fmt::Display for NextReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.after.as_deref().unwrap_or("start");
        match &self.step {
            Some(step) => writeln!(
                f,
                "{from} → {} [{}]",
                ProgressLine::new(step, self.progress),
                self.direction
            ),
            None if self.exit_early => writeln!(f, "{from} → exit"),
            None => writeln!(f, "{from} → end"),
        }
    }
}
