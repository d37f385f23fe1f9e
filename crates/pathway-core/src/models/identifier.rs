//! Reserved navigation identifiers.

use std::fmt;

/// Jump to the end of the whole task, finishing it early.
pub const EXIT: &str = "exit";

/// Skip only the step being evaluated and continue in list order.
pub const NEXT_STEP: &str = "nextStep";

/// Finish the section (or task) currently being walked.
pub const NEXT_SECTION: &str = "nextSection";

/// Where a rule, override or explicit jump sends the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// A step named by identifier.
    Step(String),
    /// Skip the candidate and keep walking.
    NextStep,
    /// Leave the current step list.
    NextSection,
    /// End the task.
    Exit,
}

impl NavigationTarget {
    /// Interpret an identifier, mapping the reserved words to their variants.
    pub fn parse(identifier: &str) -> Self {
        match identifier {
            EXIT => Self::Exit,
            NEXT_STEP => Self::NextStep,
            NEXT_SECTION => Self::NextSection,
            other => Self::Step(other.to_string()),
        }
    }

    /// Returns true if the identifier is one of the reserved words.
    pub fn is_reserved(identifier: &str) -> bool {
        !matches!(Self::parse(identifier), Self::Step(_))
    }
}

impl From<&str> for NavigationTarget {
    fn from(identifier: &str) -> Self {
        Self::parse(identifier)
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(identifier) => write!(f, "{identifier}"),
            Self::NextStep => write!(f, "{NEXT_STEP}"),
            Self::NextSection => write!(f, "{NEXT_SECTION}"),
            Self::Exit => write!(f, "{EXIT}"),
        }
    }
}
