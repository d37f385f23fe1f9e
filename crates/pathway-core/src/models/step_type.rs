//! Step type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The `type` tag of a step.
///
/// Used to pick a decoder and by hosts to pick a presentation; navigation
/// never branches on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    Active,
    Completion,
    Countdown,
    Feedback,
    Instruction,
    Overview,
    Section,
    Transform,
    TaskInfo,
    Subtask,
    SimpleQuestion,
    MultipleInputQuestion,
    ChoiceQuestion,
    StringChoiceQuestion,
    /// A tag registered by the host application
    Custom(String),
}

impl StepType {
    /// Every built-in tag.
    pub const STANDARD: [StepType; 14] = [
        StepType::Active,
        StepType::Completion,
        StepType::Countdown,
        StepType::Feedback,
        StepType::Instruction,
        StepType::Overview,
        StepType::Section,
        StepType::Transform,
        StepType::TaskInfo,
        StepType::Subtask,
        StepType::SimpleQuestion,
        StepType::MultipleInputQuestion,
        StepType::ChoiceQuestion,
        StepType::StringChoiceQuestion,
    ];

    /// Wire representation of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            StepType::Active => "active",
            StepType::Completion => "completion",
            StepType::Countdown => "countdown",
            StepType::Feedback => "feedback",
            StepType::Instruction => "instruction",
            StepType::Overview => "overview",
            StepType::Section => "section",
            StepType::Transform => "transform",
            StepType::TaskInfo => "taskInfo",
            StepType::Subtask => "subtask",
            StepType::SimpleQuestion => "simpleQuestion",
            StepType::MultipleInputQuestion => "multipleInputQuestion",
            StepType::ChoiceQuestion => "choiceQuestion",
            StepType::StringChoiceQuestion => "stringChoiceQuestion",
            StepType::Custom(tag) => tag,
        }
    }

    /// Returns true for the question tags.
    pub fn is_question(&self) -> bool {
        matches!(
            self,
            StepType::SimpleQuestion
                | StepType::MultipleInputQuestion
                | StepType::ChoiceQuestion
                | StepType::StringChoiceQuestion
        )
    }
}

impl From<String> for StepType {
    fn from(tag: String) -> Self {
        StepType::STANDARD
            .iter()
            .find(|t| t.as_str() == tag)
            .cloned()
            .unwrap_or(StepType::Custom(tag))
    }
}

impl From<&str> for StepType {
    fn from(tag: &str) -> Self {
        StepType::from(tag.to_string())
    }
}

impl From<StepType> for String {
    fn from(step_type: StepType) -> Self {
        step_type.as_str().to_string()
    }
}

impl FromStr for StepType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StepType::from(s))
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
