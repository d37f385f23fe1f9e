//! Answer types describing the JSON shape of an answer value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The primitive type of an answer, or of the elements of an array answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
}

/// Describes the JSON shape of the value stored in an answer result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnswerType {
    String,
    Integer,
    Number,
    Boolean,
    #[serde(rename_all = "camelCase")]
    Array {
        #[serde(default)]
        base_type: BaseType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sequence_separator: Option<String>,
    },
    Object,
    #[serde(rename_all = "camelCase")]
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coding_format: Option<String>,
    },
    Measurement {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

impl AnswerType {
    /// Infer an answer type from a JSON value. Returns `None` for `null`.
    pub fn infer(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(number) if number.is_i64() || number.is_u64() => Some(Self::Integer),
            Value::Number(_) => Some(Self::Number),
            Value::String(_) => Some(Self::String),
            Value::Array(items) => {
                let base_type = match items.first() {
                    Some(Value::Bool(_)) => BaseType::Boolean,
                    Some(Value::Number(n)) if n.is_i64() || n.is_u64() => BaseType::Integer,
                    Some(Value::Number(_)) => BaseType::Number,
                    _ => BaseType::String,
                };
                Some(Self::Array {
                    base_type,
                    sequence_separator: None,
                })
            }
            Value::Object(_) => Some(Self::Object),
        }
    }

    /// Returns true if the answer is a sequence of values.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }
}
