//! Survey rules: answer-driven jumps and cohort assignment for questions.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{identifier::EXIT, result::AnswerResult};

/// Comparison applied by a survey rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SurveyRuleOperator {
    /// Matches when the question was skipped (no answer)
    #[serde(rename = "de")]
    Skip,
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "ne")]
    NotEqual,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "le")]
    LessThanEqual,
    #[serde(rename = "ge")]
    GreaterThanEqual,
    /// Like `ne`, but for arrays matches when no element equals the answer
    #[serde(rename = "ot")]
    OtherThan,
}

/// A rule comparing a question's answer against a matching value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRule {
    /// Jump target when the rule matches; `exit` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_identifier: Option<String>,

    /// Value to compare the answer against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_answer: Option<Value>,

    /// Operator; `eq` when a matching answer is present, else `de`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_operator: Option<SurveyRuleOperator>,

    /// Cohort assigned when the rule matches and removed when it does not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort: Option<String>,
}

impl SurveyRule {
    /// The operator in effect.
    pub fn operator(&self) -> SurveyRuleOperator {
        self.rule_operator.unwrap_or(match self.matching_answer {
            Some(ref v) if !v.is_null() => SurveyRuleOperator::Equal,
            _ => SurveyRuleOperator::Skip,
        })
    }

    /// A rule is usable if it can match: it either has a value to compare
    /// against or tests for a skipped question.
    pub fn is_valid(&self) -> bool {
        let has_value = matches!(self.matching_answer, Some(ref v) if !v.is_null());
        has_value || self.operator() == SurveyRuleOperator::Skip
    }

    /// Test the rule against an answer. A missing answer or `null` value only
    /// matches the skip operator.
    pub fn matches(&self, answer: Option<&AnswerResult>) -> bool {
        let value = match answer {
            Some(answer) if answer.has_value() => &answer.value,
            _ => return self.operator() == SurveyRuleOperator::Skip,
        };
        let expected = match self.matching_answer {
            Some(ref expected) if !expected.is_null() => expected,
            _ => return false,
        };
        match self.operator() {
            SurveyRuleOperator::Skip => false,
            SurveyRuleOperator::Equal => match value {
                Value::Array(items) => items.iter().any(|item| json_eq(item, expected)),
                _ => json_eq(value, expected),
            },
            SurveyRuleOperator::OtherThan => match value {
                Value::Array(items) => !items.iter().any(|item| json_eq(item, expected)),
                _ => !json_eq(value, expected),
            },
            SurveyRuleOperator::NotEqual => !json_eq(value, expected),
            SurveyRuleOperator::LessThan => json_cmp(value, expected) == Some(Ordering::Less),
            SurveyRuleOperator::GreaterThan => json_cmp(value, expected) == Some(Ordering::Greater),
            SurveyRuleOperator::LessThanEqual => {
                matches!(json_cmp(value, expected), Some(Ordering::Less | Ordering::Equal))
            }
            SurveyRuleOperator::GreaterThanEqual => {
                matches!(json_cmp(value, expected), Some(Ordering::Greater | Ordering::Equal))
            }
        }
    }

    /// Jump target when the rule fires.
    pub fn skip_target(&self) -> &str {
        self.skip_to_identifier.as_deref().unwrap_or(EXIT)
    }
}

/// Numbers compare by value regardless of integer/float representation.
fn json_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

fn json_cmp(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Evaluate a question's survey rules.
///
/// Returns the jump target when exactly one rule fires. With no answer at
/// all, `skip_to_if_nil` wins when set. A rule that only assigns a cohort
/// (has a `cohort` and no `skipToIdentifier`) never jumps.
pub fn evaluate_rules<'a>(
    rules: &'a [SurveyRule],
    skip_to_if_nil: Option<&'a str>,
    answer: Option<&AnswerResult>,
) -> Option<&'a str> {
    let answered = answer.is_some_and(AnswerResult::has_value);
    if !answered {
        if let Some(target) = skip_to_if_nil {
            return Some(target);
        }
    }
    let mut fired = rules
        .iter()
        .filter(|rule| rule.skip_to_identifier.is_some() || rule.cohort.is_none())
        .filter(|rule| rule.matches(answer));
    match (fired.next(), fired.next()) {
        (Some(rule), None) => Some(rule.skip_target()),
        _ => None,
    }
}
