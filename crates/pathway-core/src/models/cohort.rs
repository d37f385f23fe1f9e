//! Cohort rules and their evaluation.
//!
//! A cohort is a participant-membership tag (for example a diagnosis group).
//! Steps carry ordered lists of [`CohortRule`]s that are tested against the
//! participant's current cohorts, before the step is shown and after it is
//! left.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::identifier::NavigationTarget;

/// The set of cohorts a participant currently belongs to.
pub type CohortSet = BTreeSet<String>;

/// How the required cohorts of a rule are combined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CohortOperator {
    /// Every required cohort must be present
    #[default]
    All,

    /// At least one required cohort must be present
    Any,
}

/// A rule that skips or redirects navigation based on cohort membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CohortRule {
    /// Cohorts tested by this rule
    pub required_cohorts: BTreeSet<String>,

    /// Operator to apply; `all` when omitted
    #[serde(rename = "operator", default, skip_serializing_if = "Option::is_none")]
    pub cohort_operator: Option<CohortOperator>,

    /// Step to jump to when the rule matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_identifier: Option<String>,
}

/// Which end of a step a rule list is applied at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePhase {
    /// Before the step is shown; an unredirected match skips the step.
    Before,
    /// After the step is left; an unredirected match finishes the section.
    After,
}

impl CohortRule {
    /// Create a rule requiring all of the given cohorts.
    pub fn new<I, S>(required_cohorts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_cohorts: required_cohorts.into_iter().map(Into::into).collect(),
            cohort_operator: None,
            skip_to_identifier: None,
        }
    }

    /// Set the operator.
    pub fn with_operator(mut self, operator: CohortOperator) -> Self {
        self.cohort_operator = Some(operator);
        self
    }

    /// Set the jump target.
    pub fn with_skip_to(mut self, identifier: impl Into<String>) -> Self {
        self.skip_to_identifier = Some(identifier.into());
        self
    }

    /// The operator in effect, defaulting to [`CohortOperator::All`].
    pub fn operator(&self) -> CohortOperator {
        self.cohort_operator.unwrap_or_default()
    }

    /// Test the rule against the participant's cohorts.
    ///
    /// An empty `required_cohorts` matches vacuously for `all` and never
    /// matches for `any`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pathway_core::models::{CohortOperator, CohortRule, CohortSet};
    ///
    /// let cohorts: CohortSet = ["diabetic".to_string()].into_iter().collect();
    /// let rule = CohortRule::new(["diabetic", "smoker"]).with_operator(CohortOperator::Any);
    /// assert!(rule.matches(&cohorts));
    /// assert!(!CohortRule::new(["diabetic", "smoker"]).matches(&cohorts));
    /// ```
    pub fn matches(&self, current_cohorts: &CohortSet) -> bool {
        match self.operator() {
            CohortOperator::All => self
                .required_cohorts
                .iter()
                .all(|cohort| current_cohorts.contains(cohort)),
            CohortOperator::Any => self
                .required_cohorts
                .iter()
                .any(|cohort| current_cohorts.contains(cohort)),
        }
    }

    /// Where this rule sends navigation when it matches in the given phase.
    pub fn target(&self, phase: RulePhase) -> NavigationTarget {
        match (&self.skip_to_identifier, phase) {
            (Some(identifier), _) => NavigationTarget::parse(identifier),
            (None, RulePhase::Before) => NavigationTarget::NextStep,
            (None, RulePhase::After) => NavigationTarget::NextSection,
        }
    }
}

/// Returns the first matching rule in declaration order, if any.
pub fn first_match<'a>(rules: &'a [CohortRule], current_cohorts: &CohortSet) -> Option<&'a CohortRule> {
    rules.iter().find(|rule| rule.matches(current_cohorts))
}

/// Cohorts to add to and remove from a participant after a step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortChange {
    pub add: CohortSet,
    pub remove: CohortSet,
}

impl CohortChange {
    /// Returns true if the change does nothing.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Apply to a cohort set, adding first and then removing.
    pub fn apply_to(&self, cohorts: &mut CohortSet) {
        cohorts.extend(self.add.iter().cloned());
        for cohort in &self.remove {
            cohorts.remove(cohort);
        }
    }
}
