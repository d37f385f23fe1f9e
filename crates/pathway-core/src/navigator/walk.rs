//! Forward and backward navigation over a step list.

use log::{debug, trace, warn};

use super::{Direction, NavigationResult, StepNavigator};
use crate::{
    error::{NavigatorError, Result},
    models::{first_match, CohortSet, NavigationTarget, RulePhase, Step, TaskResult},
};

impl StepNavigator {
    /// The step to show after `identifier`, or the first step when
    /// `identifier` is `None`.
    ///
    /// When `is_peeking` is true, one-shot overrides and survey-rule jumps on
    /// the departed step are ignored, so the answer is what navigation would
    /// do if the participant left the step without further input.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::StepNotFound` when `identifier` is not in the
    /// list and `NavigatorError::SkipTargetNotFound` when a rule or override
    /// that fires names a step that is not in the list.
    pub fn step_after(
        &self,
        identifier: Option<&str>,
        result: &TaskResult,
        cohorts: &CohortSet,
        is_peeking: bool,
    ) -> Result<NavigationResult<'_>> {
        let Some(identifier) = identifier else {
            return self.walk_forward(0, Direction::Forward, result, cohorts, is_peeking);
        };
        let (index, current) = self.require(identifier)?;
        match self.departure_target(current, result, cohorts, is_peeking) {
            None | Some(NavigationTarget::NextStep) => {
                self.walk_forward(index + 1, Direction::Forward, result, cohorts, is_peeking)
            }
            Some(NavigationTarget::NextSection) => Ok(NavigationResult::end()),
            Some(NavigationTarget::Exit) => Ok(NavigationResult::exit()),
            Some(NavigationTarget::Step(target)) => {
                let target_index = self.jump_index(&target, identifier)?;
                let direction = jump_direction(&target, result);
                debug!("Jumping from '{identifier}' to '{target}' ({direction:?})");
                self.walk_forward(target_index, direction, result, cohorts, is_peeking)
            }
        }
    }

    /// The step shown when navigation jumps to `identifier` from outside
    /// this list. The target is evaluated like any walk candidate, so it may
    /// itself be skipped.
    pub fn step_to(
        &self,
        identifier: &str,
        result: &TaskResult,
        cohorts: &CohortSet,
        is_peeking: bool,
    ) -> Result<NavigationResult<'_>> {
        let (index, _) = self.require(identifier)?;
        let direction = jump_direction(identifier, result);
        self.walk_forward(index, direction, result, cohorts, is_peeking)
    }

    /// Returns true if leaving `identifier` would end the whole task.
    pub fn should_exit(
        &self,
        identifier: &str,
        result: &TaskResult,
        cohorts: &CohortSet,
    ) -> Result<bool> {
        Ok(self
            .step_after(Some(identifier), result, cohorts, false)?
            .exit_early)
    }

    /// Returns true if a step would be shown after `identifier`. Always
    /// peeks, so repeated calls never consume an override.
    pub fn has_step_after(
        &self,
        identifier: Option<&str>,
        result: &TaskResult,
        cohorts: &CohortSet,
    ) -> Result<bool> {
        Ok(self
            .step_after(identifier, result, cohorts, true)?
            .step
            .is_some())
    }

    /// The step shown before `identifier` when walking back.
    ///
    /// Only declaration order matters: explicit forward jumps are not
    /// retraced. Steps that would currently be skipped, either by their own
    /// check or by a matching before-cohort rule, are passed over.
    pub fn step_before(
        &self,
        identifier: &str,
        result: &TaskResult,
        cohorts: &CohortSet,
    ) -> Result<Option<&Step>> {
        let (index, _) = self.require(identifier)?;
        Ok(self.steps()[..index]
            .iter()
            .rev()
            .find(|step| !is_hidden(step, result, cohorts)))
    }

    /// Returns true if there is a step before `identifier`.
    pub fn has_step_before(
        &self,
        identifier: &str,
        result: &TaskResult,
        cohorts: &CohortSet,
    ) -> Result<bool> {
        Ok(self.step_before(identifier, result, cohorts)?.is_some())
    }

    /// The last step that would be shown walking back into this list.
    pub fn last_step(&self, result: &TaskResult, cohorts: &CohortSet) -> Option<&Step> {
        self.steps()
            .iter()
            .rev()
            .find(|step| !is_hidden(step, result, cohorts))
    }

    /// Where leaving `current` sends navigation before the list walk:
    /// after-cohort rules first, then the step's own next-step logic.
    fn departure_target(
        &self,
        current: &Step,
        result: &TaskResult,
        cohorts: &CohortSet,
        is_peeking: bool,
    ) -> Option<NavigationTarget> {
        if let Some(rule) = first_match(&current.after_cohort_rules, cohorts) {
            let target = rule.target(RulePhase::After);
            debug!("After-cohort rule on '{}' sends to {target}", current.identifier);
            return Some(target);
        }
        current
            .next_step_identifier(result, is_peeking)
            .map(|identifier| NavigationTarget::parse(&identifier))
    }

    fn jump_index(&self, target: &str, from: &str) -> Result<usize> {
        self.index_of(target)
            .ok_or_else(|| NavigatorError::SkipTargetNotFound {
                target: target.to_string(),
                from: from.to_string(),
            })
    }

    fn walk_forward(
        &self,
        mut index: usize,
        mut direction: Direction,
        result: &TaskResult,
        cohorts: &CohortSet,
        is_peeking: bool,
    ) -> Result<NavigationResult<'_>> {
        let mut redirects = 0;
        while let Some(candidate) = self.steps().get(index) {
            if candidate.should_skip(result, is_peeking) {
                trace!("Skipping '{}'", candidate.identifier);
                index += 1;
                continue;
            }
            if let Some(rule) = first_match(&candidate.before_cohort_rules, cohorts) {
                match rule.target(RulePhase::Before) {
                    NavigationTarget::NextStep => {
                        trace!("Cohort rule skips '{}'", candidate.identifier);
                        index += 1;
                        continue;
                    }
                    NavigationTarget::NextSection => return Ok(NavigationResult::end()),
                    NavigationTarget::Exit => return Ok(NavigationResult::exit()),
                    NavigationTarget::Step(target) => {
                        if redirects < self.options().max_cohort_redirects {
                            redirects += 1;
                            index = self.jump_index(&target, &candidate.identifier)?;
                            if direction == Direction::Forward {
                                direction = jump_direction(&target, result);
                            }
                            debug!(
                                "Cohort rule on '{}' redirects to '{target}'",
                                candidate.identifier
                            );
                            continue;
                        }
                        warn!(
                            "Redirect limit of {} reached; ignoring cohort rule on '{}' targeting '{target}'",
                            self.options().max_cohort_redirects,
                            candidate.identifier
                        );
                    }
                }
            }
            return Ok(NavigationResult::shown(candidate, direction));
        }
        Ok(NavigationResult {
            direction,
            ..NavigationResult::end()
        })
    }
}

/// Whether the step would be passed over by a peeking walk.
pub(crate) fn is_hidden(step: &Step, result: &TaskResult, cohorts: &CohortSet) -> bool {
    step.should_skip(result, true) || first_match(&step.before_cohort_rules, cohorts).is_some()
}

fn jump_direction(target: &str, result: &TaskResult) -> Direction {
    if result.find_result(target).is_some() {
        Direction::Reverse
    } else {
        Direction::Forward
    }
}
