//! Task-level operations shared by every host.
//!
//! These drive the navigator and task run with scripted input and return
//! plain report structures; presentation lives in [`crate::display`].

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    error::Result,
    models::{AnswerResult, CohortSet, Task, TaskResult},
    navigator::{Direction, Progress},
    params::{NextStep, WalkScript, WalkTask},
    path::{TaskRun, Transition},
};

/// One navigation event of a walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    pub transition: Transition,
    /// Identifiers from the task down to the step shown
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

/// Outcome of [`walk_task`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkReport {
    pub events: Vec<TraceEvent>,
    pub cohorts: CohortSet,
    /// False when the walk was stopped by the step limit
    pub completed: bool,
    pub exit_early: bool,
    pub result: TaskResult,
}

/// Outcome of [`next_step`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextReport {
    pub after: Option<String>,
    pub step: Option<String>,
    pub direction: Direction,
    pub exit_early: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

/// Walk a task from its first step to the end, answering from a script.
///
/// On each arrival the scripted answer and override for the step are
/// recorded, then the run moves forward; a step listed in `goBackAt` sends
/// the walk back once on its first arrival instead.
///
/// # Errors
///
/// Propagates navigation errors such as a jump to a missing step.
///
/// # Examples
///
/// ```rust
/// use pathway_core::{operations::walk_task, params::WalkTask, TaskBuilder};
///
/// let task = TaskBuilder::from_json(
///     r#"{ "identifier": "t", "steps": [
///         { "identifier": "a", "type": "instruction", "nextStepIdentifier": "c" },
///         { "identifier": "b", "type": "instruction" },
///         { "identifier": "c", "type": "instruction" }
///     ] }"#,
/// )
/// .build()
/// .unwrap();
///
/// let report = walk_task(&task, &WalkTask::default()).unwrap();
/// assert!(report.completed);
/// assert_eq!(report.result.visited_identifiers(), vec!["a", "c"]);
/// ```
pub fn walk_task(task: &Task, params: &WalkTask) -> Result<WalkReport> {
    let cohorts = params
        .script
        .cohorts
        .iter()
        .chain(&params.cohorts)
        .cloned();
    let mut run = TaskRun::new(task).with_cohorts(cohorts);
    let mut went_back = BTreeSet::new();
    let mut events = Vec::new();
    let mut transition = run.start()?;

    loop {
        events.push(TraceEvent {
            transition: transition.clone(),
            path: run.full_path(),
            progress: run.progress()?,
        });
        let Transition::Arrived { identifier, .. } = &transition else {
            break;
        };
        if events.len() >= params.max_steps {
            warn!(
                "Walk of '{}' stopped after {} events at '{identifier}'",
                task.identifier, params.max_steps
            );
            break;
        }
        let identifier = identifier.clone();

        if params.script.go_back_at.contains(&identifier) && went_back.insert(identifier.clone()) {
            let back = run.go_back()?;
            if back != Transition::Stayed {
                transition = back;
                continue;
            }
        }
        record_input(&mut run, &identifier, &params.script);
        transition = run.go_forward()?;
    }

    let completed = run.is_finished();
    let exit_early = run.did_exit_early();
    let cohorts = run.cohorts().clone();
    Ok(WalkReport {
        events,
        cohorts,
        completed,
        exit_early,
        result: run.into_result(),
    })
}

fn record_input(run: &mut TaskRun, identifier: &str, script: &WalkScript) {
    let Some(result) = run.current_result_mut() else {
        return;
    };
    if let Some(value) = script.answers.get(identifier) {
        debug!("Answering '{identifier}' with {value}");
        match result.as_answer_mut() {
            Some(answer) => answer.value = value.clone(),
            None => *result = AnswerResult::new(identifier, value.clone()).into(),
        }
    }
    if let Some(target) = script.skip_to.get(identifier) {
        debug!("Override on '{identifier}' to '{target}'");
        result.set_skip_to_identifier(Some(target.clone()));
    }
}

/// Ask the task's top-level navigator which step follows `after`.
///
/// The given answers are recorded as visited results before the query.
pub fn next_step(task: &Task, params: &NextStep) -> Result<NextReport> {
    let mut result = task.instantiate_result();
    for (identifier, value) in &params.answers {
        result.append_step_history(AnswerResult::new(identifier, value.clone()).into());
    }
    let cohorts: CohortSet = params.cohorts.iter().cloned().collect();
    let navigator = &task.navigator;

    let outcome = navigator.step_after(params.after.as_deref(), &result, &cohorts, params.peek)?;
    let progress = match outcome.identifier() {
        Some(identifier) => navigator.progress(identifier, &result, &cohorts)?,
        None => None,
    };
    Ok(NextReport {
        after: params.after.clone(),
        step: outcome.identifier().map(str::to_string),
        direction: outcome.direction,
        exit_early: outcome.exit_early,
        progress,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::builder::TaskBuilder;

    fn screening_task() -> Task {
        TaskBuilder::from_value(json!({
            "identifier": "screening",
            "steps": [
                { "identifier": "intro", "type": "instruction" },
                { "identifier": "smokes", "type": "simpleQuestion",
                  "answerType": { "type": "boolean" },
                  "surveyRules": [ { "matchingAnswer": true, "cohort": "smoker" } ] },
                { "identifier": "packs", "type": "simpleQuestion",
                  "beforeCohortRules": [ { "requiredCohorts": ["smoker"], "operator": "any",
                                           "skipToIdentifier": "nextStep" } ] },
                { "identifier": "done", "type": "completion" }
            ]
        }))
        .build()
        .unwrap()
    }

    #[test]
    fn test_walk_applies_scripted_answers() {
        let params = WalkTask {
            script: WalkScript {
                answers: [("smokes".to_string(), json!(true))].into_iter().collect(),
                ..WalkScript::default()
            },
            ..WalkTask::default()
        };
        let report = walk_task(&screening_task(), &params).unwrap();

        assert!(report.completed);
        assert!(!report.exit_early);
        assert!(report.cohorts.contains("smoker"));
        assert_eq!(report.result.visited_identifiers(), vec!["intro", "smokes", "done"]);
        assert_eq!(
            report.events.last().map(|e| &e.transition),
            Some(&Transition::Finished { exit_early: false })
        );
    }

    #[test]
    fn test_walk_goes_back_once() {
        let params = WalkTask {
            script: WalkScript {
                go_back_at: ["done".to_string()].into_iter().collect(),
                ..WalkScript::default()
            },
            ..WalkTask::default()
        };
        let report = walk_task(&screening_task(), &params).unwrap();

        let shown: Vec<&str> = report
            .events
            .iter()
            .filter_map(|e| match &e.transition {
                Transition::Arrived { identifier, .. } => Some(identifier.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec!["intro", "smokes", "packs", "done", "packs", "done"]);
        assert_eq!(report.result.step_history.len(), 5);
    }

    #[test]
    fn test_walk_stops_at_step_limit() {
        let task = TaskBuilder::from_value(json!({
            "identifier": "loop",
            "steps": [
                { "identifier": "a", "type": "instruction" },
                { "identifier": "b", "type": "instruction", "nextStepIdentifier": "a" }
            ]
        }))
        .build()
        .unwrap();
        let params = WalkTask {
            max_steps: 7,
            ..WalkTask::default()
        };
        let report = walk_task(&task, &params).unwrap();

        assert!(!report.completed);
        assert_eq!(report.events.len(), 7);
        assert_eq!(report.events[2].transition, Transition::Arrived {
            identifier: "a".into(),
            direction: Direction::Reverse,
        });
    }

    #[test]
    fn test_next_step_peek_and_commit() {
        let task = screening_task();
        let mut params = NextStep {
            after: Some("intro".into()),
            ..NextStep::default()
        };
        assert_eq!(next_step(&task, &params).unwrap().step.as_deref(), Some("smokes"));

        params.after = Some("smokes".into());
        params.cohorts = vec!["smoker".into()];
        let report = next_step(&task, &params).unwrap();
        assert_eq!(report.step.as_deref(), Some("done"));
        assert_eq!(report.direction, Direction::Forward);
    }
}
