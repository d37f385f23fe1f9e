//! Task path composition.
//!
//! A [`TaskRun`] walks a task whose steps may be nested sections or
//! subtasks. Each level of nesting is a [`PathNode`] holding its own
//! navigator and in-progress [`TaskResult`]; nodes live in an arena and
//! refer to their parent by [`NodeId`]. When a nested level completes, its
//! result is appended to the parent as a single [`StepResult::Section`]
//! entry, so the finished result is a tree rather than a flat list.
//!
//! ```text
//!  root (task)            ┌──── steps: intro, vitals, done
//!   └─ vitals (section)   └──── steps: pulse, weight
//!       current: pulse    ──▶ result: task { intro, vitals { pulse, weight }, done }
//! ```
//!
//! Forward and backward movement, progress and the "has step before/after"
//! checks all consult the active level first and fall back to its
//! ancestors once the active level is exhausted.

use jiff::Timestamp;
use log::{debug, info};
use serde::Serialize;

use crate::{
    error::{NavigatorError, Result},
    models::{CohortSet, Step, StepResult, Task, TaskResult},
    navigator::{Direction, NavigationResult, Progress, StepNavigator},
};

mod shared;


pub use shared::SharedTaskRun;

/// Index of a node in a run's arena.
pub type NodeId = usize;

/// What a navigation request did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Transition {
    /// A step is now on screen
    Arrived {
        identifier: String,
        direction: Direction,
    },
    /// The whole task is complete
    Finished {
        #[serde(rename = "exitEarly")]
        exit_early: bool,
    },
    /// Nothing to move to; the current step is unchanged
    Stayed,
}

/// One level of nesting in a run.
#[derive(Debug, Clone)]
pub struct PathNode {
    identifier: String,
    parent: Option<NodeId>,
    navigator: StepNavigator,
    result: TaskResult,
    current_step: Option<String>,
    pending: Option<StepResult>,
    previous_results: Vec<StepResult>,
}

impl PathNode {
    fn new(
        identifier: &str,
        navigator: StepNavigator,
        parent: Option<NodeId>,
        result: TaskResult,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            parent,
            navigator,
            result,
            current_step: None,
            pending: None,
            previous_results: Vec::new(),
        }
    }

    /// Identifier of the task, section or subtask this node walks.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    /// Committed results at this level.
    pub fn result(&self) -> &TaskResult {
        &self.result
    }

    /// Identifier of the step this level is positioned on.
    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    /// Keep a result that navigation discarded, so a later visit can
    /// restore it.
    fn stash(&mut self, result: StepResult) {
        self.previous_results
            .retain(|r| r.identifier() != result.identifier());
        self.previous_results.push(result);
    }

    fn take_previous(&mut self, identifier: &str) -> Option<StepResult> {
        let idx = self
            .previous_results
            .iter()
            .position(|r| r.identifier() == identifier)?;
        Some(self.previous_results.remove(idx))
    }

    /// Clear the one-shot override on the departed step's entry.
    fn consume_override(&mut self, identifier: &str) {
        if let Some(entry) = self.result.find_result_mut(identifier) {
            let (taken, cleared) = entry.clone().take_skip_to(false);
            if let Some(target) = taken {
                debug!("Consumed override '{target}' on '{identifier}'");
                *entry = cleared;
            }
        }
    }

    /// Committed results plus the step currently being edited.
    fn result_view(&self) -> TaskResult {
        let mut view = self.result.clone();
        if let Some(pending) = &self.pending {
            view.children.push(pending.clone());
        }
        view
    }
}

/// Where the next forward walk starts.
enum Anchor {
    Start,
    After(String),
    To(String),
}

/// Owned form of a [`NavigationResult`].
enum Move {
    Show { identifier: String, direction: Direction },
    End,
    Exit,
}

impl From<NavigationResult<'_>> for Move {
    fn from(outcome: NavigationResult<'_>) -> Self {
        match outcome.step {
            Some(step) => Move::Show {
                identifier: step.identifier.clone(),
                direction: outcome.direction,
            },
            None if outcome.exit_early => Move::Exit,
            None => Move::End,
        }
    }
}

/// A single run of a task.
#[derive(Debug, Clone)]
pub struct TaskRun {
    nodes: Vec<PathNode>,
    current: NodeId,
    cohorts: CohortSet,
    started: bool,
    finished: bool,
    exit_early: bool,
}

impl TaskRun {
    /// Create a run over a copy of the task's steps.
    pub fn new(task: &Task) -> Self {
        let root = PathNode::new(
            &task.identifier,
            task.navigator.clone(),
            None,
            task.instantiate_result(),
        );
        Self {
            nodes: vec![root],
            current: 0,
            cohorts: CohortSet::new(),
            started: false,
            finished: false,
            exit_early: false,
        }
    }

    /// Set the participant's initial cohorts.
    pub fn with_cohorts<I, S>(mut self, cohorts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cohorts = cohorts.into_iter().map(Into::into).collect();
        self
    }

    /// The participant's current cohorts.
    pub fn cohorts(&self) -> &CohortSet {
        &self.cohorts
    }

    /// Navigate to the first step.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::InvalidState` if the run already started.
    pub fn start(&mut self) -> Result<Transition> {
        if self.started {
            return Err(NavigatorError::invalid_state("task run already started"));
        }
        self.started = true;
        info!("Starting task '{}'", self.nodes[0].identifier);
        self.advance(Anchor::Start)
    }

    /// Commit the current step's result and move forward.
    ///
    /// Cohorts assigned by the step's survey rules are applied before
    /// navigating. A one-shot override on the committed result is honoured
    /// once and then cleared.
    pub fn go_forward(&mut self) -> Result<Transition> {
        self.ensure_running()?;
        let node = &mut self.nodes[self.current];
        let Some(step_id) = node.current_step.clone() else {
            return Err(NavigatorError::invalid_state("no current step"));
        };
        let mut committed = match node.pending.take() {
            Some(pending) => pending,
            None => node
                .navigator
                .require(&step_id)?
                .1
                .instantiate_result(),
        };
        committed.set_end_date(Timestamp::now());
        node.result.append_step_history(committed);

        if let Some(change) = node
            .navigator
            .step_with_identifier(&step_id)
            .and_then(|step| step.cohorts_to_apply(&node.result))
        {
            debug!(
                "Cohorts after '{step_id}': +{:?} -{:?}",
                change.add, change.remove
            );
            change.apply_to(&mut self.cohorts);
        }
        self.advance(Anchor::After(step_id))
    }

    /// Move to the step shown before the current one.
    ///
    /// The current step's in-progress result is kept aside and restored if
    /// the participant comes forward again. Walking back into a completed
    /// section resumes at the last step visited in it.
    pub fn go_back(&mut self) -> Result<Transition> {
        self.ensure_running()?;
        if !self.has_step_before()? {
            return Ok(Transition::Stayed);
        }
        let node = &mut self.nodes[self.current];
        if let Some(pending) = node.pending.take() {
            node.stash(pending);
        }
        loop {
            let view = self.navigation_view(self.current);
            let node = &self.nodes[self.current];
            let current = node.current_step.as_deref().unwrap_or_default();
            let before = node
                .navigator
                .step_before(current, &view, &self.cohorts)?
                .map(|step| step.identifier.clone());
            match (before, node.parent) {
                (Some(previous), _) => return self.enter_backward(previous),
                (None, Some(parent)) => self.leave_backward(parent),
                (None, None) => return Ok(Transition::Stayed),
            }
        }
    }

    /// The step currently on screen.
    pub fn current_step(&self) -> Option<&Step> {
        let node = self.nodes.get(self.current)?;
        node.navigator
            .step_with_identifier(node.current_step.as_deref()?)
    }

    /// The in-progress result of the current step, for the host to edit.
    pub fn current_result_mut(&mut self) -> Option<&mut StepResult> {
        if self.finished {
            return None;
        }
        self.nodes.get_mut(self.current)?.pending.as_mut()
    }

    /// The active node.
    pub fn current_node(&self) -> &PathNode {
        &self.nodes[self.current]
    }

    /// Returns true if a step would follow the current one, at this level
    /// or, once this level is exhausted, at an ancestor.
    pub fn has_step_after(&self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        for (node_id, node) in self.chain() {
            let view = self.navigation_view(node_id);
            let outcome = node
                .navigator
                .step_after(node.current_step.as_deref(), &view, &self.cohorts, true);
            match outcome {
                Ok(outcome) if outcome.step.is_some() => return Ok(true),
                Ok(outcome) if outcome.exit_early => return Ok(false),
                Ok(_) => {}
                Err(NavigatorError::SkipTargetNotFound { target, from }) => {
                    return match self.ancestor_containing(&target) {
                        Some(_) => Ok(true),
                        None => Err(NavigatorError::SkipTargetNotFound { target, from }),
                    };
                }
                Err(err) => return Err(err),
            }
        }
        Ok(false)
    }

    /// Returns true if a step precedes the current one at this level or at
    /// an ancestor.
    pub fn has_step_before(&self) -> Result<bool> {
        for (node_id, node) in self.chain() {
            if let Some(current) = node.current_step.as_deref() {
                let view = self.navigation_view(node_id);
                if node.navigator.has_step_before(current, &view, &self.cohorts)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Returns true on the first step shown in the run.
    pub fn is_first_step(&self) -> Result<bool> {
        Ok(!self.has_step_before()?)
    }

    /// Progress of the current step within its level.
    pub fn progress(&self) -> Result<Option<Progress>> {
        let node = self.current_node();
        match node.current_step.as_deref() {
            Some(current) if !self.finished => {
                node.navigator
                    .progress(current, &self.navigation_view(self.current), &self.cohorts)
            }
            _ => Ok(None),
        }
    }

    /// A result set aside when navigation moved back past its step.
    pub fn previous_result(&self, identifier: &str) -> Option<&StepResult> {
        self.chain()
            .find_map(|(_, node)| node.previous_results.iter().find(|r| r.identifier() == identifier))
    }

    /// Fold a result produced in the background into the root result.
    pub fn append_async_result(&mut self, result: StepResult) -> Option<StepResult> {
        debug!("Async result '{}'", result.identifier());
        self.nodes[0].result.append_async_result(result)
    }

    /// Identifiers from the root task down to the current step.
    pub fn full_path(&self) -> Vec<String> {
        let mut path = vec![self.nodes[0].identifier.clone()];
        path.extend(
            self.nodes
                .iter()
                .take(self.current + 1)
                .filter_map(|node| node.current_step.clone()),
        );
        path
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn did_exit_early(&self) -> bool {
        self.exit_early
    }

    /// A snapshot of the whole result tree, including open sections and the
    /// step currently being edited.
    pub fn result(&self) -> TaskResult {
        let mut tree = self.nodes[self.current].result_view();
        for node in self.nodes[..self.current].iter().rev() {
            let mut parent = node.result_view();
            parent.children.push(StepResult::Section(tree));
            tree = parent;
        }
        tree
    }

    /// Consume the run, returning its result tree.
    pub fn into_result(mut self) -> TaskResult {
        if self.current == 0 && self.nodes[0].pending.is_none() {
            return self.nodes.swap_remove(0).result;
        }
        self.result()
    }

    fn ensure_running(&self) -> Result<()> {
        if !self.started {
            return Err(NavigatorError::invalid_state("task run has not started"));
        }
        if self.finished {
            return Err(NavigatorError::invalid_state("task run is finished"));
        }
        Ok(())
    }

    /// Nodes from the current one up to the root.
    fn chain(&self) -> impl Iterator<Item = (NodeId, &PathNode)> {
        let mut next = Some(self.current);
        std::iter::from_fn(move || {
            let id = next?;
            let node = self.nodes.get(id)?;
            next = node.parent;
            Some((id, node))
        })
    }

    /// Results visible to navigation at a level: its own entries, with
    /// every ancestor level attached as async results so that answers
    /// recorded anywhere in the tree can be found.
    fn navigation_view(&self, node_id: NodeId) -> TaskResult {
        let node = &self.nodes[node_id];
        self.with_ancestors(node.result_view(), node.parent)
    }

    fn with_ancestors(&self, mut view: TaskResult, mut next: Option<NodeId>) -> TaskResult {
        while let Some(node) = next.and_then(|id| self.nodes.get(id)) {
            view.async_results
                .push(StepResult::Section(node.result_view()));
            next = node.parent;
        }
        view
    }

    /// Discard the current node while walking back out of it. Its results
    /// are stashed in the parent as one section entry and restored when
    /// the section is entered again.
    fn leave_backward(&mut self, parent: NodeId) {
        let Some(node) = self.nodes.pop() else {
            return;
        };
        debug!("Leaving '{}' backward", node.identifier);
        let mut abandoned = node.result;
        abandoned.children.extend(node.previous_results);
        self.current = parent;
        self.nodes[parent].stash(StepResult::Section(abandoned));
    }

    /// The nearest strict ancestor of the current node whose step list
    /// contains `identifier`.
    fn ancestor_containing(&self, identifier: &str) -> Option<NodeId> {
        let mut next = self.nodes.get(self.current)?.parent;
        while let Some(id) = next {
            let node = self.nodes.get(id)?;
            if node.navigator.index_of(identifier).is_some() {
                return Some(id);
            }
            next = node.parent;
        }
        None
    }

    /// Close the current node, appending its result to the parent. Returns
    /// the identifier of the closed section.
    fn close_current(&mut self) -> Option<String> {
        let parent = self.nodes.get(self.current)?.parent?;
        let mut node = self.nodes.pop()?;
        node.result.end_date = Some(Timestamp::now());
        debug!("Completed '{}'", node.identifier);
        self.current = parent;
        let identifier = node.identifier.clone();
        self.nodes[parent]
            .result
            .append_step_history(StepResult::Section(node.result));
        Some(identifier)
    }

    fn finish(&mut self, exit_early: bool) -> Transition {
        while self.close_current().is_some() {}
        let root = &mut self.nodes[0];
        root.current_step = None;
        root.result.end_date = Some(Timestamp::now());
        self.finished = true;
        self.exit_early = exit_early;
        info!(
            "Task '{}' finished{}",
            root.identifier,
            if exit_early { " early" } else { "" }
        );
        Transition::Finished { exit_early }
    }

    /// Walk forward from the anchor until a leaf step is shown or the task
    /// ends, descending into sections and bubbling completed ones up.
    fn advance(&mut self, mut anchor: Anchor) -> Result<Transition> {
        loop {
            let node_id = self.current;
            let view = self.navigation_view(node_id);
            let navigator = &self.nodes[node_id].navigator;
            let outcome = match &anchor {
                Anchor::Start => navigator.step_after(None, &view, &self.cohorts, false),
                Anchor::After(id) => navigator.step_after(Some(id), &view, &self.cohorts, false),
                Anchor::To(id) => navigator.step_to(id, &view, &self.cohorts, false),
            }
            .map(Move::from);
            if let Anchor::After(id) = &anchor {
                self.nodes[node_id].consume_override(id);
            }

            let next = match outcome {
                Ok(next) => next,
                Err(NavigatorError::SkipTargetNotFound { target, from }) => {
                    let Some(ancestor) = self.ancestor_containing(&target) else {
                        return Err(NavigatorError::SkipTargetNotFound { target, from });
                    };
                    debug!("Jump from '{from}' to '{target}' leaves the current section");
                    while self.current != ancestor && self.close_current().is_some() {}
                    anchor = Anchor::To(target);
                    continue;
                }
                Err(err) => return Err(err),
            };

            match next {
                Move::Exit => return Ok(self.finish(true)),
                Move::End => match self.close_current() {
                    Some(section) => anchor = Anchor::After(section),
                    None => return Ok(self.finish(false)),
                },
                Move::Show {
                    identifier,
                    direction,
                } => {
                    let node = &mut self.nodes[node_id];
                    if direction == Direction::Reverse {
                        for removed in node.result.remove_step_history(&identifier) {
                            node.stash(removed);
                        }
                    }
                    node.current_step = Some(identifier.clone());
                    let step = node.navigator.require(&identifier)?.1;
                    let child = step.child_navigator().cloned();
                    let fresh = step.instantiate_result();
                    match child {
                        Some(navigator) => {
                            debug!("Entering '{identifier}'");
                            let restored = node
                                .take_previous(&identifier)
                                .and_then(StepResult::into_task_result)
                                .map(|section| section.children)
                                .unwrap_or_default();
                            self.push_child(&identifier, navigator, TaskResult::new(&identifier));
                            let child = &mut self.nodes[self.current];
                            for result in restored {
                                child.stash(result);
                            }
                            anchor = Anchor::Start;
                        }
                        None => {
                            node.pending = Some(node.take_previous(&identifier).unwrap_or(fresh));
                            debug!("Arrived at '{identifier}' ({direction:?})");
                            return Ok(Transition::Arrived {
                                identifier,
                                direction,
                            });
                        }
                    }
                }
            }
        }
    }

    fn push_child(&mut self, identifier: &str, navigator: StepNavigator, result: TaskResult) {
        let parent = self.current;
        self.nodes
            .push(PathNode::new(identifier, navigator, Some(parent), result));
        self.current = self.nodes.len() - 1;
    }

    /// Land on `target` at the current level while walking back, resuming
    /// inside it if it is a section.
    fn enter_backward(&mut self, mut target: String) -> Result<Transition> {
        loop {
            let node = &mut self.nodes[self.current];
            let mut restored = None;
            for removed in node.result.remove_step_history(&target) {
                if removed.identifier() == target {
                    restored = Some(removed);
                } else {
                    node.stash(removed);
                }
            }
            node.current_step = Some(target.clone());
            let step = node.navigator.require(&target)?.1;
            let child = step.child_navigator().cloned();
            let fresh = step.instantiate_result();

            let Some(navigator) = child else {
                node.pending = Some(
                    restored
                        .or_else(|| node.take_previous(&target))
                        .unwrap_or(fresh),
                );
                debug!("Back at '{target}'");
                return Ok(Transition::Arrived {
                    identifier: target,
                    direction: Direction::Reverse,
                });
            };

            let section_result = restored
                .and_then(StepResult::into_task_result)
                .unwrap_or_else(|| TaskResult::new(&target));
            let last = section_result
                .children
                .last()
                .map(|r| r.identifier().to_string())
                .or_else(|| {
                    let view = self.with_ancestors(section_result.clone(), Some(self.current));
                    navigator
                        .last_step(&view, &self.cohorts)
                        .map(|step| step.identifier.clone())
                });
            let Some(last) = last else {
                return Err(NavigatorError::invalid_state(format!(
                    "section '{target}' has no step to go back to"
                )));
            };
            debug!("Re-entering '{target}' at '{last}'");
            self.push_child(&target, navigator, section_result);
            target = last;
        }
    }
}
