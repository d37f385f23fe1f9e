//! A task run shared between the presentation layer and background
//! producers.

use std::sync::{Arc, Mutex};

use super::{TaskRun, Transition};
use crate::{
    error::{NavigatorError, Result},
    models::{StepResult, TaskResult},
};

/// A [`TaskRun`] behind a single lock.
///
/// Every call takes the lock for its whole duration, so a background
/// producer folding in a result never interleaves with a navigation call
/// reading the tree.
#[derive(Debug, Clone)]
pub struct SharedTaskRun {
    inner: Arc<Mutex<TaskRun>>,
}

impl SharedTaskRun {
    pub fn new(run: TaskRun) -> Self {
        Self {
            inner: Arc::new(Mutex::new(run)),
        }
    }

    /// Run `f` with exclusive access to the run.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::InvalidState` if a previous holder of the
    /// lock panicked.
    pub fn with<R>(&self, f: impl FnOnce(&mut TaskRun) -> R) -> Result<R> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| NavigatorError::invalid_state("task run lock poisoned"))?;
        Ok(f(&mut *guard))
    }

    pub fn append_async_result(&self, result: StepResult) -> Result<Option<StepResult>> {
        self.with(|run| run.append_async_result(result))
    }

    pub fn go_forward(&self) -> Result<Transition> {
        self.with(TaskRun::go_forward)?
    }

    pub fn go_back(&self) -> Result<Transition> {
        self.with(TaskRun::go_back)?
    }

    /// A copy of the current result tree.
    pub fn snapshot(&self) -> Result<TaskResult> {
        self.with(|run| run.result())
    }
}

impl From<TaskRun> for SharedTaskRun {
    fn from(run: TaskRun) -> Self {
        Self::new(run)
    }
}
