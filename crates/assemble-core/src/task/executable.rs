use super::{Action, Task, TaskOutcome};
use crate::exception::{BuildException, BuildResult};
use crate::identifier::TaskId;
use crate::task::up_to_date::UpToDate;
use crate::task::work_handler::WorkHandler;
use crate::Project;
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};

/// A configured task, along with its actions and work handler
pub struct Executable<T: Task> {
    pub task: T,
    task_id: TaskId,
    description: String,
    first: Vec<Action<T>>,
    last: Vec<Action<T>>,
    work: WorkHandler,
    outcome: Option<TaskOutcome>,
}

impl<T: Task> Executable<T> {
    /// Wraps a task
    pub fn new(project: &Project, task: T, task_id: TaskId) -> Self {
        let work = WorkHandler::new(&task_id, project.task_history_dir());
        Self {
            task,
            description: T::description(),
            task_id,
            first: vec![],
            last: vec![],
            work,
            outcome: None,
        }
    }

    /// The id of this task
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// The description of this task
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description of this task
    pub fn set_description(&mut self, description: impl AsRef<str>) {
        self.description = description.as_ref().to_string();
    }

    /// Adds an action that runs before the task action. Actions added later run earlier.
    pub fn do_first<F>(&mut self, a: F)
    where
        F: Fn(&mut Executable<T>, &Project) -> BuildResult + Send + Sync + 'static,
    {
        self.first.push(Action::new(a));
    }

    /// Adds an action that runs after the task action.
    pub fn do_last<F>(&mut self, a: F)
    where
        F: Fn(&mut Executable<T>, &Project) -> BuildResult + Send + Sync + 'static,
    {
        self.last.push(Action::new(a));
    }

    /// The work handler of this task, used to declare inputs and outputs
    pub fn work(&self) -> &WorkHandler {
        &self.work
    }

    /// The work handler of this task, used to declare inputs and outputs
    pub fn work_mut(&mut self) -> &mut WorkHandler {
        &mut self.work
    }

    /// The outcome of this task, if it already ran successfully
    pub fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }

    fn actions(&mut self) -> Vec<Action<T>> {
        let mut output: Vec<Action<T>> = self.first.drain(..).rev().collect();
        output.push(Action::new(T::task_action));
        output.extend(self.last.drain(..));
        output
    }

    fn execute_actions(&mut self, project: &Project) -> BuildResult {
        for action in self.actions() {
            match action.execute(self, project) {
                Ok(()) => {}
                Err(BuildException::StopAction) => continue,
                Err(BuildException::StopTask) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Runs this task.
    ///
    /// The task is skipped if it's up to date and `rerun` is false. Previous execution history is
    /// removed before the actions run, and new history is only stored when every action succeeds.
    /// A task only ever runs once, later calls return the first outcome.
    pub fn execute(&mut self, project: &Project, rerun: bool) -> BuildResult<TaskOutcome> {
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }

        self.work.get_input()?;
        let outcome = if !rerun && self.work.up_to_date() {
            TaskOutcome::UpToDate
        } else {
            self.work.remove_execution_history()?;
            self.execute_actions(project)?;
            self.work.store_execution_history()?;
            TaskOutcome::Executed
        };
        self.outcome = Some(outcome);
        Ok(outcome)
    }
}

impl<T: Task> Debug for Executable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executable")
            .field("task", &self.task)
            .field("id", &self.task_id)
            .finish_non_exhaustive()
    }
}

impl<T: Task> Deref for Executable<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

impl<T: Task> DerefMut for Executable<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.task
    }
}
