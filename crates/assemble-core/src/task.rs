//! Tasks are the units of work of a project.
//!
//! A task type implements [`Task`](Task) and [`CreateTask`](CreateTask). Once registered in a
//! [`TaskContainer`](task_container::TaskContainer), it is only created and configured when it is
//! needed. Configured tasks are wrapped in an [`Executable`](Executable), which holds the actions
//! of the task and the [`WorkHandler`](work_handler::WorkHandler) that fingerprints its inputs
//! and outputs.

use crate::exception::BuildResult;
use crate::project::error::ProjectResult;
use crate::project::Project;
use std::fmt::{Debug, Display, Formatter};

pub mod create_task;
pub mod executable;
pub mod task_container;
pub mod up_to_date;
pub mod work_handler;

pub use create_task::CreateTask;
pub use executable::Executable;
pub use task_container::TaskHandle;

/// A task type.
pub trait Task: CreateTask + Debug + Send + Sync + Sized + 'static {
    /// Declares the inputs and outputs of the task. Runs once, after every configuration of the
    /// task has been applied.
    fn configure_io(_task: &mut Executable<Self>, _project: &Project) -> ProjectResult {
        Ok(())
    }

    /// The main action of the task
    fn task_action(task: &mut Executable<Self>, project: &Project) -> BuildResult;
}

type ActionFn<T> = dyn Fn(&mut Executable<T>, &Project) -> BuildResult + Send + Sync;

/// An action that runs as part of a task
pub struct Action<T: Task> {
    func: Box<ActionFn<T>>,
}

impl<T: Task> Action<T> {
    /// Creates a new action from a function
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Executable<T>, &Project) -> BuildResult + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
        }
    }

    /// Runs this action
    pub fn execute(&self, task: &mut Executable<T>, project: &Project) -> BuildResult {
        (self.func)(task, project)
    }
}

impl<T: Task> Debug for Action<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action").finish_non_exhaustive()
    }
}

/// The outcome of a task that did not fail
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TaskOutcome {
    /// The actions of the task ran
    Executed,
    /// The task was skipped because its inputs and outputs did not change
    UpToDate,
}

impl Display for TaskOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutcome::Executed => write!(f, "EXECUTED"),
            TaskOutcome::UpToDate => write!(f, "UP-TO-DATE"),
        }
    }
}
