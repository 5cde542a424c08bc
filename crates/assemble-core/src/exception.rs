//! Build time exceptions

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Exceptions that can be raised by task actions.
///
/// `StopAction` and `StopTask` are control flow, and never fail a build.
#[derive(Debug)]
pub enum BuildException {
    /// Stop the current action, and move on to the next one
    StopAction,
    /// Stop the task, skipping all remaining actions
    StopTask,
    /// An actual error
    Error(Box<dyn Error + Send + Sync>),
}

impl BuildException {
    /// Wraps an error
    pub fn new<E: 'static + Error + Send + Sync>(e: E) -> Self {
        BuildException::Error(Box::new(e))
    }

    /// Creates an error exception from a message
    pub fn custom(e: &str) -> Self {
        Self::new(BuildError::new(e))
    }
}

impl Display for BuildException {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildException::StopAction => write!(f, "action stopped"),
            BuildException::StopTask => write!(f, "task stopped"),
            BuildException::Error(e) => write!(f, "{}", e),
        }
    }
}

impl<E: 'static + Error + Send + Sync> From<E> for BuildException {
    fn from(e: E) -> Self {
        Self::new(e)
    }
}

/// The result of a task action
pub type BuildResult<T = ()> = Result<T, BuildException>;

/// Represents any error
#[derive(Debug, thiserror::Error)]
#[error("{}", message)]
pub struct BuildError {
    message: String,
}

impl BuildError {
    /// Create a new, arbitrary build error
    pub fn new(message: impl AsRef<str>) -> Self {
        Self {
            message: message.as_ref().to_string(),
        }
    }
}
