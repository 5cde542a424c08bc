//! The project error type. Returned while configuring a project and its tasks.

use crate::error::PayloadError;
use crate::identifier::{InvalidId, TaskId};
use crate::lazy_evaluation;
use crate::lazy_evaluation::ProviderError;
use crate::plugins::extensions::ExtensionError;
use crate::plugins::PluginError;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::sync::PoisonError;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("No task identifier could be found for {0:?}")]
    NoIdentifiersFound(String),
    #[error("Too many task identifiers found for {1}. Found {0:?}")]
    TooManyIdentifiersFound(Vec<TaskId>, String),
    #[error("Task {0} is already registered")]
    TaskAlreadyRegistered(TaskId),
    #[error("Task {0} was already configured and can no longer be configured lazily")]
    TaskAlreadyConfigured(TaskId),
    #[error("Task {0} is not of type {1}")]
    WrongTaskType(TaskId, &'static str),
    #[error("Input {input:?} of task {task} is missing file {path:?}")]
    MissingInputFile {
        task: TaskId,
        input: String,
        path: PathBuf,
    },
    #[error("Input {input:?} of task {task} is not an executable file: {path:?}")]
    InputFileNotExecutable {
        task: TaskId,
        input: String,
        path: PathBuf,
    },
    #[error("Input {0:?} is already declared")]
    DuplicateInput(String),
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidId),
    #[error(transparent)]
    PluginError(#[from] PluginError),
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error(transparent)]
    PropertyError(#[from] lazy_evaluation::Error),
    #[error(transparent)]
    ProviderError(#[from] ProviderError),
    #[error(transparent)]
    ExtensionError(#[from] ExtensionError),
    #[error("RwLock poisoned")]
    PoisonError,
    #[error("{0}")]
    CustomError(String),
}

impl<G> From<PoisonError<G>> for ProjectError {
    fn from(_: PoisonError<G>) -> Self {
        Self::PoisonError
    }
}

impl ProjectError {
    /// Creates an error from any displayable value
    pub fn custom<E: Display>(error: E) -> Self {
        Self::CustomError(error.to_string())
    }
}

/// Implements `From<$from>` for a payloaded `$ty`, capturing a backtrace on conversion
#[macro_export]
macro_rules! payload_from {
    ($from:ty, $ty:ty) => {
        impl From<$from> for $crate::error::PayloadError<$ty>
        where
            $from: Into<$ty>,
        {
            fn from(e: $from) -> Self {
                let err: $ty = e.into();
                $crate::error::PayloadError::new(err)
            }
        }
    };
}

payload_from!(ProjectError, ProjectError);
payload_from!(InvalidId, ProjectError);
payload_from!(PluginError, ProjectError);
payload_from!(io::Error, ProjectError);
payload_from!(lazy_evaluation::Error, ProjectError);
payload_from!(ProviderError, ProjectError);
payload_from!(ExtensionError, ProjectError);

impl<G> From<PoisonError<G>> for PayloadError<ProjectError> {
    fn from(e: PoisonError<G>) -> Self {
        PayloadError::new(ProjectError::from(e))
    }
}

pub type Result<T> = std::result::Result<T, PayloadError<ProjectError>>;
pub type ProjectResult<T = ()> = Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Id;

    #[test]
    fn property_errors_convert_with_backtrace() {
        fn fails() -> ProjectResult<String> {
            let prop = lazy_evaluation::Prop::<String>::new(Id::from("missing"));
            Ok(prop.finalize_and_get()?)
        }

        let error = fails().unwrap_err();
        assert!(matches!(error.kind(), ProjectError::PropertyError(_)));
        assert!(error.to_string().contains(":missing"));
    }
}
