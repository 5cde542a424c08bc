//! The core of assemble. Contains the contracts that plugins and tasks are built against.
//!
//! A [`Project`](Project) owns a [`TaskContainer`](task::task_container::TaskContainer), an
//! [`ExtensionContainer`](plugins::extensions::ExtensionContainer), and the set of applied
//! [`Plugin`s](Plugin). Tasks are configured lazily through [properties](lazy_evaluation), which
//! are frozen once a task starts executing.

#![deny(rustdoc::broken_intra_doc_links)]

#[macro_use]
extern crate static_assertions;
#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

pub mod cryptography;
pub mod error;
pub mod exception;
pub mod file_collection;
pub mod identifier;
pub mod lazy_evaluation;
pub mod logging;
pub mod plugins;
pub mod project;
pub mod task;

pub use exception::{BuildError, BuildException, BuildResult};
pub use plugins::Plugin;
pub use project::Project;
pub use task::{CreateTask, Executable, Task};

/// Commonly used types
pub mod prelude {
    pub use crate::exception::{BuildException, BuildResult};
    pub use crate::identifier::{Id, ProjectId, TaskId};
    pub use crate::lazy_evaluation::{Prop, Provider, ProviderExt, VecProp};
    pub use crate::plugins::extensions::ExtensionAware;
    pub use crate::plugins::{Plugin, PluginAware};
    pub use crate::project::error::{ProjectError, ProjectResult};
    pub use crate::project::Project;
    pub use crate::task::{CreateTask, Executable, Task, TaskHandle};
}
