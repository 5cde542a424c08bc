//! # The Assemble Standard Library
//!
//! Contains extra stuff for assemble that doesn't need to be in the core crate, such as running
//! external programs and file system operations.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

#[macro_use]
extern crate log;

pub mod extensions;
pub mod specs;

pub use crate::extensions::project_extensions::{ProjectExec, ProjectFs};
pub use crate::specs::delete_spec::WorkResult;
pub use crate::specs::exec_spec::{ExecError, ExecResult, ExecSpec, ExecSpecBuilder};

mod private {
    use assemble_core::Project;

    /// Trait can only be implemented in the assemble std library for the Project type.
    pub trait ProjectSealed {}

    impl ProjectSealed for Project {}
}
