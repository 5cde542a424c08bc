#![deny(missing_docs)]

//! Provides tasks for running the `jlink` and `jpackage` tools of a JDK in assemble projects.
//!
//! Applying the [`JdkToolsPlugin`](plugin::JdkToolsPlugin) doesn't register any tasks. Instead,
//! every [`JLink`](tasks::jlink::JLink) and [`JPackage`](tasks::jpackage::JPackage) task gets
//! the matching executable of the project's java toolchain as its default executable.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub mod executable_path;
pub mod extensions;
pub mod plugin;
pub mod tasks;
pub mod toolchain;

mod internal;

pub use plugin::{JavaBasePlugin, JdkToolsPlugin};
pub use tasks::jlink::JLink;
pub use tasks::jpackage::JPackage;

mod prelude {
    pub use assemble_core::prelude::*;
    pub use assemble_std::*;
}
