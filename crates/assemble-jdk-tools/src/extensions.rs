//! Contains java related extensions

use crate::toolchain::JavaToolchainSpec;

use assemble_core::lazy_evaluation::Prop;

/// The java plugin extension
#[derive(Debug)]
pub struct JavaPluginExtension {
    /// The toolchain used by the java tasks of a project
    pub toolchain: Prop<JavaToolchainSpec>,
}

impl Default for JavaPluginExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaPluginExtension {
    /// Creates a new instance of a java extension. Without any configuration, the toolchain
    /// accepts any installation.
    pub fn new() -> Self {
        Self {
            toolchain: Prop::with_value(JavaToolchainSpec::default()),
        }
    }
}
