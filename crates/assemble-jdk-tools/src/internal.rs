use crate::prelude::*;
use assemble_core::file_collection::{FileCollection, FileSet};
use std::env::JoinPathsError;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Builds the command line of a jdk tool
#[derive(Debug, Default)]
pub(crate) struct ToolArgs {
    args: Vec<OsString>,
}

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    fn push<S: AsRef<OsStr>>(&mut self, arg: S) {
        self.args.push(arg.as_ref().to_os_string());
    }

    /// `-p <paths>`, only if there are any paths
    pub fn module_path<F: FileCollection>(&mut self, paths: &F) -> Result<(), JoinPathsError> {
        if !paths.is_empty() {
            self.push("-p");
            self.push(paths.as_path()?);
        }
        Ok(())
    }

    /// `--add-modules <modules>`, only if there are any modules
    pub fn add_modules(&mut self, modules: &[String]) {
        if !modules.is_empty() {
            self.push("--add-modules");
            self.push(modules.join(","));
        }
    }

    pub fn flag(&mut self, flag: &str, enabled: bool) {
        if enabled {
            self.push(flag);
        }
    }

    pub fn extra(&mut self, args: &[String]) {
        for arg in args {
            self.push(arg);
        }
    }

    /// `--output <dir>`
    pub fn output(&mut self, dir: &Path) {
        self.push("--output");
        self.push(dir);
    }

    pub fn into_vec(self) -> Vec<OsString> {
        self.args
    }
}

/// The module path of a task, with every root made absolute against the project directory.
/// Roots that point at the same path once absolute only appear once.
pub(crate) fn absolute_module_path(project_dir: &Path, module_path: &FileSet) -> FileSet {
    module_path
        .roots()
        .into_iter()
        .map(|path| project_dir.join(path))
        .collect()
}

/// A path property, resolved against the project directory
pub(crate) fn resolved(project_dir: &Path, prop: &Prop<PathBuf>) -> impl Provider<PathBuf> {
    let project_dir = project_dir.to_path_buf();
    prop.clone().map(move |path| project_dir.join(path))
}

/// Deletes whatever is at the destination of a tool. Returns whether anything was deleted.
pub(crate) fn clean_destination(project: &Project, destination: &Path) -> BuildResult<bool> {
    Ok(project.delete(destination)?.did_work())
}

/// Runs a jdk tool, failing if it doesn't exit successfully
pub(crate) fn run_tool(
    project: &Project,
    tool: &str,
    executable: &Path,
    args: Vec<OsString>,
) -> BuildResult {
    info!(
        "Running {} executable '{}' with arguments: {}",
        tool,
        executable.display(),
        args.iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    project
        .exec_with(|exec| {
            exec.exec(executable).args(&args);
        })?
        .expect_success()?;
    Ok(())
}
