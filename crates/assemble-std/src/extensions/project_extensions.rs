//! Extensions to the [`Project`](assemble_core::Project)

use crate::private::ProjectSealed;
use crate::specs::delete_spec::{delete, WorkResult};
use crate::specs::exec_spec::{ExecResult, ExecSpec, ExecSpecBuilder};
use assemble_core::prelude::ProjectResult;
use assemble_core::Project;
use std::path::Path;

/// Adds [`ExecSpec`](crate::specs::exec_spec::ExecSpec) related methods to projects.
pub trait ProjectExec: ProjectSealed {
    /// Configure an [`ExecSpec`](crate::specs::exec_spec::ExecSpecBuilder), then execute it and
    /// wait for it to finish. Relative working directories are resolved against the project
    /// directory.
    ///
    /// # Example
    /// ```
    /// # use assemble_core::Project;
    /// use assemble_std::ProjectExec;
    ///
    /// # let project = Project::in_dir_with_id(std::env::temp_dir(), "app").unwrap();
    /// # if cfg!(unix) {
    /// let result = project.exec_with(|exec| {
    ///     exec.exec("echo").args(&["Hello", "World"]);
    /// }).unwrap();
    /// assert!(result.success());
    /// # }
    /// ```
    fn exec_with<F>(&self, config: F) -> ProjectResult<ExecResult>
    where
        F: FnOnce(&mut ExecSpecBuilder);

    /// Execute an [ExecSpec](ExecSpec) without modifying it.
    fn exec_spec(&self, exec_spec: ExecSpec) -> ProjectResult<ExecResult>;
}

impl ProjectExec for Project {
    fn exec_with<F>(&self, config: F) -> ProjectResult<ExecResult>
    where
        F: FnOnce(&mut ExecSpecBuilder),
    {
        let mut builder = ExecSpecBuilder::new();
        config(&mut builder);
        let exec_spec = builder.build()?;
        self.exec_spec(exec_spec)
    }

    fn exec_spec(&self, exec_spec: ExecSpec) -> ProjectResult<ExecResult> {
        exec_spec.execute_spec(self.project_dir())?.wait()
    }
}

/// Adds file system operations to projects.
pub trait ProjectFs: ProjectSealed {
    /// Deletes a file or directory, recursively. Relative paths are resolved against the project
    /// directory.
    fn delete<P: AsRef<Path>>(&self, path: P) -> ProjectResult<WorkResult>;
}

impl ProjectFs for Project {
    fn delete<P: AsRef<Path>>(&self, path: P) -> ProjectResult<WorkResult> {
        Ok(delete(&self.file(path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn delete_relative_to_project() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::in_dir_with_id(dir.path(), "app").unwrap();
        fs::create_dir_all(dir.path().join("build/out")).unwrap();

        assert!(project.delete("build/out").unwrap().did_work());
        assert!(!dir.path().join("build/out").exists());
        assert!(!project.delete("build/out").unwrap().did_work());
    }

    #[cfg(unix)]
    #[test]
    fn exec_runs_in_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::in_dir_with_id(dir.path(), "app").unwrap();
        let result = project
            .exec_with(|exec| {
                exec.exec("pwd");
            })
            .unwrap();
        let output = result.utf8_string().unwrap().unwrap();
        assert_eq!(
            fs::canonicalize(output.trim()).unwrap(),
            fs::canonicalize(dir.path()).unwrap()
        );
    }
}
