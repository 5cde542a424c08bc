//! The project, which owns tasks, extensions, and applied plugins.

use crate::error::PayloadError;
use crate::identifier::{is_valid_identifier, ProjectId, TaskId};
use crate::lazy_evaluation::{Prop, Provider};
use crate::plugins::extensions::{ExtensionAware, ExtensionContainer};
use crate::plugins::{Plugin, PluginAware, PluginError, PluginManager};
use crate::task::task_container::{TaskContainer, TypeConfig};
use crate::task::{Executable, Task, TaskHandle};
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod error;

pub use error::{ProjectError, ProjectResult};

/// The name of the directory, within the build directory, that assemble stores its own data in
pub const ASSEMBLE_DIR: &str = ".assemble";

/// The Project contains the tasks, layout information, and other related objects that would help
/// with project building.
///
/// # Example
/// ```
/// # use assemble_core::Project;
/// # let dir = std::env::temp_dir();
/// let project = Project::in_dir_with_id(&dir, "app").unwrap();
/// assert_eq!(project.build_dir(), dir.join("build"));
/// assert_eq!(project.file("libs/a.jar"), dir.join("libs/a.jar"));
/// ```
pub struct Project {
    project_id: ProjectId,
    project_dir: PathBuf,
    build_dir: Prop<PathBuf>,
    task_container: TaskContainer,
    extensions: ExtensionContainer,
    plugins: PluginManager,
}

impl Debug for Project {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Project {:?}", self.project_id)
    }
}

impl Display for Project {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.project_id)
    }
}

impl Project {
    /// Creates an assemble project in a specified directory. The id of the project is the name of
    /// the directory, or `root` if that name is not a valid identifier.
    pub fn in_dir(path: impl AsRef<Path>) -> ProjectResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| is_valid_identifier(name).is_ok())
            .unwrap_or("root")
            .to_string();
        Self::in_dir_with_id(path, name)
    }

    /// Creates an assemble project in a specified directory with a given id.
    pub fn in_dir_with_id(path: impl AsRef<Path>, id: impl AsRef<str>) -> ProjectResult<Self> {
        let project_dir = absolute(path.as_ref())?;
        let project_id = ProjectId::new(id.as_ref())?;
        let mut build_dir = Prop::new(project_id.join("buildDir")?);
        build_dir.set(project_dir.join("build"))?;
        debug!("created project {} in {:?}", project_id, project_dir);
        Ok(Self {
            project_id,
            project_dir,
            build_dir,
            task_container: TaskContainer::new(),
            extensions: ExtensionContainer::default(),
            plugins: PluginManager::new(),
        })
    }

    /// The id of the project
    pub fn id(&self) -> &ProjectId {
        &self.project_id
    }

    /// The directory of the project
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// The build directory of the project. Defaults to `build` within the project directory
    pub fn build_dir(&self) -> PathBuf {
        self.build_dir.get()
    }

    /// Sets the build directory. Relative paths are resolved against the project directory.
    pub fn set_build_dir(&mut self, dir: impl AsRef<Path>) -> ProjectResult {
        let dir = self.file(dir);
        self.build_dir.set(dir)?;
        Ok(())
    }

    /// Where task execution history is stored
    pub fn task_history_dir(&self) -> PathBuf {
        self.build_dir().join(ASSEMBLE_DIR).join("task-history")
    }

    /// Resolves a path against the project directory. Absolute paths are returned unchanged.
    pub fn file(&self, path: impl AsRef<Path>) -> PathBuf {
        self.project_dir.join(path)
    }

    /// Get access to the task container
    pub fn task_container(&self) -> &TaskContainer {
        &self.task_container
    }

    /// Get access to the task container
    pub fn task_container_mut(&mut self) -> &mut TaskContainer {
        &mut self.task_container
    }

    /// Registers a task in this project
    pub fn register_task<T: Task>(&mut self, name: &str) -> ProjectResult<TaskHandle<T>> {
        let id = self.project_id.task_id(name)?;
        self.task_container.register_task(id)
    }

    /// Configures every task of type `T`, both already registered and registered in the future.
    ///
    /// Tasks that haven't been created yet get the configuration queued. Tasks that were already
    /// configured are configured right away.
    pub fn with_type<T, F>(&mut self, config: F) -> ProjectResult
    where
        T: Task,
        F: Fn(&mut Executable<T>, &Project) -> ProjectResult + Send + Sync + 'static,
    {
        let config: Arc<TypeConfig<T>> = Arc::new(config);
        for handle in self.task_container.tasks_of_type::<T>() {
            handle.configure_each(self, config.clone())?;
        }
        self.task_container.add_type_rule(config);
        Ok(())
    }

    /// Finds the id of a task from a fully qualified id or a shorthand of one
    pub fn find_task_id(&self, repr: &str) -> ProjectResult<TaskId> {
        if let Ok(id) = repr.parse::<TaskId>() {
            if self.task_container.task_ids().any(|existing| existing == &id) {
                return Ok(id);
            }
        }
        let mut found = self
            .task_container
            .task_ids()
            .filter(|id| id.is_shorthand(repr))
            .cloned()
            .collect::<Vec<_>>();
        match found.len() {
            0 => Err(ProjectError::NoIdentifiersFound(repr.to_string()).into()),
            1 => Ok(found.remove(0)),
            _ => Err(ProjectError::TooManyIdentifiersFound(found, repr.to_string()).into()),
        }
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

impl PluginAware for Project {
    fn plugin_manager(&self) -> &PluginManager {
        &self.plugins
    }

    fn apply_plugin<P: Plugin>(&mut self) -> ProjectResult {
        if !self.plugins.mark_applied::<P>() {
            trace!("plugin {} already applied", P::plugin_id());
            return Ok(());
        }
        debug!("applying plugin {} to {}", P::plugin_id(), self.project_id);
        P::default().apply(self).map_err(|e| {
            let error = PluginError::ApplyFailed(P::plugin_id().to_string(), e.kind().to_string());
            PayloadError::<ProjectError>::with_backtrace(error.into(), e.backtrace().clone())
        })?;
        for callback in self.plugins.take_pending::<P>() {
            callback(self)?;
        }
        Ok(())
    }

    fn with_plugin<P, F>(&mut self, action: F) -> ProjectResult
    where
        P: Plugin,
        F: FnOnce(&mut Project) -> ProjectResult + Send + 'static,
    {
        if self.has_plugin::<P>() {
            action(self)
        } else {
            self.plugins.queue::<P>(Box::new(action));
            Ok(())
        }
    }
}

impl ExtensionAware for Project {
    fn extensions(&self) -> &ExtensionContainer {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut ExtensionContainer {
        &mut self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        let project = Project::in_dir(&app).unwrap();
        assert_eq!(project.id().to_string(), ":app");

        let invalid = Project::in_dir(dir.path().join("1-invalid")).unwrap();
        assert_eq!(invalid.id(), &ProjectId::root());
    }

    #[test]
    fn build_dir_is_relative_to_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir(dir.path()).unwrap();
        assert_eq!(project.build_dir(), dir.path().join("build"));
        project.set_build_dir("out").unwrap();
        assert_eq!(project.build_dir(), dir.path().join("out"));
        assert_eq!(
            project.task_history_dir(),
            dir.path().join("out").join(".assemble").join("task-history")
        );
    }

    #[test]
    fn absolute_files_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::in_dir(dir.path()).unwrap();
        let other = tempfile::tempdir().unwrap();
        assert_eq!(project.file(other.path()), other.path());
    }
}
