//! The task container

use super::{Executable, Task, TaskOutcome};
use crate::error::PayloadError;
use crate::exception::{BuildException, BuildResult};
use crate::identifier::TaskId;
use crate::project::error::{ProjectError, ProjectResult};
use crate::Project;
use indexmap::IndexMap;
use std::any::{type_name, Any};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

type ConfigureTask<T> =
    Box<dyn FnOnce(&mut Executable<T>, &Project) -> ProjectResult + Send + Sync>;

struct LazyTask<T: Task> {
    configurations: Vec<ConfigureTask<T>>,
}

enum TaskHandleInner<T: Task> {
    Lazy(LazyTask<T>),
    Resolving,
    Configured(Executable<T>),
}

/// A handle to a task that may not have been created yet.
///
/// Configurations added through the handle are applied, in order, only once the task is first
/// needed.
pub struct TaskHandle<T: Task> {
    id: TaskId,
    inner: Arc<RwLock<TaskHandleInner<T>>>,
}

impl<T: Task> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T: Task> Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaskHandle<{}>({})", type_name::<T>(), self.id)
    }
}

impl<T: Task> TaskHandle<T> {
    fn new(id: TaskId) -> Self {
        Self {
            id,
            inner: Arc::new(RwLock::new(TaskHandleInner::Lazy(LazyTask {
                configurations: vec![],
            }))),
        }
    }

    /// The id of the task
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    fn write_inner(&self) -> ProjectResult<RwLockWriteGuard<TaskHandleInner<T>>> {
        Ok(self.inner.write()?)
    }

    /// Adds a configuration to the task. Fails if the task was already configured.
    pub fn configure_with<F>(&self, config: F) -> ProjectResult
    where
        F: FnOnce(&mut Executable<T>, &Project) -> ProjectResult + Send + Sync + 'static,
    {
        match &mut *self.write_inner()? {
            TaskHandleInner::Lazy(lazy) => {
                lazy.configurations.push(Box::new(config));
                Ok(())
            }
            _ => Err(ProjectError::TaskAlreadyConfigured(self.id.clone()).into()),
        }
    }

    /// Adds a configure-each rule to the task. If the task was already configured, the rule is
    /// applied to it immediately.
    pub(crate) fn configure_each(
        &self,
        project: &Project,
        config: Arc<TypeConfig<T>>,
    ) -> ProjectResult {
        match &mut *self.write_inner()? {
            TaskHandleInner::Lazy(lazy) => {
                lazy.configurations
                    .push(Box::new(move |task, project| (*config)(task, project)));
                Ok(())
            }
            TaskHandleInner::Configured(executable) => (*config)(executable, project),
            TaskHandleInner::Resolving => {
                Err(ProjectError::TaskAlreadyConfigured(self.id.clone()).into())
            }
        }
    }

    /// Whether the task has been created and configured
    pub fn is_configured(&self) -> bool {
        self.inner
            .read()
            .map(|inner| matches!(&*inner, TaskHandleInner::Configured(_)))
            .unwrap_or(false)
    }

    /// Creates and configures the task, if it hasn't been already
    pub fn resolve(&self, project: &Project) -> ProjectResult {
        let mut guard = self.write_inner()?;
        let lazy = match std::mem::replace(&mut *guard, TaskHandleInner::Resolving) {
            TaskHandleInner::Lazy(lazy) => lazy,
            TaskHandleInner::Resolving => {
                return Err(ProjectError::custom(format!(
                    "task {} failed to be configured",
                    self.id
                ))
                .into())
            }
            configured => {
                *guard = configured;
                return Ok(());
            }
        };

        debug!("configuring task {}", self.id);
        let task = T::new(&self.id, project)?;
        let mut executable = Executable::new(project, task, self.id.clone());
        for configuration in lazy.configurations {
            configuration(&mut executable, project)?;
        }
        T::configure_io(&mut executable, project)?;
        *guard = TaskHandleInner::Configured(executable);
        Ok(())
    }

    /// Resolves the task, then runs a function with it
    pub fn configured<R, F>(&self, project: &Project, func: F) -> ProjectResult<R>
    where
        F: FnOnce(&mut Executable<T>) -> R,
    {
        self.resolve(project)?;
        match &mut *self.write_inner()? {
            TaskHandleInner::Configured(executable) => Ok(func(executable)),
            _ => Err(ProjectError::custom(format!("task {} is not configured", self.id)).into()),
        }
    }

    /// Resolves the task, then runs it
    pub fn execute(&self, project: &Project, rerun: bool) -> BuildResult<TaskOutcome> {
        self.resolve(project)?;
        let mut guard = self.write_inner()?;
        match &mut *guard {
            TaskHandleInner::Configured(executable) => executable.execute(project, rerun),
            _ => Err(BuildException::from(PayloadError::<ProjectError>::new(
                ProjectError::custom(format!("task {} is not configured", self.id)),
            ))),
        }
    }
}

/// Type erased access to a task handle
pub trait ResolveTask: Send + Sync {
    /// The id of the task
    fn task_id(&self) -> &TaskId;

    /// The name of the type of the task
    fn task_type(&self) -> &'static str;

    /// The handle, as any
    fn as_any(&self) -> &dyn Any;

    /// Creates and configures the task
    fn resolve(&self, project: &Project) -> ProjectResult;

    /// Resolves the task, then runs it
    fn execute(&self, project: &Project, rerun: bool) -> BuildResult<TaskOutcome>;
}

assert_obj_safe!(ResolveTask);

impl<T: Task> ResolveTask for TaskHandle<T> {
    fn task_id(&self) -> &TaskId {
        &self.id
    }

    fn task_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn resolve(&self, project: &Project) -> ProjectResult {
        TaskHandle::resolve(self, project)
    }

    fn execute(&self, project: &Project, rerun: bool) -> BuildResult<TaskOutcome> {
        TaskHandle::execute(self, project, rerun)
    }
}

/// A handle to a task of any type
#[derive(Clone)]
pub struct AnyTaskHandle {
    inner: Arc<dyn ResolveTask>,
}

impl Debug for AnyTaskHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaskHandle<{}>({})", self.task_type(), self.task_id())
    }
}

impl AnyTaskHandle {
    fn new<T: Task>(handle: TaskHandle<T>) -> Self {
        Self {
            inner: Arc::new(handle),
        }
    }

    /// Gets the typed handle, if the task is of type `T`
    pub fn as_type<T: Task>(&self) -> Option<TaskHandle<T>> {
        self.inner.as_any().downcast_ref::<TaskHandle<T>>().cloned()
    }

    /// Checks whether the task is of type `T`
    pub fn is<T: Task>(&self) -> bool {
        self.inner.as_any().is::<TaskHandle<T>>()
    }
}

impl std::ops::Deref for AnyTaskHandle {
    type Target = dyn ResolveTask;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

type TypeRule = Box<dyn Fn(&AnyTaskHandle) -> ProjectResult + Send + Sync>;
pub(crate) type TypeConfig<T> = dyn Fn(&mut Executable<T>, &Project) -> ProjectResult + Send + Sync;

/// Contains the tasks of a project, in registration order.
#[derive(Default)]
pub struct TaskContainer {
    tasks: IndexMap<TaskId, AnyTaskHandle>,
    rules: Vec<TypeRule>,
}

impl Debug for TaskContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tasks.values()).finish()
    }
}

impl TaskContainer {
    /// Creates an empty task container
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task without creating it. Every configure-each rule for the type of the task
    /// is added to the new task.
    pub fn register_task<T: Task>(&mut self, id: TaskId) -> ProjectResult<TaskHandle<T>> {
        if self.tasks.contains_key(&id) {
            return Err(ProjectError::TaskAlreadyRegistered(id).into());
        }
        let handle = TaskHandle::<T>::new(id.clone());
        let any = AnyTaskHandle::new(handle.clone());
        for rule in &self.rules {
            rule(&any)?;
        }
        debug!("registered task {} of type {}", id, type_name::<T>());
        self.tasks.insert(id, any);
        Ok(handle)
    }

    /// Every registered task of type `T`
    pub fn tasks_of_type<T: Task>(&self) -> Vec<TaskHandle<T>> {
        self.tasks
            .values()
            .filter_map(|handle| handle.as_type::<T>())
            .collect()
    }

    /// Adds a configuration to every task of type `T` registered from now on.
    pub(crate) fn add_type_rule<T: Task>(&mut self, config: Arc<TypeConfig<T>>) {
        let rule: TypeRule = Box::new(move |handle: &AnyTaskHandle| {
            if let Some(typed) = handle.as_type::<T>() {
                let config = config.clone();
                typed.configure_with(move |task, project| (*config)(task, project))?;
            }
            Ok(())
        });
        self.rules.push(rule);
    }

    /// Gets a task by its id
    pub fn get_task(&self, id: &TaskId) -> ProjectResult<AnyTaskHandle> {
        self.tasks
            .get(id)
            .cloned()
            .ok_or_else(|| ProjectError::NoIdentifiersFound(id.to_string()).into())
    }

    /// Gets a task by its id, checking its type
    pub fn get_typed<T: Task>(&self, id: &TaskId) -> ProjectResult<TaskHandle<T>> {
        self.get_task(id)?
            .as_type::<T>()
            .ok_or_else(|| ProjectError::WrongTaskType(id.clone(), type_name::<T>()).into())
    }

    /// The ids of every registered task, in registration order
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.tasks.keys()
    }

    /// The number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
