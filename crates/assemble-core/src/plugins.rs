//! Provide a "unified" way of adding plugins to an assemble project

use crate::project::error::ProjectResult;
use crate::project::Project;
use std::any::type_name;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};

pub mod extensions;

/// A plugin to apply to the project. All plugins must implement default.
pub trait Plugin: Default {
    /// Applies this plugin to a project
    fn apply(&self, project: &mut Project) -> ProjectResult;

    /// The id of the plugin. A plugin of a certain id can only be applied once
    fn plugin_id() -> &'static str {
        type_name::<Self>()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Plugin {0} failed to apply: {1}")]
    ApplyFailed(String, String),
}

type PluginCallback = Box<dyn FnOnce(&mut Project) -> ProjectResult + Send>;

/// Tracks which plugins have been applied to a project, and the actions waiting for a plugin to
/// be applied.
#[derive(Default)]
pub struct PluginManager {
    applied: HashSet<&'static str>,
    pending: HashMap<&'static str, Vec<PluginCallback>>,
}

impl Debug for PluginManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("applied", &self.applied)
            .finish_non_exhaustive()
    }
}

impl PluginManager {
    /// Creates a new plugin manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether a plugin has been applied
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.applied.contains(P::plugin_id())
    }

    /// Marks the plugin as applied. Returns false if it already was.
    pub(crate) fn mark_applied<P: Plugin>(&mut self) -> bool {
        self.applied.insert(P::plugin_id())
    }

    /// Queues an action to run once the plugin is applied
    pub(crate) fn queue<P: Plugin>(&mut self, callback: PluginCallback) {
        self.pending
            .entry(P::plugin_id())
            .or_default()
            .push(callback);
    }

    /// Takes every action waiting on the plugin
    pub(crate) fn take_pending<P: Plugin>(&mut self) -> Vec<PluginCallback> {
        self.pending.remove(P::plugin_id()).unwrap_or_default()
    }
}

/// Objects that plugins can be applied to
pub trait PluginAware {
    /// Gets the plugin manager
    fn plugin_manager(&self) -> &PluginManager;

    /// Applies a plugin. Applying an already applied plugin does nothing.
    fn apply_plugin<P: Plugin>(&mut self) -> ProjectResult;

    /// Runs an action when a plugin is applied. If the plugin is already applied, the action is
    /// run immediately.
    fn with_plugin<P, F>(&mut self, action: F) -> ProjectResult
    where
        P: Plugin,
        F: FnOnce(&mut Project) -> ProjectResult + Send + 'static;

    /// Checks whether a plugin has been applied
    fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_manager().has_plugin::<P>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::extensions::ExtensionAware;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static APPLIED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct CountingPlugin;

    impl Plugin for CountingPlugin {
        fn apply(&self, project: &mut Project) -> ProjectResult {
            APPLIED.fetch_add(1, Ordering::SeqCst);
            project.extensions_mut().add("counting", 0_usize)?;
            Ok(())
        }
    }

    #[test]
    fn plugins_apply_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir(dir.path()).unwrap();
        assert!(!project.has_plugin::<CountingPlugin>());
        project.apply_plugin::<CountingPlugin>().unwrap();
        project.apply_plugin::<CountingPlugin>().unwrap();
        assert!(project.has_plugin::<CountingPlugin>());
        assert_eq!(APPLIED.load(Ordering::SeqCst), 1);
    }

    #[derive(Default)]
    struct Marker;

    impl Plugin for Marker {
        fn apply(&self, _project: &mut Project) -> ProjectResult {
            Ok(())
        }
    }

    #[test]
    fn with_plugin_runs_when_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir(dir.path()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let before = calls.clone();
        project
            .with_plugin::<Marker, _>(move |_| {
                before.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0, "plugin not applied yet");

        project.apply_plugin::<Marker>().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let after = calls.clone();
        project
            .with_plugin::<Marker, _>(move |_| {
                after.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2, "runs immediately once applied");
    }
}
