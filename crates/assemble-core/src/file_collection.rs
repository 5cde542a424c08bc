//! Defines file collections and the FileCollection trait

use std::env::{join_paths, JoinPathsError};
use std::ffi::OsString;
use std::fmt::{Debug, Formatter};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::lazy_evaluation::anonymous::AnonymousProvider;
use crate::lazy_evaluation::{IntoProvider, Provider};

/// A collection of files.
pub trait FileCollection: Send + Sync {
    /// The top level paths of this collection, in the order they were added. Duplicates are
    /// removed, keeping the first occurrence.
    fn roots(&self) -> Vec<PathBuf>;

    /// Gets whether this file collection contains any paths
    fn is_empty(&self) -> bool {
        self.roots().is_empty()
    }

    /// Joins the roots of this collection like a `PATH` variable, using the platform separator
    fn as_path(&self) -> Result<OsString, JoinPathsError> {
        join_paths(self.roots())
    }
}

assert_obj_safe!(FileCollection);

#[derive(Clone)]
enum Component {
    Path(PathBuf),
    Provided(AnonymousProvider<Vec<PathBuf>>),
}

impl Debug for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Path(p) => write!(f, "{:?}", p),
            Component::Provided(_) => write!(f, "<provided>"),
        }
    }
}

/// An ordered set of paths. Paths can be added directly or from a provider, in which case they
/// are only resolved when the set is read.
#[derive(Clone, Default)]
pub struct FileSet {
    components: Vec<Component>,
}

impl FileSet {
    /// Creates an empty file set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a file set containing a single path
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        let mut output = Self::new();
        output.add(path);
        output
    }

    /// Adds a path to this file set
    pub fn add(&mut self, path: impl AsRef<Path>) {
        self.components
            .push(Component::Path(path.as_ref().to_path_buf()));
    }

    /// Adds the paths of a provider to this file set. Provider without a value contribute
    /// nothing.
    pub fn add_provider<P>(&mut self, provider: P)
    where
        P: IntoProvider<Vec<PathBuf>>,
        P::Provider: 'static,
    {
        self.components
            .push(Component::Provided(AnonymousProvider::new(provider)));
    }

    /// Removes every path from this file set
    pub fn clear(&mut self) {
        self.components.clear();
    }
}

impl FileCollection for FileSet {
    fn roots(&self) -> Vec<PathBuf> {
        self.components
            .iter()
            .flat_map(|component| match component {
                Component::Path(path) => vec![path.clone()],
                Component::Provided(provider) => provider.try_get().unwrap_or_default(),
            })
            .unique()
            .collect()
    }
}

impl Debug for FileSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(&self.components).finish()
    }
}

impl AddAssign for FileSet {
    fn add_assign(&mut self, rhs: Self) {
        self.components.extend(rhs.components);
    }
}

impl<P: AsRef<Path>> FromIterator<P> for FileSet {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        let mut output = FileSet::new();
        for path in iter {
            output.add(path);
        }
        output
    }
}

impl<P: AsRef<Path>> Extend<P> for FileSet {
    fn extend<T: IntoIterator<Item = P>>(&mut self, iter: T) {
        for path in iter {
            self.add(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy_evaluation::Prop;

    #[test]
    fn roots_keep_insertion_order_without_duplicates() {
        let set = ["b", "a", "b", "c"].into_iter().collect::<FileSet>();
        assert_eq!(
            set.roots(),
            vec![PathBuf::from("b"), PathBuf::from("a"), PathBuf::from("c")]
        );
    }

    #[test]
    fn provided_paths_are_lazy() {
        let mut prop = Prop::<Vec<PathBuf>>::with_name("mods");
        let mut set = FileSet::with_path("first");
        set.add_provider(prop.clone());
        assert_eq!(set.roots(), vec![PathBuf::from("first")]);
        prop.set(vec![PathBuf::from("second")]).unwrap();
        assert_eq!(
            set.roots(),
            vec![PathBuf::from("first"), PathBuf::from("second")]
        );
    }

    #[test]
    fn as_path_joins_roots() {
        let set = FileSet::from_iter(["a", "b"]);
        let joined = set.as_path().unwrap();
        let split = std::env::split_paths(&joined).collect::<Vec<_>>();
        assert_eq!(split, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert!(FileSet::new().is_empty());
    }
}
