//! Identifiers are used by lazy_evaluation, tasks, and projects.

use crate::lazy_evaluation::{Prop, VecProp};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;

/// The separator between parts of an identifier
pub const ID_SEPARATOR: char = ':';

/// Represents some identifier in an assemble project.
///
/// Acts like a path. Consists for two parts, the `this` part and the `parent`. For example, in
/// `root:inner:task`, the `this` is `task` and the `parent` is `root:inner`.
#[derive(Default, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Id {
    parent: Option<Box<Id>>,
    this: String,
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(parent) = self.parent.as_deref() {
            write!(f, "{}{ID_SEPARATOR}{}", parent, self.this)
        } else {
            write!(f, "{ID_SEPARATOR}{}", self.this)
        }
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl Id {
    /// Create a new id
    ///
    /// # Error
    /// Errors if it isn't a valid identifier.
    ///
    /// # Example
    /// ```
    /// # use assemble_core::identifier::Id;
    /// let id = Id::new("root:inner:task").unwrap();
    /// assert!(Id::new("&task").is_err());
    /// assert!(Id::new("2132").is_err());
    /// assert!(Id::new("gef::as").is_err());
    /// ```
    pub fn new<S: AsRef<str>>(val: S) -> Result<Self, InvalidId> {
        Self::from_iter(val.as_ref().split(ID_SEPARATOR))
    }

    /// Try to create an Id from an iterator of parts. Each part must be a valid **part** of an identifier.
    ///
    /// # Example
    /// ```
    /// # use assemble_core::identifier::Id;
    /// assert!(Id::from_iter(["root", "task"]).is_ok());
    /// assert!(Id::from_iter(["root:inner", "task"]).is_err());
    /// ```
    pub fn from_iter<S: AsRef<str>>(iter: impl IntoIterator<Item = S>) -> Result<Self, InvalidId> {
        let mut iterator = iter.into_iter();
        let start = iterator
            .next()
            .ok_or_else(|| InvalidId::new(""))
            .and_then(|u| Self::new_unit(u.as_ref()))?;

        iterator.try_fold(start, |accum, obj| {
            let next_id = Self::new_unit(obj.as_ref())?;
            Ok(accum.concat(next_id))
        })
    }

    fn new_unit(id: &str) -> Result<Self, InvalidId> {
        is_valid_identifier(id).map(|_| Id {
            parent: None,
            this: id.to_string(),
        })
    }

    /// Joins something that can be turned into an identifier to the end of this Id.
    ///
    /// # Error
    /// Errors if the next is not a valid identifier
    pub fn join<S: AsRef<str>>(&self, next: S) -> Result<Self, InvalidId> {
        Id::new(next).map(|id| self.clone().concat(id))
    }

    /// Concatenate two Id's together
    pub fn concat(self, mut other: Self) -> Self {
        other.insert_as_topmost(self);
        other
    }

    fn insert_as_topmost(&mut self, parent: Self) {
        match &mut self.parent {
            Some(p) => p.insert_as_topmost(parent),
            missing => *missing = Some(Box::new(parent)),
        }
    }

    /// Returns this part of an identifier path.
    pub fn this(&self) -> &str {
        &self.this
    }

    /// Returns the parent identifier of this id, if it exists.
    pub fn parent(&self) -> Option<&Id> {
        self.parent.as_deref()
    }

    /// Gets the ancestors of this id, starting with this id.
    ///
    /// For example, the ancestors of `root:inner:task` would be
    /// - `root:inner:task`
    /// - `root:inner`
    /// - `root`
    pub fn ancestors(&self) -> impl Iterator<Item = &Id> {
        let mut ancestors = VecDeque::new();
        let mut ptr = Some(self);
        while let Some(id) = ptr {
            ancestors.push_back(id);
            ptr = id.parent();
        }
        ancestors.into_iter()
    }

    /// Iterates over the parts of this id, from the top most parent down.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let mut parts = self.ancestors().map(|id| id.this()).collect::<Vec<_>>();
        parts.reverse();
        parts.into_iter()
    }

    /// This id as a relative path, with each part as a path component
    pub fn as_path(&self) -> PathBuf {
        PathBuf::from_iter(self.iter())
    }

    /// Check if the given representation is a shorthand for this id, matching from the end.
    ///
    /// `task` and `project:task` are both shorthands of `:project:task`.
    pub fn is_shorthand(&self, repr: &str) -> bool {
        let mut ancestors = self.ancestors();
        repr.split(ID_SEPARATOR)
            .rev()
            .all(|part| matches!(ancestors.next(), Some(id) if id.this() == part))
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Id::new(id).expect("invalid id")
    }
}

/// How tasks are referenced throughout projects.
///
/// All tasks **must** have an associated TaskId.
#[derive(Default, Eq, PartialEq, Clone, Hash, Serialize, Deserialize)]
pub struct TaskId(Id);

impl TaskId {
    /// Creates a new task id
    pub fn new<S: AsRef<str>>(s: S) -> Result<TaskId, InvalidId> {
        Id::new(s).map(Self)
    }

    /// Creates a new empty property. Does not register said property
    pub fn prop<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Result<Prop<T>, InvalidId> {
        let id = self.join(name)?;
        Ok(Prop::new(id))
    }

    /// Creates a new vec property. Does not register said property
    pub fn vec_prop<T: Clone + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<VecProp<T>, InvalidId> {
        let id = self.join(name)?;
        Ok(VecProp::new(id))
    }
}

impl Debug for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Deref for TaskId {
    type Target = Id;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Id> for TaskId {
    fn from(i: Id) -> Self {
        Self(i)
    }
}

/// How projects are referenced.
#[derive(Default, Eq, PartialEq, Clone, Hash, Serialize, Deserialize)]
pub struct ProjectId(Id);

impl ProjectId {
    /// Creates a new project id
    pub fn new(id: &str) -> Result<Self, InvalidId> {
        Id::new(id).map(Self)
    }

    /// The id used for projects without a usable name
    pub fn root() -> Self {
        Self(Id::from("root"))
    }

    /// Creates the id of a task that belongs to this project
    pub fn task_id(&self, task_name: impl AsRef<str>) -> Result<TaskId, InvalidId> {
        self.join(task_name).map(TaskId)
    }
}

impl Debug for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Deref for ProjectId {
    type Target = Id;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Id> for ProjectId {
    fn from(id: Id) -> Self {
        Self(id)
    }
}

macro_rules! deref_to_id {
    ($ty:ty) => {
        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.deref())
            }
        }

        impl FromStr for $ty {
            type Err = InvalidId;

            /// Parses a fully qualified id, which must start with the separator
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.strip_prefix(ID_SEPARATOR) {
                    Some(rest) => Id::new(rest).map(<$ty>::from),
                    None => Err(InvalidId::new(s)),
                }
            }
        }
    };
}

deref_to_id!(TaskId);
deref_to_id!(ProjectId);

/// The given string is not a valid identifier
#[derive(Debug)]
pub struct InvalidId(pub String);

impl InvalidId {
    /// Create a new invalid id error
    pub fn new(string: impl AsRef<str>) -> Self {
        Self(string.as_ref().to_string())
    }
}

impl Display for InvalidId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid Identifier {:?}", self.0)
    }
}

impl Error for InvalidId {}

/// Checks whether a single part of an identifier is valid
pub fn is_valid_identifier(id: &str) -> Result<(), InvalidId> {
    static VALID_ID_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[a-zA-Z][\w-]*$").expect("Invalid Pattern"));

    if VALID_ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(InvalidId::new(id))
    }
}
