//! Extensions that plugins can add

use std::any::Any;
use std::fmt::{Debug, Formatter};

use indexmap::IndexMap;
use thiserror::Error;

/// A helper trait that extends the needed traits to add a value as an extension
pub trait Extension: 'static + Send + Sync {}

impl<E: 'static + Send + Sync> Extension for E {}

/// A type that contains extensions
pub trait ExtensionAware {
    /// Gets the extension container
    fn extensions(&self) -> &ExtensionContainer;
    /// Gets a mutable reference to the extension container
    fn extensions_mut(&mut self) -> &mut ExtensionContainer;

    /// Gets the only extension registered with a given type
    fn extension<E: Extension>(&self) -> Result<&E, ExtensionError> {
        self.extensions().get_by_type()
    }

    /// Gets the only extension registered with a given type, mutably
    fn extension_mut<E: Extension>(&mut self) -> Result<&mut E, ExtensionError> {
        self.extensions_mut().get_by_type_mut()
    }
}

type AnyExtension = Box<dyn Any + Send + Sync>;

/// Contains extensions, by name
#[derive(Default)]
pub struct ExtensionContainer {
    ob_map: IndexMap<String, AnyExtension>,
}

impl ExtensionContainer {
    /// Adds a new extension to this container
    ///
    /// # Error
    /// Will return an error if `name` is already registered to this container
    pub fn add<E: Extension, S: AsRef<str>>(
        &mut self,
        name: S,
        value: E,
    ) -> Result<(), ExtensionError> {
        let name = name.as_ref();
        if self.ob_map.contains_key(name) {
            return Err(ExtensionError::AlreadyRegistered(name.to_string()));
        }
        trace!("adding extension {:?}", name);
        self.ob_map.insert(name.to_string(), Box::new(value));
        Ok(())
    }

    /// Whether an extension with this name exists
    pub fn contains<S: AsRef<str>>(&self, name: S) -> bool {
        self.ob_map.contains_key(name.as_ref())
    }

    /// Gets a reference to an extension by name, if it exists and has the given type
    pub fn get<E: Extension, S: AsRef<str>>(&self, name: S) -> Option<&E> {
        self.ob_map
            .get(name.as_ref())
            .and_then(|ext| ext.downcast_ref())
    }

    /// Gets a mutable reference to an extension by name, if it exists and has the given type
    pub fn get_mut<E: Extension, S: AsRef<str>>(&mut self, name: S) -> Option<&mut E> {
        self.ob_map
            .get_mut(name.as_ref())
            .and_then(|ext| ext.downcast_mut())
    }

    fn name_of_type<E: Extension>(&self) -> Result<String, ExtensionError> {
        let mut names = self
            .ob_map
            .iter()
            .filter(|(_, ext)| ext.is::<E>())
            .map(|(name, _)| name.clone());
        match (names.next(), names.next()) {
            (Some(name), None) => Ok(name),
            (None, _) => Err(ExtensionError::NotFound(std::any::type_name::<E>())),
            (Some(_), Some(_)) => Err(ExtensionError::Ambiguous(std::any::type_name::<E>())),
        }
    }

    /// Gets the only extension with the given type
    pub fn get_by_type<E: Extension>(&self) -> Result<&E, ExtensionError> {
        let name = self.name_of_type::<E>()?;
        self.get(name)
            .ok_or(ExtensionError::NotFound(std::any::type_name::<E>()))
    }

    /// Gets the only extension with the given type, mutably
    pub fn get_by_type_mut<E: Extension>(&mut self) -> Result<&mut E, ExtensionError> {
        let name = self.name_of_type::<E>()?;
        self.get_mut(name)
            .ok_or(ExtensionError::NotFound(std::any::type_name::<E>()))
    }
}

impl Debug for ExtensionContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.ob_map.keys()).finish()
    }
}

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Extension with name {0:?} already registered")]
    AlreadyRegistered(String),
    #[error("No extension of type {0} registered")]
    NotFound(&'static str),
    #[error("More than one extension of type {0} registered")]
    Ambiguous(&'static str),
}
