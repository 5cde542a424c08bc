//! Type erased providers.
//!
//! Properties, file sets and task outputs all hold providers of different concrete types.
//! [`AnonymousProvider`](AnonymousProvider) erases that type so they can be stored side by side,
//! and so a provider built from a chain of `map` calls can be handed out without naming it.
//!
//! # Example
//! A convention derived from some other lazily configured value:
//! ```
//! # use assemble_core::lazy_evaluation::anonymous::AnonymousProvider;
//! # use assemble_core::lazy_evaluation::{Prop, Provider, ProviderExt};
//! # use std::path::PathBuf;
//! let mut home = Prop::<PathBuf>::with_name("javaHome");
//! let compiler = AnonymousProvider::new(home.clone().map(|home| home.join("bin/javac")));
//! assert_eq!(compiler.try_get(), None);
//!
//! home.set("/opt/jdk").unwrap();
//! assert_eq!(compiler.get(), PathBuf::from("/opt/jdk/bin/javac"));
//! ```

use crate::lazy_evaluation::{IntoProvider, Provider, ProviderError};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A shared provider whose concrete type was erased. Clones read from the same source.
#[derive(Clone)]
pub struct AnonymousProvider<T: Clone + Send + Sync> {
    source: Arc<dyn Provider<T>>,
}

impl<T: Clone + Send + Sync> AnonymousProvider<T> {
    /// Erases the type of anything that can be turned into a provider
    pub fn new<P>(provider: P) -> Self
    where
        P: IntoProvider<T>,
        P::Provider: 'static,
    {
        Self {
            source: Arc::new(provider.into_provider()),
        }
    }

    /// A provider of a value that's already known
    pub fn with_value(value: T) -> Self
    where
        T: 'static,
    {
        Self::new(Some(value))
    }
}

impl<T: Clone + Send + Sync> Provider<T> for AnonymousProvider<T> {
    fn missing_message(&self) -> String {
        self.source.missing_message()
    }

    fn try_get(&self) -> Option<T> {
        self.source.try_get()
    }

    fn fallible_get(&self) -> Result<T, ProviderError> {
        self.source.fallible_get()
    }
}

impl<T: Clone + Send + Sync> Debug for AnonymousProvider<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnonymousProvider").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy_evaluation::Prop;

    #[test]
    fn clones_share_source() {
        let mut version = Prop::<u32>::with_name("languageVersion");
        let provider = AnonymousProvider::new(version.clone());
        let copy = provider.clone();
        version.set(17u32).unwrap();
        assert_eq!(provider.try_get(), Some(17));
        assert_eq!(copy.try_get(), Some(17));
    }

    #[test]
    fn missing_message_comes_from_source() {
        let version = Prop::<u32>::with_name("languageVersion");
        let provider = AnonymousProvider::new(version.clone());
        assert_eq!(provider.missing_message(), version.missing_message());
    }
}
