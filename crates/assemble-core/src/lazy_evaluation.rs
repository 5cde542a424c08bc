//! Lazy evaluation allows for a more simple approach to sharing data between tasks.
//!
//! The main driving trait that allows for this is [`Provider`](Provider). Objects that
//! implement this trait can try to provide a value of that type.
//!
//! Properties
//! ---
//!
//! `Prop<T>` - A property that can be set to a specific value, or a provider of that value.
//! `VecProp<T>` - A property made up of a list of values.
//!
//! Both kinds of properties support a *convention*, a value used when nothing was explicitly
//! set, and *finalization*. Once a property is finalized its value is computed one last time
//! and can no longer be changed.
//! ```
//! # use assemble_core::lazy_evaluation::{Prop, Provider};
//! let mut flag = Prop::<bool>::with_name("flag");
//! flag.set_convention(true).unwrap();
//! assert_eq!(flag.finalize_and_get().unwrap(), true);
//! assert!(flag.set(false).is_err());
//! ```

pub mod anonymous;
pub mod prop;
pub mod providers;

use crate::lazy_evaluation::providers::{FlatMap, Map};
pub use prop::*;

/// The provider trait represents an object that can continuously produce a value. Provider values
/// can be chained together using the [`ProviderExt`][0] trait.
///
/// [0]: ProviderExt
pub trait Provider<T: Clone + Send + Sync>: Send + Sync {
    /// The missing message for this provider
    fn missing_message(&self) -> String {
        String::from("Provider has no value set")
    }

    /// Get a value from the provider.
    ///
    /// # Panic
    /// This method will panic if there is no value available.
    fn get(&self) -> T {
        match self.try_get() {
            Some(value) => value,
            None => panic!("{}", self.missing_message()),
        }
    }

    /// Try to get a value from the provider.
    ///
    /// Will return `Some(v)` if value `v` is available, otherwise `None` is returned.
    fn try_get(&self) -> Option<T>;

    /// Tries to get a value from this provider, returning an error if not available.
    ///
    /// The error's message is usually specified by the `missing_message()` method.
    fn fallible_get(&self) -> Result<T, ProviderError> {
        self.try_get()
            .ok_or_else(|| ProviderError::new(self.missing_message()))
    }
}

assert_obj_safe!(Provider<()>);

impl<T: Clone + Send + Sync> Provider<T> for Option<T> {
    fn try_get(&self) -> Option<T> {
        self.clone()
    }
}

/// Provides extensions that are not object safe to the Provider trait.
pub trait ProviderExt<T: Clone + Send + Sync>: Provider<T> + Sized {
    /// Creates a provider that can map the output of one provider into some other value.
    ///
    /// `transform`: `fn(T) -> R`
    fn map<R, F>(self, transform: F) -> Map<T, R, F, Self>
    where
        R: Send + Sync + Clone,
        F: Fn(T) -> R + Send + Sync,
    {
        Map::new(self, transform)
    }

    /// Creates a provider that can map the output of one provider with type `T` into some other value that's
    /// also a provider of type `R`. The created provider is a provider of type `R`
    ///
    /// `transform`: `fn(T) -> impl Provider<R>`
    fn flat_map<R, P, F>(self, transform: F) -> FlatMap<T, R, Self, P, F>
    where
        R: Send + Sync + Clone,
        P: Provider<R>,
        F: Fn(T) -> P + Send + Sync,
    {
        FlatMap::new(self, transform)
    }
}

impl<P, T> ProviderExt<T> for P
where
    T: Clone + Send + Sync,
    P: Provider<T>,
{
}

/// Represents that a type can be represented as a provider. All Providers implement this trait.
pub trait IntoProvider<T: Send + Sync + Clone> {
    /// The provider that is created
    type Provider: Provider<T>;

    /// Converts this value into a provider
    fn into_provider(self) -> Self::Provider;
}

impl<P, T> IntoProvider<T> for P
where
    T: Clone + Send + Sync,
    P: Provider<T>,
{
    type Provider = Self;

    fn into_provider(self) -> Self::Provider {
        self
    }
}

/// A value could not be provided
#[derive(Debug, thiserror::Error)]
#[error("{}", message)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    /// Creates a new provider error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
