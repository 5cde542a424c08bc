//! Provides implementations of providers

use crate::lazy_evaluation::Provider;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// create a provider with a function
#[macro_export]
macro_rules! provider {
    ($e:expr) => {
        $crate::lazy_evaluation::providers::FnProvider::new($e)
    };
}

/// A provider created from a function
pub struct FnProvider<F, T, R>
where
    F: Fn() -> R + Send + Sync,
    R: Into<Option<T>>,
    T: Send + Sync + Clone,
{
    func: F,
    _phantom: PhantomData<T>,
}

impl<F, T, R> Clone for FnProvider<F, T, R>
where
    F: Fn() -> R + Send + Sync + Clone,
    R: Into<Option<T>>,
    T: Send + Sync + Clone,
{
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<F, T, R> Debug for FnProvider<F, T, R>
where
    F: Fn() -> R + Send + Sync,
    R: Into<Option<T>>,
    T: Clone + Send + Sync,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FunctionalProvider")
    }
}

impl<F, T, R> Provider<T> for FnProvider<F, T, R>
where
    F: Fn() -> R + Send + Sync,
    R: Into<Option<T>>,
    T: Send + Sync + Clone,
{
    fn try_get(&self) -> Option<T> {
        (self.func)().into()
    }
}

impl<F, T, R> FnProvider<F, T, R>
where
    F: Fn() -> R + Send + Sync,
    R: Into<Option<T>>,
    T: Send + Sync + Clone,
{
    /// Creates a provider from a function
    pub fn new(func: F) -> Self {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

/// A provider that maps the value of another provider
pub struct Map<T, R, F, P>
where
    T: Send + Sync + Clone,
    R: Send + Sync + Clone,
    F: Fn(T) -> R + Send + Sync,
    P: Provider<T>,
{
    provider: P,
    transform: F,
    _data: PhantomData<(T, R)>,
}

impl<T, R, F, P> Map<T, R, F, P>
where
    T: Send + Sync + Clone,
    R: Send + Sync + Clone,
    F: Fn(T) -> R + Send + Sync,
    P: Provider<T>,
{
    pub(crate) fn new(provider: P, transform: F) -> Self {
        Self {
            provider,
            transform,
            _data: PhantomData,
        }
    }
}

impl<T, R, F, P> Clone for Map<T, R, F, P>
where
    T: Send + Sync + Clone,
    R: Send + Sync + Clone,
    F: Fn(T) -> R + Send + Sync + Clone,
    P: Provider<T> + Clone,
{
    fn clone(&self) -> Self {
        Self::new(self.provider.clone(), self.transform.clone())
    }
}

impl<T, R, F, P> Debug for Map<T, R, F, P>
where
    T: Send + Sync + Clone,
    R: Send + Sync + Clone,
    F: Fn(T) -> R + Send + Sync,
    P: Provider<T>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map").finish_non_exhaustive()
    }
}

impl<T, R, F, P> Provider<R> for Map<T, R, F, P>
where
    T: Send + Sync + Clone,
    R: Send + Sync + Clone,
    F: Fn(T) -> R + Send + Sync,
    P: Provider<T>,
{
    fn missing_message(&self) -> String {
        self.provider.missing_message()
    }

    fn try_get(&self) -> Option<R> {
        self.provider.try_get().map(&self.transform)
    }
}

/// A provider that maps the value of another provider into a third provider
pub struct FlatMap<T, R, P, PR, F>
where
    T: Send + Sync + Clone,
    R: Send + Sync + Clone,
    P: Provider<T>,
    PR: Provider<R>,
    F: Fn(T) -> PR + Send + Sync,
{
    provider: P,
    transform: F,
    _data: PhantomData<(T, R, PR)>,
}

impl<T, R, P, PR, F> FlatMap<T, R, P, PR, F>
where
    T: Send + Sync + Clone,
    R: Send + Sync + Clone,
    P: Provider<T>,
    PR: Provider<R>,
    F: Fn(T) -> PR + Send + Sync,
{
    pub(crate) fn new(provider: P, transform: F) -> Self {
        Self {
            provider,
            transform,
            _data: PhantomData,
        }
    }
}

impl<T, R, P, PR, F> Provider<R> for FlatMap<T, R, P, PR, F>
where
    T: Send + Sync + Clone,
    R: Send + Sync + Clone,
    P: Provider<T>,
    PR: Provider<R>,
    F: Fn(T) -> PR + Send + Sync,
{
    fn missing_message(&self) -> String {
        match self.provider.try_get() {
            None => self.provider.missing_message(),
            Some(value) => (self.transform)(value).missing_message(),
        }
    }

    fn try_get(&self) -> Option<R> {
        self.provider
            .try_get()
            .and_then(|value| (self.transform)(value).try_get())
    }
}
