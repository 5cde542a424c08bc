use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

use serde::ser::Error as SerdeError;
use serde::{Serialize, Serializer};

use crate::identifier::Id;
use crate::lazy_evaluation::anonymous::AnonymousProvider;
use crate::lazy_evaluation::{IntoProvider, Provider, ProviderExt};

/// A typed property.
///
/// Clones of a property share the same value. A property's value comes from, in order:
/// 1. The value it was finalized with, if finalized
/// 2. The explicitly set value or provider
/// 3. The convention, if no value was explicitly set
pub struct Prop<T: 'static + Send + Sync + Clone> {
    id: Id,
    inner: Arc<RwLock<PropInner<T>>>,
}

assert_impl_all!(Prop<String>: Send, Sync, Clone, Provider<String>);

impl<T: 'static + Send + Sync + Clone> Default for Prop<T> {
    fn default() -> Self {
        Self::new(Id::default())
    }
}

impl<T: 'static + Send + Sync + Clone + Debug> Debug for Prop<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            match self.resolve() {
                Ok(v) => write!(f, "{:#?}", v),
                Err(_) => write!(f, "<no value>"),
            }
        } else {
            let mut debug = f.debug_struct("Prop");
            debug.field("id", &self.id);
            if let Ok(value) = self.resolve() {
                debug.field("value", &value);
            }
            debug.finish()
        }
    }
}

impl<T: 'static + Send + Sync + Clone + Display> Display for Prop<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.resolve() {
            Ok(v) => write!(f, "{}", v),
            Err(_) => write!(f, "<unset>"),
        }
    }
}

impl<T: 'static + Send + Sync + Clone> Provider<T> for Prop<T> {
    fn missing_message(&self) -> String {
        match self.resolve() {
            Ok(_) => format!("{} has a value", self.id),
            Err(e) => e.to_string(),
        }
    }

    fn try_get(&self) -> Option<T> {
        self.resolve().ok()
    }
}

impl<T: 'static + Send + Sync + Clone> Prop<T> {
    /// Creates a new, empty property
    pub fn new(id: Id) -> Self {
        Self {
            id,
            inner: Arc::new(RwLock::new(PropInner::default())),
        }
    }

    /// Creates a new, empty property from a name.
    ///
    /// # Panic
    /// Panics if the name is not a valid identifier
    pub fn with_name<S: AsRef<str>>(id: S) -> Self {
        Self::new(Id::new(id).expect("invalid property name"))
    }

    /// Creates an anonymous property with a value already set
    pub fn with_value(value: T) -> Self {
        let prop = Self::default();
        prop.write_value(PropValue::Provided(AnonymousProvider::with_value(value)));
        prop
    }

    fn write_value(&self, value: PropValue<T>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.value = value;
        }
    }

    /// The identifier of the property
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Sets this property to use the value of some provider
    ///
    /// # Error
    /// Errors if the property has already been finalized
    pub fn set_with<P: IntoProvider<T>>(&mut self, val: P) -> Result<(), Error>
    where
        <P as IntoProvider<T>>::Provider: 'static,
    {
        let mut inner = self.inner.write()?;
        inner.check_not_final(&self.id)?;
        inner.value = PropValue::Provided(AnonymousProvider::new(val));
        Ok(())
    }

    /// Sets this property to a value
    ///
    /// # Error
    /// Errors if the property has already been finalized
    pub fn set<P>(&mut self, val: P) -> Result<(), Error>
    where
        P: Into<T>,
    {
        self.set_with(Some(val.into()))
    }

    /// Sets the convention of this property to use the value of some provider. The convention
    /// is only used while no value has been explicitly set.
    pub fn set_convention_with<P: IntoProvider<T>>(&mut self, val: P) -> Result<(), Error>
    where
        <P as IntoProvider<T>>::Provider: 'static,
    {
        let mut inner = self.inner.write()?;
        inner.check_not_final(&self.id)?;
        inner.convention = Some(AnonymousProvider::new(val));
        Ok(())
    }

    /// Sets the convention of this property to a value.
    pub fn set_convention<P>(&mut self, val: P) -> Result<(), Error>
    where
        P: Into<T>,
    {
        self.set_convention_with(Some(val.into()))
    }

    /// Whether this property currently has a value
    pub fn is_present(&self) -> bool {
        self.resolve().is_ok()
    }

    /// Whether this property has been finalized
    pub fn is_finalized(&self) -> bool {
        self.inner
            .read()
            .map(|inner| matches!(inner.value, PropValue::Final(_)))
            .unwrap_or(false)
    }

    /// Computes the value of this property one last time. Afterwards, this property can no longer
    /// be changed and always returns the computed value. Finalizing an already finalized property
    /// does nothing.
    pub fn finalize(&self) -> Result<(), Error> {
        let mut inner = self.inner.write()?;
        if !matches!(inner.value, PropValue::Final(_)) {
            let value = inner.resolve(&self.id).ok();
            inner.value = PropValue::Final(value);
            trace!("finalized property {}", self.id);
        }
        Ok(())
    }

    /// Finalizes this property, then gets its value.
    ///
    /// # Error
    /// Errors if this property has no value.
    pub fn finalize_and_get(&self) -> Result<T, Error> {
        self.finalize()?;
        self.resolve()
    }

    /// Gets the current value of this property
    pub fn resolve(&self) -> Result<T, Error> {
        self.inner.read()?.resolve(&self.id)
    }
}

impl<T: 'static + Send + Sync + Clone> Clone for Prop<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T: Serialize + 'static + Send + Sync + Clone> Serialize for Prop<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.resolve()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

enum PropValue<T: Send + Sync + Clone> {
    Unset,
    Provided(AnonymousProvider<T>),
    Final(Option<T>),
}

struct PropInner<T: Send + Sync + Clone> {
    value: PropValue<T>,
    convention: Option<AnonymousProvider<T>>,
}

impl<T: Send + Sync + Clone> Default for PropInner<T> {
    fn default() -> Self {
        Self {
            value: PropValue::Unset,
            convention: None,
        }
    }
}

impl<T: Send + Sync + Clone> PropInner<T> {
    fn check_not_final(&self, id: &Id) -> Result<(), Error> {
        match self.value {
            PropValue::Final(_) => Err(Error::PropertyFinalized(id.clone())),
            _ => Ok(()),
        }
    }

    fn resolve(&self, id: &Id) -> Result<T, Error> {
        let provider = match &self.value {
            PropValue::Final(value) => {
                return value.clone().ok_or_else(|| Error::not_set(id, None));
            }
            PropValue::Provided(provider) => Some(provider),
            PropValue::Unset => self.convention.as_ref(),
        };
        match provider {
            Some(provider) => provider
                .try_get()
                .ok_or_else(|| Error::not_set(id, Some(provider.missing_message()))),
            None => Err(Error::not_set(id, None)),
        }
    }
}

/// An error occurred while working with a property
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Property's lock was poisoned")]
    LockPoisonError,
    #[error("Property {id} has no value{}", describe_reason(.reason))]
    PropertyNotSet { id: Id, reason: Option<String> },
    #[error("Property {0} is final and can no longer be changed")]
    PropertyFinalized(Id),
}

impl Error {
    fn not_set(id: &Id, reason: Option<String>) -> Self {
        Self::PropertyNotSet {
            id: id.clone(),
            reason,
        }
    }
}

fn describe_reason(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|reason| format!(" ({})", reason))
        .unwrap_or_default()
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Self::LockPoisonError
    }
}

/// A vec prop is a special property that uses a list
pub struct VecProp<T: 'static + Send + Sync + Clone> {
    id: Id,
    inner: Arc<RwLock<VecPropInner<T>>>,
}

assert_impl_all!(VecProp<String>: Send, Sync, Clone, Provider<Vec<String>>);

struct VecPropInner<T: Send + Sync + Clone> {
    providers: Vec<AnonymousProvider<Vec<T>>>,
    finalized: Option<Vec<T>>,
}

impl<T: Send + Sync + Clone> VecPropInner<T> {
    fn check_not_final(&self, id: &Id) -> Result<(), Error> {
        match self.finalized {
            Some(_) => Err(Error::PropertyFinalized(id.clone())),
            None => Ok(()),
        }
    }

    fn resolve(&self, id: &Id) -> Result<Vec<T>, Error> {
        if let Some(finalized) = &self.finalized {
            return Ok(finalized.clone());
        }
        let mut output = vec![];
        for provider in &self.providers {
            let values = provider
                .try_get()
                .ok_or_else(|| Error::not_set(id, Some(provider.missing_message())))?;
            output.extend(values);
        }
        Ok(output)
    }
}

impl<T: 'static + Send + Sync + Clone> Default for VecProp<T> {
    fn default() -> Self {
        Self::new(Id::default())
    }
}

impl<T: 'static + Send + Sync + Clone> Clone for VecProp<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static + Send + Sync + Clone + Debug> Debug for VecProp<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "VecProp {} ", self.id)?;
        match self.resolve() {
            Ok(values) => f.debug_list().entries(values).finish(),
            Err(_) => write!(f, "<missing values>"),
        }
    }
}

impl<T: 'static + Send + Sync + Clone> Provider<Vec<T>> for VecProp<T> {
    fn missing_message(&self) -> String {
        match self.resolve() {
            Ok(_) => format!("{} has a value", self.id),
            Err(e) => e.to_string(),
        }
    }

    fn try_get(&self) -> Option<Vec<T>> {
        self.resolve().ok()
    }
}

impl<T: 'static + Send + Sync + Clone> VecProp<T> {
    /// create a new vec prop with a given id
    pub fn new(id: Id) -> Self {
        Self {
            id,
            inner: Arc::new(RwLock::new(VecPropInner {
                providers: vec![],
                finalized: None,
            })),
        }
    }

    /// The identifier of the property
    pub fn id(&self) -> &Id {
        &self.id
    }

    fn push_provider(&mut self, provider: AnonymousProvider<Vec<T>>) -> Result<(), Error> {
        let mut inner = self.inner.write()?;
        inner.check_not_final(&self.id)?;
        inner.providers.push(provider);
        Ok(())
    }

    /// Resets this property to contain only the values from the provider
    pub fn from<I, P>(&mut self, values: P) -> Result<(), Error>
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        P: IntoProvider<I>,
        P::Provider: 'static,
    {
        self.clear()?;
        self.push_all_with(values)
    }

    /// Push a value to the vector
    pub fn push_with<P>(&mut self, value: P) -> Result<(), Error>
    where
        P: IntoProvider<T>,
        P::Provider: 'static,
    {
        let anonymous = AnonymousProvider::new(value.into_provider().map(|v| vec![v]));
        self.push_provider(anonymous)
    }

    /// Push all value to the vector
    pub fn push_all_with<P, I>(&mut self, value: P) -> Result<(), Error>
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        P: IntoProvider<I>,
        P::Provider: 'static,
    {
        let anonymous = AnonymousProvider::new(
            value
                .into_provider()
                .map(|v| v.into_iter().collect::<Vec<_>>()),
        );
        self.push_provider(anonymous)
    }

    /// Push a value to the vector
    pub fn push<V>(&mut self, value: V) -> Result<(), Error>
    where
        V: Into<T>,
    {
        self.push_provider(AnonymousProvider::with_value(vec![value.into()]))
    }

    /// Push many values to the vector
    pub fn push_all<V, I: IntoIterator<Item = V>>(&mut self, values: I) -> Result<(), Error>
    where
        V: Into<T>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<T>>();
        self.push_provider(AnonymousProvider::with_value(values))
    }

    /// Clears the contents of the vector
    pub fn clear(&mut self) -> Result<(), Error> {
        let mut inner = self.inner.write()?;
        inner.check_not_final(&self.id)?;
        inner.providers.clear();
        Ok(())
    }

    /// Whether this property has been finalized
    pub fn is_finalized(&self) -> bool {
        self.inner
            .read()
            .map(|inner| inner.finalized.is_some())
            .unwrap_or(false)
    }

    /// Computes the contents of this property one last time. Afterwards, this property can no
    /// longer be changed.
    ///
    /// # Error
    /// Errors if any of the values could not be provided.
    pub fn finalize(&self) -> Result<(), Error> {
        let mut inner = self.inner.write()?;
        if inner.finalized.is_none() {
            let values = inner.resolve(&self.id)?;
            inner.finalized = Some(values);
            trace!("finalized property {}", self.id);
        }
        Ok(())
    }

    /// Finalizes this property, then gets its values
    pub fn finalize_and_get(&self) -> Result<Vec<T>, Error> {
        self.finalize()?;
        self.resolve()
    }

    /// Gets the current contents of this property
    pub fn resolve(&self) -> Result<Vec<T>, Error> {
        self.inner.read()?.resolve(&self.id)
    }
}

impl<T: Serialize> Serialize for VecProp<T>
where
    T: 'static + Send + Sync + Clone,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.resolve()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}
