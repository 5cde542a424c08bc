//! The serialization format of task history and input fingerprints.

use crate::project::error::{ProjectError, ProjectResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Deserialize into a value
pub fn from_str<T: DeserializeOwned>(string: impl AsRef<str>) -> ProjectResult<T> {
    ron_serde::from_str(string.as_ref()).map_err(|e| ProjectError::custom(e).into())
}

/// Serializes a value
pub fn to_string<S: Serialize>(value: &S) -> ProjectResult<String> {
    ron_serde::to_string(value).map_err(|e| ProjectError::custom(e).into())
}
