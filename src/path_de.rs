//! Deserialization with the JSON path of the failure in the error.
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GeneratorError, Result};

pub fn from_str_with_path<T: DeserializeOwned>(src: &str, origin: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    with_path(origin, serde_path_to_error::deserialize(de))
}

pub fn from_value_with_path<T: DeserializeOwned>(value: Value, origin: &str) -> Result<T> {
    with_path(origin, serde_path_to_error::deserialize(value))
}

fn with_path<T, E: std::fmt::Display>(
    origin: &str,
    result: std::result::Result<T, serde_path_to_error::Error<E>>,
) -> Result<T> {
    result.map_err(|err| GeneratorError::Parse {
        origin: origin.to_string(),
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}
