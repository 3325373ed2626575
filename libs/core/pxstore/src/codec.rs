use serde::{de::DeserializeOwned, Serialize};

use crate::StoreError;

/// Serialize a structured record to the text form stored by a backend.
///
/// # Errors
/// - [`StoreError::Encode`]: The record cannot be represented as JSON.
pub fn encode_record<T: Serialize>(record: &T) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(StoreError::Encode)
}

/// Deserialize a stored text back into a structured record.
///
/// Callers are expected to treat [`StoreError::Decode`] as "record absent";
/// there is no schema migration for persisted values.
///
/// # Errors
/// - [`StoreError::Decode`]: The stored text is not a valid encoding of `T`.
pub fn decode_record<T: DeserializeOwned>(text: &str) -> Result<T, StoreError> {
    serde_json::from_str(text).map_err(StoreError::Decode)
}
