//! # Domain Layer
//!
//! Record entities, key codecs and the bincode record serializer.

pub mod errors;
pub mod keys;
pub mod records;

use serde::de::DeserializeOwned;
use serde::Serialize;

use errors::StoreError;

/// Serialize a record for storage.
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(record).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}

/// Deserialize a stored record.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}
