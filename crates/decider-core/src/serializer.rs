//! Pluggable encoding of events and snapshot states.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Turns values into bytes and back.
///
/// Implementations must round-trip: decoding an encoded value yields a value
/// equal to the original for every event and state type in use.
pub trait Serializer: Send + Sync + Clone + 'static {
    /// Encodes `value`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the value cannot be encoded.
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, StoreError>;

    /// Decodes a value previously produced by [`serialize`](Self::serialize).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the bytes do not decode to `T`.
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, StoreError>;
}

/// JSON text encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Compact binary encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySerializer;

impl Serializer for BinarySerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, StoreError> {
        bitcode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, StoreError> {
        bitcode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
