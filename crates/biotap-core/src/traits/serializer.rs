//! Pluggable serialization trait

use crate::SyncError;
use serde::{de::DeserializeOwned, Serialize};

/// Trait for pluggable serialization formats
///
/// Implement this trait to add custom serialization formats.
/// The query cache stores values in serialized form; JSON is built in.
pub trait Serializer: Send + Sync + Clone + 'static {
    /// Name of the serializer (for debugging/metrics)
    fn name(&self) -> &str;

    /// Serialize a value to bytes
    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SyncError>;

    /// Deserialize bytes to a value
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SyncError>;
}

/// JSON serializer (default)
///
/// Human-readable, widely compatible, good for debugging.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(value).map_err(|e| SyncError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SyncError> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_compact() {
        let serializer = JsonSerializer;
        let bytes = serializer.serialize(&vec![1, 2, 3]).unwrap();
        assert_eq!(bytes, b"[1,2,3]".to_vec());
    }

    #[test]
    fn test_json_shape_mismatch() {
        let serializer = JsonSerializer;
        let result: Result<Vec<i32>, _> = serializer.deserialize(b"{\"not\": \"a list\"}");
        assert!(matches!(result, Err(SyncError::Deserialization(_))));
    }

    #[test]
    fn test_json_serializer_name() {
        assert_eq!(JsonSerializer.name(), "json");
    }
}
