//! Error types for kafka-types crate.

use thiserror::Error;

/// Errors that can occur while turning a message payload into text.
///
/// Every deserialization strategy reports its failures through this type,
/// whatever the underlying cause (framing, schema lookup, payload decoding).
#[derive(Error, Debug)]
pub enum DeserializationError {
    #[error("Payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Framed payload too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    #[error("Invalid magic byte in framed payload: expected 0, got {0}")]
    InvalidMagicByte(u8),

    #[error("Failed to resolve schema {schema_id}: {source}")]
    SchemaResolution {
        schema_id: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Avro decode error: {0}")]
    AvroDecode(#[source] Box<apache_avro::Error>),

    #[error("Unknown deserialization kind: {0}")]
    UnknownKind(String),
}

impl From<apache_avro::Error> for DeserializationError {
    fn from(err: apache_avro::Error) -> Self {
        DeserializationError::AvroDecode(Box::new(err))
    }
}

/// Result type alias for kafka-types operations.
pub type Result<T> = std::result::Result<T, DeserializationError>;
