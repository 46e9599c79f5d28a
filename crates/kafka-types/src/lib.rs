//! Kafka message and record types for kafka-batch-reader.
//!
//! This crate holds everything about consumed messages that does not need a
//! broker connection: the transport-independent message model, the registry
//! wire framing, the deserialization strategies and the flat output record.
//!
//! # Architecture
//!
//! ```text
//! RawMessage → (DeserializationKind per key/value) → Decoded → KafkaRecord
//! ```
//!
//! # Modules
//!
//! - [`message`] - TopicPartition, Offset, Timestamp, Payload, RawMessage
//! - [`wire`] - registry framing (magic byte + big-endian schema id)
//! - [`deserialize`] - raw string, JSON, framed JSON and framed Avro decoding
//! - [`avro`] - Avro value → JSON conversion
//! - [`record`] - KafkaRecord and the record builder
//! - [`error`] - DeserializationError

pub mod avro;
pub mod deserialize;
pub mod error;
pub mod hash;
pub mod kind;
pub mod message;
pub mod record;
pub mod wire;

// Re-export main types for convenient access
pub use deserialize::{
    deserialize_framed_avro, deserialize_framed_json, deserialize_json, deserialize_str, Decoded,
};
pub use error::{DeserializationError, Result};
pub use hash::sha256_hex;
pub use kind::DeserializationKind;
pub use message::{Header, Offset, Payload, RawMessage, Timestamp, TimestampType, TopicPartition};
pub use record::{DecodeFailure, KafkaRecord, PayloadDeserializer, PayloadSide};
pub use wire::{encode_frame, parse_frame, FRAME_HEADER_SIZE, MAGIC_BYTE};
