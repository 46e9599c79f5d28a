//! Output records.
//!
//! A [`KafkaRecord`] is the flat, decoded form of one message. Records have
//! no identity beyond their content; they are placed in a batch as soon as
//! they are built.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::deserialize::Decoded;
use crate::error::DeserializationError;
use crate::hash::sha256_hex;
use crate::kind::DeserializationKind;
use crate::message::{Header, Payload, RawMessage};

/// Decodes payload bytes for a given kind.
///
/// Implemented by the kafka-source deserializer registry, which owns the
/// schema cache needed for binary-schema payloads.
pub trait PayloadDeserializer {
    fn deserialize(
        &mut self,
        kind: DeserializationKind,
        data: &[u8],
    ) -> Result<Decoded, DeserializationError>;
}

/// Which half of a message a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSide {
    Key,
    Value,
}

impl fmt::Display for PayloadSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadSide::Key => f.write_str("key"),
            PayloadSide::Value => f.write_str("value"),
        }
    }
}

/// A message whose key or value could not be deserialized.
#[derive(Error, Debug)]
#[error("Failed to deserialize {side} of {topic}[{partition}] at offset {offset}: {error}")]
pub struct DecodeFailure {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub side: PayloadSide,
    #[source]
    pub error: DeserializationError,
}

/// Flat output record, one per consumed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KafkaRecord {
    #[serde(rename = "KAFKA_KEY")]
    pub key: Option<String>,
    #[serde(rename = "KAFKA_KEY_HASH")]
    pub key_hash: Option<String>,
    #[serde(rename = "KAFKA_KEY_SCHEMA")]
    pub key_schema_id: Option<u32>,
    #[serde(rename = "KAFKA_VALUE")]
    pub value: Option<String>,
    #[serde(rename = "KAFKA_VALUE_HASH")]
    pub value_hash: Option<String>,
    #[serde(rename = "KAFKA_VALUE_SCHEMA")]
    pub value_schema_id: Option<u32>,
    #[serde(rename = "KAFKA_TOPIC")]
    pub topic: String,
    #[serde(rename = "KAFKA_OFFSET")]
    pub offset: i64,
    #[serde(rename = "KAFKA_PARTITION")]
    pub partition: i32,
    #[serde(rename = "KAFKA_TIMESTAMP")]
    pub timestamp: Option<i64>,
    #[serde(rename = "KAFKA_TIMESTAMP_TYPE")]
    pub timestamp_type: Option<&'static str>,
    #[serde(rename = "KAFKA_HEADERS")]
    pub headers: Option<String>,
}

/// Decoded form of one payload: text, content hash and schema id.
struct DecodedPayload {
    text: Option<String>,
    hash: Option<String>,
    schema_id: Option<u32>,
}

impl KafkaRecord {
    /// Build the output record for `message`.
    ///
    /// Bytes payloads are hashed as-is and decoded with the requested kind,
    /// or hex-encoded when no kind is requested. Text payloads are taken to
    /// be decoded already; they are hashed as UTF-8 and passed through.
    pub fn build<D: PayloadDeserializer + ?Sized>(
        message: RawMessage,
        key_kind: Option<DeserializationKind>,
        value_kind: Option<DeserializationKind>,
        deserializer: &mut D,
    ) -> Result<Self, DecodeFailure> {
        let RawMessage {
            topic,
            partition,
            offset,
            timestamp,
            headers,
            key,
            value,
        } = message;

        let failure = |side: PayloadSide, error: DeserializationError| DecodeFailure {
            topic: topic.clone(),
            partition,
            offset,
            side,
            error,
        };

        let key = decode_payload(key, key_kind, deserializer)
            .map_err(|e| failure(PayloadSide::Key, e))?;
        let value = decode_payload(value, value_kind, deserializer)
            .map_err(|e| failure(PayloadSide::Value, e))?;

        Ok(Self {
            key: key.text,
            key_hash: key.hash,
            key_schema_id: key.schema_id,
            value: value.text,
            value_hash: value.hash,
            value_schema_id: value.schema_id,
            topic,
            offset,
            partition,
            timestamp: timestamp.millis(),
            timestamp_type: timestamp.kind().map(|kind| kind.label()),
            headers: serialize_headers(&headers),
        })
    }
}

fn decode_payload<D: PayloadDeserializer + ?Sized>(
    payload: Option<Payload>,
    kind: Option<DeserializationKind>,
    deserializer: &mut D,
) -> Result<DecodedPayload, DeserializationError> {
    match payload {
        None => Ok(DecodedPayload {
            text: None,
            hash: None,
            schema_id: None,
        }),
        Some(Payload::Bytes(bytes)) => {
            let hash = sha256_hex(&bytes);
            let (text, schema_id) = match kind {
                Some(kind) => {
                    let decoded = deserializer.deserialize(kind, &bytes)?;
                    (decoded.text, decoded.schema_id)
                }
                None => (hex::encode(&bytes), None),
            };
            Ok(DecodedPayload {
                text: Some(text),
                hash: Some(hash),
                schema_id,
            })
        }
        Some(Payload::Text(text)) => Ok(DecodedPayload {
            hash: Some(sha256_hex(text.as_bytes())),
            text: Some(text),
            schema_id: None,
        }),
    }
}

/// `name:hex(value)` per header, comma separated. No headers serialize to
/// `None` rather than an empty string.
pub fn serialize_headers(headers: &[Header]) -> Option<String> {
    if headers.is_empty() {
        return None;
    }
    let rendered: Vec<String> = headers
        .iter()
        .map(|h| format!("{}:{}", h.name, hex::encode(&h.value)))
        .collect();
    Some(rendered.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize::{deserialize_json, deserialize_str};
    use crate::message::Timestamp;

    /// Handles the registry-free kinds; framed kinds are not expected here.
    struct PlainDeserializer;

    impl PayloadDeserializer for PlainDeserializer {
        fn deserialize(
            &mut self,
            kind: DeserializationKind,
            data: &[u8],
        ) -> Result<Decoded, DeserializationError> {
            match kind {
                DeserializationKind::RawString => deserialize_str(data),
                DeserializationKind::PlainJson => deserialize_json(data),
                other => panic!("unexpected kind {other}"),
            }
        }
    }

    #[test]
    fn test_bytes_without_kind_are_hex_encoded_and_hashed() {
        let message = RawMessage::new("t", 0, 5)
            .with_key(Payload::Bytes(vec![0x01, 0xab]))
            .with_value(Payload::Bytes(b"Hello, world!".to_vec()));

        let record = KafkaRecord::build(message, None, None, &mut PlainDeserializer).unwrap();

        assert_eq!(record.key.as_deref(), Some("01ab"));
        assert_eq!(record.key_hash, Some(sha256_hex(&[0x01, 0xab])));
        assert_eq!(record.value.as_deref(), Some("48656c6c6f2c20776f726c6421"));
        assert_eq!(
            record.value_hash.as_deref(),
            Some("315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3")
        );
        assert_eq!(record.key_schema_id, None);
        assert_eq!(record.value_schema_id, None);
    }

    #[test]
    fn test_text_payload_passes_through() {
        let message = RawMessage::new("t", 1, 0).with_value(Payload::Text("ferdig".to_string()));

        let record = KafkaRecord::build(
            message,
            None,
            Some(DeserializationKind::PlainJson),
            &mut PlainDeserializer,
        )
        .unwrap();

        assert_eq!(record.value.as_deref(), Some("ferdig"));
        assert_eq!(record.value_hash, Some(sha256_hex(b"ferdig")));
        assert_eq!(record.key, None);
        assert_eq!(record.key_hash, None);
    }

    #[test]
    fn test_requested_kinds_are_applied() {
        let message = RawMessage::new("t", 0, 0)
            .with_key(Payload::Bytes(b"key0".to_vec()))
            .with_value(Payload::Bytes(b"{ \"a\": 1 }".to_vec()));

        let record = KafkaRecord::build(
            message,
            Some(DeserializationKind::RawString),
            Some(DeserializationKind::PlainJson),
            &mut PlainDeserializer,
        )
        .unwrap();

        assert_eq!(record.key.as_deref(), Some("key0"));
        assert_eq!(record.value.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(record.value_hash, Some(sha256_hex(b"{ \"a\": 1 }")));
    }

    #[test]
    fn test_decode_failure_names_side_and_position() {
        let message = RawMessage::new("orders", 2, 17)
            .with_key(Payload::Bytes(b"k".to_vec()))
            .with_value(Payload::Bytes(b"{broken".to_vec()));

        let failure = KafkaRecord::build(
            message,
            Some(DeserializationKind::RawString),
            Some(DeserializationKind::PlainJson),
            &mut PlainDeserializer,
        )
        .unwrap_err();

        assert_eq!(failure.side, PayloadSide::Value);
        assert_eq!(failure.topic, "orders");
        assert_eq!(failure.partition, 2);
        assert_eq!(failure.offset, 17);
        assert!(matches!(failure.error, DeserializationError::InvalidJson(_)));
    }

    #[test]
    fn test_timestamp_provenance() {
        let source = KafkaRecord::build(
            RawMessage::new("t", 0, 0).with_timestamp(Timestamp::source(10)),
            None,
            None,
            &mut PlainDeserializer,
        )
        .unwrap();
        assert_eq!(source.timestamp, Some(10));
        assert_eq!(source.timestamp_type, Some("SOURCE"));

        let broker = KafkaRecord::build(
            RawMessage::new("t", 0, 0).with_timestamp(Timestamp::broker(20)),
            None,
            None,
            &mut PlainDeserializer,
        )
        .unwrap();
        assert_eq!(broker.timestamp_type, Some("BROKER"));

        let missing = KafkaRecord::build(
            RawMessage::new("t", 0, 0),
            None,
            None,
            &mut PlainDeserializer,
        )
        .unwrap();
        assert_eq!(missing.timestamp, None);
        assert_eq!(missing.timestamp_type, None);
    }

    #[test]
    fn test_headers_serialization() {
        assert_eq!(serialize_headers(&[]), None);
        let headers = vec![
            Header::new("trace", vec![0x0a, 0xff]),
            Header::new("empty", Vec::new()),
        ];
        assert_eq!(
            serialize_headers(&headers).as_deref(),
            Some("trace:0aff,empty:")
        );
    }

    #[test]
    fn test_record_serializes_with_column_names() {
        let record = KafkaRecord::build(
            RawMessage::new("t", 0, 3).with_header(Header::new("h", b"v".to_vec())),
            None,
            None,
            &mut PlainDeserializer,
        )
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["KAFKA_TOPIC"], "t");
        assert_eq!(json["KAFKA_OFFSET"], 3);
        assert_eq!(json["KAFKA_HEADERS"], "h:76");
        assert!(json["KAFKA_KEY"].is_null());
    }
}
