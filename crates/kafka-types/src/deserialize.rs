//! Deserialization strategies.
//!
//! Each strategy turns a payload into text plus the schema id found in the
//! registry frame, if the strategy uses one. Binary-schema decoding needs a
//! schema for the id, which the caller supplies through a resolver so that
//! this crate stays independent of the registry client.

use apache_avro::{from_avro_datum, Schema};

use crate::avro::avro_to_json;
use crate::error::Result;
use crate::wire::parse_frame;

/// Result of a successful deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub schema_id: Option<u32>,
}

impl Decoded {
    fn unframed(text: String) -> Self {
        Self {
            text,
            schema_id: None,
        }
    }

    fn framed(text: String, schema_id: u32) -> Self {
        Self {
            text,
            schema_id: Some(schema_id),
        }
    }
}

pub fn deserialize_str(data: &[u8]) -> Result<Decoded> {
    let text = std::str::from_utf8(data)?;
    Ok(Decoded::unframed(text.to_string()))
}

pub fn deserialize_json(data: &[u8]) -> Result<Decoded> {
    Ok(Decoded::unframed(reserialize_json(data)?))
}

/// JSON documents describe themselves; the schema id is reported but not
/// used for validation.
pub fn deserialize_framed_json(data: &[u8]) -> Result<Decoded> {
    let (schema_id, body) = parse_frame(data)?;
    Ok(Decoded::framed(reserialize_json(body)?, schema_id))
}

pub fn deserialize_framed_avro<'s, F>(data: &[u8], resolve: F) -> Result<Decoded>
where
    F: FnOnce(u32) -> Result<&'s Schema>,
{
    let (schema_id, mut body) = parse_frame(data)?;
    let schema = resolve(schema_id)?;
    let value = from_avro_datum(schema, &mut body, None)?;
    Ok(Decoded::framed(avro_to_json(&value).to_string(), schema_id))
}

fn reserialize_json(data: &[u8]) -> Result<String> {
    let value: serde_json::Value = serde_json::from_slice(data)?;
    Ok(value.to_string())
}
