use std::fmt;
use std::str::FromStr;

use crate::error::DeserializationError;

/// How a key or value payload is turned into text.
///
/// Chosen independently for keys and values. Absence of a kind means the
/// payload is passed through (text) or hex-encoded (bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeserializationKind {
    /// UTF-8 decode
    RawString,
    /// UTF-8 decode, parse and re-serialize as JSON
    PlainJson,
    /// Registry framing followed by a JSON document
    RegistryFramedJson,
    /// Registry framing followed by an Avro datum
    RegistryFramedAvro,
}

impl DeserializationKind {
    /// Whether decoding needs schemas from the registry.
    pub fn needs_registry_schemas(&self) -> bool {
        matches!(self, DeserializationKind::RegistryFramedAvro)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeserializationKind::RawString => "str",
            DeserializationKind::PlainJson => "json",
            DeserializationKind::RegistryFramedJson => "confluent-json",
            DeserializationKind::RegistryFramedAvro => "confluent-avro",
        }
    }
}

impl fmt::Display for DeserializationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeserializationKind {
    type Err = DeserializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" | "raw-string" => Ok(DeserializationKind::RawString),
            "json" | "plain-json" => Ok(DeserializationKind::PlainJson),
            "confluent-json" | "registry-framed-json" => {
                Ok(DeserializationKind::RegistryFramedJson)
            }
            "confluent-avro" | "registry-framed-binary" => {
                Ok(DeserializationKind::RegistryFramedAvro)
            }
            other => Err(DeserializationError::UnknownKind(other.to_string())),
        }
    }
}
