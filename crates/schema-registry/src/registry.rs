//! Registry trait and the records it returns.

use std::fmt;

use crate::error::Result;

/// Schema format as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Avro,
    Json,
    Protobuf,
    Other(String),
}

impl SchemaType {
    /// The registry omits `schemaType` for Avro schemas.
    pub fn from_registry(schema_type: Option<&str>) -> Self {
        match schema_type.map(|s| s.to_ascii_uppercase()) {
            None => SchemaType::Avro,
            Some(s) => match s.as_str() {
                "AVRO" => SchemaType::Avro,
                "JSON" => SchemaType::Json,
                "PROTOBUF" => SchemaType::Protobuf,
                _ => SchemaType::Other(s),
            },
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Avro => f.write_str("AVRO"),
            SchemaType::Json => f.write_str("JSON"),
            SchemaType::Protobuf => f.write_str("PROTOBUF"),
            SchemaType::Other(s) => f.write_str(s),
        }
    }
}

/// Schema text as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredSchema {
    pub schema: String,
    pub schema_type: SchemaType,
}

/// One version of a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectVersion {
    pub subject: String,
    pub version: u32,
    pub id: u32,
}

/// Read-only view of a schema registry.
///
/// Implemented by the HTTP [`RegistryClient`](crate::RegistryClient) and by
/// [`InMemoryRegistry`](crate::InMemoryRegistry).
pub trait SchemaRegistry {
    /// Fetch a schema by its global id.
    fn schema_by_id(&self, id: u32) -> Result<RegisteredSchema>;

    /// List the registered versions of a subject.
    fn subject_versions(&self, subject: &str) -> Result<Vec<u32>>;

    /// Fetch one version of a subject.
    fn subject_version(&self, subject: &str, version: u32) -> Result<SubjectVersion>;
}

impl<R: SchemaRegistry + ?Sized> SchemaRegistry for &R {
    fn schema_by_id(&self, id: u32) -> Result<RegisteredSchema> {
        (**self).schema_by_id(id)
    }

    fn subject_versions(&self, subject: &str) -> Result<Vec<u32>> {
        (**self).subject_versions(subject)
    }

    fn subject_version(&self, subject: &str, version: u32) -> Result<SubjectVersion> {
        (**self).subject_version(subject, version)
    }
}

/// Registry subjects holding the key and value schemas of `topic`.
pub fn topic_subjects(topic: &str) -> [String; 2] {
    [format!("{topic}-key"), format!("{topic}-value")]
}
