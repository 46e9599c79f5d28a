//! Schema registry access for kafka-batch-reader.
//!
//! Provides:
//! - [`SchemaRegistry`], the read-only registry interface the consumer needs
//! - [`RegistryClient`], a blocking client for Confluent-compatible registries
//! - [`InMemoryRegistry`] for tests and offline use
//! - [`SchemaCache`], schema id → parsed Avro schema, filled lazily or
//!   pre-warmed for a topic

mod cache;
mod client;
pub mod error;
mod memory;
mod registry;

pub use cache::{fetch_parsed_schema, schemas_for_topic, SchemaCache};
pub use client::{RegistryClient, RegistryConfig};
pub use error::{RegistryError, Result, SUBJECT_NOT_FOUND, VERSION_NOT_FOUND};
pub use memory::InMemoryRegistry;
pub use registry::{topic_subjects, RegisteredSchema, SchemaRegistry, SchemaType, SubjectVersion};

// Parsed schema type, re-exported so callers need no direct apache-avro dependency
pub use apache_avro::Schema;
