use kafka_types::DecodeFailure;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use schema_registry::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Metadata error for topic {topic}: {code}")]
    TopicMetadata {
        topic: String,
        code: RDKafkaErrorCode,
    },

    #[error("Metadata error for partition {partition} of topic {topic}: {code}")]
    PartitionMetadata {
        topic: String,
        partition: i32,
        code: RDKafkaErrorCode,
    },

    #[error("Schema registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Fatal transport error: {0}")]
    FatalTransport(#[source] KafkaError),

    #[error("Record transform failed: {0:#}")]
    Transform(anyhow::Error),

    #[error(transparent)]
    Deserialization(#[from] DecodeFailure),
}

pub type Result<T> = std::result::Result<T, Error>;
