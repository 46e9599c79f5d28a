//! Broker and registry connection.
//!
//! Holds one long-lived admin handle for metadata. Consumers are created per
//! operation and dropped when it completes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kafka_types::Offset;
use rdkafka::admin::AdminClient;
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::Consumer as RdkafkaConsumer;
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::metadata::Metadata;
use rdkafka::{Offset as RdkafkaOffset, TopicPartitionList};
use schema_registry::{
    fetch_parsed_schema, schemas_for_topic, RegistryClient, Schema, SchemaCache, SchemaRegistry,
};
use tracing::debug;

use crate::assignment::build_assignment;
use crate::config::ConnectionConfig;
use crate::consumer::{from_lookup_offset, KafkaConsumer};
use crate::error::{Error, Result};
use crate::reader::{BatchReader, ReadRequest};

/// Partition list of a topic as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TopicMetadata {
    pub error: Option<RDKafkaErrorCode>,
    /// (partition id, partition error)
    pub partitions: Vec<(i32, Option<RDKafkaErrorCode>)>,
}

impl TopicMetadata {
    fn find(metadata: &Metadata, topic: &str) -> Option<Self> {
        let topic = metadata.topics().iter().find(|t| t.name() == topic)?;
        Some(Self {
            error: topic.error().map(RDKafkaErrorCode::from),
            partitions: topic
                .partitions()
                .iter()
                .map(|p| (p.id(), p.error().map(RDKafkaErrorCode::from)))
                .collect(),
        })
    }
}

/// Sorted partition ids of `topic`, or the first metadata error.
pub(crate) fn partition_ids(topic: &str, metadata: Option<TopicMetadata>) -> Result<Vec<i32>> {
    let metadata = metadata.ok_or_else(|| Error::TopicNotFound(topic.to_string()))?;

    match metadata.error {
        None => {}
        Some(RDKafkaErrorCode::UnknownTopicOrPartition | RDKafkaErrorCode::UnknownTopic) => {
            return Err(Error::TopicNotFound(topic.to_string()))
        }
        Some(code) => {
            return Err(Error::TopicMetadata {
                topic: topic.to_string(),
                code,
            })
        }
    }

    let mut ids = Vec::with_capacity(metadata.partitions.len());
    for (partition, error) in metadata.partitions {
        if let Some(code) = error {
            return Err(Error::PartitionMetadata {
                topic: topic.to_string(),
                partition,
                code,
            });
        }
        ids.push(partition);
    }
    ids.sort_unstable();
    Ok(ids)
}

pub struct KafkaConnection<R: SchemaRegistry = RegistryClient> {
    config: ConnectionConfig,
    admin: AdminClient<DefaultClientContext>,
    registry: R,
}

impl KafkaConnection<RegistryClient> {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let registry = RegistryClient::new(&config.registry_config())?;
        Self::with_registry(config, registry)
    }
}

impl<R: SchemaRegistry> KafkaConnection<R> {
    /// Connect with a caller-provided registry.
    pub fn with_registry(config: ConnectionConfig, registry: R) -> Result<Self> {
        let admin: AdminClient<DefaultClientContext> = config.client_config()?.create()?;
        Ok(Self {
            config,
            admin,
            registry,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn partitions(&self, topic: &str) -> Result<Vec<i32>> {
        let metadata = self
            .admin
            .inner()
            .fetch_metadata(Some(topic), self.config.request_timeout())?;
        let partitions = partition_ids(topic, TopicMetadata::find(&metadata, topic))?;
        debug!("Topic {topic} has partitions {partitions:?}");
        Ok(partitions)
    }

    /// Low and high watermark of one partition.
    pub fn watermarks(&self, topic: &str, partition: i32) -> Result<(i64, i64)> {
        let consumer = KafkaConsumer::new(&self.config)?;
        let watermarks =
            consumer
                .inner()
                .fetch_watermarks(topic, partition, self.config.request_timeout())?;
        Ok(watermarks)
    }

    /// Earliest offset at or after `time` for every partition of `topic`.
    ///
    /// Partitions whose last message is older than `time` resolve to
    /// [`Offset::End`].
    pub fn offsets_for_time(&self, topic: &str, time: DateTime<Utc>) -> Result<Vec<(i32, Offset)>> {
        let partitions = self.partitions(topic)?;

        let mut request = TopicPartitionList::new();
        for partition in &partitions {
            request.add_partition_offset(
                topic,
                *partition,
                RdkafkaOffset::Offset(time.timestamp_millis()),
            )?;
        }

        let consumer = KafkaConsumer::new(&self.config)?;
        let resolved = consumer
            .inner()
            .offsets_for_times(request, self.config.request_timeout())?;

        let mut offsets: Vec<(i32, Offset)> = resolved
            .elements()
            .iter()
            .map(|elem| (elem.partition(), from_lookup_offset(elem.offset())))
            .collect();
        offsets.sort_unstable_by_key(|(partition, _)| *partition);
        Ok(offsets)
    }

    pub fn schema_by_id(&self, id: u32) -> Result<Schema> {
        Ok(fetch_parsed_schema(&self.registry, id)?)
    }

    /// Avro schemas registered under the key and value subjects of `topic`.
    pub fn schemas_for_topic(&self, topic: &str) -> Result<HashMap<u32, Schema>> {
        Ok(schemas_for_topic(&self.registry, topic)?)
    }

    /// Start a consumption run with an empty schema cache.
    pub fn read(&self, request: ReadRequest) -> Result<BatchReader<'_, KafkaConsumer, R>> {
        self.read_with_cache(request, SchemaCache::new())
    }

    /// Start a consumption run reusing `cache`.
    pub fn read_with_cache(
        &self,
        request: ReadRequest,
        cache: SchemaCache,
    ) -> Result<BatchReader<'_, KafkaConsumer, R>> {
        let partitions = self.partitions(&request.topic)?;
        let assignment = build_assignment(
            &request.topic,
            &partitions,
            request.start_from,
            &request.partition_offsets,
        );
        let consumer = KafkaConsumer::new(&self.config)?;
        BatchReader::start(consumer, assignment, &self.registry, cache, request)
    }
}
