use std::time::Duration;

use kafka_types::{Header, Offset, Payload, RawMessage, Timestamp, TopicPartition};
use rdkafka::consumer::{BaseConsumer, Consumer as RdkafkaConsumer};
use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
use rdkafka::message::{BorrowedMessage, Headers, Message as RdkafkaMessage};
use rdkafka::{Offset as RdkafkaOffset, Timestamp as RdkafkaTimestamp, TopicPartitionList};

use crate::config::ConnectionConfig;
use crate::error::Result;

/// Outcome of a single poll.
#[derive(Debug)]
pub enum PollEvent {
    /// A data message
    Message(RawMessage),
    /// No more data is currently available on the partition
    EndOfPartition(TopicPartition),
    /// Error the client recovers from on its own
    Retriable(KafkaError),
    /// Error after which the client cannot be used
    Fatal(KafkaError),
}

/// Transport the batch engine reads from.
///
/// Implemented by [`KafkaConsumer`] and, for tests, by
/// [`ScriptedSource`](crate::testing::ScriptedSource).
pub trait MessageSource {
    fn assign(&mut self, assignment: &[(TopicPartition, Offset)]) -> KafkaResult<()>;

    /// Wait up to `timeout` for the next event. `None` means the wait timed out.
    fn poll(&mut self, timeout: Duration) -> Option<PollEvent>;

    fn unassign(&mut self, partition: &TopicPartition) -> KafkaResult<()>;

    /// Stop fetching on every assigned partition.
    fn pause(&mut self) -> KafkaResult<()>;

    fn resume(&mut self) -> KafkaResult<()>;
}

pub(crate) fn to_rdkafka_offset(offset: Offset) -> RdkafkaOffset {
    match offset {
        Offset::Beginning => RdkafkaOffset::Beginning,
        Offset::End => RdkafkaOffset::End,
        Offset::Stored => RdkafkaOffset::Stored,
        Offset::Invalid => RdkafkaOffset::Invalid,
        Offset::At(offset) => RdkafkaOffset::Offset(offset),
    }
}

/// Result of a time-based offset lookup. Anything but a literal offset
/// means the partition has no message at or after the requested time.
///
/// A resolved offset of 0 stays a literal offset; it is the first message.
pub(crate) fn from_lookup_offset(offset: RdkafkaOffset) -> Offset {
    match offset {
        RdkafkaOffset::Offset(offset) if offset >= 0 => Offset::At(offset),
        _ => Offset::End,
    }
}

fn to_timestamp(timestamp: RdkafkaTimestamp) -> Timestamp {
    match timestamp {
        RdkafkaTimestamp::NotAvailable => Timestamp::NotAvailable,
        RdkafkaTimestamp::CreateTime(millis) => Timestamp::source(millis),
        RdkafkaTimestamp::LogAppendTime(millis) => Timestamp::broker(millis),
    }
}

fn to_raw_message(message: &BorrowedMessage<'_>) -> RawMessage {
    let headers = message
        .headers()
        .map(|headers| {
            headers
                .iter()
                .map(|h| Header::new(h.key, h.value.map(<[u8]>::to_vec).unwrap_or_default()))
                .collect()
        })
        .unwrap_or_default();

    RawMessage {
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
        timestamp: to_timestamp(message.timestamp()),
        headers,
        key: message.key().map(|key| Payload::Bytes(key.to_vec())),
        value: message.payload().map(|value| Payload::Bytes(value.to_vec())),
    }
}

/// Read-only consumer over a manual assignment.
///
/// Never subscribes and never commits; positions come only from the
/// assignment it is given.
pub struct KafkaConsumer {
    consumer: BaseConsumer,
    /// Topic of the current assignment, used to name end-of-partition events
    topic: Option<String>,
}

impl KafkaConsumer {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let consumer: BaseConsumer = config.consumer_config()?.create()?;
        Ok(Self {
            consumer,
            topic: None,
        })
    }

    pub(crate) fn inner(&self) -> &BaseConsumer {
        &self.consumer
    }

    fn classify(&self, err: KafkaError) -> PollEvent {
        match err {
            KafkaError::PartitionEOF(partition) => {
                let topic = self.topic.clone().unwrap_or_default();
                PollEvent::EndOfPartition(TopicPartition::new(topic, partition))
            }
            err @ KafkaError::MessageConsumptionFatal(_) => PollEvent::Fatal(err),
            err if err.rdkafka_error_code() == Some(RDKafkaErrorCode::Fatal)
                || self.consumer.client().fatal_error().is_some() =>
            {
                PollEvent::Fatal(err)
            }
            err => PollEvent::Retriable(err),
        }
    }
}

impl MessageSource for KafkaConsumer {
    fn assign(&mut self, assignment: &[(TopicPartition, Offset)]) -> KafkaResult<()> {
        let mut tpl = TopicPartitionList::new();
        for (tp, offset) in assignment {
            tpl.add_partition_offset(&tp.topic, tp.partition, to_rdkafka_offset(*offset))?;
        }
        self.consumer.assign(&tpl)?;
        self.topic = assignment.first().map(|(tp, _)| tp.topic.clone());
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Option<PollEvent> {
        match self.consumer.poll(timeout)? {
            Ok(message) => Some(PollEvent::Message(to_raw_message(&message))),
            Err(err) => Some(self.classify(err)),
        }
    }

    fn unassign(&mut self, partition: &TopicPartition) -> KafkaResult<()> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition(&partition.topic, partition.partition);
        self.consumer.incremental_unassign(&tpl)
    }

    fn pause(&mut self) -> KafkaResult<()> {
        let assignment = self.consumer.assignment()?;
        self.consumer.pause(&assignment)
    }

    fn resume(&mut self) -> KafkaResult<()> {
        let assignment = self.consumer.assignment()?;
        self.consumer.resume(&assignment)
    }
}
