//! Batch consumption engine.
//!
//! A [`BatchReader`] drains every partition of one topic from a starting
//! assignment until each partition reports end-of-partition. It is a pull
//! based iterator: nothing is polled between calls to `next`, and the
//! transport is paused while the caller holds a full batch.
//!
//! ```text
//! poll ─┬─ Message         → decode → transform → batch (flush when full)
//!       ├─ EndOfPartition  → unassign; last one flushes and ends the run
//!       ├─ Retriable       → log, keep polling
//!       └─ Fatal           → flush pending batch, then yield the error
//! ```

use std::fmt;
use std::iter::FusedIterator;
use std::time::Duration;

use kafka_types::{
    DecodeFailure, DeserializationKind, KafkaRecord, Offset, RawMessage, TopicPartition,
};
use schema_registry::{SchemaCache, SchemaRegistry};
use tracing::{debug, error, info, warn};

use crate::assignment::{Assignment, StartFrom};
use crate::consumer::{MessageSource, PollEvent};
use crate::deserializer::Deserializers;
use crate::error::{Error, Result};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// Caller-supplied record transform, applied before a record joins a batch.
pub type RecordTransform = Box<dyn FnMut(KafkaRecord) -> anyhow::Result<KafkaRecord>>;

/// What to do with a message whose key or value cannot be deserialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeErrorPolicy {
    /// Put the failure in the batch and keep consuming
    #[default]
    Report,
    /// End the run with the failure, after flushing the pending batch
    Fail,
}

/// Parameters of one consumption run.
pub struct ReadRequest {
    pub topic: String,
    pub start_from: StartFrom,
    /// Per-partition starting offsets; other partitions use `start_from`
    pub partition_offsets: Vec<(i32, Offset)>,
    pub key_kind: Option<DeserializationKind>,
    pub value_kind: Option<DeserializationKind>,
    pub batch_size: usize,
    pub poll_timeout: Duration,
    pub decode_error_policy: DecodeErrorPolicy,
    transform: Option<RecordTransform>,
}

impl ReadRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            start_from: StartFrom::Beginning,
            partition_offsets: Vec::new(),
            key_kind: None,
            value_kind: None,
            batch_size: DEFAULT_BATCH_SIZE,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            decode_error_policy: DecodeErrorPolicy::Report,
            transform: None,
        }
    }

    pub fn start_from(mut self, start_from: StartFrom) -> Self {
        self.start_from = start_from;
        self
    }

    pub fn partition_offsets(mut self, offsets: Vec<(i32, Offset)>) -> Self {
        self.partition_offsets = offsets;
        self
    }

    pub fn key_kind(mut self, kind: Option<DeserializationKind>) -> Self {
        self.key_kind = kind;
        self
    }

    pub fn value_kind(mut self, kind: Option<DeserializationKind>) -> Self {
        self.value_kind = kind;
        self
    }

    /// Maximum number of entries per batch. Zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn decode_error_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.decode_error_policy = policy;
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: FnMut(KafkaRecord) -> anyhow::Result<KafkaRecord> + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Whether Avro schemas for the topic should be loaded before polling.
    pub fn needs_registry_schemas(&self) -> bool {
        [self.key_kind, self.value_kind]
            .iter()
            .flatten()
            .any(|kind| kind.needs_registry_schemas())
    }
}

impl fmt::Debug for ReadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadRequest")
            .field("topic", &self.topic)
            .field("start_from", &self.start_from)
            .field("partition_offsets", &self.partition_offsets)
            .field("key_kind", &self.key_kind)
            .field("value_kind", &self.value_kind)
            .field("batch_size", &self.batch_size)
            .field("poll_timeout", &self.poll_timeout)
            .field("decode_error_policy", &self.decode_error_policy)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Records decoded since the previous flush, plus messages that failed to decode.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: Vec<KafkaRecord>,
    pub failures: Vec<DecodeFailure>,
}

impl Batch {
    /// Number of consumed messages in the batch, decoded or not.
    pub fn len(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.failures.is_empty()
    }
}

/// Counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    /// Polls that returned an event of any kind
    pub events: u64,
    /// Polls that timed out without an event
    pub empty_polls: u64,
    pub records: u64,
    pub failures: u64,
    pub batches: u64,
}

enum State {
    Running,
    /// The pending batch was flushed; the error is yielded next
    Failing(Error),
    Done,
}

/// Pull-based iterator over the batches of one consumption run.
///
/// Not restartable: once it returns `None` (or an error) a new run needs a
/// new reader.
pub struct BatchReader<'r, S: MessageSource, R: SchemaRegistry + ?Sized> {
    /// Dropped as soon as the run ends
    source: Option<S>,
    registry: &'r R,
    cache: SchemaCache,
    assignment: Vec<TopicPartition>,
    key_kind: Option<DeserializationKind>,
    value_kind: Option<DeserializationKind>,
    batch_size: usize,
    poll_timeout: Duration,
    policy: DecodeErrorPolicy,
    transform: Option<RecordTransform>,
    batch: Batch,
    paused: bool,
    state: State,
    stats: ReadStats,
}

impl<'r, S: MessageSource, R: SchemaRegistry + ?Sized> BatchReader<'r, S, R> {
    /// Pre-warm the schema cache when Avro decoding is requested, then
    /// assign `source` to `assignment`.
    pub fn start(
        mut source: S,
        assignment: Assignment,
        registry: &'r R,
        mut cache: SchemaCache,
        request: ReadRequest,
    ) -> Result<Self> {
        if request.needs_registry_schemas() {
            cache.prewarm_topic(&request.topic, registry)?;
        }

        let live: Vec<TopicPartition> = assignment.iter().map(|(tp, _)| tp.clone()).collect();

        let (source, state) = if live.is_empty() {
            info!("Topic {} has no partitions to read", request.topic);
            (None, State::Done)
        } else {
            source.assign(&assignment)?;
            for (tp, offset) in &assignment {
                info!("Assigned {tp} from offset {offset}");
            }
            (Some(source), State::Running)
        };

        Ok(Self {
            source,
            registry,
            cache,
            assignment: live,
            key_kind: request.key_kind,
            value_kind: request.value_kind,
            batch_size: request.batch_size.max(1),
            poll_timeout: request.poll_timeout,
            policy: request.decode_error_policy,
            transform: request.transform,
            batch: Batch::default(),
            paused: false,
            state,
            stats: ReadStats::default(),
        })
    }

    /// Number of partitions not yet at end-of-partition.
    pub fn assignment_count(&self) -> usize {
        self.assignment.len()
    }

    /// Partitions not yet at end-of-partition.
    pub fn assignment(&self) -> &[TopicPartition] {
        &self.assignment
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Hand back the schema cache for reuse in a later run.
    pub fn into_cache(self) -> SchemaCache {
        self.cache
    }

    fn take_batch(&mut self) -> Batch {
        self.stats.batches += 1;
        std::mem::take(&mut self.batch)
    }

    fn close(&mut self) {
        if self.source.take().is_some() {
            info!("Completed with {} events consumed", self.stats.events);
            if self.stats.empty_polls > 0 {
                warn!("Found {} empty polls", self.stats.empty_polls);
            }
        }
    }

    /// End the run normally, flushing whatever is pending.
    fn finish(&mut self) -> Option<Result<Batch>> {
        self.close();
        self.state = State::Done;
        Some(Ok(self.take_batch()))
    }

    /// End the run with `err`: flush the pending batch now, yield the error next.
    fn bail(&mut self, err: Error) -> Option<Result<Batch>> {
        error!("Bailing out: {err}");
        self.close();
        self.state = State::Failing(err);
        Some(Ok(self.take_batch()))
    }

    fn process(&mut self, message: RawMessage) -> Result<()> {
        let mut deserializers = Deserializers::new(&mut self.cache, self.registry);
        match KafkaRecord::build(message, self.key_kind, self.value_kind, &mut deserializers) {
            Ok(record) => {
                let record = match self.transform.as_mut() {
                    Some(transform) => transform(record).map_err(Error::Transform)?,
                    None => record,
                };
                self.batch.records.push(record);
                self.stats.records += 1;
            }
            Err(failure) => match self.policy {
                DecodeErrorPolicy::Report => {
                    warn!("{failure}");
                    self.batch.failures.push(failure);
                    self.stats.failures += 1;
                }
                DecodeErrorPolicy::Fail => return Err(Error::Deserialization(failure)),
            },
        }
        Ok(())
    }

    fn end_of_partition(&mut self, partition: TopicPartition) -> Result<()> {
        let Some(position) = self.assignment.iter().position(|tp| *tp == partition) else {
            debug!("End of partition {partition}, which is no longer assigned");
            return Ok(());
        };
        self.assignment.remove(position);
        if let Some(source) = self.source.as_mut() {
            source.unassign(&partition)?;
        }
        info!(
            "Reached end of {partition}, {} partitions left",
            self.assignment.len()
        );
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) -> Result<()> {
        if self.paused == paused {
            return Ok(());
        }
        if let Some(source) = self.source.as_mut() {
            if paused {
                source.pause()?;
            } else {
                source.resume()?;
            }
        }
        self.paused = paused;
        Ok(())
    }
}

impl<S: MessageSource, R: SchemaRegistry + ?Sized> Iterator for BatchReader<'_, S, R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => return None,
            State::Failing(err) => return Some(Err(err)),
            State::Running => self.state = State::Running,
        }

        if let Err(err) = self.set_paused(false) {
            return self.bail(err);
        }

        loop {
            let event = match self.source.as_mut() {
                Some(source) => source.poll(self.poll_timeout),
                None => return self.finish(),
            };

            let Some(event) = event else {
                self.stats.empty_polls += 1;
                continue;
            };
            self.stats.events += 1;

            match event {
                PollEvent::Fatal(err) => return self.bail(Error::FatalTransport(err)),
                PollEvent::Retriable(err) => error!("Kafka error: {err}"),
                PollEvent::EndOfPartition(partition) => {
                    if let Err(err) = self.end_of_partition(partition) {
                        return self.bail(err);
                    }
                    if self.assignment.is_empty() {
                        return self.finish();
                    }
                }
                PollEvent::Message(message) => {
                    if let Err(err) = self.process(message) {
                        return self.bail(err);
                    }
                    if self.batch.len() >= self.batch_size {
                        info!("Yielding batch of {} messages", self.batch.len());
                        if let Err(err) = self.set_paused(true) {
                            return self.bail(err);
                        }
                        return Some(Ok(self.take_batch()));
                    }
                }
            }
        }
    }
}

impl<S: MessageSource, R: SchemaRegistry + ?Sized> FusedIterator for BatchReader<'_, S, R> {}
