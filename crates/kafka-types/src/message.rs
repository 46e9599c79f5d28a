//! Kafka message types.
//!
//! Transport-independent representation of what a broker hands back on poll.
//! The kafka-source crate converts rdkafka messages into these; tests build
//! them directly.

use std::fmt;
use std::str::FromStr;

/// A (topic, partition) pair. Identity is the pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.topic, self.partition)
    }
}

/// A position within a partition.
///
/// Either a literal offset or one of the logical sentinels that the broker
/// resolves at assignment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Offset {
    /// First available message of the partition
    Beginning,
    /// One past the last message of the partition
    End,
    /// Offset committed for the consumer group
    Stored,
    /// No valid offset
    Invalid,
    /// Literal offset (>= 0)
    At(i64),
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Beginning => write!(f, "beginning"),
            Offset::End => write!(f, "end"),
            Offset::Stored => write!(f, "stored"),
            Offset::Invalid => write!(f, "invalid"),
            Offset::At(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for Offset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginning" | "earliest" => Ok(Offset::Beginning),
            "end" | "latest" => Ok(Offset::End),
            "stored" => Ok(Offset::Stored),
            "invalid" => Ok(Offset::Invalid),
            other => match other.parse::<i64>() {
                Ok(offset) if offset >= 0 => Ok(Offset::At(offset)),
                Ok(offset) => Err(format!("Offset must be non-negative, got {offset}")),
                Err(_) => Err(format!(
                    "Invalid offset '{s}': expected a number, 'beginning', 'end', 'stored' or 'invalid'"
                )),
            },
        }
    }
}

/// Where the timestamp of a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampType {
    /// Set by the producer
    Source,
    /// Set by the broker when appending to the log
    Broker,
}

impl TimestampType {
    /// Label written to the output record.
    pub fn label(&self) -> &'static str {
        match self {
            TimestampType::Source => "SOURCE",
            TimestampType::Broker => "BROKER",
        }
    }
}

/// Message timestamp with provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    NotAvailable,
    /// Milliseconds since epoch
    Available {
        millis: i64,
        kind: TimestampType,
    },
}

impl Timestamp {
    pub fn source(millis: i64) -> Self {
        Timestamp::Available {
            millis,
            kind: TimestampType::Source,
        }
    }

    pub fn broker(millis: i64) -> Self {
        Timestamp::Available {
            millis,
            kind: TimestampType::Broker,
        }
    }

    pub fn millis(&self) -> Option<i64> {
        match self {
            Timestamp::NotAvailable => None,
            Timestamp::Available { millis, .. } => Some(*millis),
        }
    }

    pub fn kind(&self) -> Option<TimestampType> {
        match self {
            Timestamp::NotAvailable => None,
            Timestamp::Available { kind, .. } => Some(*kind),
        }
    }
}

/// Key or value payload of a message.
///
/// Brokers deliver bytes; `Text` covers payloads already decoded upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
}

/// A single message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: Vec<u8>,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A message as delivered by the transport, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: Timestamp,
    pub headers: Vec<Header>,
    pub key: Option<Payload>,
    pub value: Option<Payload>,
}

impl RawMessage {
    /// Create a message with no key, value, headers or timestamp.
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            timestamp: Timestamp::NotAvailable,
            headers: Vec::new(),
            key: None,
            value: None,
        }
    }

    pub fn with_key(mut self, key: Payload) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_value(mut self, value: Payload) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    pub fn topic_partition(&self) -> TopicPartition {
        TopicPartition::new(self.topic.clone(), self.partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_from_str_sentinels() {
        assert_eq!("beginning".parse::<Offset>().unwrap(), Offset::Beginning);
        assert_eq!("earliest".parse::<Offset>().unwrap(), Offset::Beginning);
        assert_eq!("END".parse::<Offset>().unwrap(), Offset::End);
        assert_eq!("stored".parse::<Offset>().unwrap(), Offset::Stored);
        assert_eq!("invalid".parse::<Offset>().unwrap(), Offset::Invalid);
    }

    #[test]
    fn test_offset_from_str_literal() {
        assert_eq!("42".parse::<Offset>().unwrap(), Offset::At(42));
        assert_eq!("0".parse::<Offset>().unwrap(), Offset::At(0));
    }

    #[test]
    fn test_offset_from_str_rejects_negative_and_garbage() {
        assert!("-1".parse::<Offset>().is_err());
        assert!("soon".parse::<Offset>().is_err());
    }

    #[test]
    fn test_timestamp_accessors() {
        let ts = Timestamp::broker(1_700_000_000_000);
        assert_eq!(ts.millis(), Some(1_700_000_000_000));
        assert_eq!(ts.kind(), Some(TimestampType::Broker));
        assert_eq!(Timestamp::NotAvailable.millis(), None);
        assert_eq!(Timestamp::NotAvailable.kind(), None);
    }

    #[test]
    fn test_topic_partition_display() {
        assert_eq!(TopicPartition::new("orders", 3).to_string(), "orders[3]");
    }
}
