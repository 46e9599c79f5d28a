//! Arguments of the `read` command.

use std::time::Duration;

use clap::Parser;
use kafka_source::{DecodeErrorPolicy, ReadRequest, StartFrom, DEFAULT_BATCH_SIZE};
use kafka_types::{DeserializationKind, Offset};

/// Parse `PARTITION=OFFSET`, e.g. `3=1200` or `0=end`.
pub fn parse_partition_offset(s: &str) -> Result<(i32, Offset), String> {
    let (partition, offset) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid partition offset '{s}': expected PARTITION=OFFSET"))?;
    let partition: i32 = partition
        .trim()
        .parse()
        .map_err(|e| format!("Invalid partition '{partition}': {e}"))?;
    if partition < 0 {
        return Err(format!("Partition must be non-negative, got {partition}"));
    }
    Ok((partition, offset.parse()?))
}

#[derive(Debug, Clone, Parser)]
pub struct ReadArgs {
    /// Topic to read
    #[arg(long)]
    pub topic: String,

    /// Where partitions without an explicit offset start: beginning or end
    #[arg(long, default_value = "beginning")]
    pub start_from: StartFrom,

    /// Starting offset for one partition (PARTITION=OFFSET, repeatable)
    #[arg(long = "offset", value_name = "PARTITION=OFFSET", value_parser = parse_partition_offset)]
    pub offsets: Vec<(i32, Offset)>,

    /// Key deserializer: str, json, confluent-json or confluent-avro
    #[arg(long)]
    pub key_kind: Option<DeserializationKind>,

    /// Value deserializer: str, json, confluent-json or confluent-avro
    #[arg(long)]
    pub value_kind: Option<DeserializationKind>,

    /// Maximum number of messages per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// How long a single poll waits for a message
    #[arg(long, default_value_t = 10)]
    pub poll_timeout_secs: u64,

    /// Stop at the first message that cannot be deserialized
    #[arg(long)]
    pub fail_on_decode_error: bool,
}

impl ReadArgs {
    pub fn to_request(&self) -> ReadRequest {
        let policy = if self.fail_on_decode_error {
            DecodeErrorPolicy::Fail
        } else {
            DecodeErrorPolicy::Report
        };

        ReadRequest::new(&self.topic)
            .start_from(self.start_from)
            .partition_offsets(self.offsets.clone())
            .key_kind(self.key_kind)
            .value_kind(self.value_kind)
            .batch_size(self.batch_size)
            .poll_timeout(Duration::from_secs(self.poll_timeout_secs))
            .decode_error_policy(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partition_offset() {
        assert_eq!(parse_partition_offset("3=1200"), Ok((3, Offset::At(1200))));
        assert_eq!(parse_partition_offset("0=end"), Ok((0, Offset::End)));
        assert_eq!(parse_partition_offset(" 1 = beginning"), Ok((1, Offset::Beginning)));
        assert!(parse_partition_offset("3").is_err());
        assert!(parse_partition_offset("x=1").is_err());
        assert!(parse_partition_offset("-1=1").is_err());
        assert!(parse_partition_offset("1=-5").is_err());
    }

    #[test]
    fn test_args_to_request() {
        let args = ReadArgs::parse_from([
            "read",
            "--topic",
            "events",
            "--start-from",
            "end",
            "--offset",
            "0=10",
            "--offset",
            "2=beginning",
            "--value-kind",
            "registry-framed-binary",
            "--batch-size",
            "50",
            "--fail-on-decode-error",
        ]);
        let request = args.to_request();

        assert_eq!(request.topic, "events");
        assert_eq!(request.start_from, StartFrom::End);
        assert_eq!(
            request.partition_offsets,
            vec![(0, Offset::At(10)), (2, Offset::Beginning)]
        );
        assert_eq!(request.key_kind, None);
        assert_eq!(
            request.value_kind,
            Some(DeserializationKind::RegistryFramedAvro)
        );
        assert_eq!(request.batch_size, 50);
        assert_eq!(request.decode_error_policy, DecodeErrorPolicy::Fail);
        assert!(request.needs_registry_schemas());
    }

    #[test]
    fn test_args_defaults() {
        let request = ReadArgs::parse_from(["read", "--topic", "t"]).to_request();
        assert_eq!(request.start_from, StartFrom::Beginning);
        assert_eq!(request.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(request.poll_timeout, Duration::from_secs(10));
        assert_eq!(request.decode_error_policy, DecodeErrorPolicy::Report);
        assert!(!request.needs_registry_schemas());
    }
}
