//! kafka-batch-reader library
//!
//! Reads a Kafka topic from caller-chosen offsets to the end of every
//! partition and hands the messages back as bounded batches of flat,
//! decoded records. Nothing is ever committed to the broker.
//!
//! # Crates
//!
//! - `kafka_types` - message model, wire framing, deserializers, output records
//! - `schema_registry` - registry client and schema cache
//! - `kafka_source` - connection, assignment builder and the batch engine
//!
//! # CLI Usage
//!
//! ```bash
//! # Partitions and watermarks
//! kafka-batch-reader --brokers localhost:9092 --schema-registry-url http://localhost:8081 \
//!   partitions --topic events
//!
//! # Drain a topic as JSON lines, decoding Avro values
//! kafka-batch-reader --brokers localhost:9092 --schema-registry-url http://localhost:8081 \
//!   read --topic events --value-kind confluent-avro --offset 0=1200
//! ```

pub mod output;
pub mod read;

pub use read::{parse_partition_offset, ReadArgs};

// Re-export the library crates for convenience
pub use kafka_source;
pub use kafka_types;
pub use schema_registry;

use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber. Logs go to stderr so stdout can carry
/// records. The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
