//! Command-line interface for kafka-batch-reader
//!
//! Connection settings come from flags or the `KAFKA_*` environment
//! variables and go before the subcommand. Results are written to stdout as
//! JSON lines; logs go to stderr.
//!
//! # Usage Examples
//!
//! ```bash
//! export KAFKA_BROKERS=localhost:9092
//! export KAFKA_SCHEMA_REGISTRY=http://localhost:8081
//!
//! kafka-batch-reader partitions --topic events
//! kafka-batch-reader watermarks --topic events --partition 0
//! kafka-batch-reader offsets-at --topic events --time 2024-01-01T00:00:00Z
//! kafka-batch-reader schemas --topic events
//! kafka-batch-reader read --topic events --key-kind str --value-kind confluent-avro
//! ```

use std::collections::HashMap;
use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use kafka_batch_reader::{init_logging, output, ReadArgs};
use kafka_source::{ConnectionConfig, KafkaConnection};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "kafka-batch-reader")]
#[command(about = "Read Kafka topics in batches without committing offsets")]
#[command(long_about = None)]
struct Cli {
    /// Broker and registry connection options
    #[command(flatten)]
    connection: ConnectionConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the partitions of a topic
    Partitions {
        #[arg(long)]
        topic: String,
    },

    /// Show the low and high watermark of a partition
    Watermarks {
        #[arg(long)]
        topic: String,

        #[arg(long)]
        partition: i32,
    },

    /// Resolve, per partition, the first offset at or after a point in time
    OffsetsAt {
        #[arg(long)]
        topic: String,

        /// RFC 3339 timestamp, e.g. 2024-01-01T00:00:00Z
        #[arg(long)]
        time: DateTime<Utc>,
    },

    /// Print Avro schemas registered for a topic, or one schema by id
    Schemas {
        #[arg(long)]
        topic: Option<String>,

        #[arg(long, conflicts_with = "topic")]
        id: Option<u32>,
    },

    /// Read a topic to the end of every partition, one record per line
    Read(ReadArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq)]
enum SchemaLookup {
    Topic(String),
    Id(u32),
}

fn schema_lookup(topic: Option<String>, id: Option<u32>) -> anyhow::Result<SchemaLookup> {
    match (topic, id) {
        (_, Some(id)) => Ok(SchemaLookup::Id(id)),
        (Some(topic), None) => Ok(SchemaLookup::Topic(topic)),
        (None, None) => anyhow::bail!("Either --topic or --id is required"),
    }
}

fn run() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let connection =
        KafkaConnection::new(cli.connection).context("Failed to set up Kafka connection")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Partitions { topic } => {
            let partitions = connection
                .partitions(&topic)
                .with_context(|| format!("Failed to list partitions of {topic}"))?;
            serde_json::to_writer(&mut out, &partitions)?;
            writeln!(out)?;
        }
        Commands::Watermarks { topic, partition } => {
            let (low, high) = connection
                .watermarks(&topic, partition)
                .with_context(|| format!("Failed to fetch watermarks of {topic}[{partition}]"))?;
            serde_json::to_writer(&mut out, &serde_json::json!({ "low": low, "high": high }))?;
            writeln!(out)?;
        }
        Commands::OffsetsAt { topic, time } => {
            let offsets = connection
                .offsets_for_time(&topic, time)
                .with_context(|| format!("Failed to resolve offsets of {topic} at {time}"))?;
            output::write_offsets(&mut out, &offsets)?;
        }
        Commands::Schemas { topic, id } => {
            let schemas = match schema_lookup(topic, id)? {
                SchemaLookup::Id(id) => {
                    let schema = connection
                        .schema_by_id(id)
                        .with_context(|| format!("Failed to fetch schema {id}"))?;
                    HashMap::from([(id, schema)])
                }
                SchemaLookup::Topic(topic) => connection
                    .schemas_for_topic(&topic)
                    .with_context(|| format!("Failed to fetch schemas of {topic}"))?,
            };
            output::write_schemas(&mut out, &schemas)?;
        }
        Commands::Read(args) => {
            let mut reader = connection
                .read(args.to_request())
                .with_context(|| format!("Failed to start reading {}", args.topic))?;

            let mut written = 0;
            for batch in &mut reader {
                let batch = batch.with_context(|| format!("Reading {} aborted", args.topic))?;
                written += output::write_batch(&mut out, &batch)?;
            }

            let stats = reader.stats();
            info!(
                "Wrote {written} records in {} batches from {}",
                stats.batches, args.topic
            );
            if stats.failures > 0 {
                warn!("{} messages could not be deserialized", stats.failures);
            }
        }
    }

    Ok(())
}
