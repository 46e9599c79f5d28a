//! JSON-lines output.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use anyhow::Context;
use kafka_source::Batch;
use kafka_types::Offset;
use schema_registry::Schema;
use serde::Serialize;
use tracing::warn;

/// Write every record of `batch` as one JSON line. Decode failures are
/// logged, not written. Returns the number of records written.
pub fn write_batch<W: Write>(out: &mut W, batch: &Batch) -> anyhow::Result<usize> {
    for failure in &batch.failures {
        warn!("Skipping message: {failure}");
    }
    for record in &batch.records {
        serde_json::to_writer(&mut *out, record).context("Failed to serialize record")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(batch.records.len())
}

#[derive(Serialize)]
struct PartitionOffset {
    partition: i32,
    offset: String,
}

pub fn write_offsets<W: Write>(out: &mut W, offsets: &[(i32, Offset)]) -> anyhow::Result<()> {
    for (partition, offset) in offsets {
        let line = PartitionOffset {
            partition: *partition,
            offset: offset.to_string(),
        };
        serde_json::to_writer(&mut *out, &line)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SchemaEntry<'a> {
    id: u32,
    schema: &'a Schema,
}

/// One line per schema, ordered by id.
pub fn write_schemas<W: Write>(out: &mut W, schemas: &HashMap<u32, Schema>) -> anyhow::Result<()> {
    let ordered: BTreeMap<u32, &Schema> = schemas.iter().map(|(id, s)| (*id, s)).collect();
    for (id, schema) in ordered {
        serde_json::to_writer(&mut *out, &SchemaEntry { id, schema })?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
