//! Partition assignment builder.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use kafka_types::{Offset, TopicPartition};
use tracing::debug;

/// Starting position for partitions without an explicit offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartFrom {
    #[default]
    Beginning,
    End,
}

impl From<StartFrom> for Offset {
    fn from(start: StartFrom) -> Self {
        match start {
            StartFrom::Beginning => Offset::Beginning,
            StartFrom::End => Offset::End,
        }
    }
}

impl fmt::Display for StartFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartFrom::Beginning => f.write_str("beginning"),
            StartFrom::End => f.write_str("end"),
        }
    }
}

impl FromStr for StartFrom {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginning" | "earliest" => Ok(StartFrom::Beginning),
            "end" | "latest" => Ok(StartFrom::End),
            other => Err(format!(
                "Invalid start position '{other}': expected 'beginning' or 'end'"
            )),
        }
    }
}

/// One starting offset per partition of a topic.
pub type Assignment = Vec<(TopicPartition, Offset)>;

/// Build the initial assignment for `topic`.
///
/// Partitions listed in `overrides` start at their given offset, all others
/// at `default`. Overrides naming partitions the topic does not have are
/// ignored. When a partition is overridden more than once the last entry
/// wins.
pub fn build_assignment(
    topic: &str,
    partitions: &[i32],
    default: StartFrom,
    overrides: &[(i32, Offset)],
) -> Assignment {
    let overrides: HashMap<i32, Offset> = overrides.iter().copied().collect();

    for partition in overrides.keys() {
        if !partitions.contains(partition) {
            debug!("Ignoring offset for unknown partition {partition} of topic {topic}");
        }
    }

    partitions
        .iter()
        .map(|&partition| {
            let offset = overrides
                .get(&partition)
                .copied()
                .unwrap_or_else(|| default.into());
            (TopicPartition::new(topic, partition), offset)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offset_for_every_partition() {
        let assignment = build_assignment("t", &[0, 1, 2], StartFrom::End, &[]);
        assert_eq!(assignment.len(), 3);
        assert!(assignment.iter().all(|(_, offset)| *offset == Offset::End));
        assert_eq!(assignment[2].0, TopicPartition::new("t", 2));
    }

    #[test]
    fn test_overrides_replace_default() {
        let assignment = build_assignment(
            "t",
            &[0, 1],
            StartFrom::Beginning,
            &[(1, Offset::At(42))],
        );
        assert_eq!(
            assignment,
            vec![
                (TopicPartition::new("t", 0), Offset::Beginning),
                (TopicPartition::new("t", 1), Offset::At(42)),
            ]
        );
    }

    #[test]
    fn test_unknown_override_partitions_ignored() {
        let assignment = build_assignment(
            "t",
            &[0],
            StartFrom::Beginning,
            &[(7, Offset::At(1)), (0, Offset::Stored)],
        );
        assert_eq!(
            assignment,
            vec![(TopicPartition::new("t", 0), Offset::Stored)]
        );
    }

    #[test]
    fn test_last_override_wins() {
        let assignment = build_assignment(
            "t",
            &[0],
            StartFrom::Beginning,
            &[(0, Offset::At(1)), (0, Offset::At(5))],
        );
        assert_eq!(assignment[0].1, Offset::At(5));
    }

    #[test]
    fn test_no_partitions_no_assignment() {
        assert!(build_assignment("t", &[], StartFrom::Beginning, &[(0, Offset::End)]).is_empty());
    }

    #[test]
    fn test_start_from_parse() {
        assert_eq!("earliest".parse::<StartFrom>(), Ok(StartFrom::Beginning));
        assert_eq!("END".parse::<StartFrom>(), Ok(StartFrom::End));
        assert!("middle".parse::<StartFrom>().is_err());
    }
}
