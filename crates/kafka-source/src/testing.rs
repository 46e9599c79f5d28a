//! Broker-free transport for tests.
//!
//! [`ScriptedSource`] replays a fixed list of poll results and records the
//! calls the engine makes on it. The record is shared through
//! [`SourceCalls`] so it stays readable after the engine drops the source.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use kafka_types::{Offset, RawMessage, TopicPartition};
use rdkafka::error::{KafkaError, KafkaResult};

use crate::consumer::{MessageSource, PollEvent};

/// Calls observed by a [`ScriptedSource`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceCalls {
    pub assigned: Vec<(TopicPartition, Offset)>,
    pub unassigned: Vec<TopicPartition>,
    pub pauses: usize,
    pub resumes: usize,
    /// Number of polls answered from the script
    pub polls: usize,
    /// Set when the source is dropped
    pub closed: bool,
}

#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Option<PollEvent>>,
    calls: Rc<RefCell<SourceCalls>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the calls made on this source.
    pub fn calls(&self) -> Rc<RefCell<SourceCalls>> {
        Rc::clone(&self.calls)
    }

    pub fn message(mut self, message: RawMessage) -> Self {
        self.script.push_back(Some(PollEvent::Message(message)));
        self
    }

    pub fn messages(self, messages: impl IntoIterator<Item = RawMessage>) -> Self {
        messages.into_iter().fold(self, Self::message)
    }

    pub fn end_of_partition(mut self, topic: &str, partition: i32) -> Self {
        self.script
            .push_back(Some(PollEvent::EndOfPartition(TopicPartition::new(topic, partition))));
        self
    }

    /// A poll that times out without an event.
    pub fn timeout(mut self) -> Self {
        self.script.push_back(None);
        self
    }

    pub fn retriable(mut self, err: KafkaError) -> Self {
        self.script.push_back(Some(PollEvent::Retriable(err)));
        self
    }

    pub fn fatal(mut self, err: KafkaError) -> Self {
        self.script.push_back(Some(PollEvent::Fatal(err)));
        self
    }
}

impl MessageSource for ScriptedSource {
    fn assign(&mut self, assignment: &[(TopicPartition, Offset)]) -> KafkaResult<()> {
        self.calls.borrow_mut().assigned = assignment.to_vec();
        Ok(())
    }

    /// Panics when the script runs out, so a test that would otherwise
    /// poll forever fails instead.
    fn poll(&mut self, _timeout: Duration) -> Option<PollEvent> {
        self.calls.borrow_mut().polls += 1;
        match self.script.pop_front() {
            Some(event) => event,
            None => panic!("ScriptedSource polled after the end of its script"),
        }
    }

    fn unassign(&mut self, partition: &TopicPartition) -> KafkaResult<()> {
        self.calls.borrow_mut().unassigned.push(partition.clone());
        Ok(())
    }

    fn pause(&mut self) -> KafkaResult<()> {
        self.calls.borrow_mut().pauses += 1;
        Ok(())
    }

    fn resume(&mut self) -> KafkaResult<()> {
        self.calls.borrow_mut().resumes += 1;
        Ok(())
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.calls.borrow_mut().closed = true;
    }
}
