//! In-memory priority queue shared between agents.
//!
//! Ordering:
//! - Higher priority first
//! - Equal priorities keep insertion order
//!
//! Every operation takes the queue lock exactly once, so concurrent callers
//! observe a single sequential history.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::message::Message;
use crate::error::{Error, Result};

/// Sort key: descending priority, then ascending insertion sequence.
type RankKey = (Reverse<u32>, u64);

/// A message together with its position in the queue ordering.
///
/// Used by the group selectors to move messages between queues without
/// losing their original insertion rank.
#[derive(Debug, Clone)]
pub(crate) struct Ranked {
    key: RankKey,
    pub(crate) message: Message,
}

#[derive(Debug, Default)]
struct QueueState {
    entries: BTreeMap<RankKey, Message>,
    next_seq: u64,
}

/// Thread-safe ordered multiset of scored messages.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    inner: Mutex<QueueState>,
}

impl PriorityQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue holding the given ranked entries.
    pub(crate) fn from_ranked(entries: impl IntoIterator<Item = Ranked>) -> Self {
        let queue = Self::new();
        queue.restore(entries);
        queue
    }

    // Every mutation is a single map operation, so a poisoned lock still
    // guards a consistent map.
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a message behind every message of equal or higher priority.
    pub fn insert(&self, message: Message) {
        let mut state = self.state();
        let seq = state.next_seq;
        state.next_seq += 1;
        tracing::debug!(
            "Enqueued message (priority {}, position {}): {}",
            message.priority(),
            seq,
            message
        );
        state.entries.insert((Reverse(message.priority()), seq), message);
    }

    /// Remove and return the front message.
    pub fn remove_highest(&self) -> Result<Message> {
        self.state()
            .entries
            .pop_first()
            .map(|(_, message)| message)
            .ok_or(Error::EmptyQueue)
    }

    /// Return a copy of the front message without removing it.
    pub fn peek_highest(&self) -> Result<Message> {
        self.state()
            .entries
            .first_key_value()
            .map(|(_, message)| message.clone())
            .ok_or(Error::EmptyQueue)
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    /// Messages from front to back.
    pub fn snapshot(&self) -> Vec<Message> {
        self.state().entries.values().cloned().collect()
    }

    /// Take every entry out of the queue, front to back.
    pub(crate) fn drain(&self) -> Vec<Ranked> {
        let entries = std::mem::take(&mut self.state().entries);
        entries
            .into_iter()
            .map(|(key, message)| Ranked { key, message })
            .collect()
    }

    /// Put entries back at their original rank.
    pub(crate) fn restore(&self, entries: impl IntoIterator<Item = Ranked>) {
        let mut state = self.state();
        for Ranked { key, message } in entries {
            state.next_seq = state.next_seq.max(key.1 + 1);
            state.entries.insert(key, message);
        }
    }
}

impl fmt::Display for PriorityQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let texts: Vec<String> = self.snapshot().iter().map(ToString::to_string).collect();
        write!(f, "[{}]", texts.join(", "))
    }
}
