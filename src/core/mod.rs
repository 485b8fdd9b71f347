//! Core module - scoring, queueing and group selection.
//!
//! This module contains the heart of the triage simulator:
//! - Keyword scorer and scored messages
//! - Shared priority queue
//! - Group selectors over the modal priority tier

pub mod message;
pub mod queue;
pub mod selection;

pub use message::{default_keywords, Message, Scorer};
pub use queue::PriorityQueue;
pub use selection::{
    first_and_last, longest_and_shortest, modal_priority_group, select, SelectionPolicy,
};
