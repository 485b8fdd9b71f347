//! Group selection over a priority queue.
//!
//! Each selector drains the source queue, carves out a group and puts every
//! other message back at its original rank. Selectors must not run while
//! agents are draining the same queue.

use clap::ValueEnum;
use std::collections::BTreeMap;
use std::fmt;

use super::queue::{PriorityQueue, Ranked};
use crate::error::{Error, Result};

/// Which messages a dispatch should service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelectionPolicy {
    /// Every queued message.
    All,
    /// The whole modal priority tier.
    Modal,
    /// First and last message of the modal tier.
    FirstLast,
    /// Longest and shortest message of the modal tier.
    LongestShortest,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::All => write!(f, "all"),
            SelectionPolicy::Modal => write!(f, "modal"),
            SelectionPolicy::FirstLast => write!(f, "first-last"),
            SelectionPolicy::LongestShortest => write!(f, "longest-shortest"),
        }
    }
}

/// Apply a selection policy, returning the group to dispatch.
///
/// `All` moves the whole queue into the group.
pub fn select(queue: &PriorityQueue, policy: SelectionPolicy) -> Result<PriorityQueue> {
    match policy {
        SelectionPolicy::All => {
            if queue.is_empty() {
                return Err(Error::EmptyQueue);
            }
            Ok(PriorityQueue::from_ranked(queue.drain()))
        }
        SelectionPolicy::Modal => modal_priority_group(queue),
        SelectionPolicy::FirstLast => first_and_last(queue),
        SelectionPolicy::LongestShortest => longest_and_shortest(queue),
    }
}

/// Priority value with the most messages. Ties go to the higher priority.
fn modal_priority(entries: &[Ranked]) -> Option<u32> {
    let mut tally: BTreeMap<u32, usize> = BTreeMap::new();
    for entry in entries {
        *tally.entry(entry.message.priority()).or_default() += 1;
    }

    // Ascending iteration with `>=` lets the later (higher) priority win ties.
    let mut best: Option<(u32, usize)> = None;
    for (priority, count) in tally {
        if best.map_or(true, |(_, best_count)| count >= best_count) {
            best = Some((priority, count));
        }
    }
    best.map(|(priority, _)| priority)
}

/// Split the modal tier off the queue, front to back.
fn take_modal_tier(queue: &PriorityQueue) -> Result<Vec<Ranked>> {
    let entries = queue.drain();
    let Some(modal) = modal_priority(&entries) else {
        return Err(Error::EmptyQueue);
    };

    let (tier, rest): (Vec<Ranked>, Vec<Ranked>) = entries
        .into_iter()
        .partition(|entry| entry.message.priority() == modal);
    queue.restore(rest);

    tracing::debug!(
        "Modal tier priority {} holds {} message(s), {} left in queue",
        modal,
        tier.len(),
        queue.len()
    );
    Ok(tier)
}

/// Move every message of the most common priority into a new queue.
pub fn modal_priority_group(queue: &PriorityQueue) -> Result<PriorityQueue> {
    Ok(PriorityQueue::from_ranked(take_modal_tier(queue)?))
}

/// Keep the first and last message of the modal tier.
///
/// The rest of the tier goes back to `queue`.
pub fn first_and_last(queue: &PriorityQueue) -> Result<PriorityQueue> {
    let mut tier = take_modal_tier(queue)?;
    if tier.len() == 1 {
        return Ok(PriorityQueue::from_ranked(tier));
    }

    let last = tier.pop();
    let mut middle = tier.into_iter();
    let first = middle.next();
    queue.restore(middle);

    Ok(PriorityQueue::from_ranked(first.into_iter().chain(last)))
}

/// Keep the longest and shortest message of the modal tier.
///
/// Length ties keep the earlier message. The group lists the longest
/// message first.
pub fn longest_and_shortest(queue: &PriorityQueue) -> Result<PriorityQueue> {
    let tier = take_modal_tier(queue)?;
    if tier.len() == 1 {
        return Ok(PriorityQueue::from_ranked(tier));
    }

    let mut longest = 0;
    let mut shortest = 0;
    for (index, entry) in tier.iter().enumerate().skip(1) {
        let len = entry.message.len();
        if len > tier[longest].message.len() {
            longest = index;
        }
        if len < tier[shortest].message.len() {
            shortest = index;
        }
    }

    // With all lengths equal one message is both extremes.
    let mut picked = Vec::with_capacity(2);
    let mut returned = Vec::with_capacity(tier.len());
    for (index, entry) in tier.into_iter().enumerate() {
        if index == longest || index == shortest {
            picked.push((index == longest, entry));
        } else {
            returned.push(entry);
        }
    }
    queue.restore(returned);

    picked.sort_by_key(|(is_longest, _)| !is_longest);

    let group = PriorityQueue::new();
    for (_, entry) in picked {
        group.insert(entry.message);
    }
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Scorer;

    fn queue_of(texts: &[&str]) -> PriorityQueue {
        let scorer = Scorer::default();
        let queue = PriorityQueue::new();
        for text in texts {
            queue.insert(scorer.message(*text));
        }
        queue
    }

    fn texts(queue: &PriorityQueue) -> Vec<String> {
        queue.snapshot().iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_modal_group_splits_without_loss() {
        let queue = queue_of(&[
            "problema uno",
            "hola",
            "problema dos",
            "urgente",
            "problema tres",
        ]);

        let group = modal_priority_group(&queue).unwrap();

        assert_eq!(texts(&group), vec!["problema uno", "problema dos", "problema tres"]);
        assert_eq!(texts(&queue), vec!["urgente", "hola"]);
        assert_eq!(group.len() + queue.len(), 5);
    }

    #[test]
    fn test_modal_tie_prefers_higher_priority() {
        let queue = queue_of(&["duda a", "urgente a", "duda b", "urgente b"]);

        let group = modal_priority_group(&queue).unwrap();

        assert_eq!(texts(&group), vec!["urgente a", "urgente b"]);
        assert_eq!(texts(&queue), vec!["duda a", "duda b"]);
    }

    #[test]
    fn test_first_and_last_of_single_tier() {
        let queue = queue_of(&["problema uno", "problema dos", "problema tres"]);

        let group = first_and_last(&queue).unwrap();

        assert_eq!(texts(&group), vec!["problema uno", "problema tres"]);
        assert_eq!(texts(&queue), vec!["problema dos"]);
    }

    #[test]
    fn test_first_and_last_returns_middle_in_rank_order() {
        let queue = queue_of(&[
            "duda 1",
            "hola",
            "duda 2",
            "duda 3",
            "duda 4",
            "emergencia",
        ]);

        let group = first_and_last(&queue).unwrap();

        assert_eq!(texts(&group), vec!["duda 1", "duda 4"]);
        assert_eq!(texts(&queue), vec!["emergencia", "duda 2", "duda 3", "hola"]);
    }

    #[test]
    fn test_first_and_last_with_two_messages() {
        let queue = queue_of(&["consulta a", "consulta b"]);

        let group = first_and_last(&queue).unwrap();

        assert_eq!(texts(&group), vec!["consulta a", "consulta b"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_single_message_selections() {
        let queue = queue_of(&["solo una duda"]);
        let group = longest_and_shortest(&queue).unwrap();
        assert_eq!(texts(&group), vec!["solo una duda"]);
        assert!(queue.is_empty());

        let queue = queue_of(&["solo una duda"]);
        let group = first_and_last(&queue).unwrap();
        assert_eq!(texts(&group), vec!["solo una duda"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_longest_and_shortest() {
        let queue = queue_of(&[
            "problema medio largo",
            "problema",
            "un problema bastante mas largo",
            "problema xx",
            "hola",
        ]);

        let group = longest_and_shortest(&queue).unwrap();

        assert_eq!(texts(&group), vec!["un problema bastante mas largo", "problema"]);
        assert_eq!(texts(&queue), vec!["problema medio largo", "problema xx", "hola"]);
    }

    #[test]
    fn test_longest_and_shortest_ties_keep_earlier() {
        let queue = queue_of(&["duda aa", "duda bbbb", "duda cc", "duda dddd"]);

        let group = longest_and_shortest(&queue).unwrap();

        assert_eq!(texts(&group), vec!["duda bbbb", "duda aa"]);
        assert_eq!(texts(&queue), vec!["duda cc", "duda dddd"]);
    }

    #[test]
    fn test_longest_and_shortest_equal_lengths() {
        let queue = queue_of(&["duda a", "duda b", "duda c"]);

        let group = longest_and_shortest(&queue).unwrap();

        // First message is both extremes.
        assert_eq!(texts(&group), vec!["duda a"]);
        assert_eq!(texts(&queue), vec!["duda b", "duda c"]);
    }

    #[test]
    fn test_longest_listed_before_shortest_regardless_of_rank() {
        let queue = queue_of(&["duda", "una duda muy larga"]);

        let group = longest_and_shortest(&queue).unwrap();

        assert_eq!(texts(&group), vec!["una duda muy larga", "duda"]);
    }

    #[test]
    fn test_empty_queue_selections_fail() {
        let queue = PriorityQueue::new();

        assert!(matches!(modal_priority_group(&queue), Err(Error::EmptyQueue)));
        assert!(matches!(first_and_last(&queue), Err(Error::EmptyQueue)));
        assert!(matches!(longest_and_shortest(&queue), Err(Error::EmptyQueue)));
        assert!(matches!(select(&queue, SelectionPolicy::All), Err(Error::EmptyQueue)));
    }

    #[test]
    fn test_select_all_moves_everything() {
        let queue = queue_of(&["hola", "urgente"]);

        let group = select(&queue, SelectionPolicy::All).unwrap();

        assert_eq!(texts(&group), vec!["urgente", "hola"]);
        assert!(queue.is_empty());
    }
}
