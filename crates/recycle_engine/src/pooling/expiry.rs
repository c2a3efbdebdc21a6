//! Auto-release deadline queue
//!
//! One queue per pool replaces a countdown per active instance. Entries are
//! ordered by deadline in a min-heap; cancelling a schedule is O(1) because the
//! instance simply forgets its token, and the stale heap entry is discarded
//! when it surfaces (or during compaction).

use crate::foundation::collections::InstanceKey;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Stale entries tolerated beyond the live count before compacting
const COMPACTION_SLACK: usize = 64;

#[derive(Debug, Clone, Copy)]
struct Expiry {
    deadline: f64,
    token: u64,
    key: InstanceKey,
}

impl PartialEq for Expiry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Expiry {}

impl PartialOrd for Expiry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expiry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .total_cmp(&other.deadline)
            .then(self.token.cmp(&other.token))
    }
}

/// Sorted-deadline structure checked once per tick
#[derive(Debug, Default)]
pub struct ExpiryQueue {
    heap: BinaryHeap<Reverse<Expiry>>,
    next_token: u64,
}

impl ExpiryQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to expire at `deadline`; returns the token the instance must hold
    pub fn schedule(&mut self, key: InstanceKey, deadline: f64) -> u64 {
        self.next_token = self.next_token.wrapping_add(1);
        let token = self.next_token;
        self.heap.push(Reverse(Expiry { deadline, token, key }));
        token
    }

    /// Pop the earliest entry whose deadline is at or before `now`
    ///
    /// The entry may be stale; the caller checks the token against the instance.
    pub fn pop_due(&mut self, now: f64) -> Option<(InstanceKey, u64)> {
        let Reverse(head) = self.heap.peek()?;
        if head.deadline > now {
            return None;
        }
        self.heap.pop().map(|Reverse(expiry)| (expiry.key, expiry.token))
    }

    /// Drop stale entries once they outnumber live schedules by a wide margin
    pub fn compact_if_bloated<F>(&mut self, live_count: usize, mut is_live: F)
    where
        F: FnMut(InstanceKey, u64) -> bool,
    {
        if self.heap.len() <= live_count.saturating_mul(2) + COMPACTION_SLACK {
            return;
        }
        let before = self.heap.len();
        self.heap.retain(|Reverse(expiry)| is_live(expiry.key, expiry.token));
        log::trace!("Compacted expiry queue from {} to {} entries", before, self.heap.len());
    }

    /// Number of queued entries, stale ones included
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue holds no entries
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Forget every schedule
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::InstanceMap;

    fn keys(n: usize) -> Vec<InstanceKey> {
        let mut map: InstanceMap<()> = InstanceMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_pops_in_deadline_order() {
        let k = keys(3);
        let mut queue = ExpiryQueue::new();
        queue.schedule(k[0], 3.0);
        queue.schedule(k[1], 1.0);
        queue.schedule(k[2], 2.0);

        assert_eq!(queue.pop_due(0.5), None);
        assert_eq!(queue.pop_due(2.5).map(|(key, _)| key), Some(k[1]));
        assert_eq!(queue.pop_due(2.5).map(|(key, _)| key), Some(k[2]));
        assert_eq!(queue.pop_due(2.5), None);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_tokens_are_distinct() {
        let k = keys(1);
        let mut queue = ExpiryQueue::new();
        let first = queue.schedule(k[0], 1.0);
        let second = queue.schedule(k[0], 1.0);

        assert_ne!(first, second);
    }

    #[test]
    fn test_compaction_drops_stale_entries() {
        let k = keys(1);
        let mut queue = ExpiryQueue::new();
        let mut live = 0;
        for _ in 0..200 {
            live = queue.schedule(k[0], 10.0);
        }

        queue.compact_if_bloated(1, |_, token| token == live);

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_due(10.0), Some((k[0], live)));
    }
}
