//! Min-priority queue of pending fires, keyed by due time.
//!
//! Entries are never removed on cancel; the registry drops them when popped
//! if their generation no longer matches the scheduler's.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use super::model::ReminderId;
use super::scheduler::TimerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueueEntry {
    pub due: DateTime<Utc>,
    /// Insertion order, breaks ties between equal deadlines.
    seq: u64,
    pub id: ReminderId,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ReminderId, handle: TimerHandle) {
        self.seq += 1;
        self.heap.push(Reverse(QueueEntry {
            due: handle.due,
            seq: self.seq,
            id,
            generation: handle.generation,
        }));
    }

    /// Pop the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<QueueEntry> {
        let due = self.heap.peek().map(|Reverse(e)| e.due)?;
        if due > now {
            return None;
        }
        self.heap.pop().map(|Reverse(e)| e)
    }

    /// Earliest entry whose generation is still live according to `is_live`.
    /// Stale entries at the head are discarded along the way.
    pub fn peek_live(&mut self, is_live: impl Fn(&QueueEntry) -> bool) -> Option<&QueueEntry> {
        loop {
            let live = is_live(&self.heap.peek()?.0);
            if live {
                break;
            }
            self.heap.pop();
        }
        self.heap.peek().map(|Reverse(e)| e)
    }

    /// Drop every entry `is_live` rejects, wherever it sits in the heap.
    pub fn retain(&mut self, is_live: impl Fn(&QueueEntry) -> bool) {
        self.heap.retain(|Reverse(e)| is_live(e));
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
