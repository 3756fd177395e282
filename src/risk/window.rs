//! Fixed-capacity FIFO of recent per-event scores for one student.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct RiskWindow {
    capacity: usize,
    entries: VecDeque<WindowEntry>,
}

impl RiskWindow {
    /// A zero capacity is raised to one so the window can always hold the latest event.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append in arrival order; returns the single entry evicted to stay within capacity.
    ///
    /// Stored timestamps never decrease: an event stamped before the newest entry
    /// (a slower camera committing late) is recorded at the newest entry's time,
    /// so the front of the window is always the earliest entry.
    pub fn push(&mut self, timestamp: DateTime<Utc>, score: f64) -> Option<WindowEntry> {
        let timestamp = match self.entries.back() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(WindowEntry { timestamp, score });
        evicted
    }

    /// Unweighted mean; 0.0 for an empty window.
    pub fn mean(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().map(|e| e.score).sum::<f64>() / self.entries.len() as f64
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &WindowEntry> {
        self.entries.iter()
    }
}
