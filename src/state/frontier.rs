//! Frontier and dedup bookkeeping for match identifiers
//!
//! Every match identifier the crawler knows about lives in exactly one of
//! three places: the queue (discovered, waiting), the in-flight set (taken
//! by the current batch) or the finished set (never processed again this
//! session).

use std::collections::{HashSet, VecDeque};

/// In-memory crawl frontier with dedup against in-flight and finished ids
#[derive(Debug, Default, Clone)]
pub struct Frontier {
    /// Discovered ids in insertion order
    queue: VecDeque<String>,

    /// Membership index for `queue`
    queued: HashSet<String>,

    /// Ids taken by the batch currently being processed
    in_flight: HashSet<String>,

    /// Ids that completed processing; only grows
    finished: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier whose finished set is pre-populated
    ///
    /// Used at start-up with the match ids already in persistence.
    pub fn with_finished(finished: impl IntoIterator<Item = String>) -> Self {
        Self {
            finished: finished.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Appends ids not already queued, in flight or finished
    ///
    /// Duplicates are dropped silently. Returns the number of ids added.
    pub fn enqueue(&mut self, ids: impl IntoIterator<Item = String>) -> usize {
        let mut added = 0;
        for id in ids {
            if self.finished.contains(&id) || self.in_flight.contains(&id) {
                continue;
            }
            if self.queued.insert(id.clone()) {
                self.queue.push_back(id);
                added += 1;
            }
        }
        added
    }

    /// Removes up to `n` ids from the front and marks them in flight
    pub fn take_batch(&mut self, n: usize) -> Vec<String> {
        let take = n.min(self.queue.len());
        let batch: Vec<String> = self.queue.drain(..take).collect();
        for id in &batch {
            self.queued.remove(id);
            self.in_flight.insert(id.clone());
        }
        batch
    }

    /// Takes exactly the given ids out of the queue and marks them in flight
    ///
    /// Ids no longer queued are skipped. Order follows `ids`.
    pub fn take_ids(&mut self, ids: &[String]) -> Vec<String> {
        let batch: Vec<String> = ids
            .iter()
            .filter(|id| self.queued.remove(*id))
            .cloned()
            .collect();
        if batch.is_empty() {
            return batch;
        }

        let taken: HashSet<&String> = batch.iter().collect();
        self.queue.retain(|id| !taken.contains(id));
        for id in &batch {
            self.in_flight.insert(id.clone());
        }
        batch
    }

    /// Puts an unsettled batch back at the front, preserving its order
    ///
    /// Ids that were finished in the meantime are dropped.
    pub fn requeue_front(&mut self, batch: Vec<String>) {
        for id in batch.into_iter().rev() {
            self.in_flight.remove(&id);
            if self.finished.contains(&id) || self.queued.contains(&id) {
                continue;
            }
            self.queued.insert(id.clone());
            self.queue.push_front(id);
        }
    }

    /// Moves ids into the finished set
    pub fn mark_finished(&mut self, ids: impl IntoIterator<Item = String>) {
        for id in ids {
            self.in_flight.remove(&id);
            if self.queued.remove(&id) {
                self.queue.retain(|queued| queued != &id);
            }
            self.finished.insert(id);
        }
    }

    /// Drops an unsettled batch without finishing it
    pub fn release(&mut self, batch: &[String]) {
        for id in batch {
            self.in_flight.remove(id);
        }
    }

    /// Empties the queue, leaving in-flight and finished ids untouched
    ///
    /// Returns the number of ids dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.queued.clear();
        dropped
    }

    /// Number of queued ids
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn finished_len(&self) -> usize {
        self.finished.len()
    }

    /// Returns true if the id is queued
    pub fn contains(&self, id: &str) -> bool {
        self.queued.contains(id)
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    pub fn is_finished(&self, id: &str) -> bool {
        self.finished.contains(id)
    }

    /// Queued ids in order
    pub fn snapshot(&self) -> Vec<String> {
        self.queue.iter().cloned().collect()
    }
}
