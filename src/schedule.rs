//! Debounce scheduler
//!
//! Coalesces bursts of requests on the same channel into a single trailing
//! fire. Time is passed in explicitly so the host can drive it from a real
//! clock while tests advance virtual `Instant`s deterministically.
//!
//! Scheduling the same key again resets its deadline (trailing debounce);
//! distinct keys are independent. This only cancels pending timers; an
//! oracle call already in flight is beyond recall and is instead discarded
//! on arrival by the session's epoch check.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<K: Eq + Hash + Clone> {
    pending: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Schedule `key` to fire at `now + delay`, replacing any pending
    /// deadline for the same key.
    pub fn schedule(&mut self, key: K, now: Instant, delay: Duration) {
        self.pending.insert(key, now + delay);
    }

    /// Discard the pending timer for `key`, if any
    pub fn cancel(&mut self, key: &K) {
        self.pending.remove(key);
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Earliest pending deadline, for hosts that want to sleep until it
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Drain and return every key whose deadline has passed
    pub fn poll(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.pending.remove(key);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_fires_after_delay() {
        let start = Instant::now();
        let mut deb: Debouncer<&str> = Debouncer::new();
        deb.schedule("grammar", start, 300 * MS);
        assert!(deb.poll(start + 299 * MS).is_empty());
        assert_eq!(deb.poll(start + 300 * MS), vec!["grammar"]);
        assert!(deb.poll(start + 301 * MS).is_empty());
    }

    #[test]
    fn test_burst_coalesces_to_trailing_fire() {
        let start = Instant::now();
        let mut deb: Debouncer<&str> = Debouncer::new();
        deb.schedule("grammar", start, 300 * MS);
        deb.schedule("grammar", start + 100 * MS, 300 * MS);
        deb.schedule("grammar", start + 200 * MS, 300 * MS);
        // original deadline has passed but was superseded
        assert!(deb.poll(start + 350 * MS).is_empty());
        assert_eq!(deb.poll(start + 500 * MS), vec!["grammar"]);
    }

    #[test]
    fn test_channels_are_independent() {
        let start = Instant::now();
        let mut deb: Debouncer<&str> = Debouncer::new();
        deb.schedule("grammar", start, 100 * MS);
        deb.schedule("tone", start, 500 * MS);
        assert_eq!(deb.poll(start + 200 * MS), vec!["grammar"]);
        assert!(deb.is_pending(&"tone"));
        assert_eq!(deb.poll(start + 600 * MS), vec!["tone"]);
    }

    #[test]
    fn test_cancel_discards_pending() {
        let start = Instant::now();
        let mut deb: Debouncer<&str> = Debouncer::new();
        deb.schedule("grammar", start, 100 * MS);
        deb.cancel(&"grammar");
        assert!(deb.poll(start + 200 * MS).is_empty());
    }

    #[test]
    fn test_next_deadline_is_earliest() {
        let start = Instant::now();
        let mut deb: Debouncer<&str> = Debouncer::new();
        assert!(deb.next_deadline().is_none());
        deb.schedule("tone", start, 500 * MS);
        deb.schedule("grammar", start, 100 * MS);
        assert_eq!(deb.next_deadline(), Some(start + 100 * MS));
    }
}
