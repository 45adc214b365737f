use crate::message::SmsMessage;
use std::collections::HashSet;

/// Fixed backward offset applied to the watermark before the next query,
/// absorbing clock skew and out-of-order delivery at the source.
pub const OVERLAP_MS: i64 = 5_000;

/// Owns the seen-id set and the watermark timestamp for one monitor
/// instance. The set grows for the process lifetime; nothing is persisted.
#[derive(Debug, Default)]
pub struct DedupTracker {
    seen: HashSet<i64>,
    watermark_ms: i64,
}

impl DedupTracker {
    pub fn new() -> Self {
        DedupTracker::default()
    }

    /// Lower bound for the next fetch query. The overlap window means some
    /// records come back twice; `observe` filters them out.
    pub fn query_since(&self) -> i64 {
        (self.watermark_ms - OVERLAP_MS).max(0)
    }

    /// Feed one fetched batch through the tracker. Returns the records not
    /// seen before, in input order. The watermark advances over ALL records
    /// in the batch, duplicates from the overlap window included, so it
    /// stays monotonic even on an all-duplicate cycle.
    pub fn observe(&mut self, batch: Vec<SmsMessage>) -> Vec<SmsMessage> {
        let mut fresh = Vec::new();
        for message in batch {
            self.watermark_ms = self.watermark_ms.max(message.timestamp_ms());
            if self.seen.insert(message.id) {
                fresh.push(message);
            }
        }
        fresh
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn watermark_ms(&self) -> i64 {
        self.watermark_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Direction;
    use chrono::DateTime;

    fn message(id: i64, timestamp_ms: i64) -> SmsMessage {
        SmsMessage {
            id,
            address: "SVC".to_string(),
            body: "body".to_string(),
            timestamp: DateTime::from_timestamp_millis(timestamp_ms).unwrap(),
            direction: Direction::Received,
            read: false,
        }
    }

    #[test]
    fn test_first_batch_is_all_fresh() {
        let mut tracker = DedupTracker::new();
        let fresh = tracker.observe(vec![message(1, 1000), message(2, 2000)]);

        assert_eq!(fresh.len(), 2);
        assert_eq!(tracker.seen_count(), 2);
        assert_eq!(tracker.watermark_ms(), 2000);
    }

    #[test]
    fn test_same_batch_twice_is_idempotent() {
        let mut tracker = DedupTracker::new();
        let batch = vec![message(1, 1000), message(2, 2000)];

        let first = tracker.observe(batch.clone());
        assert_eq!(first.len(), 2);

        let second = tracker.observe(batch);
        assert!(second.is_empty());
        assert_eq!(tracker.seen_count(), 2);
    }

    #[test]
    fn test_watermark_advances_on_all_duplicate_cycle() {
        let mut tracker = DedupTracker::new();
        tracker.observe(vec![message(1, 1000)]);

        // The same record comes back through the overlap window, but with
        // a later timestamp than the current watermark has seen.
        let before = tracker.watermark_ms();
        let fresh = tracker.observe(vec![message(1, 3000)]);

        assert!(fresh.is_empty());
        assert!(tracker.watermark_ms() >= before);
        assert_eq!(tracker.watermark_ms(), 3000);
    }

    #[test]
    fn test_watermark_never_regresses() {
        let mut tracker = DedupTracker::new();
        tracker.observe(vec![message(1, 5000)]);
        tracker.observe(vec![message(2, 3000)]);

        assert_eq!(tracker.watermark_ms(), 5000);
    }

    #[test]
    fn test_query_since_applies_overlap() {
        let mut tracker = DedupTracker::new();
        assert_eq!(tracker.query_since(), 0);

        tracker.observe(vec![message(1, 20_000)]);
        assert_eq!(tracker.query_since(), 15_000);
    }

    #[test]
    fn test_query_since_floors_at_zero() {
        let mut tracker = DedupTracker::new();
        tracker.observe(vec![message(1, 2_000)]);
        assert_eq!(tracker.query_since(), 0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut tracker = DedupTracker::new();
        tracker.observe(vec![message(2, 2000)]);

        let fresh = tracker.observe(vec![message(3, 3000), message(2, 2000), message(1, 1000)]);
        assert_eq!(fresh.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3, 1]);
    }
}
