//! Processed Event Ids
//!
//! Stripe delivers webhooks at least once. Crediting is made idempotent by
//! remembering event ids for a bounded retention window and treating
//! re-delivery of a known id as a no-op.

use std::collections::HashMap;
use std::sync::Mutex;

/// Retention comfortably beyond Stripe's retry horizon
const DEFAULT_RETENTION_SECS: i64 = 72 * 60 * 60;

/// Seen-event-id set with bounded retention
pub struct ProcessedEvents {
    seen: Mutex<HashMap<String, i64>>,
    retention_secs: i64,
}

impl Default for ProcessedEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessedEvents {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION_SECS)
    }

    pub fn with_retention(retention_secs: i64) -> Self {
        Self {
            seen: Mutex::new(HashMap::new()),
            retention_secs,
        }
    }

    /// Record `event_id`; returns `true` the first time an id is seen
    /// within the retention window.
    pub fn first_time(&self, event_id: &str) -> bool {
        self.first_time_at(event_id, chrono::Utc::now().timestamp())
    }

    fn first_time_at(&self, event_id: &str, now: i64) -> bool {
        let mut seen = self.seen.lock().unwrap();
        seen.retain(|_, recorded| now - *recorded < self.retention_secs);

        if seen.contains_key(event_id) {
            return false;
        }
        seen.insert(event_id.to_string(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_delivery_is_not_first_time() {
        let events = ProcessedEvents::new();
        assert!(events.first_time("evt_1"));
        assert!(!events.first_time("evt_1"));
        assert!(events.first_time("evt_2"));
    }

    #[test]
    fn ids_expire_after_retention() {
        let events = ProcessedEvents::with_retention(60);
        assert!(events.first_time_at("evt_1", 1000));
        assert!(!events.first_time_at("evt_1", 1030));
        assert!(events.first_time_at("evt_1", 1061));
    }
}
