//! Time-boxed appointment list cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::Clock;
use crate::models::Appointment;

/// How long a cached list is served without going to the store.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

const KEY_PREFIX: &str = "appointments";

/// Key of a clinic's full appointment list.
pub fn clinic_key(clinic_id: &str) -> String {
    format!("{}_{}", KEY_PREFIX, clinic_id)
}

/// Key of a clinic's appointments on one date.
pub fn date_key(clinic_id: &str, date: &str) -> String {
    format!("{}_{}_{}", KEY_PREFIX, clinic_id, date)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    appointments: Vec<Appointment>,
}

/// Shared appointment cache, owned by the composition root.
pub struct AppointmentCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl AppointmentCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached list for `key`, if stored less than [`CACHE_TTL`] ago.
    pub fn get(&self, key: &str) -> Option<Vec<Appointment>> {
        let now = self.clock.now();
        let mut entries = self.entries();

        let fresh = match entries.get(key) {
            Some(entry) => is_fresh(entry.stored_at, now),
            None => {
                debug!(key, "appointment cache miss");
                return None;
            }
        };

        if fresh {
            debug!(key, "appointment cache hit");
            entries.get(key).map(|e| e.appointments.clone())
        } else {
            debug!(key, "appointment cache entry expired");
            entries.remove(key);
            None
        }
    }

    pub fn put(&self, key: impl Into<String>, appointments: Vec<Appointment>) {
        let entry = CacheEntry {
            stored_at: self.clock.now(),
            appointments,
        };
        self.entries().insert(key.into(), entry);
    }

    /// Drop every appointment list of one clinic, dated or not.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_clinic(&self, clinic_id: &str) -> usize {
        let base = clinic_key(clinic_id);
        let dated = format!("{}_", base);
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, _| !(key == &base || key.starts_with(&dated)));
        let removed = before - entries.len();
        debug!(clinic_id, removed, "appointment cache invalidated");
        removed
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_fresh(stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let age_ms = now.signed_duration_since(stored_at).num_milliseconds();
    age_ms < CACHE_TTL.as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::ManualClock;
    use chrono::TimeZone;

    fn cache() -> (Arc<ManualClock>, AppointmentCache) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        let cache = AppointmentCache::new(clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_fresh_until_ttl() {
        let (clock, cache) = cache();
        cache.put(clinic_key("c1"), Vec::new());

        clock.advance(chrono::Duration::seconds(4 * 60 + 59));
        assert!(cache.get(&clinic_key("c1")).is_some());

        clock.advance(chrono::Duration::seconds(2));
        assert!(cache.get(&clinic_key("c1")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_only_that_clinic() {
        let (_clock, cache) = cache();
        cache.put(clinic_key("c1"), Vec::new());
        cache.put(date_key("c1", "2024-03-01"), Vec::new());
        cache.put(clinic_key("c2"), Vec::new());

        assert_eq!(cache.invalidate_clinic("c1"), 2);
        assert!(cache.get(&clinic_key("c2")).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys() {
        assert_eq!(clinic_key("c1"), "appointments_c1");
        assert_eq!(date_key("c1", "2024-03-01"), "appointments_c1_2024-03-01");
    }
}
