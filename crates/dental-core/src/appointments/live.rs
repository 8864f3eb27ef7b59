//! Keeping appointment lists current: push notifications when the backend
//! offers them, periodic polling otherwise.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{AppointmentResult, AppointmentService, Clock};
use crate::db::AppointmentStore;
use crate::models::Appointment;

/// Refresh interval when no change feed is available.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Change feed unavailable: {0}")]
pub struct FeedUnavailable(pub String);

/// Backend push channel for appointment changes.
pub trait ChangeFeed {
    fn subscribe(&self, clinic_id: &str) -> Result<(), FeedUnavailable>;
}

/// Feed for backends without push support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChangeFeed;

impl ChangeFeed for NoChangeFeed {
    fn subscribe(&self, _clinic_id: &str) -> Result<(), FeedUnavailable> {
        Err(FeedUnavailable("push updates not supported".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Subscribed,
    Polling { last_refresh: DateTime<Utc> },
}

/// Drives forced reloads for one clinic.
pub struct LiveUpdates {
    clock: Arc<dyn Clock>,
    mode: UpdateMode,
}

impl LiveUpdates {
    /// Subscribe to the feed, falling back to polling if that fails.
    pub fn start<F: ChangeFeed>(feed: &F, clinic_id: &str, clock: Arc<dyn Clock>) -> Self {
        let mode = match feed.subscribe(clinic_id) {
            Ok(()) => {
                info!(clinic_id, "subscribed to appointment changes");
                UpdateMode::Subscribed
            }
            Err(e) => {
                warn!(clinic_id, error = %e, "falling back to appointment polling");
                UpdateMode::Polling {
                    last_refresh: clock.now(),
                }
            }
        };
        Self { clock, mode }
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.mode, UpdateMode::Polling { .. })
    }

    /// Handle a pushed change notification.
    pub fn on_change<S: AppointmentStore>(
        &mut self,
        service: &AppointmentService<'_, S>,
    ) -> AppointmentResult<Vec<Appointment>> {
        debug!(clinic_id = service.clinic_id(), "appointment change received");
        self.refresh(service)
    }

    /// Timer tick. Reloads when polling and the interval has elapsed.
    pub fn poll<S: AppointmentStore>(
        &mut self,
        service: &AppointmentService<'_, S>,
    ) -> AppointmentResult<Option<Vec<Appointment>>> {
        let UpdateMode::Polling { last_refresh } = self.mode else {
            return Ok(None);
        };
        let elapsed_ms = self.clock.now().signed_duration_since(last_refresh).num_milliseconds();
        if elapsed_ms < POLL_INTERVAL.as_millis() as i64 {
            return Ok(None);
        }
        self.refresh(service).map(Some)
    }

    fn refresh<S: AppointmentStore>(
        &mut self,
        service: &AppointmentService<'_, S>,
    ) -> AppointmentResult<Vec<Appointment>> {
        let appointments = service.load_appointments(true)?;
        if let UpdateMode::Polling { last_refresh } = &mut self.mode {
            *last_refresh = self.clock.now();
        }
        Ok(appointments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::appointments::{AppointmentCache, ManualClock};
    use crate::db::test_support::setup_db;

    struct WorkingFeed;

    impl ChangeFeed for WorkingFeed {
        fn subscribe(&self, _clinic_id: &str) -> Result<(), FeedUnavailable> {
            Ok(())
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()))
    }

    #[test]
    fn test_subscribed_never_polls() {
        let db = setup_db();
        let clock = clock();
        let cache = AppointmentCache::new(clock.clone());
        let service = AppointmentService::new(&db, &cache, "clinic-1");

        let mut live = LiveUpdates::start(&WorkingFeed, "clinic-1", clock.clone());
        assert_eq!(live.mode(), UpdateMode::Subscribed);
        clock.advance(chrono::Duration::minutes(10));
        assert!(live.poll(&service).unwrap().is_none());
        assert!(live.on_change(&service).unwrap().is_empty());
    }

    #[test]
    fn test_fallback_polls_every_interval() {
        let db = setup_db();
        let clock = clock();
        let cache = AppointmentCache::new(clock.clone());
        let service = AppointmentService::new(&db, &cache, "clinic-1");

        let mut live = LiveUpdates::start(&NoChangeFeed, "clinic-1", clock.clone());
        assert!(live.is_polling());

        clock.advance(chrono::Duration::seconds(29));
        assert!(live.poll(&service).unwrap().is_none());

        clock.advance(chrono::Duration::seconds(1));
        assert!(live.poll(&service).unwrap().is_some());

        clock.advance(chrono::Duration::seconds(10));
        assert!(live.poll(&service).unwrap().is_none());
    }
}
