//! Cached appointment reads and invalidating writes for one clinic.

use tracing::info;

use super::{clinic_key, date_key, AppointmentCache, AppointmentError, AppointmentResult};
use crate::db::AppointmentStore;
use crate::models::{now_timestamp, Appointment, AppointmentStatus};

pub struct AppointmentService<'a, S> {
    pub(crate) store: &'a S,
    pub(crate) cache: &'a AppointmentCache,
    pub(crate) clinic_id: String,
}

impl<'a, S: AppointmentStore> AppointmentService<'a, S> {
    pub fn new(store: &'a S, cache: &'a AppointmentCache, clinic_id: impl Into<String>) -> Self {
        Self {
            store,
            cache,
            clinic_id: clinic_id.into(),
        }
    }

    pub fn clinic_id(&self) -> &str {
        &self.clinic_id
    }

    /// All appointments of the clinic. Served from cache unless stale or
    /// `force_refresh` is set.
    pub fn load_appointments(&self, force_refresh: bool) -> AppointmentResult<Vec<Appointment>> {
        let key = clinic_key(&self.clinic_id);
        self.cached(&key, force_refresh, None)
    }

    pub fn load_appointments_for_date(
        &self,
        date: &str,
        force_refresh: bool,
    ) -> AppointmentResult<Vec<Appointment>> {
        let key = date_key(&self.clinic_id, date);
        self.cached(&key, force_refresh, Some(date))
    }

    fn cached(&self, key: &str, force_refresh: bool, date: Option<&str>) -> AppointmentResult<Vec<Appointment>> {
        if !force_refresh {
            if let Some(hit) = self.cache.get(key) {
                return Ok(hit);
            }
        }
        let appointments = self.store.list_appointments(&self.clinic_id, date)?;
        self.cache.put(key, appointments.clone());
        Ok(appointments)
    }

    pub fn get_appointment(&self, id: &str) -> AppointmentResult<Appointment> {
        self.store
            .get_appointment(&self.clinic_id, id)?
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))
    }

    pub fn create_appointment(&self, appointment: &Appointment) -> AppointmentResult<()> {
        self.ensure_clinic(appointment)?;
        self.store.insert_appointment(appointment)?;
        self.cache.invalidate_clinic(&self.clinic_id);
        info!(clinic_id = %self.clinic_id, appointment_id = %appointment.id, "appointment created");
        Ok(())
    }

    pub fn update_appointment(&self, appointment: &Appointment) -> AppointmentResult<()> {
        self.ensure_clinic(appointment)?;
        let updated = self.store.update_appointment(appointment)?;
        self.cache.invalidate_clinic(&self.clinic_id);
        if !updated {
            return Err(AppointmentError::NotFound(appointment.id.clone()));
        }
        Ok(())
    }

    pub fn set_status(&self, id: &str, status: AppointmentStatus) -> AppointmentResult<Appointment> {
        let mut appointment = self.get_appointment(id)?;
        appointment.status = status;
        appointment.updated_at = now_timestamp();
        self.update_appointment(&appointment)?;
        Ok(appointment)
    }

    pub fn delete_appointment(&self, id: &str) -> AppointmentResult<()> {
        let deleted = self.store.delete_appointment(&self.clinic_id, id)?;
        self.cache.invalidate_clinic(&self.clinic_id);
        if !deleted {
            return Err(AppointmentError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn ensure_clinic(&self, appointment: &Appointment) -> AppointmentResult<()> {
        if appointment.clinic_id != self.clinic_id {
            return Err(AppointmentError::NotFound(appointment.id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use crate::appointments::ManualClock;
    use crate::db::test_support::{seed_patient, setup_db};
    use crate::db::{Database, DbResult};

    /// Counts list calls so cache hits are observable.
    struct CountingStore {
        db: Database,
        lists: Cell<usize>,
    }

    impl AppointmentStore for CountingStore {
        fn insert_appointment(&self, a: &Appointment) -> DbResult<()> {
            self.db.insert_appointment(a)
        }
        fn update_appointment(&self, a: &Appointment) -> DbResult<bool> {
            self.db.update_appointment(a)
        }
        fn get_appointment(&self, clinic_id: &str, id: &str) -> DbResult<Option<Appointment>> {
            self.db.get_appointment(clinic_id, id)
        }
        fn list_appointments(&self, clinic_id: &str, date: Option<&str>) -> DbResult<Vec<Appointment>> {
            self.lists.set(self.lists.get() + 1);
            self.db.list_appointments(clinic_id, date)
        }
        fn delete_appointment(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
            self.db.delete_appointment(clinic_id, id)
        }
    }

    fn fixture() -> (CountingStore, Arc<ManualClock>, AppointmentCache, String) {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        let cache = AppointmentCache::new(clock.clone());
        let store = CountingStore {
            db,
            lists: Cell::new(0),
        };
        (store, clock, cache, patient.id)
    }

    #[test]
    fn test_ttl_boundary() {
        let (store, clock, cache, _) = fixture();
        let service = AppointmentService::new(&store, &cache, "clinic-1");

        service.load_appointments(false).unwrap();
        assert_eq!(store.lists.get(), 1);

        clock.advance(Duration::seconds(4 * 60 + 59));
        service.load_appointments(false).unwrap();
        assert_eq!(store.lists.get(), 1);

        clock.advance(Duration::seconds(2));
        service.load_appointments(false).unwrap();
        assert_eq!(store.lists.get(), 2);
    }

    #[test]
    fn test_force_refresh_bypasses_cache() {
        let (store, _clock, cache, _) = fixture();
        let service = AppointmentService::new(&store, &cache, "clinic-1");
        service.load_appointments(false).unwrap();
        service.load_appointments(true).unwrap();
        assert_eq!(store.lists.get(), 2);
    }

    #[test]
    fn test_writes_invalidate() {
        let (store, _clock, cache, patient_id) = fixture();
        let service = AppointmentService::new(&store, &cache, "clinic-1");

        assert!(service.load_appointments(false).unwrap().is_empty());
        assert!(service.load_appointments_for_date("2024-03-05", false).unwrap().is_empty());

        let appt = Appointment::new("clinic-1", &patient_id, "2024-03-05", "10:00", "Checkup").unwrap();
        service.create_appointment(&appt).unwrap();
        assert!(cache.is_empty());

        assert_eq!(service.load_appointments(false).unwrap().len(), 1);
        assert_eq!(service.load_appointments_for_date("2024-03-05", false).unwrap().len(), 1);

        let confirmed = service.set_status(&appt.id, AppointmentStatus::Confirmed).unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
        assert_eq!(
            service.load_appointments(false).unwrap()[0].status,
            AppointmentStatus::Confirmed
        );

        service.delete_appointment(&appt.id).unwrap();
        assert!(service.load_appointments(false).unwrap().is_empty());
        assert!(matches!(
            service.delete_appointment(&appt.id),
            Err(AppointmentError::NotFound(_))
        ));
    }

    #[test]
    fn test_other_clinic_record_rejected() {
        let (store, _clock, cache, patient_id) = fixture();
        let service = AppointmentService::new(&store, &cache, "clinic-2");
        let appt = Appointment::new("clinic-1", &patient_id, "2024-03-05", "10:00", "Checkup").unwrap();
        assert!(service.create_appointment(&appt).is_err());
    }
}
