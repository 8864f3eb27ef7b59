//! Appointment completion and follow-up tracking.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{AppointmentError, AppointmentResult, AppointmentService, Clock};
use crate::db::{AppointmentStore, FollowUpStore, PatientStore};
use crate::effects::{BestEffort, SideEffect};
use crate::messaging::Messenger;
use crate::models::{Appointment, AppointmentStatus, FollowUp, FollowUpPriority, FollowUpStatus};

/// Follow-up to schedule when an appointment is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub reason: String,
    pub priority: FollowUpPriority,
    /// Due date (YYYY-MM-DD)
    pub due_date: String,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub appointment_id: String,
    pub follow_up: Option<FollowUpRequest>,
    /// Link sent to the patient, e.g. a feedback form. No message without it.
    pub notify_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedAppointment {
    pub appointment: Appointment,
    pub follow_up: Option<FollowUp>,
    pub notified: bool,
}

impl<'a, S> AppointmentService<'a, S>
where
    S: AppointmentStore + FollowUpStore + PatientStore,
{
    /// Mark an appointment completed, optionally schedule a follow-up, and
    /// message the patient.
    ///
    /// The follow-up is written before the status change; if the status
    /// update then fails, the follow-up is deleted again so the appointment
    /// stays uncompleted without an orphaned follow-up.
    ///
    /// The message is best-effort: when it cannot be sent the completion still
    /// stands and the failure is reported alongside it.
    pub fn complete_appointment<M: Messenger>(
        &self,
        messenger: &M,
        request: &CompletionRequest,
    ) -> AppointmentResult<BestEffort<CompletedAppointment>> {
        let mut appointment = self.get_appointment(&request.appointment_id)?;

        let follow_up = request
            .follow_up
            .as_ref()
            .map(|f| {
                FollowUp::new(&self.clinic_id, &appointment.patient_id, &f.reason, f.priority, &f.due_date)
                    .map(|follow_up| FollowUp {
                        appointment_id: Some(appointment.id.clone()),
                        ..follow_up.with_created_by(f.created_by.clone())
                    })
            })
            .transpose()?;

        appointment.status = AppointmentStatus::Completed;
        appointment.updated_at = crate::models::now_timestamp();
        if let Some(follow_up) = &follow_up {
            self.store.insert_follow_up(follow_up)?;
        }
        if let Err(e) = self.update_appointment(&appointment) {
            if let Some(follow_up) = &follow_up {
                self.discard_follow_up(follow_up);
            }
            return Err(e);
        }
        info!(
            clinic_id = %self.clinic_id,
            appointment_id = %appointment.id,
            follow_up = follow_up.is_some(),
            "appointment completed"
        );

        let mut result = BestEffort::new(CompletedAppointment {
            appointment,
            follow_up,
            notified: false,
        });
        if let Some(link) = &request.notify_link {
            self.notify(messenger, link, &mut result);
        }
        Ok(result)
    }

    /// Compensating delete for a follow-up whose completion did not go through.
    fn discard_follow_up(&self, follow_up: &FollowUp) {
        match self.store.delete_follow_up(&self.clinic_id, &follow_up.id) {
            Ok(_) => warn!(
                follow_up_id = %follow_up.id,
                "appointment completion failed, follow-up removed"
            ),
            Err(e) => error!(
                follow_up_id = %follow_up.id,
                error = %e,
                "failed to remove follow-up after failed completion"
            ),
        }
    }

    fn notify<M: Messenger>(&self, messenger: &M, link: &str, result: &mut BestEffort<CompletedAppointment>) {
        let patient_id = result.value.appointment.patient_id.clone();
        let patient = match self.store.get_patient(&self.clinic_id, &patient_id) {
            Ok(Some(patient)) => patient,
            Ok(None) => {
                warn!(patient_id = %patient_id, "completion message skipped, patient not found");
                result.record(SideEffect::Notification, patient_id, "patient not found");
                return;
            }
            Err(e) => {
                warn!(patient_id = %patient_id, error = %e, "completion message skipped");
                result.record(SideEffect::Notification, patient_id, e);
                return;
            }
        };

        if messenger.send(&patient.phone, &patient.name, link) {
            result.value.notified = true;
        } else {
            warn!(patient_id = %patient.id, "completion message not delivered");
            result.record(SideEffect::Notification, patient.phone, "message not delivered");
        }
    }

    /// Follow-ups of the clinic (or one patient), ordered by due date.
    ///
    /// Pending follow-ups past their due date are reported as Overdue.
    pub fn list_follow_ups(&self, patient_id: Option<&str>) -> AppointmentResult<Vec<FollowUp>> {
        let today = self.cache.clock().today();
        let mut follow_ups = self.store.list_follow_ups(&self.clinic_id, patient_id)?;
        for follow_up in &mut follow_ups {
            if follow_up.status == FollowUpStatus::Pending && follow_up.due_date < today {
                follow_up.status = FollowUpStatus::Overdue;
            }
        }
        Ok(follow_ups)
    }

    pub fn create_follow_up(&self, follow_up: &FollowUp) -> AppointmentResult<()> {
        if follow_up.clinic_id != self.clinic_id {
            return Err(AppointmentError::NotFound(follow_up.patient_id.clone()));
        }
        self.store.insert_follow_up(follow_up)?;
        Ok(())
    }

    /// Completing a follow-up removes it.
    pub fn complete_follow_up(&self, follow_up_id: &str) -> AppointmentResult<()> {
        if !self.store.delete_follow_up(&self.clinic_id, follow_up_id)? {
            return Err(AppointmentError::NotFound(follow_up_id.to_string()));
        }
        info!(clinic_id = %self.clinic_id, follow_up_id, "follow-up completed");
        Ok(())
    }
}
