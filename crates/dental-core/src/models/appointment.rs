//! Appointment and follow-up models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp, optional_text, required, ValidationError, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(ValidationError::UnknownVariant {
                kind: "appointment status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub clinic_id: String,
    pub patient_id: String,
    /// Appointment date (YYYY-MM-DD)
    pub appointment_date: String,
    /// Start time (HH:MM)
    pub appointment_time: String,
    pub duration_minutes: u32,
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    pub fn new(
        clinic_id: &str,
        patient_id: &str,
        appointment_date: &str,
        appointment_time: &str,
        appointment_type: &str,
    ) -> ValidationResult<Self> {
        let now = now_timestamp();
        Ok(Self {
            id: new_id(),
            clinic_id: required("clinic_id", clinic_id)?,
            patient_id: required("patient_id", patient_id)?,
            appointment_date: required("appointment_date", appointment_date)?,
            appointment_time: required("appointment_time", appointment_time)?,
            duration_minutes: 30,
            appointment_type: required("appointment_type", appointment_type)?,
            status: AppointmentStatus::Scheduled,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FollowUpStatus {
    Pending,
    Overdue,
}

impl FollowUpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FollowUpStatus::Pending => "pending",
            FollowUpStatus::Overdue => "overdue",
        }
    }
}

impl FromStr for FollowUpStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FollowUpStatus::Pending),
            "overdue" => Ok(FollowUpStatus::Overdue),
            other => Err(ValidationError::UnknownVariant {
                kind: "follow-up status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FollowUpPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl FollowUpPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            FollowUpPriority::Low => "low",
            FollowUpPriority::Medium => "medium",
            FollowUpPriority::High => "high",
            FollowUpPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for FollowUpPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(FollowUpPriority::Low),
            "medium" => Ok(FollowUpPriority::Medium),
            "high" => Ok(FollowUpPriority::High),
            "urgent" => Ok(FollowUpPriority::Urgent),
            other => Err(ValidationError::UnknownVariant {
                kind: "follow-up priority",
                value: other.to_string(),
            }),
        }
    }
}

/// Follow-up request. There is no completed state: completion deletes the row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUp {
    pub id: String,
    pub clinic_id: String,
    pub patient_id: String,
    pub appointment_id: Option<String>,
    pub reason: String,
    pub status: FollowUpStatus,
    pub priority: FollowUpPriority,
    /// Due date (YYYY-MM-DD)
    pub due_date: String,
    pub created_by: Option<String>,
    pub created_at: String,
}

impl FollowUp {
    pub fn new(
        clinic_id: &str,
        patient_id: &str,
        reason: &str,
        priority: FollowUpPriority,
        due_date: &str,
    ) -> ValidationResult<Self> {
        Ok(Self {
            id: new_id(),
            clinic_id: required("clinic_id", clinic_id)?,
            patient_id: required("patient_id", patient_id)?,
            appointment_id: None,
            reason: required("reason", reason)?,
            status: FollowUpStatus::Pending,
            priority,
            due_date: required("due_date", due_date)?,
            created_by: None,
            created_at: now_timestamp(),
        })
    }

    pub fn with_created_by(mut self, created_by: Option<String>) -> Self {
        self.created_by = optional_text(created_by);
        self
    }
}
