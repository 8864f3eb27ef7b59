//! Tooth chart models: tooth numbering, treatments, conditions and images.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp, optional_text, required, ValidationError, ValidationResult};

/// Anatomical tooth names ordered by distance from the midline.
const ANATOMY: [&str; 8] = [
    "Central Incisor",
    "Lateral Incisor",
    "Canine",
    "First Premolar",
    "Second Premolar",
    "First Molar",
    "Second Molar",
    "Third Molar",
];

/// A permanent tooth under the Universal Numbering System (1-32).
///
/// Serialized as the two-digit string used by the `tooth_number` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToothNumber(u8);

impl ToothNumber {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 32;

    /// Validate a numeric tooth number.
    pub fn new(number: u8) -> ValidationResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&number) {
            Ok(Self(number))
        } else {
            Err(ValidationError::InvalidToothNumber(number.to_string()))
        }
    }

    /// All 32 teeth in numbering order.
    pub fn all() -> impl Iterator<Item = ToothNumber> {
        (Self::MIN..=Self::MAX).map(ToothNumber)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Two-digit form, "01" through "32".
    pub fn code(self) -> String {
        format!("{:02}", self.0)
    }

    pub fn position(self) -> ToothPosition {
        match self.0 {
            1..=8 => ToothPosition::UpperRight,
            9..=16 => ToothPosition::UpperLeft,
            17..=24 => ToothPosition::LowerLeft,
            _ => ToothPosition::LowerRight,
        }
    }

    /// Human name, e.g. "Upper Right First Molar".
    pub fn name(self) -> String {
        let from_midline = match self.0 {
            1..=8 => 8 - self.0,
            9..=16 => self.0 - 9,
            17..=24 => 24 - self.0,
            _ => self.0 - 25,
        };
        format!(
            "{} {}",
            self.position().label(),
            ANATOMY[from_midline as usize]
        )
    }
}

impl fmt::Display for ToothNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for ToothNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: u8 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidToothNumber(s.to_string()))?;
        Self::new(number)
    }
}

impl TryFrom<String> for ToothNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ToothNumber> for String {
    fn from(tooth: ToothNumber) -> Self {
        tooth.code()
    }
}

/// Quadrant of the dental arch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToothPosition {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl ToothPosition {
    pub fn label(self) -> &'static str {
        match self {
            ToothPosition::UpperRight => "Upper Right",
            ToothPosition::UpperLeft => "Upper Left",
            ToothPosition::LowerLeft => "Lower Left",
            ToothPosition::LowerRight => "Lower Right",
        }
    }

    /// Teeth belonging to this quadrant.
    pub fn teeth(self) -> impl Iterator<Item = ToothNumber> {
        ToothNumber::all().filter(move |t| t.position() == self)
    }
}

/// Treatment lifecycle. Transitions are user-driven only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreatmentStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl TreatmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentStatus::Planned => "Planned",
            TreatmentStatus::InProgress => "In Progress",
            TreatmentStatus::Completed => "Completed",
            TreatmentStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for TreatmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Planned" => Ok(TreatmentStatus::Planned),
            "In Progress" => Ok(TreatmentStatus::InProgress),
            "Completed" => Ok(TreatmentStatus::Completed),
            "Cancelled" => Ok(TreatmentStatus::Cancelled),
            other => Err(ValidationError::UnknownVariant {
                kind: "treatment status",
                value: other.to_string(),
            }),
        }
    }
}

/// Fields a user enters for a treatment, shared by single and bulk creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentInput {
    pub treatment_type: String,
    pub description: Option<String>,
    pub status: TreatmentStatus,
    /// Treatment date (YYYY-MM-DD)
    pub treatment_date: String,
    pub notes: Option<String>,
    pub appointment_id: Option<String>,
    pub created_by: Option<String>,
}

impl TreatmentInput {
    pub fn new(treatment_type: impl Into<String>, treatment_date: impl Into<String>) -> Self {
        Self {
            treatment_type: treatment_type.into(),
            description: None,
            status: TreatmentStatus::Planned,
            treatment_date: treatment_date.into(),
            notes: None,
            appointment_id: None,
            created_by: None,
        }
    }
}

/// A treatment applied to one tooth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DentalTreatment {
    pub id: String,
    pub clinic_id: String,
    pub patient_id: String,
    pub appointment_id: Option<String>,
    pub tooth_number: ToothNumber,
    pub treatment_type: String,
    pub description: Option<String>,
    pub status: TreatmentStatus,
    pub treatment_date: String,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DentalTreatment {
    /// Build a treatment for one tooth, validating required fields.
    pub fn new(
        clinic_id: &str,
        patient_id: &str,
        tooth_number: ToothNumber,
        input: &TreatmentInput,
    ) -> ValidationResult<Self> {
        let now = now_timestamp();
        Ok(Self {
            id: new_id(),
            clinic_id: required("clinic_id", clinic_id)?,
            patient_id: required("patient_id", patient_id)?,
            appointment_id: optional_text(input.appointment_id.clone()),
            tooth_number,
            treatment_type: required("treatment_type", &input.treatment_type)?,
            description: optional_text(input.description.clone()),
            status: input.status,
            treatment_date: required("treatment_date", &input.treatment_date)?,
            notes: optional_text(input.notes.clone()),
            created_by: optional_text(input.created_by.clone()),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Derived, read-only.
    pub fn tooth_position(&self) -> ToothPosition {
        self.tooth_number.position()
    }
}

/// Severity of a recorded tooth condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        }
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mild" => Ok(Severity::Mild),
            "Moderate" => Ok(Severity::Moderate),
            "Severe" => Ok(Severity::Severe),
            other => Err(ValidationError::UnknownVariant {
                kind: "severity",
                value: other.to_string(),
            }),
        }
    }
}

/// Condition fields entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionInput {
    pub condition_type: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub notes: Option<String>,
}

/// The single current condition of one tooth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToothCondition {
    pub id: String,
    pub clinic_id: String,
    pub patient_id: String,
    pub tooth_number: ToothNumber,
    pub condition_type: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub notes: Option<String>,
    pub last_updated: String,
}

impl ToothCondition {
    pub fn new(
        clinic_id: &str,
        patient_id: &str,
        tooth_number: ToothNumber,
        input: &ConditionInput,
    ) -> ValidationResult<Self> {
        Ok(Self {
            id: new_id(),
            clinic_id: required("clinic_id", clinic_id)?,
            patient_id: required("patient_id", patient_id)?,
            tooth_number,
            condition_type: required("condition_type", &input.condition_type)?,
            description: optional_text(input.description.clone()),
            severity: input.severity,
            notes: optional_text(input.notes.clone()),
            last_updated: now_timestamp(),
        })
    }

    /// Replace the user-editable fields, keeping identity.
    pub fn apply(&mut self, input: &ConditionInput) -> ValidationResult<()> {
        self.condition_type = required("condition_type", &input.condition_type)?;
        self.description = optional_text(input.description.clone());
        self.severity = input.severity;
        self.notes = optional_text(input.notes.clone());
        self.last_updated = now_timestamp();
        Ok(())
    }
}

/// Kind of tooth image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Xray,
    Photo,
    Scan,
}

impl ImageType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::Xray => "xray",
            ImageType::Photo => "photo",
            ImageType::Scan => "scan",
        }
    }
}

impl FromStr for ImageType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xray" | "x-ray" => Ok(ImageType::Xray),
            "photo" => Ok(ImageType::Photo),
            "scan" => Ok(ImageType::Scan),
            other => Err(ValidationError::UnknownVariant {
                kind: "image type",
                value: other.to_string(),
            }),
        }
    }
}

/// An image attached to one tooth. Several rows may share one remote blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToothImage {
    pub id: String,
    pub clinic_id: String,
    pub patient_id: String,
    pub tooth_number: ToothNumber,
    pub image_url: String,
    /// Remote storage identifier, kept for later deletion
    pub storage_id: String,
    pub image_type: ImageType,
    pub description: Option<String>,
    pub size_bytes: u64,
    pub uploaded_at: String,
}

impl ToothImage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clinic_id: &str,
        patient_id: &str,
        tooth_number: ToothNumber,
        image_url: &str,
        storage_id: &str,
        image_type: ImageType,
        description: Option<String>,
        size_bytes: u64,
    ) -> ValidationResult<Self> {
        Ok(Self {
            id: new_id(),
            clinic_id: required("clinic_id", clinic_id)?,
            patient_id: required("patient_id", patient_id)?,
            tooth_number,
            image_url: required("image_url", image_url)?,
            storage_id: required("storage_id", storage_id)?,
            image_type,
            description: optional_text(description),
            size_bytes,
            uploaded_at: now_timestamp(),
        })
    }
}
