//! Patient models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp, optional_text, required, ValidationError, ValidationResult};
use crate::patients::{normalize_phone, title_case, validate_email};

/// Patient gender as captured on the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            other => Err(ValidationError::UnknownVariant {
                kind: "gender",
                value: other.to_string(),
            }),
        }
    }
}

/// Registration form input, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    pub notes: Option<String>,
}

impl NewPatient {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }
}

/// A patient record, owned by one clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub clinic_id: String,
    /// Title-cased full name
    pub name: String,
    /// Canonical 10-digit phone number
    pub phone: String,
    pub email: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    /// Free-text medical notes
    pub notes: Option<String>,
    /// Cleared by soft delete
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Patient {
    /// Validate form input and build a new active patient.
    pub fn from_input(clinic_id: &str, input: NewPatient) -> ValidationResult<Self> {
        let name = title_case(&required("name", &input.name)?);
        let phone = normalize_phone(&input.phone)
            .ok_or_else(|| ValidationError::InvalidPhone(input.phone.clone()))?;
        let email = optional_text(input.email);
        if let Some(email) = &email {
            validate_email(email)?;
        }

        let now = now_timestamp();
        Ok(Self {
            id: new_id(),
            clinic_id: required("clinic_id", clinic_id)?,
            name,
            phone,
            email,
            date_of_birth: optional_text(input.date_of_birth),
            gender: input.gender,
            address: optional_text(input.address),
            allergies: clean_set(input.allergies),
            current_medications: clean_set(input.current_medications),
            notes: optional_text(input.notes),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn has_allergies(&self) -> bool {
        !self.allergies.is_empty()
    }
}

/// Trim entries, drop blanks and duplicates, keep first-seen order.
fn clean_set(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !out.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_normalizes() {
        let mut input = NewPatient::new("  john SMITH ", "+91 98765 43210");
        input.allergies = vec!["Penicillin".into(), " penicillin ".into(), "".into()];
        input.email = Some("john@example.com".into());

        let patient = Patient::from_input("clinic-1", input).unwrap();
        assert_eq!(patient.name, "John Smith");
        assert_eq!(patient.phone, "9876543210");
        assert_eq!(patient.allergies, vec!["Penicillin".to_string()]);
        assert!(patient.is_active);
        assert_eq!(patient.id.len(), 36);
    }

    #[test]
    fn test_from_input_rejects_bad_phone() {
        let input = NewPatient::new("John", "12345");
        let err = Patient::from_input("clinic-1", input).unwrap_err();
        assert_eq!(err, ValidationError::InvalidPhone("12345".into()));
    }

    #[test]
    fn test_from_input_requires_name() {
        let input = NewPatient::new("", "9876543210");
        let err = Patient::from_input("clinic-1", input).unwrap_err();
        assert_eq!(err, ValidationError::Required("name"));
    }

    #[test]
    fn test_from_input_rejects_bad_email() {
        let mut input = NewPatient::new("John", "9876543210");
        input.email = Some("not-an-email".into());
        assert!(matches!(
            Patient::from_input("clinic-1", input),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
        assert!("unknown".parse::<Gender>().is_err());
    }
}
