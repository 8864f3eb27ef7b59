//! Duplicate patient detection.
//!
//! Only patients sharing the candidate's canonical phone number are compared.
//! A differing phone number never raises a duplicate signal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{normalize_phone, title_case, PatientResult};
use crate::db::PatientStore;
use crate::models::{Patient, ValidationError};

/// Above this, phone and name both match.
pub const BOTH_MATCH_THRESHOLD: f64 = 80.0;

/// Above this (and up to [`BOTH_MATCH_THRESHOLD`]), the names are weakly similar.
pub const NAME_MATCH_THRESHOLD: f64 = 30.0;

/// How strongly an existing patient matches the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Same phone and near-identical name: almost certainly the same person
    Both,
    /// Same phone, somewhat similar name
    Name,
    /// Same phone only, e.g. a shared household number
    Phone,
}

impl MatchType {
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity > BOTH_MATCH_THRESHOLD {
            MatchType::Both
        } else if similarity > NAME_MATCH_THRESHOLD {
            MatchType::Name
        } else {
            MatchType::Phone
        }
    }
}

/// Positional name similarity as a percentage (0-100).
///
/// Counts characters equal at the same index (case-insensitive) and divides by
/// the length of the longer name. This is not an edit distance: an insertion
/// early in the name shifts every later character out of position.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = title_case(a).to_lowercase().chars().collect();
    let b: Vec<char> = title_case(b).to_lowercase().chars().collect();

    let longer = a.len().max(b.len());
    if longer == 0 {
        return 100.0;
    }

    let equal = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    equal as f64 * 100.0 / longer as f64
}

/// An existing patient sharing the candidate's phone number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuplicateMatch {
    pub patient: Patient,
    pub similarity: f64,
    pub match_type: MatchType,
}

/// Result of a duplicate check. `matches` is sorted by similarity, highest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DuplicateCheck {
    pub matches: Vec<DuplicateMatch>,
}

impl DuplicateCheck {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The suggested duplicate: the phone match with the highest similarity.
    pub fn primary(&self) -> Option<&DuplicateMatch> {
        self.matches.first()
    }
}

/// Checks a prospective patient against existing records of one clinic.
pub struct DuplicateDetector<'a, S: PatientStore> {
    store: &'a S,
}

impl<'a, S: PatientStore> DuplicateDetector<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Find existing patients with the same canonical phone and score their names.
    pub fn check(&self, clinic_id: &str, name: &str, phone: &str) -> PatientResult<DuplicateCheck> {
        let phone = normalize_phone(phone)
            .ok_or_else(|| ValidationError::InvalidPhone(phone.to_string()))?;
        let name = title_case(name);

        let mut matches: Vec<DuplicateMatch> = self
            .store
            .find_patients_by_phone(clinic_id, &phone)?
            .into_iter()
            .map(|patient| {
                let similarity = name_similarity(&name, &patient.name);
                DuplicateMatch {
                    match_type: MatchType::from_similarity(similarity),
                    similarity,
                    patient,
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            clinic_id,
            phone = %phone,
            matches = matches.len(),
            "duplicate check complete"
        );

        Ok(DuplicateCheck { matches })
    }
}
