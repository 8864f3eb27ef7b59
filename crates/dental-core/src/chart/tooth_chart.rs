//! Chart assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ChartResult;
use crate::db::ChartStore;
use crate::models::{
    DentalTreatment, ToothCondition, ToothImage, ToothNumber, ToothPosition, TreatmentStatus,
};

/// Images of one tooth are only fetched on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImagesState {
    NotLoaded,
    Loaded(Vec<ToothImage>),
}

impl ImagesState {
    pub fn images(&self) -> Option<&[ToothImage]> {
        match self {
            ImagesState::NotLoaded => None,
            ImagesState::Loaded(images) => Some(images.as_slice()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToothSlot {
    pub tooth: ToothNumber,
    pub position: ToothPosition,
    pub name: String,
    pub condition: Option<ToothCondition>,
    pub treatments: Vec<DentalTreatment>,
    pub images: ImagesState,
}

impl ToothSlot {
    fn empty(tooth: ToothNumber) -> Self {
        Self {
            tooth,
            position: tooth.position(),
            name: tooth.name(),
            condition: None,
            treatments: Vec::new(),
            images: ImagesState::NotLoaded,
        }
    }

    /// Whether the chart should highlight this tooth.
    pub fn has_findings(&self) -> bool {
        self.condition.is_some() || !self.treatments.is_empty()
    }
}

/// Counts shown above the chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSummary {
    pub teeth_with_conditions: usize,
    pub teeth_with_treatments: usize,
    pub treatments_by_status: BTreeMap<String, usize>,
}

/// All 32 teeth of one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToothChart {
    pub clinic_id: String,
    pub patient_id: String,
    slots: Vec<ToothSlot>,
}

impl ToothChart {
    /// Build the chart with conditions and treatments attached.
    pub fn load<S: ChartStore>(store: &S, clinic_id: &str, patient_id: &str) -> ChartResult<Self> {
        let mut slots: Vec<ToothSlot> = ToothNumber::all().map(ToothSlot::empty).collect();

        for condition in store.list_conditions_for_patient(clinic_id, patient_id)? {
            let idx = slot_index(condition.tooth_number);
            slots[idx].condition = Some(condition);
        }
        for treatment in store.list_treatments_for_patient(clinic_id, patient_id)? {
            let idx = slot_index(treatment.tooth_number);
            slots[idx].treatments.push(treatment);
        }

        debug!(clinic_id, patient_id, "tooth chart loaded");
        Ok(Self {
            clinic_id: clinic_id.to_string(),
            patient_id: patient_id.to_string(),
            slots,
        })
    }

    /// Re-fetch everything. Images loaded so far are dropped.
    pub fn reload<S: ChartStore>(&mut self, store: &S) -> ChartResult<()> {
        *self = Self::load(store, &self.clinic_id, &self.patient_id)?;
        Ok(())
    }

    /// Fetch images for one tooth and keep them on its slot.
    pub fn load_images<S: ChartStore>(&mut self, store: &S, tooth: ToothNumber) -> ChartResult<&[ToothImage]> {
        let images = store.list_images(&self.clinic_id, &self.patient_id, tooth)?;
        let slot = &mut self.slots[slot_index(tooth)];
        slot.images = ImagesState::Loaded(images);
        match &slot.images {
            ImagesState::Loaded(images) => Ok(images.as_slice()),
            ImagesState::NotLoaded => Ok(&[]),
        }
    }

    pub fn slots(&self) -> &[ToothSlot] {
        &self.slots
    }

    pub fn slot(&self, tooth: ToothNumber) -> &ToothSlot {
        &self.slots[slot_index(tooth)]
    }

    pub fn quadrant(&self, position: ToothPosition) -> impl Iterator<Item = &ToothSlot> {
        self.slots.iter().filter(move |s| s.position == position)
    }

    pub fn summary(&self) -> ChartSummary {
        let mut summary = ChartSummary::default();
        for slot in &self.slots {
            if slot.condition.is_some() {
                summary.teeth_with_conditions += 1;
            }
            if !slot.treatments.is_empty() {
                summary.teeth_with_treatments += 1;
            }
            for treatment in &slot.treatments {
                *summary
                    .treatments_by_status
                    .entry(treatment.status.as_str().to_string())
                    .or_default() += 1;
            }
        }
        summary
    }

    pub fn completed_treatments(&self) -> usize {
        self.slots
            .iter()
            .flat_map(|s| s.treatments.iter())
            .filter(|t| t.status == TreatmentStatus::Completed)
            .count()
    }
}

fn slot_index(tooth: ToothNumber) -> usize {
    usize::from(tooth.get()) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::upsert_condition;
    use crate::db::test_support::{seed_patient, setup_db};
    use crate::db::{ImageStore, TreatmentStore};
    use crate::models::{ConditionInput, ImageType, Severity, TreatmentInput};

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    #[test]
    fn test_empty_chart_has_32_slots() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let chart = ToothChart::load(&db, "clinic-1", &patient.id).unwrap();

        assert_eq!(chart.slots().len(), 32);
        assert_eq!(chart.slot(tooth(1)).position, ToothPosition::UpperRight);
        assert_eq!(chart.slot(tooth(32)).position, ToothPosition::LowerRight);
        assert_eq!(chart.quadrant(ToothPosition::LowerLeft).count(), 8);
        assert!(chart.slots().iter().all(|s| s.images == ImagesState::NotLoaded));
        assert_eq!(chart.summary(), ChartSummary::default());
    }

    #[test]
    fn test_eager_attach_and_lazy_images() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");

        let mut input = TreatmentInput::new("Filling", "2024-02-01");
        input.status = TreatmentStatus::Completed;
        db.insert_treatment(&DentalTreatment::new("clinic-1", &patient.id, tooth(14), &input).unwrap())
            .unwrap();
        upsert_condition(
            &db,
            "clinic-1",
            &patient.id,
            tooth(14),
            &ConditionInput {
                condition_type: "Caries".into(),
                description: None,
                severity: Severity::Mild,
                notes: None,
            },
        )
        .unwrap();
        db.insert_image(
            &ToothImage::new("clinic-1", &patient.id, tooth(14), "https://img/1", "blob-1", ImageType::Xray, None, 10)
                .unwrap(),
        )
        .unwrap();

        let mut chart = ToothChart::load(&db, "clinic-1", &patient.id).unwrap();
        let slot = chart.slot(tooth(14));
        assert!(slot.has_findings());
        assert_eq!(slot.treatments.len(), 1);
        assert!(slot.images.images().is_none());

        let images = chart.load_images(&db, tooth(14)).unwrap();
        assert_eq!(images.len(), 1);

        let summary = chart.summary();
        assert_eq!(summary.teeth_with_conditions, 1);
        assert_eq!(summary.treatments_by_status.get("Completed"), Some(&1));
        assert_eq!(chart.completed_treatments(), 1);

        chart.reload(&db).unwrap();
        assert!(chart.slot(tooth(14)).images.images().is_none());
    }
}
