//! Tooth selection for bulk actions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{ToothNumber, ToothPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arch {
    Upper,
    Lower,
}

impl Arch {
    fn quadrants(self) -> [ToothPosition; 2] {
        match self {
            Arch::Upper => [ToothPosition::UpperRight, ToothPosition::UpperLeft],
            Arch::Lower => [ToothPosition::LowerLeft, ToothPosition::LowerRight],
        }
    }
}

/// Selected teeth, kept unique and in numbering order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToothSelection {
    teeth: BTreeSet<ToothNumber>,
}

impl ToothSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the tooth if unselected, otherwise unselect it. Returns whether
    /// it is selected afterwards.
    pub fn toggle(&mut self, tooth: ToothNumber) -> bool {
        if self.teeth.remove(&tooth) {
            false
        } else {
            self.teeth.insert(tooth);
            true
        }
    }

    pub fn select(&mut self, tooth: ToothNumber) {
        self.teeth.insert(tooth);
    }

    pub fn select_quadrant(&mut self, position: ToothPosition) {
        self.teeth.extend(position.teeth());
    }

    pub fn select_arch(&mut self, arch: Arch) {
        for quadrant in arch.quadrants() {
            self.select_quadrant(quadrant);
        }
    }

    pub fn select_all(&mut self) {
        self.teeth.extend(ToothNumber::all());
    }

    pub fn clear(&mut self) {
        self.teeth.clear();
    }

    pub fn contains(&self, tooth: ToothNumber) -> bool {
        self.teeth.contains(&tooth)
    }

    pub fn len(&self) -> usize {
        self.teeth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teeth.is_empty()
    }

    pub fn teeth(&self) -> Vec<ToothNumber> {
        self.teeth.iter().copied().collect()
    }
}

impl FromIterator<ToothNumber> for ToothSelection {
    fn from_iter<I: IntoIterator<Item = ToothNumber>>(iter: I) -> Self {
        Self {
            teeth: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    #[test]
    fn test_toggle() {
        let mut selection = ToothSelection::new();
        assert!(selection.toggle(tooth(5)));
        assert!(selection.contains(tooth(5)));
        assert!(!selection.toggle(tooth(5)));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_ordered_and_unique() {
        let mut selection: ToothSelection = [tooth(30), tooth(2), tooth(30)].into_iter().collect();
        selection.select(tooth(2));
        assert_eq!(selection.teeth(), vec![tooth(2), tooth(30)]);
    }

    #[test]
    fn test_quadrant_and_arch() {
        let mut selection = ToothSelection::new();
        selection.select_quadrant(ToothPosition::UpperLeft);
        assert_eq!(selection.len(), 8);
        assert!(selection.contains(tooth(9)) && selection.contains(tooth(16)));

        selection.select_arch(Arch::Lower);
        assert_eq!(selection.len(), 24);
        selection.select_all();
        assert_eq!(selection.len(), 32);
        selection.clear();
        assert!(selection.is_empty());
    }
}
