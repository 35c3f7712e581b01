//! Reinforcement Bar Unit Weights
//!
//! Mass per meter for standard deformed bars, from the usual `d²/162`
//! density table rounded the way site engineers quote it.
//!
//! | Ø (mm) | kg/m  |
//! |--------|-------|
//! | 6      | 0.222 |
//! | 8      | 0.395 |
//! | 10     | 0.617 |
//! | 12     | 0.888 |
//! | 16     | 1.58  |
//! | 20     | 2.47  |
//! | 25     | 3.85  |
//! | 32     | 6.31  |
//!
//! The table is a value, not a global: the aggregator takes it as a
//! parameter so callers can substitute a supplier's own figures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CalcError, CalcResult, LookupPolicy};

/// Bar diameters carried by the standard table
pub const SUPPORTED_DIAMETERS_MM: [u32; 8] = [6, 8, 10, 12, 16, 20, 25, 32];

const STANDARD_WEIGHTS: [(u32, f64); 8] = [
    (6, 0.222),
    (8, 0.395),
    (10, 0.617),
    (12, 0.888),
    (16, 1.58),
    (20, 2.47),
    (25, 3.85),
    (32, 6.31),
];

/// Diameter (mm) → kg per meter lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitWeightTable {
    weights: BTreeMap<u32, f64>,
}

impl Default for UnitWeightTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl UnitWeightTable {
    /// The standard rebar table
    pub fn standard() -> Self {
        UnitWeightTable {
            weights: STANDARD_WEIGHTS.iter().copied().collect(),
        }
    }

    /// Table with caller-supplied entries
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, f64)>) -> Self {
        UnitWeightTable {
            weights: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, diameter_mm: u32) -> Option<f64> {
        self.weights.get(&diameter_mm).copied()
    }

    pub fn supports(&self, diameter_mm: u32) -> bool {
        self.weights.contains_key(&diameter_mm)
    }

    /// kg/m for a diameter. Unsupported diameters weigh 0 (logged).
    pub fn kg_per_m(&self, diameter_mm: u32) -> f64 {
        match self.get(diameter_mm) {
            Some(w) => w,
            None => {
                warn!(diameter_mm, "no unit weight for bar diameter, weighing as 0");
                0.0
            }
        }
    }

    /// kg/m under an explicit policy; `Strict` reports the unsupported diameter.
    pub fn kg_per_m_with(&self, diameter_mm: u32, policy: LookupPolicy) -> CalcResult<f64> {
        match policy {
            LookupPolicy::Lenient => Ok(self.kg_per_m(diameter_mm)),
            LookupPolicy::Strict => self
                .get(diameter_mm)
                .ok_or_else(|| CalcError::unsupported_diameter(diameter_mm)),
        }
    }

    /// Diameters in the table, ascending
    pub fn diameters(&self) -> impl Iterator<Item = u32> + '_ {
        self.weights.keys().copied()
    }
}

/// True when the diameter is one of the standard bar sizes
pub fn is_standard_diameter(diameter_mm: u32) -> bool {
    SUPPORTED_DIAMETERS_MM.contains(&diameter_mm)
}
