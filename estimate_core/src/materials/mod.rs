//! # Material Quantities
//!
//! Converts geometry and mix ratios into cement bags, sand, aggregate and
//! adhesive for the non-steel estimation items.
//!
//! Every item follows the same pattern:
//!
//! 1. A **wet volume** from geometry
//! 2. A **dry volume** = wet × bulking factor (1.54 concrete, 1.33 otherwise)
//! 3. A **mix ratio** `"a:b[:c]"` splitting the dry volume into shares
//! 4. Cement reported in 50 kg bags of 0.035 m³, rounded up
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::materials::{MixRatio, cement_bags};
//!
//! let ratio = MixRatio::parse("1:1.5:3");
//! let dry = 1.0 * 1.54;
//! let cement_m3 = ratio.share(dry, 0);
//! assert_eq!(cement_bags(cement_m3), 8);
//! ```

pub mod concrete;
pub mod flooring;
pub mod masonry;
pub mod plaster;
pub mod steel;

use serde::{Deserialize, Serialize};

use crate::units::non_negative;

pub use concrete::{ConcreteGeometry, ConcreteInput};
pub use flooring::FlooringInput;
pub use masonry::{BlockSize, MasonryInput};
pub use plaster::PlasterInput;
pub use steel::UnitWeightTable;

/// Dry-volume factor for concrete
pub const CONCRETE_DRY_FACTOR: f64 = 1.54;

/// Dry-volume factor for mortar (masonry, plaster, flooring bedding)
pub const MORTAR_DRY_FACTOR: f64 = 1.33;

/// Volume of one 50 kg cement bag (m³)
pub const CEMENT_BAG_VOLUME_M3: f64 = 0.035;

/// Mass of one cement bag (kg)
pub const CEMENT_BAG_KG: f64 = 50.0;

/// Density of block adhesive (kg/m³)
pub const ADHESIVE_DENSITY_KG_M3: f64 = 1600.0;

/// Mass of one adhesive bag (kg)
pub const ADHESIVE_BAG_KG: f64 = 40.0;

/// Absorbs float noise so exact multiples don't round up an extra bag
const CEIL_GUARD: f64 = 1e-9;

/// Round a quantity up to whole units.
pub(crate) fn ceil_count(value: f64) -> u64 {
    let value = non_negative(value);
    (value - CEIL_GUARD).ceil().max(0.0) as u64
}

/// Cement volume → 50 kg bags (rounded up)
pub fn cement_bags(cement_m3: f64) -> u64 {
    ceil_count(cement_m3 / CEMENT_BAG_VOLUME_M3)
}

/// A parsed mix ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parts", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MixRatio {
    /// Cement-based mix, e.g. `1:6` or `1:1.5:3`
    Parts(Vec<f64>),
    /// Thin-joint block adhesive instead of cement mortar
    Chemical,
}

impl MixRatio {
    /// Parse `"a:b"`, `"a:b:c"` or `"CHEMICAL"`. Unparseable parts read as 0,
    /// so a malformed ratio yields zero quantities instead of an error.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("CHEMICAL") {
            return MixRatio::Chemical;
        }
        let parts = text
            .split(':')
            .map(|p| p.trim().parse::<f64>().map(non_negative).unwrap_or(0.0))
            .collect();
        MixRatio::Parts(parts)
    }

    pub fn is_chemical(&self) -> bool {
        matches!(self, MixRatio::Chemical)
    }

    /// Sum of all parts (0 for a chemical mix)
    pub fn total_parts(&self) -> f64 {
        match self {
            MixRatio::Parts(parts) => parts.iter().sum(),
            MixRatio::Chemical => 0.0,
        }
    }

    /// `dry_volume × parts[index] / total_parts`; 0 when the part is absent
    pub fn share(&self, dry_volume: f64, index: usize) -> f64 {
        match self {
            MixRatio::Parts(parts) => {
                let total = self.total_parts();
                match parts.get(index) {
                    Some(part) if total > 0.0 => dry_volume * part / total,
                    _ => 0.0,
                }
            }
            MixRatio::Chemical => 0.0,
        }
    }
}

impl std::fmt::Display for MixRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MixRatio::Parts(parts) => {
                let text: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", text.join(":"))
            }
            MixRatio::Chemical => write!(f, "CHEMICAL"),
        }
    }
}

/// Quantities common to every non-steel item. Unused fields stay 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialQuantities {
    pub wet_volume_m3: f64,
    pub dry_volume_m3: f64,
    pub cement_m3: f64,
    pub cement_bags: u64,
    pub sand_m3: f64,
    pub aggregate_m3: f64,
    pub adhesive_kg: f64,
    pub adhesive_bags: u64,
}

impl MaterialQuantities {
    /// Split a wet volume into dry shares: cement, sand, then aggregate.
    pub fn from_wet_volume(wet_volume_m3: f64, dry_factor: f64, ratio: &MixRatio) -> Self {
        let wet = non_negative(wet_volume_m3);
        let dry = wet * dry_factor;
        let cement = ratio.share(dry, 0);
        MaterialQuantities {
            wet_volume_m3: wet,
            dry_volume_m3: dry,
            cement_m3: cement,
            cement_bags: cement_bags(cement),
            sand_m3: ratio.share(dry, 1),
            aggregate_m3: ratio.share(dry, 2),
            ..Default::default()
        }
    }

    /// Cement weight in kg (bags × 50)
    pub fn cement_kg(&self) -> f64 {
        self.cement_bags as f64 * CEMENT_BAG_KG
    }

    /// Accumulate another item's quantities
    pub fn add(&mut self, other: &MaterialQuantities) {
        self.wet_volume_m3 += other.wet_volume_m3;
        self.dry_volume_m3 += other.dry_volume_m3;
        self.cement_m3 += other.cement_m3;
        self.cement_bags += other.cement_bags;
        self.sand_m3 += other.sand_m3;
        self.aggregate_m3 += other.aggregate_m3;
        self.adhesive_kg += other.adhesive_kg;
        self.adhesive_bags += other.adhesive_bags;
    }
}

/// Rectangular opening deducted from a wall (door, window)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub width_m: f64,
    pub height_m: f64,
    #[serde(default = "one")]
    pub count: u32,
}

fn one() -> u32 {
    1
}

impl Opening {
    pub fn new(width_m: f64, height_m: f64, count: u32) -> Self {
        Opening {
            width_m,
            height_m,
            count,
        }
    }

    pub fn area_m2(&self) -> f64 {
        non_negative(self.width_m) * non_negative(self.height_m) * self.count as f64
    }
}

/// Total opening area
pub(crate) fn openings_area(openings: &[Opening]) -> f64 {
    openings.iter().map(Opening::area_m2).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ratios() {
        assert_eq!(MixRatio::parse("1:6"), MixRatio::Parts(vec![1.0, 6.0]));
        assert_eq!(MixRatio::parse(" 1 : 1.5 : 3 "), MixRatio::Parts(vec![1.0, 1.5, 3.0]));
        assert_eq!(MixRatio::parse("chemical"), MixRatio::Chemical);
        assert_eq!(MixRatio::parse("1:x").total_parts(), 1.0);
        assert_eq!(MixRatio::parse("").total_parts(), 0.0);
    }

    #[test]
    fn test_concrete_ratio_round_trip() {
        let q = MaterialQuantities::from_wet_volume(1.0, CONCRETE_DRY_FACTOR, &MixRatio::parse("1:1.5:3"));
        assert!((q.dry_volume_m3 - 1.54).abs() < 1e-12);
        assert_eq!(q.cement_bags, 8);
        assert!((q.sand_m3 - 0.42).abs() < 1e-9);
        assert!((q.aggregate_m3 - 0.84).abs() < 1e-9);
        assert!((q.cement_m3 - 0.28).abs() < 1e-9);
        assert_eq!(q.cement_kg(), 400.0);
    }

    #[test]
    fn test_malformed_ratio_gives_zero() {
        let q = MaterialQuantities::from_wet_volume(2.0, MORTAR_DRY_FACTOR, &MixRatio::parse("abc"));
        assert_eq!(q.cement_bags, 0);
        assert_eq!(q.sand_m3, 0.0);
        assert!((q.dry_volume_m3 - 2.66).abs() < 1e-12);
    }

    #[test]
    fn test_cement_bags_round_up() {
        assert_eq!(cement_bags(0.0), 0);
        assert_eq!(cement_bags(0.035), 1);
        assert_eq!(cement_bags(0.036), 2);
        assert_eq!(cement_bags(-1.0), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(MixRatio::parse("1:1.5:3").to_string(), "1:1.5:3");
        assert_eq!(MixRatio::Chemical.to_string(), "CHEMICAL");
    }

    #[test]
    fn test_openings_area() {
        let openings = [Opening::new(1.0, 2.1, 2), Opening::new(1.2, 1.5, 1)];
        assert!((openings_area(&openings) - 6.0).abs() < 1e-12);
    }
}
