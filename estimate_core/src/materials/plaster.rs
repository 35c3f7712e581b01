//! # Plaster
//!
//! Wall area less openings, times coat thickness, dry volume at ×1.33.

use serde::{Deserialize, Serialize};

use super::{openings_area, MaterialQuantities, MixRatio, Opening, MORTAR_DRY_FACTOR};
use crate::units::{non_negative, Meters, SqMeters};

/// Input for one plastered surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlasterInput {
    pub label: String,
    pub wall_length_m: f64,
    pub wall_height_m: f64,
    /// Coat thickness (m), typically 0.012 internal / 0.020 external
    pub thickness_m: f64,
    #[serde(default)]
    pub openings: Vec<Opening>,
    /// Mortar ratio, e.g. "1:4"
    pub ratio: String,
}

impl PlasterInput {
    pub fn new(
        label: impl Into<String>,
        wall_length_m: f64,
        wall_height_m: f64,
        thickness_m: f64,
        ratio: impl Into<String>,
    ) -> Self {
        PlasterInput {
            label: label.into(),
            wall_length_m,
            wall_height_m,
            thickness_m,
            openings: Vec::new(),
            ratio: ratio.into(),
        }
    }

    pub fn with_opening(mut self, opening: Opening) -> Self {
        self.openings.push(opening);
        self
    }

    /// Plastered area less openings, never negative
    pub fn net_area_m2(&self) -> f64 {
        let gross = non_negative(self.wall_length_m) * non_negative(self.wall_height_m);
        (gross - openings_area(&self.openings)).max(0.0)
    }
}

/// Result for one plastered surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlasterResult {
    pub label: String,
    pub net_area_m2: f64,
    pub quantities: MaterialQuantities,
}

pub fn calculate(input: &PlasterInput) -> PlasterResult {
    let area = input.net_area_m2();
    let wet = (SqMeters(area) * Meters(non_negative(input.thickness_m))).value();
    PlasterResult {
        label: input.label.clone(),
        net_area_m2: area,
        quantities: MaterialQuantities::from_wet_volume(wet, MORTAR_DRY_FACTOR, &MixRatio::parse(&input.ratio)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_plaster() {
        let input = PlasterInput::new("Room 1", 10.0, 3.0, 0.012, "1:4").with_opening(Opening::new(1.0, 2.0, 1));
        let r = calculate(&input);
        assert!((r.net_area_m2 - 28.0).abs() < 1e-12);

        let wet = 28.0 * 0.012;
        let dry = wet * 1.33;
        assert!((r.quantities.wet_volume_m3 - wet).abs() < 1e-12);
        assert!((r.quantities.cement_m3 - dry / 5.0).abs() < 1e-12);
        assert!((r.quantities.sand_m3 - dry * 4.0 / 5.0).abs() < 1e-12);
        // 0.089376 m³ of cement
        assert_eq!(r.quantities.cement_bags, 3);
    }

    #[test]
    fn test_empty_input() {
        let r = calculate(&PlasterInput::new("", 0.0, 0.0, 0.0, ""));
        assert_eq!(r.quantities, MaterialQuantities::default());
    }
}
