//! # Flooring
//!
//! Bedding mortar under floor tiles: room area × bedding thickness, dry volume
//! at ×1.33. Optionally counts tiles for the same area.

use serde::{Deserialize, Serialize};

use super::{ceil_count, MaterialQuantities, MixRatio, MORTAR_DRY_FACTOR};
use crate::units::{non_negative, Meters, SqMeters};

/// Input for one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlooringInput {
    pub label: String,
    pub room_length_m: f64,
    pub room_width_m: f64,
    /// Bedding mortar thickness (m)
    pub bedding_thickness_m: f64,
    /// Mortar ratio, e.g. "1:6"
    pub ratio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_length_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_width_m: Option<f64>,
}

impl FlooringInput {
    pub fn new(
        label: impl Into<String>,
        room_length_m: f64,
        room_width_m: f64,
        bedding_thickness_m: f64,
        ratio: impl Into<String>,
    ) -> Self {
        FlooringInput {
            label: label.into(),
            room_length_m,
            room_width_m,
            bedding_thickness_m,
            ratio: ratio.into(),
            tile_length_m: None,
            tile_width_m: None,
        }
    }

    pub fn with_tile(mut self, length_m: f64, width_m: f64) -> Self {
        self.tile_length_m = Some(length_m);
        self.tile_width_m = Some(width_m);
        self
    }

    pub fn area_m2(&self) -> f64 {
        non_negative(self.room_length_m) * non_negative(self.room_width_m)
    }

    /// Tiles to cover the area, when a tile size is given
    pub fn tile_count(&self) -> Option<u64> {
        let tile_area = non_negative(self.tile_length_m?) * non_negative(self.tile_width_m?);
        if tile_area > 0.0 {
            Some(ceil_count(self.area_m2() / tile_area))
        } else {
            None
        }
    }
}

/// Result for one floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlooringResult {
    pub label: String,
    pub area_m2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<u64>,
    pub quantities: MaterialQuantities,
}

pub fn calculate(input: &FlooringInput) -> FlooringResult {
    let area = input.area_m2();
    let wet = (SqMeters(area) * Meters(non_negative(input.bedding_thickness_m))).value();
    FlooringResult {
        label: input.label.clone(),
        area_m2: area,
        tiles: input.tile_count(),
        quantities: MaterialQuantities::from_wet_volume(wet, MORTAR_DRY_FACTOR, &MixRatio::parse(&input.ratio)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bedding_mortar() {
        let input = FlooringInput::new("Hall", 5.0, 4.0, 0.04, "1:6");
        let r = calculate(&input);
        assert!((r.area_m2 - 20.0).abs() < 1e-12);

        let dry = 20.0 * 0.04 * 1.33;
        assert!((r.quantities.dry_volume_m3 - dry).abs() < 1e-12);
        assert!((r.quantities.cement_m3 - dry / 7.0).abs() < 1e-12);
        // 0.152 m³ / 0.035 = 4.34
        assert_eq!(r.quantities.cement_bags, 5);
        assert_eq!(r.tiles, None);
    }

    #[test]
    fn test_tile_count() {
        let input = FlooringInput::new("Bath", 2.5, 2.0, 0.03, "1:4").with_tile(0.6, 0.6);
        // 5.0 / 0.36 = 13.9
        assert_eq!(input.tile_count(), Some(14));

        let zero = FlooringInput::new("X", 2.0, 2.0, 0.03, "1:4").with_tile(0.0, 0.6);
        assert_eq!(zero.tile_count(), None);
    }
}
