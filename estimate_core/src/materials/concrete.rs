//! # Concrete
//!
//! Wet volume from member geometry, dry volume at ×1.54, then cement, sand and
//! aggregate by nominal mix.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::materials::concrete::{calculate, ConcreteGeometry, ConcreteInput};
//!
//! let slab = ConcreteInput::new(
//!     "Slab S1",
//!     ConcreteGeometry::Rectangle { length_m: 5.0, width_m: 4.0, depth_m: 0.15 },
//!     "1:2:4",
//! );
//! let result = calculate(&slab);
//! assert!((result.quantities.wet_volume_m3 - 3.0).abs() < 1e-9);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{MaterialQuantities, MixRatio, CONCRETE_DRY_FACTOR};
use crate::units::non_negative;

/// Member geometry for a concrete pour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ConcreteGeometry {
    /// Slabs, beams, rectangular columns and footings
    Rectangle {
        length_m: f64,
        width_m: f64,
        depth_m: f64,
    },
    /// Sloped footings and tapered sections: `(a + b) / 2 × h × L`
    Trapezoid {
        top_width_m: f64,
        bottom_width_m: f64,
        height_m: f64,
        length_m: f64,
    },
    /// Round columns and piles
    Circular { diameter_m: f64, height_m: f64 },
    /// Known plan area times a thickness
    AreaBased { area_m2: f64, thickness_m: f64 },
    /// Triangular prism: `½ × b × h × L`
    Triangular {
        base_m: f64,
        height_m: f64,
        length_m: f64,
    },
}

impl ConcreteGeometry {
    /// Volume of one member (m³, ≥ 0)
    pub fn volume_m3(&self) -> f64 {
        let v = non_negative;
        match *self {
            ConcreteGeometry::Rectangle {
                length_m,
                width_m,
                depth_m,
            } => v(length_m) * v(width_m) * v(depth_m),
            ConcreteGeometry::Trapezoid {
                top_width_m,
                bottom_width_m,
                height_m,
                length_m,
            } => (v(top_width_m) + v(bottom_width_m)) / 2.0 * v(height_m) * v(length_m),
            ConcreteGeometry::Circular { diameter_m, height_m } => {
                let r = v(diameter_m) / 2.0;
                PI * r * r * v(height_m)
            }
            ConcreteGeometry::AreaBased { area_m2, thickness_m } => v(area_m2) * v(thickness_m),
            ConcreteGeometry::Triangular {
                base_m,
                height_m,
                length_m,
            } => 0.5 * v(base_m) * v(height_m) * v(length_m),
        }
    }
}

/// Input for one concrete item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteInput {
    pub label: String,
    pub geometry: ConcreteGeometry,
    /// Number of identical members
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    /// Nominal mix, e.g. "1:1.5:3"
    pub ratio: String,
}

fn default_quantity() -> f64 {
    1.0
}

impl ConcreteInput {
    pub fn new(label: impl Into<String>, geometry: ConcreteGeometry, ratio: impl Into<String>) -> Self {
        ConcreteInput {
            label: label.into(),
            geometry,
            quantity: 1.0,
            ratio: ratio.into(),
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Total wet volume over all members
    pub fn wet_volume_m3(&self) -> f64 {
        self.geometry.volume_m3() * non_negative(self.quantity)
    }
}

/// Result for one concrete item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteResult {
    pub label: String,
    pub quantities: MaterialQuantities,
}

/// Derive materials for a concrete item.
pub fn calculate(input: &ConcreteInput) -> ConcreteResult {
    let ratio = MixRatio::parse(&input.ratio);
    ConcreteResult {
        label: input.label.clone(),
        quantities: MaterialQuantities::from_wet_volume(input.wet_volume_m3(), CONCRETE_DRY_FACTOR, &ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_volume_mix() {
        let input = ConcreteInput::new(
            "Cube",
            ConcreteGeometry::Rectangle {
                length_m: 1.0,
                width_m: 1.0,
                depth_m: 1.0,
            },
            "1:1.5:3",
        );
        let q = calculate(&input).quantities;
        assert!((q.dry_volume_m3 - 1.54).abs() < 1e-12);
        assert_eq!(q.cement_bags, 8);
        assert!((q.sand_m3 - 0.42).abs() < 1e-9);
        assert!((q.aggregate_m3 - 0.84).abs() < 1e-9);
    }

    #[test]
    fn test_geometries() {
        let trap = ConcreteGeometry::Trapezoid {
            top_width_m: 0.6,
            bottom_width_m: 1.2,
            height_m: 0.5,
            length_m: 2.0,
        };
        assert!((trap.volume_m3() - 0.9).abs() < 1e-12);

        let circ = ConcreteGeometry::Circular {
            diameter_m: 0.4,
            height_m: 3.0,
        };
        assert!((circ.volume_m3() - PI * 0.04 * 3.0).abs() < 1e-12);

        let area = ConcreteGeometry::AreaBased {
            area_m2: 20.0,
            thickness_m: 0.1,
        };
        assert!((area.volume_m3() - 2.0).abs() < 1e-12);

        let tri = ConcreteGeometry::Triangular {
            base_m: 1.0,
            height_m: 0.6,
            length_m: 4.0,
        };
        assert!((tri.volume_m3() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_quantity_multiplies() {
        let input = ConcreteInput::new(
            "Column",
            ConcreteGeometry::Rectangle {
                length_m: 0.3,
                width_m: 0.3,
                depth_m: 3.0,
            },
            "1:2:4",
        )
        .with_quantity(10.0);
        assert!((input.wet_volume_m3() - 2.7).abs() < 1e-9);
    }

    #[test]
    fn test_negative_dimensions_clamp() {
        let geom = ConcreteGeometry::Rectangle {
            length_m: -1.0,
            width_m: 2.0,
            depth_m: 2.0,
        };
        assert_eq!(geom.volume_m3(), 0.0);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"label":"F1","geometry":{"shape":"area_based","area_m2":4,"thickness_m":0.5},"ratio":"1:2:4"}"#;
        let input: ConcreteInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.quantity, 1.0);
        assert!((input.wet_volume_m3() - 2.0).abs() < 1e-12);
    }
}
