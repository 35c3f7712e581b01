//! # Cutting Length
//!
//! Reduces a bent bar's dimensions to the straight length of steel that has
//! to be cut to fabricate it. All values in millimeters.
//!
//! ## Rules by shape kind
//!
//! - `SEGMENT_BASED`: `Σ dim[label] × multiplier − Σ k(angle) × d × count`
//! - `CUSTOM_LEGACY`: `formula(dims, d) − Σ k(angle) × d × count`
//! - `STIRRUP`: `2 × (A + B) + 14 × d` (hook allowance, no bend deduction)
//! - `CUSTOM`: `Σ dims − Σ k(angle) × d × count` from the line item's bends
//! - `STRAIGHT`, `L_BEND`, `U_BEND`: `Σ dims − bend_count × 2 × d`
//!
//! with `k(45°) = 1`, `k(90°) = 2`, `k(135°) = 3`, `k(180°) = 4`.
//! Missing dimensions read as 0 and the result is clamped at 0.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use estimate_core::calculations::cutting_length::compute_cutting_length;
//! use estimate_core::shapes::{ShapeRegistry, STIRRUP_ID};
//!
//! let registry = ShapeRegistry::builtin();
//! let dims = BTreeMap::from([("A".to_string(), 1000.0), ("B".to_string(), 500.0)]);
//! let mm = compute_cutting_length(registry.resolve(STIRRUP_ID), &dims, 10, &BTreeMap::new());
//! assert_eq!(mm, 3140.0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::CalcError;
use crate::shapes::{formula, BendAngle, CustomBends, LegacyBend, ShapeDefinition, ShapeKind, MULTIPLIER_SUFFIX};
use crate::units::finite_or_zero;

/// Stirrup hook allowance in bar diameters
pub const STIRRUP_HOOK_DIAMETERS: f64 = 14.0;

/// Deduction multiplier assumed for the fixed bends of built-in shapes (90°)
pub const STANDARD_BEND_K: f64 = 2.0;

/// Dimension inputs keyed by label, in millimeters. A key `"<label>_mult"`
/// overrides that segment's multiplier.
pub type Dimensions = BTreeMap<String, f64>;

/// Cutting length plus any problem met while computing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingLength {
    /// Straightened length of one bar (mm, ≥ 0)
    pub length_mm: f64,
    /// Set when a legacy formula could not be evaluated; `length_mm` is then 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<CalcError>,
}

impl CuttingLength {
    fn ok(length_mm: f64) -> Self {
        CuttingLength {
            length_mm: length_mm.max(0.0),
            issue: None,
        }
    }
}

fn dim(dims: &Dimensions, label: &str) -> f64 {
    dims.get(label).copied().map(finite_or_zero).unwrap_or(0.0)
}

fn multiplier_override(dims: &Dimensions, label: &str) -> Option<f64> {
    dims.get(&format!("{}{}", label, MULTIPLIER_SUFFIX))
        .copied()
        .filter(|m| m.is_finite())
}

/// Sum of every supplied dimension except `<label>_mult` overrides.
fn dimension_sum(dims: &Dimensions) -> f64 {
    dims.iter()
        .filter(|(k, _)| !k.ends_with(MULTIPLIER_SUFFIX))
        .map(|(_, v)| finite_or_zero(*v))
        .sum()
}

/// `Σ k(angle) × d × count` over an angle → count listing. Non-standard
/// angles carry no deduction.
fn angle_deduction<I>(bends: I, diameter_mm: f64) -> f64
where
    I: IntoIterator<Item = (u32, u32)>,
{
    bends
        .into_iter()
        .map(|(degrees, count)| match BendAngle::from_degrees(degrees) {
            Some(angle) => angle.k() * diameter_mm * count as f64,
            None => {
                debug!(degrees, "ignoring bend at non-standard angle");
                0.0
            }
        })
        .sum()
}

fn legacy_length(
    shape: &ShapeDefinition,
    formula_text: &str,
    bends: &[LegacyBend],
    dims: &Dimensions,
    diameter_mm: f64,
) -> CuttingLength {
    let lookup = |name: &str| -> Option<f64> {
        if name == "d" {
            return Some(diameter_mm);
        }
        if let Some(v) = dims.get(name) {
            return Some(finite_or_zero(*v));
        }
        shape.fields.iter().any(|f| f == name).then_some(0.0)
    };

    match formula::evaluate(formula_text, lookup) {
        Ok(raw) => {
            let deduction = angle_deduction(bends.iter().map(|b| (b.angle, b.count)), diameter_mm);
            CuttingLength::ok(raw - deduction)
        }
        Err(err) => {
            warn!(shape = %shape.name, error = %err, "legacy formula failed, cutting length set to 0");
            CuttingLength {
                length_mm: 0.0,
                issue: Some(err),
            }
        }
    }
}

/// Cutting length with diagnostics.
pub fn compute_cutting_length_detailed(
    shape: &ShapeDefinition,
    dims: &Dimensions,
    diameter_mm: u32,
    custom_bends: &CustomBends,
) -> CuttingLength {
    let d = diameter_mm as f64;

    match &shape.kind {
        ShapeKind::SegmentBased { segments, deductions } => {
            let total: f64 = segments
                .iter()
                .map(|s| {
                    let m = multiplier_override(dims, &s.label).unwrap_or(s.multiplier);
                    dim(dims, &s.label) * m
                })
                .sum();
            CuttingLength::ok(total - deductions.deduction_mm(d))
        }
        ShapeKind::CustomLegacy { formula, bends } => legacy_length(shape, formula, bends, dims, d),
        ShapeKind::Stirrup => {
            let a = dim(dims, "A");
            let b = dim(dims, "B");
            CuttingLength::ok(2.0 * (a + b) + STIRRUP_HOOK_DIAMETERS * d)
        }
        ShapeKind::Custom => {
            let bends = custom_bends.iter().filter_map(|(angle, count)| match angle.trim().parse::<u32>() {
                Ok(degrees) => Some((degrees, *count)),
                Err(_) => {
                    debug!(angle = %angle, "ignoring bend with non-numeric angle");
                    None
                }
            });
            let deduction = angle_deduction(bends, d);
            CuttingLength::ok(dimension_sum(dims) - deduction)
        }
        ShapeKind::Straight | ShapeKind::LBend | ShapeKind::UBend => {
            let deduction = shape.bend_count as f64 * STANDARD_BEND_K * d;
            CuttingLength::ok(dimension_sum(dims) - deduction)
        }
    }
}

/// Straightened length of one bar in millimeters (never negative).
pub fn compute_cutting_length(
    shape: &ShapeDefinition,
    dims: &Dimensions,
    diameter_mm: u32,
    custom_bends: &CustomBends,
) -> f64 {
    compute_cutting_length_detailed(shape, dims, diameter_mm, custom_bends).length_mm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{
        BendDeductions, Segment, ShapeRegistry, CUSTOM_ID, L_BEND_ID, STIRRUP_ID, STRAIGHT_ID, U_BEND_ID,
    };

    fn dims(pairs: &[(&str, f64)]) -> Dimensions {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn no_bends() -> CustomBends {
        CustomBends::new()
    }

    fn bends(pairs: &[(&str, u32)]) -> CustomBends {
        pairs.iter().map(|(a, c)| (a.to_string(), *c)).collect()
    }

    #[test]
    fn test_stirrup_formula() {
        let registry = ShapeRegistry::builtin();
        let mm = compute_cutting_length(
            registry.resolve(STIRRUP_ID),
            &dims(&[("A", 1000.0), ("B", 500.0)]),
            10,
            &no_bends(),
        );
        assert_eq!(mm, 3140.0);
    }

    #[test]
    fn test_segment_based_with_deductions() {
        let shape = ShapeDefinition::segment_based(
            "Two legs",
            vec![Segment::new("A", 1.0), Segment::new("B", 1.0)],
            BendDeductions::none().with(BendAngle::Deg90, 2),
        );
        let mm = compute_cutting_length(&shape, &dims(&[("A", 1000.0), ("B", 800.0)]), 12, &no_bends());
        assert_eq!(mm, 1752.0);
    }

    #[test]
    fn test_segment_multiplier_and_override() {
        let shape = ShapeDefinition::segment_based(
            "Crank",
            vec![Segment::new("A", 2.0), Segment::new("B", 1.0)],
            BendDeductions::none().with(BendAngle::Deg45, 4),
        );
        let base = dims(&[("A", 300.0), ("B", 2000.0)]);
        // 2*300 + 2000 - 4*1*16
        assert_eq!(compute_cutting_length(&shape, &base, 16, &no_bends()), 2536.0);

        let mut overridden = base.clone();
        overridden.insert("A_mult".to_string(), 3.0);
        assert_eq!(compute_cutting_length(&shape, &overridden, 16, &no_bends()), 2836.0);
    }

    #[test]
    fn test_generic_bend_deduction() {
        let registry = ShapeRegistry::builtin();
        let l = compute_cutting_length(
            registry.resolve(L_BEND_ID),
            &dims(&[("A", 2000.0), ("B", 300.0)]),
            12,
            &no_bends(),
        );
        assert_eq!(l, 2300.0 - 24.0);

        let u = compute_cutting_length(
            registry.resolve(U_BEND_ID),
            &dims(&[("A", 300.0), ("B", 2000.0), ("C", 300.0)]),
            10,
            &no_bends(),
        );
        assert_eq!(u, 2600.0 - 40.0);
    }

    #[test]
    fn test_generic_shapes_sum_every_dimension() {
        let registry = ShapeRegistry::builtin();
        let all = dims(&[("A", 1000.0), ("B", 500.0), ("C", 250.0), ("A_mult", 4.0)]);

        let straight = compute_cutting_length(registry.resolve(STRAIGHT_ID), &all, 10, &no_bends());
        assert_eq!(straight, 1750.0);

        // unresolved reference falls back to straight with the same sum
        let fallback = compute_cutting_length(registry.resolve("no_such_shape"), &all, 10, &no_bends());
        assert_eq!(fallback, 1750.0);

        let l = compute_cutting_length(registry.resolve(L_BEND_ID), &all, 10, &no_bends());
        assert_eq!(l, 1750.0 - 20.0);
    }

    #[test]
    fn test_custom_ad_hoc_bends() {
        let registry = ShapeRegistry::builtin();
        let bends = bends(&[("90", 2), ("135", 2), ("60", 5), ("x", 3)]);
        let mm = compute_cutting_length(
            registry.resolve(CUSTOM_ID),
            &dims(&[("A", 1000.0), ("B", 1000.0), ("A_mult", 7.0)]),
            10,
            &bends,
        );
        // 2000 - (2*10*2 + 3*10*2); 60° and junk keys carry no deduction
        assert_eq!(mm, 2000.0 - 100.0);
    }

    #[test]
    fn test_legacy_formula_uses_same_k_table() {
        let shape = ShapeDefinition::legacy_formula(
            "Hooked",
            vec!["A".into(), "B".into()],
            "A + 2*B + 9*d",
            vec![LegacyBend { angle: 90, count: 2 }, LegacyBend { angle: 45, count: 1 }],
        );
        let mm = compute_cutting_length(&shape, &dims(&[("A", 1000.0), ("B", 200.0)]), 10, &no_bends());
        // 1000 + 400 + 90 - (2*10*2 + 1*10*1)
        assert_eq!(mm, 1440.0);
    }

    #[test]
    fn test_legacy_missing_field_reads_zero() {
        let shape = ShapeDefinition::legacy_formula("Two", vec!["A".into(), "B".into()], "A + B", vec![]);
        assert_eq!(compute_cutting_length(&shape, &dims(&[("A", 700.0)]), 8, &no_bends()), 700.0);
    }

    #[test]
    fn test_malformed_legacy_formula_is_zero_with_issue() {
        let shape = ShapeDefinition::legacy_formula("Broken", vec!["A".into()], "A + (", vec![]);
        let result = compute_cutting_length_detailed(&shape, &dims(&[("A", 1000.0)]), 10, &no_bends());
        assert_eq!(result.length_mm, 0.0);
        assert!(matches!(result.issue, Some(CalcError::FormulaError { .. })));
    }

    #[test]
    fn test_never_negative() {
        let registry = ShapeRegistry::builtin();
        for id in [STRAIGHT_ID, L_BEND_ID, U_BEND_ID, STIRRUP_ID, CUSTOM_ID] {
            let mm = compute_cutting_length(
                registry.resolve(id),
                &dims(&[("A", -5000.0), ("B", 10.0)]),
                32,
                &bends(&[("180", 10)]),
            );
            assert!(mm >= 0.0, "shape {}", id);
        }

        let heavy = ShapeDefinition::segment_based(
            "Short",
            vec![Segment::new("A", 1.0)],
            BendDeductions::none().with(BendAngle::Deg180, 20),
        );
        assert_eq!(compute_cutting_length(&heavy, &dims(&[("A", 100.0)]), 32, &no_bends()), 0.0);
    }

    #[test]
    fn test_missing_and_nan_dimensions() {
        let registry = ShapeRegistry::builtin();
        let mm = compute_cutting_length(
            registry.resolve(STIRRUP_ID),
            &dims(&[("A", f64::NAN)]),
            8,
            &no_bends(),
        );
        assert_eq!(mm, 112.0);
    }

    #[test]
    fn test_empty_segments() {
        let shape = ShapeDefinition::segment_based("Empty", vec![], BendDeductions::none());
        assert_eq!(compute_cutting_length(&shape, &Dimensions::new(), 10, &no_bends()), 0.0);
    }
}
