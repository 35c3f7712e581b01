//! # Unit Types
//!
//! Type-safe wrappers for the SI units the estimation engine works in.
//! Record fields keep plain `f64` values with a unit suffix (`_mm`, `_m`,
//! `_kg`) so exported JSON stays flat; these wrappers are used at the
//! conversion points where unit confusion would be costly.
//!
//! ## Conventions
//!
//! - Bar dimensions and diameters: millimeters (mm)
//! - Cutting lengths, stock lengths, scrap: meters (m)
//! - Steel weight: kilograms (kg)
//! - Material volumes: cubic meters (m³)
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::units::{Meters, Millimeters};
//!
//! let cut = Millimeters(3140.0);
//! let cut_m: Meters = cut.into();
//! assert_eq!(cut_m.0, 3.14);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

// ============================================================================
// Mass, Area and Volume Units
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

/// Area in square meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqMeters(pub f64);

/// Volume in cubic meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicMeters(pub f64);

impl Mul<Meters> for SqMeters {
    type Output = CubicMeters;
    fn mul(self, rhs: Meters) -> CubicMeters {
        CubicMeters(self.0 * rhs.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }

            /// Clamp negative values to zero
            pub fn non_negative(self) -> Self {
                Self(self.0.max(0.0))
            }
        }
    };
}

impl_arithmetic!(Millimeters);
impl_arithmetic!(Meters);
impl_arithmetic!(Kilograms);
impl_arithmetic!(SqMeters);
impl_arithmetic!(CubicMeters);

/// Coerce a user-entered number to something every formula can use.
///
/// NaN and infinities become 0, mirroring how empty form fields are read.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Like [`finite_or_zero`], but also clamps negatives to 0 (counts, lengths).
pub fn non_negative(value: f64) -> f64 {
    finite_or_zero(value).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_m() {
        let mm = Millimeters(1752.0);
        let m: Meters = mm.into();
        assert!((m.0 - 1.752).abs() < 1e-12);
    }

    #[test]
    fn test_m_to_mm() {
        let m = Meters(12.0);
        let mm: Millimeters = m.into();
        assert_eq!(mm.0, 12000.0);
    }

    #[test]
    fn test_arithmetic() {
        let a = Meters(10.0);
        let b = Meters(4.0);
        assert_eq!((a + b).0, 14.0);
        assert_eq!((a - b).0, 6.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
        assert_eq!((b - a).non_negative().0, 0.0);
    }

    #[test]
    fn test_area_times_length() {
        let v = SqMeters(12.5) * Meters(0.02);
        assert!((v.0 - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_sanitizers() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(-3.0), -3.0);
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(2.5), 2.5);
    }

    #[test]
    fn test_serialization() {
        let m = Meters(12.5);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "12.5");

        let roundtrip: Meters = serde_json::from_str(&json).unwrap();
        assert_eq!(m, roundtrip);
    }
}
