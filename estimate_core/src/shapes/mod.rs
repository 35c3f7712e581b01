//! # Bar Shape Definitions
//!
//! Templates describing how a reinforcement bar is bent. A shape is pure
//! data: the cutting-length calculator in [`crate::calculations::cutting_length`]
//! interprets it.
//!
//! ## Shape kinds
//!
//! | Kind            | Dimensions     | Deduction rule                          |
//! |-----------------|----------------|-----------------------------------------|
//! | `STRAIGHT`      | `A`            | none                                    |
//! | `L_BEND`        | `A`, `B`       | 1 × 90° (2d)                            |
//! | `U_BEND`        | `A`, `B`, `C`  | 2 × 90° (2d each)                       |
//! | `STIRRUP`       | `A`, `B`       | fixed hook allowance, `2(A+B) + 14d`    |
//! | `CUSTOM`        | any            | ad-hoc `{angle: count}` on the line item|
//! | `CUSTOM_LEGACY` | formula vars   | `[{angle, count}]` list                 |
//! | `SEGMENT_BASED` | segment labels | `{45/90/135/180: count}` map            |
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "id": "0b5d7c1e-6f0a-4b5e-8d43-5d2b1a9f3c10",
//!   "name": "Crank bar",
//!   "kind": "SEGMENT_BASED",
//!   "segments": [
//!     { "label": "A", "multiplier": 2.0 },
//!     { "label": "B", "multiplier": 1.0 }
//!   ],
//!   "deductions": { "45": 2, "90": 2 }
//! }
//! ```

pub mod formula;
pub mod registry;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

pub use registry::ShapeRegistry;

/// Id of the built-in straight bar, also the fallback for unresolved references
pub const STRAIGHT_ID: &str = "straight";
/// Id of the built-in L-bend
pub const L_BEND_ID: &str = "l_bend";
/// Id of the built-in U-bend
pub const U_BEND_ID: &str = "u_bend";
/// Id of the built-in rectangular stirrup
pub const STIRRUP_ID: &str = "stirrup";
/// Id of the built-in generic shape that takes ad-hoc bends from the line item
pub const CUSTOM_ID: &str = "custom";

/// Suffix marking a per-segment multiplier override in a dimension map
pub const MULTIPLIER_SUFFIX: &str = "_mult";

/// Standard bend angle with its deduction multiplier `k` (deduction = k × d).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BendAngle {
    #[serde(rename = "45")]
    Deg45,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "135")]
    Deg135,
    #[serde(rename = "180")]
    Deg180,
}

impl BendAngle {
    /// All supported angles, ascending
    pub const ALL: [BendAngle; 4] = [
        BendAngle::Deg45,
        BendAngle::Deg90,
        BendAngle::Deg135,
        BendAngle::Deg180,
    ];

    /// Look up a standard angle from degrees
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            45 => Some(BendAngle::Deg45),
            90 => Some(BendAngle::Deg90),
            135 => Some(BendAngle::Deg135),
            180 => Some(BendAngle::Deg180),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            BendAngle::Deg45 => 45,
            BendAngle::Deg90 => 90,
            BendAngle::Deg135 => 135,
            BendAngle::Deg180 => 180,
        }
    }

    /// Deduction multiplier in bar diameters
    pub fn k(&self) -> f64 {
        match self {
            BendAngle::Deg45 => 1.0,
            BendAngle::Deg90 => 2.0,
            BendAngle::Deg135 => 3.0,
            BendAngle::Deg180 => 4.0,
        }
    }
}

impl std::fmt::Display for BendAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Bend counts per standard angle for a segment-based shape.
///
/// Serializes as a map keyed by degrees, e.g. `{"90": 2}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BendDeductions {
    #[serde(rename = "45", default, skip_serializing_if = "is_zero")]
    pub deg45: u32,
    #[serde(rename = "90", default, skip_serializing_if = "is_zero")]
    pub deg90: u32,
    #[serde(rename = "135", default, skip_serializing_if = "is_zero")]
    pub deg135: u32,
    #[serde(rename = "180", default, skip_serializing_if = "is_zero")]
    pub deg180: u32,
}

fn is_zero(count: &u32) -> bool {
    *count == 0
}

impl BendDeductions {
    /// No bends
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the count for one angle
    pub fn with(mut self, angle: BendAngle, count: u32) -> Self {
        *self.count_mut(angle) = count;
        self
    }

    pub fn count(&self, angle: BendAngle) -> u32 {
        match angle {
            BendAngle::Deg45 => self.deg45,
            BendAngle::Deg90 => self.deg90,
            BendAngle::Deg135 => self.deg135,
            BendAngle::Deg180 => self.deg180,
        }
    }

    fn count_mut(&mut self, angle: BendAngle) -> &mut u32 {
        match angle {
            BendAngle::Deg45 => &mut self.deg45,
            BendAngle::Deg90 => &mut self.deg90,
            BendAngle::Deg135 => &mut self.deg135,
            BendAngle::Deg180 => &mut self.deg180,
        }
    }

    /// Total number of bends across all angles
    pub fn total_bends(&self) -> u32 {
        BendAngle::ALL.iter().map(|a| self.count(*a)).sum()
    }

    /// Total deduction in mm for a bar of the given diameter
    pub fn deduction_mm(&self, diameter_mm: f64) -> f64 {
        BendAngle::ALL
            .iter()
            .map(|a| a.k() * diameter_mm * self.count(*a) as f64)
            .sum()
    }
}

/// One bend entry of a legacy formula shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyBend {
    /// Bend angle in degrees
    pub angle: u32,
    /// Number of bends at that angle
    pub count: u32,
}

/// One named straight run of a segment-based shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Dimension label, looked up in the line item's dimension map
    pub label: String,
    /// How many times this run occurs in the bar (≥ 1)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

impl Segment {
    pub fn new(label: impl Into<String>, multiplier: f64) -> Self {
        Segment {
            label: label.into(),
            multiplier,
        }
    }
}

/// Discriminant plus kind-specific payload of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShapeKind {
    Straight,
    LBend,
    UBend,
    Stirrup,
    /// Generic shape whose bends come from the line item's `custom_bends`
    Custom,
    /// Free-text arithmetic formula. Kept for stored shapes; not extended.
    CustomLegacy {
        formula: String,
        #[serde(default)]
        bends: Vec<LegacyBend>,
    },
    SegmentBased {
        segments: Vec<Segment>,
        #[serde(default)]
        deductions: BendDeductions,
    },
}

impl ShapeKind {
    /// Wire name of the kind
    pub fn code(&self) -> &'static str {
        match self {
            ShapeKind::Straight => "STRAIGHT",
            ShapeKind::LBend => "L_BEND",
            ShapeKind::UBend => "U_BEND",
            ShapeKind::Stirrup => "STIRRUP",
            ShapeKind::Custom => "CUSTOM",
            ShapeKind::CustomLegacy { .. } => "CUSTOM_LEGACY",
            ShapeKind::SegmentBased { .. } => "SEGMENT_BASED",
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(
            self,
            ShapeKind::CustomLegacy { .. } | ShapeKind::SegmentBased { .. }
        )
    }
}

/// Immutable shape template, identified by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDefinition {
    /// Registry key; built-ins use fixed ids, user shapes get a UUID
    #[serde(default)]
    pub id: String,

    /// Display name
    pub name: String,

    /// Ordered dimension field names for built-in and legacy shapes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    /// Standard 90° bend count for the generic deduction path
    #[serde(default)]
    pub bend_count: u32,

    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl ShapeDefinition {
    /// Create a segment-based shape. The id is left empty for the owner to assign.
    pub fn segment_based(name: impl Into<String>, segments: Vec<Segment>, deductions: BendDeductions) -> Self {
        ShapeDefinition {
            id: String::new(),
            name: name.into(),
            fields: Vec::new(),
            bend_count: 0,
            kind: ShapeKind::SegmentBased { segments, deductions },
        }
    }

    /// Create a legacy formula shape over the given variable names.
    pub fn legacy_formula(
        name: impl Into<String>,
        fields: Vec<String>,
        formula: impl Into<String>,
        bends: Vec<LegacyBend>,
    ) -> Self {
        ShapeDefinition {
            id: String::new(),
            name: name.into(),
            fields,
            bend_count: 0,
            kind: ShapeKind::CustomLegacy {
                formula: formula.into(),
                bends,
            },
        }
    }

    /// Builder-style id assignment
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Dimension labels a form should ask for, in order.
    pub fn dimension_labels(&self) -> Vec<&str> {
        match &self.kind {
            ShapeKind::SegmentBased { segments, .. } => {
                segments.iter().map(|s| s.label.as_str()).collect()
            }
            _ => self.fields.iter().map(String::as_str).collect(),
        }
    }

    /// Check the structural invariants of a user-defined shape.
    ///
    /// Segment labels must be non-empty and unique, multipliers ≥ 1, and a
    /// legacy formula must at least parse.
    pub fn validate(&self) -> CalcResult<()> {
        if self.name.trim().is_empty() {
            return Err(CalcError::missing_field("name"));
        }
        match &self.kind {
            ShapeKind::SegmentBased { segments, .. } => {
                if segments.is_empty() {
                    return Err(CalcError::invalid_input(
                        "segments",
                        "[]",
                        "A segment-based shape needs at least one segment",
                    ));
                }
                let mut seen = HashSet::new();
                for segment in segments {
                    let label = segment.label.trim();
                    if label.is_empty() {
                        return Err(CalcError::missing_field("segments.label"));
                    }
                    if label.ends_with(MULTIPLIER_SUFFIX) {
                        return Err(CalcError::invalid_input(
                            "segments.label",
                            label,
                            "Label may not end with the multiplier suffix",
                        ));
                    }
                    if !seen.insert(label) {
                        return Err(CalcError::invalid_input(
                            "segments.label",
                            label,
                            "Segment labels must be unique within a shape",
                        ));
                    }
                    if !(segment.multiplier >= 1.0) {
                        return Err(CalcError::invalid_input(
                            "segments.multiplier",
                            segment.multiplier.to_string(),
                            "Multiplier must be at least 1",
                        ));
                    }
                }
            }
            ShapeKind::CustomLegacy { formula, .. } => {
                formula::parse(formula)?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Ad-hoc bend counts keyed by angle in degrees (`{"90": 2}`), for the
/// generic `CUSTOM` shape. Keys stay strings so the map survives buffered
/// deserialization inside tagged item enums.
pub type CustomBends = BTreeMap<String, u32>;

/// Built-in shape templates, in display order.
pub fn builtin_shapes() -> Vec<ShapeDefinition> {
    fn builtin(id: &str, name: &str, fields: &[&str], bend_count: u32, kind: ShapeKind) -> ShapeDefinition {
        ShapeDefinition {
            id: id.to_string(),
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            bend_count,
            kind,
        }
    }

    vec![
        builtin(STRAIGHT_ID, "Straight", &["A"], 0, ShapeKind::Straight),
        builtin(L_BEND_ID, "L-Bend", &["A", "B"], 1, ShapeKind::LBend),
        builtin(U_BEND_ID, "U-Bend", &["A", "B", "C"], 2, ShapeKind::UBend),
        builtin(STIRRUP_ID, "Stirrup", &["A", "B"], 0, ShapeKind::Stirrup),
        builtin(CUSTOM_ID, "Custom", &[], 0, ShapeKind::Custom),
    ]
}
