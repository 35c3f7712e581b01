//! # Bar Line Items
//!
//! Turns one bar-bending-schedule form row into a fully derived line item
//! (cutting length, total length, weight) and rolls weights up across items.
//!
//! - `BarForm` - what the user enters (JSON-serializable)
//! - `BarLineItem` - the immutable derived record; every edit produces a new one
//! - `BarItemAggregator` - pure `compute_item(form) -> BarLineItem` over an
//!   injected shape registry and unit weight table
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::calculations::bar_item::{BarForm, BarItemAggregator};
//! use estimate_core::materials::steel::UnitWeightTable;
//! use estimate_core::shapes::{ShapeRegistry, STIRRUP_ID};
//!
//! let registry = ShapeRegistry::builtin();
//! let weights = UnitWeightTable::standard();
//! let aggregator = BarItemAggregator::new(&registry, &weights);
//!
//! let form = BarForm::new("S1", STIRRUP_ID, 10)
//!     .with_dim("A", 1000.0)
//!     .with_dim("B", 500.0)
//!     .with_members(4.0, 20.0);
//!
//! let item = aggregator.compute_item(&form).unwrap();
//! assert!((item.cutting_length_m - 3.14).abs() < 1e-9);
//! assert!((item.total_length_m - 251.2).abs() < 1e-9);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calculations::cutting_length::{compute_cutting_length_detailed, Dimensions};
use crate::errors::{CalcError, CalcResult, LookupPolicy};
use crate::materials::steel::UnitWeightTable;
use crate::shapes::{CustomBends, ShapeRegistry};
use crate::units::{non_negative, Meters, Millimeters};

/// One bar-bending-schedule row as entered.
///
/// ## JSON Example
///
/// ```json
/// {
///   "bar_mark": "B1",
///   "description": "Beam bottom bars",
///   "shape_ref": "l_bend",
///   "diameter_mm": 16,
///   "dims": { "A": 4200, "B": 300 },
///   "no_members": 6,
///   "bars_per_member": 4
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarForm {
    /// Drawing label for the bar (e.g. "B1")
    pub bar_mark: String,

    #[serde(default)]
    pub description: String,

    /// Shape id (or name) in the registry
    pub shape_ref: String,

    /// Bar diameter in mm
    pub diameter_mm: u32,

    /// Segment label → length in mm, plus optional `<label>_mult` overrides
    #[serde(default)]
    pub dims: Dimensions,

    /// Ad-hoc bends for the generic custom shape
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_bends: CustomBends,

    /// Number of structural members (beams, columns, ...)
    #[serde(default)]
    pub no_members: f64,

    /// Bars in each member; derived from span and spacing when both are given
    #[serde(default)]
    pub bars_per_member: f64,

    /// Bar spacing in mm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_mm: Option<f64>,

    /// Span the bars are distributed over, in mm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_length_mm: Option<f64>,
}

impl BarForm {
    /// Start a form with one member of one bar and no dimensions
    pub fn new(bar_mark: impl Into<String>, shape_ref: impl Into<String>, diameter_mm: u32) -> Self {
        BarForm {
            bar_mark: bar_mark.into(),
            description: String::new(),
            shape_ref: shape_ref.into(),
            diameter_mm,
            dims: Dimensions::new(),
            custom_bends: CustomBends::new(),
            no_members: 1.0,
            bars_per_member: 1.0,
            spacing_mm: None,
            span_length_mm: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dim(mut self, label: impl Into<String>, length_mm: f64) -> Self {
        self.dims.insert(label.into(), length_mm);
        self
    }

    pub fn with_bend(mut self, angle_deg: u32, count: u32) -> Self {
        self.custom_bends.insert(angle_deg.to_string(), count);
        self
    }

    pub fn with_members(mut self, no_members: f64, bars_per_member: f64) -> Self {
        self.no_members = no_members;
        self.bars_per_member = bars_per_member;
        self
    }

    /// Distribute bars over a span: `ceil(span / spacing) + 1` per member
    pub fn with_distribution(mut self, span_length_mm: f64, spacing_mm: f64) -> Self {
        self.span_length_mm = Some(span_length_mm);
        self.spacing_mm = Some(spacing_mm);
        self
    }

    /// Bars per member actually used. Span/spacing wins when both are
    /// positive; otherwise the entered count (invalid → 0).
    pub fn effective_bars_per_member(&self) -> f64 {
        let span = self.span_length_mm.map(non_negative).unwrap_or(0.0);
        let spacing = self.spacing_mm.map(non_negative).unwrap_or(0.0);
        if span > 0.0 && spacing > 0.0 {
            (span / spacing).ceil() + 1.0
        } else {
            non_negative(self.bars_per_member)
        }
    }

    /// Form-level checks run when a row is added to an estimation.
    pub fn validate(&self) -> CalcResult<()> {
        if self.bar_mark.trim().is_empty() {
            return Err(CalcError::missing_field("bar_mark"));
        }
        if self.shape_ref.trim().is_empty() {
            return Err(CalcError::missing_field("shape_ref"));
        }
        if self.diameter_mm == 0 {
            return Err(CalcError::invalid_input("diameter_mm", "0", "Diameter must be positive"));
        }
        Ok(())
    }
}

/// Derived bar-bending-schedule row. Plain data; recomputed in full on edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarLineItem {
    pub bar_mark: String,
    pub description: String,
    pub shape_ref: String,
    /// Kind of the shape the reference resolved to (e.g. "STIRRUP")
    pub shape_kind: String,
    pub diameter_mm: u32,
    pub dims: Dimensions,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_bends: CustomBends,
    pub no_members: f64,
    /// Effective bars per member (after span/spacing derivation)
    pub bars_per_member: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_length_mm: Option<f64>,

    /// `no_members × bars_per_member`
    pub total_bars: f64,
    /// Straightened length of one bar (m)
    pub cutting_length_m: f64,
    /// `cutting_length_m × total_bars`
    pub total_length_m: f64,
    pub unit_weight_kg_per_m: f64,
    /// `total_length_m × unit_weight_kg_per_m`
    pub total_weight_kg: f64,

    /// Problems met while deriving (e.g. a broken legacy formula)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl BarLineItem {
    /// Rebuild the editable form this item was derived from
    pub fn to_form(&self) -> BarForm {
        BarForm {
            bar_mark: self.bar_mark.clone(),
            description: self.description.clone(),
            shape_ref: self.shape_ref.clone(),
            diameter_mm: self.diameter_mm,
            dims: self.dims.clone(),
            custom_bends: self.custom_bends.clone(),
            no_members: self.no_members,
            bars_per_member: self.bars_per_member,
            spacing_mm: self.spacing_mm,
            span_length_mm: self.span_length_mm,
        }
    }
}

/// Derives line items from forms against an injected registry and weight table.
#[derive(Debug, Clone, Copy)]
pub struct BarItemAggregator<'a> {
    registry: &'a ShapeRegistry,
    weights: &'a UnitWeightTable,
    shape_policy: LookupPolicy,
    diameter_policy: LookupPolicy,
}

impl<'a> BarItemAggregator<'a> {
    /// Aggregator with lenient lookups (unknown shape → straight, unknown diameter → 0 kg/m)
    pub fn new(registry: &'a ShapeRegistry, weights: &'a UnitWeightTable) -> Self {
        BarItemAggregator {
            registry,
            weights,
            shape_policy: LookupPolicy::Lenient,
            diameter_policy: LookupPolicy::Lenient,
        }
    }

    pub fn with_policies(mut self, shape_policy: LookupPolicy, diameter_policy: LookupPolicy) -> Self {
        self.shape_policy = shape_policy;
        self.diameter_policy = diameter_policy;
        self
    }

    /// Derive one line item.
    ///
    /// Always `Ok` under lenient policies; strict policies report
    /// [`CalcError::UnknownShape`] / [`CalcError::UnsupportedDiameter`].
    pub fn compute_item(&self, form: &BarForm) -> CalcResult<BarLineItem> {
        let shape = self.registry.resolve_with(&form.shape_ref, self.shape_policy)?;
        let unit_weight = self.weights.kg_per_m_with(form.diameter_mm, self.diameter_policy)?;

        let cutting = compute_cutting_length_detailed(shape, &form.dims, form.diameter_mm, &form.custom_bends);
        let cutting_length_m = Meters::from(Millimeters(cutting.length_mm)).value();

        let no_members = non_negative(form.no_members);
        let bars_per_member = form.effective_bars_per_member();
        let total_bars = no_members * bars_per_member;
        let total_length_m = cutting_length_m * total_bars;

        let issues = cutting.issue.iter().map(|e| e.to_string()).collect();

        Ok(BarLineItem {
            bar_mark: form.bar_mark.clone(),
            description: form.description.clone(),
            shape_ref: form.shape_ref.clone(),
            shape_kind: shape.kind.code().to_string(),
            diameter_mm: form.diameter_mm,
            dims: form.dims.clone(),
            custom_bends: form.custom_bends.clone(),
            no_members,
            bars_per_member,
            spacing_mm: form.spacing_mm,
            span_length_mm: form.span_length_mm,
            total_bars,
            cutting_length_m,
            total_length_m,
            unit_weight_kg_per_m: unit_weight,
            total_weight_kg: total_length_m * unit_weight,
            issues,
        })
    }

    /// Derive every form in order, stopping at the first strict-policy error.
    pub fn compute_all<'f, I>(&self, forms: I) -> CalcResult<Vec<BarLineItem>>
    where
        I: IntoIterator<Item = &'f BarForm>,
    {
        forms.into_iter().map(|f| self.compute_item(f)).collect()
    }
}

/// Σ total_weight_kg over all items (0 for none)
pub fn total_steel_weight(items: &[BarLineItem]) -> f64 {
    items.iter().map(|i| i.total_weight_kg).sum()
}

/// Σ total_length_m over all items
pub fn total_steel_length(items: &[BarLineItem]) -> f64 {
    items.iter().map(|i| i.total_length_m).sum()
}

/// Total weight grouped by diameter, ascending by diameter
pub fn weight_by_diameter(items: &[BarLineItem]) -> BTreeMap<u32, f64> {
    let mut by_dia = BTreeMap::new();
    for item in items {
        *by_dia.entry(item.diameter_mm).or_insert(0.0) += item.total_weight_kg;
    }
    by_dia
}

/// Weight rollup for display and export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SteelSummary {
    pub item_count: usize,
    pub total_length_m: f64,
    pub total_weight_kg: f64,
    pub weight_by_diameter: BTreeMap<u32, f64>,
}

impl SteelSummary {
    pub fn from_items(items: &[BarLineItem]) -> Self {
        SteelSummary {
            item_count: items.len(),
            total_length_m: total_steel_length(items),
            total_weight_kg: total_steel_weight(items),
            weight_by_diameter: weight_by_diameter(items),
        }
    }
}
