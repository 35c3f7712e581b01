//! # Estimation Data Structures
//!
//! The `Estimation` struct is the root container for one job's quantities.
//! Estimations serialize to human-readable JSON (see [`crate::file_io`]).
//!
//! ## Structure
//!
//! ```text
//! Estimation
//! ├── meta: EstimationMetadata (schema version, job info, timestamps)
//! ├── settings: EstimationSettings (stock length, lookup policies)
//! ├── shapes: Vec<ShapeDefinition> (user-defined bar shapes)
//! ├── items: Vec<EstimationItem> (steel, concrete, masonry, plaster, flooring)
//! └── scrap_stock: Vec<ScrapStockItem> (reusable offcuts)
//! ```
//!
//! Nothing derived is stored. Line items, weight rollups, cutting plans and
//! material totals are recomputed in full from the current lists on every call.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::calculations::BarForm;
//! use estimate_core::estimation::{Estimation, EstimationItem};
//!
//! let mut est = Estimation::new("Block A", "Plot 12", "QS Office");
//! est.add_item(EstimationItem::Steel(
//!     BarForm::new("B1", "straight", 12).with_dim("A", 6000.0).with_members(1.0, 10.0),
//! )).unwrap();
//!
//! let summary = est.steel_summary().unwrap();
//! assert!((summary.total_length_m - 60.0).abs() < 1e-9);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::bar_item::{BarForm, BarItemAggregator, BarLineItem, SteelSummary};
use crate::calculations::optimizer::{self, OptimizationResult, OptimizerConfig, ScrapStockItem};
use crate::errors::{CalcError, CalcResult};
pub use crate::errors::LookupPolicy;
use crate::materials::concrete::{self, ConcreteInput, ConcreteResult};
use crate::materials::flooring::{self, FlooringInput, FlooringResult};
use crate::materials::masonry::{self, MasonryInput, MasonryResult};
use crate::materials::plaster::{self, PlasterInput, PlasterResult};
use crate::materials::steel::UnitWeightTable;
use crate::materials::MaterialQuantities;
use crate::shapes::{ShapeDefinition, ShapeRegistry};

/// Current schema version for estimation files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Estimation-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationSettings {
    /// Standard stock bar length (m)
    #[serde(default = "default_stock_length")]
    pub stock_length_m: f64,
    #[serde(default)]
    pub shape_policy: LookupPolicy,
    #[serde(default)]
    pub diameter_policy: LookupPolicy,
}

fn default_stock_length() -> f64 {
    optimizer::STANDARD_STOCK_LENGTH_M
}

impl Default for EstimationSettings {
    fn default() -> Self {
        EstimationSettings {
            stock_length_m: optimizer::STANDARD_STOCK_LENGTH_M,
            shape_policy: LookupPolicy::Lenient,
            diameter_policy: LookupPolicy::Lenient,
        }
    }
}

impl EstimationSettings {
    /// Settings with both lookups strict
    pub fn strict() -> Self {
        EstimationSettings {
            shape_policy: LookupPolicy::Strict,
            diameter_policy: LookupPolicy::Strict,
            ..Default::default()
        }
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig::with_stock_length(self.stock_length_m)
    }
}

/// Estimation metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Estimation title, e.g. "Block A - Substructure"
    pub name: String,

    /// Site or project location
    pub site: String,

    /// Who prepared the estimate
    pub prepared_by: String,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// One estimation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EstimationItem {
    /// Reinforcement bar line
    Steel(BarForm),
    Concrete(ConcreteInput),
    Masonry(MasonryInput),
    Plaster(PlasterInput),
    Flooring(FlooringInput),
}

impl EstimationItem {
    /// Display label (bar mark for steel)
    pub fn label(&self) -> &str {
        match self {
            EstimationItem::Steel(b) => &b.bar_mark,
            EstimationItem::Concrete(c) => &c.label,
            EstimationItem::Masonry(m) => &m.label,
            EstimationItem::Plaster(p) => &p.label,
            EstimationItem::Flooring(f) => &f.label,
        }
    }

    /// Form-level checks; only steel rows carry any
    pub fn validate(&self) -> CalcResult<()> {
        match self {
            EstimationItem::Steel(form) => form.validate(),
            _ => Ok(()),
        }
    }

    /// Item type name for display
    pub fn item_type(&self) -> &'static str {
        match self {
            EstimationItem::Steel(_) => "Steel",
            EstimationItem::Concrete(_) => "Concrete",
            EstimationItem::Masonry(_) => "Masonry",
            EstimationItem::Plaster(_) => "Plaster",
            EstimationItem::Flooring(_) => "Flooring",
        }
    }
}

/// Per-item material results plus their sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub concrete: Vec<ConcreteResult>,
    pub masonry: Vec<MasonryResult>,
    pub plaster: Vec<PlasterResult>,
    pub flooring: Vec<FlooringResult>,
    /// Σ over every non-steel item
    pub totals: MaterialQuantities,
}

/// Root estimation container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimation {
    pub meta: EstimationMetadata,

    #[serde(default)]
    pub settings: EstimationSettings,

    /// User-defined bar shapes
    #[serde(default)]
    pub shapes: Vec<ShapeDefinition>,

    /// Ordered items; removal is by index
    #[serde(default)]
    pub items: Vec<EstimationItem>,

    /// Offcuts available to the optimizer; never consumed by it
    #[serde(default)]
    pub scrap_stock: Vec<ScrapStockItem>,
}

impl Estimation {
    /// Create a new empty estimation.
    ///
    /// ```rust
    /// use estimate_core::estimation::Estimation;
    ///
    /// let est = Estimation::new("Block A", "Plot 12", "QS Office");
    /// assert_eq!(est.meta.name, "Block A");
    /// assert!(est.items.is_empty());
    /// ```
    pub fn new(name: impl Into<String>, site: impl Into<String>, prepared_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Estimation {
            meta: EstimationMetadata {
                version: SCHEMA_VERSION.to_string(),
                name: name.into(),
                site: site.into(),
                prepared_by: prepared_by.into(),
                created: now,
                modified: now,
            },
            settings: EstimationSettings::default(),
            shapes: Vec::new(),
            items: Vec::new(),
            scrap_stock: Vec::new(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Validate and append an item, returning its index.
    pub fn add_item(&mut self, item: EstimationItem) -> CalcResult<usize> {
        item.validate()?;
        self.items.push(item);
        self.touch();
        Ok(self.items.len() - 1)
    }

    /// Remove the item at `index`, if present.
    pub fn remove_item(&mut self, index: usize) -> Option<EstimationItem> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.touch();
        Some(item)
    }

    /// Replace the item at `index` wholesale, returning the old one.
    /// The replacement is validated first.
    pub fn replace_item(&mut self, index: usize, item: EstimationItem) -> CalcResult<EstimationItem> {
        item.validate()?;
        let slot = self.items.get_mut(index).ok_or_else(|| {
            CalcError::invalid_input("index", index.to_string(), "No item at this position")
        })?;
        let old = std::mem::replace(slot, item);
        self.touch();
        Ok(old)
    }

    /// Validate and store a user shape. An empty id is replaced by a UUID;
    /// a duplicate id is rejected. Returns the stored id.
    pub fn add_shape(&mut self, mut shape: ShapeDefinition) -> CalcResult<String> {
        shape.validate()?;
        if shape.id.trim().is_empty() {
            shape.id = Uuid::new_v4().to_string();
        }
        if self.shapes.iter().any(|s| s.id == shape.id) {
            return Err(CalcError::invalid_input("id", shape.id, "A shape with this id already exists"));
        }
        let id = shape.id.clone();
        self.shapes.push(shape);
        self.touch();
        Ok(id)
    }

    /// Validate and replace the user shape with the same id.
    pub fn update_shape(&mut self, shape: ShapeDefinition) -> CalcResult<()> {
        shape.validate()?;
        let slot = self
            .shapes
            .iter_mut()
            .find(|s| s.id == shape.id)
            .ok_or_else(|| CalcError::unknown_shape(shape.id.clone()))?;
        *slot = shape;
        self.touch();
        Ok(())
    }

    /// Remove a user shape by id. Items still referring to it resolve under
    /// the shape policy on the next derivation.
    pub fn remove_shape(&mut self, id: &str) -> Option<ShapeDefinition> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        self.touch();
        Some(self.shapes.remove(index))
    }

    /// Validate and declare an offcut.
    pub fn add_scrap(&mut self, scrap: ScrapStockItem) -> CalcResult<()> {
        scrap.validate()?;
        self.scrap_stock.push(scrap);
        self.touch();
        Ok(())
    }

    pub fn remove_scrap(&mut self, index: usize) -> Option<ScrapStockItem> {
        if index >= self.scrap_stock.len() {
            return None;
        }
        self.touch();
        Some(self.scrap_stock.remove(index))
    }

    /// Fresh registry over the built-ins and the current user shapes.
    pub fn registry(&self) -> ShapeRegistry {
        ShapeRegistry::with_custom(self.shapes.iter().cloned())
    }

    /// Steel forms in item order
    pub fn bar_forms(&self) -> impl Iterator<Item = &BarForm> {
        self.items.iter().filter_map(|item| match item {
            EstimationItem::Steel(form) => Some(form),
            _ => None,
        })
    }

    /// Derive every steel line item with the standard weight table.
    pub fn bar_items(&self) -> CalcResult<Vec<BarLineItem>> {
        self.bar_items_with(&UnitWeightTable::standard())
    }

    /// Derive every steel line item against a supplied weight table.
    pub fn bar_items_with(&self, weights: &UnitWeightTable) -> CalcResult<Vec<BarLineItem>> {
        let registry = self.registry();
        BarItemAggregator::new(&registry, weights)
            .with_policies(self.settings.shape_policy, self.settings.diameter_policy)
            .compute_all(self.bar_forms())
    }

    pub fn steel_summary(&self) -> CalcResult<SteelSummary> {
        Ok(SteelSummary::from_items(&self.bar_items()?))
    }

    /// Cutting plan over the current steel items and scrap stock.
    pub fn optimize(&self) -> CalcResult<OptimizationResult> {
        let items = self.bar_items()?;
        Ok(optimizer::optimize(&items, &self.scrap_stock, &self.settings.optimizer_config()))
    }

    /// Materials for every non-steel item, with totals.
    pub fn material_summary(&self) -> MaterialSummary {
        let mut summary = MaterialSummary::default();
        for item in &self.items {
            match item {
                EstimationItem::Steel(_) => {}
                EstimationItem::Concrete(input) => {
                    let r = concrete::calculate(input);
                    summary.totals.add(&r.quantities);
                    summary.concrete.push(r);
                }
                EstimationItem::Masonry(input) => {
                    let r = masonry::calculate(input);
                    summary.totals.add(&r.quantities);
                    summary.masonry.push(r);
                }
                EstimationItem::Plaster(input) => {
                    let r = plaster::calculate(input);
                    summary.totals.add(&r.quantities);
                    summary.plaster.push(r);
                }
                EstimationItem::Flooring(input) => {
                    let r = flooring::calculate(input);
                    summary.totals.add(&r.quantities);
                    summary.flooring.push(r);
                }
            }
        }
        summary
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl Default for Estimation {
    fn default() -> Self {
        Estimation::new("", "", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::concrete::ConcreteGeometry;
    use crate::materials::masonry::BlockSize;
    use crate::shapes::{BendDeductions, Segment, STIRRUP_ID};

    fn beam_steel() -> Estimation {
        let mut est = Estimation::new("Test", "Site", "QS");
        est.add_item(EstimationItem::Steel(
            BarForm::new("B1", "straight", 16).with_dim("A", 6000.0).with_members(2.0, 4.0),
        )).unwrap();
        est.add_item(EstimationItem::Steel(
            BarForm::new("S1", STIRRUP_ID, 8)
                .with_dim("A", 300.0)
                .with_dim("B", 200.0)
                .with_members(2.0, 1.0)
                .with_distribution(6000.0, 200.0),
        )).unwrap();
        est
    }

    #[test]
    fn test_new_estimation() {
        let est = Estimation::new("Block A", "Plot 12", "QS");
        assert_eq!(est.meta.version, SCHEMA_VERSION);
        assert_eq!(est.settings.stock_length_m, 12.0);
        assert_eq!(est.settings.shape_policy, LookupPolicy::Lenient);
        assert_eq!(est.item_count(), 0);
    }

    #[test]
    fn test_item_crud_by_index() {
        let mut est = beam_steel();
        assert_eq!(est.items[0].label(), "B1");
        assert_eq!(est.items[1].item_type(), "Steel");

        let removed = est.remove_item(0).unwrap();
        assert_eq!(removed.label(), "B1");
        assert_eq!(est.items[0].label(), "S1");
        assert!(est.remove_item(5).is_none());

        let old = est
            .replace_item(0, EstimationItem::Steel(BarForm::new("S2", STIRRUP_ID, 10)))
            .unwrap();
        assert_eq!(old.label(), "S1");
        assert_eq!(est.items[0].label(), "S2");
        assert!(est.replace_item(3, old).is_err());
    }

    #[test]
    fn test_bar_items_and_summary() {
        let est = beam_steel();
        let items = est.bar_items().unwrap();
        assert_eq!(items.len(), 2);

        // Stirrup: 2(300 + 200) + 14 × 8 = 1112 mm, 31 per member
        assert!((items[1].cutting_length_m - 1.112).abs() < 1e-9);
        assert!((items[1].total_bars - 62.0).abs() < 1e-9);

        let summary = est.steel_summary().unwrap();
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.weight_by_diameter.len(), 2);
        let expected = 48.0 * 1.58 + 62.0 * 1.112 * 0.395;
        assert!((summary.total_weight_kg - expected).abs() < 1e-6);
    }

    #[test]
    fn test_shape_lifecycle() {
        let mut est = Estimation::default();
        let shape = ShapeDefinition::segment_based(
            "Crank",
            vec![Segment::new("A", 1.0), Segment::new("B", 2.0)],
            BendDeductions::none(),
        );
        let id = est.add_shape(shape).unwrap();
        assert!(!id.is_empty());
        assert!(est.registry().get(&id).is_some());

        est.add_item(EstimationItem::Steel(
            BarForm::new("C1", id.clone(), 12)
                .with_dim("A", 1000.0)
                .with_dim("B", 500.0)
                .with_members(1.0, 1.0),
        )).unwrap();
        let items = est.bar_items().unwrap();
        assert!((items[0].cutting_length_m - 2.0).abs() < 1e-9);

        let mut edited = est.shapes[0].clone();
        edited.name = "Crank v2".to_string();
        est.update_shape(edited).unwrap();
        assert_eq!(est.registry().resolve(&id).name, "Crank v2");

        assert!(est.remove_shape(&id).is_some());
        assert!(est.registry().get(&id).is_none());
        // Dangling reference falls back to straight: A + B
        let items = est.bar_items().unwrap();
        assert!((items[0].cutting_length_m - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_shape_rejected() {
        let mut est = Estimation::default();
        let shape = ShapeDefinition::segment_based(
            "Bad",
            vec![Segment::new("A", 1.0), Segment::new("A", 1.0)],
            BendDeductions::none(),
        );
        assert!(est.add_shape(shape).is_err());
        assert!(est.shapes.is_empty());
    }

    #[test]
    fn test_duplicate_shape_id_rejected() {
        let mut est = Estimation::default();
        let shape = ShapeDefinition::segment_based("One", vec![Segment::new("A", 1.0)], BendDeductions::none())
            .with_id("s-1");
        est.add_shape(shape.clone()).unwrap();
        assert!(est.add_shape(shape).is_err());
    }

    #[test]
    fn test_strict_policy_surfaces_errors() {
        let mut est = beam_steel();
        est.add_item(EstimationItem::Steel(BarForm::new("X1", "missing", 14).with_dim("A", 1000.0))).unwrap();
        assert!(est.bar_items().is_ok());

        est.settings = EstimationSettings::strict();
        assert_eq!(est.bar_items().unwrap_err(), CalcError::unknown_shape("missing"));
        assert!(est.optimize().is_err());
    }

    #[test]
    fn test_item_validation() {
        assert!(EstimationItem::Steel(BarForm::new("B1", "straight", 12)).validate().is_ok());
        let no_mark = EstimationItem::Steel(BarForm::new(" ", "straight", 12));
        assert_eq!(no_mark.validate(), Err(CalcError::missing_field("bar_mark")));
        let plaster = EstimationItem::Plaster(PlasterInput::new("", 0.0, 0.0, 0.0, ""));
        assert!(plaster.validate().is_ok());
    }

    #[test]
    fn test_invalid_items_rejected() {
        let mut est = beam_steel();
        let blank = EstimationItem::Steel(BarForm::new("", "", 0));
        assert_eq!(est.add_item(blank), Err(CalcError::missing_field("bar_mark")));

        let zero_dia = EstimationItem::Steel(BarForm::new("B9", "straight", 0).with_dim("A", 1000.0));
        assert!(matches!(est.add_item(zero_dia.clone()), Err(CalcError::InvalidInput { .. })));
        assert!(est.replace_item(0, zero_dia).is_err());
        assert_eq!(est.item_count(), 2);
        assert_eq!(est.items[0].label(), "B1");
    }

    #[test]
    fn test_scrap_declaration() {
        let mut est = Estimation::default();
        assert!(est.add_scrap(ScrapStockItem::new(16, 4.0, 2)).is_ok());
        assert!(est.add_scrap(ScrapStockItem::new(14, 4.0, 2)).is_err());
        assert!(est.add_scrap(ScrapStockItem::new(16, 0.0, 2)).is_err());
        assert!(est.add_scrap(ScrapStockItem::new(16, 4.0, 0)).is_err());
        assert_eq!(est.scrap_stock.len(), 1);
        assert!(est.remove_scrap(0).is_some());
        assert!(est.remove_scrap(0).is_none());
    }

    #[test]
    fn test_optimize_leaves_scrap_untouched() {
        let mut est = Estimation::default();
        est.add_item(EstimationItem::Steel(
            BarForm::new("B1", "straight", 16).with_dim("A", 3000.0).with_members(1.0, 2.0),
        )).unwrap();
        est.add_scrap(ScrapStockItem::new(16, 3.5, 1)).unwrap();

        let first = est.optimize().unwrap();
        let second = est.optimize().unwrap();
        assert_eq!(first, second);
        assert_eq!(est.scrap_stock.len(), 1);

        let plan = first.plan_for(16).unwrap();
        assert_eq!(plan.stock_used, 1);
        assert!(plan.assignments[0].is_scrap());
    }

    #[test]
    fn test_material_summary_totals() {
        let mut est = Estimation::default();
        est.add_item(EstimationItem::Concrete(ConcreteInput::new(
            "Cube",
            ConcreteGeometry::Rectangle {
                length_m: 1.0,
                width_m: 1.0,
                depth_m: 1.0,
            },
            "1:1.5:3",
        ))).unwrap();
        est.add_item(EstimationItem::Masonry(MasonryInput::new(
            "W1",
            6.0,
            3.0,
            0.2,
            BlockSize::new(0.6, 0.2, 0.2),
            "CHEMICAL",
        ))).unwrap();
        est.add_item(EstimationItem::Plaster(PlasterInput::new("P1", 10.0, 3.0, 0.012, "1:4"))).unwrap();
        est.add_item(EstimationItem::Steel(BarForm::new("B1", "straight", 12))).unwrap();

        let summary = est.material_summary();
        assert_eq!(summary.concrete.len(), 1);
        assert_eq!(summary.masonry.len(), 1);
        assert_eq!(summary.plaster.len(), 1);
        assert!(summary.flooring.is_empty());

        let expected_bags = summary.concrete[0].quantities.cement_bags + summary.plaster[0].quantities.cement_bags;
        assert_eq!(summary.totals.cement_bags, expected_bags);
        assert_eq!(summary.totals.adhesive_bags, summary.masonry[0].quantities.adhesive_bags);
        assert!(summary.totals.adhesive_kg > 0.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut est = beam_steel();
        est.add_item(EstimationItem::Flooring(FlooringInput::new("F1", 4.0, 3.0, 0.04, "1:6").with_tile(0.6, 0.6))).unwrap();
        est.add_scrap(ScrapStockItem::new(16, 2.0, 1)).unwrap();

        let json = serde_json::to_string_pretty(&est).unwrap();
        assert!(json.contains("\"type\": \"Steel\""));
        let loaded: Estimation = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.items, est.items);
        assert_eq!(loaded.scrap_stock, est.scrap_stock);
        assert_eq!(loaded.settings, est.settings);
    }
}
