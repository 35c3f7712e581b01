//! # estimate_core - Construction Quantity Estimation Engine
//!
//! `estimate_core` turns a job's reinforcement bar schedule and its concrete,
//! masonry, plaster and flooring items into quantities: cutting lengths,
//! steel weights, a cut-stock plan that reuses offcuts first, and cement,
//! sand, aggregate and adhesive requirements.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions over explicit inputs and fixed tables
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Total calculators**: Bad geometry yields 0, not a panic; typed errors
//!   surface only from validation, strict lookups and file I/O
//!
//! ## Quick Start
//!
//! ```rust
//! use estimate_core::calculations::BarForm;
//! use estimate_core::estimation::{Estimation, EstimationItem};
//!
//! let mut est = Estimation::new("Block A", "Plot 12", "QS Office");
//! est.add_item(EstimationItem::Steel(
//!     BarForm::new("S1", "stirrup", 8)
//!         .with_dim("A", 300.0)
//!         .with_dim("B", 200.0)
//!         .with_members(4.0, 20.0),
//! )).unwrap();
//!
//! let plan = est.optimize().unwrap();
//! assert_eq!(plan.by_diameter.len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`shapes`] - Bar shape templates, registry and legacy formula evaluator
//! - [`calculations`] - Cutting length, bar line items and the cut-stock optimizer
//! - [`materials`] - Unit weights and concrete/masonry/plaster/flooring quantities
//! - [`estimation`] - Estimation container, settings and item list
//! - [`report`] - Flat rows for tabular export
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - JSON load/save with atomic writes

pub mod calculations;
pub mod errors;
pub mod estimation;
pub mod file_io;
pub mod materials;
pub mod report;
pub mod shapes;
pub mod units;

pub use errors::{CalcError, CalcResult};
pub use estimation::{Estimation, EstimationItem, EstimationSettings, LookupPolicy};
pub use file_io::{load_estimation, save_estimation};
