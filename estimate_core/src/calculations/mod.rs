//! # Steel Calculations
//!
//! The bar-bending-schedule engine. Each stage is a pure function over its
//! explicit inputs:
//!
//! - [`cutting_length`] - shape + dimensions + diameter → cutting length (mm)
//! - [`bar_item`] - form row → derived line item, plus weight rollups
//! - [`optimizer`] - line items + scrap → stock cutting plan
//!
//! Nothing here holds state between calls; callers recompute from the current
//! item list whenever they need a fresh view.

pub mod bar_item;
pub mod cutting_length;
pub mod optimizer;

// Re-export commonly used types
pub use bar_item::{BarForm, BarItemAggregator, BarLineItem, SteelSummary};
pub use cutting_length::{compute_cutting_length, CuttingLength, Dimensions};
pub use optimizer::{optimize, OptimizationResult, OptimizerConfig, ScrapStockItem, StockAssignment};
