//! # Stock Cutting Optimizer
//!
//! Plans how bar line items are cut from standard-length stock (12 m by
//! default), drawing on declared scrap first.
//!
//! ## Algorithm
//!
//! 1. **Expansion**: every line item becomes `total_bars` physical bars. A bar
//!    longer than the stock length is split into stock-length pieces plus a
//!    remainder piece, all tagged with the origin bar mark.
//! 2. **Grouping**: pieces are partitioned by diameter and diameters are
//!    processed largest first.
//! 3. **First-Fit Decreasing**: pieces are sorted longest first. The pool is
//!    seeded with one entry per scrap unit, in declared order. Each piece goes
//!    into the first entry with enough remaining length; when none fits, a new
//!    stock bar is opened.
//! 4. **Accounting**: stock used counts new bars only; waste is the remaining
//!    length of every entry, scrap included.
//!
//! Remainders below [`SNAP_TOLERANCE_M`] are snapped to 0.
//!
//! The heuristic is deliberately First-Fit Decreasing rather than an optimal
//! packing: results are expected to match it bar for bar.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::calculations::optimizer::{optimize, OptimizerConfig, ScrapStockItem};
//!
//! let result = optimize(&[], &[ScrapStockItem::new(12, 3.0, 2)], &OptimizerConfig::default());
//! assert_eq!(result.total_stock_used, 0);
//! assert!(result.by_diameter.is_empty());
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::bar_item::BarLineItem;
use crate::errors::{CalcError, CalcResult};
use crate::materials::steel::is_standard_diameter;

/// Standard stock bar length (m)
pub const STANDARD_STOCK_LENGTH_M: f64 = 12.0;

/// Remainders shorter than this (m) are treated as exactly 0
pub const SNAP_TOLERANCE_M: f64 = 1e-4;

/// Largest offcut count one scrap declaration may carry
pub const MAX_SCRAP_QUANTITY: u32 = 10_000;

/// Optimizer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Length of a new stock bar (m)
    pub stock_length_m: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            stock_length_m: STANDARD_STOCK_LENGTH_M,
        }
    }
}

impl OptimizerConfig {
    pub fn with_stock_length(stock_length_m: f64) -> Self {
        OptimizerConfig { stock_length_m }
    }

    /// Stock length in use; a non-positive or non-finite value falls back to 12 m
    fn effective_stock_length(&self) -> f64 {
        if self.stock_length_m.is_finite() && self.stock_length_m > 0.0 {
            self.stock_length_m
        } else {
            warn!(stock_length_m = self.stock_length_m, "invalid stock length, using 12 m");
            STANDARD_STOCK_LENGTH_M
        }
    }
}

/// Reusable offcut declared on an estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapStockItem {
    pub diameter_mm: u32,
    pub length_m: f64,
    pub quantity: u32,
}

impl ScrapStockItem {
    pub fn new(diameter_mm: u32, length_m: f64, quantity: u32) -> Self {
        ScrapStockItem {
            diameter_mm,
            length_m,
            quantity,
        }
    }

    /// Declaration-time checks. Zero or negative lengths are rejected here;
    /// the optimizer itself only skips them.
    pub fn validate(&self) -> CalcResult<()> {
        if !is_standard_diameter(self.diameter_mm) {
            return Err(CalcError::unsupported_diameter(self.diameter_mm));
        }
        if !(self.length_m.is_finite() && self.length_m > 0.0) {
            return Err(CalcError::invalid_input(
                "length_m",
                self.length_m.to_string(),
                "Scrap length must be positive",
            ));
        }
        if self.quantity == 0 {
            return Err(CalcError::invalid_input(
                "quantity",
                "0",
                "Scrap quantity must be at least 1",
            ));
        }
        if self.quantity > MAX_SCRAP_QUANTITY {
            return Err(CalcError::invalid_input(
                "quantity",
                self.quantity.to_string(),
                format!("Scrap quantity must not exceed {}", MAX_SCRAP_QUANTITY),
            ));
        }
        Ok(())
    }
}

/// Where a stock entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockSource {
    Scrap,
    New,
}

/// One physical piece to be cut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarPiece {
    /// Bar mark of the line item the piece belongs to
    pub origin_mark: String,
    /// 1-based part number within its physical bar (> 1 only for spliced bars)
    pub piece_index: u32,
    pub length_m: f64,
}

/// One stock bar (new or scrap) with the pieces cut from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAssignment {
    pub source_kind: StockSource,
    pub length_m: f64,
    pub cuts: Vec<BarPiece>,
    pub remaining_m: f64,
}

impl StockAssignment {
    fn open(source_kind: StockSource, length_m: f64) -> Self {
        StockAssignment {
            source_kind,
            length_m,
            cuts: Vec::new(),
            remaining_m: length_m,
        }
    }

    pub fn is_scrap(&self) -> bool {
        self.source_kind == StockSource::Scrap
    }

    pub fn used_length_m(&self) -> f64 {
        self.cuts.iter().map(|c| c.length_m).sum()
    }

    fn place(&mut self, piece: BarPiece) {
        self.remaining_m -= piece.length_m;
        if self.remaining_m < SNAP_TOLERANCE_M {
            self.remaining_m = 0.0;
        }
        self.cuts.push(piece);
    }
}

/// Packing result for one diameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiameterPlan {
    pub diameter_mm: u32,
    /// New stock bars that received at least one cut
    pub stock_used: usize,
    /// Σ remaining over every entry of this diameter
    pub waste_m: f64,
    /// Σ piece lengths cut for this diameter
    pub cut_length_m: f64,
    pub assignments: Vec<StockAssignment>,
}

/// Full optimizer output; ephemeral, recomputed on every view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub stock_length_m: f64,
    /// Plans ordered by diameter, largest first
    pub by_diameter: Vec<DiameterPlan>,
    pub total_stock_used: usize,
    pub total_waste_m: f64,
}

impl OptimizationResult {
    /// Plan for one diameter, if any pieces of that diameter were packed
    pub fn plan_for(&self, diameter_mm: u32) -> Option<&DiameterPlan> {
        self.by_diameter.iter().find(|p| p.diameter_mm == diameter_mm)
    }

    /// Assignments keyed by diameter
    pub fn assignments_by_diameter(&self) -> BTreeMap<u32, &[StockAssignment]> {
        self.by_diameter
            .iter()
            .map(|p| (p.diameter_mm, p.assignments.as_slice()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_diameter.is_empty()
    }
}

/// Split one physical bar into pieces no longer than the stock length.
pub fn split_bar(origin_mark: &str, length_m: f64, stock_length_m: f64) -> Vec<BarPiece> {
    let mut pieces = Vec::new();
    let mut remaining = length_m;
    let mut index = 1;

    while remaining > stock_length_m {
        pieces.push(BarPiece {
            origin_mark: origin_mark.to_string(),
            piece_index: index,
            length_m: stock_length_m,
        });
        remaining -= stock_length_m;
        index += 1;
    }
    if remaining >= SNAP_TOLERANCE_M {
        pieces.push(BarPiece {
            origin_mark: origin_mark.to_string(),
            piece_index: index,
            length_m: remaining,
        });
    }

    pieces
}

/// Expand line items into pieces grouped by diameter.
fn expand(items: &[BarLineItem], stock_length_m: f64) -> BTreeMap<u32, Vec<BarPiece>> {
    let mut by_dia: BTreeMap<u32, Vec<BarPiece>> = BTreeMap::new();

    for item in items {
        let length = item.cutting_length_m;
        if !(length.is_finite() && length > 0.0) {
            continue;
        }
        let count = if item.total_bars.is_finite() && item.total_bars > 0.0 {
            item.total_bars.trunc() as usize
        } else {
            0
        };
        if count == 0 {
            continue;
        }

        let bar = split_bar(&item.bar_mark, length, stock_length_m);
        let entry = by_dia.entry(item.diameter_mm).or_default();
        for _ in 0..count {
            entry.extend(bar.iter().cloned());
        }
    }

    by_dia
}

fn scrap_pool(scrap_stock: &[ScrapStockItem], diameter_mm: u32) -> Vec<StockAssignment> {
    let mut pool = Vec::new();
    for scrap in scrap_stock.iter().filter(|s| s.diameter_mm == diameter_mm) {
        if !(scrap.length_m.is_finite() && scrap.length_m > 0.0) {
            warn!(diameter_mm, length_m = scrap.length_m, "skipping scrap with invalid length");
            continue;
        }
        if scrap.quantity > MAX_SCRAP_QUANTITY {
            warn!(diameter_mm, quantity = scrap.quantity, "skipping scrap with oversized quantity");
            continue;
        }
        for _ in 0..scrap.quantity {
            pool.push(StockAssignment::open(StockSource::Scrap, scrap.length_m));
        }
    }
    pool
}

/// First-Fit Decreasing over one diameter's pieces.
fn pack(mut pieces: Vec<BarPiece>, mut pool: Vec<StockAssignment>, stock_length_m: f64) -> Vec<StockAssignment> {
    // Stable sort: equal lengths keep expansion order
    pieces.sort_by(|a, b| b.length_m.partial_cmp(&a.length_m).unwrap_or(Ordering::Equal));

    for piece in pieces {
        match pool.iter_mut().find(|bar| bar.remaining_m >= piece.length_m) {
            Some(bar) => bar.place(piece),
            None => {
                let mut bar = StockAssignment::open(StockSource::New, stock_length_m);
                bar.place(piece);
                pool.push(bar);
            }
        }
    }

    pool
}

/// Plan cutting for all line items against standard stock and declared scrap.
///
/// Scrap is read, never consumed. Empty input yields an empty result.
pub fn optimize(items: &[BarLineItem], scrap_stock: &[ScrapStockItem], config: &OptimizerConfig) -> OptimizationResult {
    let stock_length_m = config.effective_stock_length();
    let grouped = expand(items, stock_length_m);

    let mut result = OptimizationResult {
        stock_length_m,
        ..Default::default()
    };

    for (diameter_mm, pieces) in grouped.into_iter().rev() {
        let cut_length_m: f64 = pieces.iter().map(|p| p.length_m).sum();
        let piece_count = pieces.len();
        let assignments = pack(pieces, scrap_pool(scrap_stock, diameter_mm), stock_length_m);

        let stock_used = assignments
            .iter()
            .filter(|a| !a.is_scrap() && !a.cuts.is_empty())
            .count();
        let waste_m: f64 = assignments.iter().map(|a| a.remaining_m).sum();

        debug!(diameter_mm, piece_count, stock_used, "packed diameter");

        result.total_stock_used += stock_used;
        result.total_waste_m += waste_m;
        result.by_diameter.push(DiameterPlan {
            diameter_mm,
            stock_used,
            waste_m,
            cut_length_m,
            assignments,
        });
    }

    result
}
