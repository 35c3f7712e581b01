//! # Flat Export Records
//!
//! Plain rows for tabular output (terminal tables, CSV, spreadsheets). Each
//! builder is a pure function over already-derived results; no formatting
//! or units conversion beyond what the row names say.

use serde::{Deserialize, Serialize};

use crate::calculations::bar_item::{weight_by_diameter, BarLineItem};
use crate::calculations::optimizer::{OptimizationResult, StockSource};

/// One bar bending schedule line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarScheduleRow {
    pub bar_mark: String,
    pub description: String,
    pub shape_kind: String,
    pub diameter_mm: u32,
    pub no_members: f64,
    pub bars_per_member: f64,
    pub total_bars: f64,
    pub cutting_length_m: f64,
    pub total_length_m: f64,
    pub unit_weight_kg_per_m: f64,
    pub total_weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiameterWeightRow {
    pub diameter_mm: u32,
    pub total_length_m: f64,
    pub total_weight_kg: f64,
}

/// One cut in the cutting plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutRow {
    pub diameter_mm: u32,
    /// 1-based stock bar number within the diameter
    pub stock_no: usize,
    pub source: StockSource,
    pub stock_length_m: f64,
    pub origin_mark: String,
    pub piece_index: u32,
    pub piece_length_m: f64,
    /// Left on the stock bar once all its cuts are made
    pub remaining_m: f64,
}

/// Stock consumption per diameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSummaryRow {
    pub diameter_mm: u32,
    pub new_bars: usize,
    pub scrap_bars_used: usize,
    pub cut_length_m: f64,
    pub waste_m: f64,
}

pub fn bar_schedule_rows(items: &[BarLineItem]) -> Vec<BarScheduleRow> {
    items
        .iter()
        .map(|item| BarScheduleRow {
            bar_mark: item.bar_mark.clone(),
            description: item.description.clone(),
            shape_kind: item.shape_kind.clone(),
            diameter_mm: item.diameter_mm,
            no_members: item.no_members,
            bars_per_member: item.bars_per_member,
            total_bars: item.total_bars,
            cutting_length_m: item.cutting_length_m,
            total_length_m: item.total_length_m,
            unit_weight_kg_per_m: item.unit_weight_kg_per_m,
            total_weight_kg: item.total_weight_kg,
        })
        .collect()
}

/// Length and weight per diameter, ascending
pub fn diameter_weight_rows(items: &[BarLineItem]) -> Vec<DiameterWeightRow> {
    weight_by_diameter(items)
        .into_iter()
        .map(|(diameter_mm, total_weight_kg)| DiameterWeightRow {
            diameter_mm,
            total_length_m: items
                .iter()
                .filter(|i| i.diameter_mm == diameter_mm)
                .map(|i| i.total_length_m)
                .sum(),
            total_weight_kg,
        })
        .collect()
}

/// Every cut, in plan order. Stock bars without cuts produce no rows.
pub fn cut_rows(result: &OptimizationResult) -> Vec<CutRow> {
    let mut rows = Vec::new();
    for plan in &result.by_diameter {
        let used = plan.assignments.iter().filter(|a| !a.cuts.is_empty());
        for (stock_no, stock) in used.enumerate() {
            for cut in &stock.cuts {
                rows.push(CutRow {
                    diameter_mm: plan.diameter_mm,
                    stock_no: stock_no + 1,
                    source: stock.source_kind,
                    stock_length_m: stock.length_m,
                    origin_mark: cut.origin_mark.clone(),
                    piece_index: cut.piece_index,
                    piece_length_m: cut.length_m,
                    remaining_m: stock.remaining_m,
                });
            }
        }
    }
    rows
}

pub fn stock_summary_rows(result: &OptimizationResult) -> Vec<StockSummaryRow> {
    result
        .by_diameter
        .iter()
        .map(|plan| StockSummaryRow {
            diameter_mm: plan.diameter_mm,
            new_bars: plan.stock_used,
            scrap_bars_used: plan
                .assignments
                .iter()
                .filter(|a| a.is_scrap() && !a.cuts.is_empty())
                .count(),
            cut_length_m: plan.cut_length_m,
            waste_m: plan.waste_m,
        })
        .collect()
}
