//! # estimate - Quantity Estimation CLI
//!
//! Loads an estimation JSON document and prints its bar bending schedule,
//! cut-stock plan or material totals, as text tables or JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use estimate_core::calculations::{BarForm, ScrapStockItem};
use estimate_core::estimation::{Estimation, EstimationItem, LookupPolicy, MaterialSummary};
use estimate_core::materials::concrete::ConcreteGeometry;
use estimate_core::materials::{BlockSize, ConcreteInput, FlooringInput, MasonryInput, PlasterInput};
use estimate_core::report::{bar_schedule_rows, cut_rows, diameter_weight_rows, stock_summary_rows};
use estimate_core::{load_estimation, save_estimation};

/// Bar schedules, cutting plans and material quantities for construction estimates.
#[derive(Parser, Debug)]
#[command(name = "estimate")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Fail on unknown shapes and unsupported diameters instead of defaulting
    #[arg(long, global = true)]
    strict: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the bar bending schedule and weight by diameter
    Schedule {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the cutting plan against stock and declared scrap
    Optimize {
        file: PathBuf,
        /// Override the stock bar length (m)
        #[arg(long)]
        stock_length: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Print cement, sand, aggregate and adhesive requirements
    Materials {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write a sample estimation document
    Init {
        file: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Schedule { file, json } => {
            let est = open(&file, args.strict)?;
            schedule(&est, json)
        }
        Command::Optimize {
            file,
            stock_length,
            json,
        } => {
            let mut est = open(&file, args.strict)?;
            if let Some(length) = stock_length {
                est.settings.stock_length_m = length;
            }
            optimize(&est, json)
        }
        Command::Materials { file, json } => {
            let est = open(&file, args.strict)?;
            materials(&est.material_summary(), json)
        }
        Command::Init { file, force } => init(&file, force),
    }
}

fn open(path: &Path, strict: bool) -> Result<Estimation> {
    let mut est = load_estimation(path).with_context(|| format!("Failed to load {}", path.display()))?;
    if strict {
        est.settings.shape_policy = LookupPolicy::Strict;
        est.settings.diameter_policy = LookupPolicy::Strict;
    }
    for (index, item) in est.items.iter().enumerate() {
        if let Err(err) = item.validate() {
            warn!("Item {} ({}): {}", index + 1, item.label(), err);
        }
    }
    info!("Loaded '{}' ({} items)", est.meta.name, est.item_count());
    Ok(est)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn schedule(est: &Estimation, json: bool) -> Result<()> {
    let items = est.bar_items().context("Failed to derive bar schedule")?;
    for item in &items {
        for issue in &item.issues {
            warn!("{}: {}", item.bar_mark, issue);
        }
    }

    let rows = bar_schedule_rows(&items);
    let by_diameter = diameter_weight_rows(&items);

    if json {
        #[derive(Serialize)]
        struct ScheduleOutput<'a> {
            rows: &'a [estimate_core::report::BarScheduleRow],
            by_diameter: &'a [estimate_core::report::DiameterWeightRow],
        }
        return print_json(&ScheduleOutput {
            rows: &rows,
            by_diameter: &by_diameter,
        });
    }

    println!("═══════════════════════════════════════════════════════════════════════════");
    println!("  BAR BENDING SCHEDULE - {}", est.meta.name);
    println!("═══════════════════════════════════════════════════════════════════════════");
    println!(
        "{:<8} {:<14} {:>4} {:>8} {:>8} {:>8} {:>10} {:>10}",
        "Mark", "Shape", "Dia", "Members", "Bars", "Cut (m)", "Total (m)", "Weight kg"
    );
    for row in &rows {
        println!(
            "{:<8} {:<14} {:>4} {:>8.0} {:>8.0} {:>8.3} {:>10.2} {:>10.2}",
            row.bar_mark,
            row.shape_kind,
            row.diameter_mm,
            row.no_members,
            row.total_bars,
            row.cutting_length_m,
            row.total_length_m,
            row.total_weight_kg
        );
    }

    println!();
    println!("Weight by diameter:");
    let mut total = 0.0;
    for row in &by_diameter {
        println!("  Ø{:<3} {:>10.2} m {:>10.2} kg", row.diameter_mm, row.total_length_m, row.total_weight_kg);
        total += row.total_weight_kg;
    }
    println!("  Total steel: {:.2} kg", total);
    Ok(())
}

fn optimize(est: &Estimation, json: bool) -> Result<()> {
    let result = est.optimize().context("Failed to build cutting plan")?;
    if json {
        return print_json(&result);
    }

    println!("═══════════════════════════════════════════════════════════════════════════");
    println!("  CUTTING PLAN - {} ({:.2} m stock)", est.meta.name, result.stock_length_m);
    println!("═══════════════════════════════════════════════════════════════════════════");

    let cuts = cut_rows(&result);
    let mut current: Option<(u32, usize)> = None;
    for cut in &cuts {
        if current != Some((cut.diameter_mm, cut.stock_no)) {
            current = Some((cut.diameter_mm, cut.stock_no));
            println!(
                "Ø{} #{} {:?} {:.2} m (left {:.3} m)",
                cut.diameter_mm, cut.stock_no, cut.source, cut.stock_length_m, cut.remaining_m
            );
        }
        println!("    {:<8} part {:<2} {:>8.3} m", cut.origin_mark, cut.piece_index, cut.piece_length_m);
    }

    println!();
    println!("{:<6} {:>9} {:>9} {:>12} {:>10}", "Dia", "New bars", "Scrap", "Cut (m)", "Waste (m)");
    for row in stock_summary_rows(&result) {
        println!(
            "Ø{:<5} {:>9} {:>9} {:>12.2} {:>10.3}",
            row.diameter_mm, row.new_bars, row.scrap_bars_used, row.cut_length_m, row.waste_m
        );
    }
    println!(
        "Total new bars: {}   Total waste: {:.3} m",
        result.total_stock_used, result.total_waste_m
    );
    Ok(())
}

fn materials(summary: &MaterialSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }

    println!("═══════════════════════════════════════");
    println!("  MATERIAL REQUIREMENTS");
    println!("═══════════════════════════════════════");
    for r in &summary.concrete {
        println!(
            "Concrete {:<12} {:>8.3} m³  cement {:>4} bags",
            r.label, r.quantities.wet_volume_m3, r.quantities.cement_bags
        );
    }
    for r in &summary.masonry {
        if r.quantities.adhesive_bags > 0 {
            println!(
                "Masonry  {:<12} {:>6} blocks  adhesive {:>4} bags",
                r.label, r.blocks, r.quantities.adhesive_bags
            );
        } else {
            println!(
                "Masonry  {:<12} {:>6} blocks  cement {:>4} bags",
                r.label, r.blocks, r.quantities.cement_bags
            );
        }
    }
    for r in &summary.plaster {
        println!(
            "Plaster  {:<12} {:>8.2} m²  cement {:>4} bags",
            r.label, r.net_area_m2, r.quantities.cement_bags
        );
    }
    for r in &summary.flooring {
        let tiles = r.tiles.map(|t| format!("{} tiles", t)).unwrap_or_default();
        println!(
            "Flooring {:<12} {:>8.2} m²  cement {:>4} bags  {}",
            r.label, r.area_m2, r.quantities.cement_bags, tiles
        );
    }

    let t = &summary.totals;
    println!();
    println!("Totals:");
    println!("  Cement:    {} bags ({:.0} kg)", t.cement_bags, t.cement_kg());
    println!("  Sand:      {:.3} m³", t.sand_m3);
    println!("  Aggregate: {:.3} m³", t.aggregate_m3);
    println!("  Adhesive:  {:.1} kg ({} bags)", t.adhesive_kg, t.adhesive_bags);
    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let est = sample_estimation()?;
    save_estimation(&est, path).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote sample estimation to {}", path.display());
    Ok(())
}

fn sample_estimation() -> Result<Estimation> {
    let mut est = Estimation::new("Sample House", "Plot 1", "");

    est.add_item(EstimationItem::Steel(
        BarForm::new("B1", "straight", 16)
            .with_description("Beam bottom bars")
            .with_dim("A", 6000.0)
            .with_members(4.0, 3.0),
    ))?;
    est.add_item(EstimationItem::Steel(
        BarForm::new("B2", "l_bend", 12)
            .with_description("Beam top bars")
            .with_dim("A", 5000.0)
            .with_dim("B", 600.0)
            .with_members(4.0, 2.0),
    ))?;
    est.add_item(EstimationItem::Steel(
        BarForm::new("S1", "stirrup", 8)
            .with_description("Beam stirrups")
            .with_dim("A", 400.0)
            .with_dim("B", 200.0)
            .with_members(4.0, 1.0)
            .with_distribution(6000.0, 150.0),
    ))?;
    est.add_item(EstimationItem::Concrete(
        ConcreteInput::new(
            "Beams",
            ConcreteGeometry::Rectangle {
                length_m: 6.0,
                width_m: 0.23,
                depth_m: 0.45,
            },
            "1:1.5:3",
        )
        .with_quantity(4.0),
    ))?;
    est.add_item(EstimationItem::Masonry(MasonryInput::new(
        "Ground walls",
        24.0,
        3.0,
        0.2,
        BlockSize::new(0.4, 0.2, 0.2),
        "1:6",
    )))?;
    est.add_item(EstimationItem::Plaster(PlasterInput::new("Internal", 24.0, 3.0, 0.012, "1:4")))?;
    est.add_item(EstimationItem::Flooring(
        FlooringInput::new("Living room", 5.0, 4.0, 0.04, "1:6").with_tile(0.6, 0.6),
    ))?;

    est.add_scrap(ScrapStockItem::new(16, 4.5, 2))?;
    est.add_scrap(ScrapStockItem::new(12, 3.0, 1))?;
    Ok(est)
}
