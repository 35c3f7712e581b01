//! # Masonry
//!
//! Block or brick walls laid in cement mortar or thin-joint adhesive.
//!
//! ## Cement mortar (`"1:6"`, `"1:4"`, ...)
//!
//! ```text
//! net volume   = L × H × T − Σ openings × T
//! blocks       = ceil(net / ((bl + j)(bh + j) × bt))
//! wet mortar   = net − (net / ((bl + j)(bh + j) × bt)) × bl × bh × bt
//! dry mortar   = wet × 1.33
//! ```
//!
//! ## Chemical adhesive (`"CHEMICAL"`)
//!
//! ```text
//! layers            = ceil(H / (bh + j))
//! blocks per layer  = ceil(L / (bl + j))
//! horizontal joints = layers − 1                       each L × T × j
//! vertical joints   = (blocks per layer − 1) × layers  each bh × T × j
//! joint volume      = (horizontal + vertical) × net / gross
//! adhesive kg       = joint volume × 1600, in 40 kg bags
//! ```

use serde::{Deserialize, Serialize};

use super::{
    ceil_count, openings_area, MaterialQuantities, MixRatio, Opening, ADHESIVE_BAG_KG, ADHESIVE_DENSITY_KG_M3,
    MORTAR_DRY_FACTOR,
};
use crate::units::{non_negative, Kilograms};

/// Default mortar joint thickness (m)
pub const DEFAULT_JOINT_M: f64 = 0.01;

/// Block or brick dimensions without mortar (m)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSize {
    pub length_m: f64,
    pub height_m: f64,
    pub thickness_m: f64,
}

impl BlockSize {
    pub fn new(length_m: f64, height_m: f64, thickness_m: f64) -> Self {
        BlockSize {
            length_m,
            height_m,
            thickness_m,
        }
    }

    /// Standard modular brick, 190 × 90 × 90 mm
    pub fn modular_brick() -> Self {
        BlockSize::new(0.19, 0.09, 0.09)
    }

    pub fn volume_m3(&self) -> f64 {
        non_negative(self.length_m) * non_negative(self.height_m) * non_negative(self.thickness_m)
    }

    /// Volume including half a joint all round (the laid unit)
    pub fn laid_volume_m3(&self, joint_m: f64) -> f64 {
        (non_negative(self.length_m) + joint_m) * (non_negative(self.height_m) + joint_m) * non_negative(self.thickness_m)
    }
}

/// Input for one wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasonryInput {
    pub label: String,
    pub wall_length_m: f64,
    pub wall_height_m: f64,
    pub wall_thickness_m: f64,
    #[serde(default)]
    pub openings: Vec<Opening>,
    pub block: BlockSize,
    #[serde(default = "default_joint")]
    pub joint_thickness_m: f64,
    /// Mortar ratio ("1:6") or "CHEMICAL"
    pub ratio: String,
}

fn default_joint() -> f64 {
    DEFAULT_JOINT_M
}

impl MasonryInput {
    pub fn new(
        label: impl Into<String>,
        wall_length_m: f64,
        wall_height_m: f64,
        wall_thickness_m: f64,
        block: BlockSize,
        ratio: impl Into<String>,
    ) -> Self {
        MasonryInput {
            label: label.into(),
            wall_length_m,
            wall_height_m,
            wall_thickness_m,
            openings: Vec::new(),
            block,
            joint_thickness_m: DEFAULT_JOINT_M,
            ratio: ratio.into(),
        }
    }

    pub fn with_opening(mut self, opening: Opening) -> Self {
        self.openings.push(opening);
        self
    }

    pub fn with_joint(mut self, joint_thickness_m: f64) -> Self {
        self.joint_thickness_m = joint_thickness_m;
        self
    }

    pub fn gross_volume_m3(&self) -> f64 {
        non_negative(self.wall_length_m) * non_negative(self.wall_height_m) * non_negative(self.wall_thickness_m)
    }

    /// Wall volume less openings, never negative
    pub fn net_volume_m3(&self) -> f64 {
        let deducted = openings_area(&self.openings) * non_negative(self.wall_thickness_m);
        (self.gross_volume_m3() - deducted).max(0.0)
    }
}

/// Result for one wall
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasonryResult {
    pub label: String,
    pub gross_volume_m3: f64,
    pub net_volume_m3: f64,
    /// Blocks or bricks required (rounded up)
    pub blocks: u64,
    /// Only filled for chemical joints
    pub layers: u64,
    pub blocks_per_layer: u64,
    pub horizontal_joints: u64,
    pub vertical_joints: u64,
    pub quantities: MaterialQuantities,
}

/// Derive blocks and mortar/adhesive for a wall.
pub fn calculate(input: &MasonryInput) -> MasonryResult {
    let joint = non_negative(input.joint_thickness_m);
    let net = input.net_volume_m3();
    let laid = input.block.laid_volume_m3(joint);
    let exact_blocks = if laid > 0.0 { net / laid } else { 0.0 };

    let mut result = MasonryResult {
        label: input.label.clone(),
        gross_volume_m3: input.gross_volume_m3(),
        net_volume_m3: net,
        blocks: ceil_count(exact_blocks),
        ..Default::default()
    };

    let ratio = MixRatio::parse(&input.ratio);
    if ratio.is_chemical() {
        chemical_joints(input, joint, &mut result);
    } else {
        let wet_mortar = (net - exact_blocks * input.block.volume_m3()).max(0.0);
        result.quantities = MaterialQuantities::from_wet_volume(wet_mortar, MORTAR_DRY_FACTOR, &ratio);
    }

    result
}

fn chemical_joints(input: &MasonryInput, joint: f64, result: &mut MasonryResult) {
    let length = non_negative(input.wall_length_m);
    let height = non_negative(input.wall_height_m);
    let thickness = non_negative(input.wall_thickness_m);
    let block_l = non_negative(input.block.length_m) + joint;
    let block_h = non_negative(input.block.height_m) + joint;

    let layers = if block_h > 0.0 { ceil_count(height / block_h) } else { 0 };
    let per_layer = if block_l > 0.0 { ceil_count(length / block_l) } else { 0 };
    let horizontal = layers.saturating_sub(1);
    let vertical = per_layer.saturating_sub(1) * layers;

    let horizontal_m3 = horizontal as f64 * length * thickness * joint;
    let vertical_m3 = vertical as f64 * non_negative(input.block.height_m) * thickness * joint;
    // Joint counts run over the full face; openings remove their share
    let gross = input.gross_volume_m3();
    let solid_share = if gross > 0.0 { result.net_volume_m3 / gross } else { 0.0 };
    let adhesive_m3 = (horizontal_m3 + vertical_m3) * solid_share;
    let adhesive = Kilograms(adhesive_m3 * ADHESIVE_DENSITY_KG_M3);

    result.layers = layers;
    result.blocks_per_layer = per_layer;
    result.horizontal_joints = horizontal;
    result.vertical_joints = vertical;
    result.quantities = MaterialQuantities {
        wet_volume_m3: adhesive_m3,
        adhesive_kg: adhesive.value(),
        adhesive_bags: ceil_count((adhesive / ADHESIVE_BAG_KG).value()),
        ..Default::default()
    };
}
