//! Physical resource catalog and the factory that builds it for an architecture mode.

use crate::config::{ArchConfig, ArchMode, BlockSpec};
use crate::error::Result;
use crate::model::PhysType;

pub const LUTRAM_BITS: u32 = 64 * 10;
pub const LUTRAM_MAX_DEPTH: u32 = 64;
pub const LUTRAM_MAX_WIDTH: u32 = 20;
pub const LUTRAM_RATIO: f64 = 2.0;

/// One physical memory primitive and the depth x width shapes it can be configured as.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceEntry {
    pub kind: PhysType,
    /// Logic-block equivalent of one block of this type.
    pub ratio: f64,
    pub max_depth: u32,
    pub max_width: u32,
    pub bits: u32,
    /// `(depth, width)` pairs in enumeration order.
    pub combinations: Vec<(u32, u32)>,
}

impl ResourceEntry {
    fn lutram(ratio: f64) -> Self {
        ResourceEntry {
            kind: PhysType::LutMemory,
            ratio,
            max_depth: LUTRAM_MAX_DEPTH,
            max_width: LUTRAM_MAX_WIDTH,
            bits: LUTRAM_BITS,
            // only two shapes exist, so they are listed rather than derived
            combinations: vec![(64, 10), (32, 20)],
        }
    }

    pub(crate) fn block(kind: PhysType, ratio: f64, bits: u32, max_width: u32) -> Self {
        let mut entry = ResourceEntry {
            kind,
            ratio,
            max_depth: bits,
            max_width,
            bits,
            combinations: Vec::new(),
        };
        entry.prepare_combination();
        entry
    }

    fn custom(kind: PhysType, spec: &BlockSpec) -> Self {
        ResourceEntry::block(kind, spec.ratio, spec.bits, spec.max_width)
    }

    /// Appends every power-of-two split of the bit budget, widest first.
    pub fn prepare_combination(&mut self) {
        let mut width = self.max_width;
        while width >= 1 {
            self.combinations.push((self.bits / width, width));
            width /= 2;
        }
    }

    /// Silicon area of one block of this type.
    pub fn block_area(&self) -> f64 {
        block_ram_area(self.bits, self.max_width)
    }
}

pub fn block_ram_area(bits: u32, max_width: u32) -> f64 {
    let bits_f = bits as f64;
    9000.0 + 5.0 * bits_f + 90.0 * bits_f.sqrt() + 600.0 * 2.0 * (max_width as f64)
}

/// Builds the resource catalog for `config`. Catalog order is enumeration order.
pub fn build_catalog(config: &ArchConfig) -> Result<Vec<ResourceEntry>> {
    let catalog = match config.mode {
        ArchMode::FixedFabric => vec![
            ResourceEntry::lutram(LUTRAM_RATIO),
            ResourceEntry::block(PhysType::FixedBlock8192, 10.0, 8192, 32),
            ResourceEntry::block(PhysType::FixedBlock128K, 300.0, 128 * 1024, 128),
        ],
        ArchMode::NoLut => vec![ResourceEntry::custom(PhysType::CustomBlockA, config.block(0)?)],
        ArchMode::WithLut => vec![
            ResourceEntry::custom(PhysType::CustomBlockA, config.block(0)?),
            ResourceEntry::lutram(LUTRAM_RATIO),
        ],
        ArchMode::TwoCustom => {
            let lut_ratio = config.params.lut_ratio.unwrap_or(LUTRAM_RATIO);
            vec![
                ResourceEntry::lutram(lut_ratio),
                ResourceEntry::custom(PhysType::CustomBlockA, config.block(0)?),
                ResourceEntry::custom(PhysType::CustomBlockB, config.block(1)?),
            ]
        }
    };
    Ok(catalog)
}
