//! Architecture selection: the numeric mode selector and the flat parameter bundle that
//! goes with it.

use crate::error::{MapError, Result};

/// The four target architectures the resource factory knows how to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchMode {
    /// LUT memory plus fixed 8192-bit and 128K-bit block RAMs.
    FixedFabric,
    /// One user-described block RAM and nothing else.
    NoLut,
    /// One user-described block RAM plus LUT memory.
    WithLut,
    /// Two user-described block RAMs plus LUT memory with a user-supplied ratio.
    TwoCustom,
}

impl ArchMode {
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            1 => Ok(ArchMode::FixedFabric),
            2 => Ok(ArchMode::NoLut),
            3 => Ok(ArchMode::WithLut),
            4 => Ok(ArchMode::TwoCustom),
            other => Err(MapError::UnknownMode(other)),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            ArchMode::FixedFabric => 1,
            ArchMode::NoLut => 2,
            ArchMode::WithLut => 3,
            ArchMode::TwoCustom => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArchMode::FixedFabric => "fixed fabric",
            ArchMode::NoLut => "no-LUT custom",
            ArchMode::WithLut => "with-LUT custom",
            ArchMode::TwoCustom => "two-custom-block",
        }
    }

    /// Number of numeric parameters the mode takes on the command line.
    pub fn param_count(&self) -> usize {
        match self {
            ArchMode::FixedFabric => 0,
            ArchMode::NoLut | ArchMode::WithLut => 3,
            ArchMode::TwoCustom => 7,
        }
    }
}

/// A user-described block RAM.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockSpec {
    pub bits: u32,
    pub max_width: u32,
    /// Logic blocks per block RAM on the fabric.
    pub ratio: f64,
}

impl BlockSpec {
    pub fn validate(&self) -> Result<()> {
        if !self.bits.is_power_of_two() {
            return Err(MapError::InvalidBlock {
                reason: format!("block size {} is not a power of two", self.bits),
            });
        }
        if !self.max_width.is_power_of_two() {
            return Err(MapError::InvalidBlock {
                reason: format!("max width {} is not a power of two", self.max_width),
            });
        }
        if self.max_width > self.bits {
            return Err(MapError::InvalidBlock {
                reason: format!(
                    "max width {} exceeds block size {}",
                    self.max_width, self.bits
                ),
            });
        }
        if !(self.ratio.is_finite() && self.ratio > 0.0) {
            return Err(MapError::InvalidBlock {
                reason: format!("ratio {} must be positive", self.ratio),
            });
        }
        Ok(())
    }
}

/// Parameters for the custom modes, in the order they were supplied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArchParams {
    pub blocks: Vec<BlockSpec>,
    pub lut_ratio: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArchConfig {
    pub mode: ArchMode,
    pub params: ArchParams,
}

impl ArchConfig {
    pub fn fixed_fabric() -> Self {
        ArchConfig {
            mode: ArchMode::FixedFabric,
            params: ArchParams::default(),
        }
    }

    /// Builds a validated configuration from a mode code and its flat parameter list.
    ///
    /// Modes 2 and 3 take `bits max_width ratio`; mode 4 takes
    /// `lut_ratio bits_a max_width_a ratio_a bits_b max_width_b ratio_b`.
    pub fn from_values(code: u32, values: &[f64]) -> Result<Self> {
        let mode = ArchMode::from_code(code)?;
        if values.len() != mode.param_count() {
            return Err(MapError::MissingParameter {
                mode: code,
                expected: mode.param_count(),
                got: values.len(),
            });
        }

        let params = match mode {
            ArchMode::FixedFabric => ArchParams::default(),
            ArchMode::NoLut | ArchMode::WithLut => ArchParams {
                blocks: vec![block_from(&values[0..3])?],
                lut_ratio: None,
            },
            ArchMode::TwoCustom => {
                let lut_ratio = values[0];
                if !(lut_ratio.is_finite() && lut_ratio >= 1.0) {
                    return Err(MapError::InvalidBlock {
                        reason: format!("LUT memory ratio {lut_ratio} must be at least 1"),
                    });
                }
                ArchParams {
                    blocks: vec![block_from(&values[1..4])?, block_from(&values[4..7])?],
                    lut_ratio: Some(lut_ratio),
                }
            }
        };
        Ok(ArchConfig { mode, params })
    }

    /// The `index`th custom block, or `MissingParameter` when the bundle is short.
    pub fn block(&self, index: usize) -> Result<&BlockSpec> {
        self.params
            .blocks
            .get(index)
            .ok_or(MapError::MissingParameter {
                mode: self.mode.code(),
                expected: self.mode.param_count(),
                got: self.params.blocks.len() * 3 + usize::from(self.params.lut_ratio.is_some()),
            })
    }

    /// Name of the mapping file for this configuration.
    pub fn mapping_file_name(&self) -> Result<String> {
        Ok(format!("mapping_{}.txt", self.file_stem()?))
    }

    /// Name of the per-circuit area file for this configuration.
    pub fn area_file_name(&self) -> Result<String> {
        Ok(format!("area_{}.txt", self.file_stem()?))
    }

    fn file_stem(&self) -> Result<String> {
        let block_part = |i: usize| {
            self.block(i)
                .map(|b| format!("{}_{}_{}", b.bits, b.max_width, b.ratio))
        };
        let stem = match self.mode {
            ArchMode::FixedFabric => "STRATIXIV".to_string(),
            ArchMode::NoLut => format!("NOLUTRAM_{}", block_part(0)?),
            ArchMode::WithLut => format!("WITHLUTRAM_{}", block_part(0)?),
            ArchMode::TwoCustom => format!(
                "MBWITHLUTRAM_{}_{}_{}",
                self.params.lut_ratio.unwrap_or_default(),
                block_part(0)?,
                block_part(1)?
            ),
        };
        Ok(stem)
    }
}

fn whole(value: f64, what: &str) -> Result<u32> {
    if value.fract() != 0.0 || value < 1.0 || value > u32::MAX as f64 {
        return Err(MapError::InvalidBlock {
            reason: format!("{what} must be a positive integer, got {value}"),
        });
    }
    Ok(value as u32)
}

fn block_from(values: &[f64]) -> Result<BlockSpec> {
    let spec = BlockSpec {
        bits: whole(values[0], "block size")?,
        max_width: whole(values[1], "max width")?,
        ratio: values[2],
    };
    spec.validate()?;
    Ok(spec)
}
