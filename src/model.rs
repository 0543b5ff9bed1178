//! Demand-side data model: circuits, their logical RAMs, and the mapping decisions the
//! engine attaches to them.

use std::fmt;

/// Port configuration requested by a logical RAM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemMode {
    SimpleDualPort,
    Rom,
    SinglePort,
    TrueDualPort,
}

const MODE_NAMES: [(&str, MemMode); 4] = [
    ("SimpleDualPort", MemMode::SimpleDualPort),
    ("ROM", MemMode::Rom),
    ("SinglePort", MemMode::SinglePort),
    ("TrueDualPort", MemMode::TrueDualPort),
];

impl MemMode {
    /// Looks up a mode by the name used in the logical RAM tables.
    pub fn from_name(s: &str) -> Option<Self> {
        MODE_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|&(_, mode)| mode)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemMode::SimpleDualPort => "SimpleDualPort",
            MemMode::Rom => "ROM",
            MemMode::SinglePort => "SinglePort",
            MemMode::TrueDualPort => "TrueDualPort",
        }
    }
}

impl fmt::Display for MemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical memory primitive kinds a catalog can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhysType {
    LutMemory,
    FixedBlock8192,
    FixedBlock128K,
    CustomBlockA,
    CustomBlockB,
}

impl PhysType {
    pub const COUNT: usize = 5;

    /// Slot of this type in per-type counter arrays.
    pub fn index(&self) -> usize {
        match self {
            PhysType::LutMemory => 0,
            PhysType::FixedBlock8192 => 1,
            PhysType::FixedBlock128K => 2,
            PhysType::CustomBlockA => 3,
            PhysType::CustomBlockB => 4,
        }
    }

    /// Numeric type code used in mapping files.
    pub fn type_id(&self) -> u32 {
        self.index() as u32 + 1
    }

    pub fn is_lut(&self) -> bool {
        matches!(self, PhysType::LutMemory)
    }
}

impl fmt::Display for PhysType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhysType::LutMemory => "LUTRAM",
            PhysType::FixedBlock8192 => "BRAM_8192",
            PhysType::FixedBlock128K => "BRAM_128K",
            PhysType::CustomBlockA => "BRAM_CUSTOM",
            PhysType::CustomBlockB => "BRAM_CUSTOM_2",
        };
        f.write_str(name)
    }
}

/// A memory a circuit needs, as read from the logical RAM table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogicalRam {
    pub ram_id: u32,
    pub mode: MemMode,
    pub depth: u32,
    pub width: u32,
}

/// The engine's decision for one logical RAM.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedRam {
    pub ram_id: u32,
    /// Position of the winning candidate in the circuit's enumeration sequence.
    pub decision_id: u32,
    pub extra_luts: u64,
    pub extra_logic_blocks: u64,
    pub logical_depth: u32,
    pub logical_width: u32,
    pub serial: u32,
    pub parallel: u32,
    pub phys_type: PhysType,
    pub mode: MemMode,
    pub phys_depth: u32,
    pub phys_width: u32,
    /// Running area estimate for the circuit including this RAM and all earlier ones.
    pub cumulative_area: f64,
}

/// Resources a circuit consumes once all of its RAMs are mapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CircuitUsage {
    /// Baseline logic blocks plus those added for serial-replication logic.
    pub logic_blocks: u64,
    pub extra_logic_blocks: u64,
    pub blocks: [u64; PhysType::COUNT],
}

impl CircuitUsage {
    pub fn blocks_of(&self, kind: PhysType) -> u64 {
        self.blocks[kind.index()]
    }
}

#[derive(Clone, Debug)]
pub struct Circuit {
    pub id: u32,
    pub logic_blocks: u32,
    pub rams: Vec<LogicalRam>,
    pub mapped: Vec<MappedRam>,
    pub usage: CircuitUsage,
    pub area: f64,
}

impl Circuit {
    pub fn new(id: u32, logic_blocks: u32) -> Self {
        Circuit {
            id,
            logic_blocks,
            rams: Vec::new(),
            mapped: Vec::new(),
            usage: CircuitUsage::default(),
            area: 0.0,
        }
    }

    pub fn add_ram(&mut self, ram: LogicalRam) {
        self.rams.push(ram);
    }
}
