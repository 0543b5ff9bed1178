//! Greedy logical-to-physical RAM mapper.
//!
//! Each circuit is mapped on its own. Its logical RAMs are visited in declaration order,
//! and for every RAM the mapper enumerates each `(resource, depth x width)` pair of the
//! catalog, estimates the circuit area that would result from picking it, and keeps the
//! first cheapest one. The winner's resource usage is then committed, so the choice made
//! for one RAM changes the cost landscape of every RAM after it.
//!
//! The fixed-fabric and custom architectures share that search and differ only in their
//! [`AreaModel`]: the area of a logic block tile, which block types an estimate pays for,
//! and the resource types that must never be chosen.

use tracing::{debug, info, trace};

use crate::config::{ArchConfig, ArchMode};
use crate::error::{MapError, Result};
use crate::model::{Circuit, CircuitUsage, LogicalRam, MappedRam, MemMode, PhysType};
use crate::resource::{LUTRAM_RATIO, ResourceEntry};

/// Deepest serial chain the mapper accepts.
pub const MAX_SERIAL: u32 = 16;
/// LUTs packed into one logic block.
pub const LUTS_PER_LB: u64 = 10;

/// Per-architecture constants of the area estimate.
pub trait AreaModel {
    fn name(&self) -> &'static str;

    /// Area of one logic block tile.
    fn lb_area(&self) -> f64;

    /// Resource types this architecture must never end up using.
    fn forbidden(&self) -> &'static [PhysType] {
        &[]
    }

    /// Whether `entry` adds block area to an estimate where `kind` is the type being
    /// tried. `None` prices the circuit with nothing new placed.
    fn billed(&self, entry: &ResourceEntry, _kind: Option<PhysType>) -> bool {
        !entry.kind.is_lut()
    }
}

/// LUT memory plus 8192-bit and 128K-bit block RAMs.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicArea;

impl AreaModel for BasicArea {
    fn name(&self) -> &'static str {
        ArchMode::FixedFabric.name()
    }

    fn lb_area(&self) -> f64 {
        37500.0
    }
}

/// The user-parameterized architectures.
#[derive(Clone, Copy, Debug)]
pub struct CustomArea {
    mode: ArchMode,
    lut_ratio: f64,
}

impl CustomArea {
    pub fn new(mode: ArchMode, lut_ratio: Option<f64>) -> Self {
        CustomArea {
            mode,
            lut_ratio: lut_ratio.unwrap_or(LUTRAM_RATIO),
        }
    }
}

impl AreaModel for CustomArea {
    fn name(&self) -> &'static str {
        self.mode.name()
    }

    fn lb_area(&self) -> f64 {
        match self.mode {
            ArchMode::NoLut => 35000.0,
            // one in `lut_ratio` tiles is a LUT-memory capable 40000 tile
            ArchMode::TwoCustom => {
                let r = self.lut_ratio;
                35000.0 / r * (r - 1.0) + 40000.0 / r
            }
            ArchMode::FixedFabric | ArchMode::WithLut => 37500.0,
        }
    }

    fn forbidden(&self) -> &'static [PhysType] {
        match self.mode {
            ArchMode::NoLut => &[PhysType::LutMemory, PhysType::CustomBlockB],
            ArchMode::WithLut => &[PhysType::CustomBlockB],
            ArchMode::FixedFabric | ArchMode::TwoCustom => &[],
        }
    }

    fn billed(&self, entry: &ResourceEntry, kind: Option<PhysType>) -> bool {
        match (self.mode, kind) {
            // only the tried type is priced; LUT memory is sold as 640-bit blocks
            (ArchMode::WithLut, Some(kind)) => entry.kind == kind,
            _ => !entry.kind.is_lut(),
        }
    }
}

/// One admissible way to implement a logical RAM.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub kind: PhysType,
    pub depth: u32,
    pub width: u32,
    pub serial: u32,
    pub parallel: u32,
    pub extra_luts: u64,
    pub decision_id: u32,
    /// Estimated circuit area if this candidate is committed.
    pub area: f64,
}

impl Candidate {
    pub fn blocks(&self) -> u64 {
        self.serial as u64 * self.parallel as u64
    }

    pub fn extra_logic_blocks(&self) -> u64 {
        self.extra_luts.div_ceil(LUTS_PER_LB)
    }

    fn into_mapped(self, ram: &LogicalRam) -> MappedRam {
        MappedRam {
            ram_id: ram.ram_id,
            decision_id: self.decision_id,
            extra_luts: self.extra_luts,
            extra_logic_blocks: self.extra_logic_blocks(),
            logical_depth: ram.depth,
            logical_width: ram.width,
            serial: self.serial,
            parallel: self.parallel,
            phys_type: self.kind,
            mode: ram.mode,
            phys_depth: self.depth,
            phys_width: self.width,
            cumulative_area: self.area,
        }
    }
}

/// Running state of one circuit's mapping. Only updated when a decision commits.
#[derive(Clone, Copy, Debug)]
pub struct MappingContext {
    pub usage: CircuitUsage,
    next_decision: u32,
}

impl MappingContext {
    pub fn new(baseline_logic_blocks: u32) -> Self {
        MappingContext {
            usage: CircuitUsage {
                logic_blocks: baseline_logic_blocks as u64,
                ..CircuitUsage::default()
            },
            next_decision: 0,
        }
    }

    fn commit(&mut self, winner: &Candidate) {
        let extra = winner.extra_logic_blocks();
        self.usage.logic_blocks += extra;
        self.usage.extra_logic_blocks += extra;
        self.usage.blocks[winner.kind.index()] += winner.blocks();
    }
}

/// Multiplexing LUTs needed to chain `serial` blocks for a RAM `width` bits wide.
pub fn serial_luts(serial: u32, width: u32) -> u64 {
    let (serial, width) = (serial as u64, width as u64);
    match serial {
        0 | 1 => 0,
        2 => width + 1,
        3..=4 => width + serial,
        5..=7 => 2 * width + serial,
        8..=10 => 3 * width + serial,
        11..=13 => 4 * width + serial,
        _ => 5 * width + serial,
    }
}

/// `(serial, parallel)` replication needed to build `ram` from `depth` x `width` blocks.
pub fn replication(ram: &LogicalRam, depth: u32, width: u32) -> (u32, u32) {
    let serial = if ram.depth > depth {
        ram.depth.div_ceil(depth)
    } else {
        1
    };
    let parallel = if ram.width > width {
        ram.width.div_ceil(width)
    } else {
        1
    };
    (serial, parallel)
}

pub struct Mapper<'a, M> {
    catalog: &'a [ResourceEntry],
    model: M,
}

impl<'a, M: AreaModel> Mapper<'a, M> {
    pub fn new(catalog: &'a [ResourceEntry], model: M) -> Result<Self> {
        if catalog.is_empty() {
            return Err(MapError::EmptyCatalog);
        }
        Ok(Mapper { catalog, model })
    }

    /// Logic-block equivalents the fabric needs if `kind` takes `demand` more blocks and
    /// `extra_lbs` more logic blocks are spent on glue logic.
    fn required_equivalent(
        &self,
        usage: &CircuitUsage,
        kind: Option<PhysType>,
        demand: u64,
        extra_lbs: u64,
    ) -> u64 {
        let mut planned_lbs =
            usage.logic_blocks + usage.blocks_of(PhysType::LutMemory) + extra_lbs;
        if kind == Some(PhysType::LutMemory) {
            planned_lbs += demand;
        }

        let mut required = planned_lbs as f64;
        for entry in self.catalog.iter().filter(|e| !e.kind.is_lut()) {
            let mut planned = usage.blocks_of(entry.kind);
            if kind == Some(entry.kind) {
                planned += demand;
            }
            required = required.max(planned as f64 * entry.ratio);
        }
        required as u64
    }

    /// Area of a fabric sized to `required` logic-block equivalents while `kind` is tried.
    fn fabric_area(&self, required: u64, kind: Option<PhysType>) -> f64 {
        let required_f = required as f64;
        let mut area = required_f * self.model.lb_area();
        for entry in self.catalog.iter().filter(|e| self.model.billed(e, kind)) {
            area += (required_f / entry.ratio).floor() * entry.block_area();
        }
        area
    }

    /// Area of the circuit as committed so far, with nothing new placed.
    pub fn current_area(&self, ctx: &MappingContext) -> f64 {
        self.fabric_area(self.required_equivalent(&ctx.usage, None, 0, 0), None)
    }

    /// Every admissible candidate for `ram`, in catalog then combination order.
    ///
    /// Advances the circuit's decision counter for each candidate that passes the
    /// port-mode filters, whether or not it survives the serial limit.
    pub fn candidates(&self, ctx: &mut MappingContext, ram: &LogicalRam) -> Vec<Candidate> {
        let tdp = ram.mode == MemMode::TrueDualPort;
        let mut out = Vec::new();

        for entry in self.catalog {
            // LUT memory has no true dual port mode
            if tdp && entry.kind.is_lut() {
                continue;
            }
            for &(depth, width) in &entry.combinations {
                // the widest shape is single-port only
                if tdp && width == entry.max_width {
                    continue;
                }
                let decision_id = ctx.next_decision;
                ctx.next_decision += 1;

                let (serial, parallel) = replication(ram, depth, width);
                if serial > MAX_SERIAL {
                    continue;
                }
                let mut extra_luts = serial_luts(serial, ram.width);
                if tdp {
                    // TODO: confirm with the fabric model whether both ports need their own
                    // decode and mux logic; for now both are counted
                    extra_luts *= 2;
                }

                let mut candidate = Candidate {
                    kind: entry.kind,
                    depth,
                    width,
                    serial,
                    parallel,
                    extra_luts,
                    decision_id,
                    area: 0.0,
                };
                let required = self.required_equivalent(
                    &ctx.usage,
                    Some(entry.kind),
                    candidate.blocks(),
                    candidate.extra_logic_blocks(),
                );
                candidate.area = self.fabric_area(required, Some(entry.kind));
                trace!(
                    ram = ram.ram_id,
                    kind = %entry.kind,
                    depth,
                    width,
                    serial,
                    parallel,
                    area = candidate.area,
                    "candidate"
                );
                out.push(candidate);
            }
        }
        out
    }

    /// The first candidate of minimal area, if any is admissible.
    pub fn best_candidate(&self, ctx: &mut MappingContext, ram: &LogicalRam) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for candidate in self.candidates(ctx, ram) {
            match &best {
                Some(b) if candidate.area >= b.area => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    /// Maps every logical RAM of `circuit` and fills in its results.
    pub fn map_circuit(&self, circuit: &mut Circuit) -> Result<()> {
        let mut ctx = MappingContext::new(circuit.logic_blocks);
        let mut mapped = Vec::with_capacity(circuit.rams.len());

        for ram in &circuit.rams {
            let winner = self
                .best_candidate(&mut ctx, ram)
                .ok_or(MapError::NoCandidate {
                    circuit_id: circuit.id,
                    ram_id: ram.ram_id,
                })?;
            if winner.area == 0.0 {
                return Err(MapError::ZeroArea {
                    circuit_id: circuit.id,
                    ram_id: ram.ram_id,
                });
            }

            ctx.commit(&winner);
            if let Some(&kind) = self
                .model
                .forbidden()
                .iter()
                .find(|k| ctx.usage.blocks_of(**k) != 0)
            {
                return Err(MapError::UnexpectedResource {
                    circuit_id: circuit.id,
                    ram_id: ram.ram_id,
                    kind,
                    mode: self.model.name(),
                });
            }

            debug!(
                circuit = circuit.id,
                ram = ram.ram_id,
                kind = %winner.kind,
                depth = winner.depth,
                width = winner.width,
                serial = winner.serial,
                parallel = winner.parallel,
                area = winner.area,
                "mapped"
            );
            mapped.push(winner.into_mapped(ram));
        }

        // the last decision's running estimate already covers every earlier RAM
        circuit.area = match mapped.last() {
            Some(last) => last.cumulative_area,
            None => self.current_area(&ctx),
        };
        circuit.mapped = mapped;
        circuit.usage = ctx.usage;

        info!(
            circuit = circuit.id,
            lutram = circuit.usage.blocks_of(PhysType::LutMemory),
            bram_8192 = circuit.usage.blocks_of(PhysType::FixedBlock8192),
            bram_128k = circuit.usage.blocks_of(PhysType::FixedBlock128K),
            custom_a = circuit.usage.blocks_of(PhysType::CustomBlockA),
            custom_b = circuit.usage.blocks_of(PhysType::CustomBlockB),
            area = circuit.area,
            "circuit mapped"
        );
        Ok(())
    }

    pub fn map_all(&self, circuits: &mut [Circuit]) -> Result<()> {
        for circuit in circuits.iter_mut() {
            self.map_circuit(circuit)?;
        }
        Ok(())
    }
}

/// Maps every circuit with the area model that matches `config`.
pub fn map_circuits(
    circuits: &mut [Circuit],
    catalog: &[ResourceEntry],
    config: &ArchConfig,
) -> Result<()> {
    match config.mode {
        ArchMode::FixedFabric => Mapper::new(catalog, BasicArea)?.map_all(circuits),
        mode => {
            Mapper::new(catalog, CustomArea::new(mode, config.params.lut_ratio))?.map_all(circuits)
        }
    }
}
