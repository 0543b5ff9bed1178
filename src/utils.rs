use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use crate::config::ArchMode;
use crate::error::{MapError, Result};
use crate::model::{Circuit, LogicalRam, MemMode, PhysType};

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| MapError::io(path, e))?;
    Ok(BufReader::new(file))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| MapError::io(path, e))?;
    Ok(BufWriter::new(file))
}

fn field<T: FromStr>(parts: &[&str], idx: usize) -> Option<T> {
    parts.get(idx).and_then(|s| s.parse().ok())
}

/// Reads the logic-block table and the logical RAM table into circuits sorted by id.
///
/// Malformed rows are skipped with a warning. RAMs keep their file order within a
/// circuit, which is the order they get mapped in.
pub fn read_data(logic_block_file: &Path, logic_rams_file: &Path) -> Result<Vec<Circuit>> {
    let mut circuits_map: HashMap<u32, Circuit> = HashMap::new();

    for (line_idx, line_res) in open(logic_block_file)?.lines().enumerate() {
        let line = line_res.map_err(|e| MapError::io(logic_block_file, e))?;
        let line = line.trim();
        //skipping header
        if line_idx == 0 || line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (Some(circuit_id), Some(logic_blocks)) =
            (field::<u32>(&parts, 0), field::<u32>(&parts, 1))
        else {
            warn!(line = line_idx + 1, "bad logic block row: {line}");
            continue;
        };
        circuits_map.insert(circuit_id, Circuit::new(circuit_id, logic_blocks));
    }

    for (line_idx, line_res) in open(logic_rams_file)?.lines().enumerate() {
        let line = line_res.map_err(|e| MapError::io(logic_rams_file, e))?;
        let line = line.trim();
        // title and column header
        if line_idx < 2 || line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            warn!(line = line_idx + 1, "short logical RAM row: {line}");
            continue;
        }

        let Some(mode) = MemMode::from_name(parts[2]) else {
            warn!(line = line_idx + 1, "unknown RAM mode: {}", parts[2]);
            continue;
        };
        let (Some(circuit_id), Some(ram_id), Some(depth), Some(width)) = (
            field::<u32>(&parts, 0),
            field::<u32>(&parts, 1),
            field::<u32>(&parts, 3),
            field::<u32>(&parts, 4),
        ) else {
            warn!(line = line_idx + 1, "bad logical RAM row: {line}");
            continue;
        };
        if depth == 0 || width == 0 {
            warn!(line = line_idx + 1, "empty logical RAM: {line}");
            continue;
        }

        circuits_map
            .entry(circuit_id)
            .or_insert_with(|| {
                warn!(circuit = circuit_id, "circuit missing from logic block table");
                Circuit::new(circuit_id, 0)
            })
            .add_ram(LogicalRam {
                ram_id,
                mode,
                depth,
                width,
            });
    }

    let mut circuits: Vec<Circuit> = circuits_map.into_values().collect();
    circuits.sort_by_key(|c| c.id);
    Ok(circuits)
}

/// Type code printed for `kind`. Custom blocks are reported under the code of the fixed
/// type they stand in for.
pub fn display_type(kind: PhysType, mode: ArchMode) -> u32 {
    match (kind, mode) {
        (PhysType::CustomBlockA, ArchMode::NoLut) => PhysType::LutMemory.type_id(),
        (PhysType::CustomBlockA, _) => PhysType::FixedBlock8192.type_id(),
        (PhysType::CustomBlockB, _) => PhysType::FixedBlock128K.type_id(),
        (other, _) => other.type_id(),
    }
}

pub fn write_mappings(path: &Path, circuits: &[Circuit], mode: ArchMode) -> Result<()> {
    let mut file = create(path)?;
    for c in circuits {
        for m in &c.mapped {
            writeln!(
                file,
                "{} {} {} LW {} LD {} ID {} S {} P {} Type {} Mode {} W {} D {}",
                c.id,
                m.ram_id,
                m.extra_luts,
                m.logical_width,
                m.logical_depth,
                m.decision_id,
                m.serial,
                m.parallel,
                display_type(m.phys_type, mode),
                m.mode.as_str(),
                m.phys_width,
                m.phys_depth
            )
            .map_err(|e| MapError::io(path, e))?;
        }
    }
    file.flush().map_err(|e| MapError::io(path, e))
}

pub fn write_areas(path: &Path, circuits: &[Circuit]) -> Result<()> {
    let mut file = create(path)?;
    for c in circuits {
        writeln!(file, "{} {:.3}", c.id, c.area).map_err(|e| MapError::io(path, e))?;
    }
    file.flush().map_err(|e| MapError::io(path, e))
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    #[serde(rename = "Circuit")]
    circuit: u32,
    #[serde(rename = "LUTRAM_Blocks_Used")]
    lutram: u64,
    #[serde(rename = "BRAM_8192_Used")]
    bram_8192: u64,
    #[serde(rename = "BRAM_128K_Used")]
    bram_128k: u64,
    #[serde(rename = "BRAM_Custom_Used")]
    custom_a: u64,
    #[serde(rename = "BRAM_Custom_2_Used")]
    custom_b: u64,
    #[serde(rename = "Extra_LBs")]
    extra_lbs: u64,
    #[serde(rename = "Required_LB_Tiles")]
    required_lb_tiles: u64,
    #[serde(rename = "Total_FPGA_Area")]
    area: String,
}

/// Per-circuit resource and area summary as CSV.
pub fn write_csv(results_file: &Path, circuits: &[Circuit]) -> Result<()> {
    let mut writer = csv::Writer::from_path(results_file)?;
    for c in circuits {
        let u = &c.usage;
        let lutram = u.blocks_of(PhysType::LutMemory);
        writer.serialize(SummaryRow {
            circuit: c.id,
            lutram,
            bram_8192: u.blocks_of(PhysType::FixedBlock8192),
            bram_128k: u.blocks_of(PhysType::FixedBlock128K),
            custom_a: u.blocks_of(PhysType::CustomBlockA),
            custom_b: u.blocks_of(PhysType::CustomBlockB),
            extra_lbs: u.extra_logic_blocks,
            required_lb_tiles: u.logic_blocks + lutram,
            area: format!("{:.3}", c.area),
        })?;
    }
    writer
        .flush()
        .map_err(|e| MapError::io(results_file, e))?;
    Ok(())
}

/// Geometric mean of the circuits' estimated areas.
pub fn compute_geometric_area(circuits: &[Circuit]) -> f64 {
    if circuits.is_empty() {
        return 0.0;
    }
    // scaled down so the running product stays in range
    let scale = 1.0e7_f64;
    let product: f64 = circuits.iter().map(|c| c.area / scale).product();
    let nth = 1.0 / (circuits.len() as f64);
    product.powf(nth) * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MappedRam;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let lb = write(
            dir.path(),
            "logic_block_count.txt",
            "Circuit\t# Logic blocks (N=10, k=6)\n0\t1200\n1\t355\n",
        );
        let rams = write(
            dir.path(),
            "logical_rams.txt",
            "Num_Circuits 2\n\
             Circuit\tRamID\tMode\t\tDepth\tWidth\n\
             1\t0\tROM\t\t256\t16\n\
             0\t0\tTrueDualPort\t\t2048\t36\n\
             0\t1\tSinglePort    \t512\t8\n",
        );

        let circuits = read_data(&lb, &rams).unwrap();
        assert_eq!(circuits.len(), 2);
        assert_eq!(circuits[0].id, 0);
        assert_eq!(circuits[0].logic_blocks, 1200);
        assert_eq!(circuits[0].rams.len(), 2);
        assert_eq!(circuits[0].rams[0].mode, MemMode::TrueDualPort);
        assert_eq!(circuits[0].rams[1].ram_id, 1);
        assert_eq!(circuits[0].rams[1].depth, 512);
        assert_eq!(circuits[1].rams[0].mode, MemMode::Rom);
    }

    #[test]
    fn skips_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let lb = write(dir.path(), "lb.txt", "header\n0 10\nx 3\n");
        let rams = write(
            dir.path(),
            "rams.txt",
            "title\nheader\n0 0 Quad 16 16\n0 1 ROM 16\n0 2 ROM sixteen 4\n0 3 ROM 0 4\n5 0 ROM 32 4\n",
        );
        let circuits = read_data(&lb, &rams).unwrap();
        assert_eq!(circuits.len(), 2);
        assert!(circuits[0].rams.is_empty());
        // unknown circuit is created with no baseline logic
        assert_eq!(circuits[1].id, 5);
        assert_eq!(circuits[1].logic_blocks, 0);
        assert_eq!(circuits[1].rams.len(), 1);
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            read_data(&missing, &missing),
            Err(MapError::Io { .. })
        ));
    }

    #[test]
    fn custom_types_print_as_published_codes() {
        assert_eq!(display_type(PhysType::CustomBlockA, ArchMode::NoLut), 1);
        assert_eq!(display_type(PhysType::CustomBlockA, ArchMode::WithLut), 2);
        assert_eq!(display_type(PhysType::CustomBlockA, ArchMode::TwoCustom), 2);
        assert_eq!(display_type(PhysType::CustomBlockB, ArchMode::TwoCustom), 3);
        assert_eq!(display_type(PhysType::LutMemory, ArchMode::WithLut), 1);
        assert_eq!(display_type(PhysType::FixedBlock128K, ArchMode::FixedFabric), 3);
    }

    fn mapped_circuit() -> Circuit {
        let mut c = Circuit::new(3, 40);
        c.mapped.push(MappedRam {
            ram_id: 7,
            decision_id: 12,
            extra_luts: 9,
            extra_logic_blocks: 1,
            logical_depth: 300,
            logical_width: 8,
            serial: 2,
            parallel: 1,
            phys_type: PhysType::CustomBlockA,
            mode: MemMode::SimpleDualPort,
            phys_depth: 256,
            phys_width: 32,
            cumulative_area: 2_000_000.0,
        });
        c.usage.blocks[PhysType::CustomBlockA.index()] = 2;
        c.usage.logic_blocks = 41;
        c.usage.extra_logic_blocks = 1;
        c.area = 2_000_000.0;
        c
    }

    #[test]
    fn mapping_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.txt");
        write_mappings(&path, &[mapped_circuit()], ArchMode::WithLut).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "3 7 9 LW 8 LD 300 ID 12 S 2 P 1 Type 2 Mode SimpleDualPort W 32 D 256\n"
        );
    }

    #[test]
    fn area_and_summary_files() {
        let dir = tempfile::tempdir().unwrap();
        let circuits = [mapped_circuit()];

        let area = dir.path().join("area.txt");
        write_areas(&area, &circuits).unwrap();
        assert_eq!(fs::read_to_string(&area).unwrap(), "3 2000000.000\n");

        let csv = dir.path().join("summary.csv");
        write_csv(&csv, &circuits).unwrap();
        let text = fs::read_to_string(&csv).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Circuit,LUTRAM_Blocks_Used,BRAM_8192_Used,BRAM_128K_Used,BRAM_Custom_Used,\
             BRAM_Custom_2_Used,Extra_LBs,Required_LB_Tiles,Total_FPGA_Area"
        );
        assert_eq!(lines.next().unwrap(), "3,0,0,0,2,0,1,41,2000000.000");
    }

    #[test]
    fn geometric_mean() {
        let mut a = Circuit::new(0, 0);
        a.area = 1.0e8;
        let mut b = Circuit::new(1, 0);
        b.area = 4.0e8;
        let g = compute_geometric_area(&[a, b]);
        assert!((g - 2.0e8).abs() < 1.0);
        assert_eq!(compute_geometric_area(&[]), 0.0);
    }
}
