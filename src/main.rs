use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ram_mapper::utils::{
    compute_geometric_area, read_data, write_areas, write_csv, write_mappings,
};
use ram_mapper::{ArchConfig, build_catalog, map_circuits};

/// Maps logical RAMs onto an FPGA's physical memories and estimates each circuit's area.
#[derive(Parser, Debug)]
#[command(name = "ram-mapper", version, about, long_about = None)]
struct Cli {
    /// Architecture: 1 fixed fabric, 2 custom block without LUT memory,
    /// 3 custom block with LUT memory, 4 two custom blocks with LUT memory
    mode: u32,

    /// Mode parameters. Modes 2/3: BITS MAX_WIDTH RATIO.
    /// Mode 4: LUT_RATIO BITS_A MAX_WIDTH_A RATIO_A BITS_B MAX_WIDTH_B RATIO_B
    params: Vec<f64>,

    /// Logic block count table
    #[arg(long, default_value = "logic_block_count.txt")]
    logic_blocks: PathBuf,

    /// Logical RAM table
    #[arg(long, default_value = "logical_rams.txt")]
    logical_rams: PathBuf,

    /// Directory for the mapping and area files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Also write a per-circuit CSV summary to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let start = Instant::now();

    let config = ArchConfig::from_values(cli.mode, &cli.params)
        .context("invalid architecture selection")?;
    info!(mode = config.mode.name(), params = ?config.params, "architecture");

    let catalog = build_catalog(&config)?;
    let mut circuits = read_data(&cli.logic_blocks, &cli.logical_rams)
        .context("failed to read circuit tables")?;
    info!(circuits = circuits.len(), "read circuits");

    map_circuits(&mut circuits, &catalog, &config).context("mapping failed")?;

    let mapping_file = cli.out_dir.join(config.mapping_file_name()?);
    write_mappings(&mapping_file, &circuits, config.mode)?;
    write_areas(&cli.out_dir.join(config.area_file_name()?), &circuits)?;
    if let Some(summary) = &cli.summary {
        write_csv(summary, &circuits)?;
    }

    info!("Geometric mean FPGA area = {:.5e}", compute_geometric_area(&circuits));
    info!("Program runtime: {:.3?}", start.elapsed());
    println!("{}", mapping_file.display());
    Ok(())
}
