//! slicecore CLI - process raw slice stacks into annotated layers.
//!
//! Usage:
//!   slicecore-cli process <layers.json> [-o <output.json>] [options]
//!   slicecore-cli info <layers.json>
//!
//! The input is a JSON array of layers; each layer is a flat set of closed
//! loops in micrometre coordinates, as produced by an external mesh slicer.
//! `process` partitions every layer, runs the modifier chain and writes the
//! annotated layers (parts + attributes) back out as JSON for a downstream
//! path planner.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use slicecore::{Layer, Micrometer, ModelSummary, Pipeline, SliceConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Polygon layer-processing core for FFF slicing
#[derive(Parser, Debug)]
#[command(name = "slicecore-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Partition a layer stack and run the modifier chain
    Process {
        /// Input layer stack (JSON)
        #[arg(value_name = "LAYERS")]
        input: PathBuf,

        /// Output file for the annotated layers (JSON)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Wall line width in micrometres
        #[arg(long, default_value = "400")]
        extrusion_width: Micrometer,

        /// Number of perimeter walls
        #[arg(long, default_value = "2")]
        inset_count: usize,

        /// Percentage of a line width by which infill overlaps the
        /// innermost wall
        #[arg(long, default_value = "30")]
        infill_overlap: i32,

        /// Number of threads to use (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,
    },

    /// Print statistics about a layer stack
    Info {
        /// Input layer stack (JSON)
        #[arg(value_name = "LAYERS")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();

    match cli.command {
        Commands::Process {
            input,
            output,
            extrusion_width,
            inset_count,
            infill_overlap,
            threads,
        } => {
            let config = SliceConfig {
                extrusion_width,
                inset_count,
                infill_overlap_percent: infill_overlap,
            };
            run_process(input, output, config, threads)
        }
        Commands::Info { input } => run_info(&input),
    }
}

fn load_layers(path: &Path) -> Result<Vec<Layer>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse the layer stack in {}", path.display()))
}

fn run_process(
    input: PathBuf,
    output: Option<PathBuf>,
    config: SliceConfig,
    threads: usize,
) -> Result<()> {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to initialize thread pool")?;
    }

    let layers = load_layers(&input)?;
    info!("loaded {} layers from {}", layers.len(), input.display());

    let mut pipeline = Pipeline::new(config)?;

    let progress = ProgressBar::new(pipeline.step_count() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.set_message("processing layers");

    let annotated = pipeline.process_with_progress(&layers, |done, _total| {
        progress.set_position(done as u64);
    })?;
    progress.finish_with_message("done");

    let output_path = output.unwrap_or_else(|| input.with_extension("annotated.json"));
    let json = serde_json::to_string_pretty(&annotated)
        .context("failed to serialize the annotated layers")?;
    fs::write(&output_path, json)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    info!("wrote {}", output_path.display());
    println!(
        "Processed {} layers ({} walls, {} µm extrusion width) -> {}",
        annotated.len(),
        config.inset_count,
        config.extrusion_width,
        output_path.display()
    );
    Ok(())
}

fn run_info(input: &Path) -> Result<()> {
    let layers = load_layers(input)?;

    let loop_count: usize = layers.iter().map(|l| l.polygons().len()).sum();
    let vertex_count: usize = layers
        .iter()
        .flat_map(|l| l.polygons().iter())
        .map(|p| p.len())
        .sum();
    let summary = ModelSummary::from_layers(&layers);

    println!("Layers:   {}", layers.len());
    println!("Loops:    {loop_count}");
    println!("Vertices: {vertex_count}");
    println!(
        "Bounds:   ({}, {}) - ({}, {}) µm",
        summary.min.x, summary.min.y, summary.max.x, summary.max.y
    );
    Ok(())
}
