//! Unfolding CLI — headless driver around the core pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uf_core::{BinningPolicy, CenterPolicy, RegularizationPolicy, UnfoldingConfig};
use uf_io::TRUTH_SUFFIX;
use uf_unfold::{SampleSet, Unfolder};

#[derive(Parser)]
#[command(name = "uf")]
#[command(about = "Statistical unfolding - detector response correction")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load paired samples, learn the response and unfold the measured histogram
    Unfold {
        /// Input delimited-text file(s) with a header row
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Column-name suffix marking the truth/simulated side
        #[arg(long, default_value = TRUTH_SUFFIX)]
        truth_suffix: String,

        /// Per-dimension bin count
        #[arg(short, long, default_value = "10")]
        bins: usize,

        /// Active dimensionality
        #[arg(short, long, default_value = "1")]
        dims: usize,

        /// Dimension rotation offset when selecting active columns
        #[arg(long, default_value = "0")]
        dim_shift: usize,

        /// Binning policy: static, dynamic or hybrid
        #[arg(long, default_value = "static")]
        binning: BinningPolicy,

        /// Dynamic split-coordinate policy: midpoint or median
        #[arg(long, default_value = "midpoint")]
        center: CenterPolicy,

        /// Regularization policy: binary, statistical or mass-center
        #[arg(long, default_value = "binary")]
        regularization: RegularizationPolicy,

        /// Tikhonov regularization strength
        #[arg(long, default_value = "1e-3")]
        alpha: f64,

        /// Output file for the snapshot (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level).with_writer(std::io::stderr).init();

    match cli.command {
        Commands::Unfold {
            input,
            truth_suffix,
            bins,
            dims,
            dim_shift,
            binning,
            center,
            regularization,
            alpha,
            output,
        } => {
            let config = UnfoldingConfig {
                bins,
                dims,
                dim_shift,
                binning,
                center,
                regularization,
                alpha,
            };
            run_unfold(&input, &truth_suffix, config, output.as_deref())
        }
    }
}

fn run_unfold(
    inputs: &[PathBuf],
    truth_suffix: &str,
    config: UnfoldingConfig,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let data = uf_io::load_delimited(inputs, truth_suffix)
        .with_context(|| format!("loading {} input file(s)", inputs.len()))?;
    let (measured, truth) = data.select(config.dims, config.dim_shift)?;
    let samples = SampleSet::new(measured, truth)?;

    let snapshot = Unfolder::new(samples, config).run().context("unfolding failed")?;

    let json = serde_json::to_string_pretty(&snapshot)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
