//! spz - SPZ splat container tool
//!
//! Inspects, dumps, converts and repairs .spz files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spz_format::CoordinateSystem;
use std::path::{Path, PathBuf};

use spz_cli::{ContainerInfo, SpzConfig, convert, inspect};

#[derive(Parser)]
#[command(name = "spz")]
#[command(about = "SPZ splat container tool")]
#[command(version)]
struct Cli {
    /// Config file (default: ./spz.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header fields and layout
    Info {
        /// Input .spz file
        input: PathBuf,
    },

    /// Print decoded points as JSON
    Dump {
        /// Input .spz file
        input: PathBuf,

        /// Output .json file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of points
        #[arg(short, long)]
        limit: Option<usize>,

        /// Coordinate system for the decoded points (e.g. RUB, RDF)
        #[arg(long)]
        coords: Option<CoordinateSystem>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Decode and re-encode with new settings
    Convert {
        /// Input .spz file
        input: PathBuf,

        /// Output .spz file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Container version to write (1-3)
        #[arg(long)]
        target_version: Option<u32>,

        /// Fixed-point fractional bits for positions
        #[arg(long)]
        fractional_bits: Option<u8>,

        /// SH degree to store (default: keep the source degree)
        #[arg(long)]
        sh_degree: Option<u8>,

        /// Store positions as half-floats
        #[arg(long)]
        float16: bool,
    },

    /// Rewrite a truncated file with its recoverable points
    Repair {
        /// Input .spz file
        input: PathBuf,

        /// Output .spz file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = SpzConfig::discover(cli.config.as_deref(), Path::new("."))?;

    match cli.command {
        Commands::Info { input } => {
            let set = inspect::read_container(&input, &config.decode)?;
            println!("{}", ContainerInfo::from_set(&set));
        }

        Commands::Dump {
            input,
            output,
            limit,
            coords,
            pretty,
        } => {
            let mut options = config.decode;
            if let Some(coords) = coords {
                options.coordinate_system = coords;
            }
            let set = inspect::read_container(&input, &options)?;
            let json = inspect::dump_json(&set, &options, limit, pretty)?;
            match output {
                Some(output) => {
                    std::fs::write(&output, json)
                        .with_context(|| format!("Failed to write {:?}", output))?;
                    tracing::info!("Wrote points to {:?}", output);
                }
                None => println!("{json}"),
            }
        }

        Commands::Convert {
            input,
            output,
            target_version,
            fractional_bits,
            sh_degree,
            float16,
        } => {
            let sh_degree = config.convert_sh_degree(sh_degree);
            let mut encode = config.encode;
            if let Some(version) = target_version {
                encode.version = version;
            }
            if let Some(bits) = fractional_bits {
                encode.fractional_bits = bits;
            }
            encode.float16_positions |= float16;
            encode.validate()?;

            let output =
                output.unwrap_or_else(|| input.with_extension(format!("v{}.spz", encode.version)));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            let summary =
                convert::convert_file(&input, &output, &config.decode, &encode, sh_degree)?;
            tracing::info!(
                "Done! {} points, {} -> {} bytes",
                summary.points,
                summary.input_bytes,
                summary.output_bytes
            );
        }

        Commands::Repair { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("repaired.spz"));
            tracing::info!("Repairing {:?} -> {:?}", input, output);
            let summary = convert::repair_file(&input, &output, &config.decode)?;
            if summary.points == summary.declared_points {
                tracing::info!("Nothing to recover; copied {} points", summary.points);
            }
            tracing::info!("Done!");
        }
    }

    Ok(())
}
