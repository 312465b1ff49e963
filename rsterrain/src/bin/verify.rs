use anyhow::{Context, Result};
use clap::Parser;
use rsterrain::collect::global_variables::get_output_path;
use rsterrain::commons::summary::{resolve_target, TerrainSummary};
use rsterrain::io::read_points;
use rsterrain::{BoundingBox, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Print feature count, bounds and elevation statistics of a point file
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Point file to inspect; takes precedence over the bounding box
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long, allow_hyphen_values = true)]
    min_lon: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    min_lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    max_lon: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    max_lat: Option<f64>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Format the converter wrote, used with the bounding box
    #[arg(long, value_enum, default_value_t = OutputFormat::default())]
    format: OutputFormat,
}

fn verify(args: &Args) -> Result<TerrainSummary> {
    let bbox = match (args.min_lon, args.min_lat, args.max_lon, args.max_lat) {
        (Some(min_x), Some(min_y), Some(max_x), Some(max_y)) => {
            Some(BoundingBox::validated(min_x, min_y, max_x, max_y)?)
        }
        _ => None,
    };
    let output_dir = args.output_dir.clone().unwrap_or_else(get_output_path);

    let target = resolve_target(args.file.as_deref(), bbox.as_ref(), &output_dir, args.format)
        .context("Provide --file or all of --min-lon, --min-lat, --max-lon, --max-lat")?;
    if !target.exists() {
        anyhow::bail!("File not found: {:?}", target);
    }

    info!("Reading {:?}...", target);
    let loaded = read_points(&target).context(format!("Failed to read {:?}", target))?;
    TerrainSummary::from_points(&loaded)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match verify(&args) {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Verification failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
