use anyhow::Result;
use clap::Parser;
use rsterrain::{BoundingBox, ConverterConfig, OutputFormat, Terrain, TerrainOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Convert SRTM tiles covering a bounding box into an elevation point file
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, allow_hyphen_values = true)]
    min_lon: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    min_lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    max_lon: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    max_lat: Option<f64>,

    /// Keep every n-th row and column
    #[arg(long)]
    step: Option<usize>,

    /// Folder holding the downloaded tile archives
    #[arg(long)]
    earthdata_dir: Option<PathBuf>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Folder for extracted tiles, reused between runs
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Extract into a temporary folder removed at the end of the run
    #[arg(long)]
    ephemeral_scratch: bool,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JSON config file, overridden by the flags above
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn bbox(&self) -> Option<BoundingBox> {
        Some(BoundingBox::new(
            self.min_lon?,
            self.min_lat?,
            self.max_lon?,
            self.max_lat?,
        ))
    }

    fn into_config(self) -> Result<ConverterConfig> {
        let mut config = match &self.config {
            Some(path) => ConverterConfig::from_json_file(path)?,
            None => ConverterConfig::default(),
        };

        if let Some(bbox) = self.bbox() {
            config.bbox = Some(bbox);
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(dir) = self.earthdata_dir {
            config.earthdata_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = self.scratch_dir {
            config.scratch_dir = dir;
        }
        if self.ephemeral_scratch {
            config.ephemeral_scratch = true;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let result = args.into_config().and_then(|config| Terrain::new(config).run());

    match result {
        Ok(TerrainOutcome::Written { .. }) => ExitCode::SUCCESS,
        // Nothing to write is not a failure
        Ok(TerrainOutcome::NoTiles) | Ok(TerrainOutcome::NoValidPoints) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Conversion failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
