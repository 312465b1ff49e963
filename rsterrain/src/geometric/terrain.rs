use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{error, info, warn};

use super::points::{sample, TerrainPoints};
use super::raster::Raster;
use crate::collect::global_variables::{get_earthdata_path, get_output_path, get_temp_tiles_path};
use crate::collect::srtm::{discover, extract_all};
use crate::geo_core::BoundingBox;
use crate::io::{write_points, OutputFormat};

/// Settings of a conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Area to convert, `None` until set
    pub bbox: Option<BoundingBox>,
    /// Keep every `step`-th row and column
    pub step: usize,
    /// Searched recursively for tile archives
    pub earthdata_dir: PathBuf,
    /// Point files go to `<output_dir>/<folder name>/terrain.<ext>`
    pub output_dir: PathBuf,
    /// Extracted tiles are kept here and reused by later runs
    pub scratch_dir: PathBuf,
    /// Extract into a temporary directory removed after the run instead
    pub ephemeral_scratch: bool,
    /// Format of the written point file
    pub format: OutputFormat,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            bbox: None,
            step: 1,
            earthdata_dir: get_earthdata_path(),
            output_dir: get_output_path(),
            scratch_dir: get_temp_tiles_path(),
            ephemeral_scratch: false,
            format: OutputFormat::default(),
        }
    }
}

impl ConverterConfig {
    /// Load a JSON config; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&content).context(format!("Failed to parse config file: {:?}", path))
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainOutcome {
    Written { path: PathBuf, point_count: usize },
    /// No tile archive found, or none could be extracted
    NoTiles,
    /// Every sample inside the box was a void
    NoValidPoints,
}

/// SRTM tiles to elevation points for one bounding box
pub struct Terrain {
    config: ConverterConfig,
}

impl Terrain {
    /// Pipeline with the given settings; nothing runs until `run`
    pub fn new(config: ConverterConfig) -> Self {
        Terrain { config }
    }

    /// Set the area to convert, in WGS84 degrees
    pub fn set_bbox(&mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) {
        self.config.bbox = Some(BoundingBox::new(min_x, min_y, max_x, max_y));
    }

    /// Keep every `step`-th row and column; 1 keeps every sample
    pub fn set_step(&mut self, step: usize) {
        self.config.step = step;
    }

    /// Current settings
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Folder that receives the point file for the current bounding box
    pub fn output_folder(&self) -> Option<PathBuf> {
        self.config
            .bbox
            .map(|bbox| self.config.output_dir.join(bbox.folder_name()))
    }

    /// Discover, extract, merge, clip, sample and write the points.
    ///
    /// A missing or invalid bounding box is an error. Finding no tiles or no
    /// valid sample is reported through the outcome.
    pub fn run(&self) -> Result<TerrainOutcome> {
        let start_time = Instant::now();

        let bbox = self
            .config
            .bbox
            .context("Bounding box must be set before running the conversion")?;
        bbox.validate()?;

        // Held for the whole run when the scratch dir is temporary
        let ephemeral = if self.config.ephemeral_scratch {
            Some(TempDir::new().context("Failed to create temporary scratch directory")?)
        } else {
            None
        };
        let scratch_dir = ephemeral
            .as_ref()
            .map(|t| t.path().to_path_buf())
            .unwrap_or_else(|| self.config.scratch_dir.clone());

        info!("Searching for tiles in {:?}...", self.config.earthdata_dir);
        let tasks = discover(&bbox, &self.config.earthdata_dir, &scratch_dir);
        if tasks.is_empty() {
            warn!("No tiles found. Exiting.");
            return Ok(TerrainOutcome::NoTiles);
        }

        std::fs::create_dir_all(&scratch_dir)
            .context(format!("Failed to create scratch directory: {:?}", scratch_dir))?;
        let tile_paths = extract_all(&tasks);
        if tile_paths.is_empty() {
            error!("Extraction failed. No files to process.");
            return Ok(TerrainOutcome::NoTiles);
        }

        info!("Merging {} tiles...", tile_paths.len());
        let clipped = mosaic_and_clip(&tile_paths, &bbox)?;

        if self.config.step > 1 {
            info!("Downsampling with step {}...", self.config.step);
        }
        let samples = sample(&clipped, self.config.step);
        if samples.is_empty() {
            warn!("No valid elevation points found in the area.");
            return Ok(TerrainOutcome::NoValidPoints);
        }

        info!("Generating {} points...", samples.len());
        let points = TerrainPoints::from_samples(&samples, &clipped.transform, &bbox.region_label());

        let out_dir = self.config.output_dir.join(bbox.folder_name());
        std::fs::create_dir_all(&out_dir)
            .context(format!("Failed to create output directory: {:?}", out_dir))?;
        let out_path = out_dir.join(self.config.format.file_name());

        write_points(&points, &out_path, self.config.format)
            .context(format!("Failed to write {} {:?}", self.config.format, out_path))?;

        info!(
            "Saved {} points to {:?}. Total time: {:.2} seconds.",
            points.len(),
            out_path,
            start_time.elapsed().as_secs_f64()
        );

        Ok(TerrainOutcome::Written {
            path: out_path,
            point_count: points.len(),
        })
    }
}

/// Mosaic the tiles through a GDAL VRT and read back the window covering `bbox`
#[cfg(feature = "gdal")]
fn mosaic_and_clip(tile_paths: &[PathBuf], bbox: &BoundingBox) -> Result<Raster> {
    use super::clip::clip_dataset;
    use super::mosaic::build_vrt;
    use super::raster::open_dataset;

    let datasets = tile_paths
        .iter()
        .map(|path| open_dataset(path).context(format!("Failed to read tile: {:?}", path)))
        .collect::<Result<Vec<_>>>()?;
    let vrt = build_vrt(datasets)?;
    clip_dataset(&vrt, bbox)
}

/// Mosaic the tiles in memory and crop the result to `bbox`
#[cfg(not(feature = "gdal"))]
fn mosaic_and_clip(tile_paths: &[PathBuf], bbox: &BoundingBox) -> Result<Raster> {
    use super::clip::clip_to_bbox;
    use super::mosaic::merge;

    let rasters = tile_paths
        .iter()
        .map(|path| Raster::open(path).context(format!("Failed to read tile: {:?}", path)))
        .collect::<Result<Vec<_>>>()?;
    let mosaic = merge(&rasters)?;
    drop(rasters);
    clip_to_bbox(&mosaic, bbox)
}
