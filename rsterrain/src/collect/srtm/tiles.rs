//! Locating SRTM archives for a bounding box.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use zip::ZipArchive;

use crate::geo_core::BoundingBox;

/// One archive member to pull out into the scratch directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTask {
    pub zip_path: PathBuf,
    /// Member name inside the archive, possibly with internal directories
    pub member: String,
    pub scratch_dir: PathBuf,
}

impl ExtractionTask {
    /// Where the member lands once extracted
    pub fn target_path(&self) -> PathBuf {
        self.scratch_dir.join(&self.member)
    }
}

/// Outcome of looking for elevation data inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberChoice {
    /// Name of the raster member to extract
    Data(String),
    /// Only `.num` (source/quality) members, no elevation raster
    MetadataOnly,
    /// Neither a raster nor a `.num` member
    Empty,
}

/// SRTM tile name of the cell whose south-west corner is `(lat, lon)`.
pub fn tile_name(lat: i32, lon: i32) -> String {
    let ns = if lat >= 0 { 'N' } else { 'S' };
    let ew = if lon >= 0 { 'E' } else { 'W' };
    format!("{}{:02}{}{:03}", ns, lat.unsigned_abs(), ew, lon.unsigned_abs())
}

fn is_apple_double(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("._"))
        .unwrap_or(false)
}

/// Search `search_dir` recursively for `*<tile_name>*.zip`.
///
/// Hidden files and directories below `search_dir` are not searched.
/// `.hgt.zip` archives win over other matches (e.g. `.num.zip`).
pub fn find_tile_zip(tile_name: &str, search_dir: &Path) -> Result<Option<PathBuf>> {
    let pattern = format!(
        "{}/**/*{}*.zip",
        glob::Pattern::escape(&search_dir.to_string_lossy()),
        tile_name
    );

    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    let files: Vec<PathBuf> = glob::glob_with(&pattern, options)
        .context(format!("Invalid glob pattern: {}", pattern))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("Skipping unreadable path while globbing: {}", e);
                None
            }
        })
        .filter(|path| !is_apple_double(path))
        .collect();

    let hgt = files
        .iter()
        .find(|f| f.to_string_lossy().to_lowercase().contains(".hgt.zip"));

    Ok(hgt.or_else(|| files.first()).cloned())
}

/// Pick the elevation raster among the member names of an archive.
pub fn select_data_member<S: AsRef<str>>(names: &[S]) -> MemberChoice {
    let candidate = names.iter().map(|n| n.as_ref()).find(|name| {
        (name.ends_with(".hgt") || name.ends_with(".tif")) && !is_apple_double(Path::new(name))
    });

    match candidate {
        Some(name) => MemberChoice::Data(name.to_string()),
        None if names.iter().any(|n| n.as_ref().ends_with(".num")) => MemberChoice::MetadataOnly,
        None => MemberChoice::Empty,
    }
}

fn member_names(zip_path: &Path) -> Result<Vec<String>> {
    let file = File::open(zip_path).context(format!("Failed to open zip: {:?}", zip_path))?;
    let archive =
        ZipArchive::new(file).context(format!("Failed to read zip archive: {:?}", zip_path))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Build one extraction task per tile of `bbox` found under `search_dir`.
///
/// Missing tiles and unusable archives are logged and skipped.
pub fn discover(bbox: &BoundingBox, search_dir: &Path, scratch_dir: &Path) -> Vec<ExtractionTask> {
    let mut tasks = Vec::new();

    for (lat, lon) in bbox.tile_cells() {
        let name = tile_name(lat, lon);

        let zip_path = match find_tile_zip(&name, search_dir) {
            Ok(Some(path)) => path,
            Ok(None) => {
                warn!("Tile {} not found.", name);
                continue;
            }
            Err(e) => {
                error!("Error searching for tile {}: {:#}", name, e);
                continue;
            }
        };

        let names = match member_names(&zip_path) {
            Ok(names) => names,
            Err(e) => {
                error!("Error reading zip {:?}: {:#}", zip_path, e);
                continue;
            }
        };

        match select_data_member(names.as_slice()) {
            MemberChoice::Data(member) => {
                debug!("Tile {} -> {:?} ({})", name, zip_path, member);
                tasks.push(ExtractionTask {
                    zip_path,
                    member,
                    scratch_dir: scratch_dir.to_path_buf(),
                });
            }
            MemberChoice::MetadataOnly => error!(
                "Found metadata file (.num) but no elevation data in {:?}.",
                zip_path
            ),
            MemberChoice::Empty => warn!("No valid data files found in zip: {:?}", zip_path),
        }
    }

    tasks
}
