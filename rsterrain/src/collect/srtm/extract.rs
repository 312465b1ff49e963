//! Pulling elevation rasters out of their archives.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::{debug, error};
use zip::ZipArchive;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::tiles::ExtractionTask;

fn try_extract(task: &ExtractionTask) -> Result<PathBuf> {
    let file = File::open(&task.zip_path)
        .context(format!("Failed to open zip: {:?}", task.zip_path))?;
    let mut archive = ZipArchive::new(file)
        .context(format!("Failed to read zip archive: {:?}", task.zip_path))?;
    let mut entry = archive
        .by_name(&task.member)
        .context(format!("Member {} not found", task.member))?;

    // Reject members escaping the scratch directory (`../`, absolute paths)
    let relative = entry
        .enclosed_name()
        .map(|p| p.to_path_buf())
        .context(format!("Unsafe member path: {}", task.member))?;
    let outpath = task.scratch_dir.join(relative);

    if let Some(parent) = outpath.parent() {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {:?}", parent))?;
    }

    // The target only appears once fully copied
    let partial = outpath.with_extension("partial");
    let mut outfile =
        File::create(&partial).context(format!("Failed to create file: {:?}", partial))?;
    std::io::copy(&mut entry, &mut outfile)
        .context(format!("Failed to extract {} from {:?}", task.member, task.zip_path))?;
    fs::rename(&partial, &outpath)
        .context(format!("Failed to move {:?} to {:?}", partial, outpath))?;

    Ok(outpath)
}

/// Extract one tile, reusing a previous extraction when present.
///
/// Failures are logged and reported as `None`.
pub fn extract_tile(task: &ExtractionTask) -> Option<PathBuf> {
    let expected_path = task.target_path();
    if expected_path.exists() {
        debug!("Reusing extracted tile {:?}", expected_path);
        return Some(expected_path);
    }

    match try_extract(task) {
        Ok(path) => Some(path),
        Err(e) => {
            error!("Error extracting {:?}: {:#}", task.zip_path, e);
            None
        }
    }
}

/// Extract every task and return the paths that succeeded, in task order.
pub fn extract_all(tasks: &[ExtractionTask]) -> Vec<PathBuf> {
    #[cfg(feature = "rayon")]
    let results: Vec<Option<PathBuf>> = tasks.par_iter().map(extract_tile).collect();

    #[cfg(not(feature = "rayon"))]
    let results: Vec<Option<PathBuf>> = tasks.iter().map(extract_tile).collect();

    results.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hgt_bytes, write_tile_zip, write_zip};
    use tempfile::TempDir;

    #[test]
    fn test_extract_tile_writes_member() {
        let dir = TempDir::new().unwrap();
        let zip_path = write_tile_zip(dir.path(), "N37W123", 3, |r, c| (r * 3 + c) as i16);
        let task = ExtractionTask {
            zip_path,
            member: "N37W123.hgt".to_string(),
            scratch_dir: dir.path().join("scratch"),
        };

        let path = extract_tile(&task).unwrap();
        assert_eq!(path, dir.path().join("scratch").join("N37W123.hgt"));
        assert_eq!(
            fs::read(&path).unwrap(),
            hgt_bytes(3, |r, c| (r * 3 + c) as i16)
        );
    }

    #[test]
    fn test_extract_tile_reuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("scratch");
        fs::create_dir_all(&scratch).unwrap();
        fs::write(scratch.join("N37W123.hgt"), b"cached").unwrap();

        // Archive path does not exist: only the cached file can satisfy the task
        let task = ExtractionTask {
            zip_path: dir.path().join("missing.zip"),
            member: "N37W123.hgt".to_string(),
            scratch_dir: scratch.clone(),
        };

        let path = extract_tile(&task).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"cached");
    }

    #[test]
    fn test_extract_all_skips_failures_and_keeps_order() {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("scratch");
        let a = write_tile_zip(dir.path(), "N37W123", 3, |_, _| 1);
        let b = write_tile_zip(dir.path(), "N37W122", 3, |_, _| 2);
        let broken = dir.path().join("broken.zip");
        fs::write(&broken, b"not a zip").unwrap();
        let no_member = dir.path().join("other.zip");
        write_zip(&no_member, &[("readme.txt", &b"hi"[..])]);

        let task = |zip_path: PathBuf, member: &str| ExtractionTask {
            zip_path,
            member: member.to_string(),
            scratch_dir: scratch.clone(),
        };
        let tasks = vec![
            task(a, "N37W123.hgt"),
            task(broken, "N38W123.hgt"),
            task(no_member, "N38W122.hgt"),
            task(b, "N37W122.hgt"),
        ];

        let paths = extract_all(&tasks);
        assert_eq!(
            paths,
            vec![scratch.join("N37W123.hgt"), scratch.join("N37W122.hgt")]
        );
        assert!(!scratch.join("N38W123.hgt").exists());
    }

    #[test]
    fn test_extract_rejects_escaping_member() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("evil.zip");
        write_zip(&zip_path, &[("../N37W123.hgt", &b"xx"[..])]);

        let task = ExtractionTask {
            zip_path,
            member: "../N37W123.hgt".to_string(),
            scratch_dir: dir.path().join("scratch"),
        };
        // target_path() does not exist yet, so the archive is actually read
        assert!(extract_tile(&task).is_none());
        assert!(!dir.path().join("N37W123.hgt").exists());
    }
}
