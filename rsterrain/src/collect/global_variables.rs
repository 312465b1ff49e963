use std::path::PathBuf;

/// Directory searched (recursively) for SRTM zip archives
pub const EARTHDATA_PATH: &str = "./earthdata";
/// Root of generated point files
pub const OUTPUT_PATH: &str = "./output";
/// Scratch folder for extracted tiles, under `OUTPUT_PATH`
pub const TEMP_TILES_DIR: &str = "temp_tiles";

/// Default folder holding the tile archives
pub fn get_earthdata_path() -> PathBuf {
    PathBuf::from(EARTHDATA_PATH)
}

/// Default root of the output folders
pub fn get_output_path() -> PathBuf {
    PathBuf::from(OUTPUT_PATH)
}

/// Default scratch folder, `./output/temp_tiles`
pub fn get_temp_tiles_path() -> PathBuf {
    get_output_path().join(TEMP_TILES_DIR)
}
