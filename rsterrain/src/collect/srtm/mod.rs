pub mod extract;
pub mod tiles;

pub use extract::{extract_all, extract_tile};
pub use tiles::{discover, find_tile_zip, select_data_member, tile_name, ExtractionTask, MemberChoice};
