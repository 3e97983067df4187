pub mod models;
pub mod encoding;
pub mod table;

pub use models::{Point, SegmentRecord};
pub use table::LevelTable;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
