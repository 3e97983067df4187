mod manifest;
mod reader;
#[cfg(feature = "builder")]
mod writer;

pub use manifest::{Manifest, ManifestError, TableCounts, TABLE_MAGIC, TABLE_VERSION};
pub use reader::{LevelTable, TableError};
#[cfg(feature = "builder")]
pub use writer::{encode_table, write_table, TableSections, WriteResult, WriterError};

/// Size of the BLAKE3 digest appended after header and data.
pub const HASH_LEN: usize = 32;
