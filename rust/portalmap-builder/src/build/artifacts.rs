use anyhow::{Context, Result};
use portalmap_core::table::{encode_table, LevelTable, HASH_LEN};
use tracing::info;

use super::compile::CompiledLevel;
use super::emit::render_header;
use super::verify::verify_table;

/// Which outputs a run asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub table: bool,
    pub verify: bool,
    pub view: bool,
}

/// Every output of a run, fully rendered before anything touches the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub header: String,
    pub table: Option<Vec<u8>>,
    pub table_hash: Option<[u8; HASH_LEN]>,
    pub view: Option<String>,
}

pub fn render_artifacts(compiled: &CompiledLevel, req: ArtifactRequest) -> Result<Artifacts> {
    let header = render_header(&compiled.packed);

    let (table, table_hash) = if req.table || req.verify {
        let (bytes, res) = encode_table(&compiled.packed.sections()).context("encoding table")?;
        if req.verify {
            let table = LevelTable::from_bytes(bytes.clone()).context("reading back table")?;
            verify_table(compiled, &table)?;
        }
        (Some(bytes), Some(res.hash))
    } else {
        (None, None)
    };

    let view = if req.view {
        Some(serde_json::to_string_pretty(&compiled.view()).context("serializing view")?)
    } else {
        None
    };

    info!(
        header_bytes = header.len(),
        table_bytes = table.as_ref().map_or(0, Vec::len),
        view = view.is_some(),
        "rendered outputs"
    );
    Ok(Artifacts { header, table, table_hash, view })
}
