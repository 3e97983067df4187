use anyhow::{ensure, Result};
use portalmap_core::table::LevelTable;
use tracing::info;

use super::compile::CompiledLevel;

/// Decode every record of `table` and check it against the level it was
/// compiled from.
pub fn verify_table(compiled: &CompiledLevel, table: &LevelTable) -> Result<()> {
    let level = &compiled.level;
    ensure!(
        table.segment_count() == level.segments.len(),
        "table has {} segments, level has {}",
        table.segment_count(),
        level.segments.len()
    );
    ensure!(table.door_count() == level.doors.len(), "door count mismatch");
    ensure!(table.palette() == compiled.packed.palette.as_slice(), "palette mismatch");

    for (idx, (rec, seg)) in table.records().zip(level.segments.iter()).enumerate() {
        ensure!(rec == compiled.packed.records[idx], "segment {idx}: record mismatch");

        let verts = table.segment_vertices(idx, &rec)?;
        let expected: Vec<(u8, u8)> = seg.vertices.iter().map(|v| (v.x as u8, v.y as u8)).collect();
        ensure!(verts == expected, "segment {idx}: vertices {verts:?} != {expected:?}");

        let normals = table.segment_normals(idx, &rec)?;
        let expected: Vec<u8> = seg.wall_normals.iter().map(|n| n.unwrap_or(0)).collect();
        ensure!(normals == expected, "segment {idx}: normals {normals:?} != {expected:?}");

        let portals: Vec<(usize, usize)> = table
            .segment_portals(idx, &rec)?
            .iter()
            .map(|p| (p.edge as usize, p.target))
            .collect();
        let expected: Vec<(usize, usize)> = seg.portals.iter().map(|(&e, &t)| (e, t)).collect();
        ensure!(portals == expected, "segment {idx}: portals {portals:?} != {expected:?}");

        let doors: Vec<(usize, usize)> = table
            .segment_doors(idx, &rec)?
            .iter()
            .map(|&(e, d)| (e as usize, d as usize))
            .collect();
        let expected: Vec<(usize, usize)> = seg.doors.iter().map(|(&e, &d)| (e, d)).collect();
        ensure!(doors == expected, "segment {idx}: doors {doors:?} != {expected:?}");
    }
    info!(segments = table.segment_count(), "table verified");
    Ok(())
}
