use portalmap_core::models::{Point, LOCAL_COORD_MAX};
use tracing::debug;

use super::error::CompileError;
use super::segments::{Closure, Level, Segment};

const BYTE_RANGE: std::ops::RangeInclusive<i32> = 0..=u8::MAX as i32;

/// Close the loop, move the segment to its bounding-box origin and check
/// that every local vertex fits the 4-bit grid.
pub fn normalize_segment(index: usize, seg: &mut Segment) -> Result<(), CompileError> {
    let line = seg.line;

    if seg.vertices.len() > 1 && seg.vertices.last() == seg.vertices.first() {
        seg.vertices.pop();
        seg.closure = Closure::Explicit;
    } else {
        seg.closure = Closure::Auto;
    }

    let count = seg.vertices.len();
    if count < 3 {
        return Err(CompileError::TooFewVertices { segment: index, count, line });
    }
    for edge in 0..count {
        let (a, b) = seg.edge(edge);
        if a == b {
            return Err(CompileError::DegenerateEdge { segment: index, edge, line });
        }
    }

    let offset = seg
        .vertices
        .iter()
        .copied()
        .fold(Point::new(i32::MAX, i32::MAX), Point::component_min);
    if !BYTE_RANGE.contains(&offset.x) || !BYTE_RANGE.contains(&offset.y) {
        return Err(CompileError::OffsetOutOfRange { segment: index, x: offset.x, y: offset.y, line });
    }
    for v in seg.vertices.iter_mut() {
        *v = *v - offset;
    }
    seg.offset = offset;

    for (vertex, v) in seg.vertices.iter().enumerate() {
        if v.x > LOCAL_COORD_MAX || v.y > LOCAL_COORD_MAX {
            return Err(CompileError::CoordinateOutOfRange { segment: index, vertex, x: v.x, y: v.y, line });
        }
    }

    if !BYTE_RANGE.contains(&seg.floor_height) || !BYTE_RANGE.contains(&seg.ceiling_height) {
        return Err(CompileError::HeightOutOfRange {
            segment: index,
            floor: seg.floor_height,
            ceiling: seg.ceiling_height,
            line,
        });
    }

    debug!(segment = index, vertices = count, closure = ?seg.closure, offset = ?offset, "normalized segment");
    Ok(())
}

pub fn normalize_level(level: &mut Level) -> Result<(), CompileError> {
    for (index, seg) in level.segments.iter_mut().enumerate() {
        normalize_segment(index, seg)?;
    }
    Ok(())
}
