use indexmap::IndexMap;
use portalmap_core::models::Point;
use tracing::{info, warn};

use super::error::CompileError;
use super::segments::Level;

/// Direction-independent identity of an edge in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub lo: Point,
    pub hi: Point,
}

/// Order-independent key: `edge_key(a, b) == edge_key(b, a)`.
pub fn edge_key(a: Point, b: Point) -> EdgeKey {
    if a <= b {
        EdgeKey { lo: a, hi: b }
    } else {
        EdgeKey { lo: b, hi: a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeRef {
    segment: usize,
    edge: usize,
    forward: bool, // traversed lo -> hi
}

/// Link every edge shared by exactly two segments in both directions.
/// Returns the number of shared edges.
pub fn resolve_portals(level: &mut Level) -> Result<usize, CompileError> {
    let mut tags: IndexMap<EdgeKey, Vec<EdgeRef>> = IndexMap::new();
    for (segment, seg) in level.segments.iter().enumerate() {
        for edge in 0..seg.edge_count() {
            let (a, b) = seg.absolute_edge(edge);
            let key = edge_key(a, b);
            tags.entry(key).or_default().push(EdgeRef { segment, edge, forward: key.lo == a });
        }
    }

    let mut shared = 0usize;
    for (key, refs) in tags.iter() {
        match refs.as_slice() {
            [_] => {}
            [a, b] if a.segment != b.segment => {
                if a.forward == b.forward {
                    warn!(
                        segment_a = a.segment,
                        segment_b = b.segment,
                        edge = ?key,
                        "shared edge runs the same way in both segments; overlap or inconsistent winding"
                    );
                }
                level.segments[a.segment].portals.insert(a.edge, b.segment);
                level.segments[b.segment].portals.insert(b.edge, a.segment);
                shared += 1;
            }
            _ => {
                let first = refs[0];
                return Err(CompileError::DegenerateAdjacency {
                    segment: first.segment,
                    edge: first.edge,
                    sharers: refs.len(),
                    line: level.segments[first.segment].line,
                });
            }
        }
    }
    info!(portals = shared, edges = tags.len(), "found portals");
    Ok(shared)
}
