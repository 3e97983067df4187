use portalmap_core::encoding::EncodingError;
use thiserror::Error;

/// Formats the script location suffix of an error message.
fn at(line: &Option<usize>) -> String {
    match line {
        Some(l) => format!(" (line {l})"),
        None => String::new(),
    }
}

/// Every way a compile can fail. All of them abort emission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("command outside of a segment{}", at(.line))]
    NoOpenSegment { line: Option<usize> },

    #[error("segment {segment}: more than {max} vertices{}", at(.line))]
    TooManyVertices { segment: usize, max: usize, line: Option<usize> },

    #[error("segment {segment}: move ({dx}, {dy}) leaves the coordinate range{}", at(.line))]
    CursorOverflow { segment: usize, dx: i32, dy: i32, line: Option<usize> },

    #[error("segment {segment}: only {count} vertices after closing{}", at(.line))]
    TooFewVertices { segment: usize, count: usize, line: Option<usize> },

    #[error("segment {segment}: edge {edge} has zero length{}", at(.line))]
    DegenerateEdge { segment: usize, edge: usize, line: Option<usize> },

    #[error("segment {segment}: vertex {vertex} at local ({x}, {y}) outside 0..=15{}", at(.line))]
    CoordinateOutOfRange { segment: usize, vertex: usize, x: i32, y: i32, line: Option<usize> },

    #[error("segment {segment}: offset ({x}, {y}) outside 0..=255{}", at(.line))]
    OffsetOutOfRange { segment: usize, x: i32, y: i32, line: Option<usize> },

    #[error("segment {segment}: heights {floor}/{ceiling} outside 0..=255{}", at(.line))]
    HeightOutOfRange { segment: usize, floor: i32, ceiling: i32, line: Option<usize> },

    #[error("segment {segment}: edge {edge} is shared by {sharers} segment edges{}", at(.line))]
    DegenerateAdjacency { segment: usize, edge: usize, sharers: usize, line: Option<usize> },

    #[error("door {door}: segment {segment} edge {edge} is a wall, not a portal{}", at(.line))]
    DoorOnWall { door: usize, segment: usize, edge: usize, line: Option<usize> },

    #[error("door {door}: segment {neighbor} has {candidates} edges back to segment {segment}{}", at(.line))]
    AmbiguousDoorNeighbor { door: usize, segment: usize, neighbor: usize, candidates: usize, line: Option<usize> },

    #[error("door {door}: segment {segment} edge {edge} already carries door {other}{}", at(.line))]
    DoorConflict { door: usize, other: usize, segment: usize, edge: usize, line: Option<usize> },

    #[error("door {door}: no more than {max} doors allowed{}", at(.line))]
    TooManyDoors { door: usize, max: usize, line: Option<usize> },

    #[error("segment {segment} edge {edge}: normal ({a}, {b}) needs palette entry beyond {capacity}{}", at(.line))]
    PaletteOverflow { segment: usize, edge: usize, a: u8, b: u8, capacity: usize, line: Option<usize> },

    #[error("segment {segment} edge {edge}: portal target {target} exceeds far limit {max}{}", at(.line))]
    PortalEncodingOverflow { segment: usize, edge: usize, target: usize, max: usize, line: Option<usize> },

    #[error("segment {segment}: {source}")]
    Encoding { segment: usize, source: EncodingError },

    #[error("{pool} pool offset {offset} does not fit 16 bits")]
    PoolOverflow { pool: &'static str, offset: usize },

    #[error("level has no segments")]
    EmptyLevel,
}
