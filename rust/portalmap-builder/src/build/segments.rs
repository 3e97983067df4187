use std::collections::BTreeMap;

use portalmap_core::models::{Point, MAX_DOORS, MAX_VERTICES};
use tracing::debug;

use super::error::CompileError;
use super::options::CompileOptions;
use super::script::{Command, ScriptLine};

/// How the polygon loop was closed by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Closure {
    /// Not normalized yet.
    #[default]
    Open,
    /// The author did not return to the anchor; the closing edge is implied.
    Auto,
    /// The author returned to the anchor; the duplicate vertex was dropped.
    Explicit,
}

/// One convex room. Vertices are absolute while authoring and local
/// (relative to `offset`) once normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub vertices: Vec<Point>,
    pub offset: Point,
    pub floor_height: i32,
    pub ceiling_height: i32,
    /// edge index -> neighbor segment index
    pub portals: BTreeMap<usize, usize>,
    /// edge index -> door id
    pub doors: BTreeMap<usize, usize>,
    /// palette index per edge; `None` where the coverage skips the edge
    pub wall_normals: Vec<Option<u8>>,
    pub closure: Closure,
    pub line: Option<usize>,
}

impl Segment {
    fn new(anchor: Point, floor_height: i32, ceiling_height: i32, line: Option<usize>) -> Self {
        Segment {
            vertices: vec![anchor],
            offset: Point::default(),
            floor_height,
            ceiling_height,
            portals: BTreeMap::new(),
            doors: BTreeMap::new(),
            wall_normals: Vec::new(),
            closure: Closure::Open,
            line,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    /// Endpoints of edge `i` in local coordinates.
    pub fn edge(&self, i: usize) -> (Point, Point) {
        let n = self.vertices.len();
        (self.vertices[i], self.vertices[(i + 1) % n])
    }

    /// Endpoints of edge `i` in absolute coordinates.
    pub fn absolute_edge(&self, i: usize) -> (Point, Point) {
        let (a, b) = self.edge(i);
        (a + self.offset, b + self.offset)
    }

    pub fn absolute_vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.vertices.iter().map(move |&v| v + self.offset)
    }
}

/// A moving wall. Authored on one side, mirrored to the neighbor later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Door {
    pub id: usize,
    pub segment: usize,
    pub edge: usize,
    pub line: Option<usize>,
}

/// Segments and doors in authoring order; indices are stable identities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    pub segments: Vec<Segment>,
    pub doors: Vec<Door>,
}

/// Turtle-style polygon builder fed by authoring commands.
pub struct LevelBuilder {
    level: Level,
    cursor: Point,
    floor_height: i32,
    ceiling_height: i32,
}

impl LevelBuilder {
    pub fn new(opts: &CompileOptions) -> Self {
        Self {
            level: Level::default(),
            cursor: Point::default(),
            floor_height: opts.default_floor_height,
            ceiling_height: opts.default_ceiling_height,
        }
    }

    /// Open a new segment anchored at an absolute point; returns its index.
    pub fn segment(&mut self, x: i32, y: i32, line: Option<usize>) -> usize {
        let anchor = Point::new(x, y);
        self.cursor = anchor;
        self.level
            .segments
            .push(Segment::new(anchor, self.floor_height, self.ceiling_height, line));
        self.level.segments.len() - 1
    }

    fn current(&mut self, line: Option<usize>) -> Result<(usize, &mut Segment), CompileError> {
        let idx = self.level.segments.len().checked_sub(1).ok_or(CompileError::NoOpenSegment { line })?;
        Ok((idx, &mut self.level.segments[idx]))
    }

    fn push_vertex(&mut self, dx: i32, dy: i32, line: Option<usize>) -> Result<(), CompileError> {
        let cursor = self.cursor;
        let (idx, seg) = self.current(line)?;
        let next = cursor.checked_add(Point::new(dx, dy)).ok_or(CompileError::CursorOverflow {
            segment: idx,
            dx,
            dy,
            line: line.or(seg.line),
        })?;
        let n = seg.vertices.len();
        // one extra point is tolerated when it returns to the anchor
        let closing = n == MAX_VERTICES && next == seg.vertices[0];
        if n >= MAX_VERTICES && !closing {
            return Err(CompileError::TooManyVertices { segment: idx, max: MAX_VERTICES, line: line.or(seg.line) });
        }
        seg.vertices.push(next);
        self.cursor = next;
        Ok(())
    }

    pub fn move_by(&mut self, dx: i32, dy: i32, line: Option<usize>) -> Result<(), CompileError> {
        self.push_vertex(dx, dy, line)
    }

    /// Like `move_by`, and marks the edge ending at the new vertex as a door.
    pub fn door(&mut self, dx: i32, dy: i32, line: Option<usize>) -> Result<usize, CompileError> {
        let id = self.level.doors.len();
        if id >= MAX_DOORS {
            return Err(CompileError::TooManyDoors { door: id, max: MAX_DOORS, line });
        }
        let (segment, seg) = self.current(line)?;
        let edge = seg.vertices.len() - 1;
        self.push_vertex(dx, dy, line)?;
        self.level.segments[segment].doors.insert(edge, id);
        self.level.doors.push(Door { id, segment, edge, line });
        debug!(door = id, segment, edge, "registered door");
        Ok(id)
    }

    pub fn heights(&mut self, floor: i32, ceiling: i32, line: Option<usize>) -> Result<(), CompileError> {
        let (_, seg) = self.current(line)?;
        seg.floor_height = floor;
        seg.ceiling_height = ceiling;
        Ok(())
    }

    pub fn apply(&mut self, cmd: &ScriptLine) -> Result<(), CompileError> {
        let line = cmd.line;
        match cmd.command {
            Command::Segment { x, y } => {
                self.segment(x, y, line);
            }
            Command::Move { dx, dy } => self.move_by(dx, dy, line)?,
            Command::Door { dx, dy } => {
                self.door(dx, dy, line)?;
            }
            Command::Heights { floor, ceiling } => self.heights(floor, ceiling, line)?,
        }
        Ok(())
    }

    pub fn finish(self) -> Result<Level, CompileError> {
        if self.level.segments.is_empty() {
            return Err(CompileError::EmptyLevel);
        }
        Ok(self.level)
    }
}

/// Run every command through a fresh builder.
pub fn build_level(script: &[ScriptLine], opts: &CompileOptions) -> Result<Level, CompileError> {
    let mut builder = LevelBuilder::new(opts);
    for cmd in script {
        builder.apply(cmd)?;
    }
    builder.finish()
}
