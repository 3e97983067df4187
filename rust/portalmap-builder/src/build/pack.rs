use portalmap_core::encoding::{self, EncodingError, PortalForm};
use portalmap_core::models::{SegmentRecord, DOOR_NONE};
use portalmap_core::table::TableSections;
use tracing::{debug, info};

use super::error::CompileError;
use super::normals::NormalPalette;
use super::pool::BytePool;
use super::segments::{Level, Segment};

/// Per-segment byte streams before pooling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedSegment {
    pub vertices: Vec<u8>,
    pub normals: Vec<u8>,
    pub portals: Vec<u8>,
    pub doors: Vec<u8>,
    pub far_portals: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub bytes: usize,
    pub saved: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    pub total_vertices: usize,
    pub total_portals: usize,
    pub far_portals: usize,
    pub vertices: PoolStats,
    pub normals: PoolStats,
    pub portals: PoolStats,
    pub doors: PoolStats,
}

/// The final table contents, ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedLevel {
    pub palette: Vec<u8>,
    pub vertex_pool: Vec<u8>,
    pub normal_pool: Vec<u8>,
    pub portal_pool: Vec<u8>,
    pub door_pool: Vec<u8>,
    pub records: Vec<SegmentRecord>,
    pub door_count: usize,
    pub stats: PackStats,
}

impl PackedLevel {
    pub fn segment_count(&self) -> usize {
        self.records.len()
    }

    /// `ceil(segment_count / 8)` bytes of visited flags.
    pub fn touched_bitmap_len(&self) -> usize {
        (self.records.len() + 7) / 8
    }

    pub fn sections(&self) -> TableSections<'_> {
        TableSections {
            palette: &self.palette,
            vertices: &self.vertex_pool,
            normals: &self.normal_pool,
            portals: &self.portal_pool,
            doors: &self.door_pool,
            segments: &self.records,
            door_count: self.door_count,
        }
    }
}

fn encoding_error(index: usize, seg: &Segment, edge: usize, source: EncodingError) -> CompileError {
    match source {
        EncodingError::TargetOutOfRange { target, max } => CompileError::PortalEncodingOverflow {
            segment: index,
            edge,
            target,
            max,
            line: seg.line,
        },
        source => CompileError::Encoding { segment: index, source },
    }
}

/// Encode the four byte streams of one normalized, resolved segment.
pub fn encode_segment(index: usize, seg: &Segment) -> Result<EncodedSegment, CompileError> {
    let mut out = EncodedSegment::default();

    for v in seg.vertices.iter() {
        let b = encoding::encode_vertex(v.x, v.y).map_err(|e| encoding_error(index, seg, 0, e))?;
        out.vertices.push(b);
    }

    let nibbles: Vec<u8> = (0..seg.edge_count())
        .map(|edge| seg.wall_normals.get(edge).copied().flatten().unwrap_or(0))
        .collect();
    out.normals = encoding::pack_nibbles(&nibbles).map_err(|e| encoding_error(index, seg, 0, e))?;

    // BTreeMap iteration keeps entries sorted by edge index
    for (&edge, &target) in seg.portals.iter() {
        let form = encoding::encode_portal(&mut out.portals, index, edge, target)
            .map_err(|e| encoding_error(index, seg, edge, e))?;
        if form == PortalForm::Far {
            out.far_portals += 1;
        }
    }

    for (&edge, &door) in seg.doors.iter() {
        let b = encoding::encode_door(edge, door).map_err(|e| encoding_error(index, seg, edge, e))?;
        out.doors.push(b);
    }
    Ok(out)
}

fn offset_u16(pool: &BytePool, offset: usize, limit: u16) -> Result<u16, CompileError> {
    match u16::try_from(offset) {
        Ok(v) if v < limit => Ok(v),
        _ => Err(CompileError::PoolOverflow { pool: pool.name(), offset }),
    }
}

/// Place every segment's streams into the shared pools, in segment order,
/// and build the fixed records that point into them.
pub fn pack_level(level: &Level, palette: &NormalPalette) -> Result<PackedLevel, CompileError> {
    let mut vertices = BytePool::new("vertex");
    let mut normals = BytePool::new("normal");
    let mut portals = BytePool::new("portal");
    let mut doors = BytePool::new("door");
    let mut records = Vec::with_capacity(level.segments.len());
    let mut stats = PackStats::default();

    for (index, seg) in level.segments.iter().enumerate() {
        let enc = encode_segment(index, seg)?;
        debug!(
            segment = index,
            vertices = ?enc.vertices,
            normals = ?enc.normals,
            portals = ?enc.portals,
            doors = ?enc.doors,
            "encoded segment"
        );

        let v = vertices.place(&enc.vertices);
        let n = normals.place(&enc.normals);
        let p = portals.place(&enc.portals);
        let door_start = if enc.doors.is_empty() {
            DOOR_NONE
        } else {
            let d = doors.place(&enc.doors);
            offset_u16(&doors, d, DOOR_NONE)?
        };

        stats.total_vertices += seg.vertices.len();
        stats.total_portals += seg.portals.len();
        stats.far_portals += enc.far_portals;

        // heights and offset were range-checked by the normalizer
        records.push(SegmentRecord {
            floor_height: seg.floor_height as u8,
            ceiling_height: seg.ceiling_height as u8,
            offset_x: seg.offset.x as u8,
            offset_y: seg.offset.y as u8,
            vertex_count: seg.vertices.len() as u8,
            portal_count: seg.portals.len() as u8,
            door_count: seg.doors.len() as u8,
            vertex_start: offset_u16(&vertices, v, u16::MAX)?,
            normal_start: offset_u16(&normals, n, u16::MAX)?,
            portal_start: offset_u16(&portals, p, u16::MAX)?,
            door_start,
        });
    }

    let pool_stats = |p: &BytePool| PoolStats { bytes: p.len(), saved: p.saved() };
    stats.vertices = pool_stats(&vertices);
    stats.normals = pool_stats(&normals);
    stats.portals = pool_stats(&portals);
    stats.doors = pool_stats(&doors);

    info!(
        segments = records.len(),
        total_vertices = stats.total_vertices,
        total_portals = stats.total_portals,
        far_portals = stats.far_portals,
        vertex_bytes = stats.vertices.bytes,
        vertex_saved = stats.vertices.saved,
        normal_bytes = stats.normals.bytes,
        normal_saved = stats.normals.saved,
        portal_bytes = stats.portals.bytes,
        portal_saved = stats.portals.saved,
        door_bytes = stats.doors.bytes,
        door_saved = stats.doors.saved,
        "packed level"
    );

    Ok(PackedLevel {
        palette: palette.to_bytes(),
        vertex_pool: vertices.into_bytes(),
        normal_pool: normals.into_bytes(),
        portal_pool: portals.into_bytes(),
        door_pool: doors.into_bytes(),
        records,
        door_count: level.doors.len(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::compile::compile;
    use crate::build::options::CompileOptions;
    use crate::build::script::parse_script;

    const TWO_ROOMS: &str = "
segment 0 8
  v 0 2
  v 4 0
  v 0 -1
  v 0 -1
  v -1 -1
  v -1 0
  door -1 0
segment 1 7
  height 12 20
  v 1 0
  v 0 -4
  v -1 0
  v 0 4
";

    #[test]
    fn two_rooms_pack_bit_exact() {
        let script = parse_script(TWO_ROOMS).unwrap();
        let compiled = compile(&script, &CompileOptions::default()).unwrap();
        let packed = &compiled.packed;

        assert_eq!(packed.palette, vec![0x00, 0xFF, 0xB4, 0xB4]);
        assert_eq!(
            packed.vertex_pool,
            vec![0x01, 0x03, 0x43, 0x42, 0x41, 0x30, 0x20, 0x10, 0x04, 0x14, 0x10, 0x00]
        );
        // the second room's all-axis normals are found inside the first room's
        assert_eq!(packed.normal_pool, vec![0x00, 0x00, 0x10, 0x01]);
        assert_eq!(packed.portal_pool, vec![0xC0, 0x08]);
        assert_eq!(packed.door_pool, vec![0x60, 0x00]);

        let r0 = packed.records[0];
        assert_eq!((r0.offset_x, r0.offset_y), (0, 7));
        assert_eq!((r0.vertex_count, r0.portal_count, r0.door_count), (8, 1, 1));
        assert_eq!((r0.vertex_start, r0.normal_start, r0.portal_start, r0.door_start), (0, 0, 0, 0));

        let r1 = packed.records[1];
        assert_eq!((r1.floor_height, r1.ceiling_height), (12, 20));
        assert_eq!((r1.offset_x, r1.offset_y), (1, 3));
        assert_eq!((r1.vertex_count, r1.portal_count, r1.door_count), (4, 1, 1));
        assert_eq!((r1.vertex_start, r1.normal_start, r1.portal_start, r1.door_start), (8, 0, 1, 1));

        assert_eq!(packed.stats.normals.saved, 2);
        assert_eq!(packed.touched_bitmap_len(), 1);
        assert_eq!(packed.door_count, 1);
    }

    #[test]
    fn segment_without_doors_gets_sentinel() {
        let script = parse_script("segment 0 0\nv 1 0\nv 0 1\n").unwrap();
        let compiled = compile(&script, &CompileOptions::default()).unwrap();
        assert_eq!(compiled.packed.records[0].door_start, DOOR_NONE);
        assert!(compiled.packed.door_pool.is_empty());
        assert_eq!(compiled.packed.records[0].portal_start, 0);
    }
}
