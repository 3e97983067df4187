use byteorder::{ByteOrder, LittleEndian};

use crate::models::SegmentRecord;

pub const TABLE_MAGIC: [u8; 4] = *b"PMTB"; // PortalMap TaBle
pub const TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub segments: u32,
    pub palette_entries: u32, // 2 bytes each
    pub vertex_bytes: u32,
    pub normal_bytes: u32,
    pub portal_bytes: u32,
    pub door_bytes: u32,
    pub doors: u32, // door ids, i.e. door_state length
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manifest {
    pub version: u32,
    pub counts: TableCounts,
    pub off_palette: u64,
    pub off_vertices: u64,
    pub off_normals: u64,
    pub off_portals: u64,
    pub off_doors: u64,
    pub off_segments: u64,
}

impl Manifest {
    pub const SIZE: usize = 4 /*magic*/ + 4 /*version*/ + 7*4 /*counts*/ + 6*8 /*offsets*/;

    /// Lay the sections out back to back right after the header.
    pub fn for_counts(counts: TableCounts) -> Self {
        let off_palette = Self::SIZE as u64;
        let off_vertices = off_palette + counts.palette_entries as u64 * 2;
        let off_normals = off_vertices + counts.vertex_bytes as u64;
        let off_portals = off_normals + counts.normal_bytes as u64;
        let off_doors = off_portals + counts.portal_bytes as u64;
        let off_segments = off_doors + counts.door_bytes as u64;
        Manifest {
            version: TABLE_VERSION,
            counts,
            off_palette,
            off_vertices,
            off_normals,
            off_portals,
            off_doors,
            off_segments,
        }
    }

    /// End of the data region (start of the trailing hash).
    pub fn data_end(&self) -> u64 {
        self.off_segments + self.counts.segments as u64 * SegmentRecord::SIZE as u64
    }

    pub fn write(&self, header: &mut [u8]) {
        header[0..4].copy_from_slice(&TABLE_MAGIC);
        LittleEndian::write_u32(&mut header[4..8], self.version);
        let c = &self.counts;
        let c0 = 8;
        for (i, v) in [
            c.segments,
            c.palette_entries,
            c.vertex_bytes,
            c.normal_bytes,
            c.portal_bytes,
            c.door_bytes,
            c.doors,
        ]
        .into_iter()
        .enumerate()
        {
            LittleEndian::write_u32(&mut header[c0 + i * 4..c0 + i * 4 + 4], v);
        }
        let o0 = c0 + 7 * 4;
        for (i, v) in [
            self.off_palette,
            self.off_vertices,
            self.off_normals,
            self.off_portals,
            self.off_doors,
            self.off_segments,
        ]
        .into_iter()
        .enumerate()
        {
            LittleEndian::write_u64(&mut header[o0 + i * 8..o0 + i * 8 + 8], v);
        }
    }

    pub fn parse(header: &[u8]) -> Result<Self, ManifestError> {
        if header.len() < Self::SIZE { return Err(ManifestError::HeaderTooSmall); }
        if header[0..4] != TABLE_MAGIC { return Err(ManifestError::BadMagic); }
        let version = LittleEndian::read_u32(&header[4..8]);
        if version != TABLE_VERSION { return Err(ManifestError::UnsupportedVersion(version)); }
        let c0 = 8;
        let count = |i: usize| LittleEndian::read_u32(&header[c0 + i * 4..c0 + i * 4 + 4]);
        let counts = TableCounts {
            segments: count(0),
            palette_entries: count(1),
            vertex_bytes: count(2),
            normal_bytes: count(3),
            portal_bytes: count(4),
            door_bytes: count(5),
            doors: count(6),
        };
        let o0 = c0 + 7 * 4;
        let off = |i: usize| LittleEndian::read_u64(&header[o0 + i * 8..o0 + i * 8 + 8]);
        Ok(Manifest {
            version,
            counts,
            off_palette: off(0),
            off_vertices: off(1),
            off_normals: off(2),
            off_portals: off(3),
            off_doors: off(4),
            off_segments: off(5),
        })
    }

    pub fn validate_layout(&self, data_len: usize) -> Result<(), ManifestError> {
        fn fits(off: u64, bytes: usize, len: usize) -> bool {
            let off = off as usize;
            off <= len && len - off >= bytes
        }
        let c = &self.counts;
        if !fits(self.off_palette, c.palette_entries as usize * 2, data_len) { return Err(ManifestError::OutOfBounds("palette")); }
        if !fits(self.off_vertices, c.vertex_bytes as usize, data_len) { return Err(ManifestError::OutOfBounds("vertices")); }
        if !fits(self.off_normals, c.normal_bytes as usize, data_len) { return Err(ManifestError::OutOfBounds("normals")); }
        if !fits(self.off_portals, c.portal_bytes as usize, data_len) { return Err(ManifestError::OutOfBounds("portals")); }
        if !fits(self.off_doors, c.door_bytes as usize, data_len) { return Err(ManifestError::OutOfBounds("doors")); }
        let seg_bytes = (c.segments as usize).saturating_mul(SegmentRecord::SIZE);
        if !fits(self.off_segments, seg_bytes, data_len) { return Err(ManifestError::OutOfBounds("segments")); }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("table header too small")]
    HeaderTooSmall,
    #[error("bad magic")]
    BadMagic,
    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),
    #[error("section out of bounds: {0}")]
    OutOfBounds(&'static str),
}
