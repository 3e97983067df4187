use std::{fs::File, ops::Deref, path::Path};

use memmap2::Mmap;

use super::manifest::{Manifest, ManifestError, TableCounts};
use super::HASH_LEN;
use crate::encoding::{self, DecodedPortal, EncodingError};
use crate::models::SegmentRecord;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("table hash mismatch")]
    HashMismatch,
    #[error("segment {segment}: {source}")]
    Decode { segment: usize, source: EncodingError },
    #[error("segment {segment}: {pool} slice out of bounds")]
    SliceOutOfBounds { segment: usize, pool: &'static str },
}

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mapped(m) => m,
            Backing::Owned(v) => v,
        }
    }
}

/// Read-only view of a compiled table image.
pub struct LevelTable {
    bytes: Backing,
    manifest: Manifest,
}

impl LevelTable {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let file = File::open(path)?;
        // Safety: the image is treated as read-only and fully validated below.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::validate(Backing::Mapped(mmap))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TableError> {
        Self::validate(Backing::Owned(bytes))
    }

    fn validate(bytes: Backing) -> Result<Self, TableError> {
        if bytes.len() < Manifest::SIZE + HASH_LEN {
            return Err(ManifestError::HeaderTooSmall.into());
        }
        let manifest = Manifest::parse(&bytes[..Manifest::SIZE])?;
        let data_len = bytes.len() - HASH_LEN;
        manifest.validate_layout(data_len)?;
        let (data, tail) = bytes.split_at(data_len);
        if blake3::hash(data).as_bytes() != tail {
            return Err(TableError::HashMismatch);
        }
        Ok(LevelTable { bytes, manifest })
    }

    pub fn manifest(&self) -> &Manifest { &self.manifest }
    pub fn counts(&self) -> TableCounts { self.manifest.counts }
    pub fn segment_count(&self) -> usize { self.manifest.counts.segments as usize }
    pub fn door_count(&self) -> usize { self.manifest.counts.doors as usize }

    fn section(&self, off: u64, len: u32) -> &[u8] {
        let start = off as usize;
        &self.bytes[start..start + len as usize]
    }

    pub fn palette(&self) -> &[u8] {
        self.section(self.manifest.off_palette, self.manifest.counts.palette_entries * 2)
    }
    pub fn vertex_pool(&self) -> &[u8] {
        self.section(self.manifest.off_vertices, self.manifest.counts.vertex_bytes)
    }
    pub fn normal_pool(&self) -> &[u8] {
        self.section(self.manifest.off_normals, self.manifest.counts.normal_bytes)
    }
    pub fn portal_pool(&self) -> &[u8] {
        self.section(self.manifest.off_portals, self.manifest.counts.portal_bytes)
    }
    pub fn door_pool(&self) -> &[u8] {
        self.section(self.manifest.off_doors, self.manifest.counts.door_bytes)
    }

    pub fn record(&self, idx: usize) -> Option<SegmentRecord> {
        if idx >= self.segment_count() { return None; }
        let at = self.manifest.off_segments as usize + idx * SegmentRecord::SIZE;
        Some(SegmentRecord::read_le(&self.bytes[at..at + SegmentRecord::SIZE]))
    }

    pub fn records(&self) -> impl Iterator<Item = SegmentRecord> + '_ {
        (0..self.segment_count()).filter_map(move |i| self.record(i))
    }

    fn slice<'a>(
        pool: &'a [u8],
        start: u16,
        len: usize,
        segment: usize,
        name: &'static str,
    ) -> Result<&'a [u8], TableError> {
        let start = start as usize;
        pool.get(start..start + len)
            .ok_or(TableError::SliceOutOfBounds { segment, pool: name })
    }

    /// Local vertices of segment `idx` as (x, y) in 0..=15.
    pub fn segment_vertices(&self, idx: usize, rec: &SegmentRecord) -> Result<Vec<(u8, u8)>, TableError> {
        let bytes = Self::slice(self.vertex_pool(), rec.vertex_start, rec.vertex_count as usize, idx, "vertex")?;
        Ok(bytes.iter().map(|&b| encoding::decode_vertex(b)).collect())
    }

    /// Palette index per edge.
    pub fn segment_normals(&self, idx: usize, rec: &SegmentRecord) -> Result<Vec<u8>, TableError> {
        let n = rec.vertex_count as usize;
        let bytes = Self::slice(self.normal_pool(), rec.normal_start, encoding::nibble_len(n), idx, "normal")?;
        Ok(encoding::unpack_nibbles(bytes, n))
    }

    pub fn segment_portals(&self, idx: usize, rec: &SegmentRecord) -> Result<Vec<DecodedPortal>, TableError> {
        let pool = self.portal_pool();
        let start = rec.portal_start as usize;
        let tail = pool.get(start..).ok_or(TableError::SliceOutOfBounds { segment: idx, pool: "portal" })?;
        let (entries, _) = encoding::decode_portals(idx, tail, rec.portal_count as usize)
            .map_err(|source| TableError::Decode { segment: idx, source })?;
        Ok(entries)
    }

    /// (edge, door id) pairs.
    pub fn segment_doors(&self, idx: usize, rec: &SegmentRecord) -> Result<Vec<(u8, u8)>, TableError> {
        if !rec.has_doors() {
            return Ok(Vec::new());
        }
        let bytes = Self::slice(self.door_pool(), rec.door_start, rec.door_count as usize, idx, "door")?;
        Ok(bytes.iter().map(|&b| encoding::decode_door(b)).collect())
    }
}
