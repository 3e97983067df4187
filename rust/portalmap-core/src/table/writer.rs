use std::{fs::File, io::Write, path::Path};

use tracing::debug;

use super::manifest::{Manifest, TableCounts};
use super::HASH_LEN;
use crate::models::SegmentRecord;

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("length mismatch: {0}")]
    LengthMismatch(&'static str),
    #[error("section too large: {0}")]
    TooLarge(&'static str),
}

/// Borrowed view of everything that goes into a table image.
#[derive(Debug, Clone, Copy)]
pub struct TableSections<'a> {
    pub palette: &'a [u8],
    pub vertices: &'a [u8],
    pub normals: &'a [u8],
    pub portals: &'a [u8],
    pub doors: &'a [u8],
    pub segments: &'a [SegmentRecord],
    pub door_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteResult {
    pub manifest: Manifest,
    pub hash: [u8; HASH_LEN],
}

fn len_u32(len: usize, what: &'static str) -> Result<u32, WriterError> {
    u32::try_from(len).map_err(|_| WriterError::TooLarge(what))
}

/// Serialize sections into `[header][data][hash32]`.
pub fn encode_table(sections: &TableSections<'_>) -> Result<(Vec<u8>, WriteResult), WriterError> {
    if sections.palette.len() % 2 != 0 {
        return Err(WriterError::LengthMismatch("palette entries are byte pairs"));
    }
    let counts = TableCounts {
        segments: len_u32(sections.segments.len(), "segments")?,
        palette_entries: len_u32(sections.palette.len() / 2, "palette")?,
        vertex_bytes: len_u32(sections.vertices.len(), "vertices")?,
        normal_bytes: len_u32(sections.normals.len(), "normals")?,
        portal_bytes: len_u32(sections.portals.len(), "portals")?,
        door_bytes: len_u32(sections.doors.len(), "doors")?,
        doors: len_u32(sections.door_count, "door count")?,
    };
    let manifest = Manifest::for_counts(counts);

    let data_end = manifest.data_end() as usize;
    let mut buf = vec![0u8; data_end];
    manifest.write(&mut buf[..Manifest::SIZE]);

    let mut put = |off: u64, bytes: &[u8]| {
        let off = off as usize;
        buf[off..off + bytes.len()].copy_from_slice(bytes);
    };
    put(manifest.off_palette, sections.palette);
    put(manifest.off_vertices, sections.vertices);
    put(manifest.off_normals, sections.normals);
    put(manifest.off_portals, sections.portals);
    put(manifest.off_doors, sections.doors);

    let seg0 = manifest.off_segments as usize;
    for (i, rec) in sections.segments.iter().enumerate() {
        let at = seg0 + i * SegmentRecord::SIZE;
        rec.write_le(&mut buf[at..at + SegmentRecord::SIZE]);
    }

    let hash = blake3::hash(&buf);
    let hash_bytes: [u8; HASH_LEN] = *hash.as_bytes();
    buf.extend_from_slice(&hash_bytes);
    Ok((buf, WriteResult { manifest, hash: hash_bytes }))
}

pub fn write_table(path: impl AsRef<Path>, sections: &TableSections<'_>) -> Result<WriteResult, WriterError> {
    let (bytes, res) = encode_table(sections)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(&bytes)?;
    file.flush()?;
    debug!(path = ?path.as_ref(), bytes = bytes.len(), "wrote table image");
    Ok(res)
}
