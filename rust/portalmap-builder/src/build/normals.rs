use portalmap_core::models::{Point, PALETTE_CAPACITY};
use serde::Serialize;
use tracing::info;

use super::error::CompileError;
use super::options::NormalCoverage;
use super::segments::Level;

/// Axis-sorted, length-normalized absolute normal scaled to 0..=255.
/// `a <= b` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NormalKey {
    pub a: u8,
    pub b: u8,
}

/// Quantize the normal of the edge `p0 -> p1`. The edge must have length.
pub fn quantize_normal(p0: Point, p1: Point) -> NormalKey {
    let dx = (p1.x - p0.x) as f64;
    let dy = (p1.y - p0.y) as f64;
    let len = dx.hypot(dy);
    // normal (dy, -dx); only magnitudes matter once sorted
    let (mut n0, mut n1) = (dy.abs(), dx.abs());
    if n0 > n1 {
        std::mem::swap(&mut n0, &mut n1);
    }
    let scale = |f: f64| (f / len * 255.0) as u8;
    NormalKey { a: scale(n0), b: scale(n1) }
}

/// Append-only palette of at most `PALETTE_CAPACITY` normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalPalette {
    entries: Vec<NormalKey>,
}

impl NormalPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `key`, appending it when new. `None` once the palette is full.
    pub fn intern(&mut self, key: NormalKey) -> Option<u8> {
        if let Some(i) = self.entries.iter().position(|e| *e == key) {
            return Some(i as u8);
        }
        if self.entries.len() >= PALETTE_CAPACITY {
            return None;
        }
        self.entries.push(key);
        Some((self.entries.len() - 1) as u8)
    }

    pub fn entries(&self) -> &[NormalKey] {
        &self.entries
    }

    pub fn get(&self, index: u8) -> Option<NormalKey> {
        self.entries.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Two bytes per entry, `a` then `b`.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|k| [k.a, k.b]).collect()
    }
}

/// Assign a palette index to each covered edge, in segment then edge order.
pub fn quantize_wall_normals(level: &mut Level, coverage: NormalCoverage) -> Result<NormalPalette, CompileError> {
    let mut palette = NormalPalette::new();
    for (segment, seg) in level.segments.iter_mut().enumerate() {
        let mut normals = Vec::with_capacity(seg.edge_count());
        for edge in 0..seg.edge_count() {
            if coverage == NormalCoverage::WallsOnly && seg.portals.contains_key(&edge) {
                normals.push(None);
                continue;
            }
            let (p0, p1) = seg.edge(edge);
            let key = quantize_normal(p0, p1);
            let index = palette.intern(key).ok_or(CompileError::PaletteOverflow {
                segment,
                edge,
                a: key.a,
                b: key.b,
                capacity: PALETTE_CAPACITY,
                line: seg.line,
            })?;
            normals.push(Some(index));
        }
        seg.wall_normals = normals;
    }
    info!(palette = palette.len(), ?coverage, "quantized wall normals");
    Ok(palette)
}
