//! Bit-level encodings shared by the compiler and any table consumer.
//!
//! Portal entry byte:
//! [7..5] edge index (the edge's starting vertex)
//! [4]    far flag
//! [3]    near: sign of the segment delta (1 = negative)
//! [2..0] near: |delta| - 1
//!
//! A far entry is followed by one byte with the absolute target index.

use crate::models::{LOCAL_COORD_MAX, MAX_DOORS, MAX_VERTICES};

pub const PORTAL_EDGE_SHIFT: u32 = 5;
pub const PORTAL_FAR_FLAG: u8 = 0x10;
pub const PORTAL_NEG_FLAG: u8 = 0x08;
pub const PORTAL_MAG_MASK: u8 = 0x07;
/// Largest |target - current| that still fits the one-byte form.
pub const NEAR_PORTAL_RANGE: i64 = 8;
/// Largest target index a far entry can carry.
pub const FAR_TARGET_MAX: usize = u8::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("edge index {0} does not fit the entry")]
    EdgeOutOfRange(usize),
    #[error("vertex ({0}, {1}) outside the local grid")]
    VertexOutOfRange(i32, i32),
    #[error("portal of segment {0} points to itself")]
    SelfPortal(usize),
    #[error("far portal target {target} exceeds {max}")]
    TargetOutOfRange { target: usize, max: usize },
    #[error("door id {0} does not fit a nibble")]
    DoorIdOutOfRange(usize),
    #[error("palette index {0} does not fit a nibble")]
    NibbleOutOfRange(u8),
    #[error("portal stream truncated after {0} entries")]
    Truncated(usize),
    #[error("near portal of segment {0} points below index 0")]
    TargetUnderflow(usize),
}

/// Pack a local vertex into `(x << 4) | y`.
pub fn encode_vertex(x: i32, y: i32) -> Result<u8, EncodingError> {
    if !(0..=LOCAL_COORD_MAX).contains(&x) || !(0..=LOCAL_COORD_MAX).contains(&y) {
        return Err(EncodingError::VertexOutOfRange(x, y));
    }
    Ok(((x as u8) << 4) | y as u8)
}

pub fn decode_vertex(b: u8) -> (u8, u8) {
    (b >> 4, b & 0x0F)
}

/// Width of a portal reference as chosen by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalForm {
    Near,
    Far,
}

/// Append the encoding of one portal entry to `out`.
pub fn encode_portal(
    out: &mut Vec<u8>,
    current: usize,
    edge: usize,
    target: usize,
) -> Result<PortalForm, EncodingError> {
    if edge >= MAX_VERTICES {
        return Err(EncodingError::EdgeOutOfRange(edge));
    }
    if target == current {
        return Err(EncodingError::SelfPortal(current));
    }
    let head = (edge as u8) << PORTAL_EDGE_SHIFT;
    let delta = target as i64 - current as i64;
    if delta.abs() <= NEAR_PORTAL_RANGE {
        let sign = if delta < 0 { PORTAL_NEG_FLAG } else { 0 };
        let mag = ((delta.abs() - 1) as u8) & PORTAL_MAG_MASK;
        out.push(head | sign | mag);
        Ok(PortalForm::Near)
    } else {
        if target > FAR_TARGET_MAX {
            return Err(EncodingError::TargetOutOfRange { target, max: FAR_TARGET_MAX });
        }
        out.push(head | PORTAL_FAR_FLAG);
        out.push(target as u8);
        Ok(PortalForm::Far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedPortal {
    pub edge: u8,
    pub target: usize,
    pub form: PortalForm,
}

/// Decode `count` portal entries of segment `current`.
/// Returns the entries and the number of bytes consumed.
pub fn decode_portals(
    current: usize,
    bytes: &[u8],
    count: usize,
) -> Result<(Vec<DecodedPortal>, usize), EncodingError> {
    let mut out = Vec::with_capacity(count);
    let mut pos = 0usize;
    while out.len() < count {
        let Some(&b) = bytes.get(pos) else { return Err(EncodingError::Truncated(out.len())); };
        pos += 1;
        let edge = b >> PORTAL_EDGE_SHIFT;
        if b & PORTAL_FAR_FLAG != 0 {
            let Some(&t) = bytes.get(pos) else { return Err(EncodingError::Truncated(out.len())); };
            pos += 1;
            out.push(DecodedPortal { edge, target: t as usize, form: PortalForm::Far });
        } else {
            let mag = (b & PORTAL_MAG_MASK) as i64 + 1;
            let delta = if b & PORTAL_NEG_FLAG != 0 { -mag } else { mag };
            let target = current as i64 + delta;
            if target < 0 {
                return Err(EncodingError::TargetUnderflow(current));
            }
            out.push(DecodedPortal { edge, target: target as usize, form: PortalForm::Near });
        }
    }
    Ok((out, pos))
}

/// Door entry: edge index in the high nibble, door id in the low nibble.
pub fn encode_door(edge: usize, door_id: usize) -> Result<u8, EncodingError> {
    if edge >= MAX_VERTICES {
        return Err(EncodingError::EdgeOutOfRange(edge));
    }
    if door_id >= MAX_DOORS {
        return Err(EncodingError::DoorIdOutOfRange(door_id));
    }
    Ok(((edge as u8) << 4) | door_id as u8)
}

pub fn decode_door(b: u8) -> (u8, u8) {
    (b >> 4, b & 0x0F)
}

/// Number of bytes holding `count` 4-bit indices.
pub fn nibble_len(count: usize) -> usize {
    (count + 1) / 2
}

/// Pack 4-bit indices two per byte, first index in the high nibble.
pub fn pack_nibbles(indices: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(nibble_len(indices.len()));
    for pair in indices.chunks(2) {
        let hi = pair[0];
        let lo = pair.get(1).copied().unwrap_or(0);
        for &n in [hi, lo].iter() {
            if n > 0x0F {
                return Err(EncodingError::NibbleOutOfRange(n));
            }
        }
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

pub fn unpack_nibbles(bytes: &[u8], count: usize) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|b| [b >> 4, b & 0x0F])
        .take(count)
        .collect()
}
