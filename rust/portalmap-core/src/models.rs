use std::ops::{Add, Sub};

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

/// Maximum number of distinct vertices in one segment polygon.
pub const MAX_VERTICES: usize = 8;
/// Largest local coordinate; vertices pack into one byte, 4 bits per axis.
pub const LOCAL_COORD_MAX: i32 = 15;
/// Number of entries the runtime can address with a 4-bit normal reference.
pub const PALETTE_CAPACITY: usize = 16;
/// Door ids share a byte with the edge index and get the low nibble.
pub const MAX_DOORS: usize = 16;
/// `door_start` value of a segment without doors.
pub const DOOR_NONE: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn component_min(self, other: Point) -> Point {
        Point::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// `None` when either axis leaves the `i32` range.
    pub fn checked_add(self, other: Point) -> Option<Point> {
        Some(Point::new(self.x.checked_add(other.x)?, self.y.checked_add(other.y)?))
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Fixed-layout segment record as stored in the table image and emitted
/// into the `segments[]` array.
///
/// Layout (15 bytes): floor, ceiling, offset x, offset y, vertex count,
/// portal count, door count (one byte each), then the four pool start
/// offsets as little-endian u16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub floor_height: u8,
    pub ceiling_height: u8,
    pub offset_x: u8,
    pub offset_y: u8,
    pub vertex_count: u8,
    pub portal_count: u8,
    pub door_count: u8,
    pub vertex_start: u16,
    pub normal_start: u16,
    pub portal_start: u16,
    pub door_start: u16,
}

impl SegmentRecord {
    pub const SIZE: usize = 7 + 4 * 2;

    pub fn has_doors(&self) -> bool {
        self.door_count > 0 && self.door_start != DOOR_NONE
    }

    pub fn write_le(&self, out: &mut [u8]) {
        out[0] = self.floor_height;
        out[1] = self.ceiling_height;
        out[2] = self.offset_x;
        out[3] = self.offset_y;
        out[4] = self.vertex_count;
        out[5] = self.portal_count;
        out[6] = self.door_count;
        LittleEndian::write_u16(&mut out[7..9], self.vertex_start);
        LittleEndian::write_u16(&mut out[9..11], self.normal_start);
        LittleEndian::write_u16(&mut out[11..13], self.portal_start);
        LittleEndian::write_u16(&mut out[13..15], self.door_start);
    }

    pub fn read_le(buf: &[u8]) -> Self {
        Self {
            floor_height: buf[0],
            ceiling_height: buf[1],
            offset_x: buf[2],
            offset_y: buf[3],
            vertex_count: buf[4],
            portal_count: buf[5],
            door_count: buf[6],
            vertex_start: LittleEndian::read_u16(&buf[7..9]),
            normal_start: LittleEndian::read_u16(&buf[9..11]),
            portal_start: LittleEndian::read_u16(&buf[11..13]),
            door_start: LittleEndian::read_u16(&buf[13..15]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_arithmetic() {
        let a = Point::new(3, 7);
        let b = Point::new(1, 9);
        assert_eq!(a + b, Point::new(4, 16));
        assert_eq!(a - b, Point::new(2, -2));
        assert_eq!(a.component_min(b), Point::new(1, 7));
        assert_eq!(a.checked_add(b), Some(Point::new(4, 16)));
        assert_eq!(Point::new(i32::MAX, 0).checked_add(Point::new(1, 0)), None);
        assert_eq!(Point::new(0, i32::MIN).checked_add(Point::new(0, -1)), None);
    }

    #[test]
    fn record_layout_is_little_endian() {
        let rec = SegmentRecord {
            floor_height: 16,
            ceiling_height: 20,
            offset_x: 1,
            offset_y: 3,
            vertex_count: 4,
            portal_count: 1,
            door_count: 0,
            vertex_start: 0x0102,
            normal_start: 7,
            portal_start: 0,
            door_start: DOOR_NONE,
        };
        let mut buf = [0u8; SegmentRecord::SIZE];
        rec.write_le(&mut buf);
        assert_eq!(&buf[..7], &[16, 20, 1, 3, 4, 1, 0]);
        assert_eq!(&buf[7..9], &[0x02, 0x01]);
        assert_eq!(&buf[13..15], &[0xFF, 0xFF]);
        assert_eq!(SegmentRecord::read_le(&buf), rec);
        assert!(!rec.has_doors());
    }
}
