use std::collections::BTreeMap;

use portalmap_core::models::Point;
use serde::Serialize;

use super::normals::{NormalKey, NormalPalette};
use super::segments::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeNormal {
    pub index: u8,
    pub key: NormalKey,
}

/// What a diagram renderer needs about one segment, in absolute coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentView {
    pub index: usize,
    pub vertices: Vec<Point>,
    pub offset: Point,
    pub floor_height: i32,
    pub ceiling_height: i32,
    pub portals: BTreeMap<usize, usize>,
    pub doors: BTreeMap<usize, usize>,
    pub normals: Vec<Option<EdgeNormal>>,
    pub line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelView {
    pub segments: Vec<SegmentView>,
    pub palette: Vec<NormalKey>,
    pub door_count: usize,
}

pub fn level_view(level: &Level, palette: &NormalPalette) -> LevelView {
    let segments = level
        .segments
        .iter()
        .enumerate()
        .map(|(index, seg)| SegmentView {
            index,
            vertices: seg.absolute_vertices().collect(),
            offset: seg.offset,
            floor_height: seg.floor_height,
            ceiling_height: seg.ceiling_height,
            portals: seg.portals.clone(),
            doors: seg.doors.clone(),
            normals: seg
                .wall_normals
                .iter()
                .map(|n| n.and_then(|index| palette.get(index).map(|key| EdgeNormal { index, key })))
                .collect(),
            line: seg.line,
        })
        .collect();
    LevelView {
        segments,
        palette: palette.entries().to_vec(),
        door_count: level.doors.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::compile::compile;
    use crate::build::options::{CompileOptions, NormalCoverage};
    use crate::build::script::parse_script;

    #[test]
    fn view_carries_absolute_geometry() {
        let script = parse_script("segment 3 4\nv 2 0\nv 0 2\nsegment 5 4\nv 1 0\nv -1 2\n").unwrap();
        let opts = CompileOptions { normal_coverage: NormalCoverage::WallsOnly, ..CompileOptions::default() };
        let compiled = compile(&script, &opts).unwrap();
        let view = level_view(&compiled.level, &compiled.palette);

        let s0 = &view.segments[0];
        assert_eq!(s0.vertices, vec![Point::new(3, 4), Point::new(5, 4), Point::new(5, 6)]);
        assert_eq!(s0.offset, Point::new(3, 4));
        assert_eq!(s0.portals.get(&1), Some(&1));
        assert_eq!(s0.normals[1], None);
        assert_eq!(s0.normals[0].map(|n| n.key), Some(NormalKey { a: 0, b: 255 }));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["segments"][1]["vertices"][0], serde_json::json!({"x": 5, "y": 4}));
        assert_eq!(json["door_count"], 0);
    }
}
