use std::path::PathBuf;

use portalmap_builder::build::emit::render_header;
use portalmap_builder::build::script::{load_script, parse_script, Command, ScriptLine};
use portalmap_builder::build::verify::verify_table;
use portalmap_builder::build::{compile, CompileError, CompileOptions, CompiledLevel};
use portalmap_core::encoding::PortalForm;
use portalmap_core::models::{DOOR_NONE, LOCAL_COORD_MAX, PALETTE_CAPACITY};
use portalmap_core::table::{encode_table, write_table, LevelTable};

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("levels").join("demo.lvl")
}

fn compile_text(text: &str) -> Result<CompiledLevel, CompileError> {
    let script = parse_script(text).unwrap();
    compile(&script, &CompileOptions::default())
}

fn square(x: i32, y: i32) -> String {
    format!("segment {x} {y}\nv 1 0\nv 0 1\nv -1 0\n")
}

#[test]
fn demo_level_compiles() {
    let script = load_script(&demo_path()).unwrap();
    let compiled = compile(&script, &CompileOptions::default()).unwrap();
    let level = &compiled.level;

    assert_eq!(level.segments.len(), 25);
    assert_eq!(compiled.packed.door_count, 2);
    assert_eq!(compiled.packed.touched_bitmap_len(), 4);
    assert_eq!(compiled.palette.len(), 6);
    assert_eq!(compiled.packed.stats.far_portals, 4);
    assert_eq!(compiled.packed.stats.total_portals, 52);

    for (a, seg) in level.segments.iter().enumerate() {
        assert!(seg.vertices.len() >= 3 && seg.vertices.len() <= 8);
        for v in &seg.vertices {
            assert!(v.x >= 0 && v.x <= LOCAL_COORD_MAX && v.y >= 0 && v.y <= LOCAL_COORD_MAX);
        }
        for (&edge, &b) in &seg.portals {
            assert_ne!(a, b, "segment {a} portals to itself");
            let back: Vec<_> = level.segments[b].portals.iter().filter(|&(_, &t)| t == a).collect();
            assert_eq!(back.len(), 1, "segment {a} edge {edge} has no single mirror in {b}");
            let (p0, p1) = seg.absolute_edge(edge);
            let (q0, q1) = level.segments[b].absolute_edge(*back[0].0);
            assert!((p0, p1) == (q0, q1) || (p0, p1) == (q1, q0));
        }
    }

    // both sides of each door carry the same id
    assert_eq!(level.segments[0].doors.get(&6), Some(&0));
    assert_eq!(level.segments[1].doors.get(&0), Some(&0));
    assert_eq!(level.segments[18].doors.get(&5), Some(&1));
    assert_eq!(level.segments[23].doors.get(&3), Some(&1));

    let heights: Vec<_> = compiled.packed.records.iter().map(|r| (r.floor_height, r.ceiling_height)).collect();
    assert_eq!(heights[24], (8, 20));
    assert!(heights[..24].iter().all(|&h| h == (16, 20)));
}

#[test]
fn demo_table_round_trips_through_file() {
    let script = load_script(&demo_path()).unwrap();
    let compiled = compile(&script, &CompileOptions::default()).unwrap();

    let tmp = tempfile::NamedTempFile::new().unwrap();
    write_table(tmp.path(), &compiled.packed.sections()).unwrap();
    let table = LevelTable::open(tmp.path()).unwrap();
    verify_table(&compiled, &table).unwrap();

    let header = render_header(&compiled.packed);
    assert!(header.contains("#define SEGMENT_COUNT 25\n"));
    assert!(header.contains("#define DOOR_COUNT 2\n"));
}

#[test]
fn json_script_matches_text_script() {
    let text = parse_script(&std::fs::read_to_string(demo_path()).unwrap()).unwrap();
    let commands: Vec<ScriptLine> = text.iter().map(|l| ScriptLine::from(l.command)).collect();

    let mut tmp = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    serde_json::to_writer(tmp.as_file_mut(), &commands).unwrap();
    let from_json = load_script(tmp.path()).unwrap();
    assert_eq!(from_json.len(), text.len());
    assert_eq!(from_json[0].command, Command::Segment { x: 0, y: 8 });
    assert_eq!(from_json[0].line, None);

    let a = compile(&text, &CompileOptions::default()).unwrap();
    let b = compile(&from_json, &CompileOptions::default()).unwrap();
    assert_eq!(a.packed, b.packed);
}

fn boundary_level(fillers: usize) -> String {
    let mut text = square(0, 0);
    for k in 0..fillers {
        text.push_str(&square(20 + 2 * k as i32, 0));
    }
    text.push_str(&square(1, 0));
    text
}

#[test]
fn index_distance_eight_stays_near() {
    let compiled = compile_text(&boundary_level(7)).unwrap();
    let packed = &compiled.packed;
    assert_eq!(packed.portal_pool, vec![0x27, 0x6F]);
    assert_eq!(packed.stats.far_portals, 0);
    assert_eq!(packed.records[0].portal_start, 0);
    assert_eq!(packed.records[8].portal_start, 1);
}

#[test]
fn index_distance_nine_goes_far() {
    let compiled = compile_text(&boundary_level(8)).unwrap();
    let packed = &compiled.packed;
    assert_eq!(packed.portal_pool, vec![0x30, 0x09, 0x70, 0x00]);
    assert_eq!(packed.stats.far_portals, 2);

    let (bytes, _) = encode_table(&packed.sections()).unwrap();
    let table = LevelTable::from_bytes(bytes).unwrap();
    let rec = table.record(9).unwrap();
    let portals = table.segment_portals(9, &rec).unwrap();
    assert_eq!(portals.len(), 1);
    assert_eq!((portals[0].edge, portals[0].target, portals[0].form), (3, 0, PortalForm::Far));
}

#[test]
fn identical_rooms_share_pool_bytes() {
    let text = format!("{}{}", square(0, 0), square(40, 40));
    let compiled = compile_text(&text).unwrap();
    let packed = &compiled.packed;
    assert_eq!(packed.vertex_pool, vec![0x00, 0x10, 0x11, 0x01]);
    assert_eq!(packed.records[1].vertex_start, 0);
    assert_eq!(packed.records[1].normal_start, 0);
    assert_eq!(packed.stats.vertices.saved, 4);
    assert!(packed.portal_pool.is_empty());
    assert!(packed.records.iter().all(|r| r.door_start == DOOR_NONE));
}

#[test]
fn seventeenth_normal_overflows_palette() {
    let mut text = String::new();
    for i in 0..15 {
        text.push_str(&format!("segment {} 0\nv {} 0\nv 0 1\n", 16 * i, i + 1));
    }
    let fits = compile_text(&text).unwrap();
    assert_eq!(fits.palette.len(), PALETTE_CAPACITY);

    text.push_str("segment 0 16\nv 2 0\nv 0 3\n");
    let err = compile_text(&text).unwrap_err();
    assert_eq!(
        err,
        CompileError::PaletteOverflow { segment: 15, edge: 2, a: 141, b: 212, capacity: 16, line: Some(46) }
    );
}

#[test]
fn errors_carry_script_lines() {
    let err = compile_text("segment 0 0\nv 1 0\ndoor 0 1\nv -1 0\n").unwrap_err();
    assert_eq!(err, CompileError::DoorOnWall { door: 0, segment: 0, edge: 1, line: Some(3) });
    assert_eq!(err.to_string(), "door 0: segment 0 edge 1 is a wall, not a portal (line 3)");

    let err = compile_text("# big\nsegment 0 0\nv 20 0\nv 0 1\n").unwrap_err();
    assert_eq!(err, CompileError::CoordinateOutOfRange { segment: 0, vertex: 1, x: 20, y: 0, line: Some(2) });

    let err = parse_script("segment 0 0\nv 1\n").unwrap_err();
    assert!(matches!(err, CompileError::Script { line: 2, .. }));
}

#[test]
fn far_target_beyond_one_byte_overflows() {
    let mut text = square(0, 0);
    for k in 0..256 {
        text.push_str(&square(40 + 2 * (k % 16), 2 * (k / 16)));
    }
    text.push_str(&square(1, 0));
    let err = compile_text(&text).unwrap_err();
    assert_eq!(
        err,
        CompileError::PortalEncodingOverflow { segment: 0, edge: 1, target: 257, max: 255, line: Some(1) }
    );

    // two fillers fewer put the neighbor at the last reachable index
    let text = text.replacen(&square(40, 0), "", 1).replacen(&square(42, 0), "", 1);
    let compiled = compile_text(&text).unwrap();
    assert_eq!(compiled.packed.portal_pool[..2], [0x30, 0xFF]);
}

#[test]
fn seventeenth_door_is_rejected() {
    let mut text = String::new();
    for i in 0..17 {
        text.push_str(&format!("segment {} 0\ndoor 1 0\nv 0 1\n", 4 * i));
    }
    let err = compile_text(&text).unwrap_err();
    assert_eq!(err, CompileError::TooManyDoors { door: 16, max: 16, line: Some(50) });
}

#[test]
fn huge_coordinates_fail_with_line() {
    let err = compile_text("segment 2147483647 0\nv 1 0\nv 0 1\n").unwrap_err();
    assert_eq!(err, CompileError::CursorOverflow { segment: 0, dx: 1, dy: 0, line: Some(2) });
    assert!(err.to_string().ends_with("(line 2)"));
}
