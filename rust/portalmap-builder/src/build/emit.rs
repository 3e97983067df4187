use std::fmt::Write as _;

use portalmap_core::models::{SegmentRecord, DOOR_NONE};

use super::pack::PackedLevel;

fn hex_list(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{:02x}", b))
        .collect::<Vec<_>>()
        .join(", ")
}

fn byte_array(out: &mut String, name: &str, bytes: &[u8]) {
    // zero-length arrays are not valid C; keep one padding byte
    let body = if bytes.is_empty() { "0x00".to_string() } else { hex_list(bytes) };
    let _ = writeln!(out, "const static uint8_t {name}[] PROGMEM = {{{body}}};");
    out.push('\n');
}

fn record_row(rec: &SegmentRecord) -> String {
    let door = if rec.door_start == DOOR_NONE {
        "DOOR_NONE".to_string()
    } else {
        rec.door_start.to_string()
    };
    format!(
        "{{{:2}, {:2}, {:3}, {:3}, {:2}, {}, {}, {:4}, {:4}, {:3}, {:>9}}}",
        rec.floor_height,
        rec.ceiling_height,
        rec.offset_x,
        rec.offset_y,
        rec.vertex_count,
        rec.portal_count,
        rec.door_count,
        rec.vertex_start,
        rec.normal_start,
        rec.portal_start,
        door,
    )
}

/// Render the packed level as a C header for the runtime.
pub fn render_header(packed: &PackedLevel) -> String {
    let mut out = String::new();
    out.push_str("// Generated by portalmap-builder. Do not edit.\n");
    out.push_str("#pragma once\n\n#include <stdint.h>\n\n");
    out.push_str("#ifndef PROGMEM\n#define PROGMEM\n#endif\n\n");
    let _ = writeln!(out, "#define DOOR_NONE 0x{:04x}\n", DOOR_NONE);

    out.push_str("typedef struct {\n");
    for field in ["floor_height", "ceiling_height", "x", "y", "vertex_count", "portal_count", "door_count"] {
        let _ = writeln!(out, "    uint8_t {field};");
    }
    for field in ["vertex_start", "normal_start", "portal_start", "door_start"] {
        let _ = writeln!(out, "    uint16_t {field};");
    }
    out.push_str("} segment;\n\n");

    byte_array(&mut out, "wall_normal_templates", &packed.palette);
    byte_array(&mut out, "vertices", &packed.vertex_pool);
    byte_array(&mut out, "wall_normals", &packed.normal_pool);
    byte_array(&mut out, "portals", &packed.portal_pool);
    byte_array(&mut out, "doors", &packed.door_pool);

    out.push_str("const static segment segments[] PROGMEM = {\n");
    out.push_str("//   FH  CH    X    Y  VC PC DC     V     N    P          D\n");
    let last = packed.records.len().saturating_sub(1);
    for (i, rec) in packed.records.iter().enumerate() {
        let sep = if i < last { "," } else { "" };
        let _ = writeln!(out, "    {}{}", record_row(rec), sep);
    }
    out.push_str("};\n\n");

    let _ = writeln!(out, "#define SEGMENT_COUNT {}", packed.segment_count());
    let _ = writeln!(out, "#define SEGMENTS_TOUCHED_SIZE {}", packed.touched_bitmap_len());
    out.push_str("uint8_t segments_touched[SEGMENTS_TOUCHED_SIZE];\n");
    out.push_str("#ifdef ENABLE_MAP\n    uint8_t segments_seen[SEGMENTS_TOUCHED_SIZE];\n#endif\n\n");

    let _ = writeln!(out, "#define DOOR_COUNT {}", packed.door_count);
    out.push_str("#if DOOR_COUNT > 0\nint32_t door_state[DOOR_COUNT];\n#endif\n");
    out
}
