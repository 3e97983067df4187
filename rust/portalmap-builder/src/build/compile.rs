use tracing::{info, info_span};

use super::doors::propagate_doors;
use super::error::CompileError;
use super::normalize::normalize_level;
use super::normals::{quantize_wall_normals, NormalPalette};
use super::options::CompileOptions;
use super::pack::{pack_level, PackedLevel};
use super::portals::resolve_portals;
use super::script::ScriptLine;
use super::segments::{build_level, Level};
use super::view::{level_view, LevelView};

/// Output of one compile run. `level` is frozen once packing starts.
#[derive(Debug, Clone)]
pub struct CompiledLevel {
    pub level: Level,
    pub palette: NormalPalette,
    pub packed: PackedLevel,
}

impl CompiledLevel {
    pub fn view(&self) -> LevelView {
        level_view(&self.level, &self.palette)
    }
}

/// Run the whole pipeline: build, normalize, resolve portals, mirror doors,
/// quantize normals, pack. Any failure aborts without output.
pub fn compile(script: &[ScriptLine], opts: &CompileOptions) -> Result<CompiledLevel, CompileError> {
    let span = info_span!("compile", commands = script.len());
    let _enter = span.enter();

    let mut level = build_level(script, opts)?;
    info!(segments = level.segments.len(), doors = level.doors.len(), "built segments");

    normalize_level(&mut level)?;
    resolve_portals(&mut level)?;
    propagate_doors(&mut level)?;
    let palette = quantize_wall_normals(&mut level, opts.normal_coverage)?;

    let level = level;
    let packed = pack_level(&level, &palette)?;
    Ok(CompiledLevel { level, palette, packed })
}
