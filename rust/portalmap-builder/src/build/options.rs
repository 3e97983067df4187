use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FLOOR_HEIGHT: i32 = 16;
pub const DEFAULT_CEILING_HEIGHT: i32 = 20;

/// Which edges receive a wall-normal palette entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalCoverage {
    /// Every edge, portals included; the runtime indexes normals by edge.
    #[default]
    AllEdges,
    /// Only edges without a portal; portal edges store index 0.
    WallsOnly,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub default_floor_height: i32,
    pub default_ceiling_height: i32,
    pub normal_coverage: NormalCoverage,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_floor_height: DEFAULT_FLOOR_HEIGHT,
            default_ceiling_height: DEFAULT_CEILING_HEIGHT,
            normal_coverage: NormalCoverage::AllEdges,
        }
    }
}

impl CompileOptions {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading options {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("parsing options {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let opts: CompileOptions = serde_json::from_str(r#"{"normal_coverage":"walls_only"}"#).unwrap();
        assert_eq!(opts.normal_coverage, NormalCoverage::WallsOnly);
        assert_eq!(opts.default_floor_height, 16);
        assert_eq!(opts.default_ceiling_height, 20);
        let empty: CompileOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, CompileOptions::default());
    }
}
