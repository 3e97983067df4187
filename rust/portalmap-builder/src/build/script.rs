use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::CompileError;

/// One authoring command. Coordinates in `Segment` are absolute, all other
/// offsets are relative to the running cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Segment { x: i32, y: i32 },
    Move { dx: i32, dy: i32 },
    Door { dx: i32, dy: i32 },
    Heights { floor: i32, ceiling: i32 },
}

/// A command together with the script line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(flatten)]
    pub command: Command,
}

impl From<Command> for ScriptLine {
    fn from(command: Command) -> Self {
        ScriptLine { line: None, command }
    }
}

fn parse_pair(line: usize, keyword: &str, args: &[&str]) -> Result<(i32, i32), CompileError> {
    let bad = |message: String| CompileError::Script { line, message };
    if args.len() != 2 {
        return Err(bad(format!("`{keyword}` takes 2 arguments, got {}", args.len())));
    }
    let num = |s: &str| {
        s.trim_end_matches(',')
            .parse::<i32>()
            .map_err(|_| bad(format!("`{keyword}`: `{s}` is not an integer")))
    };
    Ok((num(args[0])?, num(args[1])?))
}

/// Parse the line-oriented level script.
///
/// ```text
/// # comment
/// segment 0 8
///   height 15 20
///   v 0 2
///   door -1 0
/// ```
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, CompileError> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let body = raw.split('#').next().unwrap_or("").trim();
        if body.is_empty() {
            continue;
        }
        let mut words = body.split_whitespace();
        let Some(keyword) = words.next() else { continue };
        let args: Vec<&str> = words.filter(|w| *w != ",").collect();
        let command = match keyword {
            "segment" => {
                let (x, y) = parse_pair(line, keyword, &args)?;
                Command::Segment { x, y }
            }
            "v" | "move" => {
                let (dx, dy) = parse_pair(line, keyword, &args)?;
                Command::Move { dx, dy }
            }
            "door" => {
                let (dx, dy) = parse_pair(line, keyword, &args)?;
                Command::Door { dx, dy }
            }
            "height" | "heights" => {
                let (floor, ceiling) = parse_pair(line, keyword, &args)?;
                Command::Heights { floor, ceiling }
            }
            other => {
                return Err(CompileError::Script { line, message: format!("unknown command `{other}`") });
            }
        };
        out.push(ScriptLine { line: Some(line), command });
    }
    Ok(out)
}

/// Load commands from a level script, or from a JSON command list when the
/// file has a `.json` extension.
pub fn load_script(path: &Path) -> Result<Vec<ScriptLine>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let is_json = path.extension().map_or(false, |e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let lines: Vec<ScriptLine> = serde_json::from_str(&text).with_context(|| format!("parsing {:?}", path))?;
        Ok(lines)
    } else {
        Ok(parse_script(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_lines() {
        let text = "# two rooms\nsegment 0 8\n  height 15, 20\n  v 0 2\n\n  door -1 0  # west door\nmove 1 1\n";
        let cmds = parse_script(text).unwrap();
        let got: Vec<(Option<usize>, Command)> = cmds.iter().map(|c| (c.line, c.command)).collect();
        assert_eq!(
            got,
            vec![
                (Some(2), Command::Segment { x: 0, y: 8 }),
                (Some(3), Command::Heights { floor: 15, ceiling: 20 }),
                (Some(4), Command::Move { dx: 0, dy: 2 }),
                (Some(6), Command::Door { dx: -1, dy: 0 }),
                (Some(7), Command::Move { dx: 1, dy: 1 }),
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_input() {
        let err = parse_script("segment 0 0\nv 1\n").unwrap_err();
        assert!(matches!(err, CompileError::Script { line: 2, .. }));
        let err = parse_script("segment 0 0\nv 1 x\n").unwrap_err();
        assert!(matches!(err, CompileError::Script { line: 2, .. }));
        let err = parse_script("\n\nwall 1 2\n").unwrap_err();
        assert_eq!(err.to_string(), "line 3: unknown command `wall`");
    }

    #[test]
    fn json_commands_deserialize() {
        let json = r#"[{"op":"segment","x":1,"y":7},{"op":"move","dx":1,"dy":0,"line":3}]"#;
        let cmds: Vec<ScriptLine> = serde_json::from_str(json).unwrap();
        assert_eq!(cmds[0], ScriptLine::from(Command::Segment { x: 1, y: 7 }));
        assert_eq!(cmds[1].line, Some(3));
        assert_eq!(cmds[1].command, Command::Move { dx: 1, dy: 0 });
    }
}
