use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::models::Direction;

/// Behavior constants that mark a directional ledge, and the movement
/// direction each one produces in the editor.
const JUMP_BEHAVIOR_NAMES: [(&str, Direction); 4] = [
    ("MB_JUMP_EAST", Direction::Right),
    ("MB_JUMP_WEST", Direction::Left),
    ("MB_JUMP_NORTH", Direction::Up),
    ("MB_JUMP_SOUTH", Direction::Down),
];

#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("incomplete jump behavior table, missing: {0}")]
    IncompleteJumpTable(String),
}

/// Behavior code -> ledge direction, extracted once per run from the
/// behavior constants header.
#[derive(Clone, Debug, Default)]
pub struct JumpBehaviorTable {
    by_code: HashMap<u16, Direction>,
}

impl JumpBehaviorTable {
    pub fn direction_for(&self, behavior: u16) -> Option<Direction> {
        self.by_code.get(&behavior).copied()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

fn parse_c_int(literal: &str) -> Option<u32> {
    let s = literal.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<u32>().ok()
    }
}

/// Extract the four jump-behavior codes from `#define MB_JUMP_* <value>`
/// lines. All four directions are required: a partial table would silently
/// drop ledges, so absence of any is fatal to the jump pass.
pub fn parse_jump_behaviors(text: &str) -> Result<JumpBehaviorTable, SymbolError> {
    let re = Regex::new(
        r"#define\s+(MB_JUMP_(?:EAST|WEST|NORTH|SOUTH))\s+(0[xX][0-9A-Fa-f]+|[0-9]+)",
    )
    .unwrap();

    let mut by_name: HashMap<String, u32> = HashMap::new();
    for line in text.lines() {
        if let Some(caps) = re.captures(line) {
            if let Some(value) = parse_c_int(&caps[2]) {
                by_name.insert(caps[1].to_string(), value);
            }
        }
    }

    let mut by_code = HashMap::new();
    let mut missing = Vec::new();
    for (name, dir) in JUMP_BEHAVIOR_NAMES {
        match by_name.get(name) {
            Some(&value) => {
                by_code.insert((value & 0xFFFF) as u16, dir);
            }
            None => missing.push(name),
        }
    }
    if !missing.is_empty() {
        return Err(SymbolError::IncompleteJumpTable(missing.join(", ")));
    }
    Ok(JumpBehaviorTable { by_code })
}

/// Extract attribute-array symbol -> binary file path bindings from
/// `const u32 gMetatileAttributes_X[] = INCBIN_U32("...");` lines.
pub fn parse_attribute_bindings(text: &str) -> HashMap<String, String> {
    let re = Regex::new(
        r#"const\s+u32\s+(gMetatileAttributes_[A-Za-z0-9_]+)\[\]\s*=\s*INCBIN_U32\("([^"]+)"\);"#,
    )
    .unwrap();

    let mut mapping = HashMap::new();
    for line in text.lines() {
        if let Some(caps) = re.captures(line) {
            mapping.insert(caps[1].to_string(), caps[2].to_string());
        }
    }
    mapping
}

/// Extract tileset symbol -> attribute-array symbol bindings from
/// `const struct Tileset gTileset_X = { ... };` declaration blocks.
/// A block is scanned until its `};` terminator; the first
/// `.metatileAttributes` reference inside it wins.
pub fn parse_tileset_bindings(text: &str) -> HashMap<String, String> {
    let tileset_re =
        Regex::new(r"^const\s+struct\s+Tileset\s+(gTileset_[A-Za-z0-9_]+)\s*=").unwrap();
    let attr_re =
        Regex::new(r"\.metatileAttributes\s*=\s*(gMetatileAttributes_[A-Za-z0-9_]+)").unwrap();

    let mut mapping = HashMap::new();
    let mut current: Option<(String, bool)> = None;
    for line in text.lines() {
        if let Some(caps) = tileset_re.captures(line) {
            current = Some((caps[1].to_string(), false));
            continue;
        }
        if let Some((name, found)) = current.as_mut() {
            if !*found {
                if let Some(caps) = attr_re.captures(line) {
                    mapping.insert(name.clone(), caps[1].to_string());
                    *found = true;
                }
            }
            if line.trim_start().starts_with("};") {
                current = None;
            }
        }
    }
    mapping
}
