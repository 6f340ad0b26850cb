use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::errors::SyncError;
use crate::json::{coerce_i64, truthy};

/// One mutable editor map document. The doc keeps its original key order
/// (serde_json `preserve_order`), so rewriting a file only changes the
/// fields a pass actually owns.
#[derive(Clone, Debug)]
pub struct EditorMapFile {
    pub path: PathBuf,
    pub id: String,
    pub doc: Value,
}

/// Load the editor map corpus: sorted `*.json` files, minus the corpus
/// index. Files that fail to parse (or are not objects) are returned as a
/// skip count for the caller's summary.
pub fn load_editor_maps(dir: &Path) -> Result<(Vec<EditorMapFile>, u64), SyncError> {
    if !dir.is_dir() {
        return Err(SyncError::MissingInput(dir.to_path_buf()));
    }

    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.ends_with(".json") && n != "index.json")
        .collect();
    names.sort();

    let mut maps = Vec::with_capacity(names.len());
    let mut unparsed = 0u64;
    for name in names {
        let path = dir.join(&name);
        let doc = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .filter(Value::is_object);
        let Some(doc) = doc else {
            debug!(file = %name, "unparsable editor map");
            unparsed += 1;
            continue;
        };
        let stem = name.trim_end_matches(".json").to_string();
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(stem);
        maps.push(EditorMapFile { path, id, doc });
    }
    Ok((maps, unparsed))
}

/// Deterministic serialization: preserved key order, 4-space indent,
/// trailing newline. Two runs over unchanged inputs produce byte-identical
/// files.
pub fn to_pretty_json(value: &Value) -> Result<Vec<u8>, SyncError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Whole-file rewrite; no partial writes.
pub fn save_editor_map(map: &EditorMapFile) -> Result<(), SyncError> {
    let bytes = to_pretty_json(&map.doc)?;
    fs::write(&map.path, bytes)?;
    Ok(())
}

/// Editor map dimensions, checked in the editor's own fields
/// (`width`/`tilesX`, then `meta`). Both must be positive.
pub fn map_size(doc: &Value) -> Option<(i64, i64)> {
    let meta = doc.get("meta").filter(|m| m.is_object());
    let width = size_field(&[
        doc.get("width"),
        doc.get("tilesX"),
        meta.and_then(|m| m.get("width")),
    ]);
    let height = size_field(&[
        doc.get("height"),
        doc.get("tilesY"),
        meta.and_then(|m| m.get("height")),
    ]);
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    }
}

fn size_field(candidates: &[Option<&Value>]) -> Option<i64> {
    candidates
        .iter()
        .flatten()
        .find(|v| truthy(v))
        .and_then(|v| coerce_i64(v))
}

/// The `meta.sourceMapId` identity bridge, when present.
pub fn source_constant(doc: &Value) -> Option<&str> {
    doc.get("meta")?.get("sourceMapId")?.as_str()
}
