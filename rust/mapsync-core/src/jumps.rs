use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::config::ProjectPaths;
use crate::errors::SyncError;
use crate::models::{
    Jump, LayoutRegistry, BEHAVIOR_MASK, EMPTY_TILE, PRIMARY_METATILES, TILE_INDEX_MASK,
};
use crate::report::{JumpSummary, SkipReason};
use crate::source_index::SourceIndex;
use crate::store::{self, EditorMapFile};
use crate::symbols::{
    parse_attribute_bindings, parse_jump_behaviors, parse_tileset_bindings, JumpBehaviorTable,
};
use crate::tables::{load_blocks, AttributeCache, AttributeTable};

fn read_required(path: &Path) -> Result<String, SyncError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            SyncError::MissingInput(path.to_path_buf())
        } else {
            SyncError::Io(e)
        }
    })
}

/// Follow tileset symbol -> attribute symbol -> relative binary path, then
/// anchor at the source root. Any broken link means the table is
/// unresolvable for this layout.
fn resolve_attr_path(
    tileset: Option<&str>,
    tileset_attrs: &HashMap<String, String>,
    attr_paths: &HashMap<String, String>,
    source_root: &Path,
) -> Option<PathBuf> {
    let tileset = tileset.filter(|t| !t.is_empty())?;
    let symbol = tileset_attrs.get(tileset)?;
    let rel = attr_paths.get(symbol)?;
    Some(source_root.join(rel))
}

/// Decode every grid cell of a layout's block data into directional jumps,
/// in ascending cell-index order.
pub fn collect_jumps(
    blocks: &[u16],
    width: usize,
    primary: &[u32],
    secondary: &[u32],
    behaviors: &JumpBehaviorTable,
) -> Vec<Jump> {
    let mut jumps = Vec::new();
    for (idx, block) in blocks.iter().enumerate() {
        let tile = block & TILE_INDEX_MASK;
        if tile == EMPTY_TILE {
            continue;
        }
        let (table, attr_idx) = if tile >= PRIMARY_METATILES {
            (secondary, (tile - PRIMARY_METATILES) as usize)
        } else {
            (primary, tile as usize)
        };
        let Some(attr) = table.get(attr_idx) else {
            continue;
        };
        let behavior = (attr & BEHAVIOR_MASK) as u16;
        let Some(dir) = behaviors.direction_for(behavior) else {
            continue;
        };
        jumps.push(Jump {
            x: (idx % width) as i64,
            y: (idx / width) as i64,
            dir,
        });
    }
    jumps
}

struct JumpContext {
    behaviors: JumpBehaviorTable,
    attr_paths: HashMap<String, String>,
    tileset_attrs: HashMap<String, String>,
    layouts: LayoutRegistry,
    index: SourceIndex,
    cache: AttributeCache,
}

impl JumpContext {
    fn attribute_table(&mut self, tileset: Option<&str>, source_root: &Path) -> Option<AttributeTable> {
        let path = resolve_attr_path(tileset, &self.tileset_attrs, &self.attr_paths, source_root)?;
        self.cache.load(&path)
    }

    fn derive(&mut self, map: &EditorMapFile, source_root: &Path) -> Result<Vec<Jump>, SkipReason> {
        let (_, source) = self
            .index
            .resolve(&map.id, store::source_constant(&map.doc))
            .ok_or(SkipReason::NoSourceMap)?;

        let layout_id = source
            .layout
            .clone()
            .filter(|l| !l.is_empty())
            .or_else(|| editor_layout_id(&map.doc));
        let layout = layout_id
            .as_deref()
            .and_then(|id| self.layouts.get(id))
            .ok_or(SkipReason::NoLayout)?
            .clone();

        if layout.width <= 0 || layout.height <= 0 {
            return Err(SkipReason::BadDimensions);
        }
        let (width, height) = (layout.width as usize, layout.height as usize);

        let block_rel = layout
            .blockdata_filepath
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(SkipReason::NoBlockData)?;
        let blocks = load_blocks(&source_root.join(block_rel), width, height)
            .ok_or(SkipReason::NoBlockData)?;

        let primary = self
            .attribute_table(layout.primary_tileset.as_deref(), source_root)
            .ok_or(SkipReason::NoAttributes)?;
        let secondary = self
            .attribute_table(layout.secondary_tileset.as_deref(), source_root)
            .ok_or(SkipReason::NoAttributes)?;

        Ok(collect_jumps(&blocks, width, &primary, &secondary, &self.behaviors))
    }
}

// Editor-side layout override, used when a source record has no layout field.
fn editor_layout_id(doc: &Value) -> Option<String> {
    doc.get("meta")?
        .get("layoutId")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Jump synchronizer: rewrite every editor map's `jumps` field from layout
/// block data and tileset attribute tables. Per-map problems are counted
/// skips; missing inputs or an incomplete behavior table abort the run.
pub fn sync_jumps(paths: &ProjectPaths) -> Result<JumpSummary, SyncError> {
    let behaviors = parse_jump_behaviors(&read_required(&paths.behaviors_path)?)?;
    let attr_paths = parse_attribute_bindings(&read_required(&paths.metatiles_path)?);
    let tileset_attrs = parse_tileset_bindings(&read_required(&paths.tileset_headers_path)?);
    let layouts = LayoutRegistry::load(&paths.layouts_path)?;
    let index = SourceIndex::scan(&paths.source_maps_dir)?;
    let (maps, unparsed) = store::load_editor_maps(&paths.maps_dir)?;

    let mut ctx = JumpContext {
        behaviors,
        attr_paths,
        tileset_attrs,
        layouts,
        index,
        cache: AttributeCache::new(),
    };

    let mut summary = JumpSummary::default();
    summary.skipped.add(SkipReason::UnparsableJson, unparsed);

    for mut map in maps {
        match ctx.derive(&map, &paths.source_root) {
            Ok(jumps) => {
                let count = jumps.len() as u64;
                map.doc["jumps"] = serde_json::to_value(&jumps)?;
                store::save_editor_map(&map)?;
                summary.updated += 1;
                summary.jumps += count;
                info!(map = %map.id, jumps = count, "updated");
            }
            Err(reason) => {
                summary.skipped.record(reason);
                warn!(map = %map.id, reason = %reason, "skipped");
            }
        }
    }

    info!(%summary, "jump sync finished");
    Ok(summary)
}
