use std::path::{Path, PathBuf};

/// Every input/output location a run touches. Defaults follow the editor
/// project layout and the extracted game source tree; the CLI can override
/// any of them individually.
#[derive(Clone, Debug)]
pub struct ProjectPaths {
    /// Editor map corpus (mutable JSON files).
    pub maps_dir: PathBuf,
    /// Extracted game source root; relative binary paths from the headers
    /// and layout registry resolve against this.
    pub source_root: PathBuf,
    /// Per-map ground truth (`<dir>/map.json`).
    pub source_maps_dir: PathBuf,
    /// Layout registry (`layouts.json`).
    pub layouts_path: PathBuf,
    /// Tileset declaration header (`.metatileAttributes` bindings).
    pub tileset_headers_path: PathBuf,
    /// Attribute INCBIN header (symbol -> binary path).
    pub metatiles_path: PathBuf,
    /// Behavior constants header (`MB_JUMP_*`).
    pub behaviors_path: PathBuf,
    /// Optional portal lock rules.
    pub locks_path: PathBuf,
}

impl ProjectPaths {
    pub fn from_roots(root: &Path, source_root: &Path) -> Self {
        Self {
            maps_dir: root.join("maps"),
            source_root: source_root.to_path_buf(),
            source_maps_dir: source_root.join("data/maps"),
            layouts_path: source_root.join("data/layouts/layouts.json"),
            tileset_headers_path: source_root.join("src/data/tilesets/headers.h"),
            metatiles_path: source_root.join("src/data/tilesets/metatiles.h"),
            behaviors_path: source_root.join("include/constants/metatile_behaviors.h"),
            locks_path: root.join("data/portal-locks.json"),
        }
    }
}
