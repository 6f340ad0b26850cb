use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::errors::SyncError;
use crate::models::{ConnectionRecord, WarpRecord};

/// Ground-truth record for one source map directory. Read-only; loaded
/// fresh each run.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SourceMap {
    /// The symbolic map constant (e.g. `MAP_PALLET_TOWN`).
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(
        default,
        rename = "warp_events",
        deserialize_with = "crate::json::null_default"
    )]
    pub warps: Vec<WarpRecord>,
    #[serde(default, deserialize_with = "crate::json::null_default")]
    pub connections: Vec<ConnectionRecord>,
}

/// One scan of the source map corpus: directory id -> record, plus the
/// map-constant alias table used for identity bridging and warp
/// destination resolution.
#[derive(Clone, Debug, Default)]
pub struct SourceIndex {
    const_to_id: HashMap<String, String>,
    by_id: HashMap<String, SourceMap>,
    pub unparsed: u64,
}

impl SourceIndex {
    pub fn scan(source_dir: &Path) -> Result<Self, SyncError> {
        if !source_dir.is_dir() {
            return Err(SyncError::MissingInput(source_dir.to_path_buf()));
        }

        let mut entries: Vec<String> = fs::read_dir(source_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        entries.sort();

        let mut index = Self::default();
        for entry in entries {
            let map_path = source_dir.join(&entry).join("map.json");
            if !map_path.is_file() {
                continue;
            }
            let parsed = fs::read_to_string(&map_path)
                .ok()
                .and_then(|text| serde_json::from_str::<SourceMap>(&text).ok());
            let Some(data) = parsed else {
                debug!(map = %entry, "excluding unparsable source map");
                index.unparsed += 1;
                continue;
            };
            if let Some(constant) = data.id.clone().filter(|c| !c.is_empty()) {
                if let Some(prev) = index.const_to_id.insert(constant.clone(), entry.clone()) {
                    debug!(constant = %constant, prev = %prev, now = %entry, "duplicate map constant");
                }
            }
            index.by_id.insert(entry, data);
        }
        Ok(index)
    }

    pub fn get(&self, id: &str) -> Option<&SourceMap> {
        self.by_id.get(id)
    }

    pub fn id_for_constant(&self, constant: &str) -> Option<&str> {
        self.const_to_id.get(constant).map(String::as_str)
    }

    /// Dual identity lookup: the editor map's own id first, then an explicit
    /// `meta.sourceMapId` constant resolved through the alias table.
    pub fn resolve<'a>(
        &'a self,
        editor_id: &str,
        source_constant: Option<&str>,
    ) -> Option<(&'a str, &'a SourceMap)> {
        if let Some((id, data)) = self.by_id.get_key_value(editor_id) {
            return Some((id.as_str(), data));
        }
        let id = self.id_for_constant(source_constant?)?;
        self.by_id.get(id).map(|data| (id, data))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_source_map(root: &Path, dir: &str, body: &str) {
        let map_dir = root.join(dir);
        fs::create_dir_all(&map_dir).unwrap();
        fs::write(map_dir.join("map.json"), body).unwrap();
    }

    #[test]
    fn scan_indexes_constants_and_raw_records() {
        let tmp = tempdir().unwrap();
        write_source_map(
            tmp.path(),
            "PalletTown",
            r#"{"id": "MAP_PALLET_TOWN", "layout": "L_PALLET",
                "warp_events": [{"x": 4, "y": 2, "dest_map": "MAP_ROUTE1", "dest_warp_id": 0}],
                "connections": null}"#,
        );
        write_source_map(tmp.path(), "Broken", "{not json");
        // directory without map.json is not corpus data
        fs::create_dir_all(tmp.path().join("Empty")).unwrap();

        let index = SourceIndex::scan(tmp.path()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.unparsed, 1);
        assert_eq!(index.id_for_constant("MAP_PALLET_TOWN"), Some("PalletTown"));

        let sm = index.get("PalletTown").unwrap();
        assert_eq!(sm.layout.as_deref(), Some("L_PALLET"));
        assert_eq!(sm.warps.len(), 1);
        assert!(sm.connections.is_empty());
    }

    #[test]
    fn resolve_prefers_direct_id_then_constant_alias() {
        let tmp = tempdir().unwrap();
        write_source_map(tmp.path(), "Route1", r#"{"id": "MAP_ROUTE1"}"#);

        let index = SourceIndex::scan(tmp.path()).unwrap();

        let (id, _) = index.resolve("Route1", None).unwrap();
        assert_eq!(id, "Route1");

        // renamed editor map bridges through its meta constant
        let (id, _) = index.resolve("route-one", Some("MAP_ROUTE1")).unwrap();
        assert_eq!(id, "Route1");

        assert!(index.resolve("route-one", None).is_none());
        assert!(index.resolve("route-one", Some("MAP_UNKNOWN")).is_none());
    }

    #[test]
    fn missing_source_dir_is_fatal() {
        let tmp = tempdir().unwrap();
        let err = SourceIndex::scan(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, SyncError::MissingInput(_)));
    }
}
