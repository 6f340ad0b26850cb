use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SyncError;

/// Metatile count of a primary tileset; block tile indices at or above this
/// resolve through the secondary tileset, offset by it.
pub const PRIMARY_METATILES: u16 = 640;
/// Low bits of a 16-bit block record holding the metatile index.
pub const TILE_INDEX_MASK: u16 = 0x03FF;
/// A block whose tile index equals the mask is an empty/unset cell.
pub const EMPTY_TILE: u16 = TILE_INDEX_MASK;
/// Low bits of a 32-bit attribute record holding the behavior code.
pub const BEHAVIOR_MASK: u32 = 0x01FF;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// A directional ledge tile derived from block + attribute data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jump {
    pub x: i64,
    pub y: i64,
    pub dir: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

/// Shared grid geometry from the extracted layout registry.
#[derive(Clone, Debug, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "crate::json::lenient_i64")]
    pub width: i64,
    #[serde(default, deserialize_with = "crate::json::lenient_i64")]
    pub height: i64,
    #[serde(default)]
    pub primary_tileset: Option<String>,
    #[serde(default)]
    pub secondary_tileset: Option<String>,
    #[serde(default)]
    pub blockdata_filepath: Option<String>,
}

/// The `layouts.json` registry, indexed by layout id. Entries that are not
/// objects or lack an id are dropped, the file itself is required.
#[derive(Clone, Debug, Default)]
pub struct LayoutRegistry {
    by_id: HashMap<String, Layout>,
}

impl LayoutRegistry {
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        if !path.is_file() {
            return Err(SyncError::MissingInput(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let doc: Value = serde_json::from_str(&text).map_err(|source| SyncError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_value(&doc))
    }

    pub fn from_value(doc: &Value) -> Self {
        let mut by_id = HashMap::new();
        let entries = doc.get("layouts").and_then(Value::as_array);
        for entry in entries.into_iter().flatten() {
            let Ok(layout) = serde_json::from_value::<Layout>(entry.clone()) else {
                continue;
            };
            if let Some(id) = layout.id.clone().filter(|id| !id.is_empty()) {
                by_id.insert(id, layout);
            }
        }
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Layout> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// One `warp_events` record from a source map.json. Coordinates are coerced
/// leniently; dest_warp_id and elevation are carried through as raw JSON so
/// the emitted metadata mirrors the corpus exactly.
#[derive(Clone, Debug, Deserialize)]
pub struct WarpRecord {
    #[serde(default, deserialize_with = "crate::json::lenient_i64")]
    pub x: i64,
    #[serde(default, deserialize_with = "crate::json::lenient_i64")]
    pub y: i64,
    #[serde(default)]
    pub dest_map: Option<String>,
    #[serde(default)]
    pub dest_warp_id: Value,
    #[serde(default)]
    pub elevation: Value,
}

/// One `connections` record from a source map.json.
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default, deserialize_with = "crate::json::lenient_i64")]
    pub offset: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTarget {
    Warp {
        #[serde(rename = "mapId")]
        map_id: String,
        x: i64,
        y: i64,
        facing: String,
    },
    Connection {
        #[serde(rename = "mapId")]
        map_id: String,
        connection: ConnectionTarget,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub direction: String,
    pub offset: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventMeta {
    Warp {
        source: String,
        #[serde(rename = "destMap")]
        dest_map: Option<String>,
        #[serde(rename = "destWarpId")]
        dest_warp_id: Value,
        elevation: Value,
    },
    Connection {
        source: String,
        direction: String,
        offset: i64,
        #[serde(rename = "destMap")]
        dest_map: Option<String>,
    },
}

/// A generated navigation event. Replaces the editor map's `events` list
/// wholesale; manual edits to generated events do not survive a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoorEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub rect: Rect,
    pub once: bool,
    pub target: EventTarget,
    pub meta: EventMeta,
    #[serde(rename = "lockFlag", default, skip_serializing_if = "Option::is_none")]
    pub lock_flag: Option<String>,
    #[serde(rename = "lockMessage", default, skip_serializing_if = "Option::is_none")]
    pub lock_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn direction_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Direction::Up).unwrap(), json!("up"));
        assert_eq!(serde_json::to_value(Direction::Right).unwrap(), json!("right"));
    }

    #[test]
    fn jump_shape_matches_editor_schema() {
        let j = Jump { x: 3, y: 9, dir: Direction::Left };
        let v = serde_json::to_value(&j).unwrap();
        assert_eq!(v, json!({"x": 3, "y": 9, "dir": "left"}));
    }

    #[test]
    fn door_event_omits_lock_fields_when_unset() {
        let ev = DoorEvent {
            id: "warp-pallet-town-1".into(),
            type_: "door".into(),
            rect: Rect { x: 4, y: 2, w: 1, h: 1 },
            once: false,
            target: EventTarget::Warp {
                map_id: "route-1".into(),
                x: 7,
                y: 0,
                facing: "down".into(),
            },
            meta: EventMeta::Warp {
                source: "warp".into(),
                dest_map: Some("MAP_ROUTE1".into()),
                dest_warp_id: json!(0),
                elevation: Value::Null,
            },
            lock_flag: None,
            lock_message: None,
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert!(v.get("lockFlag").is_none());
        assert!(v.get("lockMessage").is_none());
        assert_eq!(v["type"], json!("door"));
        assert_eq!(v["target"]["mapId"], json!("route-1"));
        assert_eq!(v["meta"]["destWarpId"], json!(0));
        assert_eq!(v["meta"]["elevation"], Value::Null);
    }

    #[test]
    fn connection_event_round_trips() {
        let ev = DoorEvent {
            id: "conn-route-1-down-1".into(),
            type_: "door".into(),
            rect: Rect { x: 5, y: 19, w: 10, h: 1 },
            once: false,
            target: EventTarget::Connection {
                map_id: "pallet-town".into(),
                connection: ConnectionTarget { direction: "down".into(), offset: 5 },
            },
            meta: EventMeta::Connection {
                source: "connection".into(),
                direction: "down".into(),
                offset: 5,
                dest_map: Some("MAP_PALLET_TOWN".into()),
            },
            lock_flag: Some("FLAG_BADGE01".into()),
            lock_message: Some("The road is blocked.".into()),
        };
        let s = serde_json::to_string(&ev).unwrap();
        let de: DoorEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(ev, de);
    }

    #[test]
    fn layout_registry_drops_malformed_entries() {
        let doc = json!({
            "layouts": [
                {"id": "L_A", "width": 20, "height": 20,
                 "primary_tileset": "gTileset_General",
                 "secondary_tileset": "gTileset_PalletTown",
                 "blockdata_filepath": "data/layouts/a/map.bin"},
                "not-an-object",
                {"width": 5, "height": 5},
                {"id": "", "width": 5, "height": 5}
            ]
        });
        let reg = LayoutRegistry::from_value(&doc);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("L_A").unwrap().width, 20);
        assert!(reg.get("").is_none());
    }

    #[test]
    fn warp_record_tolerates_string_coordinates() {
        let w: WarpRecord = serde_json::from_value(json!({
            "x": "9", "y": 12, "dest_map": "MAP_ROUTE1", "dest_warp_id": "2"
        }))
        .unwrap();
        assert_eq!(w.x, 9);
        assert_eq!(w.y, 12);
        assert_eq!(w.dest_warp_id, json!("2"));
        assert_eq!(w.elevation, Value::Null);
    }
}
