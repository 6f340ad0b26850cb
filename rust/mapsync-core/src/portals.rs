use std::collections::HashMap;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::ProjectPaths;
use crate::errors::SyncError;
use crate::json::coerce_i64;
use crate::locks::{match_rule, PortalLockRule};
use crate::models::{ConnectionTarget, DoorEvent, EventMeta, EventTarget, Rect};
use crate::report::{PortalSummary, SkipReason};
use crate::source_index::{SourceIndex, SourceMap};
use crate::store::{self, EditorMapFile};

/// Clamped shared-edge rectangle for an area connection. The offset shifts
/// the destination edge along the shared axis; the span is clamped to the
/// source map on both ends, and an inverted range means the maps do not
/// actually share an edge segment.
pub fn rect_for_connection(
    direction: &str,
    offset: i64,
    size: (i64, i64),
    dest_size: (i64, i64),
) -> Option<Rect> {
    let (width, height) = size;
    let (dest_width, dest_height) = dest_size;
    match direction {
        "up" | "down" => {
            let min_x = offset.max(0);
            let max_x = (offset + dest_width - 1).min(width - 1);
            if max_x < min_x {
                return None;
            }
            let y = if direction == "up" { 0 } else { height - 1 };
            Some(Rect { x: min_x, y, w: max_x - min_x + 1, h: 1 })
        }
        "left" | "right" => {
            let min_y = offset.max(0);
            let max_y = (offset + dest_height - 1).min(height - 1);
            if max_y < min_y {
                return None;
            }
            let x = if direction == "left" { 0 } else { width - 1 };
            Some(Rect { x, y: min_y, w: 1, h: max_y - min_y + 1 })
        }
        _ => None,
    }
}

fn apply_lock(event: &mut DoorEvent, rule: Option<&PortalLockRule>) {
    if let Some(flag) = rule.and_then(PortalLockRule::flag) {
        event.lock_flag = Some(flag.to_string());
        event.lock_message = Some(
            rule.and_then(|r| r.message.clone())
                .unwrap_or_default(),
        );
    }
}

fn warp_events(
    map_id: &str,
    source: &SourceMap,
    index: &SourceIndex,
    locks: &[PortalLockRule],
    summary: &mut PortalSummary,
    out: &mut Vec<DoorEvent>,
) {
    for (n, warp) in source.warps.iter().enumerate() {
        let dest_id = warp
            .dest_map
            .as_deref()
            .and_then(|c| index.id_for_constant(c));
        let Some(dest_id) = dest_id else {
            summary.skipped_warps += 1;
            continue;
        };

        // destination coordinates come from the destination's own warp
        // list; an out-of-range index falls back to the map origin
        let dest_warps = index.get(dest_id).map(|m| m.warps.as_slice()).unwrap_or(&[]);
        let dest_index = coerce_i64(&warp.dest_warp_id).unwrap_or(0);
        let (target_x, target_y) = usize::try_from(dest_index)
            .ok()
            .and_then(|i| dest_warps.get(i))
            .map(|w| (w.x, w.y))
            .unwrap_or((0, 0));

        let mut event = DoorEvent {
            id: format!("warp-{}-{}", map_id, n + 1),
            type_: "door".into(),
            rect: Rect { x: warp.x, y: warp.y, w: 1, h: 1 },
            once: false,
            target: EventTarget::Warp {
                map_id: dest_id.to_string(),
                x: target_x,
                y: target_y,
                facing: "down".into(),
            },
            meta: EventMeta::Warp {
                source: "warp".into(),
                dest_map: warp.dest_map.clone(),
                dest_warp_id: warp.dest_warp_id.clone(),
                elevation: warp.elevation.clone(),
            },
            lock_flag: None,
            lock_message: None,
        };
        apply_lock(&mut event, match_rule(locks, "warp", map_id, dest_id, None));
        out.push(event);
        summary.warps += 1;
    }
}

fn connection_events(
    map_id: &str,
    source: &SourceMap,
    index: &SourceIndex,
    size_by_id: &HashMap<String, (i64, i64)>,
    locks: &[PortalLockRule],
    summary: &mut PortalSummary,
    out: &mut Vec<DoorEvent>,
) {
    for (n, conn) in source.connections.iter().enumerate() {
        let direction = conn
            .direction
            .as_deref()
            .unwrap_or("")
            .to_ascii_lowercase();
        let dest_id = conn.map.as_deref().and_then(|c| index.id_for_constant(c));
        let Some(dest_id) = dest_id else {
            summary.skipped_connections += 1;
            continue;
        };

        // edge geometry needs both editor maps' dimensions
        let sizes = size_by_id
            .get(map_id)
            .zip(size_by_id.get(dest_id))
            .map(|(&a, &b)| (a, b));
        let Some((size, dest_size)) = sizes else {
            summary.skipped_connections += 1;
            continue;
        };

        let Some(rect) = rect_for_connection(&direction, conn.offset, size, dest_size) else {
            summary.skipped_connections += 1;
            continue;
        };

        let dir_label = if direction.is_empty() { "link" } else { direction.as_str() };
        let mut event = DoorEvent {
            id: format!("conn-{}-{}-{}", map_id, dir_label, n + 1),
            type_: "door".into(),
            rect,
            once: false,
            target: EventTarget::Connection {
                map_id: dest_id.to_string(),
                connection: ConnectionTarget { direction: direction.clone(), offset: conn.offset },
            },
            meta: EventMeta::Connection {
                source: "connection".into(),
                direction: direction.clone(),
                offset: conn.offset,
                dest_map: conn.map.clone(),
            },
            lock_flag: None,
            lock_message: None,
        };
        apply_lock(
            &mut event,
            match_rule(locks, "connection", map_id, dest_id, Some(&direction)),
        );
        out.push(event);
        summary.connections += 1;
    }
}

/// Portal synchronizer: rewrite every editor map's `events` from source
/// warp and connection records (warps first, each in source order) and
/// reset `npcs`. Maps without a resolvable source are still rewritten with
/// empty events, so stale generated content never lingers.
pub fn sync_portals(paths: &ProjectPaths) -> Result<PortalSummary, SyncError> {
    let locks = crate::locks::load_portal_locks(&paths.locks_path);
    let index = SourceIndex::scan(&paths.source_maps_dir)?;
    let (maps, unparsed) = store::load_editor_maps(&paths.maps_dir)?;

    let mut size_by_id: HashMap<String, (i64, i64)> = HashMap::new();
    for map in &maps {
        if let Some(size) = store::map_size(&map.doc) {
            size_by_id.insert(map.id.clone(), size);
        }
    }

    let mut summary = PortalSummary::default();
    summary.skipped_maps.add(SkipReason::UnparsableJson, unparsed);

    for mut map in maps {
        let mut events: Vec<DoorEvent> = Vec::new();
        match index.resolve(&map.id, store::source_constant(&map.doc)) {
            Some((source_id, source)) => {
                warp_events(&map.id, source, &index, &locks, &mut summary, &mut events);
                connection_events(
                    &map.id,
                    source,
                    &index,
                    &size_by_id,
                    &locks,
                    &mut summary,
                    &mut events,
                );
                info!(map = %map.id, source = %source_id, events = events.len(), "updated");
            }
            None => {
                summary.without_source += 1;
                warn!(map = %map.id, "no source record, clearing generated events");
            }
        }

        map.doc["events"] = serde_json::to_value(&events)?;
        map.doc["npcs"] = Value::Array(Vec::new());
        store::save_editor_map(&map)?;
        summary.updated += 1;
    }

    info!(%summary, "portal sync finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_connection_rect_spans_clamped_bottom_row() {
        let rect = rect_for_connection("down", 5, (20, 20), (10, 12)).unwrap();
        assert_eq!(rect, Rect { x: 5, y: 19, w: 10, h: 1 });
    }

    #[test]
    fn negative_offset_clamps_left_edge() {
        let rect = rect_for_connection("up", -3, (20, 20), (10, 12)).unwrap();
        assert_eq!(rect, Rect { x: 0, y: 0, w: 7, h: 1 });
    }

    #[test]
    fn overhanging_offset_clamps_right_edge() {
        // offset 18 with dest width 10 overhangs; clamp yields a 2-wide rect
        let rect = rect_for_connection("down", 18, (20, 20), (10, 12)).unwrap();
        assert_eq!(rect, Rect { x: 18, y: 19, w: 2, h: 1 });
    }

    #[test]
    fn inverted_range_is_no_rect() {
        assert!(rect_for_connection("down", 25, (20, 20), (10, 12)).is_none());
        assert!(rect_for_connection("right", 40, (20, 20), (10, 12)).is_none());
    }

    #[test]
    fn horizontal_connections_use_destination_height() {
        let rect = rect_for_connection("left", 4, (20, 30), (10, 12)).unwrap();
        assert_eq!(rect, Rect { x: 0, y: 4, w: 1, h: 12 });

        let rect = rect_for_connection("right", 4, (20, 30), (10, 12)).unwrap();
        assert_eq!(rect, Rect { x: 19, y: 4, w: 1, h: 12 });
    }

    #[test]
    fn unknown_direction_is_no_rect() {
        assert!(rect_for_connection("dive", 0, (20, 20), (10, 10)).is_none());
        assert!(rect_for_connection("", 0, (20, 20), (10, 10)).is_none());
    }
}
