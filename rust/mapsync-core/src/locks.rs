use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One portal lock rule. Every match field is optional; absent or empty
/// means "any". A matching rule only decorates a generated event with its
/// flag/message, it never suppresses the event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortalLockRule {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(rename = "fromMap", default)]
    pub from_map: Option<String>,
    #[serde(rename = "toMap", default)]
    pub to_map: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn field_matches(rule_field: &Option<String>, value: Option<&str>) -> bool {
    match rule_field.as_deref() {
        None | Some("") => true,
        Some(want) => value == Some(want),
    }
}

impl PortalLockRule {
    pub fn matches(
        &self,
        kind: &str,
        from_map: &str,
        to_map: &str,
        direction: Option<&str>,
    ) -> bool {
        field_matches(&self.kind, Some(kind))
            && field_matches(&self.from_map, Some(from_map))
            && field_matches(&self.to_map, Some(to_map))
            && field_matches(&self.direction, direction)
    }

    /// The flag to apply, when the rule actually carries one.
    pub fn flag(&self) -> Option<&str> {
        self.flag.as_deref().filter(|f| !f.is_empty())
    }
}

/// First match wins, in file order.
pub fn match_rule<'a>(
    rules: &'a [PortalLockRule],
    kind: &str,
    from_map: &str,
    to_map: &str,
    direction: Option<&str>,
) -> Option<&'a PortalLockRule> {
    rules
        .iter()
        .find(|rule| rule.matches(kind, from_map, to_map, direction))
}

/// Load the optional lock rule file. An absent file is simply an empty rule
/// set; a malformed one is logged and ignored, since locks only decorate
/// output. Non-object rows are dropped.
pub fn load_portal_locks(path: &Path) -> Vec<PortalLockRule> {
    if !path.exists() {
        return Vec::new();
    }
    let doc = fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok());
    let Some(Value::Array(rows)) = doc else {
        warn!(path = %path.display(), "ignoring malformed portal lock file");
        return Vec::new();
    };
    rows.into_iter()
        .filter(|row| row.is_object())
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rule(kind: &str, from: &str, to: &str, dir: &str, flag: &str) -> PortalLockRule {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        PortalLockRule {
            kind: opt(kind),
            from_map: opt(from),
            to_map: opt(to),
            direction: opt(dir),
            flag: opt(flag),
            message: None,
        }
    }

    #[test]
    fn empty_fields_match_anything() {
        let r = rule("", "", "", "", "FLAG_ANY");
        assert!(r.matches("warp", "pallet-town", "route-1", None));
        assert!(r.matches("connection", "a", "b", Some("down")));
    }

    #[test]
    fn set_fields_must_equal() {
        let r = rule("warp", "pallet-town", "", "", "F");
        assert!(r.matches("warp", "pallet-town", "anywhere", None));
        assert!(!r.matches("warp", "route-1", "anywhere", None));
        assert!(!r.matches("connection", "pallet-town", "anywhere", None));
    }

    #[test]
    fn direction_rule_never_matches_warps() {
        // warps are matched with no direction, so a direction-scoped rule
        // cannot apply to them
        let r = rule("", "", "", "down", "F");
        assert!(!r.matches("warp", "a", "b", None));
        assert!(r.matches("connection", "a", "b", Some("down")));
        assert!(!r.matches("connection", "a", "b", Some("up")));
    }

    #[test]
    fn first_match_wins_in_file_order() {
        let rules = vec![
            rule("connection", "", "", "", "FIRST"),
            rule("", "", "", "", "SECOND"),
        ];
        let hit = match_rule(&rules, "connection", "a", "b", Some("up")).unwrap();
        assert_eq!(hit.flag(), Some("FIRST"));
        let hit = match_rule(&rules, "warp", "a", "b", None).unwrap();
        assert_eq!(hit.flag(), Some("SECOND"));
    }

    #[test]
    fn empty_flag_is_no_flag() {
        let r = rule("", "", "", "", "");
        assert_eq!(r.flag(), None);
    }

    #[test]
    fn load_tolerates_missing_and_malformed_files() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("portal-locks.json");
        assert!(load_portal_locks(&missing).is_empty());

        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, r#"{"not": "a list"}"#).unwrap();
        assert!(load_portal_locks(&bad).is_empty());

        let mixed = tmp.path().join("mixed.json");
        std::fs::write(
            &mixed,
            r#"[{"kind": "warp", "flag": "F"}, "junk", 42, {"direction": "up"}]"#,
        )
        .unwrap();
        let rules = load_portal_locks(&mixed);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].kind.as_deref(), Some("warp"));
        assert_eq!(rules[1].direction.as_deref(), Some("up"));
    }
}
