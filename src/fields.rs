//! Ordered key aliases for the upstream JSON and the lookups that walk them.
//!
//! The upstream payloads are not consistent across seasons and leagues, so
//! every field is read through a fixed alias list, first non-empty hit wins.

use serde_json::Value;

pub const EVENT_ID_KEYS: &[&str] = &["id", "uid"];
pub const EVENT_DATE_KEYS: &[&str] = &["date", "gameDate"];
pub const TEAM_NAME_KEYS: &[&str] = &["displayName", "name", "shortDisplayName", "abbreviation"];
pub const SCORE_KEYS: &[&str] = &["value", "displayValue"];
pub const STAT_NAME_KEYS: &[&str] = &["name", "id", "label", "stat", "type"];
pub const STAT_VALUE_KEYS: &[&str] = &["displayValue", "value"];
pub const ROLE_KEY: &str = "homeAway";

/// First alias whose value is a non-empty string or a number, as text.
pub fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(as_text)
}

/// First alias whose value is not JSON null.
pub fn pick_present<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find(|v| !v.is_null())
}

pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer goals from the shapes the scoreboard uses: plain numbers,
/// integral floats, numeric strings, or an object carrying one of those.
pub fn as_goal_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.is_finite()).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Object(_) => pick_present(value, SCORE_KEYS).and_then(as_goal_count),
        _ => None,
    }
}

pub fn as_array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pick_string_walks_aliases_in_order() {
        let v = json!({ "uid": "s:600~e:400", "id": "" });
        assert_eq!(pick_string(&v, EVENT_ID_KEYS).as_deref(), Some("s:600~e:400"));
        let v = json!({ "id": 400, "uid": "x" });
        assert_eq!(pick_string(&v, EVENT_ID_KEYS).as_deref(), Some("400"));
        assert_eq!(pick_string(&json!({}), EVENT_ID_KEYS), None);
    }

    #[test]
    fn goal_counts_tolerate_shapes() {
        assert_eq!(as_goal_count(&json!(2)), Some(2));
        assert_eq!(as_goal_count(&json!(2.0)), Some(2));
        assert_eq!(as_goal_count(&json!(" 3 ")), Some(3));
        assert_eq!(as_goal_count(&json!({ "value": 1.0, "displayValue": "1" })), Some(1));
        assert_eq!(as_goal_count(&json!("")), None);
        assert_eq!(as_goal_count(&json!("1-0")), None);
        assert_eq!(as_goal_count(&json!(1.5)), None);
        assert_eq!(as_goal_count(&Value::Null), None);
    }

    #[test]
    fn pick_present_skips_nulls() {
        let v = json!({ "displayValue": null, "value": 7 });
        assert_eq!(pick_present(&v, STAT_VALUE_KEYS), Some(&json!(7)));
    }
}
