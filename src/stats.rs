use serde_json::Value;
use tracing::debug;

use crate::fields::{self, ROLE_KEY, STAT_NAME_KEYS, STAT_VALUE_KEYS};
use crate::record::{MatchStats, Side, StatValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatCategory {
    Possession,
    ShotsTotal,
    ShotsOnTarget,
    Corners,
    YellowCards,
    RedCards,
}

/// A category matches when the lowercased stat name contains every needle.
pub struct StatRule {
    pub category: StatCategory,
    pub needles: &'static [&'static str],
}

/// Classification precedence. Earlier rules win: "Total Shots On Target"
/// style names are shot totals, and "possession" beats everything.
pub const STAT_RULES: &[StatRule] = &[
    StatRule {
        category: StatCategory::Possession,
        needles: &["possession"],
    },
    StatRule {
        category: StatCategory::ShotsTotal,
        needles: &["total", "shot"],
    },
    StatRule {
        category: StatCategory::ShotsOnTarget,
        needles: &["on target"],
    },
    StatRule {
        category: StatCategory::Corners,
        needles: &["corner"],
    },
    StatRule {
        category: StatCategory::YellowCards,
        needles: &["yellow"],
    },
    StatRule {
        category: StatCategory::RedCards,
        needles: &["red"],
    },
];

pub fn classify(name: &str) -> Option<StatCategory> {
    let lowered = name.to_lowercase();
    STAT_RULES
        .iter()
        .find(|rule| rule.needles.iter().all(|n| lowered.contains(n)))
        .map(|rule| rule.category)
}

impl MatchStats {
    pub fn slot_mut(&mut self, side: Side, category: StatCategory) -> &mut Option<StatValue> {
        match (category, side) {
            (StatCategory::Possession, Side::Home) => &mut self.possession_home,
            (StatCategory::Possession, Side::Away) => &mut self.possession_away,
            (StatCategory::ShotsTotal, Side::Home) => &mut self.shots_total_home,
            (StatCategory::ShotsTotal, Side::Away) => &mut self.shots_total_away,
            (StatCategory::ShotsOnTarget, Side::Home) => &mut self.shots_on_target_home,
            (StatCategory::ShotsOnTarget, Side::Away) => &mut self.shots_on_target_away,
            (StatCategory::Corners, Side::Home) => &mut self.corners_home,
            (StatCategory::Corners, Side::Away) => &mut self.corners_away,
            (StatCategory::YellowCards, Side::Home) => &mut self.yellow_cards_home,
            (StatCategory::YellowCards, Side::Away) => &mut self.yellow_cards_away,
            (StatCategory::RedCards, Side::Home) => &mut self.red_cards_home,
            (StatCategory::RedCards, Side::Away) => &mut self.red_cards_away,
        }
    }
}

/// Maps a summary payload onto the fixed statistic schema. A missing or
/// malformed payload yields all-null stats.
pub fn normalize(payload: Option<&Value>) -> MatchStats {
    let mut out = MatchStats::default();
    let Some(payload) = payload else {
        return out;
    };
    let Some(boxscore) = payload.get("boxscore") else {
        return out;
    };

    for team in fields::as_array(boxscore, "teams") {
        let Some(side) = team
            .get(ROLE_KEY)
            .and_then(|v| v.as_str())
            .and_then(Side::from_flag)
        else {
            debug!("boxscore team without home/away flag skipped");
            continue;
        };
        for stat in fields::as_array(team, "statistics") {
            let Some(raw) = fields::pick_present(stat, STAT_VALUE_KEYS) else {
                continue;
            };
            // One name per entry: the first non-empty alias. A name that
            // does not classify drops the entry.
            let Some(category) =
                fields::pick_string(stat, STAT_NAME_KEYS).and_then(|name| classify(&name))
            else {
                continue;
            };
            *out.slot_mut(side, category) = normalize_number(raw);
        }
    }
    out
}

/// Coerces an upstream statistic value. Numbers pass through, `"54%"` is a
/// float, `"1,234"` an integer; anything unparseable is kept verbatim.
pub fn normalize_number(value: &Value) -> Option<StatValue> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => StatValue::Int(i),
            None => n
                .as_f64()
                .map(StatValue::Float)
                .unwrap_or_else(|| StatValue::Text(n.to_string())),
        }),
        Value::String(s) => Some(normalize_number_str(s)),
        other => Some(StatValue::Text(other.to_string())),
    }
}

pub fn normalize_number_str(raw: &str) -> StatValue {
    let verbatim = || StatValue::Text(raw.to_string());
    let trimmed = raw.trim();

    if let Some(pct) = trimmed.strip_suffix('%') {
        return parse_float(pct.trim()).map(StatValue::Float).unwrap_or_else(verbatim);
    }

    let cleaned = trimmed.replace(',', "");
    if cleaned.contains('.') {
        parse_float(&cleaned).map(StatValue::Float).unwrap_or_else(verbatim)
    } else {
        cleaned.parse::<i64>().map(StatValue::Int).unwrap_or_else(|_| verbatim())
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|f| f.is_finite())
}
