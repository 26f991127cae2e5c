use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column order of the consolidated table. Downstream readers index by name,
/// but the order is part of the output contract too.
pub const COLUMNS: [&str; 19] = [
    "match_id",
    "date",
    "league",
    "home_team",
    "away_team",
    "home_goals",
    "away_goals",
    "possession_home",
    "possession_away",
    "shots_total_home",
    "shots_total_away",
    "shots_on_target_home",
    "shots_on_target_away",
    "corners_home",
    "corners_away",
    "yellow_cards_home",
    "yellow_cards_away",
    "red_cards_home",
    "red_cards_away",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    /// Resolves an upstream `homeAway` flag. Anything other than the two
    /// known roles is `None`; list position is never used as a fallback.
    pub fn from_flag(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => None,
        }
    }
}

/// A statistic value after coercion. Upstream strings that do not parse are
/// kept verbatim as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub possession_home: Option<StatValue>,
    pub possession_away: Option<StatValue>,
    pub shots_total_home: Option<StatValue>,
    pub shots_total_away: Option<StatValue>,
    pub shots_on_target_home: Option<StatValue>,
    pub shots_on_target_away: Option<StatValue>,
    pub corners_home: Option<StatValue>,
    pub corners_away: Option<StatValue>,
    pub yellow_cards_home: Option<StatValue>,
    pub yellow_cards_away: Option<StatValue>,
    pub red_cards_home: Option<StatValue>,
    pub red_cards_away: Option<StatValue>,
}

impl MatchStats {
    pub fn values(&self) -> [&Option<StatValue>; 12] {
        [
            &self.possession_home,
            &self.possession_away,
            &self.shots_total_home,
            &self.shots_total_away,
            &self.shots_on_target_home,
            &self.shots_on_target_away,
            &self.corners_home,
            &self.corners_away,
            &self.yellow_cards_home,
            &self.yellow_cards_away,
            &self.red_cards_home,
            &self.red_cards_away,
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| v.is_none())
    }
}

/// One finished match. Every field is always present in serialized form;
/// unknown values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub date: NaiveDate,
    pub league: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_goals: Option<i64>,
    pub away_goals: Option<i64>,
    #[serde(flatten)]
    pub stats: MatchStats,
}

impl MatchRecord {
    pub fn new(match_id: String, date: NaiveDate, league: String) -> Self {
        Self {
            match_id,
            date,
            league,
            home_team: None,
            away_team: None,
            home_goals: None,
            away_goals: None,
            stats: MatchStats::default(),
        }
    }

    /// Cells in `COLUMNS` order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut out = Vec::with_capacity(COLUMNS.len());
        out.push(Cell::Text(self.match_id.clone()));
        out.push(Cell::Text(self.date.format("%Y-%m-%d").to_string()));
        out.push(Cell::Text(self.league.clone()));
        out.push(Cell::from_text(self.home_team.as_deref()));
        out.push(Cell::from_text(self.away_team.as_deref()));
        out.push(self.home_goals.map(Cell::Int).unwrap_or(Cell::Null));
        out.push(self.away_goals.map(Cell::Int).unwrap_or(Cell::Null));
        for value in self.stats.values() {
            out.push(Cell::from_stat(value.as_ref()));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    fn from_text(value: Option<&str>) -> Self {
        match value {
            Some(s) => Cell::Text(s.to_string()),
            None => Cell::Null,
        }
    }

    fn from_stat(value: Option<&StatValue>) -> Self {
        match value {
            None => Cell::Null,
            Some(StatValue::Int(n)) => Cell::Int(*n),
            Some(StatValue::Float(f)) => Cell::Float(*f),
            Some(StatValue::Text(s)) => Cell::Text(s.clone()),
        }
    }

    /// Text rendering for delimited output. Nulls are empty; floats always
    /// keep a fractional part so `54.0` does not read back as an integer.
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) => format!("{f:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MatchRecord {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut rec = MatchRecord::new("400".to_string(), date, "Premier League".to_string());
        rec.home_team = Some("A".to_string());
        rec.home_goals = Some(2);
        rec.stats.possession_home = Some(StatValue::Float(54.0));
        rec.stats.corners_away = Some(StatValue::Text("N/A".to_string()));
        rec
    }

    #[test]
    fn serializes_every_field_including_nulls() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), COLUMNS.len());
        for col in COLUMNS {
            assert!(obj.contains_key(col), "missing {col}");
        }
        assert_eq!(obj["date"], "2024-05-01");
        assert!(obj["away_team"].is_null());
        assert!(obj["red_cards_home"].is_null());
        assert_eq!(obj["possession_home"], 54.0);
    }

    #[test]
    fn json_line_reads_back() {
        let rec = sample();
        let line = serde_json::to_string(&rec).unwrap();
        let back: MatchRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn cells_follow_column_order() {
        let cells = sample().cells();
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[0], Cell::Text("400".to_string()));
        assert_eq!(cells[1], Cell::Text("2024-05-01".to_string()));
        assert_eq!(cells[4], Cell::Null);
        assert_eq!(cells[5], Cell::Int(2));
        assert_eq!(cells[7].render(), "54.0");
        assert_eq!(cells[14].render(), "N/A");
    }

    #[test]
    fn side_flag_ignores_unknown_roles() {
        assert_eq!(Side::from_flag("home"), Some(Side::Home));
        assert_eq!(Side::from_flag(" AWAY "), Some(Side::Away));
        assert_eq!(Side::from_flag("neutral"), None);
        assert_eq!(Side::from_flag(""), None);
    }
}
