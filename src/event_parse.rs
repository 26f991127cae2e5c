use chrono::NaiveDate;
use serde_json::Value;

use crate::dates;
use crate::fields::{self, EVENT_DATE_KEYS, EVENT_ID_KEYS, ROLE_KEY, TEAM_NAME_KEYS};
use crate::record::{MatchRecord, Side};

/// A basic record plus the names of the fields that fell back to a default.
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub record: MatchRecord,
    pub defaulted: Vec<&'static str>,
}

impl ParsedEvent {
    pub fn has_id(&self) -> bool {
        !self.record.match_id.is_empty()
    }
}

/// Extracts identity, date, teams and score from one scoreboard event.
/// Never fails: each unreadable field is left null and listed in
/// `defaulted`. `bucket` is the scoreboard date the event was found under and
/// stands in for a missing or unreadable event date.
pub fn parse_basic(event: &Value, league: &str, bucket: NaiveDate) -> ParsedEvent {
    let mut defaulted = Vec::new();

    let match_id = fields::pick_string(event, EVENT_ID_KEYS).unwrap_or_else(|| {
        defaulted.push("match_id");
        String::new()
    });

    let date = fields::pick_string(event, EVENT_DATE_KEYS)
        .and_then(|raw| dates::parse_loose(&raw))
        .unwrap_or_else(|| {
            defaulted.push("date");
            bucket
        });

    let mut record = MatchRecord::new(match_id, date, league.to_string());

    let competitors = event
        .get("competitions")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .map(|comp| fields::as_array(comp, "competitors"))
        .unwrap_or_default();

    for competitor in competitors {
        let Some(side) = competitor
            .get(ROLE_KEY)
            .and_then(|v| v.as_str())
            .and_then(Side::from_flag)
        else {
            continue;
        };
        let name = competitor
            .get("team")
            .and_then(|team| fields::pick_string(team, TEAM_NAME_KEYS));
        let goals = competitor.get("score").and_then(fields::as_goal_count);
        match side {
            Side::Home => {
                record.home_team = name;
                record.home_goals = goals;
            }
            Side::Away => {
                record.away_team = name;
                record.away_goals = goals;
            }
        }
    }

    for (field, missing) in [
        ("home_team", record.home_team.is_none()),
        ("away_team", record.away_team.is_none()),
        ("home_goals", record.home_goals.is_none()),
        ("away_goals", record.away_goals.is_none()),
    ] {
        if missing {
            defaulted.push(field);
        }
    }

    ParsedEvent { record, defaulted }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bucket() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn away_listed_first_still_resolves_by_flag() {
        let event = json!({
            "id": "400",
            "date": "2024-05-01T19:00Z",
            "competitions": [{
                "competitors": [
                    { "homeAway": "away", "score": "1", "team": { "displayName": "B" } },
                    { "homeAway": "home", "score": "2", "team": { "displayName": "A" } }
                ]
            }]
        });
        let parsed = parse_basic(&event, "Premier League", bucket());
        let rec = parsed.record;
        assert_eq!(rec.match_id, "400");
        assert_eq!(rec.date, bucket());
        assert_eq!(rec.home_team.as_deref(), Some("A"));
        assert_eq!(rec.away_team.as_deref(), Some("B"));
        assert_eq!(rec.home_goals, Some(2));
        assert_eq!(rec.away_goals, Some(1));
        assert!(parsed.defaulted.is_empty());
        assert!(rec.stats.is_empty());
    }

    #[test]
    fn bad_score_degrades_only_that_field() {
        let event = json!({
            "uid": "s:600~e:77",
            "gameDate": "20240502",
            "competitions": [{
                "competitors": [
                    { "homeAway": "home", "score": "abandoned", "team": { "name": "Home FC" } },
                    { "homeAway": "away", "score": 0, "team": {} }
                ]
            }]
        });
        let parsed = parse_basic(&event, "x", bucket());
        let rec = &parsed.record;
        assert_eq!(rec.match_id, "s:600~e:77");
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(rec.home_team.as_deref(), Some("Home FC"));
        assert_eq!(rec.home_goals, None);
        assert_eq!(rec.away_goals, Some(0));
        assert_eq!(rec.away_team, None);
        assert_eq!(parsed.defaulted, vec!["away_team", "home_goals"]);
    }

    #[test]
    fn missing_everything_still_builds_a_record() {
        let parsed = parse_basic(&json!({}), "x", bucket());
        assert!(!parsed.has_id());
        assert_eq!(parsed.record.date, bucket());
        assert!(parsed.defaulted.contains(&"match_id"));
        assert!(parsed.defaulted.contains(&"date"));
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let parsed = parse_basic(&json!({ "id": 401 }), "x", bucket());
        assert_eq!(parsed.record.match_id, "401");
    }

    #[test]
    fn competitor_without_role_is_ignored() {
        let event = json!({
            "id": "1",
            "competitions": [{ "competitors": [
                { "score": "3", "team": { "displayName": "Nowhere" } }
            ] }]
        });
        let rec = parse_basic(&event, "x", bucket()).record;
        assert_eq!(rec.home_team, None);
        assert_eq!(rec.away_team, None);
    }
}
