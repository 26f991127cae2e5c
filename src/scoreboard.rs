use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiEndpoints;
use crate::dates;
use crate::fields;
use crate::http_client::{Endpoint, ResilientClient, Transport};

/// Raw events scheduled on `date`. Empty when there were no matches, when
/// the request failed, or when the body did not decode.
pub fn fetch_scoreboard<T: Transport>(
    client: &ResilientClient<T>,
    api: &ApiEndpoints,
    date: NaiveDate,
    league_code: &str,
) -> Vec<Value> {
    let url = api.scoreboard_url(league_code);
    let query = [("dates", dates::compact(date))];
    let Some(resp) = client.fetch(Endpoint::Scoreboard, &url, &query).success() else {
        debug!(%date, league_code, "no scoreboard for date");
        return Vec::new();
    };
    match resp.json() {
        Ok(body) => scoreboard_events(body),
        Err(err) => {
            warn!(%date, error = %err, "scoreboard body did not decode");
            Vec::new()
        }
    }
}

/// Events from a scoreboard body: the top-level `events`, or when that is
/// missing or empty, every `leagues[*].events` in order.
pub fn scoreboard_events(mut body: Value) -> Vec<Value> {
    if let Some(Value::Array(events)) = body.get_mut("events").map(Value::take)
        && !events.is_empty()
    {
        return events;
    }
    fields::as_array(&body, "leagues")
        .iter()
        .flat_map(|league| fields::as_array(league, "events").iter().cloned())
        .collect()
}
