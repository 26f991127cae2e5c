use serde_json::Value;
use tracing::warn;

use crate::config::ApiEndpoints;
use crate::http_client::{Endpoint, ResilientClient, Transport};

/// The boxscore payload for one match, or `None` when the fetch failed or
/// the body did not decode. Normalizing `None` yields all-null stats.
pub fn fetch_summary<T: Transport>(
    client: &ResilientClient<T>,
    api: &ApiEndpoints,
    match_id: &str,
    league_code: &str,
) -> Option<Value> {
    let url = api.summary_url(league_code);
    let query = [("event", match_id.to_string())];
    let resp = client.fetch(Endpoint::Summary, &url, &query).success()?;
    match resp.json() {
        Ok(body) if body.is_object() => Some(body),
        Ok(_) => {
            warn!(match_id, "summary body is not an object");
            None
        }
        Err(err) => {
            warn!(match_id, error = %err, "summary body did not decode");
            None
        }
    }
}
