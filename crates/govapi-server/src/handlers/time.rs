//! `/time` endpoint.

use axum::extract::State;
use chrono::SecondsFormat;

use crate::server::AppState;

/// GET /time: current UTC time as ISO-8601 text.
pub async fn current_time(State(state): State<AppState>) -> String {
    state
        .clock
        .now()
        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
