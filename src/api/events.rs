//! Event stream and broadcast group membership
//!
//! A client opens the SSE stream, reads its connection id from the initial
//! `connected` event, then joins or leaves broadcast groups with control
//! requests. Push delivery is best-effort; clients are expected to re-fetch
//! the list endpoint periodically as their resynchronization backstop.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::sse::SONGS_GROUP;
use crate::AppState;

/// GET /api/v1/events - SSE stream of change events
///
/// The first event is `connected` and carries the server-assigned
/// connection id. Dropping the stream removes the connection from every
/// group it joined.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let mut conn = state.notifier.register();

    let stream = async_stream::stream! {
        let hello = Event::default()
            .event("connected")
            .json_data(json!({ "connectionId": conn.id() }));
        if let Ok(event) = hello {
            yield Ok(event);
        }

        while let Some(change) = conn.recv().await {
            match Event::default()
                .event(change.event_name())
                .json_data(&change)
            {
                Ok(event) => yield Ok(event),
                Err(e) => warn!("Failed to serialize change event: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

/// Membership control request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub connection_id: Uuid,
    #[serde(default = "default_group")]
    pub group: String,
}

fn default_group() -> String {
    SONGS_GROUP.to_string()
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub success: bool,
    pub group: String,
}

/// POST /api/v1/events/join
pub async fn join_group(
    State(state): State<AppState>,
    Json(req): Json<MembershipRequest>,
) -> Result<Json<MembershipResponse>> {
    if !state.notifier.join(&req.group, req.connection_id) {
        return Err(unknown_connection(req.connection_id));
    }
    Ok(Json(MembershipResponse {
        success: true,
        group: req.group,
    }))
}

/// POST /api/v1/events/leave
pub async fn leave_group(
    State(state): State<AppState>,
    Json(req): Json<MembershipRequest>,
) -> Result<Json<MembershipResponse>> {
    if !state.notifier.leave(&req.group, req.connection_id) {
        return Err(unknown_connection(req.connection_id));
    }
    Ok(Json(MembershipResponse {
        success: true,
        group: req.group,
    }))
}

fn unknown_connection(id: Uuid) -> Error {
    Error::NotFound(format!("Unknown connection: {}", id))
}
