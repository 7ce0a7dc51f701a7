//! SSE tool-call event stream: `GET /director/tool-stream`.
//!
//! Same subscribe-then-forward shape as `cwa_web::websocket`'s WebSocket
//! handler — `state.tx.subscribe()` filtered to one workflow and forwarded
//! to the client — with the transport swapped for
//! `axum::response::sse::{Sse, Event}`.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct ToolStreamQuery {
    #[serde(rename = "workflowId")]
    workflow_id: String,
}

pub async fn tool_stream(
    State(state): State<AppState>,
    Query(query): Query<ToolStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let workflow_id = query.workflow_id;
    let rx = state.events.subscribe();

    let stream = stream::unfold(rx, move |mut rx| {
        let workflow_id = workflow_id.clone();
        async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.workflow_id() == workflow_id.as_str() => {
                        let json = serde_json::to_string(&event).unwrap_or_default();
                        debug!(message = %json, "forwarding tool event over SSE");
                        return Some((Ok(Event::default().data(json)), rx));
                    }
                    Ok(_) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
