use std::convert::Infallible;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::hub::{EventHub, LiveEvent, NEW_RIDE_REQUEST};
use crate::{extract::ApiQuery, rides::fare::Coordinates, state::AppState};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(sse_stream))
        .route("/events/ws", get(ws_upgrade))
}

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
    /// Comma separated event name prefixes.
    pub topics: Option<String>,
}

fn parse_topics(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

pub async fn sse_stream(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<TopicQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let topics = parse_topics(q.topics.as_deref());
    debug!(?topics, "sse subscriber connected");

    let stream = state.events.stream(topics).map(|ev| {
        let data = serde_json::to_string(&ev.data).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(ev.event).data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.events.clone()))
}

/// Messages a websocket client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    DriverJoin {
        id: Uuid,
    },
    UserJoin {
        id: Uuid,
    },
    UpdateLocation {
        #[serde(rename = "driverId")]
        driver_id: Uuid,
        latitude: f64,
        longitude: f64,
    },
}

/// Which events a socket is interested in. Sockets that never join see everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Room {
    All,
    Driver(Uuid),
    User(Uuid),
}

impl Room {
    pub fn admits(&self, ev: &LiveEvent) -> bool {
        match self {
            Room::All => true,
            Room::Driver(id) => ev.event == NEW_RIDE_REQUEST || ev.event.ends_with(&format!("_{id}")),
            Room::User(id) => ev.event.ends_with(&format!("_{id}")),
        }
    }
}

async fn handle_socket(mut socket: WebSocket, hub: EventHub) {
    let mut rx = hub.subscribe();
    let mut room = Room::All;
    info!("websocket client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        debug!(error = %e, "websocket receive failed");
                        break;
                    }
                    None => break,
                };
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(cmd) => room = apply_client_message(&hub, room, cmd),
                        Err(e) => warn!(error = %e, "ignoring malformed websocket message"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            outgoing = rx.recv() => {
                let ev = match outgoing {
                    Ok(ev) => ev,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "websocket subscriber lagging, events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if !room.admits(&ev) {
                    continue;
                }
                let Ok(text) = serde_json::to_string(&ev) else { continue };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("websocket client disconnected");
}

fn apply_client_message(hub: &EventHub, room: Room, cmd: ClientMessage) -> Room {
    match cmd {
        ClientMessage::DriverJoin { id } => {
            info!(driver_id = %id, "driver joined");
            Room::Driver(id)
        }
        ClientMessage::UserJoin { id } => {
            info!(user_id = %id, "user joined");
            Room::User(id)
        }
        ClientMessage::UpdateLocation {
            driver_id,
            latitude,
            longitude,
        } => {
            if Coordinates::new(latitude, longitude).is_valid() {
                hub.driver_location(driver_id, latitude, longitude);
            } else {
                warn!(%driver_id, latitude, longitude, "dropping out-of-range location update");
            }
            room
        }
    }
}
