use std::pin::Pin;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::debug;
use uuid::Uuid;

pub const NEW_RIDE_REQUEST: &str = "new_ride_request";

/// A named notification pushed to connected clients. Delivery is best effort.
#[derive(Debug, Clone, Serialize)]
pub struct LiveEvent {
    pub event: String,
    pub data: Value,
}

impl LiveEvent {
    /// An empty topic list matches everything, otherwise any prefix must match.
    pub fn matches(&self, topics: &[String]) -> bool {
        topics.is_empty() || topics.iter().any(|t| self.event.starts_with(t.as_str()))
    }
}

/// Process-wide fan-out of [`LiveEvent`]s.
///
/// Backed by a bounded broadcast channel: subscribers that fall behind lose the
/// oldest events instead of slowing down publishers.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<LiveEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: impl Into<String>, data: Value) {
        let event = LiveEvent {
            event: event.into(),
            data,
        };
        // Err only means nobody is listening right now.
        match self.tx.send(event) {
            Ok(receivers) => debug!(receivers, "live event published"),
            Err(broadcast::error::SendError(ev)) => debug!(event = %ev.event, "live event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    pub fn stream(&self, topics: Vec<String>) -> Pin<Box<dyn Stream<Item = LiveEvent> + Send>> {
        let stream = BroadcastStream::new(self.subscribe()).filter_map(move |res| match res {
            Ok(ev) if ev.matches(&topics) => Some(ev),
            _ => None,
        });
        Box::pin(stream)
    }

    pub fn new_ride_request(&self, ride_id: Uuid, pickup: &str, dropoff: &str, estimated_fare: f64) {
        self.publish(
            NEW_RIDE_REQUEST,
            json!({
                "rideId": ride_id,
                "pickup_location": pickup,
                "dropoff_location": dropoff,
                "estimated_fare": estimated_fare,
            }),
        );
    }

    pub fn ride_accepted(&self, user_id: Uuid, ride_id: Uuid, driver_id: Uuid) {
        self.publish(
            format!("ride_accepted_{user_id}"),
            json!({ "rideId": ride_id, "driverId": driver_id }),
        );
    }

    pub fn ride_status(&self, user_id: Uuid, ride_id: Uuid, status: &str) {
        self.publish(
            format!("ride_status_{user_id}"),
            json!({ "rideId": ride_id, "status": status }),
        );
    }

    pub fn ride_cancelled(&self, driver_id: Uuid, ride_id: Uuid) {
        self.publish(format!("ride_cancelled_{driver_id}"), json!({ "rideId": ride_id }));
    }

    pub fn driver_location(&self, driver_id: Uuid, latitude: f64, longitude: f64) {
        self.publish(
            format!("driver_location_{driver_id}"),
            json!({ "latitude": latitude, "longitude": longitude }),
        );
    }

    pub fn driver_status(&self, driver_id: Uuid, status: &str) {
        self.publish(format!("driver_status_{driver_id}"), json!({ "status": status }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = EventHub::new(16);
        let mut rx = hub.subscribe();
        let user = Uuid::new_v4();
        let ride = Uuid::new_v4();

        hub.ride_status(user, ride, "picked_up");

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.event, format!("ride_status_{user}"));
        assert_eq!(ev.data["status"], "picked_up");
        assert_eq!(ev.data["rideId"], ride.to_string());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let hub = EventHub::new(4);
        hub.driver_status(Uuid::new_v4(), "approved");
    }

    #[tokio::test]
    async fn stream_filters_by_topic_prefix() {
        let hub = EventHub::new(16);
        let driver = Uuid::new_v4();
        let mut stream = hub.stream(vec![format!("driver_location_{driver}")]);

        hub.new_ride_request(Uuid::new_v4(), "A", "B", 31.0);
        hub.driver_location(driver, 5.6, -0.18);

        let ev = stream.next().await.unwrap();
        assert_eq!(ev.event, format!("driver_location_{driver}"));
        assert_eq!(ev.data["latitude"], 5.6);
    }

    #[test]
    fn empty_topics_match_everything() {
        let ev = LiveEvent {
            event: "ride_cancelled_x".into(),
            data: Value::Null,
        };
        assert!(ev.matches(&[]));
        assert!(ev.matches(&["ride_".into()]));
        assert!(!ev.matches(&["driver_".into()]));
    }
}
