use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::status::RideStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ride {
    pub id: Uuid,
    pub user_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_location: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_location: String,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub distance: f64,
    pub estimated_fare: f64,
    pub final_fare: Option<f64>,
    pub status: String,
    pub rating: Option<i16>,
    pub feedback: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Ride {
    /// Stored status. The table CHECK constraint keeps unknown values out.
    pub fn status(&self) -> RideStatus {
        self.status.parse().unwrap_or(RideStatus::Pending)
    }
}

/// Ride as seen by its rider: the assigned driver and vehicle, if any.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RideWithDriver {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ride: Ride,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_plate: Option<String>,
    pub driver_rating: Option<f64>,
    pub driver_latitude: Option<f64>,
    pub driver_longitude: Option<f64>,
}

/// Ride as seen by a driver: who is riding.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RideWithRider {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ride: Ride,
    pub user_name: String,
    pub user_phone: String,
}

/// Ride in the admin listing, both parties attached.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RideOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ride: Ride,
    pub user_name: String,
    pub user_phone: String,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
}

pub struct NewRide<'a> {
    pub user_id: Uuid,
    pub pickup_location: &'a str,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_location: &'a str,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub distance: f64,
    pub estimated_fare: f64,
}
