use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{RideWithDriver, RideWithRider};

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub pickup_location: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_location: String,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub pickup_latitude: Option<f64>,
    pub pickup_longitude: Option<f64>,
    pub dropoff_latitude: Option<f64>,
    pub dropoff_longitude: Option<f64>,
    pub distance: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub distance: f64,
    pub estimated_fare: f64,
    pub duration_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatedRide {
    pub id: Uuid,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub distance: f64,
    pub estimated_fare: f64,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRideResponse {
    pub message: &'static str,
    pub ride: CreatedRide,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRideRequest {
    pub rating: i16,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RiderRides {
    pub rides: Vec<RideWithDriver>,
}

#[derive(Debug, Serialize)]
pub struct RiderCurrentRide {
    pub ride: Option<RideWithDriver>,
}

#[derive(Debug, Serialize)]
pub struct DriverRides {
    pub rides: Vec<RideWithRider>,
}

#[derive(Debug, Serialize)]
pub struct DriverCurrentRide {
    pub ride: Option<RideWithRider>,
}
