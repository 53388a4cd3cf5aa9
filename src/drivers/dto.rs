use serde::{Deserialize, Serialize};

use super::repo_types::Driver;

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub message: &'static str,
    pub is_available: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub driver: Driver,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsResponse {
    pub total_rides: i64,
    pub total_earnings: f64,
    pub avg_fare: f64,
    pub rides_today: i64,
    pub earnings_today: f64,
}
