use serde::{Deserialize, Serialize};

use super::repo_types::{DailyRevenue, DriverSummary, MonthlyRevenue, UserSummary};
use crate::rides::repo_types::RideOverview;

#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DriverStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct DriversResponse {
    pub drivers: Vec<DriverSummary>,
}

#[derive(Debug, Serialize)]
pub struct RidesResponse {
    pub rides: Vec<RideOverview>,
}

#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    pub daily: Vec<DailyRevenue>,
    pub monthly: Vec<MonthlyRevenue>,
}
