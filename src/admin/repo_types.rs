use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Rider listing row with ride count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub total_rides: i64,
}

/// Driver listing row with completed ride count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DriverSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub vehicle_color: String,
    pub status: String,
    pub is_available: bool,
    pub rating: f64,
    pub total_rides: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub completed_rides: i64,
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct DashboardStats {
    pub users: i64,
    pub drivers: i64,
    pub pending_drivers: i64,
    pub active_drivers: i64,
    pub total_rides: i64,
    pub completed_rides: i64,
    pub active_rides: i64,
    pub total_revenue: f64,
    pub today_revenue: f64,
    pub today_rides: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyRevenue {
    pub date: String, // YYYY-MM-DD
    pub rides: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthlyRevenue {
    pub month: String, // YYYY-MM
    pub rides: i64,
    pub revenue: f64,
}
