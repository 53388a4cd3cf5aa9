use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Admin-controlled account state of a driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl DriverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::Pending => "pending",
            DriverStatus::Approved => "approved",
            DriverStatus::Rejected => "rejected",
            DriverStatus::Suspended => "suspended",
        }
    }

    /// Statuses an admin may set explicitly.
    pub fn is_admin_settable(self) -> bool {
        !matches!(self, DriverStatus::Pending)
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DriverStatus::Pending),
            "approved" => Ok(DriverStatus::Approved),
            "rejected" => Ok(DriverStatus::Rejected),
            "suspended" => Ok(DriverStatus::Suspended),
            other => Err(format!("unknown driver status: {other}")),
        }
    }
}

/// Driver record in the database. `status` is kept as stored text.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub license_number: String,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub vehicle_color: String,
    pub status: String,
    pub is_available: bool,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub rating: f64,
    pub total_rides: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Driver {
    pub fn status(&self) -> DriverStatus {
        self.status.parse().unwrap_or(DriverStatus::Pending)
    }
}

/// Fields collected at driver sign-up.
#[derive(Debug, Clone)]
pub struct NewDriver<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub license_number: &'a str,
    pub vehicle_type: &'a str,
    pub vehicle_model: &'a str,
    pub vehicle_plate: &'a str,
    pub vehicle_color: &'a str,
}

#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct EarningsRow {
    pub rides: i64,
    pub total: Option<f64>,
    pub average: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_status_parses_and_displays() {
        for s in [
            DriverStatus::Pending,
            DriverStatus::Approved,
            DriverStatus::Rejected,
            DriverStatus::Suspended,
        ] {
            assert_eq!(s.to_string().parse::<DriverStatus>().unwrap(), s);
        }
        assert!("banned".parse::<DriverStatus>().is_err());
    }

    #[test]
    fn pending_is_not_admin_settable() {
        assert!(!DriverStatus::Pending.is_admin_settable());
        assert!(DriverStatus::Suspended.is_admin_settable());
    }
}
