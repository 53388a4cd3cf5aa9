use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::admin::repo_types::Admin;
use crate::auth::repo_types::User;
use crate::drivers::repo_types::Driver;

/// Request body for rider registration.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Request body for driver registration.
#[derive(Debug, Deserialize)]
pub struct RegisterDriverRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub license_number: String,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub vehicle_color: String,
}

/// Request body for login, shared by all account types.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub profile_image: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            profile_image: u.profile_image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicDriver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub vehicle_type: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub rating: f64,
    pub is_available: bool,
    pub status: String,
}

impl From<Driver> for PublicDriver {
    fn from(d: Driver) -> Self {
        Self {
            id: d.id,
            name: d.name,
            email: d.email,
            phone: d.phone,
            vehicle_type: d.vehicle_type,
            vehicle_model: d.vehicle_model,
            vehicle_plate: d.vehicle_plate,
            rating: d.rating,
            is_available: d.is_available,
            status: d.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicAdmin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<Admin> for PublicAdmin {
    fn from(a: Admin) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            role: a.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserAuthResponse {
    pub message: &'static str,
    pub token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct DriverAuthResponse {
    pub message: &'static str,
    pub token: String,
    pub refresh_token: String,
    pub driver: PublicDriver,
}

#[derive(Debug, Serialize)]
pub struct AdminAuthResponse {
    pub message: &'static str,
    pub token: String,
    pub refresh_token: String,
    pub admin: PublicAdmin,
}

#[derive(Debug, Serialize)]
pub struct PendingDriver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct DriverRegisteredResponse {
    pub message: &'static str,
    pub driver: PendingDriver,
}

/// Profile of whoever holds the token, tagged with the account kind under `account`.
#[derive(Debug, Serialize)]
#[serde(tag = "account", rename_all = "lowercase")]
pub enum MeResponse {
    User(PublicUser),
    Driver(PublicDriver),
    Admin(PublicAdmin),
}
