use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use uuid::Uuid;

use super::claims::Role;
use crate::{
    admin::repo_types::Admin,
    auth::repo_types::User,
    drivers::repo_types::{Driver, DriverStatus},
    error::{ApiError, ApiResult},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed, lowercased, validated email.
pub fn normalize_email(raw: &str) -> ApiResult<String> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email"));
    }
    Ok(email)
}

pub fn require_field<'a>(value: &'a str, label: &str) -> ApiResult<&'a str> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ApiError::bad_request(format!("{label} is required")));
    }
    Ok(v)
}

/// Only approved drivers may hold tokens.
pub fn ensure_driver_active(status: DriverStatus) -> ApiResult<()> {
    match status {
        DriverStatus::Approved => Ok(()),
        DriverStatus::Pending => Err(ApiError::Forbidden("Account pending approval".into())),
        DriverStatus::Rejected | DriverStatus::Suspended => {
            Err(ApiError::Forbidden("Account not active. Contact admin.".into()))
        }
    }
}

/// The account behind a refresh token must still exist, and a driver must still be approved.
pub async fn ensure_principal_active(db: &PgPool, id: Uuid, role: Role) -> ApiResult<()> {
    let exists = match role {
        Role::User => User::find_by_id(db, id).await?.is_some(),
        Role::Admin => Admin::find_by_id(db, id).await?.is_some(),
        Role::Driver => match Driver::find_by_id(db, id).await? {
            Some(driver) => return ensure_driver_active(driver.status()),
            None => false,
        },
    };
    if !exists {
        return Err(ApiError::Unauthorized("Account not found".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Kofi@Example.COM ").unwrap(), "kofi@example.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a@b").is_err());
    }

    #[test]
    fn only_approved_drivers_pass_the_gate() {
        assert!(ensure_driver_active(DriverStatus::Approved).is_ok());

        let pending = ensure_driver_active(DriverStatus::Pending).unwrap_err();
        assert_eq!(pending.status(), axum::http::StatusCode::FORBIDDEN);
        assert_eq!(pending.to_string(), "Account pending approval");

        for status in [DriverStatus::Rejected, DriverStatus::Suspended] {
            let err = ensure_driver_active(status).unwrap_err();
            assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
            assert_eq!(err.to_string(), "Account not active. Contact admin.");
        }
    }

    #[test]
    fn required_fields_are_trimmed() {
        assert_eq!(require_field("  Ama ", "Name").unwrap(), "Ama");
        let err = require_field("   ", "Phone").unwrap_err();
        assert_eq!(err.to_string(), "Phone is required");
    }
}
