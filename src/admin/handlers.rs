use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    CreateAdminRequest, DriverStatusRequest, DriversResponse, RevenueResponse, RidesResponse, StatusFilter,
    UsersResponse,
};
use super::repo;
use super::repo_types::{Admin, DashboardStats};
use super::services::normalize_role;
use crate::{
    auth::{
        extractors::AuthAdmin,
        password::{check_password, hash_password},
        services::{normalize_email, require_field},
    },
    drivers::repo_types::DriverStatus,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    response::MessageResponse,
    rides::{self, status::RideStatus},
    state::AppState,
};

const RIDES_LIMIT: i64 = 100;
const REVENUE_DAYS: i32 = 7;
const REVENUE_MONTHS: i32 = 6;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:user_id", delete(delete_user))
        .route("/admin/drivers", get(list_drivers))
        .route("/admin/drivers/:driver_id", delete(delete_driver))
        .route("/admin/drivers/:driver_id/status", put(update_driver_status))
        .route("/admin/rides", get(list_rides))
        .route("/admin/analytics/revenue", get(revenue))
        .route("/admin/create", post(create_admin))
}

fn parse_filter<T: std::str::FromStr>(raw: Option<&str>) -> ApiResult<Option<T>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request("Invalid status")),
    }
}

#[instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>, AuthAdmin(_admin): AuthAdmin) -> ApiResult<Json<DashboardStats>> {
    let stats = repo::dashboard_stats(&state.db).await?;
    Ok(Json(stats))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>, AuthAdmin(_admin): AuthAdmin) -> ApiResult<Json<UsersResponse>> {
    let users = repo::list_users(&state.db).await?;
    Ok(Json(UsersResponse { users }))
}

#[instrument(skip(state))]
pub async fn list_drivers(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    ApiQuery(filter): ApiQuery<StatusFilter>,
) -> ApiResult<Json<DriversResponse>> {
    let status = parse_filter::<DriverStatus>(filter.status.as_deref())?;
    let drivers = repo::list_drivers(&state.db, status).await?;
    Ok(Json(DriversResponse { drivers }))
}

#[instrument(skip(state))]
pub async fn update_driver_status(
    State(state): State<AppState>,
    AuthAdmin(admin_id): AuthAdmin,
    ApiPath(driver_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<DriverStatusRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let status = body
        .status
        .parse::<DriverStatus>()
        .ok()
        .filter(|s| s.is_admin_settable())
        .ok_or_else(|| ApiError::bad_request("Invalid status"))?;

    if !repo::set_driver_status(&state.db, driver_id, status).await? {
        return Err(ApiError::not_found("Driver not found"));
    }

    info!(%admin_id, %driver_id, %status, "driver status changed");
    state.events.driver_status(driver_id, status.as_str());
    Ok(Json(MessageResponse::new(format!("Driver {status} successfully"))))
}

#[instrument(skip(state))]
pub async fn list_rides(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    ApiQuery(filter): ApiQuery<StatusFilter>,
) -> ApiResult<Json<RidesResponse>> {
    let status = parse_filter::<RideStatus>(filter.status.as_deref())?;
    let rides = rides::repo::list_overview(&state.db, status, RIDES_LIMIT).await?;
    Ok(Json(RidesResponse { rides }))
}

#[instrument(skip(state))]
pub async fn revenue(State(state): State<AppState>, AuthAdmin(_admin): AuthAdmin) -> ApiResult<Json<RevenueResponse>> {
    let daily = repo::daily_revenue(&state.db, REVENUE_DAYS).await?;
    let monthly = repo::monthly_revenue(&state.db, REVENUE_MONTHS).await?;
    Ok(Json(RevenueResponse { daily, monthly }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthAdmin(admin_id): AuthAdmin,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !repo::delete_user(&state.db, user_id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    warn!(%admin_id, %user_id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[instrument(skip(state))]
pub async fn delete_driver(
    State(state): State<AppState>,
    AuthAdmin(admin_id): AuthAdmin,
    ApiPath(driver_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !repo::delete_driver(&state.db, driver_id).await? {
        return Err(ApiError::not_found("Driver not found"));
    }
    warn!(%admin_id, %driver_id, "driver deleted");
    Ok(Json(MessageResponse::new("Driver deleted successfully")))
}

#[instrument(skip(state, body))]
pub async fn create_admin(
    State(state): State<AppState>,
    AuthAdmin(admin_id): AuthAdmin,
    ApiJson(body): ApiJson<CreateAdminRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let name = require_field(&body.name, "Name")?;
    let email = normalize_email(&body.email)?;
    check_password(&body.password)?;
    let role = normalize_role(body.role.as_deref()).ok_or_else(|| ApiError::bad_request("Invalid role"))?;

    if Admin::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::conflict("Email already exists"));
    }

    let hash = hash_password(&body.password)?;
    let created = Admin::create(&state.db, name, &email, &hash, role).await?;
    info!(%admin_id, new_admin = %created.id, role, "admin created");

    Ok((StatusCode::CREATED, Json(MessageResponse::new("Admin created successfully"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_means_all() {
        assert_eq!(parse_filter::<RideStatus>(None).unwrap(), None);
        assert_eq!(parse_filter::<RideStatus>(Some("")).unwrap(), None);
    }

    #[test]
    fn filter_parses_known_statuses() {
        assert_eq!(
            parse_filter::<RideStatus>(Some("picked_up")).unwrap(),
            Some(RideStatus::PickedUp)
        );
        assert_eq!(
            parse_filter::<DriverStatus>(Some("pending")).unwrap(),
            Some(DriverStatus::Pending)
        );
        assert!(parse_filter::<DriverStatus>(Some("retired")).is_err());
    }
}
