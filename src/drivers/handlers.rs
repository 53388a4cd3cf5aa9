use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{AvailabilityRequest, AvailabilityResponse, EarningsResponse, LocationRequest, ProfileResponse};
use super::repo;
use super::repo_types::{Driver, DriverStatus, EarningsRow};
use crate::{
    auth::extractors::AuthDriver,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    response::MessageResponse,
    rides::{self, dto::DriverRides, fare::{round2, Coordinates}},
    state::AppState,
};

const HISTORY_LIMIT: i64 = 50;

pub fn driver_routes() -> Router<AppState> {
    Router::new()
        .route("/driver/location", post(update_location))
        .route("/driver/availability", post(update_availability))
        .route("/driver/profile", get(profile))
        .route("/driver/earnings", get(earnings))
        .route("/driver/rides", get(ride_history))
}

#[instrument(skip(state))]
pub async fn update_location(
    State(state): State<AppState>,
    AuthDriver(driver_id): AuthDriver,
    ApiJson(body): ApiJson<LocationRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if !Coordinates::new(body.latitude, body.longitude).is_valid() {
        return Err(ApiError::bad_request("Invalid coordinates"));
    }
    if !repo::update_location(&state.db, driver_id, body.latitude, body.longitude).await? {
        return Err(ApiError::not_found("Driver not found"));
    }

    state.events.driver_location(driver_id, body.latitude, body.longitude);
    Ok(Json(MessageResponse::new("Location updated")))
}

#[instrument(skip(state))]
pub async fn update_availability(
    State(state): State<AppState>,
    AuthDriver(driver_id): AuthDriver,
    ApiJson(body): ApiJson<AvailabilityRequest>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let driver = Driver::find_by_id(&state.db, driver_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;

    if body.is_available && driver.status() != DriverStatus::Approved {
        return Err(ApiError::Forbidden("Account not active. Contact admin.".into()));
    }

    repo::set_availability(&state.db, driver_id, body.is_available).await?;
    info!(%driver_id, is_available = body.is_available, "availability changed");

    Ok(Json(AvailabilityResponse {
        message: "Availability updated",
        is_available: body.is_available,
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthDriver(driver_id): AuthDriver,
) -> ApiResult<Json<ProfileResponse>> {
    let driver = Driver::find_by_id(&state.db, driver_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;
    Ok(Json(ProfileResponse { driver }))
}

pub fn summarize_earnings(all_time: EarningsRow, today: EarningsRow) -> EarningsResponse {
    EarningsResponse {
        total_rides: all_time.rides,
        total_earnings: round2(all_time.total.unwrap_or(0.0)),
        avg_fare: round2(all_time.average.unwrap_or(0.0)),
        rides_today: today.rides,
        earnings_today: round2(today.total.unwrap_or(0.0)),
    }
}

#[instrument(skip(state))]
pub async fn earnings(
    State(state): State<AppState>,
    AuthDriver(driver_id): AuthDriver,
) -> ApiResult<Json<EarningsResponse>> {
    let all_time = repo::earnings(&state.db, driver_id, false).await?;
    let today = repo::earnings(&state.db, driver_id, true).await?;
    Ok(Json(summarize_earnings(all_time, today)))
}

#[instrument(skip(state))]
pub async fn ride_history(
    State(state): State<AppState>,
    AuthDriver(driver_id): AuthDriver,
) -> ApiResult<Json<DriverRides>> {
    let rides = rides::repo::list_for_driver(&state.db, driver_id, HISTORY_LIMIT).await?;
    Ok(Json(DriverRides { rides }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earnings_default_to_zero() {
        let summary = summarize_earnings(EarningsRow::default(), EarningsRow::default());
        assert_eq!(
            summary,
            EarningsResponse {
                total_rides: 0,
                total_earnings: 0.0,
                avg_fare: 0.0,
                rides_today: 0,
                earnings_today: 0.0,
            }
        );
    }

    #[test]
    fn earnings_are_rounded_to_cents() {
        let all_time = EarningsRow {
            rides: 3,
            total: Some(100.0),
            average: Some(100.0 / 3.0),
        };
        let today = EarningsRow {
            rides: 1,
            total: Some(31.0),
            average: Some(31.0),
        };
        let summary = summarize_earnings(all_time, today);
        assert_eq!(summary.total_rides, 3);
        assert_eq!(summary.avg_fare, 33.33);
        assert_eq!(summary.earnings_today, 31.0);
    }
}
