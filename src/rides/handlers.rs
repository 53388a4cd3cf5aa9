use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    CreateRideRequest, CreateRideResponse, CreatedRide, DriverCurrentRide, DriverRides, EstimateRequest,
    EstimateResponse, RateRideRequest, RiderCurrentRide, RiderRides, UpdateStatusRequest,
};
use super::fare::{self, Coordinates};
use super::repo;
use super::services::{self, Booking};
use super::status::RideStatus;
use crate::{
    auth::extractors::{AuthDriver, AuthUser},
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    response::MessageResponse,
    state::AppState,
};

const AVAILABLE_LIMIT: i64 = 20;

pub fn rider_routes() -> Router<AppState> {
    Router::new()
        .route("/rides/estimate", post(estimate))
        .route("/rides/create", post(create_ride))
        .route("/rides/user/history", get(user_history))
        .route("/rides/user/current", get(user_current))
        .route("/rides/cancel/:ride_id", put(cancel_ride))
        .route("/rides/rate/:ride_id", post(rate_ride))
}

pub fn driver_routes() -> Router<AppState> {
    Router::new()
        .route("/rides/available", get(available_rides))
        .route("/rides/accept/:ride_id", post(accept_ride))
        .route("/rides/status/:ride_id", put(update_status))
        .route("/rides/driver/current", get(driver_current))
}

#[instrument(skip(state))]
pub async fn estimate(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiJson(body): ApiJson<EstimateRequest>,
) -> ApiResult<Json<EstimateResponse>> {
    let distance = match (
        body.pickup_latitude,
        body.pickup_longitude,
        body.dropoff_latitude,
        body.dropoff_longitude,
    ) {
        (Some(plat), Some(plon), Some(dlat), Some(dlon)) => {
            let pickup = Coordinates::new(plat, plon);
            let dropoff = Coordinates::new(dlat, dlon);
            if !pickup.is_valid() || !dropoff.is_valid() {
                return Err(ApiError::bad_request("Invalid coordinates"));
            }
            services::resolve_distance(pickup, dropoff, body.distance)
        }
        _ => body
            .distance
            .ok_or_else(|| ApiError::bad_request("Coordinates or distance required"))?,
    };

    let estimated_fare = fare::calculate_fare(&state.config.fare, distance)
        .ok_or_else(|| ApiError::bad_request("Invalid distance"))?;

    Ok(Json(EstimateResponse {
        distance,
        estimated_fare,
        duration_minutes: fare::estimate_minutes(distance),
    }))
}

#[instrument(skip(state, body))]
pub async fn create_ride(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateRideRequest>,
) -> ApiResult<(StatusCode, Json<CreateRideResponse>)> {
    let booking = Booking {
        pickup_location: body.pickup_location,
        pickup: Coordinates::new(body.pickup_latitude, body.pickup_longitude),
        dropoff_location: body.dropoff_location,
        dropoff: Coordinates::new(body.dropoff_latitude, body.dropoff_longitude),
        distance: body.distance,
    };
    let ride = services::create_ride(&state, user_id, booking).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateRideResponse {
            message: "Ride requested successfully",
            ride: CreatedRide {
                id: ride.id,
                pickup_location: ride.pickup_location,
                dropoff_location: ride.dropoff_location,
                distance: ride.distance,
                estimated_fare: ride.estimated_fare,
                status: ride.status,
            },
        }),
    ))
}

#[instrument(skip(state))]
pub async fn user_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<RiderRides>> {
    let rides = repo::list_for_user(&state.db, user_id).await?;
    Ok(Json(RiderRides { rides }))
}

#[instrument(skip(state))]
pub async fn user_current(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<RiderCurrentRide>> {
    let ride = repo::current_for_user(&state.db, user_id).await?;
    Ok(Json(RiderCurrentRide { ride }))
}

#[instrument(skip(state))]
pub async fn cancel_ride(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(ride_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    services::cancel_ride(&state, user_id, ride_id).await?;
    Ok(Json(MessageResponse::new("Ride cancelled successfully")))
}

#[instrument(skip(state, body))]
pub async fn rate_ride(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(ride_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RateRideRequest>,
) -> ApiResult<Json<MessageResponse>> {
    services::rate_ride(&state, user_id, ride_id, body.rating, body.feedback.as_deref()).await?;
    Ok(Json(MessageResponse::new("Rating submitted successfully")))
}

#[instrument(skip(state))]
pub async fn available_rides(
    State(state): State<AppState>,
    AuthDriver(_driver_id): AuthDriver,
) -> ApiResult<Json<DriverRides>> {
    let rides = repo::list_pending(&state.db, AVAILABLE_LIMIT).await?;
    Ok(Json(DriverRides { rides }))
}

#[instrument(skip(state))]
pub async fn accept_ride(
    State(state): State<AppState>,
    AuthDriver(driver_id): AuthDriver,
    ApiPath(ride_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    services::accept_ride(&state, driver_id, ride_id).await?;
    Ok(Json(MessageResponse::new("Ride accepted successfully")))
}

#[instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    AuthDriver(driver_id): AuthDriver,
    ApiPath(ride_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let next: RideStatus = body
        .status
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status"))?;
    services::advance_ride(&state, driver_id, ride_id, next).await?;
    Ok(Json(MessageResponse::new("Ride status updated")))
}

#[instrument(skip(state))]
pub async fn driver_current(
    State(state): State<AppState>,
    AuthDriver(driver_id): AuthDriver,
) -> ApiResult<Json<DriverCurrentRide>> {
    let ride = repo::current_for_driver(&state.db, driver_id).await?;
    Ok(Json(DriverCurrentRide { ride }))
}
