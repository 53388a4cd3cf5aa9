//! Ride lifecycle. Every state change runs in one transaction with the ride row
//! locked, so concurrent accept/cancel/complete requests serialize and the
//! loser sees the winner's status.

use tracing::{info, warn};
use uuid::Uuid;

use super::fare::{self, Coordinates};
use super::repo;
use super::repo_types::{NewRide, Ride};
use super::status::RideStatus;
use crate::{
    drivers::{self, repo_types::DriverStatus},
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Validated booking request.
#[derive(Debug, Clone)]
pub struct Booking {
    pub pickup_location: String,
    pub pickup: Coordinates,
    pub dropoff_location: String,
    pub dropoff: Coordinates,
    pub distance: Option<f64>,
}

/// Distance the rider supplied, or the straight-line distance when absent.
pub fn resolve_distance(pickup: Coordinates, dropoff: Coordinates, supplied: Option<f64>) -> f64 {
    match supplied {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => fare::round2(fare::haversine_km(pickup, dropoff)),
    }
}

pub fn validate_booking(b: &Booking) -> ApiResult<()> {
    if b.pickup_location.trim().is_empty() || b.dropoff_location.trim().is_empty() {
        return Err(ApiError::bad_request("Pickup and dropoff locations are required"));
    }
    if !b.pickup.is_valid() || !b.dropoff.is_valid() {
        return Err(ApiError::bad_request("Invalid coordinates"));
    }
    if let Some(d) = b.distance {
        if !d.is_finite() || d < 0.0 {
            return Err(ApiError::bad_request("Invalid distance"));
        }
    }
    Ok(())
}

/// A ride another driver already holds is a lost race; a finished one is simply gone.
pub fn check_acceptable(status: RideStatus) -> ApiResult<()> {
    match status {
        RideStatus::Pending => Ok(()),
        RideStatus::Accepted | RideStatus::PickedUp => Err(ApiError::conflict("Ride no longer available")),
        RideStatus::Completed | RideStatus::Cancelled => Err(ApiError::bad_request("Ride no longer available")),
    }
}

/// Status changes a driver may request for a ride it holds.
pub fn check_driver_move(current: RideStatus, next: RideStatus) -> ApiResult<()> {
    if next.driver_settable() && current.can_transition_to(next) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Cannot change ride from {current} to {next}")))
    }
}

pub async fn create_ride(st: &AppState, user_id: Uuid, booking: Booking) -> ApiResult<Ride> {
    validate_booking(&booking)?;

    let distance = resolve_distance(booking.pickup, booking.dropoff, booking.distance);
    let estimated_fare = fare::calculate_fare(&st.config.fare, distance)
        .ok_or_else(|| ApiError::bad_request("Invalid distance"))?;

    if repo::user_has_active_ride(&st.db, user_id).await? {
        return Err(ApiError::conflict("You already have an active ride"));
    }

    let ride = repo::insert(
        &st.db,
        &NewRide {
            user_id,
            pickup_location: booking.pickup_location.trim(),
            pickup_latitude: booking.pickup.latitude,
            pickup_longitude: booking.pickup.longitude,
            dropoff_location: booking.dropoff_location.trim(),
            dropoff_latitude: booking.dropoff.latitude,
            dropoff_longitude: booking.dropoff.longitude,
            distance,
            estimated_fare,
        },
    )
    .await?;

    info!(ride_id = %ride.id, %user_id, distance, estimated_fare, "ride requested");
    st.events
        .new_ride_request(ride.id, &ride.pickup_location, &ride.dropoff_location, ride.estimated_fare);
    Ok(ride)
}

pub async fn accept_ride(st: &AppState, driver_id: Uuid, ride_id: Uuid) -> ApiResult<Ride> {
    let mut tx = st.db.begin().await?;

    let ride = repo::lock_tx(&mut tx, ride_id, None, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Ride not found"))?;
    check_acceptable(ride.status())?;

    let driver = drivers::repo::lock_tx(&mut tx, driver_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;
    if driver.status() != DriverStatus::Approved {
        return Err(ApiError::Forbidden("Account not active. Contact admin.".into()));
    }
    if repo::driver_has_active_ride_tx(&mut tx, driver_id).await? {
        return Err(ApiError::conflict("You already have an active ride"));
    }

    let ride = repo::assign_driver_tx(&mut tx, ride_id, driver_id)
        .await?
        .ok_or_else(|| ApiError::conflict("Ride no longer available"))?;
    drivers::repo::set_available_tx(&mut tx, driver_id, false).await?;
    tx.commit().await?;

    info!(%ride_id, %driver_id, "ride accepted");
    st.events.ride_accepted(ride.user_id, ride.id, driver_id);
    Ok(ride)
}

/// Driver-initiated progress: picked_up, completed, or cancelled.
pub async fn advance_ride(st: &AppState, driver_id: Uuid, ride_id: Uuid, next: RideStatus) -> ApiResult<Ride> {
    let mut tx = st.db.begin().await?;

    let ride = repo::lock_tx(&mut tx, ride_id, None, Some(driver_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Ride not found or unauthorized"))?;
    let current = ride.status();
    check_driver_move(current, next)?;

    let ride = repo::transition_tx(&mut tx, ride_id, current, next)
        .await?
        .ok_or_else(|| ApiError::conflict("Ride status changed concurrently"))?;

    match next {
        RideStatus::Completed => {
            let amount = ride.final_fare.unwrap_or(ride.estimated_fare);
            drivers::repo::record_completed_ride_tx(&mut tx, driver_id).await?;
            repo::record_earning_tx(&mut tx, ride_id, amount).await?;
            info!(%ride_id, %driver_id, amount, "ride completed");
        }
        RideStatus::Cancelled => {
            drivers::repo::set_available_tx(&mut tx, driver_id, true).await?;
            warn!(%ride_id, %driver_id, "ride cancelled by driver");
        }
        _ => info!(%ride_id, %driver_id, status = %next, "ride status updated"),
    }
    tx.commit().await?;

    st.events.ride_status(ride.user_id, ride.id, next.as_str());
    Ok(ride)
}

pub async fn cancel_ride(st: &AppState, user_id: Uuid, ride_id: Uuid) -> ApiResult<Ride> {
    let mut tx = st.db.begin().await?;

    let ride = repo::lock_tx(&mut tx, ride_id, Some(user_id), None)
        .await?
        .ok_or_else(|| ApiError::not_found("Ride not found"))?;
    let current = ride.status();
    if !current.can_transition_to(RideStatus::Cancelled) {
        return Err(ApiError::bad_request(format!("Cannot cancel {current} ride")));
    }

    let ride = repo::transition_tx(&mut tx, ride_id, current, RideStatus::Cancelled)
        .await?
        .ok_or_else(|| ApiError::conflict("Ride status changed concurrently"))?;
    if let Some(driver_id) = ride.driver_id {
        drivers::repo::set_available_tx(&mut tx, driver_id, true).await?;
    }
    tx.commit().await?;

    info!(%ride_id, %user_id, "ride cancelled by rider");
    if let Some(driver_id) = ride.driver_id {
        st.events.ride_cancelled(driver_id, ride.id);
    }
    Ok(ride)
}

pub fn validate_rating(rating: i16) -> ApiResult<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Rating must be between 1 and 5"))
    }
}

pub async fn rate_ride(
    st: &AppState,
    user_id: Uuid,
    ride_id: Uuid,
    rating: i16,
    feedback: Option<&str>,
) -> ApiResult<()> {
    validate_rating(rating)?;
    let mut tx = st.db.begin().await?;

    let ride = repo::lock_tx(&mut tx, ride_id, Some(user_id), None)
        .await?
        .filter(|r| r.status() == RideStatus::Completed)
        .ok_or_else(|| ApiError::not_found("Ride not found or not completed"))?;

    repo::set_rating_tx(&mut tx, ride_id, rating, feedback.map(str::trim).filter(|f| !f.is_empty())).await?;
    if let Some(driver_id) = ride.driver_id {
        let new_rating = drivers::repo::refresh_rating_tx(&mut tx, driver_id).await?;
        info!(%ride_id, %driver_id, rating, new_rating, "ride rated");
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::repo_types::Driver;
    use crate::test_utils::{create_test_driver, create_test_rider, test_booking};
    use axum::http::StatusCode;
    use sqlx::PgPool;

    fn booking() -> Booking {
        Booking {
            pickup_location: "Circle".into(),
            pickup: Coordinates::new(5.5700, -0.2100),
            dropoff_location: "Airport".into(),
            dropoff: Coordinates::new(5.6050, -0.1700),
            distance: None,
        }
    }

    #[test]
    fn supplied_distance_wins_when_positive() {
        let b = booking();
        assert_eq!(resolve_distance(b.pickup, b.dropoff, Some(7.5)), 7.5);
    }

    #[test]
    fn missing_or_zero_distance_is_computed() {
        let b = booking();
        let computed = resolve_distance(b.pickup, b.dropoff, None);
        assert!(computed > 5.0 && computed < 6.5, "got {computed}");
        assert_eq!(resolve_distance(b.pickup, b.dropoff, Some(0.0)), computed);
    }

    #[test]
    fn booking_validation() {
        assert!(validate_booking(&booking()).is_ok());

        let mut b = booking();
        b.pickup_location = "  ".into();
        assert!(validate_booking(&b).is_err());

        let mut b = booking();
        b.dropoff = Coordinates::new(120.0, 0.0);
        assert!(validate_booking(&b).is_err());

        let mut b = booking();
        b.distance = Some(-3.0);
        assert!(validate_booking(&b).is_err());
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn drivers_cannot_rewind_or_skip_steps() {
        use RideStatus::*;
        assert!(check_driver_move(Accepted, PickedUp).is_ok());
        assert!(check_driver_move(PickedUp, Completed).is_ok());
        assert!(check_driver_move(Accepted, Cancelled).is_ok());

        for (from, to) in [
            (Accepted, Pending),
            (Accepted, Accepted),
            (PickedUp, Accepted),
            (Accepted, Completed),
            (Completed, Cancelled),
            (Cancelled, PickedUp),
        ] {
            let err = check_driver_move(from, to).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{from} -> {to}");
        }
        assert_eq!(
            check_driver_move(PickedUp, Accepted).unwrap_err().to_string(),
            "Cannot change ride from picked_up to accepted"
        );
    }

    #[test]
    fn taken_ride_is_a_conflict_finished_ride_is_not() {
        assert!(check_acceptable(RideStatus::Pending).is_ok());
        assert_eq!(check_acceptable(RideStatus::Accepted).unwrap_err().status(), StatusCode::CONFLICT);
        assert_eq!(check_acceptable(RideStatus::PickedUp).unwrap_err().status(), StatusCode::CONFLICT);
        assert_eq!(check_acceptable(RideStatus::Cancelled).unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert_eq!(check_acceptable(RideStatus::Completed).unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn second_driver_to_accept_gets_conflict(pool: PgPool) {
        let st = AppState::for_pool(pool.clone());
        let rider = create_test_rider(&pool).await;
        let first = create_test_driver(&pool, DriverStatus::Approved).await;
        let second = create_test_driver(&pool, DriverStatus::Approved).await;

        let ride = create_ride(&st, rider.id, test_booking()).await.unwrap();
        let accepted = accept_ride(&st, first.id, ride.id).await.unwrap();
        assert_eq!(accepted.status(), RideStatus::Accepted);
        assert_eq!(accepted.driver_id, Some(first.id));

        let err = accept_ride(&st, second.id, ride.id).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let first = Driver::find_by_id(&pool, first.id).await.unwrap().unwrap();
        assert!(!first.is_available);
    }

    #[sqlx::test]
    async fn pending_driver_cannot_accept(pool: PgPool) {
        let st = AppState::for_pool(pool.clone());
        let rider = create_test_rider(&pool).await;
        let driver = create_test_driver(&pool, DriverStatus::Pending).await;

        let ride = create_ride(&st, rider.id, test_booking()).await.unwrap();
        let err = accept_ride(&st, driver.id, ride.id).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn completion_books_fare_rides_and_earning_together(pool: PgPool) {
        let st = AppState::for_pool(pool.clone());
        let rider = create_test_rider(&pool).await;
        let driver = create_test_driver(&pool, DriverStatus::Approved).await;

        let ride = create_ride(&st, rider.id, test_booking()).await.unwrap();
        assert_eq!(ride.estimated_fare, 63.0);
        accept_ride(&st, driver.id, ride.id).await.unwrap();
        advance_ride(&st, driver.id, ride.id, RideStatus::PickedUp).await.unwrap();
        let done = advance_ride(&st, driver.id, ride.id, RideStatus::Completed).await.unwrap();

        assert_eq!(done.status(), RideStatus::Completed);
        assert_eq!(done.final_fare, Some(63.0));

        let driver = Driver::find_by_id(&pool, driver.id).await.unwrap().unwrap();
        assert_eq!(driver.total_rides, 1);
        assert!(driver.is_available);

        let (count, amount): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(amount), 0)::float8 FROM transactions \
             WHERE ride_id = $1 AND transaction_type = 'driver_earning'",
        )
        .bind(ride.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(amount, 63.0);
    }

    #[sqlx::test]
    async fn status_endpoint_rejects_backward_moves(pool: PgPool) {
        let st = AppState::for_pool(pool.clone());
        let rider = create_test_rider(&pool).await;
        let driver = create_test_driver(&pool, DriverStatus::Approved).await;

        let ride = create_ride(&st, rider.id, test_booking()).await.unwrap();
        accept_ride(&st, driver.id, ride.id).await.unwrap();

        for next in [RideStatus::Pending, RideStatus::Accepted, RideStatus::Completed] {
            let err = advance_ride(&st, driver.id, ride.id, next).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{next}");
        }

        let stranger = create_test_driver(&pool, DriverStatus::Approved).await;
        let err = advance_ride(&st, stranger.id, ride.id, RideStatus::PickedUp).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn rider_cancel_frees_driver_once(pool: PgPool) {
        let st = AppState::for_pool(pool.clone());
        let rider = create_test_rider(&pool).await;
        let driver = create_test_driver(&pool, DriverStatus::Approved).await;

        let ride = create_ride(&st, rider.id, test_booking()).await.unwrap();
        accept_ride(&st, driver.id, ride.id).await.unwrap();

        let cancelled = cancel_ride(&st, rider.id, ride.id).await.unwrap();
        assert_eq!(cancelled.status(), RideStatus::Cancelled);
        let driver = Driver::find_by_id(&pool, driver.id).await.unwrap().unwrap();
        assert!(driver.is_available);

        let err = cancel_ride(&st, rider.id, ride.id).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Cannot cancel cancelled ride");

        // a new booking is allowed once the old one is over
        assert!(create_ride(&st, rider.id, test_booking()).await.is_ok());
    }
}
