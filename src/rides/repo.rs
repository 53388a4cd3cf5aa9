use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{NewRide, Ride, RideOverview, RideWithDriver, RideWithRider};
use super::status::RideStatus;

const RIDE_COLUMNS: &str = "r.id, r.user_id, r.driver_id, r.pickup_location, r.pickup_latitude, \
     r.pickup_longitude, r.dropoff_location, r.dropoff_latitude, r.dropoff_longitude, r.distance, \
     r.estimated_fare, r.final_fare, r.status, r.rating, r.feedback, r.created_at, r.updated_at";

const RETURNING_RIDE: &str = "RETURNING id, user_id, driver_id, pickup_location, pickup_latitude, \
     pickup_longitude, dropoff_location, dropoff_latitude, dropoff_longitude, distance, \
     estimated_fare, final_fare, status, rating, feedback, created_at, updated_at";

pub async fn insert(db: &PgPool, new: &NewRide<'_>) -> anyhow::Result<Ride> {
    let ride = sqlx::query_as::<_, Ride>(&format!(
        r#"
        INSERT INTO rides (id, user_id, pickup_location, pickup_latitude, pickup_longitude,
                           dropoff_location, dropoff_latitude, dropoff_longitude,
                           distance, estimated_fare, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
        {RETURNING_RIDE}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.pickup_location)
    .bind(new.pickup_latitude)
    .bind(new.pickup_longitude)
    .bind(new.dropoff_location)
    .bind(new.dropoff_latitude)
    .bind(new.dropoff_longitude)
    .bind(new.distance)
    .bind(new.estimated_fare)
    .fetch_one(db)
    .await
    .context("insert ride")?;
    Ok(ride)
}

pub async fn user_has_active_ride(db: &PgPool, user_id: Uuid) -> anyhow::Result<bool> {
    let active: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM rides
             WHERE user_id = $1 AND status IN ('pending', 'accepted', 'picked_up')
        )
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(active)
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<RideWithDriver>> {
    let rows = sqlx::query_as::<_, RideWithDriver>(&format!(
        r#"
        SELECT {RIDE_COLUMNS},
               d.name AS driver_name, d.phone AS driver_phone,
               d.vehicle_model, d.vehicle_plate, d.rating AS driver_rating,
               d.current_latitude AS driver_latitude, d.current_longitude AS driver_longitude
          FROM rides r
          LEFT JOIN drivers d ON r.driver_id = d.id
         WHERE r.user_id = $1
         ORDER BY r.created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list rides for user")?;
    Ok(rows)
}

pub async fn current_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<RideWithDriver>> {
    let row = sqlx::query_as::<_, RideWithDriver>(&format!(
        r#"
        SELECT {RIDE_COLUMNS},
               d.name AS driver_name, d.phone AS driver_phone,
               d.vehicle_model, d.vehicle_plate, d.rating AS driver_rating,
               d.current_latitude AS driver_latitude, d.current_longitude AS driver_longitude
          FROM rides r
          LEFT JOIN drivers d ON r.driver_id = d.id
         WHERE r.user_id = $1 AND r.status IN ('pending', 'accepted', 'picked_up')
         ORDER BY r.created_at DESC
         LIMIT 1
        "#
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("current ride for user")?;
    Ok(row)
}

pub async fn list_pending(db: &PgPool, limit: i64) -> anyhow::Result<Vec<RideWithRider>> {
    let rows = sqlx::query_as::<_, RideWithRider>(&format!(
        r#"
        SELECT {RIDE_COLUMNS}, u.name AS user_name, u.phone AS user_phone
          FROM rides r
          JOIN users u ON r.user_id = u.id
         WHERE r.status = 'pending'
         ORDER BY r.created_at DESC
         LIMIT $1
        "#
    ))
    .bind(limit)
    .fetch_all(db)
    .await
    .context("list pending rides")?;
    Ok(rows)
}

pub async fn current_for_driver(db: &PgPool, driver_id: Uuid) -> anyhow::Result<Option<RideWithRider>> {
    let row = sqlx::query_as::<_, RideWithRider>(&format!(
        r#"
        SELECT {RIDE_COLUMNS}, u.name AS user_name, u.phone AS user_phone
          FROM rides r
          JOIN users u ON r.user_id = u.id
         WHERE r.driver_id = $1 AND r.status IN ('accepted', 'picked_up')
         ORDER BY r.created_at DESC
         LIMIT 1
        "#
    ))
    .bind(driver_id)
    .fetch_optional(db)
    .await
    .context("current ride for driver")?;
    Ok(row)
}

pub async fn list_for_driver(db: &PgPool, driver_id: Uuid, limit: i64) -> anyhow::Result<Vec<RideWithRider>> {
    let rows = sqlx::query_as::<_, RideWithRider>(&format!(
        r#"
        SELECT {RIDE_COLUMNS}, u.name AS user_name, u.phone AS user_phone
          FROM rides r
          JOIN users u ON r.user_id = u.id
         WHERE r.driver_id = $1
         ORDER BY r.created_at DESC
         LIMIT $2
        "#
    ))
    .bind(driver_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("list rides for driver")?;
    Ok(rows)
}

pub async fn list_overview(
    db: &PgPool,
    status: Option<RideStatus>,
    limit: i64,
) -> anyhow::Result<Vec<RideOverview>> {
    let rows = sqlx::query_as::<_, RideOverview>(&format!(
        r#"
        SELECT {RIDE_COLUMNS},
               u.name AS user_name, u.phone AS user_phone,
               d.name AS driver_name, d.phone AS driver_phone
          FROM rides r
          JOIN users u ON r.user_id = u.id
          LEFT JOIN drivers d ON r.driver_id = d.id
         WHERE ($1::text IS NULL OR r.status = $1)
         ORDER BY r.created_at DESC
         LIMIT $2
        "#
    ))
    .bind(status.map(RideStatus::as_str))
    .bind(limit)
    .fetch_all(db)
    .await
    .context("list rides overview")?;
    Ok(rows)
}

// ---- Transactional lifecycle steps ----

/// Row-locks a ride. `user_id`/`driver_id` narrow the match to the owner.
pub async fn lock_tx(
    tx: &mut Transaction<'_, Postgres>,
    ride_id: Uuid,
    user_id: Option<Uuid>,
    driver_id: Option<Uuid>,
) -> anyhow::Result<Option<Ride>> {
    let ride = sqlx::query_as::<_, Ride>(&format!(
        r#"
        SELECT {RIDE_COLUMNS}
          FROM rides r
         WHERE r.id = $1
           AND ($2::uuid IS NULL OR r.user_id = $2)
           AND ($3::uuid IS NULL OR r.driver_id = $3)
           FOR UPDATE
        "#
    ))
    .bind(ride_id)
    .bind(user_id)
    .bind(driver_id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock ride")?;
    Ok(ride)
}

pub async fn driver_has_active_ride_tx(
    tx: &mut Transaction<'_, Postgres>,
    driver_id: Uuid,
) -> anyhow::Result<bool> {
    let active: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM rides
             WHERE driver_id = $1 AND status IN ('accepted', 'picked_up')
        )
        "#,
    )
    .bind(driver_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(active)
}

/// Compare-and-set on the status column. Returns the updated row, or `None`
/// when the ride was no longer in `from`.
pub async fn transition_tx(
    tx: &mut Transaction<'_, Postgres>,
    ride_id: Uuid,
    from: RideStatus,
    to: RideStatus,
) -> anyhow::Result<Option<Ride>> {
    let ride = sqlx::query_as::<_, Ride>(&format!(
        r#"
        UPDATE rides
           SET status = $3,
               final_fare = CASE WHEN $3 = 'completed' THEN estimated_fare ELSE final_fare END,
               updated_at = now()
         WHERE id = $1 AND status = $2
        {RETURNING_RIDE}
        "#
    ))
    .bind(ride_id)
    .bind(from.as_str())
    .bind(to.as_str())
    .fetch_optional(&mut **tx)
    .await
    .context("transition ride")?;
    Ok(ride)
}

pub async fn assign_driver_tx(
    tx: &mut Transaction<'_, Postgres>,
    ride_id: Uuid,
    driver_id: Uuid,
) -> anyhow::Result<Option<Ride>> {
    let ride = sqlx::query_as::<_, Ride>(&format!(
        r#"
        UPDATE rides
           SET driver_id = $2, status = 'accepted', updated_at = now()
         WHERE id = $1 AND status = 'pending'
        {RETURNING_RIDE}
        "#
    ))
    .bind(ride_id)
    .bind(driver_id)
    .fetch_optional(&mut **tx)
    .await
    .context("assign driver")?;
    Ok(ride)
}

pub async fn record_earning_tx(
    tx: &mut Transaction<'_, Postgres>,
    ride_id: Uuid,
    amount: f64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (id, ride_id, amount, transaction_type, description)
        VALUES ($1, $2, $3, 'driver_earning', 'Driver earning for completed ride')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(ride_id)
    .bind(amount)
    .execute(&mut **tx)
    .await
    .context("insert earning transaction")?;
    Ok(())
}

pub async fn set_rating_tx(
    tx: &mut Transaction<'_, Postgres>,
    ride_id: Uuid,
    rating: i16,
    feedback: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(r#"UPDATE rides SET rating = $2, feedback = $3, updated_at = now() WHERE id = $1"#)
        .bind(ride_id)
        .bind(rating)
        .bind(feedback)
        .execute(&mut **tx)
        .await
        .context("rate ride")?;
    Ok(())
}
