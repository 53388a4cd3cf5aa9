use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Driver, EarningsRow, NewDriver};

const DRIVER_COLUMNS: &str = "id, name, email, phone, password_hash, license_number, vehicle_type, \
     vehicle_model, vehicle_plate, vehicle_color, status, is_available, current_latitude, \
     current_longitude, rating, total_rides, created_at";

impl Driver {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(driver)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(driver)
    }

    /// True when email, phone, license number or plate already belongs to a driver.
    pub async fn identity_taken(db: &PgPool, new: &NewDriver<'_>) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM drivers
                 WHERE email = $1 OR phone = $2 OR license_number = $3 OR vehicle_plate = $4
            )
            "#,
        )
        .bind(new.email)
        .bind(new.phone)
        .bind(new.license_number)
        .bind(new.vehicle_plate)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    /// New drivers start `pending` and unavailable until an admin approves them.
    pub async fn create(db: &PgPool, new: &NewDriver<'_>) -> anyhow::Result<Driver> {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            r#"
            INSERT INTO drivers (id, name, email, phone, password_hash, license_number,
                                 vehicle_type, vehicle_model, vehicle_plate, vehicle_color)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {DRIVER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.password_hash)
        .bind(new.license_number)
        .bind(new.vehicle_type)
        .bind(new.vehicle_model)
        .bind(new.vehicle_plate)
        .bind(new.vehicle_color)
        .fetch_one(db)
        .await
        .context("insert driver")?;
        Ok(driver)
    }
}

pub async fn update_location(db: &PgPool, driver_id: Uuid, latitude: f64, longitude: f64) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"UPDATE drivers SET current_latitude = $2, current_longitude = $3 WHERE id = $1"#,
    )
    .bind(driver_id)
    .bind(latitude)
    .bind(longitude)
    .execute(db)
    .await
    .context("update driver location")?;
    Ok(res.rows_affected() > 0)
}

pub async fn set_availability(db: &PgPool, driver_id: Uuid, available: bool) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"UPDATE drivers SET is_available = $2 WHERE id = $1"#)
        .bind(driver_id)
        .bind(available)
        .execute(db)
        .await
        .context("update driver availability")?;
    Ok(res.rows_affected() > 0)
}

/// Completed-ride totals; `today_only` restricts to rides created today.
pub async fn earnings(db: &PgPool, driver_id: Uuid, today_only: bool) -> anyhow::Result<EarningsRow> {
    let row = sqlx::query_as::<_, EarningsRow>(
        r#"
        SELECT COUNT(*) AS rides,
               SUM(COALESCE(final_fare, estimated_fare)) AS total,
               AVG(COALESCE(final_fare, estimated_fare)) AS average
          FROM rides
         WHERE driver_id = $1
           AND status = 'completed'
           AND (NOT $2 OR created_at::date = CURRENT_DATE)
        "#,
    )
    .bind(driver_id)
    .bind(today_only)
    .fetch_one(db)
    .await
    .context("driver earnings")?;
    Ok(row)
}

// ---- Transactional steps used by the ride lifecycle ----

pub async fn lock_tx(tx: &mut Transaction<'_, Postgres>, driver_id: Uuid) -> anyhow::Result<Option<Driver>> {
    let driver = sqlx::query_as::<_, Driver>(&format!(
        "SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1 FOR UPDATE"
    ))
    .bind(driver_id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock driver")?;
    Ok(driver)
}

pub async fn set_available_tx(
    tx: &mut Transaction<'_, Postgres>,
    driver_id: Uuid,
    available: bool,
) -> anyhow::Result<()> {
    sqlx::query(r#"UPDATE drivers SET is_available = $2 WHERE id = $1"#)
        .bind(driver_id)
        .bind(available)
        .execute(&mut **tx)
        .await
        .context("set driver availability")?;
    Ok(())
}

pub async fn record_completed_ride_tx(tx: &mut Transaction<'_, Postgres>, driver_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"UPDATE drivers SET is_available = TRUE, total_rides = total_rides + 1 WHERE id = $1"#,
    )
    .bind(driver_id)
    .execute(&mut **tx)
    .await
    .context("record completed ride")?;
    Ok(())
}

/// Driver rating is the mean of rated rides, 5.0 when none are rated.
pub async fn refresh_rating_tx(tx: &mut Transaction<'_, Postgres>, driver_id: Uuid) -> anyhow::Result<f64> {
    let rating: f64 = sqlx::query_scalar(
        r#"
        UPDATE drivers
           SET rating = COALESCE(
                   (SELECT AVG(rating)::float8 FROM rides WHERE driver_id = $1 AND rating IS NOT NULL),
                   5.0)
         WHERE id = $1
        RETURNING rating
        "#,
    )
    .bind(driver_id)
    .fetch_one(&mut **tx)
    .await
    .context("refresh driver rating")?;
    Ok(rating)
}
