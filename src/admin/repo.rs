use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Admin, DailyRevenue, DashboardStats, DriverSummary, MonthlyRevenue, UserSummary};
use crate::drivers::repo_types::DriverStatus;

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

impl Admin {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(admin)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(admin)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> anyhow::Result<Admin> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            r#"
            INSERT INTO admins (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ADMIN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await
        .context("insert admin")?;
        Ok(admin)
    }

    /// Insert or reset the credentials of the configured bootstrap admin.
    pub async fn upsert(db: &PgPool, name: &str, email: &str, password_hash: &str) -> anyhow::Result<Admin> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            r#"
            INSERT INTO admins (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, 'super_admin')
            ON CONFLICT (email) DO UPDATE
               SET name = EXCLUDED.name, password_hash = EXCLUDED.password_hash
            RETURNING {ADMIN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .context("upsert admin")?;
        Ok(admin)
    }
}

pub async fn dashboard_stats(db: &PgPool) -> anyhow::Result<DashboardStats> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM drivers) AS drivers,
            (SELECT COUNT(*) FROM drivers WHERE status = 'pending') AS pending_drivers,
            (SELECT COUNT(*) FROM drivers WHERE is_available AND status = 'approved') AS active_drivers,
            (SELECT COUNT(*) FROM rides) AS total_rides,
            (SELECT COUNT(*) FROM rides WHERE status = 'completed') AS completed_rides,
            (SELECT COUNT(*) FROM rides
              WHERE status IN ('pending', 'accepted', 'picked_up')) AS active_rides,
            (SELECT COALESCE(SUM(final_fare), 0)::float8 FROM rides
              WHERE status = 'completed') AS total_revenue,
            (SELECT COALESCE(SUM(final_fare), 0)::float8 FROM rides
              WHERE status = 'completed' AND created_at::date = CURRENT_DATE) AS today_revenue,
            (SELECT COUNT(*) FROM rides WHERE created_at::date = CURRENT_DATE) AS today_rides
        "#,
    )
    .fetch_one(db)
    .await
    .context("dashboard stats")?;
    Ok(stats)
}

pub async fn list_users(db: &PgPool) -> anyhow::Result<Vec<UserSummary>> {
    let rows = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.name, u.email, u.phone, u.created_at, COUNT(r.id) AS total_rides
          FROM users u
          LEFT JOIN rides r ON u.id = r.user_id
         GROUP BY u.id
         ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list users")?;
    Ok(rows)
}

pub async fn list_drivers(db: &PgPool, status: Option<DriverStatus>) -> anyhow::Result<Vec<DriverSummary>> {
    let rows = sqlx::query_as::<_, DriverSummary>(
        r#"
        SELECT d.id, d.name, d.email, d.phone, d.license_number, d.vehicle_type,
               d.vehicle_model, d.vehicle_plate, d.vehicle_color, d.status, d.is_available,
               d.rating, d.total_rides, d.created_at,
               COUNT(r.id) AS completed_rides
          FROM drivers d
          LEFT JOIN rides r ON d.id = r.driver_id AND r.status = 'completed'
         WHERE ($1::text IS NULL OR d.status = $1)
         GROUP BY d.id
         ORDER BY d.created_at DESC
        "#,
    )
    .bind(status.map(DriverStatus::as_str))
    .fetch_all(db)
    .await
    .context("list drivers")?;
    Ok(rows)
}

/// Anything but approval also takes the driver off the road.
pub async fn set_driver_status(db: &PgPool, driver_id: Uuid, status: DriverStatus) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE drivers
           SET status = $2,
               is_available = CASE WHEN $2 = 'approved' THEN is_available ELSE FALSE END
         WHERE id = $1
        "#,
    )
    .bind(driver_id)
    .bind(status.as_str())
    .execute(db)
    .await
    .context("set driver status")?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(db)
        .await
        .context("delete user")?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete_driver(db: &PgPool, driver_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM drivers WHERE id = $1")
        .bind(driver_id)
        .execute(db)
        .await
        .context("delete driver")?;
    Ok(res.rows_affected() > 0)
}

pub async fn daily_revenue(db: &PgPool, days: i32) -> anyhow::Result<Vec<DailyRevenue>> {
    let rows = sqlx::query_as::<_, DailyRevenue>(
        r#"
        SELECT to_char(created_at::date, 'YYYY-MM-DD') AS date,
               COUNT(*) AS rides,
               COALESCE(SUM(final_fare), 0)::float8 AS revenue
          FROM rides
         WHERE status = 'completed' AND created_at >= now() - make_interval(days => $1)
         GROUP BY created_at::date
         ORDER BY created_at::date DESC
        "#,
    )
    .bind(days)
    .fetch_all(db)
    .await
    .context("daily revenue")?;
    Ok(rows)
}

pub async fn monthly_revenue(db: &PgPool, months: i32) -> anyhow::Result<Vec<MonthlyRevenue>> {
    let rows = sqlx::query_as::<_, MonthlyRevenue>(
        r#"
        SELECT to_char(date_trunc('month', created_at), 'YYYY-MM') AS month,
               COUNT(*) AS rides,
               COALESCE(SUM(final_fare), 0)::float8 AS revenue
          FROM rides
         WHERE status = 'completed' AND created_at >= now() - make_interval(months => $1)
         GROUP BY date_trunc('month', created_at)
         ORDER BY date_trunc('month', created_at) DESC
        "#,
    )
    .bind(months)
    .fetch_all(db)
    .await
    .context("monthly revenue")?;
    Ok(rows)
}
