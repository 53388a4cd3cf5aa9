//! Fixtures for tests that run against a real database via `#[sqlx::test]`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    admin,
    auth::repo_types::User,
    drivers::repo_types::{Driver, DriverStatus, NewDriver},
    rides::{fare::Coordinates, services::Booking},
};

const UNUSED_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA";

fn unique_tag() -> String {
    Uuid::new_v4().simple().to_string()
}

pub async fn create_test_rider(pool: &PgPool) -> User {
    let tag = unique_tag();
    User::create(
        pool,
        "Test Rider",
        &format!("rider-{tag}@yango.test"),
        &format!("+1{}", &tag[..12]),
        UNUSED_HASH,
    )
    .await
    .expect("create rider")
}

/// Registers a driver and moves it to `status` the way an admin would.
pub async fn create_test_driver(pool: &PgPool, status: DriverStatus) -> Driver {
    let tag = unique_tag();
    let email = format!("driver-{tag}@yango.test");
    let phone = format!("+2{}", &tag[..12]);
    let license = format!("LIC-{tag}");
    let plate = format!("GR-{}", &tag[..8]);
    let driver = Driver::create(
        pool,
        &NewDriver {
            name: "Test Driver",
            email: &email,
            phone: &phone,
            password_hash: UNUSED_HASH,
            license_number: &license,
            vehicle_type: "sedan",
            vehicle_model: "Corolla",
            vehicle_plate: &plate,
            vehicle_color: "silver",
        },
    )
    .await
    .expect("create driver");

    if status != DriverStatus::Pending {
        admin::repo::set_driver_status(pool, driver.id, status)
            .await
            .expect("set driver status");
    }
    Driver::find_by_id(pool, driver.id)
        .await
        .expect("reload driver")
        .expect("driver exists")
}

pub fn test_booking() -> Booking {
    Booking {
        pickup_location: "Kwame Nkrumah Circle".into(),
        pickup: Coordinates::new(5.5700, -0.2100),
        dropoff_location: "Kotoka Airport".into(),
        dropoff: Coordinates::new(5.6050, -0.1700),
        distance: Some(6.0),
    }
}
