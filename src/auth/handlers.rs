use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    admin::repo_types::Admin,
    auth::{
        claims::Role,
        dto::{
            AdminAuthResponse, DriverAuthResponse, DriverRegisteredResponse, LoginRequest, MeResponse, PendingDriver,
            RefreshRequest, RegisterDriverRequest, RegisterUserRequest, UserAuthResponse,
        },
        extractors::AuthPrincipal,
        jwt::{JwtKeys, TokenPair},
        password::{check_password, hash_password, verify_password},
        repo_types::User,
        services::{ensure_driver_active, ensure_principal_active, normalize_email, require_field},
    },
    drivers::repo_types::{Driver, NewDriver},
    error::{ApiError, ApiResult},
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/user/register", post(register_user))
        .route("/auth/user/login", post(login_user))
        .route("/auth/driver/register", post(register_driver))
        .route("/auth/driver/login", post(login_driver))
        .route("/auth/admin/login", post(login_admin))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".into())
}

/// Checks a password against a stored hash, treating a corrupt hash as a server fault.
fn password_matches(plain: &str, hash: &str) -> ApiResult<bool> {
    verify_password(plain, hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        ApiError::Internal(e)
    })
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<UserAuthResponse>)> {
    let email = normalize_email(&payload.email)?;
    let name = require_field(&payload.name, "Name")?;
    let phone = require_field(&payload.phone, "Phone")?;
    check_password(&payload.password)?;

    if User::contact_taken(&state.db, &email, phone).await? {
        warn!(email = %email, "email or phone already registered");
        return Err(ApiError::conflict("Email or phone already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, name, &email, phone, &hash).await?;

    let TokenPair { token, refresh_token } = JwtKeys::from_ref(&state).issue_pair(user.id, Role::User)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserAuthResponse {
            message: "User registered successfully",
            token,
            refresh_token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<UserAuthResponse>> {
    let email = normalize_email(&payload.email).map_err(|_| invalid_credentials())?;

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid_credentials());
    };
    if !password_matches(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let TokenPair { token, refresh_token } = JwtKeys::from_ref(&state).issue_pair(user.id, Role::User)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(UserAuthResponse {
        message: "Login successful",
        token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn register_driver(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterDriverRequest>,
) -> ApiResult<(StatusCode, Json<DriverRegisteredResponse>)> {
    let email = normalize_email(&payload.email)?;
    check_password(&payload.password)?;

    let new = NewDriver {
        name: require_field(&payload.name, "Name")?,
        email: &email,
        phone: require_field(&payload.phone, "Phone")?,
        // filled in once the identity checks pass
        password_hash: "",
        license_number: require_field(&payload.license_number, "License number")?,
        vehicle_type: require_field(&payload.vehicle_type, "Vehicle type")?,
        vehicle_model: require_field(&payload.vehicle_model, "Vehicle model")?,
        vehicle_plate: require_field(&payload.vehicle_plate, "Vehicle plate")?,
        vehicle_color: require_field(&payload.vehicle_color, "Vehicle color")?,
    };

    if Driver::identity_taken(&state.db, &new).await? {
        warn!(email = %email, "driver identity already registered");
        return Err(ApiError::conflict("Email, phone, license, or vehicle plate already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let driver = Driver::create(&state.db, &NewDriver { password_hash: &hash, ..new }).await?;
    info!(driver_id = %driver.id, email = %driver.email, "driver registered, awaiting approval");

    Ok((
        StatusCode::CREATED,
        Json(DriverRegisteredResponse {
            message: "Driver registration submitted. Awaiting admin approval.",
            driver: PendingDriver {
                id: driver.id,
                name: driver.name,
                email: driver.email,
                status: driver.status,
                created_at: driver.created_at,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login_driver(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<DriverAuthResponse>> {
    let email = normalize_email(&payload.email).map_err(|_| invalid_credentials())?;

    let Some(driver) = Driver::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "driver login unknown email");
        return Err(invalid_credentials());
    };
    if !password_matches(&payload.password, &driver.password_hash)? {
        warn!(driver_id = %driver.id, "driver login invalid password");
        return Err(invalid_credentials());
    }

    ensure_driver_active(driver.status())?;

    let TokenPair { token, refresh_token } = JwtKeys::from_ref(&state).issue_pair(driver.id, Role::Driver)?;

    info!(driver_id = %driver.id, "driver logged in");
    Ok(Json(DriverAuthResponse {
        message: "Login successful",
        token,
        refresh_token,
        driver: driver.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login_admin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<AdminAuthResponse>> {
    let email = normalize_email(&payload.email).map_err(|_| invalid_credentials())?;

    let Some(admin) = Admin::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "admin login unknown email");
        return Err(invalid_credentials());
    };
    if !password_matches(&payload.password, &admin.password_hash)? {
        warn!(admin_id = %admin.id, "admin login invalid password");
        return Err(invalid_credentials());
    }

    let TokenPair { token, refresh_token } = JwtKeys::from_ref(&state).issue_pair(admin.id, Role::Admin)?;

    info!(admin_id = %admin.id, "admin logged in");
    Ok(Json(AdminAuthResponse {
        message: "Login successful",
        token,
        refresh_token,
        admin: admin.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    ensure_principal_active(&state.db, claims.sub, claims.role).await?;

    let pair = keys.issue_pair(claims.sub, claims.role)?;
    info!(sub = %claims.sub, role = ?claims.role, "tokens refreshed");
    Ok(Json(pair))
}

#[instrument(skip(state))]
pub async fn get_me(State(state): State<AppState>, principal: AuthPrincipal) -> ApiResult<Json<MeResponse>> {
    let not_found = || ApiError::not_found("Account not found");
    let me = match principal.role {
        Role::User => {
            let user = User::find_by_id(&state.db, principal.id).await?;
            MeResponse::User(user.ok_or_else(not_found)?.into())
        }
        Role::Driver => {
            let driver = Driver::find_by_id(&state.db, principal.id).await?;
            MeResponse::Driver(driver.ok_or_else(not_found)?.into())
        }
        Role::Admin => {
            let admin = Admin::find_by_id(&state.db, principal.id).await?;
            MeResponse::Admin(admin.ok_or_else(not_found)?.into())
        }
    };
    Ok(Json(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::PublicAdmin;
    use crate::drivers::repo_types::DriverStatus;
    use crate::test_utils::{create_test_driver, create_test_rider};
    use sqlx::PgPool;

    #[test]
    fn me_response_is_tagged_with_account() {
        let response = MeResponse::Admin(PublicAdmin {
            id: uuid::Uuid::new_v4(),
            name: "Ops".into(),
            email: "ops@yango.test".into(),
            role: "super_admin".into(),
        });

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json.matches("\"role\"").count(), 1, "duplicate key in {json}");

        let json: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(json["account"], "admin");
        assert_eq!(json["role"], "super_admin");
        assert_eq!(json["email"], "ops@yango.test");
    }

    fn driver_signup(email: &str, plate: &str) -> RegisterDriverRequest {
        RegisterDriverRequest {
            name: "Kofi".into(),
            email: email.into(),
            phone: format!("+233{}", &uuid::Uuid::new_v4().simple().to_string()[..9]),
            password: "correct horse".into(),
            license_number: format!("LIC-{plate}"),
            vehicle_type: "sedan".into(),
            vehicle_model: "Corolla".into(),
            vehicle_plate: plate.into(),
            vehicle_color: "blue".into(),
        }
    }

    #[sqlx::test]
    async fn driver_signup_stores_hash_and_refuses_duplicates(pool: PgPool) {
        let state = AppState::for_pool(pool.clone());
        let (status, _) = register_driver(State(state.clone()), ApiJson(driver_signup("Kofi@Yango.test", "GR-1")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let stored = Driver::find_by_email(&pool, "kofi@yango.test").await.unwrap().unwrap();
        assert!(verify_password("correct horse", &stored.password_hash).unwrap());

        let err = register_driver(State(state), ApiJson(driver_signup("other@yango.test", "GR-1")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn refresh_stops_once_driver_is_suspended(pool: PgPool) {
        let state = AppState::for_pool(pool.clone());
        let driver = create_test_driver(&pool, DriverStatus::Approved).await;
        let pair = JwtKeys::from_ref(&state).issue_pair(driver.id, Role::Driver).unwrap();
        let body = || {
            ApiJson(RefreshRequest {
                refresh_token: pair.refresh_token.clone(),
            })
        };

        assert!(refresh(State(state.clone()), body()).await.is_ok());

        crate::admin::repo::set_driver_status(&pool, driver.id, DriverStatus::Suspended)
            .await
            .unwrap();
        let err = refresh(State(state), body()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Account not active. Contact admin.");
    }

    #[sqlx::test]
    async fn refresh_rejects_deleted_rider(pool: PgPool) {
        let state = AppState::for_pool(pool.clone());
        let rider = create_test_rider(&pool).await;
        let pair = JwtKeys::from_ref(&state).issue_pair(rider.id, Role::User).unwrap();

        crate::admin::repo::delete_user(&pool, rider.id).await.unwrap();
        let err = refresh(
            State(state),
            ApiJson(RefreshRequest {
                refresh_token: pair.refresh_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
