use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::claims::{Role, TokenKind};
use super::jwt::JwtKeys;
use crate::error::ApiError;

/// Any authenticated account, with its role.
#[derive(Debug, Clone, Copy)]
pub struct AuthPrincipal {
    pub id: Uuid,
    pub role: Role,
}

/// Authenticated rider.
#[derive(Debug)]
pub struct AuthUser(pub Uuid);

/// Authenticated driver.
#[derive(Debug)]
pub struct AuthDriver(pub Uuid);

/// Authenticated admin.
#[derive(Debug)]
pub struct AuthAdmin(pub Uuid);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Access token required".into()))?;

    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Access token required".into()))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let keys = JwtKeys::from_ref(state);

        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Forbidden("Invalid or expired token".into())
        })?;

        if claims.kind != TokenKind::Access {
            return Err(ApiError::Unauthorized("Access token required".into()));
        }

        Ok(AuthPrincipal {
            id: claims.sub,
            role: claims.role,
        })
    }
}

async fn require_role<S>(parts: &mut Parts, state: &S, role: Role) -> Result<Uuid, ApiError>
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    let principal = AuthPrincipal::from_request_parts(parts, state).await?;
    if principal.role != role {
        warn!(sub = %principal.id, have = ?principal.role, want = ?role, "role mismatch");
        return Err(ApiError::Forbidden(format!(
            "Access denied. {} only.",
            role.label()
        )));
    }
    Ok(principal.id)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::User).await.map(AuthUser)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthDriver
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Driver).await.map(AuthDriver)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthAdmin
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Admin).await.map(AuthAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::{Request, StatusCode};

    fn parts_with(auth: Option<String>) -> Parts {
        let mut req = Request::builder().uri("/");
        if let Some(v) = auth {
            req = req.header("authorization", v);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_forbidden() {
        let state = AppState::fake();
        let mut parts = parts_with(Some("Bearer not-a-jwt".into()));
        let err = AuthPrincipal::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(Uuid::new_v4(), Role::User).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let err = AuthDriver::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Access denied. Driver only.");
    }

    #[tokio::test]
    async fn matching_role_yields_subject() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let admin = Uuid::new_v4();
        let token = keys.sign_access(admin, Role::Admin).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let AuthAdmin(id) = AuthAdmin::from_request_parts(&mut parts, &state).await.ok().unwrap();
        assert_eq!(id, admin);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_refresh(Uuid::new_v4(), Role::User).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
