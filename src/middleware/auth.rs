use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::accounts::{token, User};
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, resolved from `Authorization: Token <key>` (or `Bearer <key>`).
///
/// Rejects with 401 when the header is missing, malformed, or names an unknown or inactive
/// user's token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// An authenticated caller with `is_staff`. Non-staff users are rejected with 403.
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

/// Pulls the token key out of an `Authorization` header value.
pub fn parse_authorization(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let key = key.trim();
    if key.is_empty() || key.contains(' ') {
        return None;
    }
    Some(key)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authentication credentials were not provided".into()))?;
        let key = header_value
            .to_str()
            .ok()
            .and_then(parse_authorization)
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".into()))?;

        match token::user_for_key(&state.db, key).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                tracing::debug!("Rejected unknown or inactive token");
                Err(AppError::Unauthorized("Invalid token".into()))
            }
        }
    }
}

impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            tracing::warn!(user_id = user.id, "Non-staff user attempted admin access");
            return Err(AppError::Forbidden("Staff access required".into()));
        }
        Ok(StaffUser(user))
    }
}
