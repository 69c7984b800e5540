use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use crate::{
    accounts::{token, NewUserFields, UserChanges},
    error::{AppError, AppResult, FieldErrors, NON_FIELD_ERRORS},
    middleware::{AuthUser, ClientIp},
    state::{AppState, CREATE_USER_ENDPOINT, TOKEN_ENDPOINT},
    types::{CreateUserRequest, TokenRequest, TokenResponse, UpdateMeRequest, UserResponse},
    validation,
};

/// `POST /user/create`: register a new user.
pub async fn create_user(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    state.rate_limiter.check_endpoint_limit(CREATE_USER_ENDPOINT, ip).await?;
    let Json(req) = payload?;

    let mut errors = FieldErrors::new();
    let email = validation::required(&mut errors, "email", req.email.as_deref());
    if let Some(email) = email {
        validation::email(&mut errors, email);
    }
    let password = required_password(&mut errors, req.password.as_deref());
    if let Some(password) = password {
        validation::password(&mut errors, password, state.config.auth.min_password_length);
    }
    let name = validation::name(&mut errors, "name", req.name.as_deref());
    errors.into_result()?;

    let (Some(email), Some(password), Some(name)) = (email, password, name) else {
        return Err(AppError::BadRequest("incomplete payload".into()));
    };

    let user = state
        .users
        .create_user(email, Some(password), NewUserFields { name: name.to_string(), ..Default::default() })
        .await?;
    state.metrics.inc_users_created();

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// `POST /user/token`: exchange email and password for the user's auth token.
pub async fn create_token(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    state.rate_limiter.check_endpoint_limit(TOKEN_ENDPOINT, ip).await?;
    let Json(req) = payload?;

    let mut errors = FieldErrors::new();
    let email = validation::required(&mut errors, "email", req.email.as_deref());
    let password = required_password(&mut errors, req.password.as_deref());
    errors.into_result()?;
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::BadRequest("incomplete payload".into()));
    };

    let Some(user) = state.users.authenticate(email, password).await? else {
        state.metrics.inc_login_failures();
        tracing::info!(%ip, "Rejected login for {}", email);
        return Err(AppError::field(NON_FIELD_ERRORS, "Unable to authenticate with provided credentials"));
    };

    let key = token::get_or_create(&state.db, user.id).await?;
    state.users.record_login(user.id).await?;
    state.metrics.inc_tokens_issued();

    Ok(Json(TokenResponse { token: key }))
}

/// `GET /user/me`
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// `PATCH /user/me`: partial update of the caller's own email, name or password.
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<UpdateMeRequest>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    let Json(req) = payload?;

    let mut errors = FieldErrors::new();
    let mut changes = UserChanges::default();
    if req.email.is_some() {
        if let Some(email) = validation::required(&mut errors, "email", req.email.as_deref()) {
            validation::email(&mut errors, email);
            changes.email = Some(email.to_string());
        }
    }
    if req.name.is_some() {
        changes.name = validation::name(&mut errors, "name", req.name.as_deref()).map(str::to_string);
    }
    if req.password.is_some() {
        if let Some(password) = required_password(&mut errors, req.password.as_deref()) {
            validation::password(&mut errors, password, state.config.auth.min_password_length);
            changes.password = Some(password.to_string());
        }
    }
    errors.into_result()?;

    let updated = state.users.update(user.id, changes).await?;
    Ok(Json(UserResponse::from(&updated)))
}

/// Passwords are not trimmed; only missing or empty is rejected here.
fn required_password<'a>(errors: &mut FieldErrors, value: Option<&'a str>) -> Option<&'a str> {
    match value {
        None => {
            errors.add("password", validation::MSG_REQUIRED);
            None
        }
        Some("") => {
            errors.add("password", validation::MSG_BLANK);
            None
        }
        Some(v) => Some(v),
    }
}
