//! Staff-only user administration under `/admin/users`.

use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    accounts::{NewUserFields, User, UserChanges},
    error::{AppError, AppResult, FieldErrors, OptionExt},
    middleware::StaffUser,
    state::AppState,
    types::{AdminCreateUserRequest, AdminListQuery, AdminUpdateUserRequest},
    validation,
};

/// Change list: every user ordered by email, optionally searched by `q`.
pub async fn list_users(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    Query(q): Query<AdminListQuery>,
) -> AppResult<Json<Vec<User>>> {
    let users = state.users.list(q.q.as_deref()).await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<User>> {
    let Path(id) = path?;
    let user = state.users.get(id).await?.ok_or_not_found("user")?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    payload: Result<Json<AdminCreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<User>)> {
    let Json(req) = payload?;

    let mut errors = FieldErrors::new();
    let email = validation::required(&mut errors, "email", req.email.as_deref());
    if let Some(email) = email {
        validation::email(&mut errors, email);
    }
    // An admin may create a user without a password; it then cannot log in until one is set.
    let password = req.password.as_deref().filter(|p| !p.is_empty());
    if let Some(password) = password {
        validation::password(&mut errors, password, state.config.auth.min_password_length);
    }
    let name = req.name.as_deref().map(str::trim).unwrap_or_default();
    validation::max_length(&mut errors, "name", name, validation::MAX_CHAR_FIELD);
    errors.into_result()?;
    let email = email.ok_or_else(|| AppError::field("email", validation::MSG_REQUIRED))?;

    let fields = NewUserFields {
        name: name.to_string(),
        is_active: req.is_active,
        is_staff: req.is_staff.unwrap_or(false),
        is_superuser: req.is_superuser.unwrap_or(false),
    };
    let user = state.users.create_user(email, password, fields).await?;
    state.metrics.inc_users_created();
    tracing::info!(admin_id = staff.id, user_id = user.id, "Admin created user");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AdminUpdateUserRequest>, JsonRejection>,
) -> AppResult<Json<User>> {
    let Path(id) = path?;
    let Json(req) = payload?;

    let mut errors = FieldErrors::new();
    let mut changes = UserChanges {
        is_active: req.is_active,
        is_staff: req.is_staff,
        is_superuser: req.is_superuser,
        ..Default::default()
    };
    if req.email.is_some() {
        if let Some(email) = validation::required(&mut errors, "email", req.email.as_deref()) {
            validation::email(&mut errors, email);
            changes.email = Some(email.to_string());
        }
    }
    if req.name.is_some() {
        changes.name = validation::name(&mut errors, "name", req.name.as_deref()).map(str::to_string);
    }
    if let Some(password) = req.password {
        validation::password(&mut errors, &password, state.config.auth.min_password_length);
        changes.password = Some(password);
    }
    errors.into_result()?;

    let user = state.users.update(id, changes).await?;
    tracing::info!(admin_id = staff.id, user_id = id, "Admin updated user");
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    if staff.id == id {
        return Err(AppError::BadRequest("staff users cannot delete their own account".into()));
    }
    state.users.delete(id).await?;
    tracing::info!(admin_id = staff.id, user_id = id, "Admin deleted user");
    Ok(StatusCode::NO_CONTENT)
}
