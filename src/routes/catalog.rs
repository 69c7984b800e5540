//! `/recipe/tags` and `/recipe/ingredients`. Both resources behave identically and differ
//! only in the [`Catalog`] they target.

use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    catalog::{self, Catalog},
    error::{AppResult, FieldErrors, OptionExt},
    middleware::AuthUser,
    state::AppState,
    types::{CatalogItem, CatalogItemRequest, CatalogListQuery},
    validation,
};

pub async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<CatalogListQuery>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    list(&state, Catalog::Tags, user.id, q).await
}

pub async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CatalogItemRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CatalogItem>)> {
    create(&state, Catalog::Tags, user.id, payload).await
}

pub async fn update_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CatalogItemRequest>, JsonRejection>,
) -> AppResult<Json<CatalogItem>> {
    let Path(id) = path?;
    update(&state, Catalog::Tags, user.id, id, payload).await
}

pub async fn delete_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    delete(&state, Catalog::Tags, user.id, id).await
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<CatalogListQuery>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    list(&state, Catalog::Ingredients, user.id, q).await
}

pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CatalogItemRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CatalogItem>)> {
    create(&state, Catalog::Ingredients, user.id, payload).await
}

pub async fn update_ingredient(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CatalogItemRequest>, JsonRejection>,
) -> AppResult<Json<CatalogItem>> {
    let Path(id) = path?;
    update(&state, Catalog::Ingredients, user.id, id, payload).await
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    delete(&state, Catalog::Ingredients, user.id, id).await
}

async fn list(state: &AppState, kind: Catalog, user_id: i64, q: CatalogListQuery) -> AppResult<Json<Vec<CatalogItem>>> {
    let assigned_only = validation::flag(q.assigned_only.as_deref());
    let items = catalog::list(&state.db, kind, user_id, assigned_only).await?;
    Ok(Json(items))
}

async fn create(
    state: &AppState,
    kind: Catalog,
    user_id: i64,
    payload: Result<Json<CatalogItemRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CatalogItem>)> {
    let name = validated_name(payload)?;
    let item = catalog::create(&state.db, kind, user_id, &name).await?;
    match kind {
        Catalog::Tags => state.metrics.inc_tags_created(),
        Catalog::Ingredients => state.metrics.inc_ingredients_created(),
    }
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update(
    state: &AppState,
    kind: Catalog,
    user_id: i64,
    id: i64,
    payload: Result<Json<CatalogItemRequest>, JsonRejection>,
) -> AppResult<Json<CatalogItem>> {
    let name = validated_name(payload)?;
    let item = catalog::rename(&state.db, kind, user_id, id, &name).await?.ok_or_not_found(kind.label())?;
    Ok(Json(item))
}

async fn delete(state: &AppState, kind: Catalog, user_id: i64, id: i64) -> AppResult<StatusCode> {
    catalog::delete(&state.db, kind, user_id, id).await?.then_some(()).ok_or_not_found(kind.label())?;
    Ok(StatusCode::NO_CONTENT)
}

fn validated_name(payload: Result<Json<CatalogItemRequest>, JsonRejection>) -> AppResult<String> {
    let Json(req) = payload?;
    let mut errors = FieldErrors::new();
    let name = validation::name(&mut errors, "name", req.name.as_deref()).map(str::to_string);
    errors.into_result()?;
    Ok(name.unwrap_or_default())
}
