use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult, FieldErrors, OptionExt},
    middleware::AuthUser,
    recipes::{self, NewRecipe, RecipeChanges},
    state::AppState,
    types::{RecipeDetail, RecipeListQuery, RecipeRequest, RecipeSummary},
    validation,
};

/// `GET /recipe/recipes?tags=1,2&ingredients=3`
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<RecipeListQuery>,
) -> AppResult<Json<Vec<RecipeSummary>>> {
    let tags = q.tags.as_deref().map(|raw| validation::id_list("tags", raw)).transpose()?.unwrap_or_default();
    let ingredients = q
        .ingredients
        .as_deref()
        .map(|raw| validation::id_list("ingredients", raw))
        .transpose()?
        .unwrap_or_default();
    let items = recipes::list(&state.db, user.id, &tags, &ingredients).await?;
    Ok(Json(items))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RecipeSummary>)> {
    let Json(req) = payload?;
    let changes = validate(req, true)?;
    let (Some(title), Some(time_minutes), Some(price)) = (changes.title, changes.time_minutes, changes.price) else {
        return Err(AppError::BadRequest("incomplete payload".into()));
    };
    let new = NewRecipe {
        title,
        time_minutes,
        price,
        link: changes.link.unwrap_or_default(),
        tags: changes.tags.unwrap_or_default(),
        ingredients: changes.ingredients.unwrap_or_default(),
    };
    let created = recipes::create(&state.db, user.id, new).await?;
    state.metrics.inc_recipes_created();
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<RecipeDetail>> {
    let Path(id) = path?;
    let detail = recipes::get(&state.db, user.id, id).await?.ok_or_not_found("recipe")?;
    Ok(Json(detail))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> AppResult<Json<RecipeSummary>> {
    let Path(id) = path?;
    let Json(req) = payload?;
    let changes = validate(req, false)?;
    let updated = recipes::update(&state.db, user.id, id, changes).await?.ok_or_not_found("recipe")?;
    Ok(Json(updated))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    if !recipes::delete(&state.db, user.id, id).await? {
        return Err(AppError::NotFound("recipe not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Validates a create (`full`) or partial payload into normalized changes.
fn validate(req: RecipeRequest, full: bool) -> AppResult<RecipeChanges> {
    let mut errors = FieldErrors::new();
    let mut changes = RecipeChanges::default();

    if full || req.title.is_some() {
        changes.title = validation::name(&mut errors, "title", req.title.as_deref()).map(str::to_string);
    }
    match req.time_minutes {
        Some(minutes) => {
            validation::time_minutes(&mut errors, minutes);
            changes.time_minutes = Some(minutes);
        }
        None if full => errors.add("time_minutes", validation::MSG_REQUIRED),
        None => {}
    }
    match req.price {
        Some(price) => changes.price = Some(validation::price(&mut errors, price)),
        None if full => errors.add("price", validation::MSG_REQUIRED),
        None => {}
    }
    if let Some(link) = req.link {
        let link = link.trim().to_string();
        validation::max_length(&mut errors, "link", &link, validation::MAX_CHAR_FIELD);
        changes.link = Some(link);
    }
    changes.tags = req.tags.map(dedup);
    changes.ingredients = req.ingredients.map(dedup);
    for (field, ids) in [("tags", &changes.tags), ("ingredients", &changes.ingredients)] {
        if let Some(ids) = ids {
            validation::linked_ids(&mut errors, field, ids);
        }
    }

    errors.into_result()?;
    Ok(changes)
}

fn dedup(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
