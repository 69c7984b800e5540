//! Recipe storage. Recipes belong to one user and link to that user's tags and ingredients.

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::catalog::{self, Catalog};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::types::{RecipeDetail, RecipeSummary};

#[derive(Debug, Clone, sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    title: String,
    time_minutes: i64,
    price: String,
    link: String,
}

impl RecipeRow {
    fn price(&self) -> AppResult<Decimal> {
        Decimal::from_str(&self.price)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("recipe {} has corrupt price {:?}: {}", self.id, self.price, e)))
    }
}

/// A validated recipe ready to insert.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

/// A validated partial update. `Some` link sets replace the whole set.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

/// The user's recipes, newest first. Non-empty filters keep recipes linked to any of the ids.
pub async fn list(
    pool: &SqlitePool,
    user_id: i64,
    tag_filter: &[i64],
    ingredient_filter: &[i64],
) -> AppResult<Vec<RecipeSummary>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, title, time_minutes, price, link FROM recipes WHERE user_id = ");
    qb.push_bind(user_id);
    for (kind, ids) in [(Catalog::Tags, tag_filter), (Catalog::Ingredients, ingredient_filter)] {
        if ids.is_empty() {
            continue;
        }
        qb.push(format!(
            " AND id IN (SELECT recipe_id FROM {} WHERE {} IN (",
            kind.link_table(),
            kind.link_column()
        ));
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        qb.push("))");
    }
    qb.push(" ORDER BY id DESC");

    let rows: Vec<RecipeRow> = qb.build_query_as().fetch_all(pool).await?;
    let mut conn = pool.acquire().await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(summary(&mut conn, row).await?);
    }
    Ok(out)
}

/// Detail view with nested tags and ingredients; `None` unless `user_id` owns the recipe.
pub async fn get(pool: &SqlitePool, user_id: i64, id: i64) -> AppResult<Option<RecipeDetail>> {
    let mut conn = pool.acquire().await?;
    let Some(row) = fetch_owned(&mut conn, user_id, id).await? else {
        return Ok(None);
    };
    let price = row.price()?;
    let tags = catalog::for_recipe(&mut *conn, Catalog::Tags, row.id).await?;
    let ingredients = catalog::for_recipe(&mut *conn, Catalog::Ingredients, row.id).await?;
    Ok(Some(RecipeDetail {
        id: row.id,
        title: row.title,
        time_minutes: row.time_minutes,
        price,
        link: row.link,
        tags,
        ingredients,
    }))
}

pub async fn create(pool: &SqlitePool, user_id: i64, recipe: NewRecipe) -> AppResult<RecipeSummary> {
    let mut tx = pool.begin().await?;
    ensure_owned_links(&mut tx, user_id, Some(&recipe.tags), Some(&recipe.ingredients)).await?;

    let row = sqlx::query_as::<_, RecipeRow>(
        r#"INSERT INTO recipes (user_id, title, time_minutes, price, link)
           VALUES (?1, ?2, ?3, ?4, ?5)
           RETURNING id, title, time_minutes, price, link"#,
    )
    .bind(user_id)
    .bind(&recipe.title)
    .bind(recipe.time_minutes)
    .bind(recipe.price.to_string())
    .bind(&recipe.link)
    .fetch_one(&mut *tx)
    .await?;

    set_links(&mut tx, Catalog::Tags, row.id, &recipe.tags).await?;
    set_links(&mut tx, Catalog::Ingredients, row.id, &recipe.ingredients).await?;
    let created = summary(&mut tx, row).await?;
    tx.commit().await?;

    tracing::info!(user_id, recipe_id = created.id, "Created recipe");
    Ok(created)
}

/// Applies `changes` atomically; `None` unless `user_id` owns the recipe.
pub async fn update(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    changes: RecipeChanges,
) -> AppResult<Option<RecipeSummary>> {
    let mut tx = pool.begin().await?;
    let Some(mut row) = fetch_owned(&mut tx, user_id, id).await? else {
        return Ok(None);
    };
    ensure_owned_links(&mut tx, user_id, changes.tags.as_deref(), changes.ingredients.as_deref()).await?;

    if let Some(title) = changes.title {
        row.title = title;
    }
    if let Some(minutes) = changes.time_minutes {
        row.time_minutes = minutes;
    }
    if let Some(price) = changes.price {
        row.price = price.to_string();
    }
    if let Some(link) = changes.link {
        row.link = link;
    }

    sqlx::query("UPDATE recipes SET title = ?1, time_minutes = ?2, price = ?3, link = ?4 WHERE id = ?5")
        .bind(&row.title)
        .bind(row.time_minutes)
        .bind(&row.price)
        .bind(&row.link)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

    if let Some(tags) = changes.tags {
        set_links(&mut tx, Catalog::Tags, row.id, &tags).await?;
    }
    if let Some(ingredients) = changes.ingredients {
        set_links(&mut tx, Catalog::Ingredients, row.id, &ingredients).await?;
    }
    let updated = summary(&mut tx, row).await?;
    tx.commit().await?;
    Ok(Some(updated))
}

/// Returns whether a recipe was deleted. Links go with it.
pub async fn delete(pool: &SqlitePool, user_id: i64, id: i64) -> AppResult<bool> {
    let res = sqlx::query("DELETE FROM recipes WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

async fn fetch_owned(conn: &mut SqliteConnection, user_id: i64, id: i64) -> sqlx::Result<Option<RecipeRow>> {
    sqlx::query_as::<_, RecipeRow>(
        "SELECT id, title, time_minutes, price, link FROM recipes WHERE id = ?1 AND user_id = ?2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Rejects link ids the user does not own, reported per field.
async fn ensure_owned_links(
    conn: &mut SqliteConnection,
    user_id: i64,
    tags: Option<&[i64]>,
    ingredients: Option<&[i64]>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    for (kind, ids) in [(Catalog::Tags, tags), (Catalog::Ingredients, ingredients)] {
        let Some(ids) = ids else { continue };
        for bad in catalog::foreign_ids(&mut *conn, kind, user_id, ids).await? {
            errors.add(kind.field(), format!("Invalid pk \"{}\" - object does not exist.", bad));
        }
    }
    errors.into_result()
}

async fn set_links(conn: &mut SqliteConnection, kind: Catalog, recipe_id: i64, ids: &[i64]) -> sqlx::Result<()> {
    sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = ?1", kind.link_table()))
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    let insert = format!(
        "INSERT OR IGNORE INTO {} (recipe_id, {}) VALUES (?1, ?2)",
        kind.link_table(),
        kind.link_column()
    );
    for id in ids {
        sqlx::query(&insert).bind(recipe_id).bind(*id).execute(&mut *conn).await?;
    }
    Ok(())
}

async fn link_ids(conn: &mut SqliteConnection, kind: Catalog, recipe_id: i64) -> sqlx::Result<Vec<i64>> {
    let sql = format!(
        "SELECT {col} FROM {link} WHERE recipe_id = ?1 ORDER BY {col}",
        col = kind.link_column(),
        link = kind.link_table()
    );
    sqlx::query_scalar::<_, i64>(&sql).bind(recipe_id).fetch_all(conn).await
}

async fn summary(conn: &mut SqliteConnection, row: RecipeRow) -> AppResult<RecipeSummary> {
    let price = row.price()?;
    let tags = link_ids(conn, Catalog::Tags, row.id).await?;
    let ingredients = link_ids(conn, Catalog::Ingredients, row.id).await?;
    Ok(RecipeSummary {
        id: row.id,
        title: row.title,
        time_minutes: row.time_minutes,
        price,
        link: row.link,
        tags,
        ingredients,
    })
}
