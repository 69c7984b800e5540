//! Tags and ingredients: per-user named entities with identical storage shape.

use sqlx::SqlitePool;

use crate::types::CatalogItem;

/// Which named entity a query targets. Only these fixed names are spliced into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    Tags,
    Ingredients,
}

impl Catalog {
    pub fn table(self) -> &'static str {
        match self {
            Catalog::Tags => "tags",
            Catalog::Ingredients => "ingredients",
        }
    }

    /// Join table linking recipes to this entity.
    pub fn link_table(self) -> &'static str {
        match self {
            Catalog::Tags => "recipe_tags",
            Catalog::Ingredients => "recipe_ingredients",
        }
    }

    /// Column in [`link_table`](Self::link_table) referencing this entity.
    pub fn link_column(self) -> &'static str {
        match self {
            Catalog::Tags => "tag_id",
            Catalog::Ingredients => "ingredient_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Catalog::Tags => "tag",
            Catalog::Ingredients => "ingredient",
        }
    }

    /// Field name used in recipe payloads.
    pub fn field(self) -> &'static str {
        self.table()
    }
}

/// The user's entities, name descending. With `assigned_only` only those attached to at
/// least one recipe, each listed once.
pub async fn list(
    pool: &SqlitePool,
    kind: Catalog,
    user_id: i64,
    assigned_only: bool,
) -> sqlx::Result<Vec<CatalogItem>> {
    let sql = if assigned_only {
        format!(
            "SELECT DISTINCT e.id, e.name FROM {table} e
             JOIN {link} l ON l.{col} = e.id
             WHERE e.user_id = ?1
             ORDER BY e.name DESC, e.id DESC",
            table = kind.table(),
            link = kind.link_table(),
            col = kind.link_column(),
        )
    } else {
        format!(
            "SELECT id, name FROM {table} WHERE user_id = ?1 ORDER BY name DESC, id DESC",
            table = kind.table()
        )
    };
    sqlx::query_as::<_, CatalogItem>(&sql).bind(user_id).fetch_all(pool).await
}

pub async fn create(pool: &SqlitePool, kind: Catalog, user_id: i64, name: &str) -> sqlx::Result<CatalogItem> {
    let sql = format!("INSERT INTO {} (name, user_id) VALUES (?1, ?2) RETURNING id, name", kind.table());
    let item = sqlx::query_as::<_, CatalogItem>(&sql).bind(name).bind(user_id).fetch_one(pool).await?;
    tracing::debug!(user_id, id = item.id, "Created {}", kind.label());
    Ok(item)
}

/// Renames an entity the user owns; `None` when it does not exist or belongs to someone else.
pub async fn rename(
    pool: &SqlitePool,
    kind: Catalog,
    user_id: i64,
    id: i64,
    name: &str,
) -> sqlx::Result<Option<CatalogItem>> {
    let sql = format!("UPDATE {} SET name = ?1 WHERE id = ?2 AND user_id = ?3 RETURNING id, name", kind.table());
    sqlx::query_as::<_, CatalogItem>(&sql).bind(name).bind(id).bind(user_id).fetch_optional(pool).await
}

/// Returns whether a row was deleted.
pub async fn delete(pool: &SqlitePool, kind: Catalog, user_id: i64, id: i64) -> sqlx::Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1 AND user_id = ?2", kind.table());
    let res = sqlx::query(&sql).bind(id).bind(user_id).execute(pool).await?;
    Ok(res.rows_affected() > 0)
}

/// The subset of `ids` not owned by `user_id`, preserving input order.
pub async fn foreign_ids<'e, E>(executor: E, kind: Catalog, user_id: i64, ids: &[i64]) -> sqlx::Result<Vec<i64>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id FROM {} WHERE user_id = ? AND id IN ({})",
        kind.table(),
        placeholders
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(user_id);
    for id in ids {
        query = query.bind(*id);
    }
    let owned = query.fetch_all(executor).await?;
    Ok(ids.iter().copied().filter(|id| !owned.contains(id)).collect())
}

/// Entities of `kind` linked to a recipe, name ascending.
pub async fn for_recipe<'e, E>(executor: E, kind: Catalog, recipe_id: i64) -> sqlx::Result<Vec<CatalogItem>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = format!(
        "SELECT e.id, e.name FROM {table} e
         JOIN {link} l ON l.{col} = e.id
         WHERE l.recipe_id = ?1
         ORDER BY e.name, e.id",
        table = kind.table(),
        link = kind.link_table(),
        col = kind.link_column(),
    );
    sqlx::query_as::<_, CatalogItem>(&sql).bind(recipe_id).fetch_all(executor).await
}
