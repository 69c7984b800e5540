//! Opaque auth tokens, one per user.

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sqlx::SqlitePool;

use super::{AccountError, User};

/// Generate a fresh token key: 32 random bytes, base64url without padding (43 chars).
pub fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Return the user's token, creating it on first use.
pub async fn get_or_create(pool: &SqlitePool, user_id: i64) -> Result<String, AccountError> {
    sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES (?1, ?2) ON CONFLICT(user_id) DO NOTHING")
        .bind(generate_key())
        .bind(user_id)
        .execute(pool)
        .await?;

    let key: String = sqlx::query_scalar("SELECT key FROM auth_tokens WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(key)
}

/// Resolve a presented key to its active owner.
pub async fn user_for_key(pool: &SqlitePool, key: &str) -> Result<Option<User>, AccountError> {
    let user = sqlx::query_as::<_, User>(
        r#"SELECT u.* FROM users u
           JOIN auth_tokens t ON t.user_id = u.id
           WHERE t.key = ?1 AND u.is_active = 1"#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Drop the user's token so the next login issues a new one.
pub async fn revoke(pool: &SqlitePool, user_id: i64) -> Result<(), AccountError> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?1").bind(user_id).execute(pool).await?;
    Ok(())
}
