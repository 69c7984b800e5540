//! Users keyed by email, plus the manager that creates, authenticates and edits them.
//!
//! Every path that writes a user goes through [`UserManager`]. That way emails are always
//! normalized and passwords are always hashed, whether the caller is a public endpoint, an
//! admin endpoint or the CLI.

pub mod password;
pub mod token;

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use password::Argon2Params;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User must have a valid email address")]
    EmptyEmail,
    #[error("user with email {0} already exists")]
    DuplicateEmail(String),
    #[error("user {0} not found")]
    NotFound(i64),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<String>,
    pub date_joined: String,
}

/// Optional fields accepted by [`UserManager::create_user`] next to email and password.
#[derive(Debug, Clone, Default)]
pub struct NewUserFields {
    pub name: String,
    pub is_active: Option<bool>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// A partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

/// Lowercases the domain part of an address. The local part is case-sensitive and kept as is.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[derive(Clone)]
pub struct UserManager {
    db: SqlitePool,
    hasher: Argon2Params,
}

impl UserManager {
    pub fn new(db: SqlitePool, hasher: Argon2Params) -> Self {
        Self { db, hasher }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Creates and saves a new user.
    ///
    /// Fails with [`AccountError::EmptyEmail`] when `email` is blank. A `None` password stores
    /// an unusable hash, so the account cannot log in until a password is set.
    pub async fn create_user(
        &self,
        email: &str,
        password: Option<&str>,
        fields: NewUserFields,
    ) -> Result<User, AccountError> {
        if email.trim().is_empty() {
            return Err(AccountError::EmptyEmail);
        }
        let email = normalize_email(email);
        let hash = match password {
            Some(raw) => password::hash_password(raw, self.hasher)?,
            None => password::unusable_password(),
        };

        let inserted = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (email, name, password, is_active, is_staff, is_superuser)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               RETURNING *"#,
        )
        .bind(&email)
        .bind(&fields.name)
        .bind(&hash)
        .bind(fields.is_active.unwrap_or(true))
        .bind(fields.is_staff)
        .bind(fields.is_superuser)
        .fetch_one(&self.db)
        .await;

        match inserted {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Created user {}", user.email);
                Ok(user)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AccountError::DuplicateEmail(email))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a user through [`create_user`](Self::create_user), then flags it staff and superuser.
    pub async fn create_superuser(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let user = self.create_user(email, Some(password), NewUserFields::default()).await?;
        self.update(
            user.id,
            UserChanges { is_staff: Some(true), is_superuser: Some(true), ..Default::default() },
        )
        .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>, AccountError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
            .bind(normalize_email(email))
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    /// Returns the user only if it exists, is active and `raw_password` matches.
    pub async fn authenticate(&self, email: &str, raw_password: &str) -> Result<Option<User>, AccountError> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        if !user.is_active || !self.check_password(&user, raw_password) {
            return Ok(None);
        }
        Ok(Some(user))
    }

    pub fn check_password(&self, user: &User, raw_password: &str) -> bool {
        password::verify_password(raw_password, &user.password)
    }

    pub async fn record_login(&self, id: i64) -> Result<(), AccountError> {
        sqlx::query("UPDATE users SET last_login = strftime('%Y-%m-%dT%H:%M:%SZ','now') WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Applies a partial update. A password change also revokes the user's token.
    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<User, AccountError> {
        let mut user = self.get(id).await?.ok_or(AccountError::NotFound(id))?;

        if let Some(email) = changes.email {
            if email.trim().is_empty() {
                return Err(AccountError::EmptyEmail);
            }
            user.email = normalize_email(&email);
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        let password_changed = changes.password.is_some();
        if let Some(raw) = changes.password {
            user.password = password::hash_password(&raw, self.hasher)?;
        }
        if let Some(v) = changes.is_active {
            user.is_active = v;
        }
        if let Some(v) = changes.is_staff {
            user.is_staff = v;
        }
        if let Some(v) = changes.is_superuser {
            user.is_superuser = v;
        }

        let updated = sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET email = ?1, name = ?2, password = ?3, is_active = ?4, is_staff = ?5, is_superuser = ?6
               WHERE id = ?7
               RETURNING *"#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AccountError::DuplicateEmail(user.email.clone())
            }
            other => other.into(),
        })?;

        if password_changed {
            token::revoke(&self.db, id).await?;
        }
        Ok(updated)
    }

    /// Deletes the user. Tokens, tags, ingredients and recipes go with it.
    pub async fn delete(&self, id: i64) -> Result<(), AccountError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?1").bind(id).execute(&self.db).await?;
        if res.rows_affected() == 0 {
            return Err(AccountError::NotFound(id));
        }
        tracing::info!(user_id = id, "Deleted user");
        Ok(())
    }

    /// All users ordered by email, optionally filtered by a case-insensitive substring of
    /// email or name.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<User>, AccountError> {
        let users = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(q) => {
                let pattern = format!("%{}%", escape_like(&q.to_lowercase()));
                sqlx::query_as::<_, User>(
                    r#"SELECT * FROM users
                       WHERE lower(email) LIKE ?1 ESCAPE '\' OR lower(name) LIKE ?1 ESCAPE '\'
                       ORDER BY email"#,
                )
                .bind(pattern)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY email")
                    .fetch_all(&self.db)
                    .await?
            }
        };
        Ok(users)
    }
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
