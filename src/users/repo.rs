use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::is_unique_violation;
use crate::error::{UserError, UserResult};
use crate::users::repo_types::{NewUser, User, UserPatch};

/// Persistence boundary for user records.
///
/// Every method is a single atomic operation against the backing store:
/// either the whole change is visible afterwards or none of it is.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a row, assigning the next id. A taken email is reported as
    /// `DuplicateEmail` even when the caller's pre-check raced.
    async fn insert(&self, user: NewUser) -> UserResult<User>;

    async fn find_by_id(&self, id: i32) -> UserResult<Option<User>>;

    /// Exact, case-sensitive email match.
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// All rows ordered by id.
    async fn list(&self) -> UserResult<Vec<User>>;

    /// Merge `patch` into the row; `None` if the row does not exist.
    async fn update(&self, id: i32, patch: UserPatch) -> UserResult<Option<User>>;

    /// `false` if there was nothing to delete.
    async fn delete(&self, id: i32) -> UserResult<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> UserResult<User> {
        let email = user.email.clone();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, age, phone_number, location, email, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, first_name, last_name, age, phone_number, location, email, password_hash
            "#,
        )
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.age)
        .bind(user.phone_number)
        .bind(user.location)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| insert_error(e, email))
    }

    async fn find_by_id(&self, id: i32) -> UserResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, age, phone_number, location, email, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, age, phone_number, location, email, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, age, phone_number, location, email, password_hash
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> UserResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET first_name   = COALESCE($2, first_name),
                   last_name    = COALESCE($3, last_name),
                   age          = COALESCE($4, age),
                   phone_number = COALESCE($5, phone_number),
                   location     = COALESCE($6, location)
             WHERE id = $1
            RETURNING id, first_name, last_name, age, phone_number, location, email, password_hash
            "#,
        )
        .bind(id)
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.age)
        .bind(patch.phone_number)
        .bind(patch.location)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: i32) -> UserResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn insert_error(e: sqlx::Error, email: Option<String>) -> UserError {
    if let sqlx::Error::Database(db) = &e {
        if is_unique_violation(db.as_ref()) {
            return UserError::DuplicateEmail(email.unwrap_or_default());
        }
    }
    UserError::Persistence(e)
}
