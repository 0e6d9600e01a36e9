use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User, UserPatch};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i32, User>,
    last_id: i32,
}

/// In-memory `UserStore` with the same id and uniqueness rules as the
/// `users` table. Used by tests and local runs without Postgres.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    table: Arc<RwLock<Table>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn count(&self) -> usize {
        self.table.read().await.rows.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> UserResult<User> {
        let mut table = self.table.write().await;

        if let Some(email) = &user.email {
            if table.rows.values().any(|u| u.email.as_ref() == Some(email)) {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }

        // SERIAL never reuses ids, even after deletes.
        table.last_id += 1;
        let row = User {
            id: table.last_id,
            first_name: user.first_name,
            last_name: user.last_name,
            age: user.age,
            phone_number: user.phone_number,
            location: user.location,
            email: user.email,
            password_hash: user.password_hash,
        };
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i32) -> UserResult<Option<User>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn update(&self, id: i32, patch: UserPatch) -> UserResult<Option<User>> {
        let mut table = self.table.write().await;
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(row);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i32) -> UserResult<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}
