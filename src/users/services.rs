use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::config::UserSchema;
use crate::error::{UserError, UserResult};
use crate::users::dto::Fields;
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User, UserPatch};

const PROFILE_FIELDS: [&str; 5] = ["first_name", "last_name", "age", "phone_number", "location"];
const CREDENTIAL_FIELDS: [&str; 2] = ["email", "password"];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validation, uniqueness, hashing and persistence rules for user records.
#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn UserStore>,
    schema: UserSchema,
}

impl UserManager {
    pub fn new(store: Arc<dyn UserStore>, schema: UserSchema) -> Self {
        Self { store, schema }
    }

    pub fn schema(&self) -> UserSchema {
        self.schema
    }

    pub async fn create(&self, fields: &Fields) -> UserResult<User> {
        let mut required: Vec<&str> = PROFILE_FIELDS.to_vec();
        if self.schema.has_credentials() {
            required.extend(CREDENTIAL_FIELDS);
        }
        let missing: Vec<String> = required
            .into_iter()
            .filter(|key| fields.present(key).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "create rejected: missing fields");
            return Err(UserError::MissingFields(missing));
        }

        let first_name = required_text(fields, "first_name")?;
        let last_name = required_text(fields, "last_name")?;
        let age = required_integer::<i32>(fields, "age")?;
        let phone_number = required_integer::<i64>(fields, "phone_number")?;
        let location = required_text(fields, "location")?;

        let (email, password_hash) = if self.schema.has_credentials() {
            let email = required_text(fields, "email")?;
            if !is_valid_email(&email) {
                warn!(email = %email, "invalid email");
                return Err(UserError::Validation("Invalid email".into()));
            }
            if self.store.find_by_email(&email).await?.is_some() {
                warn!(email = %email, "email already registered");
                return Err(UserError::DuplicateEmail(email));
            }
            let password = required_text(fields, "password")?;
            (Some(email), Some(hash_password(&password)?))
        } else {
            (None, None)
        };

        let user = self
            .store
            .insert(NewUser {
                first_name,
                last_name,
                age,
                phone_number,
                location,
                email,
                password_hash,
            })
            .await?;
        info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn read(&self, id: i32) -> UserResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    pub async fn list(&self) -> UserResult<Vec<User>> {
        self.store.list().await
    }

    /// Merge the profile fields present in `fields`; everything else keeps
    /// its stored value. Email and password are never changed here.
    pub async fn update(&self, id: i32, fields: &Fields) -> UserResult<User> {
        let current = self.read(id).await?;

        let blank: Vec<String> = PROFILE_FIELDS
            .into_iter()
            .filter(|key| fields.is_blank(key))
            .map(str::to_string)
            .collect();
        if !blank.is_empty() {
            warn!(user_id = id, ?blank, "update rejected: blank fields");
            return Err(UserError::MissingFields(blank));
        }

        let patch = UserPatch {
            first_name: fields.text("first_name")?,
            last_name: fields.text("last_name")?,
            age: fields.integer("age")?,
            phone_number: fields.integer("phone_number")?,
            location: fields.text("location")?,
        };

        if patch.is_empty() {
            return Ok(current);
        }

        let user = self
            .store
            .update(id, patch)
            .await?
            .ok_or(UserError::NotFound(id))?;
        info!(user_id = id, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, id: i32) -> UserResult<()> {
        if !self.store.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }

    /// Same error for an unknown email and a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> UserResult<User> {
        if !self.schema.has_credentials() {
            return Err(UserError::InvalidCredentials);
        }
        let Some(user) = self.store.find_by_email(email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(UserError::InvalidCredentials);
        };
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(UserError::InvalidCredentials);
        };
        if !verify_password(password, hash)? {
            warn!(user_id = user.id, "login invalid password");
            return Err(UserError::InvalidCredentials);
        }
        Ok(user)
    }
}

fn required_text(fields: &Fields, key: &str) -> UserResult<String> {
    fields
        .text(key)?
        .ok_or_else(|| UserError::MissingFields(vec![key.to_string()]))
}

fn required_integer<T: TryFrom<i64>>(fields: &Fields, key: &str) -> UserResult<T> {
    fields
        .integer(key)?
        .ok_or_else(|| UserError::MissingFields(vec![key.to_string()]))
}
