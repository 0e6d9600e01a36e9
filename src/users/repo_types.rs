use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub phone_number: i64,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>, // Argon2 PHC string, not exposed in JSON
}

/// Validated row ready for insertion; `id` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub phone_number: i64,
    pub location: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub phone_number: Option<i64>,
    pub location: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == UserPatch::default()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.age {
            user.age = v;
        }
        if let Some(v) = self.phone_number {
            user.phone_number = v;
        }
        if let Some(v) = self.location {
            user.location = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: 1,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            age: 36,
            phone_number: 5551234,
            location: "London".into(),
            email: Some("ada@example.com".into()),
            password_hash: Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into()),
        }
    }

    #[test]
    fn serialization_never_contains_password_hash() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("password_hash"));
        assert_eq!(obj["email"], "ada@example.com");
        assert_eq!(obj["phone_number"], 5551234);
    }

    #[test]
    fn email_is_omitted_for_basic_records() {
        let user = User {
            email: None,
            password_hash: None,
            ..sample()
        };
        let json = serde_json::to_value(user).unwrap();
        assert!(!json.as_object().unwrap().contains_key("email"));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut user = sample();
        UserPatch {
            location: Some("Paris".into()),
            ..Default::default()
        }
        .apply(&mut user);
        assert_eq!(user.location, "Paris");
        assert_eq!(User { location: "London".into(), ..user }, sample());
    }
}
