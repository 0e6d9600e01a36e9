use serde::{Deserialize, Serialize};

use crate::users::repo_types::User;

/// Login form. Missing keys become empty strings and fail authentication.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    #[serde(flatten)]
    pub user: User,
}

/// Body returned by signup.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: User,
}
