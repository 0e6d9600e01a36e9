use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, ProfileResponse, RefreshRequest, SignupResponse},
        jwt::{AuthUser, JwtKeys},
    },
    error::{UserError, UserResult},
    state::AppState,
    users::{
        dto::{Fields, MessageResponse},
        repo_types::User,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
}

fn keys(state: &AppState) -> UserResult<&JwtKeys> {
    state
        .jwt
        .as_ref()
        .ok_or_else(|| UserError::Unauthorized("authentication is disabled".into()))
}

fn form_body<T>(body: Result<Form<T>, FormRejection>) -> UserResult<T> {
    body.map(|Form(value)| value)
        .map_err(|e| UserError::Validation(e.body_text()))
}

fn issue_tokens(keys: &JwtKeys, user: User, message: String) -> UserResult<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        message,
        user,
    })
}

#[instrument(skip(state, form))]
pub async fn signup(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> UserResult<(StatusCode, Json<SignupResponse>)> {
    let form = form_body(form)?;
    let user = state.users.create(&Fields::from(form)).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Form<LoginRequest>, FormRejection>,
) -> UserResult<Json<AuthResponse>> {
    let payload = form_body(payload)?;
    let keys = keys(&state)?;
    let user = state
        .users
        .authenticate(&payload.email, &payload.password)
        .await?;

    info!(user_id = user.id, "user logged in");
    let message = format!("Logged in successfully! Welcome, {}", user.first_name);
    Ok(Json(issue_tokens(keys, user, message)?))
}

#[instrument(skip(state, body))]
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> UserResult<Json<AuthResponse>> {
    let Json(payload) = body.map_err(|e| UserError::Validation(e.body_text()))?;
    let keys = keys(&state)?;
    let user_id = keys
        .verify_refresh(&payload.refresh_token)
        .and_then(|claims| claims.user_id())
        .map_err(|e| UserError::Unauthorized(e.to_string()))?;

    let user = match state.users.read(user_id).await {
        Ok(user) => user,
        Err(UserError::NotFound(_)) => {
            return Err(UserError::Unauthorized("User not found".into()));
        }
        Err(e) => return Err(e),
    };
    Ok(Json(issue_tokens(keys, user, "Token refreshed".into())?))
}

/// Tokens are stateless; the client drops them.
#[instrument(skip_all)]
pub async fn logout(AuthUser(user_id): AuthUser) -> Json<MessageResponse> {
    info!(user_id, "user logged out");
    Json(MessageResponse {
        message: "You have been logged out.",
    })
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> UserResult<Json<ProfileResponse>> {
    let user = match state.users.read(user_id).await {
        Ok(user) => user,
        Err(UserError::NotFound(_)) => {
            return Err(UserError::Unauthorized("User not found".into()));
        }
        Err(e) => return Err(e),
    };
    Ok(Json(ProfileResponse {
        name: user.first_name.clone(),
        user,
    }))
}
