use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid value for '{field}': {reason}")]
    Coercion { field: String, reason: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("User {0} not found")]
    NotFound(i32),

    #[error("User '{0}' not found")]
    UnknownId(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    pub fn coercion(field: &str, reason: impl Into<String>) -> Self {
        UserError::Coercion {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UserError::MissingFields(_) | UserError::Coercion { .. } | UserError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            UserError::DuplicateEmail(_) => StatusCode::CONFLICT,
            UserError::NotFound(_) | UserError::UnknownId(_) => StatusCode::NOT_FOUND,
            UserError::InvalidCredentials | UserError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            UserError::PasswordHash(_) | UserError::Token(_) | UserError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            UserError::MissingFields(_) => "missing_fields",
            UserError::Coercion { .. } => "coercion_error",
            UserError::Validation(_) => "validation_error",
            UserError::DuplicateEmail(_) => "duplicate_email",
            UserError::NotFound(_) | UserError::UnknownId(_) => "not_found",
            UserError::InvalidCredentials => "invalid_credentials",
            UserError::Unauthorized(_) => "unauthorized",
            UserError::PasswordHash(_) | UserError::Token(_) | UserError::Persistence(_) => {
                "internal_error"
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "error": {
                    "type": self.kind(),
                    "message": message
                }
            })),
        )
            .into_response()
    }
}
