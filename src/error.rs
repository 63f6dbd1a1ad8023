use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use usergate_user::UserError;

use crate::auth::{ACCESS_ERROR, AuthError};

const DEFAULT_ERROR: &str = "An error has occurred";

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, forged or unrenewable credential
    #[error("Acces Error, need auth!")]
    AccessError,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    AuthError(#[from] AuthError),

    #[error(transparent)]
    UserError(#[from] UserError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, message) = match self {
            AppError::AccessError => (StatusCode::UNAUTHORIZED, ACCESS_ERROR.to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::ValidationError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::UserError(UserError::EmailAlreadyExists) => {
                (StatusCode::CONFLICT, "Email already registered".to_string())
            }
            AppError::UserError(UserError::NotFound) => {
                (StatusCode::NOT_FOUND, "User not found".to_string())
            }
            AppError::UserError(e) => {
                tracing::error!("User directory error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, DEFAULT_ERROR.to_string())
            }
            AppError::AuthError(e) => {
                tracing::error!("Auth error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, DEFAULT_ERROR.to_string())
            }
        };

        (status_code, Json(json!({ "message": message }))).into_response()
    }
}
