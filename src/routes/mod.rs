pub mod auth;
pub mod health;
pub mod users;

use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use sqlx::SqlitePool;
use usergate_user::SqliteUserDirectory;

use crate::auth::Auth;
use crate::config::SessionConfig;
use crate::error::AppError;

pub use auth::{post_create_user, post_login, post_logout, post_update_token};
pub use health::{health, ready};
pub use users::{delete_user, get_user, get_users, post_user};

#[derive(Clone)]
pub struct AppState {
    pub auth: Auth,
    pub users: SqliteUserDirectory,
    pub session: SessionConfig,
    pub pool: SqlitePool,
}

/// Body of the delete endpoints
#[derive(Debug, Deserialize)]
pub struct DeleteInput {
    pub id: String,
}

/// Turn axum's JSON extractor rejection into a validation error
pub(crate) fn json_body<T>(body: Result<axum::Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|axum::Json(value)| value)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}
