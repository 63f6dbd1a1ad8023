use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde_json::json;
use usergate_user::{Identity, NewUser, UserDirectory, UserError};

use super::{AppState, DeleteInput, json_body};
use crate::error::AppError;

/// GET /v1/users
pub async fn get_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.users.list().await?;

    Ok(Json(json!({ "data": users })))
}

/// GET /v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_by_identity(&Identity::from(id))
        .await?
        .ok_or(UserError::NotFound)?;

    Ok(Json(json!({ "data": user })))
}

/// POST /v1/users
#[tracing::instrument(skip_all)]
pub async fn post_user(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(body)?;
    let user = state.users.create(input).await?;

    Ok(Json(json!({ "data": user })))
}

/// DELETE /v1/users, DELETE /v1/auth/delete
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    body: Result<Json<DeleteInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(body)?;
    state.users.delete(&Identity::from(input.id)).await?;

    Ok(Json(json!({ "message": "User deleted" })))
}
