use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use serde::{Deserialize, Serialize};
use serde_json::json;
use usergate_user::NewUser;

use super::{AppState, json_body};
use crate::auth::{Session, SessionUser, TokenPair, build_session_cookie};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Public user fields plus the freshly issued pair
#[derive(Debug, Serialize)]
pub struct LoginData {
    #[serde(flatten)]
    pub user: SessionUser,
    pub token: TokenPair,
}

/// POST /v1/auth/createUser
#[tracing::instrument(skip_all)]
pub async fn post_create_user(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(body)?;
    let user = state.users.create(input).await?;

    Ok(Json(json!({ "user": user })))
}

/// POST /v1/auth/login
#[tracing::instrument(skip_all)]
pub async fn post_login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(body)?;

    let Some(user) = state
        .users
        .authenticate(&input.email, &input.password)
        .await?
    else {
        tracing::warn!("Failed login attempt");
        return Err(AppError::InvalidCredentials);
    };

    let session = state.auth.login(&user).await?;

    let cookie = build_session_cookie(
        state.session.cookie_name.clone(),
        session.id.clone(),
        state.session.idle_timeout_seconds,
    );

    let data = LoginData {
        user: session.record.user,
        token: session.record.token,
    };

    Ok((jar.add(cookie), Json(json!({ "data": data }))))
}

/// POST /v1/auth/logout
///
/// Succeeds whether or not a session is still open.
#[tracing::instrument(skip_all)]
pub async fn post_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let session_id = jar
        .get(&state.session.cookie_name)
        .map(|cookie| cookie.value().to_owned());

    let message = match state.auth.logout(session_id.as_deref()).await? {
        Some(record) => format!("User {} successful logout", record.user.full_name),
        None => "Already logged out".to_string(),
    };

    let jar = jar.remove(Cookie::build(state.session.cookie_name.clone()).path("/"));

    Ok((jar, Json(json!({ "message": message }))))
}

/// POST /v1/auth/updateToken
///
/// Sits behind the authorization gate; by the time this runs the session
/// holds a valid pair, renewed if the access token had expired.
pub async fn post_update_token(Extension(session): Extension<Session>) -> impl IntoResponse {
    Json(json!({ "data": { "token": session.record.token } }))
}
