use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::auth::Decision;
use crate::error::AppError;
use crate::routes::AppState;

/// Authorization gate as request middleware
///
/// Reads the session cookie, lets the gate verify or renew the access token,
/// and inserts the resulting `Session` extension for handlers.
/// Every denial is a 401 with the fixed access message; only store failures
/// during renewal surface as a 500.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session_id = jar
        .get(&state.session.cookie_name)
        .map(|cookie| cookie.value().to_owned());

    match state.auth.authorize(session_id.as_deref()).await {
        Ok(Decision::Allow(session)) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Ok(Decision::Deny) => {
            tracing::warn!("Access denied on protected route");
            AppError::AccessError.into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}
