//! Web server implementation using Axum

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tower_http::trace::TraceLayer;
use usergate_user::SqliteUserDirectory;

use crate::auth::{Auth, SqliteSessionStore, TokenConfig};
use crate::config::Config;
use crate::middleware::auth_middleware;
use crate::routes::{
    AppState, delete_user, get_user, get_users, health, post_create_user, post_login,
    post_logout, post_update_token, post_user, ready,
};

/// Wire the directory, session store and token lifecycle over one pool
pub fn build_state(config: &Config, pool: SqlitePool) -> AppState {
    let users = SqliteUserDirectory::new(pool.clone());
    let sessions = SqliteSessionStore::new(
        pool.clone(),
        Duration::from_secs(config.session.idle_timeout_seconds),
    );

    let auth = Auth::new(
        TokenConfig::from(&config.jwt),
        Arc::new(users.clone()),
        Arc::new(sessions),
    );

    AppState {
        auth,
        users,
        session: config.session.clone(),
        pool,
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/v1/auth/updateToken", post(post_update_token))
        .route("/v1/auth/delete", delete(delete_user))
        .route("/v1/users", get(get_users).post(post_user).delete(delete_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/v1/auth/createUser", post(post_create_user))
        .route("/v1/auth/login", post(post_login))
        .route("/v1/auth/logout", post(post_logout))
        .route("/v1/users/{id}", get(get_user))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}

/// Start the web server
#[tracing::instrument(skip(config))]
pub async fn serve(config: Config, host: String, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting usergate server...");

    let pool = connect(&config).await?;
    run_migrations(&pool).await?;

    let app = create_router(build_state(&config, pool));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
