//! Shared setup for router tests

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tower::ServiceExt;
use usergate::AppState;
use usergate::config::{
    Config, DatabaseConfig, JwtConfig, ObservabilityConfig, ServerConfig, SessionConfig,
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: SqlitePool,
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_lifetime_seconds: 10,
            refresh_lifetime_seconds: 2 * 24 * 60 * 60,
        },
        session: SessionConfig::default(),
        observability: ObservabilityConfig::default(),
    }
}

/// In-memory database with migrations applied and the full router on top
pub async fn setup_test_app() -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();

    usergate::server::run_migrations(&pool).await.unwrap();

    let state = usergate::build_state(&test_config(), pool.clone());
    let router = usergate::create_router(state.clone());

    TestApp {
        router,
        state,
        pool,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Value of the `sid` cookie set by this response
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find_map(|pair| pair.strip_prefix("sid="))
            .map(str::to_owned)
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        session_id: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(sid) = session_id {
            builder = builder.header(header::COOKIE, format!("sid={sid}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Register a user and log it in, returning (user id, session id)
    pub async fn register_and_login(&self, email: &str) -> (String, String) {
        let created = self
            .request(
                "POST",
                "/v1/auth/createUser",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "fullName": "Ada Lovelace",
                    "password": "Password123",
                })),
            )
            .await;
        assert_eq!(created.status, StatusCode::OK);
        let user_id = created.body["user"]["id"].as_str().unwrap().to_owned();

        let login = self
            .request(
                "POST",
                "/v1/auth/login",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": "Password123",
                })),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK);
        let session_id = login.session_cookie().unwrap();

        (user_id, session_id)
    }
}
