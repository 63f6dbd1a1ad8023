//! Server-side session records keyed by an opaque cookie id

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, prelude::FromRow};
use thiserror::Error;
use usergate_user::{Identity, User};
use uuid::Uuid;

use super::token::{TokenPair, unix_now};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session payload error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Public fields of the logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Identity,
    pub email: String,
    pub full_name: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: SessionUser,
    pub token: TokenPair,
}

/// A record together with the id it is stored under
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub record: SessionRecord,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, record: SessionRecord) -> Result<Session, SessionError>;

    /// `None` for unknown or idle-expired sessions
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError>;

    /// Replace the stored record in one write
    async fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Idempotent
    async fn destroy(&self, id: &str) -> Result<(), SessionError>;
}

#[derive(FromRow)]
struct SessionRow {
    data: String,
    expires_at: i64,
}

/// SQLite backed sessions with a sliding idle timeout
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
    idle_timeout: Duration,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool, idle_timeout: Duration) -> Self {
        Self { pool, idle_timeout }
    }

    fn next_expiry(&self) -> i64 {
        let expiry = unix_now().saturating_add(self.idle_timeout.as_secs());
        i64::try_from(expiry).unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, record: SessionRecord) -> Result<Session, SessionError> {
        let id = Uuid::new_v4().to_string();
        let data = serde_json::to_string(&record)?;

        sqlx::query("INSERT INTO sessions (id, user_id, data, expires_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&id)
            .bind(record.user.id.as_str())
            .bind(data)
            .bind(self.next_expiry())
            .execute(&self.pool)
            .await?;

        tracing::debug!(user_id = %record.user.id, "Session created");

        Ok(Session { id, record })
    }

    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT data, expires_at FROM sessions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let now = i64::try_from(unix_now()).unwrap_or(i64::MAX);
        if row.expires_at <= now {
            tracing::debug!("Session expired after inactivity");
            self.destroy(id).await?;
            return Ok(None);
        }

        sqlx::query("UPDATE sessions SET expires_at = ?1 WHERE id = ?2")
            .bind(self.next_expiry())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Some(Session {
            id: id.to_owned(),
            record: serde_json::from_str(&row.data)?,
        }))
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let data = serde_json::to_string(&session.record)?;

        sqlx::query("UPDATE sessions SET data = ?1, expires_at = ?2 WHERE id = ?3")
            .bind(data)
            .bind(self.next_expiry())
            .bind(&session.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();

        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        pool
    }

    fn record() -> SessionRecord {
        SessionRecord {
            user: SessionUser {
                id: Identity::from("user-1"),
                email: "ada@example.com".to_string(),
                full_name: "Ada Lovelace".to_string(),
            },
            token: TokenPair {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_load_save_destroy() {
        let store = SqliteSessionStore::new(setup_pool().await, Duration::from_secs(3600));

        let mut session = store.create(record()).await.unwrap();
        assert_eq!(store.load(&session.id).await.unwrap(), Some(session.clone()));

        session.record.token.access_token = "renewed".to_string();
        store.save(&session).await.unwrap();
        let loaded = store.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.record.token.access_token, "renewed");
        assert_eq!(loaded.record.token.refresh_token, "refresh");

        store.destroy(&session.id).await.unwrap();
        store.destroy(&session.id).await.unwrap();
        assert!(store.load(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        let store = SqliteSessionStore::new(setup_pool().await, Duration::from_secs(3600));

        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let pool = setup_pool().await;
        let store = SqliteSessionStore::new(pool.clone(), Duration::from_secs(3600));
        let session = store.create(record()).await.unwrap();

        sqlx::query("UPDATE sessions SET expires_at = ?1 WHERE id = ?2")
            .bind(i64::try_from(unix_now()).unwrap() - 1)
            .bind(&session.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(store.load(&session.id).await.unwrap().is_none());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_oversized_idle_timeout_keeps_session_alive() {
        let store = SqliteSessionStore::new(setup_pool().await, Duration::from_secs(u64::MAX));

        let session = store.create(record()).await.unwrap();

        assert_eq!(store.load(&session.id).await.unwrap(), Some(session));
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(record()).unwrap();

        assert_eq!(json["user"]["fullName"], "Ada Lovelace");
        assert_eq!(json["token"]["accessToken"], "access");
        assert_eq!(json["token"]["refreshToken"], "refresh");
    }
}
