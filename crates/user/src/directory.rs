use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::password::{hash_password, verify_password};
use crate::repository::{self, FindType, UserRow};
use crate::{Identity, NewUser, User};

/// Lookups and refresh-token bookkeeping the token lifecycle depends on
///
/// Exactly one refresh token is stored per identity. Persisting a new one
/// overwrites the previous value; concurrent writers race and the last one
/// wins.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_identity(&self, id: &Identity) -> UserResult<Option<User>>;

    async fn find_by_refresh_token(&self, token: &str) -> UserResult<Option<User>>;

    /// Fails with [`UserError::NotFound`] when no row carries `id`.
    async fn persist_refresh_token(&self, id: &Identity, token: &str) -> UserResult<()>;

    /// Idempotent: clearing an already empty slot, or an unknown identity, succeeds.
    async fn clear_refresh_token(&self, id: &Identity) -> UserResult<()>;
}

/// SQLite backed user records
#[derive(Clone)]
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: NewUser) -> UserResult<User> {
        let password = hash_password(&input.password)?;
        let id = Uuid::new_v4().to_string();

        let created_at = repository::create(
            &self.pool,
            &id,
            &input.email,
            &input.full_name,
            &password,
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                UserError::EmailAlreadyExists
            }
            e => UserError::DatabaseError(e),
        })?;

        tracing::info!(user_id = %id, "User created");

        Ok(User {
            id: Identity::from(id),
            email: input.email,
            full_name: input.full_name,
            created_at,
        })
    }

    /// Resolve a user from login credentials
    ///
    /// Returns `None` both for an unknown email and for a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> UserResult<Option<User>> {
        let Some(row) = repository::find(&self.pool, FindType::Email(email)).await? else {
            return Ok(None);
        };

        if !verify_password(password, &row.password)? {
            return Ok(None);
        }

        Ok(Some(row.into()))
    }

    pub async fn list(&self) -> UserResult<Vec<User>> {
        let rows = repository::list(&self.pool).await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn delete(&self, id: &Identity) -> UserResult<()> {
        if repository::delete(&self.pool, id.as_str()).await? == 0 {
            return Err(UserError::NotFound);
        }

        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn find_by_identity(&self, id: &Identity) -> UserResult<Option<User>> {
        let row = repository::find(&self.pool, FindType::Id(id.as_str())).await?;

        Ok(row.map(User::from))
    }

    async fn find_by_refresh_token(&self, token: &str) -> UserResult<Option<User>> {
        let row = repository::find(&self.pool, FindType::RefreshToken(token)).await?;

        Ok(row.map(User::from))
    }

    async fn persist_refresh_token(&self, id: &Identity, token: &str) -> UserResult<()> {
        if repository::set_refresh_token(&self.pool, id.as_str(), Some(token)).await? == 0 {
            return Err(UserError::NotFound);
        }

        Ok(())
    }

    async fn clear_refresh_token(&self, id: &Identity) -> UserResult<()> {
        repository::set_refresh_token(&self.pool, id.as_str(), None).await?;

        Ok(())
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: Identity::from(row.id),
            email: row.email,
            full_name: row.full_name,
            created_at: row.created_at,
        }
    }
}
