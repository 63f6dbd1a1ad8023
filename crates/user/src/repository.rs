use sqlx::{SqlitePool, prelude::FromRow};
use time::OffsetDateTime;

use crate::error::UserResult;

#[derive(FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub created_at: i64,
}

pub(crate) enum FindType<'a> {
    Id(&'a str),
    Email(&'a str),
    RefreshToken(&'a str),
}

pub(crate) async fn find(pool: &SqlitePool, arg_type: FindType<'_>) -> UserResult<Option<UserRow>> {
    let (column, value) = match arg_type {
        FindType::Id(id) => ("id", id),
        FindType::Email(email) => ("email", email),
        FindType::RefreshToken(token) => ("refresh_token", token),
    };

    let sql = format!(
        "SELECT id, email, full_name, password, created_at FROM users WHERE {column} = ?1 LIMIT 1"
    );

    Ok(sqlx::query_as::<_, UserRow>(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await?)
}

pub(crate) async fn list(pool: &SqlitePool) -> UserResult<Vec<UserRow>> {
    Ok(sqlx::query_as::<_, UserRow>(
        "SELECT id, email, full_name, password, created_at FROM users ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?)
}

pub(crate) async fn create(
    pool: &SqlitePool,
    id: &str,
    email: &str,
    full_name: &str,
    password: &str,
) -> Result<i64, sqlx::Error> {
    let now = OffsetDateTime::now_utc().unix_timestamp();

    sqlx::query(
        "INSERT INTO users (id, email, full_name, password, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(id)
    .bind(email)
    .bind(full_name)
    .bind(password)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(now)
}

/// Returns the number of rows touched
pub(crate) async fn set_refresh_token(
    pool: &SqlitePool,
    id: &str,
    token: Option<&str>,
) -> UserResult<u64> {
    let result = sqlx::query("UPDATE users SET refresh_token = ?1 WHERE id = ?2")
        .bind(token)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn delete(pool: &SqlitePool, id: &str) -> UserResult<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
