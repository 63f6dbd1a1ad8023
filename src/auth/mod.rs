//! Authentication token lifecycle
//!
//! Login mints a token pair and opens a server-side session, protected
//! requests pass through the [`AuthorizationGate`], logout drops both the
//! session and the persisted refresh token.

pub mod gate;
pub mod session;
pub mod token;

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use thiserror::Error;
use usergate_user::{User, UserDirectory, UserError};

pub use gate::{AuthorizationGate, Decision};
pub use session::{
    Session, SessionError, SessionRecord, SessionStore, SessionUser, SqliteSessionStore,
};
pub use token::{TokenConfig, TokenIssuer, TokenPair, Verification};

/// Message returned with every denied request
pub const ACCESS_ERROR: &str = "Acces Error, need auth!";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User directory error: {0}")]
    Persistence(#[from] UserError),

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),

    #[error("Token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Entry point for login, authorization and logout
#[derive(Clone)]
pub struct Auth {
    issuer: TokenIssuer,
    gate: AuthorizationGate,
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
}

impl Auth {
    pub fn new(
        config: TokenConfig,
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let issuer = TokenIssuer::new(config, directory.clone());
        let gate = AuthorizationGate::new(issuer.clone(), directory.clone(), sessions.clone());

        Self {
            issuer,
            gate,
            directory,
            sessions,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Issue a fresh pair for an authenticated user and open a session
    #[tracing::instrument(skip_all, fields(user_id = %user.id))]
    pub async fn login(&self, user: &User) -> Result<Session, AuthError> {
        let token = self.issuer.issue(&user.id).await?;

        let session = self
            .sessions
            .create(SessionRecord {
                user: SessionUser::from(user),
                token,
            })
            .await?;

        tracing::info!("User logged in");

        Ok(session)
    }

    /// Load the session behind `session_id` and run it through the gate
    pub async fn authorize(&self, session_id: Option<&str>) -> Result<Decision, AuthError> {
        let session = match session_id {
            Some(id) => self.sessions.load(id).await?,
            None => None,
        };

        self.gate.authorize(session).await
    }

    /// Clear the identity's refresh token and destroy the session
    ///
    /// Without a live session this is a successful no-op, so repeated
    /// logouts never fault. Returns the record that was closed, if any.
    pub async fn logout(
        &self,
        session_id: Option<&str>,
    ) -> Result<Option<SessionRecord>, AuthError> {
        let Some(id) = session_id else {
            return Ok(None);
        };

        let Some(session) = self.sessions.load(id).await? else {
            tracing::debug!("Logout without a live session");
            return Ok(None);
        };

        self.directory
            .clear_refresh_token(&session.record.user.id)
            .await?;
        self.sessions.destroy(&session.id).await?;

        tracing::info!(user_id = %session.record.user.id, "User logged out");

        Ok(Some(session.record))
    }
}

/// HTTP-only cookie carrying the session id
pub fn build_session_cookie<'a>(
    name: String,
    session_id: String,
    max_age_seconds: u64,
) -> Cookie<'a> {
    Cookie::build((name, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(
            i64::try_from(max_age_seconds).unwrap_or(i64::MAX),
        ))
        .build()
}
