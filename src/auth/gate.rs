//! Authorization gate for protected requests
//!
//! ```text
//! NoSession  -> Deny
//! HasSession -> VerifyAccess -> Allow
//!                            -> RenewAccess -> Allow | Deny
//!                            -> Deny (forged or malformed)
//! ```

use std::sync::Arc;

use usergate_user::UserDirectory;

use super::AuthError;
use super::session::{Session, SessionStore};
use super::token::{TokenIssuer, Verification};

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Carries the session as it stands after any renewal
    Allow(Session),
    Deny,
}

#[derive(Clone)]
pub struct AuthorizationGate {
    issuer: TokenIssuer,
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthorizationGate {
    pub fn new(
        issuer: TokenIssuer,
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            issuer,
            directory,
            sessions,
        }
    }

    /// Decide whether the request owning `session` may proceed
    ///
    /// Every verification failure ends in [`Decision::Deny`]. Only directory
    /// and session store failures during renewal come back as `Err`.
    pub async fn authorize(&self, session: Option<Session>) -> Result<Decision, AuthError> {
        let Some(session) = session else {
            tracing::debug!("No session, access denied");
            return Ok(Decision::Deny);
        };

        match self.issuer.verify_access(&session.record.token.access_token) {
            Verification::Valid(_) => Ok(Decision::Allow(session)),
            Verification::Expired => self.renew(session).await,
            Verification::Invalid => {
                tracing::warn!(
                    user_id = %session.record.user.id,
                    "Invalid access token in session"
                );
                Ok(Decision::Deny)
            }
        }
    }

    #[tracing::instrument(skip_all, fields(user_id = %session.record.user.id))]
    async fn renew(&self, mut session: Session) -> Result<Decision, AuthError> {
        if !self
            .issuer
            .verify_refresh(&session.record.token.refresh_token)
            .is_valid()
        {
            tracing::info!("Refresh token expired or invalid, access denied");
            return Ok(Decision::Deny);
        }

        let Some(user) = self
            .directory
            .find_by_refresh_token(&session.record.token.refresh_token)
            .await?
        else {
            tracing::info!("Refresh token no longer on record, access denied");
            return Ok(Decision::Deny);
        };

        // issue() has already replaced the persisted refresh token, so the
        // session takes the whole pair to stay renewable.
        let pair = self.issuer.issue(&user.id).await?;
        session.record.token = pair;
        self.sessions.save(&session).await?;

        if !self
            .issuer
            .verify_access(&session.record.token.access_token)
            .is_valid()
        {
            tracing::warn!("Renewed access token failed verification");
            return Ok(Decision::Deny);
        }

        tracing::info!("Access token renewed");

        Ok(Decision::Allow(session))
    }
}
