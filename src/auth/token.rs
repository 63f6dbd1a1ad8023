//! Token issuer: mints access/refresh pairs and verifies them

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use usergate_user::{Identity, UserDirectory};
use uuid::Uuid;

use super::AuthError;
use crate::config::JwtConfig;

/// Signing secrets and lifetimes, injected at construction
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
}

impl From<&JwtConfig> for TokenConfig {
    fn from(config: &JwtConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_lifetime: config.access_lifetime(),
            refresh_lifetime: config.refresh_lifetime(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Access token payload
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Identity the token was minted for
    pub sub: Identity,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

/// Refresh token payload; carries no identity
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

trait Expiring {
    fn exp(&self) -> u64;
}

impl Expiring for AccessClaims {
    fn exp(&self) -> u64 {
        self.exp
    }
}

impl Expiring for RefreshClaims {
    fn exp(&self) -> u64 {
        self.exp
    }
}

/// Outcome of checking a token's signature and expiry
///
/// `Expired` is only reported for tokens whose signature checked out.
#[derive(Debug, Clone)]
pub enum Verification<T> {
    Valid(T),
    Expired,
    Invalid,
}

impl<T> Verification<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }
}

struct Keys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_lifetime: u64,
    refresh_lifetime: u64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<Keys>,
    directory: Arc<dyn UserDirectory>,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig, directory: Arc<dyn UserDirectory>) -> Self {
        let keys = Keys {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_lifetime: config.access_lifetime.as_secs(),
            refresh_lifetime: config.refresh_lifetime.as_secs(),
        };

        Self {
            keys: Arc::new(keys),
            directory,
        }
    }

    /// Mint a pair for `identity` and overwrite its persisted refresh token
    ///
    /// The previous refresh token stops resolving as soon as the write lands.
    #[tracing::instrument(skip_all, fields(user_id = %identity))]
    pub async fn issue(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        let pair = self.mint(identity, unix_now())?;

        self.directory
            .persist_refresh_token(identity, &pair.refresh_token)
            .await?;

        tracing::debug!("Token pair issued");

        Ok(pair)
    }

    /// Sign a pair as if issued at `now` (unix seconds), without persisting
    pub fn mint(&self, identity: &Identity, now: u64) -> Result<TokenPair, AuthError> {
        let access = AccessClaims {
            sub: identity.clone(),
            iat: now,
            exp: now.saturating_add(self.keys.access_lifetime),
            jti: Uuid::new_v4().to_string(),
        };
        let refresh = RefreshClaims {
            iat: now,
            exp: now.saturating_add(self.keys.refresh_lifetime),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);

        Ok(TokenPair {
            access_token: encode(&header, &access, &self.keys.access_encoding)?,
            refresh_token: encode(&header, &refresh, &self.keys.refresh_encoding)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Verification<AccessClaims> {
        verify(token, &self.keys.access_decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> Verification<RefreshClaims> {
        verify(token, &self.keys.refresh_decoding)
    }
}

fn verify<T>(token: &str, key: &DecodingKey) -> Verification<T>
where
    T: DeserializeOwned + Clone + Expiring,
{
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    match decode::<T>(token, key, &validation) {
        // exp must be strictly in the future, second granularity
        Ok(data) if data.claims.exp() > unix_now() => Verification::Valid(data.claims),
        Ok(_) => Verification::Expired,
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Verification::Expired,
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            Verification::Invalid
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    u64::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or_default()
}
