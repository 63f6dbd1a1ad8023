use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    #[serde(default)]
    pub access_secret: String,
    #[serde(default)]
    pub refresh_secret: String,
    /// Observed default is 10; the unit here is seconds
    #[serde(default = "default_access_lifetime")]
    pub access_lifetime_seconds: u64,
    #[serde(default = "default_refresh_lifetime")]
    pub refresh_lifetime_seconds: u64,
}

impl JwtConfig {
    pub fn access_lifetime(&self) -> Duration {
        Duration::from_secs(self.access_lifetime_seconds)
    }

    pub fn refresh_lifetime(&self) -> Duration {
        Duration::from_secs(self.refresh_lifetime_seconds)
    }
}

/// Upper bound for any configured lifetime or timeout: ten years
pub const MAX_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

fn default_access_lifetime() -> u64 {
    10
}

fn default_refresh_lifetime() -> u64 {
    2 * 24 * 60 * 60
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

fn default_cookie_name() -> String {
    "sid".to_string()
}

fn default_idle_timeout() -> u64 {
    60 * 60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Legacy variables (JWT_Access_Secret_KEY, JWT_Refresh_Secret_KEY, DATABASE_URL)
    /// 2. Environment variables (USERGATE__JWT__ACCESS_SECRET, etc.)
    /// 3. Config file specified by path
    /// 4. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite:usergate.db?mode=rwc")?
            .set_default("database.max_connections", 5)?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Optional, ignored when missing
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("USERGATE")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(access_secret) = env::var("JWT_Access_Secret_KEY") {
            builder = builder.set_override("jwt.access_secret", access_secret)?;
        }
        if let Ok(refresh_secret) = env::var("JWT_Refresh_Secret_KEY") {
            builder = builder.set_override("jwt.refresh_secret", refresh_secret)?;
        }
        if let Ok(database_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration shared by every command
    ///
    /// Signing secrets are checked separately by [`Config::validate_secrets`].
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt.access_lifetime_seconds == 0 || self.jwt.refresh_lifetime_seconds == 0 {
            return Err("JWT lifetimes must be greater than 0".to_string());
        }
        if self.jwt.access_lifetime_seconds > MAX_LIFETIME_SECONDS
            || self.jwt.refresh_lifetime_seconds > MAX_LIFETIME_SECONDS
        {
            return Err(format!(
                "JWT lifetimes must not exceed {MAX_LIFETIME_SECONDS} seconds"
            ));
        }
        if self.session.idle_timeout_seconds == 0 {
            return Err("Session idle timeout must be greater than 0".to_string());
        }
        if self.session.idle_timeout_seconds > MAX_LIFETIME_SECONDS {
            return Err(format!(
                "Session idle timeout must not exceed {MAX_LIFETIME_SECONDS} seconds"
            ));
        }
        if self.database.max_connections < 1 {
            return Err("Database max_connections must be at least 1".to_string());
        }
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Signing secrets are required to serve requests
    ///
    /// Missing secrets are a startup failure, never a per-request one.
    pub fn validate_secrets(&self) -> Result<(), String> {
        if self.jwt.access_secret.is_empty() {
            return Err("JWT access secret is required (JWT_Access_Secret_KEY)".to_string());
        }
        if self.jwt.refresh_secret.is_empty() {
            return Err("JWT refresh secret is required (JWT_Refresh_Secret_KEY)".to_string());
        }
        Ok(())
    }
}
