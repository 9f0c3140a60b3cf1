//! Client configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_USER_KEY: &str = "user";
pub const DEFAULT_TOKEN_KEY: &str = "token";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid CAREHIVE_API_BASE_URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),
    #[error("invalid value for {key}: '{value}'")]
    InvalidNumber { key: String, value: String },
}

/// Backend paths the session layer calls. All are relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub refresh: String,
    pub me: String,
    pub register: String,
    pub forgot_password: String,
    pub reset_password: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/user/login".to_owned(),
            refresh: "/auth/refresh-token".to_owned(),
            me: "/user/me".to_owned(),
            register: "/user/register".to_owned(),
            forgot_password: "/user/forgotPassword".to_owned(),
            reset_password: "/user/resetPassword".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
    /// Upper bound on a single token-refresh call.
    pub refresh_secs: u64,
    /// Upper bound on the `/user/me` check run during hydration.
    pub verify_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    #[must_use]
    pub fn verify(&self) -> Duration {
        Duration::from_secs(self.verify_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            refresh_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            verify_secs: DEFAULT_VERIFY_TIMEOUT_SECS,
        }
    }
}

/// Keys of the persisted token/user pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub user: String,
    pub token: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self { user: DEFAULT_USER_KEY.to_owned(), token: DEFAULT_TOKEN_KEY.to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
    pub storage_keys: StorageKeys,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            endpoints: Endpoints::default(),
            timeouts: Timeouts::default(),
            storage_keys: StorageKeys::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CAREHIVE_API_BASE_URL`: default `http://localhost:8080`
    /// - `CAREHIVE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CAREHIVE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CAREHIVE_REFRESH_TIMEOUT_SECS`: default 10
    /// - `CAREHIVE_VERIFY_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL has no http(s) scheme or a timeout is
    /// not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = normalize_base_url(
            lookup("CAREHIVE_API_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;
        let timeouts = Timeouts {
            request_secs: parse_secs(&lookup, "CAREHIVE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_secs(&lookup, "CAREHIVE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            refresh_secs: parse_secs(&lookup, "CAREHIVE_REFRESH_TIMEOUT_SECS", DEFAULT_REFRESH_TIMEOUT_SECS)?,
            verify_secs: parse_secs(&lookup, "CAREHIVE_VERIFY_TIMEOUT_SECS", DEFAULT_VERIFY_TIMEOUT_SECS)?,
        };
        Ok(Self { api_base_url, endpoints: Endpoints::default(), timeouts, storage_keys: StorageKeys::default() })
    }

    /// Override the base URL, applying the same normalization as `from_env`.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` has no http(s) scheme.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_base_url(url)?;
        Ok(self)
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidNumber { key: key.to_owned(), value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
