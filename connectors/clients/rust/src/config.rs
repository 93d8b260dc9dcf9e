// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Client configuration.
//!
//! ```rust
//! use awaredb_client::{ClientConfig, Credentials};
//!
//! let config = ClientConfig::new("my-db", Credentials::token("abc123"));
//! assert_eq!(config.host, "https://aware-db.com");
//! config.validate().unwrap();
//! ```

use std::time::Duration;

use crate::error::{AwareDbError, Result};
use crate::transport::Credentials;

/// Default server.
pub const DEFAULT_HOST: &str = "https://aware-db.com";
/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
/// Default timeout for the token exchange.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variables read by [`ClientConfig::from_env`].
pub mod env {
    pub const HOST: &str = "AWAREDB_HOST";
    pub const DB: &str = "AWAREDB_DB";
    pub const TOKEN: &str = "AWAREDB_TOKEN";
    pub const USER: &str = "AWAREDB_USER";
    pub const PASSWORD: &str = "AWAREDB_PASSWORD";
    pub const TIMEOUT_SECS: &str = "AWAREDB_TIMEOUT_SECS";
}

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server.
    pub host: String,
    /// Database name.
    pub db: String,
    pub credentials: Option<Credentials>,
    /// Per-command timeout.
    pub timeout: Duration,
    /// Timeout for the token exchange.
    pub login_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            db: String::new(),
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(db: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            db: db.into(),
            credentials: Some(credentials),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read configuration from `AWAREDB_*` environment variables.
    ///
    /// A token takes precedence over a username and password. Nothing is
    /// validated here; call [`ClientConfig::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup(env::HOST) {
            config.host = host;
        }
        if let Some(db) = lookup(env::DB) {
            config.db = db;
        }
        config.credentials = match (lookup(env::TOKEN), lookup(env::USER), lookup(env::PASSWORD)) {
            (Some(token), _, _) => Some(Credentials::Token(token)),
            (None, Some(username), Some(password)) => Some(Credentials::Login { username, password }),
            _ => None,
        };
        if let Some(raw) = lookup(env::TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AwareDbError::Config(format!("{} must be a whole number of seconds, got '{raw}'", env::TIMEOUT_SECS))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Check that a database and usable credentials are present.
    pub fn validate(&self) -> Result<&Credentials> {
        if self.host.trim().is_empty() {
            return Err(AwareDbError::Config("host is required".into()));
        }
        if self.db.trim().is_empty() {
            return Err(AwareDbError::Config("database name is required".into()));
        }
        match &self.credentials {
            Some(credentials) if credentials.is_complete() => Ok(credentials),
            _ => Err(AwareDbError::Config(
                "database token or username and password are required".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.timeout, Duration::from_secs(180));
        assert_eq!(config.login_timeout, Duration::from_secs(30));
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_token_wins_over_login() {
        let config = ClientConfig::from_lookup(lookup(&[
            (env::DB, "plant"),
            (env::TOKEN, "tok"),
            (env::USER, "ada"),
            (env::PASSWORD, "pw"),
            (env::HOST, "http://localhost:8000"),
            (env::TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.db, "plant");
        assert_eq!(config.host, "http://localhost:8000");
        assert_eq!(config.credentials, Some(Credentials::token("tok")));
        assert_eq!(config.timeout, Duration::from_secs(5));
        config.validate().unwrap();
    }

    #[test]
    fn test_login_from_env() {
        let config = ClientConfig::from_lookup(lookup(&[
            (env::DB, "plant"),
            (env::USER, "ada"),
            (env::PASSWORD, "pw"),
        ]))
        .unwrap();
        assert_eq!(config.credentials, Some(Credentials::login("ada", "pw")));
    }

    #[test]
    fn test_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[(env::TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, AwareDbError::Config(_)));
    }

    #[test]
    fn test_validate() {
        let missing_db = ClientConfig::new("", Credentials::token("t"));
        assert!(matches!(missing_db.validate(), Err(AwareDbError::Config(_))));

        let user_only = ClientConfig::from_lookup(lookup(&[(env::DB, "d"), (env::USER, "ada")])).unwrap();
        let err = user_only.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: database token or username and password are required"
        );

        let empty_token = ClientConfig::new("d", Credentials::token(""));
        assert!(empty_token.validate().is_err());
    }
}
