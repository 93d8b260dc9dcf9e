// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! HTTP transport over the AwareDB REST API (feature `http`).
//!
//! Commands are `POST {host}/rest/db/{db}/{command}/` with a JSON body and an
//! `Authorization: Token …` header. Logins go to
//! `POST {host}/rest/auth/token/login/`. No request is ever retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{AwareDbError, Result};
use crate::transport::{Command, Credentials, Reply, Transport, TransportError};

const LOGIN_PATH: &str = "rest/auth/token/login/";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// [`Transport`] speaking HTTP via `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL, always ending in `/`.
    base_url: Url,
    db: String,
    /// Connection-pooled client with the per-command timeout.
    http: reqwest::Client,
    timeout: Duration,
    login_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport for `config.host` and `config.db`.
    ///
    /// # Errors
    ///
    /// Returns [`AwareDbError::Config`] if the host is not a valid URL or the
    /// database name is empty.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut host = config.host.trim().to_owned();
        if !host.ends_with('/') {
            host.push('/');
        }
        let base_url = Url::parse(&host)
            .map_err(|e| AwareDbError::Config(format!("Invalid host URL: {e}")))?;
        if config.db.trim().is_empty() {
            return Err(AwareDbError::Config("database name is required".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AwareDbError::Transport(e.into()))?;

        Ok(Self {
            base_url,
            db: config.db.clone(),
            http,
            timeout: config.timeout,
            login_timeout: config.login_timeout,
        })
    }

    /// `{host}/rest/db/{db}/{command}/`
    pub fn command_url(&self, command: Command) -> std::result::Result<Url, TransportError> {
        self.join(&format!("rest/db/{}/{}/", self.db, command.wire_name()))
    }

    fn join(&self, path: &str) -> std::result::Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::Connection(format!("invalid URL for '{path}': {e}")))
    }

    fn classify(&self, error: reqwest::Error, timeout: Duration) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(timeout.as_millis() as u64)
        } else {
            error.into()
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        command: Command,
        payload: Value,
        credentials: &Credentials,
    ) -> std::result::Result<Reply, TransportError> {
        let token = credentials
            .as_token()
            .ok_or(TransportError::Unsupported("login credentials must be exchanged for a token first"))?;
        let url = self.command_url(command)?;
        debug!(%command, %url, "POST");

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, format!("Token {token}"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.classify(e, self.timeout))?;

        match status.as_u16() {
            200 => {
                let body = serde_json::from_str(&text).map_err(|_| TransportError::Status {
                    status: status.as_u16(),
                    body: text.clone(),
                })?;
                Ok(Reply::Success(body))
            }
            400 => match serde_json::from_str(&text) {
                Ok(body) => Ok(Reply::Rejected {
                    status: status.as_u16(),
                    body,
                }),
                Err(_) => Err(TransportError::Status {
                    status: status.as_u16(),
                    body: text,
                }),
            },
            _ => Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            }),
        }
    }

    async fn exchange_token(&self, username: &str, password: &str) -> std::result::Result<String, TransportError> {
        let url = self.join(LOGIN_PATH)?;
        debug!(%url, "Requesting session token");

        let response = self
            .http
            .post(url)
            .timeout(self.login_timeout)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| self.classify(e, self.login_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| self.classify(e, self.login_timeout))?;
        Ok(login.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(host: &str) -> HttpTransport {
        let config = ClientConfig::new("plant", Credentials::token("t")).with_host(host);
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_command_urls() {
        let http = transport("https://aware-db.com");
        assert_eq!(
            http.command_url(Command::WhatIf).unwrap().as_str(),
            "https://aware-db.com/rest/db/plant/what-if/"
        );
        assert_eq!(
            http.join(LOGIN_PATH).unwrap().as_str(),
            "https://aware-db.com/rest/auth/token/login/"
        );
    }

    #[test]
    fn test_host_with_prefix() {
        let http = transport("http://localhost:8000/awaredb");
        assert_eq!(
            http.command_url(Command::Get).unwrap().as_str(),
            "http://localhost:8000/awaredb/rest/db/plant/get/"
        );
    }

    #[test]
    fn test_invalid_config() {
        let bad_host = ClientConfig::new("plant", Credentials::token("t")).with_host("not a url");
        assert!(matches!(HttpTransport::new(&bad_host), Err(AwareDbError::Config(_))));

        let no_db = ClientConfig::new("", Credentials::token("t"));
        assert!(matches!(HttpTransport::new(&no_db), Err(AwareDbError::Config(_))));
    }

    #[tokio::test]
    async fn test_login_credentials_are_refused() {
        let http = transport("http://127.0.0.1:9");
        let err = http
            .execute(Command::Check, Value::Null, &Credentials::login("a", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unsupported(_)));
    }
}
