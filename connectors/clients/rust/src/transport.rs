// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! The transport collaborator.
//!
//! [`AwareDbClient`](crate::client::AwareDbClient) never speaks a network
//! protocol itself. Each command is handed to a [`Transport`] as a
//! [`Command`] plus a JSON payload; the transport returns the server's body
//! as a [`Reply`] or fails with a [`TransportError`], which the client
//! surfaces unchanged.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// The commands understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Calculate,
    Get,
    Query,
    WhatIf,
    Flush,
    Remove,
    Update,
    /// Connectivity probe issued by `connect`.
    Check,
}

impl Command {
    /// Name used on the wire (`what-if` is hyphenated).
    pub fn wire_name(self) -> &'static str {
        match self {
            Command::Calculate => "calculate",
            Command::Get => "get",
            Command::Query => "query",
            Command::WhatIf => "what-if",
            Command::Flush => "flush",
            Command::Remove => "remove",
            Command::Update => "update",
            Command::Check => "check",
        }
    }

    /// Whether the command changes persisted data.
    pub fn is_mutation(self) -> bool {
        matches!(self, Command::Flush | Command::Remove | Command::Update)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Session credentials. `Debug` never prints secrets.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// An API token, sent as `Authorization: Token <token>` over HTTP.
    Token(String),
    /// A username and password, exchanged for a token by `connect`.
    Login { username: String, password: String },
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token(token.into())
    }

    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Login {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The token, when these are token credentials.
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Credentials::Token(token) => Some(token),
            Credentials::Login { .. } => None,
        }
    }

    /// Whether every required field is non-empty.
    pub fn is_complete(&self) -> bool {
        match self {
            Credentials::Token(token) => !token.is_empty(),
            Credentials::Login { username, password } => {
                !username.is_empty() && !password.is_empty()
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Credentials::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// What the server sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The command succeeded. The body is the full envelope (`{"data": …}`).
    Success(Value),
    /// The server refused the command with a structured error body.
    Rejected { status: u16, body: Value },
}

/// Failure of the transport collaborator itself.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server answered with a status the transport does not map to a [`Reply`].
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request exceeded the transport's timeout.
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// The transport does not implement this operation.
    #[error("not supported by this transport: {0}")]
    Unsupported(&'static str),

    /// An underlying `reqwest` error.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            TransportError::Connection(error.to_string())
        } else {
            TransportError::Http(error)
        }
    }
}

/// Carries one command to the server and returns its reply.
///
/// Implementations own timeouts and connection handling. They must not
/// retry on their own: the client reports every failure to its caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `command` with `payload` under `credentials`.
    async fn execute(
        &self,
        command: Command,
        payload: Value,
        credentials: &Credentials,
    ) -> Result<Reply, TransportError>;

    /// Exchange a username and password for a session token.
    async fn exchange_token(&self, username: &str, password: &str) -> Result<String, TransportError> {
        let _ = (username, password);
        Err(TransportError::Unsupported("token exchange"))
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(
        &self,
        command: Command,
        payload: Value,
        credentials: &Credentials,
    ) -> Result<Reply, TransportError> {
        (**self).execute(command, payload, credentials).await
    }

    async fn exchange_token(&self, username: &str, password: &str) -> Result<String, TransportError> {
        (**self).exchange_token(username, password).await
    }
}
