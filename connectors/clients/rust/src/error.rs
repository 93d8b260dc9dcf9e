// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Error types for the AwareDB client SDK.
//!
//! All fallible operations in this crate return [`Result<T>`], an alias for
//! `std::result::Result<T, AwareDbError>`. Local model errors (bad paths,
//! unbalanced `${`, malformed trees) surface before any request is sent;
//! transport failures are passed through untouched.

use std::path::PathBuf;

use awaredb_model::ModelError;
use serde_json::Value;
use thiserror::Error;

use crate::transport::{Command, TransportError};

/// Error type for AwareDB client operations.
#[derive(Error, Debug)]
pub enum AwareDbError {
    /// A path, formula, scalar, tree or document failed local validation.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The transport collaborator failed. Never retried by the client.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a well-formed error response.
    #[error("Server error ({status}{}): {message}", code_suffix(.code))]
    Server {
        /// Status reported by the transport (the HTTP status over HTTP).
        status: u16,
        /// Server-side error code, when the body carries one.
        code: Option<String>,
        /// Human-readable message from the response body.
        message: String,
        /// The full rejection body.
        body: Value,
    },

    /// The response was well-formed JSON of the wrong shape for `command`.
    #[error("Unexpected response to '{command}': {reason}")]
    UnexpectedResponse { command: Command, reason: String },

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller arguments failed a local check before the request was built.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Client configuration is incomplete or the database is unreachable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a file for [`AwareDbClient::load`](crate::client::AwareDbClient::load) failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AwareDbError {
    pub(crate) fn unexpected(command: Command, reason: impl Into<String>) -> Self {
        AwareDbError::UnexpectedResponse {
            command,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AwareDbError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure happened locally, before anything was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AwareDbError::Model(_) | AwareDbError::Validation(_) | AwareDbError::Config(_)
        )
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(", {c}")).unwrap_or_default()
}

/// Crate-level result alias using [`AwareDbError`].
pub type Result<T> = std::result::Result<T, AwareDbError>;
