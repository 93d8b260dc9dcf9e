// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Error types for the AwareDB value model.
//!
//! Every parser in this crate fails with a [`ModelError`]. Errors carry the
//! offending input so callers can report exactly which path, formula or
//! value was rejected.

use thiserror::Error;

/// Local syntax and structure errors raised while building or decoding
/// AwareDB payloads.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A dotted path expression was empty, had an empty segment, or used an
    /// illegal character.
    #[error("malformed path '{input}': {reason}")]
    MalformedPath {
        /// The rejected path text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A formula had an unterminated `${` or a reference that is not a
    /// valid path.
    #[error("malformed formula '{input}': {reason}")]
    MalformedFormula {
        /// The rejected formula text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A scalar value had no numeric prefix.
    #[error("malformed scalar '{input}': {reason}")]
    MalformedScalar {
        /// The rejected scalar text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A `linked-to` / `cases` mapping violated the tree invariants.
    #[error("invalid conditional tree: {0}")]
    InvalidConditionalTree(String),

    /// A `states` declaration was neither a list of names nor a mapping of
    /// names to path lists.
    #[error("invalid state declaration: {0}")]
    InvalidStateDeclaration(String),

    /// A node document was not a JSON object or held an undecodable property.
    #[error("invalid node document: {0}")]
    InvalidDocument(String),
}

impl ModelError {
    pub(crate) fn path(input: &str, reason: impl Into<String>) -> Self {
        ModelError::MalformedPath {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn formula(input: &str, reason: impl Into<String>) -> Self {
        ModelError::MalformedFormula {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn scalar(input: &str, reason: impl Into<String>) -> Self {
        ModelError::MalformedScalar {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Crate-level result alias using [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;
