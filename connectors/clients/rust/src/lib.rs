// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! # AwareDB Client SDK
//!
//! A Rust client for AwareDB, a graph database whose node properties are
//! unit-bearing quantities, formulas over other properties, and values that
//! depend on the state of other nodes. The server evaluates everything; this
//! crate builds requests, carries them over a [`Transport`], and decodes the
//! replies into the [`awaredb_model`] types.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use awaredb_client::{AwareDbClient, ClientConfig, Credentials, Query};
//!
//! #[tokio::main]
//! async fn main() -> awaredb_client::Result<()> {
//!     let config = ClientConfig::new("my-db", Credentials::token("abc123"));
//!     let client = AwareDbClient::connect_http(config).await?;
//!
//!     let power = client.get("car.power", &["car.model.x"]).await?;
//!     println!("power: {power}");
//!
//!     let earners = client
//!         .query(&Query::nodes(["employee"]).condition("${node.salary.gross} > 60000"))
//!         .await?;
//!     println!("{} employees", earners.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`]: Session construction, login, connectivity check.
//! - [`read`]: `calculate`, `get`, `query`, `what-if`.
//! - [`write`]: `update`, `remove`, `flush`.
//! - [`load`]: Bulk `update` from JSON files.
//! - [`command`]: Request payload construction and local validation.
//! - [`decode`]: Reply envelopes, server errors and result decoding.
//! - [`transport`]: The [`Transport`] trait, commands and credentials.
//! - [`config`]: [`ClientConfig`] and environment loading.
//! - `http`: reqwest-backed transport (feature `http`, on by default).
//! - [`error`]: Error types and the crate-level `Result` alias.

pub mod client;
pub mod command;
pub mod config;
pub mod decode;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod load;
pub mod read;
pub mod transport;
pub mod write;

pub use awaredb_model as model;

pub use client::AwareDbClient;
pub use command::{CommandBuilder, Query, Request, WILDCARD};
pub use config::ClientConfig;
pub use decode::ResponseDecoder;
pub use error::{AwareDbError, Result};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use load::LoadOptions;
pub use transport::{Command, Credentials, Reply, Transport, TransportError};
