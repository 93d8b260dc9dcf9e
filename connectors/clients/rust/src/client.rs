// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! AwareDB client session and command dispatch.
//!
//! [`AwareDbClient`] is the primary entry point for all SDK operations. It
//! owns the transport and the session credentials. The commands themselves
//! are defined as `impl AwareDbClient` blocks in [`read`](crate::read),
//! [`write`](crate::write) and [`load`](crate::load).

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::command::{CommandBuilder, Request};
use crate::config::ClientConfig;
use crate::decode::ResponseDecoder;
use crate::error::{AwareDbError, Result};
use crate::transport::{Credentials, Transport};

/// The main AwareDB client.
///
/// Cloning is cheap; clones share the transport. Every command is a single
/// `execute` call on the transport, and nothing is cached between calls.
///
/// # Examples
///
/// ```rust,no_run
/// use awaredb_client::{AwareDbClient, ClientConfig, Credentials};
///
/// # #[tokio::main]
/// # async fn main() -> awaredb_client::Result<()> {
/// let config = ClientConfig::new("my-db", Credentials::token("abc123"));
/// let client = AwareDbClient::connect_http(config).await?;
/// let power = client.get("car.power", &["car.model.x"]).await?;
/// println!("{power}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AwareDbClient {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
}

impl AwareDbClient {
    // -- Constructors -------------------------------------------------------

    /// Create a client over `transport` without any network traffic.
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Validate `config`, log in if needed, and check the database is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AwareDbError::Config`] if the configuration is incomplete or
    /// the server does not report `{"connected": true}`.
    #[instrument(skip_all, fields(db = %config.db))]
    pub async fn connect(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let credentials = match config.validate()? {
            Credentials::Login { username, password } => {
                debug!("Exchanging login for a session token");
                let token = transport.exchange_token(username, password).await?;
                Credentials::Token(token)
            }
            token => token.clone(),
        };

        let client = Self::new(transport, credentials);
        if !client.check().await? {
            return Err(AwareDbError::Config("unable to connect to database".into()));
        }
        info!("Connected");
        Ok(client)
    }

    /// [`connect`](Self::connect) over the built-in HTTP transport.
    #[cfg(feature = "http")]
    pub async fn connect_http(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(crate::http::HttpTransport::new(&config)?);
        Self::connect(config, transport).await
    }

    // -- Session ------------------------------------------------------------

    /// Ask the server whether the database is reachable.
    pub async fn check(&self) -> Result<bool> {
        let data = self.dispatch(CommandBuilder::check()).await?;
        Ok(ResponseDecoder::connected(&data))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // -- Dispatch -----------------------------------------------------------

    /// Send one request and unwrap the `data` member of its reply.
    pub(crate) async fn dispatch(&self, request: Request) -> Result<Value> {
        let (command, payload) = request.into_parts();
        debug!(%command, "Dispatching command");
        let reply = self
            .transport
            .execute(command, payload, &self.credentials)
            .await?;
        ResponseDecoder::data(command, reply)
    }
}

impl std::fmt::Debug for AwareDbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwareDbClient")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
