// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Mutating commands: `update`, `remove` and `flush`.
//!
//! The server recomputes every dependent value after a write; the documents
//! returned by [`AwareDbClient::update`] carry those resolved values in their
//! annotations.

use awaredb_model::NodeDocument;
use tracing::{info, instrument, warn};

use crate::client::AwareDbClient;
use crate::command::CommandBuilder;
use crate::decode::ResponseDecoder;
use crate::error::Result;
use crate::transport::Command;

impl AwareDbClient {
    /// Create or modify nodes.
    ///
    /// # Arguments
    ///
    /// * `documents`: Nodes to write. Annotations are not sent.
    /// * `partial`: Merge the given properties into existing nodes instead
    ///   of replacing each node's properties.
    ///
    /// # Errors
    ///
    /// Returns [`AwareDbError::Validation`](crate::AwareDbError::Validation)
    /// if `documents` is empty, or a server error if any node is rejected.
    #[instrument(skip_all, fields(count = documents.len(), partial = partial))]
    pub async fn update(&self, documents: &[NodeDocument], partial: bool) -> Result<Vec<NodeDocument>> {
        let request = CommandBuilder::update(documents, partial)?;
        let data = self.dispatch(request).await?;
        let written = ResponseDecoder::documents(Command::Update, &data)?;
        info!(written = written.len(), "Nodes updated");
        Ok(written)
    }

    /// Delete nodes by id. Returns the ids the server acknowledged.
    #[instrument(skip_all, fields(count = ids.len()))]
    pub async fn remove(&self, ids: &[&str]) -> Result<Vec<String>> {
        let request = CommandBuilder::remove(ids)?;
        let data = self.dispatch(request).await?;
        let removed = ResponseDecoder::removed(Command::Remove, &data, ids)?;
        if removed.len() != ids.len() {
            warn!(requested = ids.len(), removed = removed.len(), "Not every id was removed");
        }
        Ok(removed)
    }

    /// Delete every node in the database.
    #[instrument(skip_all)]
    pub async fn flush(&self) -> Result<()> {
        self.dispatch(CommandBuilder::flush()).await?;
        warn!("Database flushed");
        Ok(())
    }
}
