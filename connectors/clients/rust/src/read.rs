// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Read-only commands: `calculate`, `get`, `query` and `what-if`.
//!
//! None of these persist anything. `what-if` in particular evaluates the
//! cascading impact of hypothetical changes and discards them.

use awaredb_model::{NodeDocument, PathAddress, PropertyValue, ScalarValue};
use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::client::AwareDbClient;
use crate::command::{CommandBuilder, Query};
use crate::decode::ResponseDecoder;
use crate::error::Result;
use crate::transport::Command;

impl AwareDbClient {
    /// Evaluate a formula on the server.
    ///
    /// # Arguments
    ///
    /// * `formula`: e.g. `"${car.power} * 2"`.
    /// * `states`: state selectors applied for this evaluation only.
    #[instrument(skip_all, fields(formula = %formula))]
    pub async fn calculate(&self, formula: &str, states: &[&str]) -> Result<ScalarValue> {
        let request = CommandBuilder::calculate(formula, states)?;
        let data = self.dispatch(request).await?;
        ResponseDecoder::scalar(&data)
    }

    /// Evaluate several formulas in one call. Results follow input order.
    #[instrument(skip_all, fields(count = formulas.len()))]
    pub async fn calculate_many(&self, formulas: &[&str], states: &[&str]) -> Result<Vec<ScalarValue>> {
        let request = CommandBuilder::calculate_many(formulas, states)?;
        let data = self.dispatch(request).await?;
        ResponseDecoder::scalars(Command::Calculate, &data)
    }

    /// Resolved value of a property.
    ///
    /// # Arguments
    ///
    /// * `path`: e.g. `"car.power"`.
    /// * `states`: e.g. `["car.model.x"]`.
    #[instrument(skip_all, fields(path = %path))]
    pub async fn get(&self, path: &str, states: &[&str]) -> Result<ScalarValue> {
        let request = CommandBuilder::get(path, states)?;
        let data = self.dispatch(request).await?;
        ResponseDecoder::scalar(&data)
    }

    /// Like [`get`](Self::get), for properties that do not resolve to a
    /// scalar (text, literals, nested documents).
    #[instrument(skip_all, fields(path = %path))]
    pub async fn get_value(&self, path: &str, states: &[&str]) -> Result<PropertyValue> {
        let request = CommandBuilder::get(path, states)?;
        let data = self.dispatch(request).await?;
        ResponseDecoder::property(&data)
    }

    /// Nodes matching `query`, each carrying its resolved `value` in
    /// [`NodeDocument::annotations`].
    #[instrument(skip_all, fields(query = ?query))]
    pub async fn query(&self, query: &Query) -> Result<Vec<NodeDocument>> {
        let request = CommandBuilder::query(query)?;
        let data = self.dispatch(request).await?;
        let documents = ResponseDecoder::documents(Command::Query, &data)?;
        debug!(matched = documents.len(), "Query returned");
        Ok(documents)
    }

    /// Impact of hypothetical changes, written as text (`"55 kWh"`).
    ///
    /// Nothing is persisted.
    #[instrument(skip_all, fields(changes = changes.len()))]
    pub async fn what_if(
        &self,
        changes: &[(&str, &str)],
        states: &[&str],
    ) -> Result<IndexMap<PathAddress, ScalarValue>> {
        let request = CommandBuilder::what_if(changes, states)?;
        let data = self.dispatch(request).await?;
        ResponseDecoder::impacts(Command::WhatIf, &data)
    }

    /// [`what_if`](Self::what_if) with typed values.
    #[instrument(skip_all)]
    pub async fn what_if_values<I>(
        &self,
        changes: I,
        states: &[&str],
    ) -> Result<IndexMap<PathAddress, ScalarValue>>
    where
        I: IntoIterator<Item = (PathAddress, PropertyValue)>,
    {
        let request = CommandBuilder::what_if_values(changes, states)?;
        let data = self.dispatch(request).await?;
        ResponseDecoder::impacts(Command::WhatIf, &data)
    }
}
