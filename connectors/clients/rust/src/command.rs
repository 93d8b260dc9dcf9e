// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Request payload construction.
//!
//! [`CommandBuilder`] turns caller arguments into a [`Request`]: a command
//! and the JSON object sent for it. Every path, formula and condition is
//! parsed here, so a malformed argument fails before the transport is
//! touched. Nothing is evaluated.
//!
//! Optional lists are always sent, empty when the caller gave none.

use std::collections::HashSet;

use awaredb_model::{FormulaExpression, NodeDocument, PathAddress, PropertyValue};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AwareDbError, Result};
use crate::transport::Command;

/// Node selector matching every node.
pub const WILDCARD: &str = "*";

// ---------------------------------------------------------------------------
// Internal request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum FormulaArgument {
    One(FormulaExpression),
    Many(Vec<FormulaExpression>),
}

#[derive(Debug, Serialize)]
struct CalculateBody {
    formula: FormulaArgument,
    states: Vec<PathAddress>,
}

#[derive(Debug, Serialize)]
struct GetBody {
    path: PathAddress,
    states: Vec<PathAddress>,
}

#[derive(Debug, Serialize)]
struct QueryBody {
    nodes: Vec<String>,
    conditions: Vec<FormulaExpression>,
    properties: Vec<String>,
    states: Vec<PathAddress>,
    show_abstract: bool,
}

#[derive(Debug, Serialize)]
struct WhatIfBody {
    changes: Map<String, Value>,
    states: Vec<PathAddress>,
}

#[derive(Debug, Serialize)]
struct RemoveBody<'a> {
    ids: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    data: &'a [NodeDocument],
    partial: bool,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A command ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    command: Command,
    payload: Value,
}

impl Request {
    fn encode(command: Command, body: &impl Serialize) -> Result<Self> {
        Ok(Self {
            command,
            payload: serde_json::to_value(body)?,
        })
    }

    fn empty(command: Command) -> Self {
        Self {
            command,
            payload: Value::Object(Map::new()),
        }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_parts(self) -> (Command, Value) {
        (self.command, self.payload)
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Arguments of a `query` command.
///
/// ```rust
/// use awaredb_client::Query;
///
/// let query = Query::nodes(["employee"])
///     .condition("${node.salary.gross} > 60000")
///     .property("name");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    nodes: Vec<String>,
    conditions: Vec<String>,
    properties: Vec<String>,
    states: Vec<String>,
    show_abstract: bool,
}

impl Query {
    /// Every node (`["*"]`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes selected by id, uid or name.
    pub fn nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.nodes.push(node.into());
        self
    }

    /// A boolean formula every returned node must satisfy.
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Restrict the returned properties. All are returned when none is given.
    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.properties.push(property.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.states.push(state.into());
        self
    }

    /// Include abstract nodes in the result.
    pub fn show_abstract(mut self, show: bool) -> Self {
        self.show_abstract = show;
        self
    }
}

// ---------------------------------------------------------------------------
// CommandBuilder
// ---------------------------------------------------------------------------

/// Builds the payload of every command.
pub struct CommandBuilder;

impl CommandBuilder {
    /// `calculate` a single formula.
    ///
    /// # Arguments
    ///
    /// * `formula`: e.g. `"${car.power} * 2"`.
    /// * `states`: state selectors, e.g. `"car.model.x"`.
    pub fn calculate(formula: &str, states: &[&str]) -> Result<Request> {
        let body = CalculateBody {
            formula: FormulaArgument::One(parse_formula(formula)?),
            states: parse_states(states)?,
        };
        Request::encode(Command::Calculate, &body)
    }

    /// `calculate` several formulas in one call.
    pub fn calculate_many(formulas: &[&str], states: &[&str]) -> Result<Request> {
        if formulas.is_empty() {
            return Err(AwareDbError::Validation("at least one formula is required".into()));
        }
        let formulas = formulas
            .iter()
            .map(|formula| parse_formula(formula))
            .collect::<Result<Vec<_>>>()?;
        let body = CalculateBody {
            formula: FormulaArgument::Many(formulas),
            states: parse_states(states)?,
        };
        Request::encode(Command::Calculate, &body)
    }

    pub fn get(path: &str, states: &[&str]) -> Result<Request> {
        let body = GetBody {
            path: PathAddress::parse(path)?,
            states: parse_states(states)?,
        };
        Request::encode(Command::Get, &body)
    }

    /// `query`. An empty node list selects [`WILDCARD`].
    pub fn query(query: &Query) -> Result<Request> {
        let nodes = if query.nodes.is_empty() {
            vec![WILDCARD.to_owned()]
        } else {
            non_empty("node", &query.nodes)?
        };
        let conditions = query
            .conditions
            .iter()
            .map(|condition| parse_formula(condition))
            .collect::<Result<Vec<_>>>()?;
        let body = QueryBody {
            nodes,
            conditions,
            properties: non_empty("property", &query.properties)?,
            states: parse_states(&query.states.iter().map(String::as_str).collect::<Vec<_>>())?,
            show_abstract: query.show_abstract,
        };
        Request::encode(Command::Query, &body)
    }

    /// `what-if` with values written as text, e.g. `("battery.capacity", "55 kWh")`.
    ///
    /// Each value is classified the way a document string is: formula,
    /// quantity, or plain text.
    pub fn what_if(changes: &[(&str, &str)], states: &[&str]) -> Result<Request> {
        let changes = changes
            .iter()
            .map(|(path, value)| Ok((PathAddress::parse(path)?, PropertyValue::from_text(value)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::what_if_values(changes, states)
    }

    /// `what-if` with typed values.
    pub fn what_if_values<I>(changes: I, states: &[&str]) -> Result<Request>
    where
        I: IntoIterator<Item = (PathAddress, PropertyValue)>,
    {
        let mut encoded = Map::new();
        for (path, value) in changes {
            let key = path.render();
            if encoded.contains_key(&key) {
                return Err(AwareDbError::Validation(format!("duplicate change for '{key}'")));
            }
            encoded.insert(key, value.to_json());
        }
        if encoded.is_empty() {
            return Err(AwareDbError::Validation("at least one change is required".into()));
        }
        let body = WhatIfBody {
            changes: encoded,
            states: parse_states(states)?,
        };
        Request::encode(Command::WhatIf, &body)
    }

    /// `flush`: delete every node in the database.
    pub fn flush() -> Request {
        Request::empty(Command::Flush)
    }

    pub fn remove(ids: &[&str]) -> Result<Request> {
        if ids.is_empty() {
            return Err(AwareDbError::Validation("at least one id is required".into()));
        }
        if ids.iter().any(|id| id.trim().is_empty()) {
            return Err(AwareDbError::Validation("ids must not be empty".into()));
        }
        Request::encode(Command::Remove, &RemoveBody { ids })
    }

    /// `update`. With `partial`, listed properties are merged into existing
    /// nodes; otherwise each node's properties are replaced.
    ///
    /// Annotations carried by the documents are never sent.
    pub fn update(documents: &[NodeDocument], partial: bool) -> Result<Request> {
        if documents.is_empty() {
            return Err(AwareDbError::Validation("at least one document is required".into()));
        }
        if let Some(index) = documents.iter().position(NodeDocument::is_empty) {
            return Err(AwareDbError::Validation(format!("document {index} has no properties")));
        }
        Request::encode(
            Command::Update,
            &UpdateBody {
                data: documents,
                partial,
            },
        )
    }

    /// Connectivity probe.
    pub fn check() -> Request {
        Request::empty(Command::Check)
    }
}

fn parse_formula(text: &str) -> Result<FormulaExpression> {
    if text.trim().is_empty() {
        return Err(AwareDbError::Validation("formula must not be empty".into()));
    }
    Ok(FormulaExpression::parse(text)?)
}

fn parse_states(states: &[&str]) -> Result<Vec<PathAddress>> {
    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(states.len());
    for state in states {
        let path = PathAddress::parse(state)?;
        if seen.insert(path.clone()) {
            parsed.push(path);
        }
    }
    Ok(parsed)
}

fn non_empty(what: &str, names: &[String]) -> Result<Vec<String>> {
    match names.iter().position(|name| name.trim().is_empty()) {
        Some(index) => Err(AwareDbError::Validation(format!("{what} {index} is empty"))),
        None => Ok(names.to_vec()),
    }
}
