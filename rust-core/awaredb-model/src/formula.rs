// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Formula expressions with embedded `${path}` references.
//!
//! Formulas are evaluated by the server only. The client splits the text into
//! a flat node sequence (numbers, identifiers, function names, operators,
//! punctuation, references and untouched literal text) so it can validate
//! references and report what a formula depends on. Rendering concatenates
//! the nodes again and reproduces the source text byte for byte: whitespace
//! is kept, nothing is re-associated or simplified.
//!
//! ```
//! use awaredb_model::FormulaExpression;
//!
//! let formula = FormulaExpression::parse("=sum(${this.cells.capacity}) * 2").unwrap();
//! assert!(formula.is_assignment());
//! assert_eq!(formula.functions().collect::<Vec<_>>(), ["sum"]);
//! assert_eq!(formula.render(), "=sum(${this.cells.capacity}) * 2");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, Result};
use crate::path::PathAddress;

const REFERENCE_OPEN: &str = "${";
const REFERENCE_CLOSE: char = '}';

const TWO_CHAR_OPERATORS: [&str; 7] = ["==", "!=", ">=", "<=", "&&", "||", "**"];
const ONE_CHAR_OPERATORS: &str = "+-*/%^<>=!&|";

/// One lexical element of a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaNode {
    /// Whitespace or any text the client does not classify.
    Literal(String),
    /// A numeric literal, kept as written.
    Number(String),
    /// A bare identifier (`true`, a constant name, …).
    Identifier(String),
    /// An identifier immediately followed by `(`.
    Function(String),
    /// An arithmetic, comparison or logical operator.
    Operator(String),
    /// `(`, `)` or `,`.
    Punct(char),
    /// A `${path}` reference.
    Reference(PathAddress),
}

impl FormulaNode {
    fn write_to(&self, out: &mut String) {
        match self {
            FormulaNode::Literal(text)
            | FormulaNode::Number(text)
            | FormulaNode::Identifier(text)
            | FormulaNode::Function(text)
            | FormulaNode::Operator(text) => out.push_str(text),
            FormulaNode::Punct(ch) => out.push(*ch),
            FormulaNode::Reference(path) => {
                out.push_str(REFERENCE_OPEN);
                out.push_str(&path.render());
                out.push(REFERENCE_CLOSE);
            }
        }
    }
}

/// A parsed formula or formula-like condition string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaExpression {
    assignment: bool,
    nodes: Vec<FormulaNode>,
}

impl FormulaExpression {
    /// Parse a formula.
    ///
    /// A leading `=` marks the whole property as a formula; otherwise the text
    /// is an inline expression such as a query condition.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedFormula`] when a `${` is never closed or
    /// a reference does not hold a valid path.
    pub fn parse(text: &str) -> Result<Self> {
        let (assignment, body) = match text.strip_prefix('=') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let offset = usize::from(assignment);

        let mut nodes = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < body.len() {
            let rest = &body[i..];

            if rest.starts_with(REFERENCE_OPEN) {
                let inner_start = i + REFERENCE_OPEN.len();
                let close = body[inner_start..].find(REFERENCE_CLOSE).ok_or_else(|| {
                    ModelError::formula(
                        text,
                        format!("unterminated reference starting at byte {}", i + offset),
                    )
                })?;
                let inner = &body[inner_start..inner_start + close];
                let path = PathAddress::parse(inner).map_err(|e| {
                    ModelError::formula(text, format!("invalid reference '${{{inner}}}': {e}"))
                })?;
                flush_literal(&mut nodes, &mut literal);
                nodes.push(FormulaNode::Reference(path));
                i = inner_start + close + REFERENCE_CLOSE.len_utf8();
                continue;
            }

            // Invariant: i < body.len() and i sits on a char boundary.
            let Some(ch) = rest.chars().next() else { break };

            if ch.is_ascii_digit() {
                let len = scan_number(rest);
                flush_literal(&mut nodes, &mut literal);
                nodes.push(FormulaNode::Number(rest[..len].to_owned()));
                i += len;
            } else if ch.is_alphabetic() || ch == '_' {
                let len = rest
                    .char_indices()
                    .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
                    .map_or(rest.len(), |(pos, _)| pos);
                let name = rest[..len].to_owned();
                flush_literal(&mut nodes, &mut literal);
                if rest[len..].starts_with('(') {
                    nodes.push(FormulaNode::Function(name));
                } else {
                    nodes.push(FormulaNode::Identifier(name));
                }
                i += len;
            } else if let Some(op) = TWO_CHAR_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                flush_literal(&mut nodes, &mut literal);
                nodes.push(FormulaNode::Operator((*op).to_owned()));
                i += op.len();
            } else if ONE_CHAR_OPERATORS.contains(ch) {
                flush_literal(&mut nodes, &mut literal);
                nodes.push(FormulaNode::Operator(ch.to_string()));
                i += 1;
            } else if matches!(ch, '(' | ')' | ',') {
                flush_literal(&mut nodes, &mut literal);
                nodes.push(FormulaNode::Punct(ch));
                i += 1;
            } else {
                literal.push(ch);
                i += ch.len_utf8();
            }
        }
        flush_literal(&mut nodes, &mut literal);

        Ok(Self { assignment, nodes })
    }

    /// A formula consisting of a single `${path}` reference.
    pub fn reference(path: PathAddress) -> Self {
        Self {
            assignment: false,
            nodes: vec![FormulaNode::Reference(path)],
        }
    }

    /// Whether `text` would be treated as a formula inside a node document:
    /// it starts with `=` or embeds at least one `${`.
    pub fn looks_like_formula(text: &str) -> bool {
        text.starts_with('=') || text.contains(REFERENCE_OPEN)
    }

    /// Whether the source started with `=`.
    pub fn is_assignment(&self) -> bool {
        self.assignment
    }

    /// The lexical nodes, in source order.
    pub fn nodes(&self) -> &[FormulaNode] {
        &self.nodes
    }

    /// Every referenced path, in source order (duplicates kept).
    pub fn references(&self) -> impl Iterator<Item = &PathAddress> {
        self.nodes.iter().filter_map(|node| match node {
            FormulaNode::Reference(path) => Some(path),
            _ => None,
        })
    }

    /// Every called function name, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match node {
            FormulaNode::Function(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// If the formula is exactly one `${path}` reference, that path.
    pub fn as_single_reference(&self) -> Option<&PathAddress> {
        match self.nodes.as_slice() {
            [FormulaNode::Reference(path)] if !self.assignment => Some(path),
            _ => None,
        }
    }

    /// Render back to the source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.assignment {
            out.push('=');
        }
        for node in &self.nodes {
            node.write_to(&mut out);
        }
        out
    }
}

fn flush_literal(nodes: &mut Vec<FormulaNode>, literal: &mut String) {
    if !literal.is_empty() {
        nodes.push(FormulaNode::Literal(std::mem::take(literal)));
    }
}

/// Length of a `digits[.digits]` run at the start of `text`.
fn scan_number(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    i
}

impl fmt::Display for FormulaExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for FormulaExpression {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for FormulaExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

impl<'de> Deserialize<'de> for FormulaExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
