// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Dotted path addresses (`car.power`, `this.engine.mode`).
//!
//! A path is a non-empty sequence of non-empty segments. The first segment
//! may be the reserved keyword `this` (relative to the node being defined)
//! or `node` / a node name, type or id (absolute from the graph root).
//!
//! Segments are made of Unicode alphanumerics, `_` and `-`. A literal dot or
//! backslash inside a segment is written `\.` or `\\`. Parsing performs no
//! case or whitespace canonicalization, so [`PathAddress::render`] is the
//! exact inverse of [`PathAddress::parse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Keyword naming the node currently being defined or evaluated.
pub const THIS_KEYWORD: &str = "this";

/// Keyword naming the node under test in query conditions.
pub const NODE_KEYWORD: &str = "node";

/// How a path is anchored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAnchor<'a> {
    /// Relative to the enclosing node (`this.…`).
    This,
    /// The node being matched by a query condition (`node.…`).
    Node,
    /// An absolute path starting at a named node, node type or id.
    Named(&'a str),
}

/// A parsed dotted path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathAddress {
    segments: Vec<String>,
}

impl PathAddress {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedPath`] if the text is empty, contains an
    /// empty segment, an illegal character or an invalid escape.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(ModelError::path(text, "path is empty"));
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = text.char_indices();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some((_, escaped @ ('.' | '\\'))) => current.push(escaped),
                    Some((_, other)) => {
                        return Err(ModelError::path(
                            text,
                            format!("invalid escape '\\{other}' at byte {pos}"),
                        ))
                    }
                    None => return Err(ModelError::path(text, "dangling escape at end of path")),
                },
                '.' => {
                    if current.is_empty() {
                        return Err(ModelError::path(
                            text,
                            format!("empty segment at position {}", segments.len()),
                        ));
                    }
                    segments.push(std::mem::take(&mut current));
                }
                c if is_segment_char(c) => current.push(c),
                c => {
                    return Err(ModelError::path(
                        text,
                        format!("illegal character {c:?} at byte {pos}"),
                    ))
                }
            }
        }

        if current.is_empty() {
            return Err(ModelError::path(
                text,
                format!("empty segment at position {}", segments.len()),
            ));
        }
        segments.push(current);

        Ok(Self { segments })
    }

    /// Build a path from already-unescaped segments.
    ///
    /// Segments may contain `.` and `\`; they are escaped on render.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(ModelError::path("", "path is empty"));
        }
        for (index, segment) in segments.iter().enumerate() {
            validate_segment(segment, index)?;
        }
        Ok(Self { segments })
    }

    /// A path relative to the enclosing node: `this.<rest>`.
    pub fn relative(rest: &str) -> Result<Self> {
        let rest = Self::parse(rest)?;
        let mut segments = Vec::with_capacity(rest.segments.len() + 1);
        segments.push(THIS_KEYWORD.to_owned());
        segments.extend(rest.segments);
        Ok(Self { segments })
    }

    /// The unescaped segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment (the property or state being addressed).
    pub fn leaf(&self) -> &str {
        // Invariant: segments is never empty.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// How this path is anchored.
    pub fn anchor(&self) -> PathAnchor<'_> {
        match self.segments[0].as_str() {
            THIS_KEYWORD => PathAnchor::This,
            NODE_KEYWORD => PathAnchor::Node,
            other => PathAnchor::Named(other),
        }
    }

    /// Whether the path starts with the `this` keyword.
    pub fn is_relative(&self) -> bool {
        matches!(self.anchor(), PathAnchor::This)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; paths are never empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Result<Self> {
        validate_segment(segment, self.segments.len())?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        Ok(Self { segments })
    }

    /// The path without its last segment, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append every segment of `other` to this path.
    pub fn join(&self, other: &PathAddress) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Whether `prefix` is a leading run of this path's segments.
    pub fn starts_with(&self, prefix: &PathAddress) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Render back to dotted text, re-escaping dots and backslashes.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                out.push('.');
            }
            for ch in segment.chars() {
                if ch == '.' || ch == '\\' {
                    out.push('\\');
                }
                out.push(ch);
            }
        }
        out
    }
}

fn is_segment_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn validate_segment(segment: &str, index: usize) -> Result<()> {
    if segment.is_empty() {
        return Err(ModelError::path(
            segment,
            format!("empty segment at position {index}"),
        ));
    }
    if let Some(bad) = segment
        .chars()
        .find(|&c| !(is_segment_char(c) || c == '.' || c == '\\'))
    {
        return Err(ModelError::path(
            segment,
            format!("illegal character {bad:?} in segment {index}"),
        ));
    }
    Ok(())
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for PathAddress {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PathAddress {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for PathAddress {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<PathAddress> for String {
    fn from(path: PathAddress) -> Self {
        path.render()
    }
}
