// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! # AwareDB value model
//!
//! Typed building blocks for AwareDB request and response payloads:
//!
//! - [`path`]: dotted path addresses with the relative `this` keyword.
//! - [`formula`]: formula strings with embedded `${path}` references.
//! - [`scalar`]: magnitudes with an optional unit tag.
//! - [`conditional`]: `linked-to` / `cases` trees for state-dependent values.
//! - [`state`]: simple and composite state declarations.
//! - [`document`]: node documents, the property classifier and `value` mirrors.
//! - [`error`]: [`ModelError`] and the crate-level `Result` alias.
//!
//! Nothing here evaluates a formula or resolves a state. Every type parses,
//! validates structure, and renders back to the same wire text.
//!
//! ```
//! use awaredb_model::{NodeDocument, PropertyValue};
//! use serde_json::json;
//!
//! let fan = NodeDocument::from_json(&json!({
//!     "name": "Fan",
//!     "power": {
//!         "linked-to": "${this.engine.mode}",
//!         "cases": { "low": "20 W", "default": "0 W" }
//!     }
//! }))
//! .unwrap();
//!
//! let power = fan.get("power").and_then(PropertyValue::as_conditional).unwrap();
//! assert_eq!(power.linked_to().to_string(), "this.engine.mode");
//! ```

pub mod conditional;
pub mod document;
pub mod error;
pub mod formula;
pub mod path;
pub mod scalar;
pub mod state;

pub use conditional::{
    Case, CasesForm, ConditionalValue, ConditionalValueTree, ReferenceForm, CASES_KEY,
    DEFAULT_CASE, LINKED_TO_KEY,
};
pub use document::{Annotations, NodeDocument, PropertyValue, VALUE_KEY};
pub use error::{ModelError, Result};
pub use formula::{FormulaExpression, FormulaNode};
pub use path::{PathAddress, PathAnchor, NODE_KEYWORD, THIS_KEYWORD};
pub use scalar::{ScalarForm, ScalarValue};
pub use state::{StateDeclaration, STATES_KEY};
