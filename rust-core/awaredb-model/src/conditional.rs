// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! State-dependent values: `linked-to` / `cases` trees.
//!
//! A conditional value resolves according to the discrete state of another
//! path. Each case holds a scalar, a formula, or another tree keyed on a
//! different path, so multi-state quantities nest without limit:
//!
//! ```json
//! {
//!   "linked-to": "${this.engine.mode}",
//!   "cases": {
//!     "low": "20 W",
//!     "high": { "linked-to": "this.lights.status", "cases": { "on": "65 W", "default": "60 W" } },
//!     "default": "0 W"
//!   }
//! }
//! ```
//!
//! Case order is carried as given and is part of equality. Choosing the
//! active case is the server's job; this module only checks structure.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::formula::FormulaExpression;
use crate::path::PathAddress;
use crate::scalar::ScalarValue;

/// Wire key naming the path a tree depends on.
pub const LINKED_TO_KEY: &str = "linked-to";

/// Wire key holding the ordered cases.
pub const CASES_KEY: &str = "cases";

/// Label of the fallback case.
pub const DEFAULT_CASE: &str = "default";

/// How the `linked-to` path was written. Ignored by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceForm {
    /// `"this.engine.mode"`
    #[default]
    Bare,
    /// `"${this.engine.mode}"`
    Wrapped,
}

/// How `cases` was laid out on the wire. Ignored by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CasesForm {
    /// `{"low": …, "high": …}`
    #[default]
    Map,
    /// `[{"low": …}, {"high": …}]`
    List,
}

/// The value held by one case.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalValue {
    Scalar(ScalarValue),
    Formula(FormulaExpression),
    Tree(Box<ConditionalValueTree>),
}

impl ConditionalValue {
    /// Decode a case value: a nested tree object, a formula string, or a scalar.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                if is_tree_object(map) {
                    ConditionalValueTree::from_map(map).map(|tree| ConditionalValue::Tree(Box::new(tree)))
                } else {
                    Err(ModelError::InvalidConditionalTree(format!(
                        "case value object must contain '{LINKED_TO_KEY}' and '{CASES_KEY}'"
                    )))
                }
            }
            Value::String(text) if FormulaExpression::looks_like_formula(text) => {
                FormulaExpression::parse(text).map(ConditionalValue::Formula)
            }
            Value::String(_) | Value::Number(_) => {
                ScalarValue::from_json(value).map(ConditionalValue::Scalar)
            }
            other => Err(ModelError::InvalidConditionalTree(format!(
                "case value must be a scalar, formula or nested tree, got {other}"
            ))),
        }
    }

    /// Encode for the wire.
    pub fn to_json(&self) -> Value {
        match self {
            ConditionalValue::Scalar(scalar) => scalar.to_json(),
            ConditionalValue::Formula(formula) => Value::String(formula.render()),
            ConditionalValue::Tree(tree) => tree.to_json(),
        }
    }

    /// The nested tree, if this case is one.
    pub fn as_tree(&self) -> Option<&ConditionalValueTree> {
        match self {
            ConditionalValue::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// The scalar, if this case is one.
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            ConditionalValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<ScalarValue> for ConditionalValue {
    fn from(value: ScalarValue) -> Self {
        ConditionalValue::Scalar(value)
    }
}

impl From<FormulaExpression> for ConditionalValue {
    fn from(value: FormulaExpression) -> Self {
        ConditionalValue::Formula(value)
    }
}

impl From<ConditionalValueTree> for ConditionalValue {
    fn from(value: ConditionalValueTree) -> Self {
        ConditionalValue::Tree(Box::new(value))
    }
}

/// A labelled branch of a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    label: String,
    value: ConditionalValue,
}

impl Case {
    pub fn new(label: impl Into<String>, value: impl Into<ConditionalValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &ConditionalValue {
        &self.value
    }

    /// Whether this is the `default` fallback.
    pub fn is_default(&self) -> bool {
        self.label == DEFAULT_CASE
    }
}

/// A value whose resolution depends on the state of `linked_to`.
#[derive(Debug, Clone)]
pub struct ConditionalValueTree {
    linked_to: PathAddress,
    cases: Vec<Case>,
    default_index: Option<usize>,
    reference_form: ReferenceForm,
    cases_form: CasesForm,
}

impl ConditionalValueTree {
    /// Build a tree from ordered cases.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConditionalTree`] if `cases` is empty, a
    /// label is empty, or more than one case is labelled `default`.
    pub fn new(linked_to: PathAddress, cases: impl IntoIterator<Item = Case>) -> Result<Self> {
        let cases: Vec<Case> = cases.into_iter().collect();
        if cases.is_empty() {
            return Err(ModelError::InvalidConditionalTree(format!(
                "'{CASES_KEY}' for '{linked_to}' must not be empty"
            )));
        }

        let mut default_index = None;
        for (index, case) in cases.iter().enumerate() {
            if case.label.is_empty() {
                return Err(ModelError::InvalidConditionalTree(format!(
                    "case {index} for '{linked_to}' has an empty label"
                )));
            }
            if case.is_default() {
                if default_index.is_some() {
                    return Err(ModelError::InvalidConditionalTree(format!(
                        "more than one '{DEFAULT_CASE}' case for '{linked_to}'"
                    )));
                }
                default_index = Some(index);
            }
        }

        Ok(Self {
            linked_to,
            cases,
            default_index,
            reference_form: ReferenceForm::default(),
            cases_form: CasesForm::default(),
        })
    }

    /// Append a case.
    ///
    /// # Errors
    ///
    /// Same rules as [`ConditionalValueTree::new`].
    pub fn with_case(self, label: impl Into<String>, value: impl Into<ConditionalValue>) -> Result<Self> {
        let Self {
            linked_to,
            mut cases,
            reference_form,
            cases_form,
            ..
        } = self;
        cases.push(Case::new(label, value));
        Ok(Self::new(linked_to, cases)?
            .with_reference_form(reference_form)
            .with_cases_form(cases_form))
    }

    /// Render `linked-to` in the given form.
    pub fn with_reference_form(mut self, form: ReferenceForm) -> Self {
        self.reference_form = form;
        self
    }

    /// Render `cases` in the given layout.
    pub fn with_cases_form(mut self, form: CasesForm) -> Self {
        self.cases_form = form;
        self
    }

    /// Decode a `{"linked-to": …, "cases": …}` object.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(ModelError::InvalidConditionalTree(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    pub(crate) fn from_map(map: &Map<String, Value>) -> Result<Self> {
        if let Some(key) = map.keys().find(|k| k.as_str() != LINKED_TO_KEY && k.as_str() != CASES_KEY) {
            return Err(ModelError::InvalidConditionalTree(format!(
                "unexpected key '{key}'"
            )));
        }

        let (linked, cases) = match (map.get(LINKED_TO_KEY), map.get(CASES_KEY)) {
            (Some(linked), Some(cases)) => (linked, cases),
            (None, Some(_)) => {
                return Err(ModelError::InvalidConditionalTree(format!(
                    "'{CASES_KEY}' present without '{LINKED_TO_KEY}'"
                )))
            }
            (Some(_), None) => {
                return Err(ModelError::InvalidConditionalTree(format!(
                    "'{LINKED_TO_KEY}' present without '{CASES_KEY}'"
                )))
            }
            (None, None) => {
                return Err(ModelError::InvalidConditionalTree(format!(
                    "expected '{LINKED_TO_KEY}' and '{CASES_KEY}'"
                )))
            }
        };

        let linked_text = linked.as_str().ok_or_else(|| {
            ModelError::InvalidConditionalTree(format!("'{LINKED_TO_KEY}' must be a string"))
        })?;
        let (linked_to, reference_form) = parse_linked_to(linked_text)?;

        let (raw_cases, cases_form) = match cases {
            Value::Object(entries) => (
                entries.iter().map(|(k, v)| (k.as_str(), v)).collect::<Vec<_>>(),
                CasesForm::Map,
            ),
            Value::Array(items) => {
                let mut raw = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item.as_object() {
                        Some(entry) if entry.len() == 1 => {
                            raw.extend(entry.iter().map(|(k, v)| (k.as_str(), v)));
                        }
                        _ => {
                            return Err(ModelError::InvalidConditionalTree(format!(
                                "case {index} must be an object with exactly one label"
                            )))
                        }
                    }
                }
                (raw, CasesForm::List)
            }
            other => {
                return Err(ModelError::InvalidConditionalTree(format!(
                    "'{CASES_KEY}' must be an object or a list, got {other}"
                )))
            }
        };

        let mut decoded = Vec::with_capacity(raw_cases.len());
        for (label, value) in raw_cases {
            decoded.push(Case::new(label, ConditionalValue::from_json(value)?));
        }

        Ok(Self::new(linked_to, decoded)?
            .with_reference_form(reference_form)
            .with_cases_form(cases_form))
    }

    /// Encode for the wire, preserving case order and the decoded wire forms.
    pub fn to_json(&self) -> Value {
        let linked = match self.reference_form {
            ReferenceForm::Bare => self.linked_to.render(),
            ReferenceForm::Wrapped => FormulaExpression::reference(self.linked_to.clone()).render(),
        };

        let cases = match self.cases_form {
            CasesForm::Map => Value::Object(
                self.cases
                    .iter()
                    .map(|case| (case.label.clone(), case.value.to_json()))
                    .collect(),
            ),
            CasesForm::List => Value::Array(
                self.cases
                    .iter()
                    .map(|case| {
                        let mut entry = Map::new();
                        entry.insert(case.label.clone(), case.value.to_json());
                        Value::Object(entry)
                    })
                    .collect(),
            ),
        };

        let mut map = Map::new();
        map.insert(LINKED_TO_KEY.to_owned(), Value::String(linked));
        map.insert(CASES_KEY.to_owned(), cases);
        Value::Object(map)
    }

    /// The path whose state selects a case.
    pub fn linked_to(&self) -> &PathAddress {
        &self.linked_to
    }

    pub fn reference_form(&self) -> ReferenceForm {
        self.reference_form
    }

    pub fn cases_form(&self) -> CasesForm {
        self.cases_form
    }

    /// Cases in declared order.
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    /// Case labels in declared order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|case| case.label.as_str())
    }

    /// The first case with `label`.
    pub fn case(&self, label: &str) -> Option<&ConditionalValue> {
        if label == DEFAULT_CASE {
            return self.default_case();
        }
        self.cases
            .iter()
            .find(|case| case.label == label)
            .map(|case| &case.value)
    }

    /// The `default` case, if declared.
    pub fn default_case(&self) -> Option<&ConditionalValue> {
        self.default_index.map(|index| &self.cases[index].value)
    }

    /// Nesting depth; a tree whose cases are all terminal has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .cases
            .iter()
            .filter_map(|case| case.value.as_tree())
            .map(ConditionalValueTree::depth)
            .max()
            .unwrap_or(0)
    }

    /// Every path this tree depends on: `linked-to` paths and formula
    /// references, depth-first in case order.
    pub fn linked_paths(&self) -> Vec<&PathAddress> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a PathAddress>) {
        out.push(&self.linked_to);
        for case in &self.cases {
            match &case.value {
                ConditionalValue::Tree(tree) => tree.collect_paths(out),
                ConditionalValue::Formula(formula) => out.extend(formula.references()),
                ConditionalValue::Scalar(_) => {}
            }
        }
    }
}

impl PartialEq for ConditionalValueTree {
    fn eq(&self, other: &Self) -> bool {
        self.linked_to == other.linked_to && self.cases == other.cases
    }
}

/// Whether an object uses the conditional tree keys.
pub(crate) fn is_tree_object(map: &Map<String, Value>) -> bool {
    map.contains_key(LINKED_TO_KEY) || map.contains_key(CASES_KEY)
}

/// Accept both `this.engine.mode` and `${this.engine.mode}`.
fn parse_linked_to(text: &str) -> Result<(PathAddress, ReferenceForm)> {
    if !text.starts_with("${") {
        return PathAddress::parse(text).map(|path| (path, ReferenceForm::Bare));
    }
    let formula = FormulaExpression::parse(text)?;
    formula
        .as_single_reference()
        .cloned()
        .map(|path| (path, ReferenceForm::Wrapped))
        .ok_or_else(|| {
            ModelError::InvalidConditionalTree(format!(
                "'{LINKED_TO_KEY}' must be a single path reference, got '{text}'"
            ))
        })
}

impl Serialize for ConditionalValueTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConditionalValueTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fan_power() -> Value {
        json!({
            "linked-to": "${this.engine.mode}",
            "cases": {
                "low": "20 W",
                "mid": "40 W",
                "high": "60 W",
                "default": "0 W"
            }
        })
    }

    #[test]
    fn test_decode_flat_tree() {
        let tree = ConditionalValueTree::from_json(&fan_power()).unwrap();
        assert_eq!(tree.linked_to().render(), "this.engine.mode");
        assert_eq!(tree.reference_form(), ReferenceForm::Wrapped);
        assert_eq!(tree.labels().collect::<Vec<_>>(), ["low", "mid", "high", "default"]);
        assert_eq!(
            tree.case("mid").and_then(ConditionalValue::as_scalar),
            Some(&ScalarValue::new(40.0, "W"))
        );
        assert_eq!(
            tree.default_case().and_then(ConditionalValue::as_scalar),
            Some(&ScalarValue::new(0.0, "W"))
        );
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.to_json(), fan_power());
    }

    #[test]
    fn test_nested_tree() {
        let raw = json!({
            "linked-to": "this.engine.mode",
            "cases": {
                "off": "0 W",
                "on": {
                    "linked-to": "${this.lights.status}",
                    "cases": { "on": "=${this.engine.base} + 5", "default": "60 W" }
                }
            }
        });
        let tree = ConditionalValueTree::from_json(&raw).unwrap();
        assert_eq!(tree.depth(), 2);
        assert!(tree.default_case().is_none());

        let inner = tree.case("on").and_then(ConditionalValue::as_tree).unwrap();
        assert_eq!(inner.linked_to().render(), "this.lights.status");
        assert!(matches!(inner.case("on"), Some(ConditionalValue::Formula(_))));

        let paths: Vec<String> = tree.linked_paths().iter().map(|p| p.render()).collect();
        assert_eq!(paths, ["this.engine.mode", "this.lights.status", "this.engine.base"]);
        assert_eq!(tree.to_json(), raw);
    }

    #[test]
    fn test_bare_and_wrapped_links_are_equal() {
        let wrapped = ConditionalValueTree::from_json(&fan_power()).unwrap();
        let mut bare = fan_power();
        bare["linked-to"] = json!("this.engine.mode");
        let bare = ConditionalValueTree::from_json(&bare).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(bare.reference_form(), ReferenceForm::Bare);
    }

    #[test]
    fn test_case_values_keep_wire_type() {
        let raw = json!({
            "linked-to": "a.mode",
            "cases": {"x": "5", "y": 7, "z": "20W", "default": "0"}
        });
        let tree = ConditionalValueTree::from_json(&raw).unwrap();
        assert_eq!(
            tree.case("x").and_then(ConditionalValue::as_scalar),
            Some(&ScalarValue::unitless(5.0))
        );
        assert_eq!(
            tree.case("z").and_then(ConditionalValue::as_scalar),
            Some(&ScalarValue::new(20.0, "W"))
        );
        assert_eq!(tree.to_json(), raw);
    }

    #[test]
    fn test_case_order_is_part_of_equality() {
        let a = json!({"linked-to": "a.mode", "cases": {"x": 1, "y": 2}});
        let b = json!({"linked-to": "a.mode", "cases": {"y": 2, "x": 1}});
        assert_ne!(
            ConditionalValueTree::from_json(&a).unwrap(),
            ConditionalValueTree::from_json(&b).unwrap()
        );
    }

    #[test]
    fn test_list_form_keeps_duplicates() {
        let raw = json!({
            "linked-to": "a.mode",
            "cases": [{"x": "1 W"}, {"x": "2 W"}, {"default": "3 W"}]
        });
        let tree = ConditionalValueTree::from_json(&raw).unwrap();
        assert_eq!(tree.cases_form(), CasesForm::List);
        assert_eq!(tree.cases().len(), 3);
        assert_eq!(tree.case("x").and_then(ConditionalValue::as_scalar).unwrap().magnitude(), 1.0);
        assert_eq!(tree.to_json(), raw);
    }

    #[test]
    fn test_structural_errors() {
        let cases = [
            json!({"linked-to": "a.mode", "cases": {}}),
            json!({"linked-to": "a.mode", "cases": []}),
            json!({"cases": {"x": 1}}),
            json!({"linked-to": "a.mode"}),
            json!({"linked-to": "a.mode", "cases": [{"default": 1}, {"default": 2}]}),
            json!({"linked-to": "a.mode", "cases": [{"x": 1, "y": 2}]}),
            json!({"linked-to": "a.mode", "cases": "x"}),
            json!({"linked-to": 7, "cases": {"x": 1}}),
            json!({"linked-to": "${a.mode} + 1", "cases": {"x": 1}}),
            json!({"linked-to": "a.mode", "cases": {"x": true}}),
            json!({"linked-to": "a.mode", "cases": {"x": {"nested": 1}}}),
            json!({"linked-to": "a.mode", "cases": {"x": 1}, "extra": 1}),
            json!({"linked-to": "a.mode", "cases": {"": 1}}),
        ];
        for raw in cases {
            assert!(
                matches!(
                    ConditionalValueTree::from_json(&raw),
                    Err(ModelError::InvalidConditionalTree(_))
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_leaf_errors_propagate() {
        let bad_path = json!({"linked-to": "a..mode", "cases": {"x": 1}});
        assert!(matches!(
            ConditionalValueTree::from_json(&bad_path),
            Err(ModelError::MalformedPath { .. })
        ));

        let bad_scalar = json!({"linked-to": "a.mode", "cases": {"x": "fast"}});
        assert!(matches!(
            ConditionalValueTree::from_json(&bad_scalar),
            Err(ModelError::MalformedScalar { .. })
        ));

        let bad_formula = json!({"linked-to": "a.mode", "cases": {"x": "=${oops"}});
        assert!(matches!(
            ConditionalValueTree::from_json(&bad_formula),
            Err(ModelError::MalformedFormula { .. })
        ));
    }

    #[test]
    fn test_builder() {
        let tree = ConditionalValueTree::new(
            PathAddress::parse("this.engine.mode").unwrap(),
            [
                Case::new("off", ScalarValue::new(0.0, "W")),
                Case::new(DEFAULT_CASE, ScalarValue::new(10.0, "W")),
            ],
        )
        .unwrap()
        .with_reference_form(ReferenceForm::Wrapped);
        assert_eq!(
            tree.to_json(),
            json!({"linked-to": "${this.engine.mode}", "cases": {"off": "0 W", "default": "10 W"}})
        );
        assert!(tree.cases()[1].is_default());
    }

    #[test]
    fn test_with_case() {
        let tree = ConditionalValueTree::new(
            PathAddress::parse("fan.mode").unwrap(),
            [Case::new("low", ScalarValue::new(20.0, "W"))],
        )
        .unwrap()
        .with_case("high", ScalarValue::new(80.0, "W"))
        .unwrap()
        .with_case(DEFAULT_CASE, ScalarValue::new(0.0, "W"))
        .unwrap();
        assert_eq!(tree.labels().collect::<Vec<_>>(), ["low", "high", "default"]);
        assert_eq!(tree.default_case(), Some(&ScalarValue::new(0.0, "W").into()));

        let twice = tree.with_case(DEFAULT_CASE, ScalarValue::unitless(1.0));
        assert!(matches!(twice, Err(ModelError::InvalidConditionalTree(_))));
    }
}
