// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Node documents and the property classifier.
//!
//! A node document is an ordered mapping from property name to a
//! [`PropertyValue`]. Every JSON value is classified once, by
//! [`PropertyValue::from_json`], looking only at its type and keys:
//!
//! | JSON | Classified as |
//! |------|---------------|
//! | object with `linked-to` or `cases` | [`ConditionalValueTree`] |
//! | object whose only key is `states` | [`StateDeclaration`] |
//! | any other object | nested [`NodeDocument`] |
//! | string starting with `=` or containing `${` | [`FormulaExpression`] |
//! | string `"<number> <unit>"` | [`ScalarValue`] |
//! | other string | text |
//! | number | unitless [`ScalarValue`] |
//! | bool, null, list | literal, carried verbatim |
//!
//! Server responses add a computed `value` member to documents (and to
//! conditional or state properties). It is kept in [`Annotations`], never in
//! the declared properties, and [`NodeDocument::to_json`] never emits it, so
//! a decoded response can be sent back in a write request unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::trace;

use crate::conditional::{is_tree_object, ConditionalValueTree};
use crate::error::{ModelError, Result};
use crate::formula::FormulaExpression;
use crate::scalar::ScalarValue;
use crate::state::{StateDeclaration, STATES_KEY};

/// Response-only member mirroring the computed form of a document or property.
pub const VALUE_KEY: &str = "value";

/// Server-assigned node identifier.
pub const ID_KEY: &str = "id";

/// Server-assigned unique identifier.
pub const UID_KEY: &str = "uid";

/// Node name.
pub const NAME_KEY: &str = "name";

/// One property of a node document.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(ScalarValue),
    Formula(FormulaExpression),
    Conditional(ConditionalValueTree),
    States(StateDeclaration),
    Document(NodeDocument),
    /// A string that is neither a formula nor a quantity.
    Text(String),
    /// Booleans, nulls and lists.
    Literal(Value),
}

impl PropertyValue {
    /// Classify a JSON value. A `value` mirror on a conditional or state
    /// object is rejected here; use [`NodeDocument::from_json`] for responses.
    pub fn from_json(value: &Value) -> Result<Self> {
        let (property, mirror) = Self::decode(value)?;
        if mirror.is_some() {
            return Err(ModelError::InvalidDocument(format!(
                "unexpected '{VALUE_KEY}' outside a node document"
            )));
        }
        Ok(property)
    }

    /// Classify a caller-supplied string the way a document string is classified.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::decode(&Value::String(text.to_owned())).map(|(property, _)| property)
    }

    /// Classify `value`, splitting off a `value` mirror on conditional and
    /// state objects.
    fn decode(value: &Value) -> Result<(Self, Option<Value>)> {
        let property = match value {
            Value::Object(map) => {
                let mirror = map.get(VALUE_KEY).cloned();
                let declared_keys = map.keys().filter(|k| k.as_str() != VALUE_KEY).count();

                if is_tree_object(map) {
                    let tree = ConditionalValueTree::from_map(&without_mirror(map))?;
                    return Ok((PropertyValue::Conditional(tree), mirror));
                }
                if declared_keys == 1 && map.contains_key(STATES_KEY) {
                    let states = StateDeclaration::from_map(&without_mirror(map))?;
                    return Ok((PropertyValue::States(states), mirror));
                }
                PropertyValue::Document(NodeDocument::from_map(map)?)
            }
            Value::String(text) if FormulaExpression::looks_like_formula(text) => {
                PropertyValue::Formula(FormulaExpression::parse(text)?)
            }
            Value::String(text) => match ScalarValue::parse_quantity(text) {
                Some(scalar) => PropertyValue::Scalar(scalar),
                None => PropertyValue::Text(text.clone()),
            },
            Value::Number(_) => PropertyValue::Scalar(ScalarValue::from_json(value)?),
            Value::Bool(_) | Value::Null | Value::Array(_) => PropertyValue::Literal(value.clone()),
        };
        Ok((property, None))
    }

    /// Encode for a request (no mirrors).
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Scalar(scalar) => scalar.to_json(),
            PropertyValue::Formula(formula) => Value::String(formula.render()),
            PropertyValue::Conditional(tree) => tree.to_json(),
            PropertyValue::States(states) => states.to_json(),
            PropertyValue::Document(document) => document.to_json(),
            PropertyValue::Text(text) => Value::String(text.clone()),
            PropertyValue::Literal(value) => value.clone(),
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            PropertyValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_formula(&self) -> Option<&FormulaExpression> {
        match self {
            PropertyValue::Formula(formula) => Some(formula),
            _ => None,
        }
    }

    pub fn as_conditional(&self) -> Option<&ConditionalValueTree> {
        match self {
            PropertyValue::Conditional(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_states(&self) -> Option<&StateDeclaration> {
        match self {
            PropertyValue::States(states) => Some(states),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&NodeDocument> {
        match self {
            PropertyValue::Document(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

fn without_mirror(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| k.as_str() != VALUE_KEY)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl From<ScalarValue> for PropertyValue {
    fn from(value: ScalarValue) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<FormulaExpression> for PropertyValue {
    fn from(value: FormulaExpression) -> Self {
        PropertyValue::Formula(value)
    }
}

impl From<ConditionalValueTree> for PropertyValue {
    fn from(value: ConditionalValueTree) -> Self {
        PropertyValue::Conditional(value)
    }
}

impl From<StateDeclaration> for PropertyValue {
    fn from(value: StateDeclaration) -> Self {
        PropertyValue::States(value)
    }
}

impl From<NodeDocument> for PropertyValue {
    fn from(value: NodeDocument) -> Self {
        PropertyValue::Document(value)
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Response-only metadata attached to a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    value: Option<Value>,
    property_values: IndexMap<String, Value>,
}

impl Annotations {
    /// The document's own `value` mirror.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The `value` mirror carried by a conditional or state property.
    pub fn property_value(&self, property: &str) -> Option<&Value> {
        self.property_values.get(property)
    }

    /// `"value"` asks for the document mirror; any other key asks for a
    /// property mirror.
    pub fn contains(&self, key: &str) -> bool {
        if key == VALUE_KEY {
            self.value.is_some()
        } else {
            self.property_values.contains_key(key)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.property_values.is_empty()
    }
}

/// A named, possibly nested mapping of properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDocument {
    properties: IndexMap<String, PropertyValue>,
    annotations: Annotations,
}

impl NodeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a document, moving every `value` mirror into [`Annotations`].
    ///
    /// # Errors
    ///
    /// Fails if `value` is not an object or any property fails to decode.
    /// No partially decoded document is ever returned.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(ModelError::InvalidDocument(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    pub(crate) fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut document = NodeDocument::new();
        for (name, raw) in map {
            if name == VALUE_KEY {
                document.annotations.value = Some(raw.clone());
                continue;
            }
            let (property, mirror) = PropertyValue::decode(raw)?;
            if let Some(mirror) = mirror {
                trace!(property = %name, "Split value mirror from property");
                document.annotations.property_values.insert(name.clone(), mirror);
            }
            document.properties.insert(name.clone(), property);
        }
        Ok(document)
    }

    /// Encode for a write request: declared properties only.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.properties
                .iter()
                .map(|(name, property)| (name.clone(), property.to_json()))
                .collect(),
        )
    }

    /// Encode with every mirror put back where it was decoded from.
    pub fn to_annotated_json(&self) -> Value {
        let mut map = Map::new();
        for (name, property) in &self.properties {
            let mut encoded = match property {
                PropertyValue::Document(nested) => nested.to_annotated_json(),
                other => other.to_json(),
            };
            if let (Some(mirror), Value::Object(object)) =
                (self.annotations.property_values.get(name), &mut encoded)
            {
                object.insert(VALUE_KEY.to_owned(), mirror.clone());
            }
            map.insert(name.clone(), encoded);
        }
        if let Some(value) = &self.annotations.value {
            map.insert(VALUE_KEY.to_owned(), value.clone());
        }
        Value::Object(map)
    }

    /// Add or replace a property, returning the previous value.
    ///
    /// # Errors
    ///
    /// The name `value` is reserved for the response mirror.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<Option<PropertyValue>> {
        let name = name.into();
        if name == VALUE_KEY {
            return Err(ModelError::InvalidDocument(format!(
                "'{VALUE_KEY}' is reserved for computed values"
            )));
        }
        Ok(self.properties.insert(name, value.into()))
    }

    /// Builder form of [`NodeDocument::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Result<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Remove a property, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.annotations.property_values.shift_remove(name);
        self.properties.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Declared properties in order.
    pub fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Drop every mirror, recursively.
    pub fn strip_annotations(&mut self) {
        self.annotations = Annotations::default();
        for property in self.properties.values_mut() {
            if let PropertyValue::Document(nested) = property {
                nested.strip_annotations();
            }
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.get(ID_KEY).and_then(PropertyValue::as_text)
    }

    pub fn uid(&self) -> Option<&str> {
        self.get(UID_KEY).and_then(PropertyValue::as_text)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME_KEY).and_then(PropertyValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Serialize for NodeDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification() {
        let raw = json!({
            "name": "Tesla",
            "power": "250 hp",
            "weight": 1800,
            "torque": "=${this.power} * 3",
            "released": "2024-01-01",
            "electric": true,
            "tags": ["ev", "sedan"],
            "mode": {"states": ["eco", "sport"]},
            "range": {"linked-to": "this.mode", "cases": {"eco": "600 km", "default": "450 km"}},
            "battery": {"capacity": "100 kWh"}
        });
        let doc = NodeDocument::from_json(&raw).unwrap();
        assert_eq!(doc.name(), Some("Tesla"));
        assert_eq!(doc.get("power").and_then(PropertyValue::as_scalar), Some(&ScalarValue::new(250.0, "hp")));
        assert_eq!(doc.get("weight").and_then(PropertyValue::as_scalar), Some(&ScalarValue::unitless(1800.0)));
        assert!(doc.get("torque").and_then(PropertyValue::as_formula).is_some());
        assert_eq!(doc.get("released").and_then(PropertyValue::as_text), Some("2024-01-01"));
        assert_eq!(doc.get("electric"), Some(&PropertyValue::Literal(json!(true))));
        assert!(matches!(doc.get("tags"), Some(PropertyValue::Literal(_))));
        assert!(doc.get("mode").and_then(PropertyValue::as_states).is_some());
        assert!(doc.get("range").and_then(PropertyValue::as_conditional).is_some());
        let battery = doc.get("battery").and_then(PropertyValue::as_document).unwrap();
        assert_eq!(battery.get("capacity").and_then(PropertyValue::as_scalar).unwrap().unit(), Some("kWh"));

        assert_eq!(doc.to_json(), raw);
        assert_eq!(
            doc.properties().keys().map(String::as_str).collect::<Vec<_>>(),
            ["name", "power", "weight", "torque", "released", "electric", "tags", "mode", "range", "battery"]
        );
    }

    #[test]
    fn test_numbers_go_out_as_they_came_in() {
        let raw = json!({
            "serial": u64::MAX,
            "offset": i64::MIN,
            "ratio": 0.1,
            "power": {"linked-to": "this.mode", "cases": {"on": 12345678901234567890u64, "default": "0"}}
        });
        let doc = NodeDocument::from_json(&raw).unwrap();
        assert!(doc.get("serial").and_then(PropertyValue::as_scalar).is_some());
        assert_eq!(doc.to_json(), raw);
        assert_eq!(NodeDocument::from_json(&doc.to_json()).unwrap(), doc);
    }

    #[test]
    fn test_value_mirror_is_an_annotation() {
        let raw = json!({
            "id": "0b5f",
            "name": "Fan",
            "power": {"linked-to": "this.mode", "cases": {"on": "60 W", "default": "0 W"}, "value": "0 W"},
            "mode": {"states": ["off", "on"], "value": "off"},
            "value": {"power": "0 W", "mode": "off"}
        });
        let doc = NodeDocument::from_json(&raw).unwrap();

        assert!(doc.annotations().contains("value"));
        assert!(doc.get("value").is_none());
        assert_eq!(doc.annotations().value(), Some(&json!({"power": "0 W", "mode": "off"})));
        assert_eq!(doc.annotations().property_value("power"), Some(&json!("0 W")));
        assert_eq!(doc.annotations().property_value("mode"), Some(&json!("off")));

        let request = doc.to_json();
        assert!(request.get("value").is_none());
        assert!(request["power"].get("value").is_none());
        assert!(request["mode"].get("value").is_none());

        assert_eq!(doc.to_annotated_json(), raw);
    }

    #[test]
    fn test_nested_document_mirror() {
        let raw = json!({"engine": {"rpm": 900, "value": {"rpm": 900}}});
        let mut doc = NodeDocument::from_json(&raw).unwrap();
        let engine = doc.get("engine").and_then(PropertyValue::as_document).unwrap();
        assert!(engine.annotations().contains("value"));
        assert_eq!(doc.to_json(), json!({"engine": {"rpm": 900}}));
        assert_eq!(doc.to_annotated_json(), raw);

        doc.strip_annotations();
        assert_eq!(doc.to_annotated_json(), json!({"engine": {"rpm": 900}}));
    }

    #[test]
    fn test_decode_failures_are_not_partial() {
        for raw in [
            json!({"ok": 1, "bad": {"linked-to": "this.mode", "cases": {}}}),
            json!({"bad": "=${unterminated"}),
            json!({"bad": {"states": []}}),
            json!({"nested": {"bad": {"cases": {"x": 1}}}}),
            json!("not a document"),
        ] {
            assert!(NodeDocument::from_json(&raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_property_value_rejects_mirror_outside_document() {
        let raw = json!({"states": ["a"], "value": "a"});
        assert!(matches!(
            PropertyValue::from_json(&raw),
            Err(ModelError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_from_text() {
        assert_eq!(
            PropertyValue::from_text("55 kWh").unwrap(),
            PropertyValue::Scalar(ScalarValue::new(55.0, "kWh"))
        );
        assert!(matches!(PropertyValue::from_text("=${a.b}").unwrap(), PropertyValue::Formula(_)));
        assert_eq!(PropertyValue::from_text("red").unwrap(), PropertyValue::Text("red".into()));
        assert!(PropertyValue::from_text("${a").is_err());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut doc = NodeDocument::new()
            .with("name", PropertyValue::Text("Fan".into()))
            .unwrap()
            .with("power", ScalarValue::new(60.0, "W"))
            .unwrap();
        assert_eq!(doc.len(), 2);
        assert!(doc.insert("value", ScalarValue::unitless(1.0)).is_err());
        assert!(doc.remove("name").is_some());
        assert_eq!(doc.to_json(), json!({"power": "60 W"}));
    }
}
