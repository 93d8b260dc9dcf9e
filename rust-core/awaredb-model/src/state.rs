// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! State declarations (`{"states": …}`).
//!
//! Two forms, told apart only by the JSON type of `states`:
//!
//! - simple: `{"states": ["off", "low", "high"]}`
//! - composite: `{"states": {"on": ["this.engine.mode.high", "this.lights.on"], "off": []}}`
//!
//! In the composite form, activating a state also sets the state of every
//! listed path. Whether those paths name state nodes is checked by the server.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::path::PathAddress;

/// Wire key holding the declared states.
pub const STATES_KEY: &str = "states";

#[derive(Debug, Clone, PartialEq)]
pub enum StateDeclaration {
    /// Mutually exclusive labels of a leaf state node.
    Simple(Vec<String>),
    /// Per state, the paths whose state is set along with it.
    Composite(Vec<(String, Vec<PathAddress>)>),
}

impl StateDeclaration {
    /// Decode a `{"states": …}` object.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(ModelError::InvalidStateDeclaration(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    pub(crate) fn from_map(map: &Map<String, Value>) -> Result<Self> {
        if let Some(key) = map.keys().find(|k| k.as_str() != STATES_KEY) {
            return Err(ModelError::InvalidStateDeclaration(format!(
                "unexpected key '{key}'"
            )));
        }
        let states = map.get(STATES_KEY).ok_or_else(|| {
            ModelError::InvalidStateDeclaration(format!("missing '{STATES_KEY}'"))
        })?;
        Self::from_states(states)
    }

    /// Decode the value of a `states` member.
    pub fn from_states(states: &Value) -> Result<Self> {
        let declaration = match states {
            Value::Array(items) => {
                let names = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        item.as_str().map(str::to_owned).ok_or_else(|| {
                            ModelError::InvalidStateDeclaration(format!(
                                "state {index} must be a string, got {item}"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                StateDeclaration::Simple(names)
            }
            Value::Object(entries) => {
                let mut composite = Vec::with_capacity(entries.len());
                for (name, assignments) in entries {
                    let paths = assignments.as_array().ok_or_else(|| {
                        ModelError::InvalidStateDeclaration(format!(
                            "assignments of state '{name}' must be a list"
                        ))
                    })?;
                    let paths = paths
                        .iter()
                        .map(|path| match path.as_str() {
                            Some(text) => PathAddress::parse(text),
                            None => Err(ModelError::InvalidStateDeclaration(format!(
                                "assignment of state '{name}' must be a path string, got {path}"
                            ))),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    composite.push((name.clone(), paths));
                }
                StateDeclaration::Composite(composite)
            }
            other => {
                return Err(ModelError::InvalidStateDeclaration(format!(
                    "'{STATES_KEY}' must be a list or an object, got {other}"
                )))
            }
        };
        declaration.validate()?;
        Ok(declaration)
    }

    fn validate(&self) -> Result<()> {
        let names = self.state_names();
        if names.is_empty() {
            return Err(ModelError::InvalidStateDeclaration(format!(
                "'{STATES_KEY}' must not be empty"
            )));
        }
        for (index, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(ModelError::InvalidStateDeclaration(format!(
                    "state {index} has an empty name"
                )));
            }
            if names[..index].contains(name) {
                return Err(ModelError::InvalidStateDeclaration(format!(
                    "duplicate state '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// A simple declaration from names.
    pub fn simple<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let declaration = StateDeclaration::Simple(names.into_iter().map(Into::into).collect());
        declaration.validate()?;
        Ok(declaration)
    }

    /// A composite declaration from `(state, assignments)` pairs.
    pub fn composite<I, S>(states: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<PathAddress>)>,
        S: Into<String>,
    {
        let declaration = StateDeclaration::Composite(
            states
                .into_iter()
                .map(|(name, paths)| (name.into(), paths))
                .collect(),
        );
        declaration.validate()?;
        Ok(declaration)
    }

    /// Encode as `{"states": …}`.
    pub fn to_json(&self) -> Value {
        let states = match self {
            StateDeclaration::Simple(names) => {
                Value::Array(names.iter().cloned().map(Value::String).collect())
            }
            StateDeclaration::Composite(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(name, paths)| {
                        let paths = paths.iter().map(|p| Value::String(p.render())).collect();
                        (name.clone(), Value::Array(paths))
                    })
                    .collect(),
            ),
        };
        let mut map = Map::new();
        map.insert(STATES_KEY.to_owned(), states);
        Value::Object(map)
    }

    /// State names in declared order.
    pub fn state_names(&self) -> Vec<&str> {
        match self {
            StateDeclaration::Simple(names) => names.iter().map(String::as_str).collect(),
            StateDeclaration::Composite(entries) => {
                entries.iter().map(|(name, _)| name.as_str()).collect()
            }
        }
    }

    /// Whether `state` is declared.
    pub fn contains(&self, state: &str) -> bool {
        self.state_names().contains(&state)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, StateDeclaration::Composite(_))
    }

    /// Paths set when `state` becomes active. `None` for simple declarations
    /// and unknown states.
    pub fn assignments(&self, state: &str) -> Option<&[PathAddress]> {
        match self {
            StateDeclaration::Simple(_) => None,
            StateDeclaration::Composite(entries) => entries
                .iter()
                .find(|(name, _)| name == state)
                .map(|(_, paths)| paths.as_slice()),
        }
    }
}

impl Serialize for StateDeclaration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StateDeclaration {
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
    fn test_simple_form() {
        let raw = json!({"states": ["off", "low", "mid", "high"]});
        let states = StateDeclaration::from_json(&raw).unwrap();
        assert!(!states.is_composite());
        assert_eq!(states.state_names(), ["off", "low", "mid", "high"]);
        assert!(states.contains("mid"));
        assert!(states.assignments("mid").is_none());
        assert_eq!(states.to_json(), raw);
    }

    #[test]
    fn test_composite_form() {
        let raw = json!({"states": {
            "on": ["this.engine.mode.high", "this.lights.status.on"],
            "eco": ["this.engine.mode.low"],
            "off": []
        }});
        let states = StateDeclaration::from_json(&raw).unwrap();
        assert!(states.is_composite());
        assert_eq!(states.state_names(), ["on", "eco", "off"]);
        let on: Vec<String> = states
            .assignments("on")
            .unwrap()
            .iter()
            .map(PathAddress::render)
            .collect();
        assert_eq!(on, ["this.engine.mode.high", "this.lights.status.on"]);
        assert_eq!(states.assignments("off"), Some(&[][..]));
        assert_eq!(states.to_json(), raw);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        for raw in [
            json!({"states": []}),
            json!({"states": {}}),
            json!({"states": "off"}),
            json!({"states": ["off", 1]}),
            json!({"states": ["off", "off"]}),
            json!({"states": [""]}),
            json!({"states": {"on": "this.a.b"}}),
            json!({"states": {"on": [3]}}),
            json!({"states": ["a"], "extra": true}),
            json!({}),
            json!(["a"]),
        ] {
            assert!(
                matches!(
                    StateDeclaration::from_json(&raw),
                    Err(ModelError::InvalidStateDeclaration(_))
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_bad_assignment_path() {
        let raw = json!({"states": {"on": ["this..a"]}});
        assert!(matches!(
            StateDeclaration::from_json(&raw),
            Err(ModelError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_constructors() {
        let simple = StateDeclaration::simple(["x", "y"]).unwrap();
        assert_eq!(simple.to_json(), json!({"states": ["x", "y"]}));
        assert!(StateDeclaration::simple(Vec::<String>::new()).is_err());

        let composite = StateDeclaration::composite([(
            "on",
            vec![PathAddress::parse("this.fan.mode.high").unwrap()],
        )])
        .unwrap();
        assert_eq!(composite.to_json(), json!({"states": {"on": ["this.fan.mode.high"]}}));
    }
}
