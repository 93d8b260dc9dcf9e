// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Unit-bearing scalar values (`"250 hp"`, `"55 kWh"`, `80000`).
//!
//! The client never converts units: two scalars are equal only when both
//! magnitude and unit tag match exactly. Magnitudes are rendered in their
//! shortest form, so `"55.50 kWh"` renders back as `"55.5 kWh"`.
//!
//! A decoded scalar remembers its [`ScalarForm`]: a JSON number goes back out
//! as the same number, a string goes back out as a string with the same
//! spacing before the unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{ModelError, Result};

/// Largest magnitude rendered as a JSON integer (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// How a scalar was written on the wire. Ignored by equality.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScalarForm {
    /// Built in code: `"<magnitude> <unit>"`, or a JSON number when unitless.
    #[default]
    Canonical,
    /// A JSON number, re-emitted verbatim.
    Number(serde_json::Number),
    /// A JSON string; `separator` is the whitespace between magnitude and unit.
    Text { separator: String },
}

/// A numeric magnitude with an optional unit tag.
#[derive(Debug, Clone)]
pub struct ScalarValue {
    magnitude: f64,
    unit: Option<String>,
    form: ScalarForm,
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.magnitude == other.magnitude && self.unit == other.unit
    }
}

impl ScalarValue {
    /// A scalar with a unit. An empty or all-whitespace unit is treated as absent.
    pub fn new(magnitude: f64, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        let unit = unit.trim();
        Self {
            magnitude,
            unit: (!unit.is_empty()).then(|| unit.to_owned()),
            form: ScalarForm::Canonical,
        }
    }

    /// A scalar without a unit.
    pub fn unitless(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: None,
            form: ScalarForm::Canonical,
        }
    }

    /// The numeric magnitude.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// The unit tag, if any.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn form(&self) -> &ScalarForm {
        &self.form
    }

    fn from_text(magnitude: f64, rest: &str) -> Self {
        let separator: String = rest.chars().take_while(|c| c.is_whitespace()).collect();
        Self {
            form: ScalarForm::Text { separator },
            ..Self::new(magnitude, rest)
        }
    }

    /// Parse `"<number>[<unit>]"`.
    ///
    /// Everything after the numeric prefix, trimmed, is the unit.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedScalar`] if the text has no numeric
    /// prefix or the magnitude does not fit a finite `f64`.
    pub fn parse(text: &str) -> Result<Self> {
        let len = numeric_prefix_len(text)
            .ok_or_else(|| ModelError::scalar(text, "no numeric prefix"))?;
        let magnitude = parse_magnitude(text, &text[..len])?;
        Ok(Self::from_text(magnitude, &text[len..]))
    }

    /// Parse only the canonical quantity form `<number><whitespace><unit>`.
    ///
    /// Used to classify free-form strings inside node documents, where
    /// `"2024-01-01"` or `"80000"` must stay text.
    pub(crate) fn parse_quantity(text: &str) -> Option<Self> {
        let len = numeric_prefix_len(text)?;
        let rest = &text[len..];
        if !rest.starts_with(char::is_whitespace) || rest.trim().is_empty() {
            return None;
        }
        let magnitude = parse_magnitude(text, &text[..len]).ok()?;
        Some(Self::from_text(magnitude, rest))
    }

    /// Render as `"<magnitude> <unit>"` or `"<magnitude>"`, keeping the
    /// decoded spacing and the digits of a decoded JSON number.
    pub fn render(&self) -> String {
        match (&self.unit, &self.form) {
            (Some(unit), ScalarForm::Text { separator }) => {
                format!("{}{}{}", self.magnitude, separator, unit)
            }
            (Some(unit), _) => format!("{} {}", self.magnitude, unit),
            (None, ScalarForm::Number(number)) => number.to_string(),
            (None, _) => self.magnitude.to_string(),
        }
    }

    /// Decode from the wire: a JSON number or a scalar string.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(number) => {
                let magnitude = number
                    .as_f64()
                    .ok_or_else(|| ModelError::scalar(&number.to_string(), "number out of range"))?;
                Ok(Self {
                    form: ScalarForm::Number(number.clone()),
                    ..Self::unitless(magnitude)
                })
            }
            Value::String(text) => Self::parse(text),
            other => Err(ModelError::scalar(
                &other.to_string(),
                "expected a number or a string",
            )),
        }
    }

    /// Encode for the wire in the decoded form.
    ///
    /// Canonical values: unitless ones become JSON numbers (integers when
    /// whole), values with a unit become strings.
    pub fn to_json(&self) -> Value {
        match &self.form {
            ScalarForm::Number(number) => return Value::Number(number.clone()),
            ScalarForm::Text { .. } => return Value::String(self.render()),
            ScalarForm::Canonical => {}
        }
        if self.unit.is_some() {
            return Value::String(self.render());
        }
        if self.magnitude.fract() == 0.0 && self.magnitude.abs() < MAX_EXACT_INTEGER {
            return Value::from(self.magnitude as i64);
        }
        serde_json::Number::from_f64(self.magnitude)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(self.render()))
    }
}

/// Byte length of the leading `[+-]digits[.digits]` run, if any digits exist.
fn numeric_prefix_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    (digits > 0).then_some(i)
}

fn parse_magnitude(text: &str, prefix: &str) -> Result<f64> {
    let magnitude = prefix
        .parse::<f64>()
        .map_err(|e| ModelError::scalar(text, format!("invalid magnitude: {e}")))?;
    if !magnitude.is_finite() {
        return Err(ModelError::scalar(text, "magnitude out of range"));
    }
    Ok(magnitude)
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for ScalarValue {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
