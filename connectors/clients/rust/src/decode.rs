// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Response decoding.
//!
//! A successful reply is an envelope `{"data": …}`; [`ResponseDecoder::data`]
//! unwraps it and turns a rejection into [`AwareDbError::Server`]. The
//! remaining functions decode `data` with the same grammar the builders
//! encode with. A response that does not fit fails the whole call.

use awaredb_model::{NodeDocument, PathAddress, PropertyValue, ScalarValue};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::error::{AwareDbError, Result};
use crate::transport::{Command, Reply};

/// Envelope member holding the command's result.
pub const DATA_KEY: &str = "data";

/// Rejection members searched, in order, for the error message.
const MESSAGE_KEYS: [&str; 3] = ["detail", "error", "message"];

/// Decodes replies into model types.
pub struct ResponseDecoder;

impl ResponseDecoder {
    /// Unwrap the `data` member of a reply. A missing member is `null`.
    pub fn data(command: Command, reply: Reply) -> Result<Value> {
        match reply {
            Reply::Success(Value::Object(mut envelope)) => {
                Ok(envelope.remove(DATA_KEY).unwrap_or(Value::Null))
            }
            Reply::Success(other) => Err(AwareDbError::unexpected(
                command,
                format!("expected an object envelope, got {}", kind(&other)),
            )),
            Reply::Rejected { status, body } => Err(Self::server_error(status, body)),
        }
    }

    /// Build [`AwareDbError::Server`] from a rejection body.
    pub fn server_error(status: u16, body: Value) -> AwareDbError {
        let message = MESSAGE_KEYS
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .map(str::to_owned)
            .or_else(|| body.as_str().map(str::to_owned))
            .unwrap_or_else(|| body.to_string());
        let code = match body.get("code") {
            Some(Value::String(code)) => Some(code.clone()),
            Some(Value::Number(code)) => Some(code.to_string()),
            _ => None,
        }
        .or_else(|| Some(status.to_string()));
        warn!(status, code = code.as_deref(), "Server rejected command");
        AwareDbError::Server {
            status,
            code,
            message,
            body,
        }
    }

    /// A single scalar (`get`, `calculate`).
    pub fn scalar(data: &Value) -> Result<ScalarValue> {
        Ok(ScalarValue::from_json(data)?)
    }

    /// A list of scalars (`calculate` with several formulas).
    pub fn scalars(command: Command, data: &Value) -> Result<Vec<ScalarValue>> {
        let items = data.as_array().ok_or_else(|| {
            AwareDbError::unexpected(command, format!("expected a list, got {}", kind(data)))
        })?;
        items
            .iter()
            .map(|item| Ok(ScalarValue::from_json(item)?))
            .collect()
    }

    /// Any property value, classified like a document property.
    pub fn property(data: &Value) -> Result<PropertyValue> {
        Ok(PropertyValue::from_json(data)?)
    }

    /// Node documents (`query`, `update`). A single object is one document,
    /// `null` is none.
    pub fn documents(command: Command, data: &Value) -> Result<Vec<NodeDocument>> {
        match data {
            Value::Array(items) => items
                .iter()
                .map(|item| Ok(NodeDocument::from_json(item)?))
                .collect(),
            Value::Object(_) => Ok(vec![NodeDocument::from_json(data)?]),
            Value::Null => Ok(Vec::new()),
            other => Err(AwareDbError::unexpected(
                command,
                format!("expected documents, got {}", kind(other)),
            )),
        }
    }

    /// The `what-if` impact map, in server order.
    pub fn impacts(command: Command, data: &Value) -> Result<IndexMap<PathAddress, ScalarValue>> {
        let entries = data.as_object().ok_or_else(|| {
            AwareDbError::unexpected(command, format!("expected an object, got {}", kind(data)))
        })?;
        entries
            .iter()
            .map(|(path, value)| Ok((PathAddress::parse(path)?, ScalarValue::from_json(value)?)))
            .collect()
    }

    /// Ids acknowledged by `remove`.
    ///
    /// Accepts a list of ids, an object carrying `removed` or `ids`, or a bare
    /// acknowledgement (`null`, `true`), which echoes `requested`.
    pub fn removed(command: Command, data: &Value, requested: &[&str]) -> Result<Vec<String>> {
        let list = match data {
            Value::Null | Value::Bool(true) => {
                return Ok(requested.iter().map(|id| (*id).to_owned()).collect())
            }
            Value::Array(_) => data,
            Value::Object(map) => map
                .get("removed")
                .or_else(|| map.get("ids"))
                .ok_or_else(|| AwareDbError::unexpected(command, "missing 'removed' ids"))?,
            other => {
                return Err(AwareDbError::unexpected(
                    command,
                    format!("expected removed ids, got {}", kind(other)),
                ))
            }
        };
        let items = list
            .as_array()
            .ok_or_else(|| AwareDbError::unexpected(command, "removed ids must be a list"))?;
        items
            .iter()
            .map(|item| match item {
                Value::String(id) => Ok(id.clone()),
                other => Err(AwareDbError::unexpected(
                    command,
                    format!("removed id must be a string, got {other}"),
                )),
            })
            .collect()
    }

    /// Whether a `check` reply reports `{"connected": true}`.
    pub fn connected(data: &Value) -> bool {
        data.get("connected").and_then(Value::as_bool).unwrap_or(false)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awaredb_model::{ModelError, VALUE_KEY};
    use serde_json::json;

    #[test]
    fn test_unwraps_data() {
        let data = ResponseDecoder::data(Command::Get, Reply::Success(json!({"data": "250 hp"}))).unwrap();
        assert_eq!(data, json!("250 hp"));
        assert_eq!(
            ResponseDecoder::scalar(&data).unwrap(),
            ScalarValue::new(250.0, "hp")
        );

        let missing = ResponseDecoder::data(Command::Flush, Reply::Success(json!({}))).unwrap();
        assert_eq!(missing, Value::Null);

        let err = ResponseDecoder::data(Command::Get, Reply::Success(json!([1]))).unwrap_err();
        assert!(matches!(err, AwareDbError::UnexpectedResponse { command: Command::Get, .. }));
    }

    #[test]
    fn test_rejection_becomes_server_error() {
        let reply = Reply::Rejected {
            status: 400,
            body: json!({"detail": "Node 'car' not found", "code": "not_found"}),
        };
        match ResponseDecoder::data(Command::Get, reply).unwrap_err() {
            AwareDbError::Server { status, code, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("not_found"));
                assert_eq!(message, "Node 'car' not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_server_error_fallbacks() {
        match ResponseDecoder::server_error(400, json!({"error": "bad formula"})) {
            AwareDbError::Server { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("400"));
                assert_eq!(message, "bad formula");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match ResponseDecoder::server_error(400, json!({"path": ["required"]})) {
            AwareDbError::Server { message, .. } => assert_eq!(message, r#"{"path":["required"]}"#),
            other => panic!("unexpected error: {other:?}"),
        }
        match ResponseDecoder::server_error(400, json!("plain")) {
            AwareDbError::Server { message, .. } => assert_eq!(message, "plain"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scalar_rejects_non_scalars() {
        let err = ResponseDecoder::scalar(&json!({"linked-to": "a.b"})).unwrap_err();
        assert!(matches!(err, AwareDbError::Model(ModelError::MalformedScalar { .. })));
    }

    #[test]
    fn test_scalars() {
        let values = ResponseDecoder::scalars(Command::Calculate, &json!([500, "12.5 kg"])).unwrap();
        assert_eq!(values, [ScalarValue::unitless(500.0), ScalarValue::new(12.5, "kg")]);
        assert!(ResponseDecoder::scalars(Command::Calculate, &json!(5)).is_err());
    }

    #[test]
    fn test_documents_keep_mirror_apart() {
        let data = json!([{
            "id": "n1",
            "name": "Fan",
            "power": {"linked-to": "this.mode", "cases": {"on": "10 W"}, "value": "10 W"},
            "value": "Fan"
        }]);
        let docs = ResponseDecoder::documents(Command::Query, &data).unwrap();
        assert_eq!(docs.len(), 1);
        let fan = &docs[0];
        assert!(fan.get(VALUE_KEY).is_none());
        assert!(fan.annotations().contains(VALUE_KEY));
        assert_eq!(fan.annotations().property_value("power"), Some(&json!("10 W")));
        assert_eq!(fan.id(), Some("n1"));

        assert!(ResponseDecoder::documents(Command::Query, &Value::Null).unwrap().is_empty());
        assert!(ResponseDecoder::documents(Command::Query, &json!("x")).is_err());
    }

    #[test]
    fn test_malformed_document_fails_whole_response() {
        let data = json!([
            {"name": "ok"},
            {"power": {"linked-to": "this.mode", "cases": {}}}
        ]);
        let err = ResponseDecoder::documents(Command::Query, &data).unwrap_err();
        assert!(matches!(err, AwareDbError::Model(ModelError::InvalidConditionalTree(_))));
    }

    #[test]
    fn test_impacts_keep_order() {
        let data = json!({"car.range": "410 km", "battery.capacity": "55 kWh"});
        let impacts = ResponseDecoder::impacts(Command::WhatIf, &data).unwrap();
        let keys: Vec<String> = impacts.keys().map(PathAddress::render).collect();
        assert_eq!(keys, ["car.range", "battery.capacity"]);
        assert_eq!(
            impacts[&PathAddress::parse("car.range").unwrap()],
            ScalarValue::new(410.0, "km")
        );
    }

    #[test]
    fn test_removed_shapes() {
        let requested = ["a", "b"];
        assert_eq!(
            ResponseDecoder::removed(Command::Remove, &json!(["a"]), &requested).unwrap(),
            ["a"]
        );
        assert_eq!(
            ResponseDecoder::removed(Command::Remove, &json!({"removed": ["b"]}), &requested).unwrap(),
            ["b"]
        );
        assert_eq!(
            ResponseDecoder::removed(Command::Remove, &Value::Null, &requested).unwrap(),
            ["a", "b"]
        );
        assert!(ResponseDecoder::removed(Command::Remove, &json!({"count": 2}), &requested).is_err());
        assert!(ResponseDecoder::removed(Command::Remove, &json!([1]), &requested).is_err());
    }

    #[test]
    fn test_connected() {
        assert!(ResponseDecoder::connected(&json!({"connected": true})));
        assert!(!ResponseDecoder::connected(&json!({"connected": false})));
        assert!(!ResponseDecoder::connected(&Value::Null));
    }
}
