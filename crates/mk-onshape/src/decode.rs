//! FeatureScript result decoding
//!
//! Evaluation results arrive wrapped in typed `BTFSValue*` envelopes. Maps
//! are encoded as arrays of key/value entries.

use mk_core::{RawEdgeRecord, ServiceError, ServiceResult};
use serde_json::{Map, Value};

use crate::units::LengthUnit;

const ID_FIELDS: [&str; 3] = ["transientId", "deterministicId", "originFeatureId"];

/// Strip `BTFSValue*` envelopes into plain JSON
pub fn unwrap_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(unwrap_value).collect()),
        Value::Object(object) => match (object.get("btType"), object.get("value")) {
            (Some(Value::String(ty)), Some(Value::Array(entries))) if ty.contains("BTFSValueMap") => {
                let mut map = Map::new();
                for entry in entries {
                    if let Some(key) = map_key(entry.get("key")) {
                        let inner = entry.get("value").map(unwrap_value).unwrap_or(Value::Null);
                        map.insert(key, inner);
                    }
                }
                Value::Object(map)
            }
            (Some(_), Some(inner)) => unwrap_value(inner),
            _ => Value::Object(
                object
                    .iter()
                    .map(|(k, v)| (k.clone(), unwrap_value(v)))
                    .collect(),
            ),
        },
        scalar => scalar.clone(),
    }
}

fn map_key(key: Option<&Value>) -> Option<String> {
    match key.map(unwrap_value)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Decode the response of a topology evaluation into edge records
///
/// Radii are reported in meters and converted to `units`.
pub fn decode_edge_records(response: &Value, units: LengthUnit) -> ServiceResult<Vec<RawEdgeRecord>> {
    if let Some(message) = script_error(response) {
        return Err(ServiceError::ScriptFailed(message));
    }

    let result = response.get("result").unwrap_or(response);
    let plain = unwrap_value(result);

    let items = match plain {
        Value::Array(items) => items,
        // The query always returns a list; undefined means it threw
        Value::Null => {
            return Err(ServiceError::ScriptFailed(
                "evaluation returned no result".into(),
            ));
        }
        other => {
            return Err(ServiceError::MalformedResponse(format!(
                "expected an array of edges, got {}",
                kind(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let Value::Object(mut object) = item else {
                return Err(ServiceError::MalformedResponse(format!(
                    "edge {} is not a map",
                    index
                )));
            };
            for field in ID_FIELDS {
                flatten_single(&mut object, field);
            }
            let mut record: RawEdgeRecord = serde_json::from_value(Value::Object(object))
                .map_err(|e| ServiceError::MalformedResponse(format!("edge {}: {}", index, e)))?;
            record.radius = record.radius.map(|r| units.from_meters(r));
            Ok(record)
        })
        .collect()
}

/// First ERROR-level notice of an evaluation, if any
fn script_error(response: &Value) -> Option<String> {
    let notices = response.get("notices")?.as_array()?;
    notices
        .iter()
        .find(|n| {
            n["level"]
                .as_str()
                .is_some_and(|level| level.eq_ignore_ascii_case("ERROR"))
        })
        .map(|notice| {
            let message = &notice["message"];
            message
                .as_str()
                .or_else(|| message["message"].as_str())
                .unwrap_or("unknown error")
                .to_string()
        })
}

/// Query-to-string helpers return one-element lists; keep the string
fn flatten_single(object: &mut Map<String, Value>, field: &str) {
    if let Some(Value::Array(items)) = object.get(field)
        && let [Value::String(s)] = items.as_slice()
    {
        let s = s.clone();
        object.insert(field.to_string(), Value::String(s));
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}
