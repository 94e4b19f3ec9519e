//! Conversions between JSON payloads and engine values, plus the functions
//! added on top of the engine's builtins.

use std::collections::HashMap;

use gtmpl_value::{FuncError, Value};
use serde_json::Value as Json;

/// Convert an inbound payload into the value tree the engine walks.
///
/// A `null` root becomes an empty map so field access on an empty body
/// resolves to "missing" instead of failing. Nested `null`s become the
/// empty string: falsy in conditions and printed as nothing.
pub(crate) fn to_engine(data: &Json) -> Value {
    match data {
        Json::Null => Value::Map(HashMap::new()),
        other => convert(other),
    }
}

fn convert(data: &Json) -> Value {
    match data {
        Json::Null => Value::String(String::new()),
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(convert).collect()),
        Json::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), convert(v)))
                .collect(),
        ),
    }
}

/// Convert an engine value back to JSON. Values with no JSON form
/// (functions, `nil`, `<no value>`) become `null`.
pub(crate) fn to_json(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::String(s) => Json::String(s.clone()),
        Value::Number(n) => serde_json::from_str(&n.to_string()).unwrap_or(Json::Null),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Map(map) | Value::Object(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        _ => Json::Null,
    }
}

/// `json VALUE`: encode as compact JSON, so strings come out quoted and escaped.
pub(crate) fn json(args: &[Value]) -> Result<Value, FuncError> {
    let [value] = args else {
        return Err(FuncError::Generic(format!(
            "json takes 1 argument, got {}",
            args.len()
        )));
    };
    serde_json::to_string(&to_json(value))
        .map(Value::String)
        .map_err(|e| FuncError::Generic(e.to_string()))
}

/// `slice ITEMS [LOW [HIGH]]` over an array or a string (byte offsets).
pub(crate) fn slice(args: &[Value]) -> Result<Value, FuncError> {
    let Some((target, bounds)) = args.split_first() else {
        return Err(FuncError::Generic("slice needs a value to slice".to_string()));
    };
    if bounds.len() > 2 {
        return Err(FuncError::Generic(format!(
            "slice takes at most 2 indices, got {}",
            bounds.len()
        )));
    }
    let bounds = bounds
        .iter()
        .map(|bound| {
            to_json(bound)
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| FuncError::Generic("slice index must be a non-negative integer".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let range = |len: usize| {
        let low = bounds.first().copied().unwrap_or(0);
        let high = bounds.get(1).copied().unwrap_or(len);
        if low > high || high > len {
            return Err(FuncError::Generic(format!(
                "slice index out of range: {low}:{high} of {len}"
            )));
        }
        Ok(low..high)
    };

    match target {
        Value::Array(items) => Ok(Value::Array(items[range(items.len())?].to_vec())),
        Value::String(s) => s
            .get(range(s.len())?)
            .map(|part| Value::String(part.to_string()))
            .ok_or_else(|| FuncError::Generic("slice splits a UTF-8 character".to_string())),
        _ => Err(FuncError::Generic("can't slice item of this type".to_string())),
    }
}
