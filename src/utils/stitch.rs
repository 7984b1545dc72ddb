// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

/// Fold a streamed chunk into the value accumulated so far.
///
/// Strings concatenate, arrays extend, and objects stitch key by key so a
/// chunk like `{"text": " world"}` extends the `text` field of the previous
/// chunks. Anything else replaces the accumulated value.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use the_switchboard::utils::stitch_chunk;
///
/// let acc = stitch_chunk(Some(json!({"text": "hello"})), json!({"text": " world"}));
/// assert_eq!(acc, json!({"text": "hello world"}));
/// ```
pub fn stitch_chunk(accumulated: Option<Value>, chunk: Value) -> Value {
    match (accumulated, chunk) {
        (None, chunk) => chunk,
        (Some(Value::String(mut acc)), Value::String(chunk)) => {
            acc.push_str(&chunk);
            Value::String(acc)
        }
        (Some(Value::Array(mut acc)), Value::Array(chunk)) => {
            acc.extend(chunk);
            Value::Array(acc)
        }
        (Some(Value::Object(mut acc)), Value::Object(chunk)) => {
            for (key, value) in chunk {
                let merged = stitch_chunk(acc.remove(&key), value);
                acc.insert(key, merged);
            }
            Value::Object(acc)
        }
        (Some(_), chunk) => chunk,
    }
}

/// Text form of a value as it appears in rendered output
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
