//! Parsers for inspect-style JSON output
//!
//! Tools return JSON in two shapes: a single object wrapped in a one-element
//! array and pretty-printed over many lines (`inspect <one thing>`), or a plain
//! array of objects. Both are decoded through [`serde_json::Value`] so the
//! variant differences can be normalized before the typed decode.

use command_executor::{CommandResponse, ProcessExecutionResult, ResponseParser, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::debug;

/// Fields printed either as a bare string or as an array of strings
const ARRAY_FIELDS: &[&str] = &["/Config/Entrypoint", "/Config/Cmd"];

/// Nested objects that are absent in one variant and present-but-empty in another
const OPTIONAL_OBJECTS: &[&str] = &["/State/Health"];

/// Name fields some tools prefix with `/`
const NAME_FIELDS: &[&str] = &["/Name"];

/// Bring one decoded object into its canonical shape
///
/// - array-or-scalar fields become an array, or `null` when blank
/// - empty optional objects are removed
/// - the leading `/` of name fields is stripped
pub fn normalize(value: &mut Value) {
    for path in ARRAY_FIELDS {
        if let Some(field) = value.pointer_mut(path) {
            match field {
                Value::String(s) if s.is_empty() => *field = Value::Null,
                Value::String(s) => *field = Value::Array(vec![Value::String(std::mem::take(s))]),
                _ => {}
            }
        }
    }

    for path in OPTIONAL_OBJECTS {
        let Some((parent, key)) = path.rsplit_once('/') else {
            continue;
        };
        if let Some(object) = value.pointer_mut(parent).and_then(Value::as_object_mut) {
            if object.get(key).is_some_and(is_blank) {
                object.remove(key);
            }
        }
    }

    for path in NAME_FIELDS {
        if let Some(Value::String(name)) = value.pointer_mut(path) {
            if let Some(stripped) = name.strip_prefix('/') {
                *name = stripped.to_string();
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.values().all(is_blank),
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

/// Recover the single object from a one-element array envelope
///
/// A pretty-printed envelope has the brackets on their own first and last lines,
/// which are dropped. Anything shorter is parsed whole and unwrapped.
fn unwrap_envelope(stdout: &str) -> std::result::Result<Value, String> {
    let lines: Vec<&str> = stdout.trim().lines().collect();

    if lines.len() >= 3 && lines[0].trim() == "[" && lines[lines.len() - 1].trim() == "]" {
        let inner = lines[1..lines.len() - 1].join("\n");
        return serde_json::from_str(&inner).map_err(|e| format!("Invalid JSON: {e}"));
    }

    let value: Value =
        serde_json::from_str(stdout).map_err(|e| format!("Invalid JSON: {e}"))?;
    match value {
        Value::Array(mut items) if items.len() == 1 => Ok(items.remove(0)),
        Value::Array(items) if items.is_empty() => Err("Empty response".to_string()),
        Value::Array(items) => Err(format!("Expected a single object, found {}", items.len())),
        other => Ok(other),
    }
}

/// Decodes a single object, usually from `inspect` of one item
///
/// Decode failures yield a failed response with the default payload; the
/// payload is never partially populated.
#[derive(Debug, Clone, Copy)]
pub struct JsonEnvelopeParser<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonEnvelopeParser<T> {
    /// Create the parser
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonEnvelopeParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned + Default> ResponseParser for JsonEnvelopeParser<T> {
    type Output = T;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<T>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }
        if result.stdout.trim().is_empty() {
            return Ok(CommandResponse::failed(result.log_lines(), "Empty response"));
        }

        let decoded = unwrap_envelope(&result.stdout).and_then(|mut value| {
            normalize(&mut value);
            serde_json::from_value(value).map_err(|e| format!("Invalid JSON: {e}"))
        });

        Ok(match decoded {
            Ok(data) => CommandResponse::ok(result.log_lines(), data),
            Err(error) => {
                debug!("JSON envelope decode failed for {}: {}", result.command, error);
                CommandResponse::failed(result.log_lines(), error)
            }
        })
    }
}

/// Decodes a JSON array of zero or more objects
#[derive(Debug, Clone, Copy)]
pub struct JsonArrayParser<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonArrayParser<T> {
    /// Create the parser
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonArrayParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> ResponseParser for JsonArrayParser<T> {
    type Output = Vec<T>;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<Vec<T>>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }
        if result.stdout.trim().is_empty() {
            return Ok(CommandResponse::failed(result.log_lines(), "Empty response"));
        }

        let decoded = match serde_json::from_str::<Value>(&result.stdout) {
            Ok(Value::Array(mut items)) => {
                items.iter_mut().for_each(normalize);
                serde_json::from_value(Value::Array(items)).map_err(|e| format!("Invalid JSON: {e}"))
            }
            Ok(_) => Err("Expected a JSON array".to_string()),
            Err(e) => Err(format!("Invalid JSON: {e}")),
        };

        Ok(match decoded {
            Ok(data) => CommandResponse::ok(result.log_lines(), data),
            Err(error) => {
                debug!("JSON array decode failed for {}: {}", result.command, error);
                CommandResponse::failed(result.log_lines(), error)
            }
        })
    }
}
