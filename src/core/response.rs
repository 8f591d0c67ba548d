//! Engine replies and the tagged query result built from them

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::error::{Error, Result};

/// Status the engine attached to a reply
///
/// The set is closed: anything the engine may add later lands in
/// `Unrecognized` and is rejected by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
    /// Transport-level status outside the engine contract (e.g. HTTP 503)
    Unrecognized(u16),
}

impl Status {
    /// Classify an HTTP exchange with the engine
    pub fn from_http(status: u16, body: &Value) -> Self {
        match status {
            200 if body.get("code").and_then(Value::as_str) == Some("Ok") => Status::Ok,
            200 | 400..=499 => Status::Error,
            other => Status::Unrecognized(other),
        }
    }
}

/// Raw reply of one engine call
#[derive(Debug, Clone, PartialEq)]
pub struct EngineReply {
    pub status: Status,
    pub body: Value,
}

impl EngineReply {
    pub fn new(status: Status, body: Value) -> Self {
        Self { status, body }
    }
}

/// A successful engine result, passed through untouched
#[derive(Debug, Clone, PartialEq)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Wrap a JSON value; the engine always answers with an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse rendered document text
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Top-level field names
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The engine's own status code, `"Ok"` for a success
    pub fn code(&self) -> Option<&str> {
        self.get("code").and_then(Value::as_str)
    }

    /// Compact JSON text
    pub fn render(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn render_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Outcome of a query: the engine's document, or its error code and message
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Success(Document),
    Failure { code: String, message: String },
}

impl QueryResult {
    /// Interpret an engine reply
    ///
    /// An `Error` reply must carry string `code` and `message` fields.
    pub fn from_reply(reply: EngineReply) -> Result<Self> {
        match reply.status {
            Status::Ok => Ok(QueryResult::Success(Document::from_value(reply.body)?)),
            Status::Error => {
                let EngineFailure { code, message } = serde_json::from_value(reply.body)
                    .map_err(|e| Error::MalformedResponse(format!("error reply: {e}")))?;
                Ok(QueryResult::Failure { code, message })
            }
            Status::Unrecognized(status) => Err(Error::UnclassifiedStatus { status }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            QueryResult::Success(document) => Some(document),
            QueryResult::Failure { .. } => None,
        }
    }

    /// Rendered document on success, bare engine message on failure
    ///
    /// This is the shape older callers of the module-level host functions
    /// depend on.
    pub fn into_legacy_text(self) -> String {
        match self {
            QueryResult::Success(document) => document.render(),
            QueryResult::Failure { message, .. } => message,
        }
    }
}

/// Body of an engine error reply; other fields are ignored
#[derive(Debug, Deserialize)]
struct EngineFailure {
    code: String,
    message: String,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
