//! Request body and response envelope.
//!
//! Transport stays with the caller; this module only builds the JSON body an
//! operation is sent as, and splits the `data` / `errors` envelope coming
//! back. Envelope faults are deserialized through `serde_path_to_error` so
//! the error names the exact path that broke.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::decode::decode_parsed;
use crate::error::{Error, Result};
use crate::value::{Value, Variables};

/// Build the `{"query": ..., "variables": ...}` request body. `variables` is
/// omitted when absent or empty.
pub fn build_request_body(query: &str, variables: Option<&Variables>) -> Json {
    let mut body = serde_json::Map::new();
    body.insert("query".to_owned(), Json::String(query.to_owned()));
    if let Some(vars) = variables.filter(|v| !v.is_empty()) {
        body.insert("variables".to_owned(), vars.to_json());
    }
    Json::Object(body)
}

/// One entry of a response's `errors` array.
///
/// Specification: <https://facebook.github.io/graphql/#sec-Errors>.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, Json>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub line: i32,
    pub column: i32,
}

impl GraphQLError {
    /// Error code from the extensions, or empty when not present.
    pub fn code(&self) -> &str {
        self.extensions
            .as_ref()
            .and_then(|e| e.get("code"))
            .and_then(Json::as_str)
            .unwrap_or_default()
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message: {}, Locations: {:?}", self.message, self.locations)
    }
}

pub type Errors = Vec<GraphQLError>;

/// A split response: `data` may be present alongside `errors` (partial
/// results are valid per the spec).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub data: Option<Json>,
    #[serde(default)]
    pub errors: Errors,
}

impl ResponseEnvelope {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Decode the `data` part into a shape. A missing or null `data` leaves
    /// `v` untouched.
    pub fn decode_data(&self, v: &mut Value) -> Result<()> {
        match &self.data {
            Some(data) if !data.is_null() => decode_parsed(data, v),
            _ => Ok(()),
        }
    }
}

/// Split a raw response body into `data` and `errors`.
pub fn parse_response(body: &[u8]) -> Result<ResponseEnvelope> {
    let de = &mut serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(de).map_err(|e| Error::Envelope {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}
