//! Response body parsing keyed on the declared content type.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::HttpError;

const BINARY_TYPES: [&str; 3] = [
    "application/octet-stream",
    "application/pdf",
    "application/zip",
];

/// Decoded response body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParsedBody {
    /// Structured JSON value.
    Json(Value),
    /// Text body.
    Text(String),
    /// Raw bytes (images, archives, unknown binary).
    Bytes(Vec<u8>),
    /// No content.
    #[default]
    Empty,
}

impl ParsedBody {
    /// Parse raw bytes according to `content_type`.
    ///
    /// JSON types decode to [`ParsedBody::Json`], `text/*` to text, images and
    /// known binary types to bytes. Anything else is tried as JSON, then as
    /// UTF-8 text, and kept as bytes as a last resort.
    pub fn parse(content_type: Option<&str>, body: Vec<u8>) -> Result<Self, HttpError> {
        if body.is_empty() {
            return Ok(Self::Empty);
        }
        let mime = content_type
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some(mime) if is_json(mime) => serde_json::from_slice(&body)
                .map(Self::Json)
                .map_err(HttpError::decode),
            Some(mime) if mime.starts_with("text/") => Ok(Self::Text(lossy_text(body))),
            Some(mime) if mime.starts_with("image/") || BINARY_TYPES.contains(&mime) => {
                Ok(Self::Bytes(body))
            }
            _ => Ok(best_effort(body)),
        }
    }

    /// Borrow the JSON value, if the body is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Decode the body into a typed value.
    ///
    /// Text bodies are parsed as JSON text; an empty body decodes from `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        match self {
            Self::Json(value) => T::deserialize(value).map_err(HttpError::decode),
            Self::Text(text) => serde_json::from_str(text).map_err(HttpError::decode),
            Self::Bytes(bytes) => serde_json::from_slice(bytes).map_err(HttpError::decode),
            Self::Empty => T::deserialize(&Value::Null).map_err(HttpError::decode),
        }
    }

    /// JSON view of the body for error payloads: text bodies become strings.
    pub(crate) fn into_error_payload(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(text) => Some(Value::String(text)),
            Self::Bytes(_) | Self::Empty => None,
        }
    }
}

fn is_json(mime: &str) -> bool {
    mime == "application/json" || mime.ends_with("+json")
}

fn lossy_text(body: Vec<u8>) -> String {
    match String::from_utf8(body) {
        Ok(text) => text,
        Err(error) => String::from_utf8_lossy(error.as_bytes()).into_owned(),
    }
}

fn best_effort(body: Vec<u8>) -> ParsedBody {
    if let Ok(value) = serde_json::from_slice::<Value>(&body) {
        return ParsedBody::Json(value);
    }
    match String::from_utf8(body) {
        Ok(text) => ParsedBody::Text(text),
        Err(error) => ParsedBody::Bytes(error.into_bytes()),
    }
}
