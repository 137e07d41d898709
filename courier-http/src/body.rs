//! Endpoint request bodies.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BuildError;

/// How a body is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded,
    /// `text/plain`
    PlainText,
}

impl BodyEncoding {
    /// Content type implied by this encoding.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    KeyValue(Map<String, Value>),
    Raw(Bytes),
}

/// Request body attached to an [`Endpoint`](crate::Endpoint).
///
/// Key-value bodies pick up the configuration's default body parameters at
/// build time; raw bodies are sent as given.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    encoding: BodyEncoding,
    payload: Payload,
}

impl Body {
    /// Key-value body with the given encoding.
    pub fn key_values(encoding: BodyEncoding, values: Map<String, Value>) -> Self {
        Self {
            encoding,
            payload: Payload::KeyValue(values),
        }
    }

    /// Raw payload with the given encoding.
    pub fn raw(encoding: BodyEncoding, data: impl Into<Bytes>) -> Self {
        Self {
            encoding,
            payload: Payload::Raw(data.into()),
        }
    }

    /// JSON body from any serializable value.
    ///
    /// Objects become key-value bodies; other JSON values are sent raw.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self::key_values(BodyEncoding::Json, map)),
            other => Ok(Self::raw(BodyEncoding::Json, serde_json::to_vec(&other)?)),
        }
    }

    /// URL-encoded form body from key-value pairs.
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::key_values(BodyEncoding::FormUrlEncoded, values)
    }

    /// Plain text body.
    pub fn text(text: impl Into<String>) -> Self {
        Self::raw(BodyEncoding::PlainText, text.into().into_bytes())
    }

    /// Body encoding.
    pub fn encoding(&self) -> BodyEncoding {
        self.encoding
    }

    /// Serialize the body, merging `defaults` into key-value payloads.
    ///
    /// Keys already present in the body are never overridden.
    pub(crate) fn serialize(&self, defaults: &Map<String, Value>) -> Result<Bytes, BuildError> {
        let values = match &self.payload {
            Payload::Raw(data) => return Ok(data.clone()),
            Payload::KeyValue(values) => merge_defaults(values, defaults),
        };

        match self.encoding {
            BodyEncoding::Json => serde_json::to_vec(&values)
                .map(Bytes::from)
                .map_err(|e| BuildError::Body(e.to_string())),
            BodyEncoding::FormUrlEncoded | BodyEncoding::PlainText => {
                let pairs: Vec<(&str, String)> = values
                    .iter()
                    .map(|(k, v)| (k.as_str(), scalar_to_string(v)))
                    .collect();
                serde_urlencoded::to_string(pairs)
                    .map(Bytes::from)
                    .map_err(|e| BuildError::Body(e.to_string()))
            }
        }
    }
}

/// Merge default parameters under caller-supplied ones.
pub(crate) fn merge_defaults(
    values: &Map<String, Value>,
    defaults: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = values.clone();
    for (key, value) in defaults {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    merged
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
