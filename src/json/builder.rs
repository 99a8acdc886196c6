//! Canonical JSON construction for signed payloads and JWK embedding.

use serde_json::{Map, Value};

/// Mutable, insertion-ordered map that serializes to canonical JSON.
///
/// `serde_json`'s default `Map` (no `preserve_order` feature) is itself
/// `BTreeMap`-backed, so any value built through this type or through
/// `serde_json::json!` already serializes with lexicographically ordered
/// keys — which is exactly what RFC 7638 thumbprints and `put_key` rely on.
#[derive(Debug, Clone, Default)]
pub struct JsonBuilder {
    fields: Map<String, Value>,
}

impl JsonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn put_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(key, Value::String(value.into()))
    }

    pub fn put_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.put(key, Value::Bool(value))
    }

    pub fn put_opt<T: Into<Value>>(self, key: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.put(key, v),
            None => self,
        }
    }

    /// Inserts the fixed `resource` field ACME draft pre-8555 endpoints and
    /// some legacy providers still expect alongside the standard payload.
    pub fn put_resource(self, name: impl Into<String>) -> Self {
        self.put_string("resource", name)
    }

    /// Base64url-encodes `bytes` and inserts it under `key`.
    pub fn put_base64(self, key: impl Into<String>, bytes: &[u8]) -> Self {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        self.put_string(key, encoded)
    }

    /// Embeds a public key as a JWK sub-object under `key`, with the JWK's
    /// own members in lexicographic order (required for thumbprint
    /// reproducibility; see [`crate::jose::jwk::Jwk::to_canonical_value`]).
    pub fn put_key(self, key: impl Into<String>, public_key: &crate::jose::jwk::Jwk) -> Self {
        self.put(key, public_key.to_canonical_value())
    }

    pub fn put_array(self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.put(key, Value::Array(values))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    /// Serializes to the exact bytes that go on the wire / get hashed.
    /// `serde_json::Value::to_string` on a `Map` without `preserve_order`
    /// already emits keys in their `BTreeMap` (lexicographic) order.
    pub fn to_canonical_string(self) -> String {
        self.build().to_string()
    }
}
