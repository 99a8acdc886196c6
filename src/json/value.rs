//! Immutable parsed-JSON tree with path-annotated typed accessors.

use crate::error::{AcmeError, Result};
use jiff::Timestamp;
use serde_json::Value as RawValue;

/// A parsed JSON document or sub-value, remembering the dotted path that
/// led to it so accessor failures can name exactly which field was wrong.
#[derive(Debug, Clone)]
pub struct Json {
    path: String,
    raw: RawValue,
}

impl Json {
    /// Parse a top-level document. The root path is `"$"`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw: RawValue = serde_json::from_slice(bytes)
            .map_err(|e| AcmeError::protocol("$", format!("invalid JSON: {e}")))?;
        Ok(Self {
            path: "$".to_string(),
            raw,
        })
    }

    /// Wrap an already-parsed value, e.g. one built by [`super::JsonBuilder`]
    /// or returned from another accessor.
    pub fn from_value(path: impl Into<String>, raw: RawValue) -> Self {
        Self {
            path: path.into(),
            raw,
        }
    }

    /// The dotted path of this node, for inclusion in error messages.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The underlying `serde_json::Value`, for callers that need to
    /// serialize it back out (e.g. into a JWS payload).
    pub fn into_raw(self) -> RawValue {
        self.raw
    }

    pub fn as_raw(&self) -> &RawValue {
        &self.raw
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.raw.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.raw
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn child(&self, key: &str) -> Option<Json> {
        self.raw.get(key).map(|v| Json {
            path: format!("{}.{}", self.path, key),
            raw: v.clone(),
        })
    }

    fn fail(&self, key: &str, want: &str) -> AcmeError {
        AcmeError::protocol(format!("{}.{}", self.path, key), format!("expected {want}"))
    }

    /// Optional string field.
    pub fn string(&self, key: &str) -> Result<Option<String>> {
        match self.child(key) {
            None => Ok(None),
            Some(v) => v
                .raw
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.fail(key, "string")),
        }
    }

    /// Mandatory string field.
    pub fn required_string(&self, key: &str) -> Result<String> {
        self.string(key)?
            .ok_or_else(|| AcmeError::protocol(format!("{}.{}", self.path, key), "missing"))
    }

    /// Optional integer field.
    pub fn integer(&self, key: &str) -> Result<Option<i64>> {
        match self.child(key) {
            None => Ok(None),
            Some(v) => v.raw.as_i64().map(Some).ok_or_else(|| self.fail(key, "integer")),
        }
    }

    pub fn required_integer(&self, key: &str) -> Result<i64> {
        self.integer(key)?
            .ok_or_else(|| AcmeError::protocol(format!("{}.{}", self.path, key), "missing"))
    }

    /// Optional boolean field.
    pub fn boolean(&self, key: &str) -> Result<Option<bool>> {
        match self.child(key) {
            None => Ok(None),
            Some(v) => v.raw.as_bool().map(Some).ok_or_else(|| self.fail(key, "boolean")),
        }
    }

    /// String field parsed as a URL (only syntactic validation: non-empty).
    pub fn url(&self, key: &str) -> Result<Option<String>> {
        self.string(key)
    }

    pub fn required_url(&self, key: &str) -> Result<String> {
        self.required_string(key)
    }

    /// String field parsed as an RFC 3339 instant.
    pub fn instant(&self, key: &str) -> Result<Option<Timestamp>> {
        match self.string(key)? {
            None => Ok(None),
            Some(s) => s
                .parse::<Timestamp>()
                .map(Some)
                .map_err(|e| self.fail(key, &format!("RFC 3339 timestamp ({e})"))),
        }
    }

    pub fn required_instant(&self, key: &str) -> Result<Timestamp> {
        self.instant(key)?
            .ok_or_else(|| AcmeError::protocol(format!("{}.{}", self.path, key), "missing"))
    }

    /// Base64url-encoded binary field.
    pub fn binary_base64url(&self, key: &str) -> Result<Option<Vec<u8>>> {
        use base64::Engine;
        match self.string(key)? {
            None => Ok(None),
            Some(s) => base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(s.as_bytes())
                .map(Some)
                .map_err(|e| self.fail(key, &format!("base64url ({e})"))),
        }
    }

    /// Nested object field.
    pub fn object(&self, key: &str) -> Result<Option<Json>> {
        match self.child(key) {
            None => Ok(None),
            Some(v) if v.raw.is_object() => Ok(Some(v)),
            Some(_) => Err(self.fail(key, "object")),
        }
    }

    pub fn required_object(&self, key: &str) -> Result<Json> {
        self.object(key)?
            .ok_or_else(|| AcmeError::protocol(format!("{}.{}", self.path, key), "missing"))
    }

    /// Array field, returned as a `Json` node per element.
    pub fn array(&self, key: &str) -> Result<Vec<Json>> {
        match self.child(key) {
            None => Ok(Vec::new()),
            Some(v) => {
                let elems = v.raw.as_array().ok_or_else(|| self.fail(key, "array"))?;
                Ok(elems
                    .iter()
                    .enumerate()
                    .map(|(i, e)| Json {
                        path: format!("{}.{}[{}]", self.path, key, i),
                        raw: e.clone(),
                    })
                    .collect())
            }
        }
    }

    /// Array-of-strings convenience accessor (e.g. `contact`, `caaIdentities`).
    pub fn string_array(&self, key: &str) -> Result<Vec<String>> {
        self.array(key)?
            .into_iter()
            .map(|elem| {
                elem.raw
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AcmeError::protocol(elem.path.clone(), "expected string"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_is_none() {
        let json = Json::parse(br#"{"a":1}"#).unwrap();
        assert_eq!(json.string("b").unwrap(), None);
    }

    #[test]
    fn required_missing_names_path() {
        let json = Json::parse(br#"{"a":1}"#).unwrap();
        let err = json.required_string("b").unwrap_err();
        assert!(err.to_string().contains("$.b"));
    }

    #[test]
    fn wrong_type_names_path_and_expectation() {
        let json = Json::parse(br#"{"a":"not a number"}"#).unwrap();
        let err = json.integer("a").unwrap_err();
        assert!(err.to_string().contains("$.a"));
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn nested_object_path_is_dotted() {
        let json = Json::parse(br#"{"meta":{"website":"https://example.com"}}"#).unwrap();
        let meta = json.required_object("meta").unwrap();
        assert_eq!(meta.path(), "$.meta");
        assert_eq!(
            meta.string("website").unwrap(),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn base64url_roundtrip() {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"hello");
        let json = Json::parse(format!(r#"{{"csr":"{encoded}"}}"#).as_bytes()).unwrap();
        assert_eq!(json.binary_base64url("csr").unwrap(), Some(b"hello".to_vec()));
    }
}
