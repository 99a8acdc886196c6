//! RFC 7807 problem documents as the CA reports them.
//!
//! Every non-2xx ACME response carries a `application/problem+json` body
//! shaped by RFC 7807 and narrowed by RFC 8555 §6.7 to a fixed catalogue of
//! `urn:ietf:params:acme:error:*` types. [`Problem`] is the parsed form of
//! that body; [`crate::transport::Transport`] turns it into the matching
//! [`crate::error::AcmeError`] variant.

use serde::{Deserialize, Serialize};

/// `urn:ietf:params:acme:error:` — stripped from [`Problem::kind`] so
/// callers match on the short name (`badNonce`, `rateLimited`, ...) that
/// RFC 8555 §6.7 actually tabulates.
const ACME_ERROR_PREFIX: &str = "urn:ietf:params:acme:error:";

/// A single RFC 7807 problem document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    /// Short ACME error type with the `urn:ietf:params:acme:error:` prefix
    /// stripped (`"malformed"`, `"badNonce"`, `"rateLimited"`, ...). A type
    /// outside the ACME namespace is kept as the full URI.
    #[serde(rename = "type", default, deserialize_with = "strip_prefix")]
    pub kind: String,

    /// Human-readable summary, stable across occurrences of the same type.
    #[serde(default)]
    pub title: Option<String>,

    /// Human-readable explanation specific to this occurrence.
    #[serde(default)]
    pub detail: Option<String>,

    /// The HTTP status code the server sent alongside this document,
    /// repeated here per RFC 7807.
    #[serde(default)]
    pub status: Option<u16>,

    /// URI identifying this specific occurrence of the problem, e.g. a
    /// terms-of-service or rate-limit-documentation link.
    #[serde(default)]
    pub instance: Option<String>,

    /// Per-identifier sub-problems, used when a single request (e.g. a
    /// multi-identifier new-order) fails for more than one identifier at
    /// once.
    #[serde(default)]
    pub subproblems: Vec<Subproblem>,
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.title, &self.detail) {
            (Some(title), Some(detail)) => write!(f, "{title}: {detail}"),
            (Some(title), None) => write!(f, "{title}"),
            (None, Some(detail)) => write!(f, "{detail}"),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

impl Problem {
    /// `true` if this problem carries no `type` at all — some CAs send a
    /// bare `{"detail": "..."}` body without `type`; callers should treat
    /// that like `"urn:ietf:params:acme:error:malformed"` upstream, not here.
    pub fn is_untyped(&self) -> bool {
        self.kind.is_empty()
    }
}

/// A sub-problem nested under a [`Problem`], scoped to one identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subproblem {
    #[serde(rename = "type", default, deserialize_with = "strip_prefix")]
    pub kind: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub identifier: Option<crate::types::Identifier>,
}

fn strip_prefix<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .strip_prefix(ACME_ERROR_PREFIX)
        .map(str::to_string)
        .unwrap_or(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_acme_error_prefix() {
        let problem: Problem = serde_json::from_str(
            r#"{"type":"urn:ietf:params:acme:error:badNonce","detail":"stale nonce"}"#,
        )
        .unwrap();
        assert_eq!(problem.kind, "badNonce");
        assert_eq!(problem.detail.as_deref(), Some("stale nonce"));
    }

    #[test]
    fn keeps_non_acme_type_uris_intact() {
        let problem: Problem =
            serde_json::from_str(r#"{"type":"https://example.com/custom-error"}"#).unwrap();
        assert_eq!(problem.kind, "https://example.com/custom-error");
    }

    #[test]
    fn missing_type_is_untyped() {
        let problem: Problem = serde_json::from_str(r#"{"detail":"something broke"}"#).unwrap();
        assert!(problem.is_untyped());
    }

    #[test]
    fn display_prefers_title_and_detail() {
        let problem = Problem {
            kind: "malformed".into(),
            title: Some("Malformed request".into()),
            detail: Some("missing field 'csr'".into()),
            status: Some(400),
            instance: None,
            subproblems: Vec::new(),
        };
        assert_eq!(
            problem.to_string(),
            "Malformed request: missing field 'csr'"
        );
    }
}
