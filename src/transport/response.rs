//! The parsed shape of an ACME HTTP response: status, the headers
//! resources care about, and the decoded body.

use super::headers;
use crate::json::Json;
use crate::problem::Problem;
use jiff::Timestamp;
use std::collections::HashMap;
use std::time::Duration;

/// Which `Accept` header (and therefore which body decoding) a request
/// expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Json,
    PemCertificateChain,
}

impl Accept {
    pub fn header_value(self) -> &'static str {
        match self {
            Accept::Json => "application/json",
            Accept::PemCertificateChain => "application/pem-certificate-chain",
        }
    }
}

pub struct RawResponse {
    pub status: reqwest::StatusCode,
    pub location: Option<String>,
    pub links: HashMap<String, Vec<String>>,
    pub retry_after: Option<Duration>,
    pub last_modified: Option<String>,
    pub expires: Option<String>,
    pub replay_nonce: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub(super) async fn from_reqwest(response: reqwest::Response) -> crate::error::Result<Self> {
        let status = response.status();
        let headers_map = response.headers().clone();
        let location = header_string(&headers_map, "location");
        let link_values = headers_map
            .get_all("link")
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect::<Vec<_>>();
        let links = headers::parse_links(&link_values);
        let retry_after = header_string(&headers_map, "retry-after")
            .and_then(|v| headers::parse_retry_after(&v, Timestamp::now()));
        let last_modified = header_string(&headers_map, "last-modified");
        let expires = header_string(&headers_map, "expires");
        let replay_nonce = header_string(&headers_map, "replay-nonce");
        let content_type = header_string(&headers_map, "content-type");
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            location,
            links,
            retry_after,
            last_modified,
            expires,
            replay_nonce,
            content_type,
            body,
        })
    }

    /// Parses the body as JSON, if it is one.
    pub fn json(&self) -> crate::error::Result<Json> {
        Json::parse(&self.body)
    }

    /// Attempts to parse the body as an RFC 7807 problem document,
    /// regardless of declared content type — some CAs mislabel it as
    /// `application/json`.
    pub fn parse_problem(&self) -> Option<Problem> {
        serde_json::from_slice(&self.body).ok()
    }

    /// The PEM-encoded body as text, for certificate chain downloads.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn header_string(headers: &reqwest::header::HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}
