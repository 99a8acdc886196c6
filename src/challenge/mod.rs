//! Per-challenge-type response material (RFC 8555 §8, RFC 8737's
//! `tls-alpn-01`). Pure computation only — no HTTP server, DNS updater, or
//! other responder: presenting the computed material where the validation
//! server can see it is the caller's job.

use crate::error::Result;
use crate::jose::jws;
use crate::jose::jwk::Jwk;
use base64::Engine;
use sha2::{Digest, Sha256};

/// The key authorization for a challenge token (RFC 8555 §8.1):
/// `token + "." + base64url(SHA-256(canonical JWK))`. Used verbatim as the
/// `http-01` response body.
pub fn key_authorization(token: &str, account_jwk: &Jwk) -> Result<String> {
    jws::key_authorization(token, account_jwk)
}

/// `http-01`: the file served at
/// `http://<domain>/.well-known/acme-challenge/<token>`, content type
/// `application/octet-stream`, no trailing whitespace.
pub fn http01_well_known_path(token: &str) -> String {
    format!(".well-known/acme-challenge/{token}")
}

/// `dns-01`: the TXT record value at `_acme-challenge.<domain>.`:
/// `base64url(SHA-256(key authorization))`.
pub fn dns01_txt_value(key_authorization: &str) -> String {
    let digest = Sha256::digest(key_authorization.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// `tls-alpn-01` (RFC 8737 §3): the raw SHA-256 digest to embed as the
/// `acmeValidation` (OID 1.3.6.1.5.5.7.1.31) certificate extension content,
/// DER-encoded as an `OCTET STRING`.
pub fn tls_alpn01_digest(key_authorization: &str) -> [u8; 32] {
    Sha256::digest(key_authorization.as_bytes()).into()
}

/// DER encoding of the `acmeValidation` extension's `OCTET STRING` value,
/// ready to embed in a self-signed certificate's extension list.
pub fn tls_alpn01_extension_value(key_authorization: &str) -> Vec<u8> {
    let digest = tls_alpn01_digest(key_authorization);
    let mut der = vec![0x04, digest.len() as u8];
    der.extend_from_slice(&digest);
    der
}

/// OID for the `id-pe-acmeIdentifier` certificate extension (RFC 8737 §3).
pub const TLS_ALPN01_EXTENSION_OID: &str = "1.3.6.1.5.5.7.1.31";

/// ALPN protocol identifier for `tls-alpn-01` validation connections.
pub const TLS_ALPN01_PROTOCOL: &str = "acme-tls/1";
