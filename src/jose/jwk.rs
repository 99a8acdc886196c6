//! JSON Web Key representation, restricted to the three key shapes ACME
//! actually uses (EC, RSA, OKP/Ed25519), with RFC 7638 thumbprinting.

use crate::error::Result;
use base64::Engine;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// A public key in its RFC 7638 "required members only" shape. Each
/// variant carries exactly the fields the thumbprint algorithm hashes —
/// nothing optional (`use`, `key_ops`, `alg`) is represented here, since
/// those members must be excluded from the canonical form anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Jwk {
    Ec { crv: String, x: String, y: String },
    Rsa { n: String, e: String },
    Okp { crv: String, x: String },
}

impl Jwk {
    pub fn new_ec(crv: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Jwk::Ec {
            crv: crv.into(),
            x: x.into(),
            y: y.into(),
        }
    }

    pub fn new_rsa(n: impl Into<String>, e: impl Into<String>) -> Self {
        Jwk::Rsa {
            n: n.into(),
            e: e.into(),
        }
    }

    pub fn new_okp(crv: impl Into<String>, x: impl Into<String>) -> Self {
        Jwk::Okp {
            crv: crv.into(),
            x: x.into(),
        }
    }

    pub fn kty(&self) -> &'static str {
        match self {
            Jwk::Ec { .. } => "EC",
            Jwk::Rsa { .. } => "RSA",
            Jwk::Okp { .. } => "OKP",
        }
    }

    /// The canonical JSON form used both as the `jwk` protected-header
    /// value and as the thumbprint hash input. `serde_json`'s `Map` (no
    /// `preserve_order` feature) is `BTreeMap`-backed, so this is always
    /// lexicographically ordered by key regardless of the order the
    /// `json!` literal below lists them in — which is what makes the
    /// thumbprint reproducible.
    pub fn to_canonical_value(&self) -> Value {
        match self {
            Jwk::Ec { crv, x, y } => json!({"crv": crv, "kty": "EC", "x": x, "y": y}),
            Jwk::Rsa { n, e } => json!({"e": e, "kty": "RSA", "n": n}),
            Jwk::Okp { crv, x } => json!({"crv": crv, "kty": "OKP", "x": x}),
        }
    }

    /// RFC 7638 SHA-256 thumbprint, base64url-encoded.
    pub fn thumbprint_sha256(&self) -> Result<String> {
        let canonical = self.to_canonical_value().to_string();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_value_is_lexicographic_for_ec() {
        let jwk = Jwk::new_ec("P-256", "xval", "yval");
        let s = jwk.to_canonical_value().to_string();
        let crv = s.find("\"crv\"").unwrap();
        let kty = s.find("\"kty\"").unwrap();
        let x = s.find("\"x\"").unwrap();
        let y = s.find("\"y\"").unwrap();
        assert!(crv < kty && kty < x && x < y);
    }

    #[test]
    fn thumbprint_is_stable_and_insensitive_to_construction_order() {
        let a = Jwk::new_ec("P-256", "xval", "yval");
        let b = a.clone();
        assert_eq!(a.thumbprint_sha256().unwrap(), b.thumbprint_sha256().unwrap());
    }

    #[test]
    fn rfc7638_ed25519_example_thumbprint() {
        // RFC 8037 Appendix A.3 example key.
        let jwk = Jwk::new_okp("Ed25519", "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo");
        let thumbprint = jwk.thumbprint_sha256().unwrap();
        assert_eq!(thumbprint, "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k");
    }
}
