//! Flattened-JSON JWS construction for ACME requests.

use crate::crypto::signer::Signer;
use crate::jose::jwk::Jwk;
use crate::error::Result;
use base64::Engine;
use serde_json::{json, Value};

/// Which protected-header identity field to embed: `jwk` (bootstrap: new
/// account, key-change inner JWS, cert-key revocation) or `kid` (every
/// other authenticated request, once an account URL is known).
pub enum Identity<'a> {
    Jwk(&'a Jwk),
    Kid(&'a str),
}

/// A signed, flattened JWS ready to serialize as the request body.
pub struct SignedJws {
    protected: String,
    payload: String,
    signature: String,
}

impl SignedJws {
    pub fn into_value(self) -> Value {
        json!({
            "protected": self.protected,
            "payload": self.payload,
            "signature": self.signature,
        })
    }
}

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

/// Builds and signs a JWS. `nonce: None` omits the `nonce` header field,
/// used only for the key-change inner JWS (RFC 8555 §7.3.5), which is
/// never issued as a standalone request and so carries no anti-replay
/// nonce of its own.
pub fn sign(
    signer: &dyn Signer,
    url: &str,
    nonce: Option<&str>,
    identity: Identity<'_>,
    payload: &[u8],
) -> Result<SignedJws> {
    let mut header = serde_json::Map::new();
    header.insert("alg".to_string(), json!(signer.jwa_algorithm()));
    if let Some(nonce) = nonce {
        header.insert("nonce".to_string(), json!(nonce));
    }
    header.insert("url".to_string(), json!(url));
    match identity {
        Identity::Jwk(jwk) => {
            header.insert("jwk".to_string(), jwk.to_canonical_value());
        }
        Identity::Kid(kid) => {
            header.insert("kid".to_string(), json!(kid));
        }
    }

    let protected = b64(Value::Object(header).to_string().as_bytes());
    let payload_b64 = b64(payload);
    let signing_input = format!("{protected}.{payload_b64}");
    let signature = signer.sign(signing_input.as_bytes())?;

    Ok(SignedJws {
        protected,
        payload: payload_b64,
        signature: b64(&signature),
    })
}

/// The key authorization for a challenge token, per RFC 8555 §8.1:
/// `token + "." + base64url(SHA-256(canonical JWK(account key)))`.
pub fn key_authorization(token: &str, account_jwk: &Jwk) -> Result<String> {
    Ok(format!("{token}.{}", account_jwk.thumbprint_sha256()?))
}

/// Builds the nested JWS for `changeKey` (RFC 8555 §7.3.5): the inner JWS
/// is signed by the new key over `{account, oldKey}` with no nonce, and
/// the outer JWS is signed by the old key (`kid`) over the inner JWS.
pub fn sign_key_change(
    old_signer: &dyn Signer,
    new_signer: &dyn Signer,
    key_change_url: &str,
    nonce: &str,
    account_url: &str,
) -> Result<Value> {
    let new_jwk = new_signer.public_jwk();
    let old_jwk = old_signer.public_jwk();
    let inner_payload = json!({
        "account": account_url,
        "oldKey": old_jwk.to_canonical_value(),
    })
    .to_string();

    let inner = sign(
        new_signer,
        key_change_url,
        None,
        Identity::Jwk(&new_jwk),
        inner_payload.as_bytes(),
    )?;

    let outer_payload = inner.into_value().to_string();
    sign(
        old_signer,
        key_change_url,
        Some(nonce),
        Identity::Kid(account_url),
        outer_payload.as_bytes(),
    )
    .map(SignedJws::into_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signer::RingSigner;
    use ring::rand::SystemRandom;
    use ring::signature::{self, EcdsaKeyPair};

    fn p256_signer() -> RingSigner {
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(
            &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            &SystemRandom::new(),
        )
        .unwrap();
        RingSigner::from_pkcs8_ecdsa_p256(pkcs8.as_ref()).unwrap()
    }

    #[test]
    fn protected_header_has_exactly_alg_nonce_url_and_jwk() {
        let signer = p256_signer();
        let jwk = signer.public_jwk();
        let signed = sign(
            &signer,
            "https://example.com/acme/new-account",
            Some("nonce-1"),
            Identity::Jwk(&jwk),
            b"{}",
        )
        .unwrap();
        let protected_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&signed.protected)
            .unwrap();
        let header: Value = serde_json::from_slice(&protected_bytes).unwrap();
        let keys: std::collections::BTreeSet<_> =
            header.as_object().unwrap().keys().cloned().collect();
        let expected: std::collections::BTreeSet<_> =
            ["alg", "nonce", "url", "jwk"].into_iter().map(String::from).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn kid_requests_omit_jwk_and_carry_kid() {
        let signer = p256_signer();
        let signed = sign(
            &signer,
            "https://example.com/acme/order/7",
            Some("nonce-2"),
            Identity::Kid("https://example.com/acme/acct/1"),
            b"",
        )
        .unwrap();
        let protected_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&signed.protected)
            .unwrap();
        let header: Value = serde_json::from_slice(&protected_bytes).unwrap();
        assert!(header.get("kid").is_some());
        assert!(header.get("jwk").is_none());
        assert_eq!(signed.payload, "");
    }

    #[test]
    fn key_authorization_matches_rfc8555_formula() {
        let signer = p256_signer();
        let jwk = signer.public_jwk();
        let expected = format!("T.{}", jwk.thumbprint_sha256().unwrap());
        assert_eq!(key_authorization("T", &jwk).unwrap(), expected);
    }

    #[test]
    fn key_change_inner_jws_has_no_nonce() {
        let old = p256_signer();
        let new = p256_signer();
        let outer = sign_key_change(
            &old,
            &new,
            "https://example.com/acme/key-change",
            "nonce-3",
            "https://example.com/acme/acct/1",
        )
        .unwrap();
        let inner_payload_b64 = outer.get("payload").unwrap().as_str().unwrap();
        let inner_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(inner_payload_b64)
            .unwrap();
        let inner: Value = serde_json::from_slice(&inner_bytes).unwrap();
        let inner_protected_b64 = inner.get("protected").unwrap().as_str().unwrap();
        let inner_protected_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(inner_protected_b64)
            .unwrap();
        let inner_header: Value = serde_json::from_slice(&inner_protected_bytes).unwrap();
        assert!(inner_header.get("nonce").is_none());
        assert!(inner_header.get("jwk").is_some());
    }
}
