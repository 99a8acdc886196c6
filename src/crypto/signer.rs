//! Pluggable signing backend.
//!
//! The engine never hard-wires a crypto library: every signed request goes
//! through the [`Signer`] trait, and [`RingSigner`] is the default
//! implementation built on `ring`. Callers that need a key type `ring`
//! doesn't cover (P-521/ES512 today) can supply their own `Signer`.

use crate::error::{AcmeError, Result};
use crate::jose::jwk::Jwk;
use ring::rand::SystemRandom;
use ring::signature::{self, Ed25519KeyPair, EcdsaKeyPair, KeyPair as _, RsaKeyPair};

/// Produces the public JWK and raw signature bytes for one account or
/// certificate key. Implementors must be safe to share across concurrent
/// signing operations within a `Session`.
pub trait Signer: Send + Sync {
    /// Raw signature bytes (R||S for ECDSA, no DER wrapping) over `data`.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// The JWA algorithm identifier this signer produces, per RFC 8555 §4.2:
    /// `RS256`, `ES256`, `ES384`, `ES512`, or `EdDSA`.
    fn jwa_algorithm(&self) -> &'static str;

    /// The public key as a JWK, for embedding in the `jwk` protected header
    /// field or computing a thumbprint.
    fn public_jwk(&self) -> Jwk;
}

/// Default signer backed by `ring`. P-521 is intentionally absent: neither
/// `ring` nor this crate's other dependencies expose it, so ES512 is only
/// reachable by injecting a custom `Signer`.
pub enum RingSigner {
    EcdsaP256(EcdsaKeyPair),
    EcdsaP384(EcdsaKeyPair),
    Ed25519(Ed25519KeyPair),
    Rsa(RsaKeyPair),
}

impl RingSigner {
    pub fn from_pkcs8_ecdsa_p256(pkcs8: &[u8]) -> Result<Self> {
        let pair = EcdsaKeyPair::from_pkcs8(
            &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            pkcs8,
            &SystemRandom::new(),
        )
        .map_err(|e| AcmeError::crypto(format!("invalid P-256 key: {e}")))?;
        Ok(RingSigner::EcdsaP256(pair))
    }

    pub fn from_pkcs8_ecdsa_p384(pkcs8: &[u8]) -> Result<Self> {
        let pair = EcdsaKeyPair::from_pkcs8(
            &signature::ECDSA_P384_SHA384_FIXED_SIGNING,
            pkcs8,
            &SystemRandom::new(),
        )
        .map_err(|e| AcmeError::crypto(format!("invalid P-384 key: {e}")))?;
        Ok(RingSigner::EcdsaP384(pair))
    }

    pub fn from_pkcs8_ed25519(pkcs8: &[u8]) -> Result<Self> {
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8)
            .map_err(|e| AcmeError::crypto(format!("invalid Ed25519 key: {e}")))?;
        Ok(RingSigner::Ed25519(pair))
    }

    pub fn from_pkcs8_rsa(pkcs8: &[u8]) -> Result<Self> {
        let pair = RsaKeyPair::from_pkcs8(pkcs8)
            .map_err(|e| AcmeError::crypto(format!("invalid RSA key: {e}")))?;
        if pair.public().modulus_len() * 8 < 2048 {
            return Err(AcmeError::unsupported_key(
                "RSA keys below 2048 bits are not accepted",
            ));
        }
        Ok(RingSigner::Rsa(pair))
    }

    fn ec_public_key_point(pair: &EcdsaKeyPair) -> &[u8] {
        pair.public_key().as_ref()
    }
}

impl Signer for RingSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let rng = SystemRandom::new();
        match self {
            RingSigner::EcdsaP256(pair) | RingSigner::EcdsaP384(pair) => pair
                .sign(&rng, data)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|e| AcmeError::crypto(format!("ECDSA signing failed: {e}"))),
            RingSigner::Ed25519(pair) => Ok(pair.sign(data).as_ref().to_vec()),
            RingSigner::Rsa(pair) => {
                let mut sig = vec![0u8; pair.public().modulus_len()];
                pair.sign(&signature::RSA_PKCS1_SHA256, &rng, data, &mut sig)
                    .map_err(|e| AcmeError::crypto(format!("RSA signing failed: {e}")))?;
                Ok(sig)
            }
        }
    }

    fn jwa_algorithm(&self) -> &'static str {
        match self {
            RingSigner::EcdsaP256(_) => "ES256",
            RingSigner::EcdsaP384(_) => "ES384",
            RingSigner::Ed25519(_) => "EdDSA",
            RingSigner::Rsa(_) => "RS256",
        }
    }

    fn public_jwk(&self) -> Jwk {
        match self {
            RingSigner::EcdsaP256(pair) => {
                let (x, y) = split_ec_point(Self::ec_public_key_point(pair));
                Jwk::new_ec("P-256", x, y)
            }
            RingSigner::EcdsaP384(pair) => {
                let (x, y) = split_ec_point(Self::ec_public_key_point(pair));
                Jwk::new_ec("P-384", x, y)
            }
            RingSigner::Ed25519(pair) => {
                use base64::Engine;
                let x = base64::engine::general_purpose::URL_SAFE_NO_PAD
                    .encode(pair.public_key().as_ref());
                Jwk::new_okp("Ed25519", x)
            }
            RingSigner::Rsa(pair) => {
                let (n, e) = rsa_components(pair.public().as_ref());
                Jwk::new_rsa(n, e)
            }
        }
    }
}

/// Splits an uncompressed EC point (`0x04 || X || Y`) into base64url X/Y.
fn split_ec_point(point: &[u8]) -> (String, String) {
    use base64::Engine;
    debug_assert_eq!(point.first().copied(), Some(0x04));
    let coord_len = (point.len() - 1) / 2;
    let x = &point[1..1 + coord_len];
    let y = &point[1 + coord_len..];
    (
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(x),
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(y),
    )
}

/// Extracts (n, e) base64url from the DER `RSAPublicKey` (`SEQUENCE { n, e }`)
/// ring exposes via `RsaSubjectPublicKey::as_ref()`. Hand-rolled because
/// this shape is fixed (two unsigned INTEGERs) and pulling in a full ASN.1
/// crate for it would be pure overhead.
fn rsa_components(der: &[u8]) -> (String, String) {
    use base64::Engine;
    let (rest, n) = read_der_integer(der);
    let (_, e) = read_der_integer(rest);
    (
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(n),
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(e),
    )
}

/// Reads one DER `INTEGER` TLV starting at the first `0x02` tag found, and
/// returns (remainder-after-this-integer, unsigned-big-endian-bytes),
/// stripping a leading `0x00` sign-padding byte to match JWK's unsigned
/// big-endian `n`/`e` encoding.
fn read_der_integer(der: &[u8]) -> (&[u8], &[u8]) {
    let start = der.iter().position(|&b| b == 0x02).unwrap_or(der.len());
    let mut i = start + 1;
    let first_len_byte = der[i] as usize;
    let (len, header_len) = if first_len_byte & 0x80 == 0 {
        (first_len_byte, 1)
    } else {
        let n_bytes = first_len_byte & 0x7f;
        let mut len = 0usize;
        for b in &der[i + 1..i + 1 + n_bytes] {
            len = (len << 8) | (*b as usize);
        }
        (len, 1 + n_bytes)
    };
    i += header_len;
    let mut value = &der[i..i + len];
    while value.len() > 1 && value[0] == 0 {
        value = &value[1..];
    }
    (&der[i + len..], value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecdsa_p256_signs_and_reports_es256() {
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(
            &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            &SystemRandom::new(),
        )
        .unwrap();
        let signer = RingSigner::from_pkcs8_ecdsa_p256(pkcs8.as_ref()).unwrap();
        assert_eq!(signer.jwa_algorithm(), "ES256");
        let sig = signer.sign(b"signing input").unwrap();
        assert!(!sig.is_empty());
        let jwk = signer.public_jwk();
        assert_eq!(jwk.kty(), "EC");
    }

    #[test]
    fn ed25519_signs_and_reports_eddsa() {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).unwrap();
        let signer = RingSigner::from_pkcs8_ed25519(pkcs8.as_ref()).unwrap();
        assert_eq!(signer.jwa_algorithm(), "EdDSA");
        assert_eq!(signer.public_jwk().kty(), "OKP");
    }
}
