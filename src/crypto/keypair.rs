//! Key generation and PEM import, wrapping the chosen key in a [`Signer`].

use crate::crypto::signer::{RingSigner, Signer};
use crate::error::{AcmeError, Result};
use crate::jose::jwk::Jwk;
use ring::rand::SystemRandom;
use ring::signature::{self, Ed25519KeyPair, EcdsaKeyPair};
use std::sync::Arc;

/// The key types this engine can produce a `Signer` for. `EcdsaP521`
/// appears in the enum because the wire format recognizes it (see
/// `algorithm_for`), but construction always fails: see
/// `DESIGN.md`'s Open Questions for why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Ed25519,
    EcdsaP256,
    EcdsaP384,
    EcdsaP521,
    Rsa2048,
    Rsa4096,
}

impl KeyType {
    pub fn jwa_algorithm(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "EdDSA",
            KeyType::EcdsaP256 => "ES256",
            KeyType::EcdsaP384 => "ES384",
            KeyType::EcdsaP521 => "ES512",
            KeyType::Rsa2048 | KeyType::Rsa4096 => "RS256",
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            KeyType::Ed25519 => "Ed25519",
            KeyType::EcdsaP256 => "ECDSA-P256",
            KeyType::EcdsaP384 => "ECDSA-P384",
            KeyType::EcdsaP521 => "ECDSA-P521",
            KeyType::Rsa2048 => "RSA-2048",
            KeyType::Rsa4096 => "RSA-4096",
        };
        write!(f, "{label}")
    }
}

/// An account or certificate key pair: PKCS8 bytes plus the `Signer` built
/// from them. The PKCS8 document is retained only so the key can be
/// serialized back to PEM for the caller to persist; the core itself never
/// writes it to disk.
pub struct KeyPair {
    key_type: KeyType,
    pkcs8: Vec<u8>,
    signer: Arc<dyn Signer>,
}

impl KeyPair {
    fn new(key_type: KeyType, pkcs8: Vec<u8>, signer: Arc<dyn Signer>) -> Self {
        Self {
            key_type,
            pkcs8,
            signer,
        }
    }

    pub fn generate(key_type: KeyType) -> Result<Self> {
        let rng = SystemRandom::new();
        match key_type {
            KeyType::EcdsaP256 => {
                let pkcs8 =
                    EcdsaKeyPair::generate_pkcs8(&signature::ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
                        .map_err(|e| AcmeError::crypto(format!("key generation failed: {e}")))?;
                let signer = RingSigner::from_pkcs8_ecdsa_p256(pkcs8.as_ref())?;
                Ok(Self::new(key_type, pkcs8.as_ref().to_vec(), Arc::new(signer)))
            }
            KeyType::EcdsaP384 => {
                let pkcs8 =
                    EcdsaKeyPair::generate_pkcs8(&signature::ECDSA_P384_SHA384_FIXED_SIGNING, &rng)
                        .map_err(|e| AcmeError::crypto(format!("key generation failed: {e}")))?;
                let signer = RingSigner::from_pkcs8_ecdsa_p384(pkcs8.as_ref())?;
                Ok(Self::new(key_type, pkcs8.as_ref().to_vec(), Arc::new(signer)))
            }
            KeyType::Ed25519 => {
                let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
                    .map_err(|e| AcmeError::crypto(format!("key generation failed: {e}")))?;
                let signer = RingSigner::from_pkcs8_ed25519(pkcs8.as_ref())?;
                Ok(Self::new(key_type, pkcs8.as_ref().to_vec(), Arc::new(signer)))
            }
            KeyType::EcdsaP521 => Err(AcmeError::unsupported_key(
                "P-521/ES512 requires injecting a custom Signer; ring does not support it",
            )),
            KeyType::Rsa2048 | KeyType::Rsa4096 => Err(AcmeError::not_supported(
                "RSA key generation is not supported; import an existing key with from_pkcs8_pem",
            )),
        }
    }

    /// Imports a PKCS8-encoded private key (PEM, any of the supported
    /// types). RSA keys can only be used this way since `ring` cannot
    /// generate them.
    pub fn from_pkcs8_pem(key_type: KeyType, pem_text: &str) -> Result<Self> {
        let parsed = pem::parse(pem_text)
            .map_err(|e| AcmeError::crypto(format!("invalid PEM: {e}")))?;
        let der = parsed.contents().to_vec();
        let signer: Arc<dyn Signer> = match key_type {
            KeyType::EcdsaP256 => Arc::new(RingSigner::from_pkcs8_ecdsa_p256(&der)?),
            KeyType::EcdsaP384 => Arc::new(RingSigner::from_pkcs8_ecdsa_p384(&der)?),
            KeyType::Ed25519 => Arc::new(RingSigner::from_pkcs8_ed25519(&der)?),
            KeyType::Rsa2048 | KeyType::Rsa4096 => Arc::new(RingSigner::from_pkcs8_rsa(&der)?),
            KeyType::EcdsaP521 => {
                return Err(AcmeError::unsupported_key(
                    "P-521/ES512 requires injecting a custom Signer",
                ));
            }
        };
        Ok(Self::new(key_type, der, signer))
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn signer(&self) -> Arc<dyn Signer> {
        self.signer.clone()
    }

    pub fn public_jwk(&self) -> Jwk {
        self.signer.public_jwk()
    }

    /// PKCS8 private key, PEM-encoded, for the caller to persist. The core
    /// does not write key material to disk itself.
    pub fn to_pkcs8_pem(&self) -> String {
        let block = pem::Pem::new("PRIVATE KEY", self.pkcs8.clone());
        pem::encode(&block)
    }
}
