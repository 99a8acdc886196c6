/// Certificate chain parsing and inspection.
use crate::error::Result;
use pem::parse_many;
use x509_parser::asn1_rs::FromDer;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::ParsedExtension;

/// Certificate chain structure
#[derive(Debug, Clone)]
pub struct CertificateChain {
    /// The leaf certificate (first in chain)
    pub leaf: Vec<u8>,
    /// Intermediate certificates
    pub intermediates: Vec<Vec<u8>>,
    /// Root certificate (optional, usually not sent in TLS handshake)
    pub root: Option<Vec<u8>>,
}

impl CertificateChain {
    /// Create a new certificate chain from a list of PEM-encoded certificates
    pub fn from_pem(pem_data: &[u8]) -> Result<Self> {
        let mut certs = Vec::new();

        // Parse PEM
        for p in parse_many(pem_data)
            .map_err(|e| crate::error::AcmeError::crypto(format!("Failed to parse PEM: {}", e)))?
        {
            if p.tag() == "CERTIFICATE" {
                certs.push(p.contents().to_vec());
            }
        }

        if certs.is_empty() {
            return Err(crate::error::AcmeError::crypto(
                "No certificates found in PEM data",
            ));
        }

        let leaf = certs.remove(0);
        let intermediates = certs;

        Ok(Self {
            leaf,
            intermediates,
            root: None,
        })
    }

    /// The ARI certificate identifier (draft-ietf-acme-ari §4.1):
    /// `base64url(Authority Key Identifier) + "." + base64url(serial)`.
    pub fn ari_certificate_id(&self) -> Result<String> {
        use base64::Engine;
        let (_, cert) = X509Certificate::from_der(&self.leaf).map_err(|e| {
            crate::error::AcmeError::certificate(format!("invalid leaf certificate: {e}"))
        })?;

        let aki = cert
            .extensions()
            .iter()
            .find_map(|ext| match ext.parsed_extension() {
                ParsedExtension::AuthorityKeyIdentifier(aki) => {
                    aki.key_identifier.as_ref().map(|kid| kid.0.to_vec())
                }
                _ => None,
            })
            .ok_or_else(|| {
                crate::error::AcmeError::certificate("leaf certificate has no Authority Key Identifier extension")
            })?;
        let serial = cert.raw_serial();

        Ok(format!(
            "{}.{}",
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(aki),
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(serial),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::CertificateParams;

    #[test]
    fn from_pem_splits_leaf_from_intermediates() {
        let params = CertificateParams::new(vec!["example.com".to_string()]).unwrap();
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        let pem = cert.pem();

        let chain = CertificateChain::from_pem(pem.as_bytes()).unwrap();
        assert!(!chain.leaf.is_empty());
        assert!(chain.intermediates.is_empty());
    }

    #[test]
    fn from_pem_rejects_empty_input() {
        assert!(CertificateChain::from_pem(b"").is_err());
    }
}
