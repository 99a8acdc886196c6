//! Certificate resource (RFC 8555 §7.4.2): chain download, alternate
//! chains, revocation, and ARI renewal-window lookup.

pub mod chain;

pub use chain::CertificateChain;

use crate::crypto::signer::Signer;
use crate::error::{AcmeError, Result};
use crate::jose::jws::Identity;
use crate::json::{Json, JsonBuilder};
use crate::login::Login;
use crate::session::Session;
use crate::transport::Accept;
use crate::types::RevocationReason;
use jiff::Timestamp;
use std::sync::Arc;

/// A certificate resource reachable from a valid order's `certificate`
/// URL. Downloading is lazy — constructing one touches no network.
pub struct Certificate {
    login: Arc<Login>,
    url: String,
    chain: Option<CertificateChain>,
    alternates: Vec<String>,
}

impl Certificate {
    pub(crate) fn new(login: Arc<Login>, url: String) -> Self {
        Self {
            login,
            url,
            chain: None,
            alternates: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn chain(&self) -> Option<&CertificateChain> {
        self.chain.as_ref()
    }

    /// Alternate certificate chains advertised via `Link: rel="alternate"`
    /// on the download response (RFC 8555 §7.4.2). Populated only after
    /// [`Certificate::download`].
    pub fn alternate_urls(&self) -> &[String] {
        &self.alternates
    }

    /// Downloads the PEM certificate chain via signed POST-as-GET.
    pub async fn download(&mut self) -> Result<&CertificateChain> {
        let raw = self
            .login
            .signed_post_as_get(&self.url, Accept::PemCertificateChain)
            .await?;
        let chain = CertificateChain::from_pem(&raw.body)?;
        self.alternates = raw.links.get("alternate").cloned().unwrap_or_default();
        self.chain = Some(chain);
        Ok(self.chain.as_ref().expect("just assigned"))
    }

    /// Downloads an alternate chain referenced from another certificate's
    /// `alternate_urls`.
    pub async fn download_alternate(login: Arc<Login>, url: String) -> Result<Certificate> {
        let mut cert = Certificate::new(login, url);
        cert.download().await?;
        Ok(cert)
    }

    /// Revokes using the account key bound to this certificate's login
    /// (`kid`), per RFC 8555 §7.6. Call [`Certificate::download`] first.
    pub async fn revoke(&self, reason: Option<RevocationReason>) -> Result<()> {
        let chain = self
            .chain
            .as_ref()
            .ok_or_else(|| AcmeError::invalid_input("call download() before revoke()"))?;
        let directory = self.login.session().metadata().await?;
        let payload = JsonBuilder::new()
            .put_base64("certificate", &chain.leaf)
            .put_opt("reason", reason.map(|r| r.as_u8() as i64))
            .build();
        self.login.signed_post(&directory.revoke_cert, &payload, Accept::Json).await?;
        Ok(())
    }

    /// Revokes using the certificate's own key pair rather than an account
    /// key (RFC 8555 §7.6 permits either), e.g. after losing access to the
    /// account that requested the certificate.
    pub async fn revoke_with_certificate_key(
        session: Arc<Session>,
        cert_signer: Arc<dyn Signer>,
        leaf_der: &[u8],
        reason: Option<RevocationReason>,
    ) -> Result<()> {
        let directory = session.metadata().await?;
        let payload = JsonBuilder::new()
            .put_base64("certificate", leaf_der)
            .put_opt("reason", reason.map(|r| r.as_u8() as i64))
            .build();
        let jwk = cert_signer.public_jwk();
        session
            .signed_post(&directory.revoke_cert, &payload, cert_signer.as_ref(), Identity::Jwk(&jwk), Accept::Json)
            .await?;
        Ok(())
    }

    /// ARI `getRenewalInfo` (draft-ietf-acme-ari §4.2). Call
    /// [`Certificate::download`] first to have a leaf certificate to derive
    /// the certificate ID from.
    pub async fn get_renewal_info(&self) -> Result<RenewalInfo> {
        let chain = self
            .chain
            .as_ref()
            .ok_or_else(|| AcmeError::invalid_input("call download() before get_renewal_info()"))?;
        let directory = self.login.session().metadata().await?;
        let base = directory
            .renewal_info
            .clone()
            .ok_or_else(|| AcmeError::not_supported("server does not advertise renewalInfo"))?;
        let cert_id = chain.ari_certificate_id()?;
        let url = format!("{}/{}", base.trim_end_matches('/'), cert_id);
        let raw = self.login.session().unsigned_get(&url).await?;
        let json = raw.json()?;
        RenewalInfo::from_json(&json)
    }
}

/// A CA-suggested renewal window (draft-ietf-acme-ari §4.2).
#[derive(Debug, Clone)]
pub struct RenewalWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Clone)]
pub struct RenewalInfo {
    pub suggested_window: RenewalWindow,
    pub explanation_url: Option<String>,
}

impl RenewalInfo {
    fn from_json(json: &Json) -> Result<Self> {
        let window = json.required_object("suggestedWindow")?;
        let start = window.required_instant("start")?;
        let end = window.required_instant("end")?;
        let explanation_url = json.string("explanationURL")?;
        Ok(Self {
            suggested_window: RenewalWindow { start, end },
            explanation_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renewal_info_parses_suggested_window() {
        let json = Json::parse(
            br#"{
                "suggestedWindow": {
                    "start": "2026-01-01T00:00:00Z",
                    "end": "2026-01-03T00:00:00Z"
                },
                "explanationURL": "https://example.com/ari-explanation"
            }"#,
        )
        .unwrap();
        let info = RenewalInfo::from_json(&json).unwrap();
        assert!(info.suggested_window.start < info.suggested_window.end);
        assert_eq!(info.explanation_url.as_deref(), Some("https://example.com/ari-explanation"));
    }
}
