//! Order, Authorization, and Challenge resources (RFC 8555 §§7.1.3, 7.1.4,
//! 7.1.6, 7.5): the `pending → ready → processing → valid` state machine
//! the server drives, and the operations that move through it.
//!
//! None of these resources transition their own state locally — every
//! status change comes from a server response, fetched either by an
//! explicit `update()` or by [`crate::polling::poll_until`] inside
//! `wait_until_ready`/`wait_for_completion`.

use crate::challenge;
use crate::error::{AcmeError, Result};
use crate::json::{Json, JsonBuilder};
use crate::login::Login;
use crate::polling::{self, CancellationToken};
use crate::problem::Problem;
use crate::provider::Provider;
use crate::transport::Accept;
use crate::types::{AuthorizationStatus, ChallengeStatus, ChallengeType, Identifier, OrderStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct Order {
    login: Arc<Login>,
    url: String,
    status: OrderStatus,
    expires: Option<String>,
    identifiers: Vec<Identifier>,
    authorizations: Vec<String>,
    finalize_url: String,
    certificate_url: Option<String>,
    error: Option<Problem>,
}

impl Order {
    pub(crate) fn from_json(login: Arc<Login>, url: String, json: &Json) -> Result<Self> {
        let status = json
            .required_string("status")?
            .parse::<OrderStatus>()
            .map_err(|e| AcmeError::protocol(json.path(), e))?;
        let expires = json.string("expires")?;
        let identifiers = json
            .array("identifiers")?
            .iter()
            .map(|id| {
                Ok(Identifier {
                    id_type: id.required_string("type")?,
                    value: id.required_string("value")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let authorizations = json.string_array("authorizations")?;
        let finalize_url = json.required_url("finalize")?;
        let certificate_url = json.url("certificate")?;
        let error = json
            .object("error")?
            .map(|e| serde_json::from_value(e.into_raw()))
            .transpose()
            .map_err(|e: serde_json::Error| AcmeError::protocol("error", e.to_string()))?;

        Ok(Self {
            login,
            url,
            status,
            expires,
            identifiers,
            authorizations,
            finalize_url,
            certificate_url,
            error,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn expires(&self) -> Option<&str> {
        self.expires.as_deref()
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn authorization_urls(&self) -> &[String] {
        &self.authorizations
    }

    pub fn error(&self) -> Option<&Problem> {
        self.error.as_ref()
    }

    /// Re-fetches this order via signed POST-as-GET.
    pub async fn update(&mut self) -> Result<()> {
        let raw = self.login.signed_post_as_get(&self.url, Accept::Json).await?;
        let json = raw.json()?;
        *self = Order::from_json(self.login.clone(), self.url.clone(), &json)?;
        Ok(())
    }

    /// Fetches every authorization this order references.
    pub async fn authorizations(&self) -> Result<Vec<Authorization>> {
        let mut out = Vec::with_capacity(self.authorizations.len());
        for url in &self.authorizations {
            out.push(Authorization::fetch(self.login.clone(), url.clone()).await?);
        }
        Ok(out)
    }

    /// Polls until the order leaves `pending`, i.e. every authorization has
    /// been validated and the order is ready to finalize (or has failed).
    pub async fn wait_until_ready(
        &mut self,
        timeout: Duration,
        cancellation: Option<CancellationToken>,
    ) -> Result<()> {
        let login = self.login.clone();
        let url = self.url.clone();
        let order = polling::poll_until(
            &url,
            || {
                let login = login.clone();
                let url = url.clone();
                async move {
                    let raw = login.signed_post_as_get(&url, Accept::Json).await?;
                    let json = raw.json()?;
                    let order = Order::from_json(login, url, &json)?;
                    Ok((order, raw.retry_after))
                }
            },
            |order: &Order| order.status != OrderStatus::Pending,
            |order| order.status.to_string(),
            timeout,
            cancellation,
        )
        .await?;
        *self = order;
        Ok(())
    }

    /// Polls until the order reaches a terminal status for finalization
    /// (anything but `pending`/`processing`).
    pub async fn wait_for_completion(
        &mut self,
        timeout: Duration,
        cancellation: Option<CancellationToken>,
    ) -> Result<()> {
        let login = self.login.clone();
        let url = self.url.clone();
        let order = polling::poll_until(
            &url,
            || {
                let login = login.clone();
                let url = url.clone();
                async move {
                    let raw = login.signed_post_as_get(&url, Accept::Json).await?;
                    let json = raw.json()?;
                    let order = Order::from_json(login, url, &json)?;
                    Ok((order, raw.retry_after))
                }
            },
            |order: &Order| order.status.is_terminal_for_completion(),
            |order| order.status.to_string(),
            timeout,
            cancellation,
        )
        .await?;
        *self = order;
        Ok(())
    }

    /// `ready → processing`: finalizes with a DER-encoded CSR (RFC 8555
    /// §7.4).
    pub async fn execute(&mut self, csr_der: &[u8]) -> Result<()> {
        if self.status != OrderStatus::Ready {
            return Err(AcmeError::invalid_input(format!(
                "order must be ready to finalize, was {}",
                self.status
            )));
        }
        let payload = JsonBuilder::new().put_base64("csr", csr_der).build();
        let raw = self.login.signed_post(&self.finalize_url, &payload, Accept::Json).await?;
        let json = raw.json()?;
        *self = Order::from_json(self.login.clone(), self.url.clone(), &json)?;
        Ok(())
    }

    /// The certificate resource once the order is `valid`. Downloading the
    /// actual chain is a separate, lazy step.
    pub fn certificate(&self) -> Result<crate::certificate::Certificate> {
        let url = self
            .certificate_url
            .clone()
            .ok_or_else(|| AcmeError::invalid_input("order has no certificate URL yet; wait for status valid"))?;
        Ok(crate::certificate::Certificate::new(self.login.clone(), url))
    }
}

pub struct Authorization {
    login: Arc<Login>,
    url: String,
    identifier: Identifier,
    status: AuthorizationStatus,
    expires: Option<String>,
    challenges: Vec<Challenge>,
    wildcard: bool,
}

impl Authorization {
    pub(crate) fn from_json(login: Arc<Login>, url: String, json: &Json) -> Result<Self> {
        let identifier_json = json.required_object("identifier")?;
        let identifier = Identifier {
            id_type: identifier_json.required_string("type")?,
            value: identifier_json.required_string("value")?,
        };
        let status = json
            .required_string("status")?
            .parse::<AuthorizationStatus>()
            .map_err(|e| AcmeError::protocol(json.path(), e))?;
        let expires = json.string("expires")?;
        let wildcard = json.boolean("wildcard")?.unwrap_or(false);
        let provider = login.session().provider().clone();
        let mut challenges = Vec::new();
        for c in json.array("challenges")?.iter() {
            match Challenge::from_json(login.clone(), c) {
                Ok(challenge) => challenges.push(challenge),
                Err(err) => match provider.create_challenge(login.clone(), c) {
                    Some(Ok(challenge)) => challenges.push(challenge),
                    Some(Err(err)) => return Err(err),
                    None => {
                        warn!(path = %c.path(), error = %err, "skipping unrecognized challenge");
                    }
                },
            }
        }

        Ok(Self {
            login,
            url,
            identifier,
            status,
            expires,
            challenges,
            wildcard,
        })
    }

    async fn fetch(login: Arc<Login>, url: String) -> Result<Self> {
        let raw = login.signed_post_as_get(&url, Accept::Json).await?;
        let json = raw.json()?;
        Authorization::from_json(login, url, &json)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn status(&self) -> AuthorizationStatus {
        self.status
    }

    pub fn expires(&self) -> Option<&str> {
        self.expires.as_deref()
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn challenges_mut(&mut self) -> &mut [Challenge] {
        &mut self.challenges
    }

    pub fn find_challenge(&self, challenge_type: ChallengeType) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.challenge_type == challenge_type)
    }

    pub fn find_challenge_mut(&mut self, challenge_type: ChallengeType) -> Option<&mut Challenge> {
        self.challenges.iter_mut().find(|c| c.challenge_type == challenge_type)
    }

    pub async fn update(&mut self) -> Result<()> {
        let refreshed = Authorization::fetch(self.login.clone(), self.url.clone()).await?;
        *self = refreshed;
        Ok(())
    }

    /// Voluntarily deactivates this authorization (RFC 8555 §7.5.2).
    pub async fn deactivate(&mut self) -> Result<()> {
        let payload = JsonBuilder::new().put_string("status", "deactivated").build();
        let raw = self.login.signed_post(&self.url, &payload, Accept::Json).await?;
        let json = raw.json()?;
        *self = Authorization::from_json(self.login.clone(), self.url.clone(), &json)?;
        Ok(())
    }
}

pub struct Challenge {
    login: Arc<Login>,
    url: String,
    challenge_type: ChallengeType,
    status: ChallengeStatus,
    token: String,
}

impl Challenge {
    fn from_json(login: Arc<Login>, json: &Json) -> Result<Self> {
        let challenge_type = json
            .required_string("type")?
            .parse::<ChallengeType>()
            .map_err(|e| AcmeError::protocol(json.path(), e))?;
        let status = json
            .required_string("status")?
            .parse::<ChallengeStatus>()
            .map_err(|e| AcmeError::protocol(json.path(), e))?;
        let url = json.required_url("url")?;
        let token = json.required_string("token")?;

        Ok(Self {
            login,
            url,
            challenge_type,
            status,
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn challenge_type(&self) -> ChallengeType {
        self.challenge_type
    }

    pub fn status(&self) -> ChallengeStatus {
        self.status
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The RFC 8555 §8.1 key authorization for this challenge, computed
    /// from the account key currently bound to this challenge's login.
    pub async fn key_authorization(&self) -> Result<String> {
        let jwk = self.login.signer().await.public_jwk();
        challenge::key_authorization(&self.token, &jwk)
    }

    pub async fn dns01_txt_value(&self) -> Result<String> {
        Ok(challenge::dns01_txt_value(&self.key_authorization().await?))
    }

    pub async fn tls_alpn01_extension_value(&self) -> Result<Vec<u8>> {
        Ok(challenge::tls_alpn01_extension_value(&self.key_authorization().await?))
    }

    /// Tells the server the response material is in place (RFC 8555 §7.5.1):
    /// a signed POST with an empty JSON object. Idempotent once `valid`.
    pub async fn trigger(&mut self) -> Result<()> {
        if self.status == ChallengeStatus::Valid {
            return Ok(());
        }
        let payload = serde_json::json!({});
        let raw = self.login.signed_post(&self.url, &payload, Accept::Json).await?;
        let json = raw.json()?;
        *self = Challenge::from_json(self.login.clone(), &json)?;
        Ok(())
    }

    pub async fn wait_for_completion(
        &mut self,
        timeout: Duration,
        cancellation: Option<CancellationToken>,
    ) -> Result<()> {
        let login = self.login.clone();
        let url = self.url.clone();
        let challenge = polling::poll_until(
            &url,
            || {
                let login = login.clone();
                let url = url.clone();
                async move {
                    let raw = login.signed_post_as_get(&url, Accept::Json).await?;
                    let json = raw.json()?;
                    let challenge = Challenge::from_json(login, &json)?;
                    Ok((challenge, raw.retry_after))
                }
            },
            |c: &Challenge| c.status.is_terminal_for_completion(),
            |c| c.status.as_str().to_string(),
            timeout,
            cancellation,
        )
        .await?;
        *self = challenge;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signer::{RingSigner, Signer};
    use crate::json::Json;
    use crate::session::Session;
    use ring::rand::SystemRandom;
    use ring::signature::{self, EcdsaKeyPair};

    fn test_login() -> Arc<Login> {
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(
            &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            &SystemRandom::new(),
        )
        .unwrap();
        let signer: Arc<dyn Signer> =
            Arc::new(RingSigner::from_pkcs8_ecdsa_p256(pkcs8.as_ref()).unwrap());
        let session = Arc::new(
            Session::new(
                "https://example.com/directory",
                &crate::provider::Registry::default(),
                crate::transport::NetworkSettings::default(),
                None,
            )
            .unwrap(),
        );
        Arc::new(Login::new(session, signer, "https://example.com/acct/1"))
    }

    /// A challenge type no registered provider recognizes must be skipped,
    /// not fail the whole authorization (`collect::<Result<_>>()` used to
    /// propagate the first parse error and drop every other challenge).
    #[test]
    fn authorization_parsing_skips_an_unrecognized_challenge_type() {
        let login = test_login();
        let json = Json::parse(
            br#"{
                "status": "pending",
                "identifier": {"type": "dns", "value": "example.com"},
                "challenges": [
                    {"type": "http-01", "status": "pending", "url": "https://example.com/chall/1", "token": "tok"},
                    {"type": "some-future-01", "status": "pending", "url": "https://example.com/chall/2", "token": "tok2"}
                ]
            }"#,
        )
        .unwrap();

        let authz =
            Authorization::from_json(login, "https://example.com/authz/1".to_string(), &json).unwrap();
        assert_eq!(authz.challenges().len(), 1);
        assert_eq!(authz.challenges()[0].challenge_type(), ChallengeType::Http01);
    }
}
