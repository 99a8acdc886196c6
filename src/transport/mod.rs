//! Signed and unsigned HTTP transport for ACME requests.
//!
//! [`Transport`] is deliberately stateless with respect to nonces and the
//! directory cache — those are [`crate::session::Session`]'s job (C6/C7).
//! It only knows how to build a JWS, issue the HTTP request, extract the
//! headers resources care about, and map non-2xx responses to
//! [`AcmeError`].

mod headers;
mod response;

pub use response::{Accept, RawResponse};

use crate::crypto::signer::Signer;
use crate::error::{AcmeError, Result};
use crate::jose::jws::{self, Identity};
use crate::jose::nonce::NoncePool;
use crate::problem::Problem;
use serde_json::Value;
use std::time::Duration;

/// Caller-supplied network configuration (spec §6's `NetworkSettings`).
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub danger_accept_invalid_certs: bool,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            danger_accept_invalid_certs: false,
        }
    }
}

impl NetworkSettings {
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

pub struct Transport {
    client: reqwest::Client,
    user_agent: String,
}

impl Transport {
    pub fn new(settings: &NetworkSettings, user_agent: impl Into<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.read_timeout)
            .danger_accept_invalid_certs(settings.danger_accept_invalid_certs);
        if let Some(proxy) = &settings.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| AcmeError::invalid_input(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AcmeError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }

    /// Unsigned GET, used only for the directory document and as a
    /// fallback for `newNonce` when a `HEAD` is not desired.
    pub async fn send_request(&self, url: &str, locale: Option<&str>) -> Result<RawResponse> {
        self.send_conditional_request(url, None, locale).await
    }

    /// Unsigned GET with an optional `If-Modified-Since`, used by the
    /// directory cache's revalidation path. A `304` response is returned
    /// as-is (not treated as a problem) so the caller can retain its cache.
    pub async fn send_conditional_request(
        &self,
        url: &str,
        if_modified_since: Option<&str>,
        locale: Option<&str>,
    ) -> Result<RawResponse> {
        let mut req = self.client.get(url).header("User-Agent", &self.user_agent);
        if let Some(locale) = locale {
            req = req.header("Accept-Language", locale);
        }
        if let Some(since) = if_modified_since {
            req = req.header("If-Modified-Since", since);
        }
        let response = req.send().await?;
        let raw = RawResponse::from_reqwest(response).await?;
        if raw.status.as_u16() == 304 {
            return Ok(raw);
        }
        self.fail_on_problem(url, &raw)?;
        Ok(raw)
    }

    /// Fetches a fresh nonce via `HEAD` to the directory's `newNonce`
    /// endpoint and installs it into `nonce_pool`.
    pub async fn refresh_nonce(&self, new_nonce_url: &str, nonce_pool: &NoncePool) -> Result<()> {
        let response = self
            .client
            .head(new_nonce_url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;
        let nonce = response
            .headers()
            .get("replay-nonce")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AcmeError::protocol("newNonce", "missing Replay-Nonce header"))?
            .to_string();
        nonce_pool.replace(nonce).await;
        Ok(())
    }

    /// Signed POST. `payload` is the request body JSON (may be `Value::Null`
    /// for POST-as-GET, which sends an empty string payload per RFC 8555).
    #[allow(clippy::too_many_arguments)]
    pub async fn send_signed_request(
        &self,
        url: &str,
        payload: &Value,
        signer: &dyn Signer,
        identity: Identity<'_>,
        nonce_pool: &NoncePool,
        new_nonce_url: &str,
        locale: Option<&str>,
        accept: Accept,
    ) -> Result<RawResponse> {
        let payload_bytes = if payload.is_null() {
            Vec::new()
        } else {
            payload.to_string().into_bytes()
        };

        let mut attempted_refresh = false;
        loop {
            let nonce = match nonce_pool.take().await {
                Some(nonce) => nonce,
                None => {
                    self.refresh_nonce(new_nonce_url, nonce_pool).await?;
                    nonce_pool
                        .take()
                        .await
                        .ok_or_else(|| AcmeError::protocol(url, "nonce pool empty after refresh"))?
                }
            };

            let signed =
                jws::sign(signer, url, Some(&nonce), clone_identity(&identity), &payload_bytes)?;

            let mut req = self
                .client
                .post(url)
                .header("Content-Type", "application/jose+json")
                .header("User-Agent", &self.user_agent)
                .header("Accept", accept.header_value());
            if let Some(locale) = locale {
                req = req.header("Accept-Language", locale);
            }
            let response = req.json(&signed.into_value()).send().await?;
            let raw = RawResponse::from_reqwest(response).await?;

            if let Some(nonce) = raw.replay_nonce.clone() {
                nonce_pool.replace(nonce).await;
            }

            if raw.status.as_u16() == 400 && !attempted_refresh {
                if let Some(problem) = raw.parse_problem() {
                    if problem.kind == "badNonce" {
                        attempted_refresh = true;
                        continue;
                    }
                }
            }

            self.fail_on_problem(url, &raw)?;
            return Ok(raw);
        }
    }

    /// Signed POST-as-GET: an authenticated fetch with an empty payload.
    pub async fn send_signed_post_as_get(
        &self,
        url: &str,
        signer: &dyn Signer,
        identity: Identity<'_>,
        nonce_pool: &NoncePool,
        new_nonce_url: &str,
        locale: Option<&str>,
        accept: Accept,
    ) -> Result<RawResponse> {
        self.send_signed_request(
            url,
            &Value::Null,
            signer,
            identity,
            nonce_pool,
            new_nonce_url,
            locale,
            accept,
        )
        .await
    }

    /// Sends an already-signed JWS body as-is, absorbing the replay nonce
    /// from the response but performing no retry-on-`badNonce` (the caller
    /// built the signature over a specific nonce it already consumed, so a
    /// retry would require resigning, which only the caller can do).
    pub async fn send_prebuilt_jws(
        &self,
        url: &str,
        jws_body: &Value,
        nonce_pool: &NoncePool,
        locale: Option<&str>,
        accept: Accept,
    ) -> Result<RawResponse> {
        let mut req = self
            .client
            .post(url)
            .header("Content-Type", "application/jose+json")
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept.header_value());
        if let Some(locale) = locale {
            req = req.header("Accept-Language", locale);
        }
        let response = req.json(jws_body).send().await?;
        let raw = RawResponse::from_reqwest(response).await?;
        if let Some(nonce) = raw.replay_nonce.clone() {
            nonce_pool.replace(nonce).await;
        }
        self.fail_on_problem(url, &raw)?;
        Ok(raw)
    }

    fn fail_on_problem(&self, url: &str, raw: &RawResponse) -> Result<()> {
        if raw.status.is_success() {
            return Ok(());
        }
        let problem = raw.parse_problem().unwrap_or_else(|| Problem {
            kind: String::new(),
            title: None,
            detail: Some(format!("HTTP {}", raw.status)),
            status: Some(raw.status.as_u16()),
            instance: None,
            subproblems: Vec::new(),
        });

        if problem.kind == "userActionRequired" {
            let terms_of_service = raw
                .links
                .get("terms-of-service")
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_default();
            let instance = problem.instance.clone().unwrap_or_default();
            return Err(AcmeError::UserActionRequired {
                terms_of_service,
                instance,
                problem,
            });
        }

        if problem.kind == "rateLimited" {
            return Err(AcmeError::RateLimited {
                retry_after: raw.retry_after,
                documents: raw.links.get("index").cloned().unwrap_or_default(),
                problem,
            });
        }

        Err(AcmeError::Server {
            kind: problem.kind.clone(),
            url: url.to_string(),
            problem,
        })
    }
}

fn clone_identity<'a>(identity: &Identity<'a>) -> Identity<'a> {
    match identity {
        Identity::Jwk(jwk) => Identity::Jwk(jwk),
        Identity::Kid(kid) => Identity::Kid(kid),
    }
}

/// The user agent a [`crate::provider::Provider`] builds its default
/// transport with.
pub(crate) fn default_user_agent() -> String {
    format!("acmex-core/{}", env!("CARGO_PKG_VERSION"))
}
