//! The stateful entry point for talking to one ACME server: resolves the
//! directory URL once, caches the directory document (C6), and owns the
//! single-slot nonce pool that every signed request through it shares (C7).
//!
//! Constructing a [`Session`] never touches the network — the directory is
//! fetched lazily, on first call to [`Session::metadata`] or any signed
//! request that needs a directory field.

use crate::crypto::signer::Signer;
use crate::error::{AcmeError, Result};
use crate::jose::jws::Identity;
use crate::jose::nonce::NoncePool;
use crate::jose::{Directory, DirectoryMeta};
use crate::provider::{Provider, Registry};
use crate::transport::{Accept, NetworkSettings, RawResponse, Transport};
use jiff::Timestamp;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct DirectoryCache {
    directory: Option<Directory>,
    last_modified: Option<String>,
    /// Absolute instant after which the cached directory must be
    /// revalidated. `None` means "revalidate on every use" — most CAs don't
    /// send an `Expires` header on the directory document.
    expires_at: Option<Timestamp>,
    /// Set when `directory` came from [`crate::provider::Provider::directory`]
    /// rather than a network fetch; such a directory is never revalidated.
    static_directory: bool,
}

pub struct Session {
    directory_url: String,
    provider: Arc<dyn Provider>,
    transport: Transport,
    nonce_pool: NoncePool,
    cache: RwLock<DirectoryCache>,
    locale: Option<String>,
}

impl Session {
    /// Resolves `server_uri` through `registry` and builds the HTTP client.
    /// Does not contact the server, unless the resolved provider supplies a
    /// static directory (see [`crate::provider::Provider::directory`]).
    pub fn new(
        server_uri: &str,
        registry: &Registry,
        network_settings: NetworkSettings,
        locale: Option<String>,
    ) -> Result<Self> {
        let provider = registry.find(server_uri)?;
        let directory_url = provider.directory_url(server_uri)?;
        let transport = provider.connect(server_uri, &network_settings)?;
        let cache = match provider.directory(server_uri) {
            Some(directory) => DirectoryCache {
                directory: Some(directory),
                last_modified: None,
                expires_at: None,
                static_directory: true,
            },
            None => DirectoryCache::default(),
        };
        Ok(Self {
            directory_url,
            provider,
            transport,
            nonce_pool: NoncePool::new(),
            cache: RwLock::new(cache),
            locale,
        })
    }

    pub fn directory_url(&self) -> &str {
        &self.directory_url
    }

    /// The provider this session resolved its server URI against, for
    /// resources that need to delegate provider-specific parsing (e.g.
    /// challenge types a CA defines outside RFC 8555).
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Returns the directory document, fetching or revalidating it if the
    /// cached copy is missing or expired. A provider-supplied static
    /// directory is returned as-is and never revalidated.
    pub async fn metadata(&self) -> Result<Directory> {
        {
            let cache = self.cache.read().await;
            if let Some(directory) = &cache.directory {
                let fresh = cache.static_directory
                    || cache
                        .expires_at
                        .map(|expires_at| Timestamp::now() < expires_at)
                        .unwrap_or(false);
                if fresh {
                    return Ok(directory.clone());
                }
            }
        }
        self.refresh_directory().await
    }

    /// Convenience accessor for the subset of directory metadata callers
    /// most often want without holding onto the full `Directory`.
    pub async fn directory_meta(&self) -> Result<DirectoryMeta> {
        Ok(self.metadata().await?.meta)
    }

    async fn refresh_directory(&self) -> Result<Directory> {
        let mut cache = self.cache.write().await;

        let raw = self
            .transport
            .send_conditional_request(
                &self.directory_url,
                cache.last_modified.as_deref(),
                self.locale.as_deref(),
            )
            .await?;

        if raw.status.as_u16() == 304 {
            if let Some(directory) = &cache.directory {
                return Ok(directory.clone());
            }
            // A 304 with nothing cached is a malformed server response;
            // fall through and let `Directory::parse` fail on the empty body.
        }

        let directory = Directory::parse(&raw.body)?;
        cache.directory = Some(directory.clone());
        cache.last_modified = raw.last_modified.clone();
        cache.expires_at = raw
            .expires
            .as_deref()
            .and_then(parse_http_date_to_timestamp);
        Ok(directory)
    }

    /// Plain unsigned GET, e.g. for a certificate URL embedded in an order.
    pub async fn unsigned_get(&self, url: &str) -> Result<RawResponse> {
        self.transport.send_request(url, self.locale.as_deref()).await
    }

    /// Signed POST against `url` using this session's nonce pool, fetching
    /// `newNonce` first if the pool is currently empty.
    pub async fn signed_post(
        &self,
        url: &str,
        payload: &Value,
        signer: &dyn Signer,
        identity: Identity<'_>,
        accept: Accept,
    ) -> Result<RawResponse> {
        let new_nonce_url = self.metadata().await?.new_nonce;
        self.transport
            .send_signed_request(
                url,
                payload,
                signer,
                identity,
                &self.nonce_pool,
                &new_nonce_url,
                self.locale.as_deref(),
                accept,
            )
            .await
    }

    /// Signed POST-as-GET, the authenticated read used to fetch orders,
    /// authorizations, and accounts.
    pub async fn signed_post_as_get(
        &self,
        url: &str,
        signer: &dyn Signer,
        identity: Identity<'_>,
        accept: Accept,
    ) -> Result<RawResponse> {
        let new_nonce_url = self.metadata().await?.new_nonce;
        self.transport
            .send_signed_post_as_get(
                url,
                signer,
                identity,
                &self.nonce_pool,
                &new_nonce_url,
                self.locale.as_deref(),
                accept,
            )
            .await
    }

    /// Takes one nonce out of the pool, refreshing it first if empty. For
    /// callers (`changeKey`) that must build a JWS around a known nonce
    /// before issuing the request, rather than have the transport manage it.
    pub(crate) async fn take_nonce(&self) -> Result<String> {
        if let Some(nonce) = self.nonce_pool.take().await {
            return Ok(nonce);
        }
        let new_nonce_url = self.metadata().await?.new_nonce;
        self.transport.refresh_nonce(&new_nonce_url, &self.nonce_pool).await?;
        self.nonce_pool
            .take()
            .await
            .ok_or_else(|| AcmeError::protocol("newNonce", "nonce pool empty after refresh"))
    }

    /// Sends a JWS body the caller already built and signed (`changeKey`'s
    /// nested structure doesn't fit the single-level signing `signed_post`
    /// performs).
    pub(crate) async fn send_prebuilt_jws(
        &self,
        url: &str,
        jws_body: &Value,
        accept: Accept,
    ) -> Result<RawResponse> {
        self.transport
            .send_prebuilt_jws(url, jws_body, &self.nonce_pool, self.locale.as_deref(), accept)
            .await
    }
}

fn parse_http_date_to_timestamp(value: &str) -> Option<Timestamp> {
    jiff::fmt::strtime::parse("%a, %d %b %Y %H:%M:%S GMT", value.trim())
        .ok()?
        .to_timestamp()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_date_parses_to_expected_timestamp() {
        let ts = parse_http_date_to_timestamp("Tue, 15 Nov 1994 08:12:31 GMT").unwrap();
        assert_eq!(ts.as_second(), 784887151);
    }

    #[test]
    fn malformed_http_date_yields_none() {
        assert!(parse_http_date_to_timestamp("not a date").is_none());
    }
}
