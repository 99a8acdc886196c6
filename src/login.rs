//! Binds a [`Session`] to one account key and account URL — the `kid` used
//! to sign every subsequent request. Every resource (`Account`, `Order`,
//! `Authorization`, `Challenge`, `Certificate`) holds a `Login` back
//! reference instead of the `Session` directly.
//!
//! A `Login` is immutable from the outside except for `changeKey`, which
//! atomically swaps the signer out from under it; every other field is
//! fixed for the `Login`'s lifetime. A `Session` may back several `Login`s
//! at once (different account keys against the same server).

use crate::crypto::signer::Signer;
use crate::error::Result;
use crate::jose::jws::Identity;
use crate::session::Session;
use crate::transport::{Accept, RawResponse};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct Login {
    session: Arc<Session>,
    signer: RwLock<Arc<dyn Signer>>,
    account_url: String,
}

impl Login {
    pub fn new(session: Arc<Session>, signer: Arc<dyn Signer>, account_url: impl Into<String>) -> Self {
        Self {
            session,
            signer: RwLock::new(signer),
            account_url: account_url.into(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn account_url(&self) -> &str {
        &self.account_url
    }

    /// The signer currently bound to this login. Cloning the `Arc` is cheap;
    /// callers should not hold onto it across a `changeKey`, since it won't
    /// observe the swap.
    pub async fn signer(&self) -> Arc<dyn Signer> {
        self.signer.read().await.clone()
    }

    /// Swaps in a new signer after a successful `changeKey`. The account URL
    /// is unchanged — the server keeps the account at the same location.
    pub(crate) async fn replace_signer(&self, new_signer: Arc<dyn Signer>) {
        *self.signer.write().await = new_signer;
    }

    /// Signed POST authenticated with this login's `kid`.
    pub async fn signed_post(&self, url: &str, payload: &Value, accept: Accept) -> Result<RawResponse> {
        let signer = self.signer().await;
        self.session
            .signed_post(url, payload, signer.as_ref(), Identity::Kid(&self.account_url), accept)
            .await
    }

    /// Signed POST-as-GET authenticated with this login's `kid`.
    pub async fn signed_post_as_get(&self, url: &str, accept: Accept) -> Result<RawResponse> {
        let signer = self.signer().await;
        self.session
            .signed_post_as_get(url, signer.as_ref(), Identity::Kid(&self.account_url), accept)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signer::RingSigner;
    use crate::provider::Registry;
    use crate::transport::NetworkSettings;
    use ring::rand::SystemRandom;
    use ring::signature::{self, EcdsaKeyPair};

    fn test_signer() -> Arc<dyn Signer> {
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(
            &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            &SystemRandom::new(),
        )
        .unwrap();
        Arc::new(RingSigner::from_pkcs8_ecdsa_p256(pkcs8.as_ref()).unwrap())
    }

    fn test_session() -> Arc<Session> {
        Arc::new(
            Session::new(
                "https://example.com/directory",
                &Registry::default(),
                NetworkSettings::default(),
                None,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn replace_signer_swaps_the_bound_key() {
        let login = Login::new(test_session(), test_signer(), "https://example.com/acct/1");
        let original = login.signer().await;
        let next = test_signer();
        login.replace_signer(next.clone()).await;
        let after = login.signer().await;
        assert_eq!(after.jwa_algorithm(), "ES256");
        assert!(!Arc::ptr_eq(&original, &after));
    }

    #[test]
    fn account_url_and_session_are_accessible() {
        let login = Login::new(test_session(), test_signer(), "https://example.com/acct/1");
        assert_eq!(login.account_url(), "https://example.com/acct/1");
        assert_eq!(login.session().directory_url(), "https://example.com/directory");
    }
}
