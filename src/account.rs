//! Account resource (RFC 8555 §7.3): registration, contact/status updates,
//! key rollover, and the entry points for creating orders and
//! pre-authorizing identifiers.
//!
//! There is no manager type here — every operation either builds a fresh
//! [`Login`] ([`Account::create`], [`Account::bind`]) or hangs off an
//! existing one (`&self` methods), mirroring how [`crate::order::Order`]
//! and [`crate::certificate::Certificate`] are shaped.

use crate::crypto::signer::Signer;
use crate::error::{AcmeError, Result};
use crate::jose::jwk::Jwk;
use crate::jose::jws::{self, Identity};
use crate::json::{Json, JsonBuilder};
use crate::login::Login;
use crate::order::{Authorization, Order};
use crate::session::Session;
use crate::transport::Accept;
use crate::types::{AccountStatus, Contact, Identifier};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::{Sha256, Sha384, Sha512};
use std::sync::Arc;

/// MAC algorithm a CA assigns for External Account Binding, RFC 8555 §7.3.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EabAlgorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl EabAlgorithm {
    fn jwa(self) -> &'static str {
        match self {
            EabAlgorithm::Hs256 => "HS256",
            EabAlgorithm::Hs384 => "HS384",
            EabAlgorithm::Hs512 => "HS512",
        }
    }
}

/// CA-issued credentials binding a new ACME account to an existing
/// out-of-band account (RFC 8555 §7.3.4). Built on `hmac`/`sha2` directly —
/// the MAC key is symmetric, so it never goes through the asymmetric
/// `Signer` trait.
pub struct ExternalAccountBinding {
    key_id: String,
    hmac_key: Vec<u8>,
    algorithm: EabAlgorithm,
}

impl ExternalAccountBinding {
    pub fn new(key_id: impl Into<String>, hmac_key: Vec<u8>, algorithm: EabAlgorithm) -> Self {
        Self {
            key_id: key_id.into(),
            hmac_key,
            algorithm,
        }
    }

    /// Builds the inner flattened JWS: protected header
    /// `{alg, kid: key_id, url}`, payload is the new account key's
    /// canonical JWK, MAC over `protected.payload` with the CA-issued key.
    fn sign(&self, account_jwk: &Jwk, new_account_url: &str) -> Result<Value> {
        use base64::Engine;
        let header = serde_json::json!({
            "alg": self.algorithm.jwa(),
            "kid": self.key_id,
            "url": new_account_url,
        });
        let protected = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(account_jwk.to_canonical_value().to_string());
        let signing_input = format!("{protected}.{payload}");
        let signature = self.mac(signing_input.as_bytes())?;
        Ok(serde_json::json!({
            "protected": protected,
            "payload": payload,
            "signature": base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature),
        }))
    }

    fn mac(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.algorithm {
            EabAlgorithm::Hs256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(&self.hmac_key)
                    .map_err(|e| AcmeError::crypto(format!("invalid EAB MAC key: {e}")))?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            EabAlgorithm::Hs384 => {
                let mut mac = Hmac::<Sha384>::new_from_slice(&self.hmac_key)
                    .map_err(|e| AcmeError::crypto(format!("invalid EAB MAC key: {e}")))?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            EabAlgorithm::Hs512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(&self.hmac_key)
                    .map_err(|e| AcmeError::crypto(format!("invalid EAB MAC key: {e}")))?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }
}

/// Builder for `newAccount` (RFC 8555 §7.3).
#[derive(Default)]
pub struct NewAccountRequest {
    contacts: Vec<Contact>,
    terms_of_service_agreed: bool,
    only_return_existing: bool,
    external_account_binding: Option<ExternalAccountBinding>,
}

impl NewAccountRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contacts(mut self, contacts: Vec<Contact>) -> Self {
        self.contacts = contacts;
        self
    }

    pub fn agree_to_terms_of_service(mut self) -> Self {
        self.terms_of_service_agreed = true;
        self
    }

    /// Look up an existing account bound to the signing key rather than
    /// creating a new one; fails with `accountDoesNotExist` if none exists.
    pub fn only_return_existing(mut self) -> Self {
        self.only_return_existing = true;
        self
    }

    pub fn with_external_account_binding(mut self, eab: ExternalAccountBinding) -> Self {
        self.external_account_binding = Some(eab);
        self
    }
}

/// A registered ACME account, bound to one [`Login`].
pub struct Account {
    login: Arc<Login>,
    status: AccountStatus,
    contact: Vec<String>,
    terms_of_service_agreed: bool,
    orders: Option<String>,
}

impl Account {
    fn from_json(login: Arc<Login>, json: &Json) -> Result<Self> {
        let status = json
            .required_string("status")?
            .parse::<AccountStatus>()
            .map_err(|e| AcmeError::protocol(json.path(), e))?;
        let contact = json.string_array("contact")?;
        let terms_of_service_agreed = json.boolean("termsOfServiceAgreed")?.unwrap_or(false);
        let orders = json.string("orders")?;
        Ok(Self {
            login,
            status,
            contact,
            terms_of_service_agreed,
            orders,
        })
    }

    pub fn login(&self) -> &Arc<Login> {
        &self.login
    }

    pub fn url(&self) -> &str {
        self.login.account_url()
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn contacts(&self) -> &[String] {
        &self.contact
    }

    pub fn terms_of_service_agreed(&self) -> bool {
        self.terms_of_service_agreed
    }

    /// Creates a new account (or, with `only_return_existing`, binds to an
    /// existing one keyed on the same signer). Returns the bound `Login`
    /// alongside the parsed account and whether the server reported it as
    /// already existing (HTTP 200 rather than 201, RFC 8555 §7.3.1).
    pub async fn create(
        session: Arc<Session>,
        signer: Arc<dyn Signer>,
        request: NewAccountRequest,
    ) -> Result<(Arc<Login>, Account, bool)> {
        let directory = session.metadata().await?;
        let jwk = signer.public_jwk();

        let mut builder = JsonBuilder::new()
            .put_bool("termsOfServiceAgreed", request.terms_of_service_agreed)
            .put_array(
                "contact",
                request
                    .contacts
                    .iter()
                    .map(|c| Value::String(c.to_uri()))
                    .collect(),
            );
        if request.only_return_existing {
            builder = builder.put_bool("onlyReturnExisting", true);
        }
        if let Some(eab) = &request.external_account_binding {
            let eab_jws = eab.sign(&jwk, &directory.new_account)?;
            builder = builder.put("externalAccountBinding", eab_jws);
        }
        let payload = builder.build();

        let raw = session
            .signed_post(
                &directory.new_account,
                &payload,
                signer.as_ref(),
                Identity::Jwk(&jwk),
                Accept::Json,
            )
            .await?;
        let account_url = raw
            .location
            .clone()
            .ok_or_else(|| AcmeError::protocol(&directory.new_account, "missing Location header"))?;
        let already_existed = raw.status.as_u16() == 200;
        let json = raw.json()?;

        let login = Arc::new(Login::new(session, signer, account_url));
        let account = Account::from_json(login.clone(), &json)?;
        Ok((login, account, already_existed))
    }

    /// Binds to an account whose URL is already known, without contacting
    /// the server. Call [`Account::update`] to populate its fields.
    pub fn bind(session: Arc<Session>, signer: Arc<dyn Signer>, account_url: impl Into<String>) -> Arc<Login> {
        Arc::new(Login::new(session, signer, account_url))
    }

    /// Re-fetches this account's current state via signed POST-as-GET.
    pub async fn update(&mut self) -> Result<()> {
        let raw = self
            .login
            .signed_post_as_get(self.login.account_url(), Accept::Json)
            .await?;
        let json = raw.json()?;
        *self = Account::from_json(self.login.clone(), &json)?;
        Ok(())
    }

    /// Starts a contact/status update. Call [`AccountModification::commit`]
    /// to send it.
    pub fn modify(&self) -> AccountModification<'_> {
        AccountModification {
            account: self,
            contact: None,
            deactivate: false,
        }
    }

    /// `changeKey` (RFC 8555 §7.3.5): signs the nested inner/outer JWS and,
    /// only on success, swaps the signer bound to this account's `Login`.
    /// Fails with [`AcmeError::InvalidKeyChange`] if the new key is already
    /// bound to another account.
    pub async fn change_key(&self, new_signer: Arc<dyn Signer>) -> Result<()> {
        let session = self.login.session();
        let directory = session.metadata().await?;
        let old_signer = self.login.signer().await;
        let nonce = session.take_nonce().await?;
        let jws_body = jws::sign_key_change(
            old_signer.as_ref(),
            new_signer.as_ref(),
            &directory.key_change,
            &nonce,
            self.login.account_url(),
        )?;

        match session.send_prebuilt_jws(&directory.key_change, &jws_body, Accept::Json).await {
            Ok(_) => {}
            Err(AcmeError::Server { kind, problem, .. }) if kind == "malformed" || kind == "incorrectResponse" => {
                return Err(AcmeError::invalid_key_change(problem.to_string()));
            }
            Err(e) => return Err(e),
        }

        self.login.replace_signer(new_signer).await;
        Ok(())
    }

    /// `newOrder` (RFC 8555 §7.4). Fails fast on an empty identifier list
    /// rather than letting the server reject it.
    pub async fn new_order(
        &self,
        identifiers: Vec<Identifier>,
        not_before: Option<jiff::Timestamp>,
        not_after: Option<jiff::Timestamp>,
        profile: Option<String>,
    ) -> Result<Order> {
        if identifiers.is_empty() {
            return Err(AcmeError::invalid_input("newOrder requires at least one identifier"));
        }
        let directory = self.login.session().metadata().await?;
        let payload = JsonBuilder::new()
            .put_array(
                "identifiers",
                identifiers
                    .iter()
                    .map(|id| serde_json::json!({"type": id.id_type, "value": id.value}))
                    .collect(),
            )
            .put_opt("notBefore", not_before.map(|t| t.to_string()))
            .put_opt("notAfter", not_after.map(|t| t.to_string()))
            .put_opt("profile", profile)
            .build();

        let raw = self.login.signed_post(&directory.new_order, &payload, Accept::Json).await?;
        let order_url = raw
            .location
            .clone()
            .ok_or_else(|| AcmeError::protocol(&directory.new_order, "missing Location header"))?;
        let json = raw.json()?;
        Order::from_json(self.login.clone(), order_url, &json)
    }

    /// `newAuthz` (RFC 8555 §7.4.1), a server-optional pre-authorization
    /// flow independent of any order. Fails with [`AcmeError::NotSupported`]
    /// if the directory doesn't advertise it.
    pub async fn pre_authorize_identifier(&self, identifier: Identifier) -> Result<Authorization> {
        let directory = self.login.session().metadata().await?;
        let new_authz = directory
            .new_authz
            .clone()
            .ok_or_else(|| AcmeError::not_supported("server does not advertise newAuthz"))?;
        let payload = JsonBuilder::new()
            .put(
                "identifier",
                serde_json::json!({"type": identifier.id_type, "value": identifier.value}),
            )
            .build();
        let raw = self.login.signed_post(&new_authz, &payload, Accept::Json).await?;
        let authz_url = raw
            .location
            .clone()
            .ok_or_else(|| AcmeError::protocol(&new_authz, "missing Location header"))?;
        let json = raw.json()?;
        Authorization::from_json(self.login.clone(), authz_url, &json)
    }

    /// Best-effort order listing via the account's `orders` URL (RFC 8555
    /// §7.1.2.1). Pagination via `Link: rel="next"` is not followed; fails
    /// with [`AcmeError::NotSupported`] if the account document carries no
    /// `orders` field.
    pub async fn get_orders(&self) -> Result<Vec<String>> {
        let orders_url = self
            .orders
            .clone()
            .ok_or_else(|| AcmeError::not_supported("account has no orders URL"))?;
        let raw = self.login.signed_post_as_get(&orders_url, Accept::Json).await?;
        let json = raw.json()?;
        json.string_array("orders")
    }
}

/// Pending contact/status change for an [`Account`], sent via
/// [`AccountModification::commit`].
pub struct AccountModification<'a> {
    account: &'a Account,
    contact: Option<Vec<Contact>>,
    deactivate: bool,
}

impl<'a> AccountModification<'a> {
    pub fn with_contacts(mut self, contacts: Vec<Contact>) -> Self {
        self.contact = Some(contacts);
        self
    }

    /// Marks the account `deactivated` (RFC 8555 §7.3.6). Irreversible.
    pub fn deactivate(mut self) -> Self {
        self.deactivate = true;
        self
    }

    pub async fn commit(self) -> Result<Account> {
        let mut builder = JsonBuilder::new();
        if let Some(contacts) = &self.contact {
            builder = builder.put_array(
                "contact",
                contacts.iter().map(|c| Value::String(c.to_uri())).collect(),
            );
        }
        if self.deactivate {
            builder = builder.put_string("status", "deactivated");
        }
        let payload = builder.build();
        let raw = self
            .account
            .login
            .signed_post(self.account.login.account_url(), &payload, Accept::Json)
            .await?;
        let json = raw.json()?;
        Account::from_json(self.account.login.clone(), &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jose::jwk::Jwk;

    #[test]
    fn eab_signature_is_deterministic_for_same_inputs() {
        let eab = ExternalAccountBinding::new("kid-1", b"mac-key-material".to_vec(), EabAlgorithm::Hs256);
        let jwk = Jwk::new_ec("P-256", "x-coord", "y-coord");
        let a = eab.sign(&jwk, "https://example.com/acme/new-account").unwrap();
        let b = eab.sign(&jwk, "https://example.com/acme/new-account").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn eab_signature_carries_expected_protected_header() {
        use base64::Engine;
        let eab = ExternalAccountBinding::new("kid-1", b"mac-key-material".to_vec(), EabAlgorithm::Hs384);
        let jwk = Jwk::new_ec("P-256", "x-coord", "y-coord");
        let signed = eab.sign(&jwk, "https://example.com/acme/new-account").unwrap();
        let protected_b64 = signed.get("protected").unwrap().as_str().unwrap();
        let protected_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(protected_b64)
            .unwrap();
        let header: Value = serde_json::from_slice(&protected_bytes).unwrap();
        assert_eq!(header.get("alg").unwrap().as_str().unwrap(), "HS384");
        assert_eq!(header.get("kid").unwrap().as_str().unwrap(), "kid-1");
    }

    #[test]
    fn eab_rejects_malformed_hmac_key() {
        // HMAC accepts any non-empty key length, so this exercises the error
        // path indirectly via an empty key where supported algorithms differ;
        // kept minimal since `hmac::new_from_slice` only fails on key length
        // constraints that don't apply to SHA-2-based HMAC variants.
        let eab = ExternalAccountBinding::new("kid-1", Vec::new(), EabAlgorithm::Hs256);
        let jwk = Jwk::new_ec("P-256", "x-coord", "y-coord");
        assert!(eab.sign(&jwk, "https://example.com/acme/new-account").is_ok());
    }
}
