//! Parsed ACME directory document (RFC 8555 §7.1.1).

use crate::json::Json;
use crate::error::Result;
use std::collections::HashMap;

/// The directory's endpoint URLs and metadata. Parsed once per fetch by
/// [`crate::session::Session`], which owns the `Expires`/`Last-Modified`
/// caching policy around it.
#[derive(Debug, Clone)]
pub struct Directory {
    pub new_nonce: String,
    pub new_account: String,
    pub new_order: String,
    pub new_authz: Option<String>,
    pub revoke_cert: String,
    pub key_change: String,
    /// ARI draft's `renewalInfo` field: base URL for `getRenewalInfo()`.
    pub renewal_info: Option<String>,
    pub meta: DirectoryMeta,
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryMeta {
    pub terms_of_service: Option<String>,
    pub website: Option<String>,
    pub caa_identities: Vec<String>,
    pub external_account_required: bool,
    /// CA-defined issuance profile names to short descriptions, draft
    /// `acme-profiles`.
    pub profiles: HashMap<String, String>,
}

impl Directory {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let json = Json::parse(bytes)?;
        let meta = match json.object("meta")? {
            Some(meta_json) => DirectoryMeta {
                terms_of_service: meta_json.string("termsOfService")?,
                website: meta_json.string("website")?,
                caa_identities: meta_json.string_array("caaIdentities")?,
                external_account_required: meta_json
                    .boolean("externalAccountRequired")?
                    .unwrap_or(false),
                profiles: meta_json
                    .object("profiles")?
                    .map(|profiles| {
                        profiles
                            .keys()
                            .filter_map(|k| {
                                profiles
                                    .string(k)
                                    .ok()
                                    .flatten()
                                    .map(|v| (k.to_string(), v))
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            None => DirectoryMeta::default(),
        };

        Ok(Directory {
            new_nonce: json.required_url("newNonce")?,
            new_account: json.required_url("newAccount")?,
            new_order: json.required_url("newOrder")?,
            new_authz: json.url("newAuthz")?,
            revoke_cert: json.required_url("revokeCert")?,
            key_change: json.required_url("keyChange")?,
            renewal_info: json.url("renewalInfo")?,
            meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_directory() {
        let dir = Directory::parse(
            br#"{
                "newNonce": "https://example.com/acme/new-nonce",
                "newAccount": "https://example.com/acme/new-account",
                "newOrder": "https://example.com/acme/new-order",
                "revokeCert": "https://example.com/acme/revoke-cert",
                "keyChange": "https://example.com/acme/key-change"
            }"#,
        )
        .unwrap();
        assert_eq!(dir.new_account, "https://example.com/acme/new-account");
        assert!(!dir.meta.external_account_required);
        assert!(dir.new_authz.is_none());
    }

    #[test]
    fn parses_meta_and_profiles() {
        let dir = Directory::parse(
            br#"{
                "newNonce": "https://example.com/acme/new-nonce",
                "newAccount": "https://example.com/acme/new-account",
                "newOrder": "https://example.com/acme/new-order",
                "revokeCert": "https://example.com/acme/revoke-cert",
                "keyChange": "https://example.com/acme/key-change",
                "renewalInfo": "https://example.com/acme/renewal-info",
                "meta": {
                    "termsOfService": "https://example.com/tos",
                    "externalAccountRequired": true,
                    "caaIdentities": ["example.com"],
                    "profiles": {"classic": "Classic profile"}
                }
            }"#,
        )
        .unwrap();
        assert!(dir.meta.external_account_required);
        assert_eq!(dir.meta.caa_identities, vec!["example.com".to_string()]);
        assert_eq!(
            dir.meta.profiles.get("classic"),
            Some(&"Classic profile".to_string())
        );
        assert_eq!(
            dir.renewal_info,
            Some("https://example.com/acme/renewal-info".to_string())
        );
    }
}
