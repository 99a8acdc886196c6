//! Shared value types used across the resource modules: identifiers,
//! contacts, revocation reasons, and the status enums each resource's state
//! machine cycles through.

use crate::error::{AcmeError, Result};
use serde::{Deserialize, Serialize};

/// A certificate identifier: a DNS name or an IP address, per RFC 8555 §9.7.7
/// and RFC 8738. DNS values are IDNA-normalized to ASCII at construction so
/// every downstream comparison (order identifiers, authorization lookups,
/// challenge matching) works on the same canonical form a CA would use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub id_type: String,
    pub value: String,
}

impl Identifier {
    /// Normalizes `domain` to ASCII (IDNA/Punycode) before building the
    /// identifier. Fails on a syntactically invalid domain.
    pub fn dns(domain: impl AsRef<str>) -> Result<Self> {
        let ascii = idna::domain_to_ascii(domain.as_ref())
            .map_err(|e| AcmeError::invalid_input(format!("invalid domain name: {e}")))?;
        Ok(Self {
            id_type: "dns".to_string(),
            value: ascii,
        })
    }

    pub fn ip(ip: impl Into<String>) -> Self {
        Self {
            id_type: "ip".to_string(),
            value: ip.into(),
        }
    }
}

/// Certificate revocation reason codes, RFC 5280 §5.3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RevocationReason {
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    RemoveFromCrl = 8,
    PrivilegeWithdrawn = 9,
    AaCompromise = 10,
}

impl RevocationReason {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Account contact URI (RFC 8555 §7.1.2's `contact` array holds raw URIs;
/// this wraps the three schemes callers actually use).
#[derive(Debug, Clone)]
pub enum Contact {
    Email(String),
    Phone(String),
    Uri(String),
}

impl Contact {
    pub fn email(email: impl Into<String>) -> Self {
        Contact::Email(email.into())
    }

    pub fn phone(phone: impl Into<String>) -> Self {
        Contact::Phone(phone.into())
    }

    pub fn to_uri(&self) -> String {
        match self {
            Contact::Email(email) => format!("mailto:{email}"),
            Contact::Phone(phone) => format!("tel:{phone}"),
            Contact::Uri(uri) => uri.clone(),
        }
    }
}

/// Challenge type (RFC 8555 §8 plus RFC 8737's `tls-alpn-01`). `email-reply-00`
/// (RFC 8823) is recognized for matching purposes only — its response
/// material is out of core scope (see `challenge` module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeType {
    Http01,
    Dns01,
    TlsAlpn01,
    EmailReply00,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Http01 => "http-01",
            ChallengeType::Dns01 => "dns-01",
            ChallengeType::TlsAlpn01 => "tls-alpn-01",
            ChallengeType::EmailReply00 => "email-reply-00",
        }
    }
}

impl std::str::FromStr for ChallengeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "http-01" => Ok(ChallengeType::Http01),
            "dns-01" => Ok(ChallengeType::Dns01),
            "tls-alpn-01" => Ok(ChallengeType::TlsAlpn01),
            "email-reply-00" => Ok(ChallengeType::EmailReply00),
            _ => Err(format!("unknown challenge type: {s}")),
        }
    }
}

impl std::fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account status, RFC 8555 §7.1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Valid,
    Deactivated,
    Revoked,
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "valid" => Ok(AccountStatus::Valid),
            "deactivated" => Ok(AccountStatus::Deactivated),
            "revoked" => Ok(AccountStatus::Revoked),
            _ => Err(format!("unknown account status: {s}")),
        }
    }
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Valid => "valid",
            AccountStatus::Deactivated => "deactivated",
            AccountStatus::Revoked => "revoked",
        }
    }
}

/// Order status, RFC 8555 §7.1.6's state diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Ready,
    Processing,
    Valid,
    Invalid,
    Expired,
    Deactivated,
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "ready" => Ok(OrderStatus::Ready),
            "processing" => Ok(OrderStatus::Processing),
            "valid" => Ok(OrderStatus::Valid),
            "invalid" => Ok(OrderStatus::Invalid),
            "expired" => Ok(OrderStatus::Expired),
            "deactivated" => Ok(OrderStatus::Deactivated),
            _ => Err(format!("unknown order status: {s}")),
        }
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Ready => "ready",
            OrderStatus::Processing => "processing",
            OrderStatus::Valid => "valid",
            OrderStatus::Invalid => "invalid",
            OrderStatus::Expired => "expired",
            OrderStatus::Deactivated => "deactivated",
        }
    }

    /// Whether this status is terminal for `waitForCompletion` purposes
    /// (neither `pending` nor `processing`).
    pub fn is_terminal_for_completion(&self) -> bool {
        !matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authorization status, RFC 8555 §7.1.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Pending,
    Valid,
    Invalid,
    Deactivated,
    Expired,
    Revoked,
}

impl std::str::FromStr for AuthorizationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AuthorizationStatus::Pending),
            "valid" => Ok(AuthorizationStatus::Valid),
            "invalid" => Ok(AuthorizationStatus::Invalid),
            "deactivated" => Ok(AuthorizationStatus::Deactivated),
            "expired" => Ok(AuthorizationStatus::Expired),
            "revoked" => Ok(AuthorizationStatus::Revoked),
            _ => Err(format!("unknown authorization status: {s}")),
        }
    }
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::Pending => "pending",
            AuthorizationStatus::Valid => "valid",
            AuthorizationStatus::Invalid => "invalid",
            AuthorizationStatus::Deactivated => "deactivated",
            AuthorizationStatus::Expired => "expired",
            AuthorizationStatus::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Challenge status, RFC 8555 §8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Pending,
    Processing,
    Valid,
    Invalid,
}

impl std::str::FromStr for ChallengeStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ChallengeStatus::Pending),
            "processing" => Ok(ChallengeStatus::Processing),
            "valid" => Ok(ChallengeStatus::Valid),
            "invalid" => Ok(ChallengeStatus::Invalid),
            _ => Err(format!("unknown challenge status: {s}")),
        }
    }
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Pending => "pending",
            ChallengeStatus::Processing => "processing",
            ChallengeStatus::Valid => "valid",
            ChallengeStatus::Invalid => "invalid",
        }
    }

    pub fn is_terminal_for_completion(&self) -> bool {
        !matches!(self, ChallengeStatus::Pending | ChallengeStatus::Processing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_identifier_normalizes_unicode_to_ascii() {
        let id = Identifier::dns("münchen.example").unwrap();
        assert_eq!(id.id_type, "dns");
        assert_eq!(id.value, "xn--mnchen-3ya.example");
    }

    #[test]
    fn ip_identifier_is_passed_through() {
        let id = Identifier::ip("203.0.113.1");
        assert_eq!(id.id_type, "ip");
        assert_eq!(id.value, "203.0.113.1");
    }

    #[test]
    fn contact_email_uri() {
        assert_eq!(Contact::email("ops@example.com").to_uri(), "mailto:ops@example.com");
    }

    #[test]
    fn challenge_type_round_trips() {
        assert_eq!(ChallengeType::Http01.as_str(), "http-01");
        assert_eq!("dns-01".parse::<ChallengeType>().unwrap(), ChallengeType::Dns01);
    }

    #[test]
    fn order_status_terminal_for_completion() {
        assert!(!OrderStatus::Pending.is_terminal_for_completion());
        assert!(OrderStatus::Valid.is_terminal_for_completion());
        assert!(OrderStatus::Invalid.is_terminal_for_completion());
    }
}
