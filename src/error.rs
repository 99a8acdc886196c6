/// Error taxonomy for the ACME engine.
///
/// Every public operation returns [`Result<T>`], whose variants map
/// one-to-one onto the failure kinds a caller needs to act on: a malformed
/// server response is not the same problem as a CA-issued rate limit, and
/// callers that want to retry, surface a TOS link, or just give up need to
/// tell them apart without parsing strings.
///
/// Propagation policy: the transport recovers a `badNonce` response once,
/// transparently, by retrying the same request with the fresh nonce (see
/// [`crate::transport::Transport`]). Every other variant reaches the
/// caller; resources never swallow an error into a fabricated state change.
use crate::problem::Problem;
use std::time::Duration;

/// Result type for ACME operations.
pub type Result<T> = std::result::Result<T, AcmeError>;

/// Error kinds produced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum AcmeError {
    /// Malformed JSON, a missing required field, or an unparseable header.
    /// Indicates a server bug or client misconfiguration; not retryable.
    #[error("protocol error at {path}: {message}")]
    Protocol { path: String, message: String },

    /// An RFC 7807 problem document the CA returned for a request, tagged
    /// by its ACME error type (the `urn:ietf:params:acme:error:` prefix is
    /// stripped). Carries the full [`Problem`] payload.
    #[error("server error ({kind}) from {url}: {problem}")]
    Server {
        kind: String,
        url: String,
        problem: Problem,
    },

    /// Specialization of `Server` for `userActionRequired`: the CA wants
    /// the account holder to visit a URL (typically to accept updated
    /// terms of service) before the request will succeed.
    #[error("user action required at {instance}: see {terms_of_service}")]
    UserActionRequired {
        terms_of_service: String,
        instance: String,
        problem: Problem,
    },

    /// Specialization of `Server` for `rateLimited`: carries the
    /// `Retry-After` value and any `documents` URLs the problem referenced.
    /// Never auto-retried; surfaced for the caller to act on.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        retry_after: Option<Duration>,
        documents: Vec<String>,
        problem: Problem,
    },

    /// Transport failure: DNS, TCP, TLS, or request timeout. Not retried
    /// by the core.
    #[error("network error: {0}")]
    Network(String),

    /// A transport error raised while resolving a lazily-loaded field.
    /// Wraps the underlying error together with the resource URL that
    /// triggered the load.
    #[error("lazy load of {url} failed: {source}")]
    LazyLoad {
        url: String,
        #[source]
        source: Box<AcmeError>,
    },

    /// The caller invoked a feature the server (or this provider) does not
    /// advertise: account order listing, pre-authorization, ARI, etc.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A polling wait or sleep was cancelled.
    #[error("interrupted while waiting for {resource} (last status: {last_status:?})")]
    Interrupted {
        resource: String,
        last_status: Option<String>,
    },

    /// A poll loop exceeded its caller-supplied timeout.
    #[error("timed out waiting for {resource} (last status: {last_status:?})")]
    Timeout {
        resource: String,
        last_status: Option<String>,
    },

    /// No registered [`crate::provider::Provider`] accepted the server URI.
    #[error("unknown provider for server URI: {0}")]
    UnknownProvider(String),

    /// The signing key's type/size is not one the JOSE signer can handle
    /// (RSA < 2048 bits, an unsupported EC curve, etc).
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    /// `changeKey` failed because the new key is already bound to another
    /// account, or the new key equals the current account key.
    #[error("invalid key change: {0}")]
    InvalidKeyChange(String),

    /// Generic cryptographic failure (key generation, signing, hashing).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Certificate parsing or chain-inspection failure.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// Caller-supplied argument failed validation before any request was
    /// sent (empty identifier list, malformed server URI, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AcmeError {
    pub fn protocol(path: impl Into<String>, message: impl Into<String>) -> Self {
        AcmeError::Protocol {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        AcmeError::Network(message.into())
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        AcmeError::NotSupported(message.into())
    }

    pub fn unsupported_key(message: impl Into<String>) -> Self {
        AcmeError::UnsupportedKey(message.into())
    }

    pub fn invalid_key_change(message: impl Into<String>) -> Self {
        AcmeError::InvalidKeyChange(message.into())
    }

    pub fn crypto(message: impl Into<String>) -> Self {
        AcmeError::Crypto(message.into())
    }

    pub fn certificate(message: impl Into<String>) -> Self {
        AcmeError::Certificate(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AcmeError::InvalidInput(message.into())
    }

    /// The ACME error type (stripped of its `urn:ietf:params:acme:error:`
    /// prefix) if this is a server-originated error, for callers that want
    /// to match on the taxonomy from RFC 8555 without destructuring.
    pub fn acme_type(&self) -> Option<&str> {
        match self {
            AcmeError::Server { kind, .. } => Some(kind),
            AcmeError::UserActionRequired { .. } => Some("userActionRequired"),
            AcmeError::RateLimited { .. } => Some("rateLimited"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AcmeError {
    fn from(err: reqwest::Error) -> Self {
        AcmeError::network(err.to_string())
    }
}
