//! # acmex-core
//!
//! An ACME v2 (RFC 8555) protocol engine: JOSE-signed transport, and the
//! account/order/authorization/challenge/certificate resources built on top
//! of it. This crate owns the state machines and the wire protocol; it does
//! not run an HTTP server, schedule renewals, or implement any particular
//! challenge responder (serving `http-01` content, publishing `dns-01`
//! records) — those are the caller's job.
//!
//! ## Shape
//!
//! A [`session::Session`] resolves a server URI through the [`provider`]
//! registry, caches the directory document, and owns the nonce pool. A
//! [`login::Login`] binds one account key to a `Session`. Every resource —
//! [`account::Account`], [`order::Order`], [`order::Authorization`],
//! [`order::Challenge`], [`certificate::Certificate`] — holds a `Login`
//! and exposes the operations RFC 8555 defines for it.
//!
//! ```no_run
//! use acmex_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let registry = Registry::default();
//! let session = Arc::new(Session::new(
//!     "acme://letsencrypt.org/staging",
//!     &registry,
//!     NetworkSettings::default(),
//!     None,
//! )?);
//!
//! let key = KeyPair::generate(KeyType::EcdsaP256)?;
//! let signer = key.signer();
//!
//! let (login, _account, _already_existed) = Account::create(
//!     session,
//!     signer,
//!     NewAccountRequest::new().agree_to_terms_of_service(),
//! )
//! .await?;
//! # let _ = login;
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod certificate;
pub mod challenge;
pub mod crypto;
pub mod error;
pub mod jose;
pub mod json;
pub mod login;
pub mod order;
pub mod polling;
pub mod problem;
pub mod provider;
pub mod session;
pub mod transport;
pub mod types;

pub use account::{Account, AccountModification, EabAlgorithm, ExternalAccountBinding, NewAccountRequest};
pub use certificate::{Certificate, CertificateChain, RenewalInfo, RenewalWindow};
pub use crypto::{KeyPair, KeyType, RingSigner, Signer};
pub use error::{AcmeError, Result};
pub use login::Login;
pub use order::{Authorization, Challenge, Order};
pub use polling::{Cancellation, CancellationToken};
pub use problem::{Problem, Subproblem};
pub use provider::{GenericProvider, Provider, Registry};
pub use session::Session;
pub use transport::{Accept, NetworkSettings};
pub use types::{
    AccountStatus, AuthorizationStatus, ChallengeStatus, ChallengeType, Contact, Identifier, OrderStatus,
    RevocationReason,
};

/// Commonly used types, re-exported for a single `use acmex_core::prelude::*;`.
pub mod prelude {
    pub use crate::{
        Account, AccountModification, AcmeError, Authorization, Cancellation, CancellationToken, Certificate,
        CertificateChain, Challenge, ChallengeStatus, ChallengeType, Contact, EabAlgorithm, ExternalAccountBinding,
        Identifier, KeyPair, KeyType, Login, NetworkSettings, NewAccountRequest, Order, OrderStatus, Provider,
        Registry, RenewalInfo, Result, RevocationReason, Session, Signer,
    };
}
