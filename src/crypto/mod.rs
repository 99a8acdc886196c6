//! Cryptographic primitives: key generation/import and the pluggable
//! signing backend used by every signed request.

pub mod keypair;
pub mod signer;

pub use keypair::{KeyPair, KeyType};
pub use signer::{RingSigner, Signer};
