//! JOSE layer: JWK representation, flattened-JWS signing, the single-slot
//! nonce pool, and the parsed directory document.

pub mod directory;
pub mod jwk;
pub mod jws;
pub mod nonce;

pub use directory::{Directory, DirectoryMeta};
pub use jwk::Jwk;
pub use nonce::NoncePool;
