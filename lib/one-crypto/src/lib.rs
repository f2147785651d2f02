//! Cryptographic primitives used by the token object store.
//!
//! Key-pair generation, public key encoding and private key decoding live here so
//! that the store itself only deals with attribute bookkeeping.

pub mod model;
pub mod pem;
pub mod provider;
pub mod utilities;

mod error;

pub use error::CryptoProviderError;
#[cfg(any(test, feature = "mock"))]
pub use provider::MockCryptoProvider;
pub use provider::{CryptoProvider, CryptoProviderImpl};
