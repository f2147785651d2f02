//! Token object store: handle-addressed RSA and EC key objects created by import
//! or on-token generation, with attribute query, update and search.

pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod store;

pub use error::{ErrorCode, TokenError};
pub use session::{Session, Token};
#[cfg(any(test, feature = "mock"))]
pub use store::MockObjectStore;
pub use store::{GeneratedKeyPair, ObjectStore, ObjectStoreImpl};
