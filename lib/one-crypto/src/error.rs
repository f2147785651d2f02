use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoProviderError {
    #[error("Key generation failed: `{0}`")]
    KeyGeneration(String),
    #[error("Unsupported key size: {0} bits")]
    UnsupportedKeySize(usize),
    #[error("Unsupported key: `{0}`")]
    UnsupportedKey(String),
    #[error("Invalid public key: `{0}`")]
    InvalidPublicKey(String),
    #[error("Encoding error: `{0}`")]
    Encoding(String),
    #[error("Decoding error: `{0}`")]
    Decoding(String),
}
