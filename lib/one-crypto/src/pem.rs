//! Decoding of externally generated private keys into raw attribute fields.

use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;

pub use crate::provider::FieldLayout;
use crate::CryptoProviderError;
use crate::model::RsaPrivateComponents;
use crate::provider::rsa_private_components;

/// Decodes a PEM RSA private key, either PKCS#1 (`RSA PRIVATE KEY`) or PKCS#8 (`PRIVATE KEY`).
pub fn decode_rsa_private_key_pem(
    pem: &str,
    layout: FieldLayout,
) -> Result<RsaPrivateComponents, CryptoProviderError> {
    let mut private_key = RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|err| CryptoProviderError::Decoding(err.to_string()))?;

    private_key
        .precompute()
        .map_err(|err| CryptoProviderError::Decoding(err.to_string()))?;

    tracing::debug!(
        modulus_bits = private_key.size() * 8,
        "Decoded RSA private key"
    );

    rsa_private_components(&private_key, layout)
}
