use p256::elliptic_curve::sec1::ToEncodedPoint;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use secrecy::SecretSlice;

use crate::CryptoProviderError;
use crate::model::{
    EcKeyPair, EllipticCurve, PublicKeyComponents, RsaKeyPair, RsaPrivateComponents,
    RsaPublicComponents,
};
use crate::utilities::{get_rng, to_fixed_width_be};


const RSA_MAX_MODULUS_BITS: usize = 16384;

/// Layout of the fixed-width integer fields produced when exporting RSA private keys.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FieldLayout {
    /// Every field is exactly its nominal width.
    #[default]
    Exact,
    /// Every field carries one extra leading zero byte, as written by exporters
    /// that reserve room for a sign byte.
    SignBytePrefixed,
}

/// Key-pair generation and public key encoding backend.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CryptoProvider: Send + Sync {
    fn generate_rsa_key_pair(
        &self,
        modulus_bits: usize,
        public_exponent: &[u8],
    ) -> Result<RsaKeyPair, CryptoProviderError>;

    fn generate_ec_key_pair(&self, curve: EllipticCurve) -> Result<EcKeyPair, CryptoProviderError>;

    /// Checks that the components form a key [`CryptoProvider::encode_public_key_der`] accepts.
    fn validate_public_key(
        &self,
        public_key: &PublicKeyComponents,
    ) -> Result<(), CryptoProviderError>;

    /// Encodes a public key as a DER SubjectPublicKeyInfo.
    fn encode_public_key_der(
        &self,
        public_key: &PublicKeyComponents,
    ) -> Result<Vec<u8>, CryptoProviderError>;

    /// Decodes a DER SubjectPublicKeyInfo produced by [`CryptoProvider::encode_public_key_der`].
    fn decode_public_key_der(&self, der: &[u8]) -> Result<PublicKeyComponents, CryptoProviderError>;
}

#[derive(Debug, Default, Clone)]
pub struct CryptoProviderImpl;

impl CryptoProviderImpl {
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for CryptoProviderImpl {
    fn generate_rsa_key_pair(
        &self,
        modulus_bits: usize,
        public_exponent: &[u8],
    ) -> Result<RsaKeyPair, CryptoProviderError> {
        if modulus_bits == 0 || modulus_bits % 16 != 0 {
            return Err(CryptoProviderError::UnsupportedKeySize(modulus_bits));
        }

        let exponent = BigUint::from_bytes_be(public_exponent);
        let private_key = RsaPrivateKey::new_with_exp(&mut get_rng(), modulus_bits, &exponent)
            .map_err(|err| CryptoProviderError::KeyGeneration(err.to_string()))?;

        let private = rsa_private_components(&private_key, FieldLayout::Exact)?;
        Ok(RsaKeyPair {
            public: RsaPublicComponents {
                modulus: private.modulus.clone(),
                public_exponent: private.public_exponent.clone(),
            },
            private,
        })
    }

    fn generate_ec_key_pair(&self, curve: EllipticCurve) -> Result<EcKeyPair, CryptoProviderError> {
        match curve {
            EllipticCurve::P256 => {
                let secret_key = p256::SecretKey::random(&mut get_rng());
                let point = secret_key
                    .public_key()
                    .to_encoded_point(false)
                    .as_bytes()
                    .to_vec();

                Ok(EcKeyPair {
                    curve,
                    point,
                    scalar: SecretSlice::from(secret_key.to_bytes().to_vec()),
                })
            }
        }
    }

    fn validate_public_key(
        &self,
        public_key: &PublicKeyComponents,
    ) -> Result<(), CryptoProviderError> {
        match public_key {
            PublicKeyComponents::Rsa(components) => rsa_public_key(components).map(|_| ()),
            PublicKeyComponents::Ec {
                curve: EllipticCurve::P256,
                point,
            } => p256_public_key(point).map(|_| ()),
        }
    }

    fn encode_public_key_der(
        &self,
        public_key: &PublicKeyComponents,
    ) -> Result<Vec<u8>, CryptoProviderError> {
        let document = match public_key {
            PublicKeyComponents::Rsa(components) => {
                rsa_public_key(components)?.to_public_key_der()
            }
            PublicKeyComponents::Ec {
                curve: EllipticCurve::P256,
                point,
            } => p256_public_key(point)?.to_public_key_der(),
        }
        .map_err(|err| CryptoProviderError::Encoding(err.to_string()))?;

        Ok(document.as_bytes().to_vec())
    }

    fn decode_public_key_der(&self, der: &[u8]) -> Result<PublicKeyComponents, CryptoProviderError> {
        if let Ok(public_key) = RsaPublicKey::from_public_key_der(der) {
            return Ok(PublicKeyComponents::Rsa(RsaPublicComponents {
                modulus: public_key.n().to_bytes_be(),
                public_exponent: public_key.e().to_bytes_be(),
            }));
        }

        if let Ok(public_key) = p256::PublicKey::from_public_key_der(der) {
            return Ok(PublicKeyComponents::Ec {
                curve: EllipticCurve::P256,
                point: public_key.to_encoded_point(false).as_bytes().to_vec(),
            });
        }

        Err(CryptoProviderError::Decoding(
            "unsupported SubjectPublicKeyInfo".to_string(),
        ))
    }
}

fn rsa_public_key(components: &RsaPublicComponents) -> Result<RsaPublicKey, CryptoProviderError> {
    RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(&components.modulus),
        BigUint::from_bytes_be(&components.public_exponent),
        RSA_MAX_MODULUS_BITS,
    )
    .map_err(|err| CryptoProviderError::InvalidPublicKey(err.to_string()))
}

fn p256_public_key(point: &[u8]) -> Result<p256::PublicKey, CryptoProviderError> {
    p256::PublicKey::from_sec1_bytes(point)
        .map_err(|_| CryptoProviderError::InvalidPublicKey("point is not on P-256".to_string()))
}

/// Splits an RSA private key into fixed-width attribute fields.
///
/// The modulus and private exponent are as wide as the modulus, primes and CRT
/// values half as wide. The public exponent is minimal.
pub(crate) fn rsa_private_components(
    private_key: &RsaPrivateKey,
    layout: FieldLayout,
) -> Result<RsaPrivateComponents, CryptoProviderError> {
    let width = private_key.size();
    let half_width = width / 2;

    let [prime_1, prime_2] = private_key.primes() else {
        return Err(CryptoProviderError::UnsupportedKey(
            "multi-prime RSA keys are not supported".to_string(),
        ));
    };
    let exponent_1 = private_key
        .dp()
        .ok_or_else(|| CryptoProviderError::Encoding("missing CRT exponent 1".to_string()))?;
    let exponent_2 = private_key
        .dq()
        .ok_or_else(|| CryptoProviderError::Encoding("missing CRT exponent 2".to_string()))?;
    let coefficient = private_key
        .crt_coefficient()
        .ok_or_else(|| CryptoProviderError::Encoding("missing CRT coefficient".to_string()))?;

    let field = |value: &BigUint, width: usize| -> Result<Vec<u8>, CryptoProviderError> {
        let bytes = to_fixed_width_be(value, width)?;
        Ok(apply_layout(bytes, layout))
    };
    let secret_field = |value: &BigUint, width: usize| field(value, width).map(SecretSlice::from);

    Ok(RsaPrivateComponents {
        modulus: field(private_key.n(), width)?,
        public_exponent: apply_layout(private_key.e().to_bytes_be(), layout),
        private_exponent: secret_field(private_key.d(), width)?,
        prime_1: secret_field(prime_1, half_width)?,
        prime_2: secret_field(prime_2, half_width)?,
        exponent_1: secret_field(exponent_1, half_width)?,
        exponent_2: secret_field(exponent_2, half_width)?,
        coefficient: secret_field(&coefficient, half_width)?,
    })
}

fn apply_layout(bytes: Vec<u8>, layout: FieldLayout) -> Vec<u8> {
    match layout {
        FieldLayout::Exact => bytes,
        FieldLayout::SignBytePrefixed => {
            let mut prefixed = Vec::with_capacity(bytes.len() + 1);
            prefixed.push(0);
            prefixed.extend(bytes);
            prefixed
        }
    }
}
