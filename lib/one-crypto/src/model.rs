//! Raw key material exchanged with the crypto provider.
//!
//! All integers are unsigned big-endian byte strings.

use secrecy::SecretSlice;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// DER encoding of the `prime256v1` named-curve OID (1.2.840.10045.3.1.7).
pub const P256_EC_PARAMS: [u8; 10] = [0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum EllipticCurve {
    #[serde(rename = "P256")]
    #[strum(serialize = "P256")]
    P256,
}

impl EllipticCurve {
    pub const fn oid(&self) -> &'static str {
        match self {
            Self::P256 => "1.2.840.10045.3.1.7",
        }
    }

    /// DER-encoded OID, as carried by the EC parameters attribute.
    pub const fn ec_params(&self) -> &'static [u8] {
        match self {
            Self::P256 => &P256_EC_PARAMS,
        }
    }

    pub fn from_ec_params(ec_params: &[u8]) -> Option<Self> {
        [Self::P256]
            .into_iter()
            .find(|curve| curve.ec_params() == ec_params)
    }

    pub const fn scalar_len(&self) -> usize {
        match self {
            Self::P256 => 32,
        }
    }

    /// Length of an uncompressed SEC1 point (`0x04 || x || y`).
    pub const fn point_len(&self) -> usize {
        1 + 2 * self.scalar_len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsaPublicComponents {
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct RsaPrivateComponents {
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
    pub private_exponent: SecretSlice<u8>,
    pub prime_1: SecretSlice<u8>,
    pub prime_2: SecretSlice<u8>,
    pub exponent_1: SecretSlice<u8>,
    pub exponent_2: SecretSlice<u8>,
    pub coefficient: SecretSlice<u8>,
}

#[derive(Clone, Debug)]
pub struct RsaKeyPair {
    pub public: RsaPublicComponents,
    pub private: RsaPrivateComponents,
}

#[derive(Clone, Debug)]
pub struct EcKeyPair {
    pub curve: EllipticCurve,
    /// Uncompressed SEC1 point.
    pub point: Vec<u8>,
    pub scalar: SecretSlice<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKeyComponents {
    Rsa(RsaPublicComponents),
    Ec {
        curve: EllipticCurve,
        point: Vec<u8>,
    },
}
