//! Turns attribute templates into key objects.
//!
//! Imported and generated material go through the same builders, so a
//! generated key is held to exactly the field widths an import would be.

use one_crypto::model::{EllipticCurve, RsaPrivateComponents, RsaPublicComponents};
use secrecy::SecretSlice;

use crate::config::StoreConfig;
use crate::error::TokenError;
use crate::model::attribute::{Attribute, AttributeType, KeyType, ObjectClass, Template};
use crate::model::mechanism::Mechanism;
use crate::model::object::{KeyMaterial, KeyObject, ObjectAttributes};
use crate::model::padding::PaddingConvention;

const MAX_PUBLIC_EXPONENT_LEN: usize = 8;

/// Material attributes an object of the given class and key type may carry.
fn material_attributes(class: ObjectClass, key_type: KeyType) -> &'static [AttributeType] {
    match (class, key_type) {
        (ObjectClass::PublicKey, KeyType::Rsa) => &[
            AttributeType::ModulusBits,
            AttributeType::Modulus,
            AttributeType::PublicExponent,
        ],
        (ObjectClass::PrivateKey, KeyType::Rsa) => &[
            AttributeType::ModulusBits,
            AttributeType::Modulus,
            AttributeType::PublicExponent,
            AttributeType::PrivateExponent,
            AttributeType::Prime1,
            AttributeType::Prime2,
            AttributeType::Exponent1,
            AttributeType::Exponent2,
            AttributeType::Coefficient,
        ],
        (ObjectClass::PublicKey, KeyType::Ec) => &[AttributeType::EcParams, AttributeType::EcPoint],
        (ObjectClass::PrivateKey, KeyType::Ec) => &[AttributeType::EcParams, AttributeType::Value],
        (ObjectClass::SecretKey, _) => &[],
    }
}

fn ensure_only_material(template: &Template, allowed: &[AttributeType]) -> Result<(), TokenError> {
    let foreign = template
        .iter()
        .map(Attribute::attribute_type)
        .find(|attribute_type| attribute_type.is_key_material() && !allowed.contains(attribute_type));

    match foreign {
        Some(attribute_type) => Err(TokenError::AttributeConflict(attribute_type)),
        None => Ok(()),
    }
}

fn required(template: &Template, attribute_type: AttributeType) -> Result<&[u8], TokenError> {
    template
        .bytes(attribute_type)
        .ok_or(TokenError::MissingRequiredAttribute(attribute_type))
}

fn fixed_width<'a>(
    value: &'a [u8],
    width: usize,
    attribute: AttributeType,
    padding: PaddingConvention,
) -> Result<&'a [u8], TokenError> {
    padding
        .normalize(value, width)
        .ok_or(TokenError::InvalidAttributeLength {
            attribute,
            length: value.len(),
        })
}

/// Builds a key object from an import template.
pub(crate) fn import_object(
    template: &Template,
    padding: PaddingConvention,
    config: &StoreConfig,
) -> Result<KeyObject, TokenError> {
    template.ensure_consistent()?;

    let class = template
        .class()
        .ok_or(TokenError::MissingRequiredAttribute(AttributeType::Class))?;
    let key_type = template
        .key_type()
        .ok_or(TokenError::MissingRequiredAttribute(AttributeType::KeyType))?;

    if class == ObjectClass::SecretKey {
        return Err(TokenError::UnsupportedKeyType(format!("{key_type} {class}")));
    }

    ensure_only_material(template, material_attributes(class, key_type))?;

    let material = match (class, key_type) {
        (ObjectClass::PublicKey, KeyType::Rsa) => rsa_public_material(
            required(template, AttributeType::Modulus)?,
            required(template, AttributeType::PublicExponent)?,
            template.modulus_bits(),
            padding,
            config,
        )?,
        (ObjectClass::PrivateKey, KeyType::Rsa) => rsa_private_material(
            &RsaFields {
                modulus: required(template, AttributeType::Modulus)?,
                public_exponent: required(template, AttributeType::PublicExponent)?,
                private_exponent: required(template, AttributeType::PrivateExponent)?,
                prime_1: required(template, AttributeType::Prime1)?,
                prime_2: required(template, AttributeType::Prime2)?,
                exponent_1: required(template, AttributeType::Exponent1)?,
                exponent_2: required(template, AttributeType::Exponent2)?,
                coefficient: required(template, AttributeType::Coefficient)?,
            },
            template.modulus_bits(),
            padding,
            config,
        )?,
        (ObjectClass::PublicKey, KeyType::Ec) => ec_public_material(
            required(template, AttributeType::EcParams)?,
            required(template, AttributeType::EcPoint)?,
            config,
        )?,
        (ObjectClass::PrivateKey, KeyType::Ec) => ec_private_material(
            required(template, AttributeType::EcParams)?,
            required(template, AttributeType::Value)?,
            padding,
            config,
        )?,
        (ObjectClass::SecretKey, _) => {
            return Err(TokenError::UnsupportedKeyType(format!("{key_type} {class}")));
        }
    };

    let attributes = ObjectAttributes::from_template(template, class, false)?;
    KeyObject::new(attributes, material)
}

/// Raw RSA private key fields as supplied by a template or the crypto provider.
pub(crate) struct RsaFields<'a> {
    pub modulus: &'a [u8],
    pub public_exponent: &'a [u8],
    pub private_exponent: &'a [u8],
    pub prime_1: &'a [u8],
    pub prime_2: &'a [u8],
    pub exponent_1: &'a [u8],
    pub exponent_2: &'a [u8],
    pub coefficient: &'a [u8],
}

/// Resolves the key size and returns the modulus without padding.
fn rsa_modulus<'a>(
    modulus: &'a [u8],
    declared_bits: Option<u32>,
    padding: PaddingConvention,
    config: &StoreConfig,
) -> Result<(u32, &'a [u8]), TokenError> {
    let (bits, normalized) = match declared_bits {
        Some(bits) if !config.is_allowed_modulus_bits(bits) => {
            return Err(TokenError::UnsupportedKeySize(bits));
        }
        Some(bits) => (
            bits,
            fixed_width(modulus, bits as usize / 8, AttributeType::Modulus, padding)?,
        ),
        None => config
            .rsa_modulus_bits
            .iter()
            .find_map(|bits| {
                padding
                    .normalize(modulus, *bits as usize / 8)
                    .map(|normalized| (*bits, normalized))
            })
            .ok_or(TokenError::InvalidAttributeLength {
                attribute: AttributeType::Modulus,
                length: modulus.len(),
            })?,
    };

    if normalized.first() == Some(&0) {
        return Err(TokenError::InvalidAttributeValue(AttributeType::Modulus));
    }

    Ok((bits, normalized))
}

fn rsa_public_exponent(
    public_exponent: &[u8],
    padding: PaddingConvention,
) -> Result<Vec<u8>, TokenError> {
    let stripped = padding.strip_sign_byte(public_exponent);
    if stripped.is_empty() || stripped[0] == 0 || stripped.len() > MAX_PUBLIC_EXPONENT_LEN {
        return Err(TokenError::InvalidAttributeLength {
            attribute: AttributeType::PublicExponent,
            length: public_exponent.len(),
        });
    }

    Ok(stripped.to_vec())
}

pub(crate) fn rsa_public_material(
    modulus: &[u8],
    public_exponent: &[u8],
    declared_bits: Option<u32>,
    padding: PaddingConvention,
    config: &StoreConfig,
) -> Result<KeyMaterial, TokenError> {
    let (modulus_bits, modulus) = rsa_modulus(modulus, declared_bits, padding, config)?;

    Ok(KeyMaterial::RsaPublic {
        modulus_bits,
        components: RsaPublicComponents {
            modulus: modulus.to_vec(),
            public_exponent: rsa_public_exponent(public_exponent, padding)?,
        },
    })
}

pub(crate) fn rsa_private_material(
    fields: &RsaFields<'_>,
    declared_bits: Option<u32>,
    padding: PaddingConvention,
    config: &StoreConfig,
) -> Result<KeyMaterial, TokenError> {
    let (modulus_bits, modulus) = rsa_modulus(fields.modulus, declared_bits, padding, config)?;
    let width = modulus_bits as usize / 8;
    let half_width = width / 2;

    let secret = |value: &[u8], width: usize, attribute: AttributeType| {
        fixed_width(value, width, attribute, padding).map(|value| SecretSlice::from(value.to_vec()))
    };

    let components = RsaPrivateComponents {
        modulus: modulus.to_vec(),
        public_exponent: rsa_public_exponent(fields.public_exponent, padding)?,
        private_exponent: secret(fields.private_exponent, width, AttributeType::PrivateExponent)?,
        prime_1: secret(fields.prime_1, half_width, AttributeType::Prime1)?,
        prime_2: secret(fields.prime_2, half_width, AttributeType::Prime2)?,
        exponent_1: secret(fields.exponent_1, half_width, AttributeType::Exponent1)?,
        exponent_2: secret(fields.exponent_2, half_width, AttributeType::Exponent2)?,
        coefficient: secret(fields.coefficient, half_width, AttributeType::Coefficient)?,
    };

    Ok(KeyMaterial::RsaPrivate {
        modulus_bits,
        components,
    })
}

fn curve(ec_params: &[u8], config: &StoreConfig) -> Result<EllipticCurve, TokenError> {
    EllipticCurve::from_ec_params(ec_params)
        .filter(|curve| config.is_allowed_curve(*curve))
        .ok_or(TokenError::InvalidCurveParameters)
}

pub(crate) fn ec_public_material(
    ec_params: &[u8],
    point: &[u8],
    config: &StoreConfig,
) -> Result<KeyMaterial, TokenError> {
    let curve = curve(ec_params, config)?;

    if point.len() != curve.point_len() {
        return Err(TokenError::InvalidAttributeLength {
            attribute: AttributeType::EcPoint,
            length: point.len(),
        });
    }
    if point.first() != Some(&0x04) {
        return Err(TokenError::InvalidAttributeValue(AttributeType::EcPoint));
    }

    Ok(KeyMaterial::EcPublic {
        curve,
        point: point.to_vec(),
    })
}

pub(crate) fn ec_private_material(
    ec_params: &[u8],
    scalar: &[u8],
    padding: PaddingConvention,
    config: &StoreConfig,
) -> Result<KeyMaterial, TokenError> {
    let curve = curve(ec_params, config)?;

    let scalar = fixed_width(scalar, curve.scalar_len(), AttributeType::Value, padding)?;
    if scalar.iter().all(|byte| *byte == 0) {
        return Err(TokenError::InvalidAttributeValue(AttributeType::Value));
    }

    Ok(KeyMaterial::EcPrivate {
        curve,
        scalar: SecretSlice::from(scalar.to_vec()),
    })
}

/// Validated key-pair generation parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum KeyPairRequest {
    Rsa {
        modulus_bits: u32,
        public_exponent: Vec<u8>,
    },
    Ec {
        curve: EllipticCurve,
    },
}

/// Common attributes of both halves of a key pair to generate.
#[derive(Clone, Debug)]
pub(crate) struct KeyPairAttributes {
    pub public: ObjectAttributes,
    pub private: ObjectAttributes,
}

fn ensure_generation_template(
    template: &Template,
    class: ObjectClass,
    key_type: KeyType,
    parameters: &[AttributeType],
) -> Result<(), TokenError> {
    template.ensure_consistent()?;

    if template.class().is_some_and(|value| value != class) {
        return Err(TokenError::AttributeConflict(AttributeType::Class));
    }
    if template.key_type().is_some_and(|value| value != key_type) {
        return Err(TokenError::AttributeConflict(AttributeType::KeyType));
    }

    ensure_only_material(template, parameters)
}

/// Checks both templates of a key-pair request against the mechanism.
pub(crate) fn key_pair_request(
    mechanism: Mechanism,
    public_template: &Template,
    private_template: &Template,
    config: &StoreConfig,
) -> Result<(KeyPairRequest, KeyPairAttributes), TokenError> {
    let request = match mechanism {
        Mechanism::RsaPkcsKeyPairGen => {
            ensure_generation_template(
                public_template,
                ObjectClass::PublicKey,
                KeyType::Rsa,
                &[AttributeType::ModulusBits, AttributeType::PublicExponent],
            )?;
            ensure_generation_template(
                private_template,
                ObjectClass::PrivateKey,
                KeyType::Rsa,
                &[AttributeType::ModulusBits],
            )?;

            let modulus_bits = public_template
                .modulus_bits()
                .ok_or(TokenError::MissingRequiredAttribute(AttributeType::ModulusBits))?;
            if !config.is_allowed_modulus_bits(modulus_bits) {
                return Err(TokenError::UnsupportedKeySize(modulus_bits));
            }
            if private_template
                .modulus_bits()
                .is_some_and(|bits| bits != modulus_bits)
            {
                return Err(TokenError::AttributeConflict(AttributeType::ModulusBits));
            }

            let public_exponent = match public_template.bytes(AttributeType::PublicExponent) {
                Some(public_exponent) => {
                    rsa_public_exponent(public_exponent, PaddingConvention::Lenient)?
                }
                None => config.rsa_public_exponent.clone(),
            };

            KeyPairRequest::Rsa {
                modulus_bits,
                public_exponent,
            }
        }
        Mechanism::EcKeyPairGen => {
            ensure_generation_template(
                public_template,
                ObjectClass::PublicKey,
                KeyType::Ec,
                &[AttributeType::EcParams],
            )?;
            ensure_generation_template(
                private_template,
                ObjectClass::PrivateKey,
                KeyType::Ec,
                &[AttributeType::EcParams],
            )?;

            let ec_params = required(public_template, AttributeType::EcParams)?;
            if private_template
                .bytes(AttributeType::EcParams)
                .is_some_and(|value| value != ec_params)
            {
                return Err(TokenError::AttributeConflict(AttributeType::EcParams));
            }

            KeyPairRequest::Ec {
                curve: curve(ec_params, config)?,
            }
        }
        Mechanism::EcEdwardsKeyPairGen | Mechanism::AesKeyGen => {
            return Err(TokenError::UnsupportedMechanism(mechanism));
        }
    };

    let attributes = KeyPairAttributes {
        public: ObjectAttributes::from_template(public_template, ObjectClass::PublicKey, false)?,
        private: ObjectAttributes::from_template(private_template, ObjectClass::PrivateKey, true)?,
    };

    Ok((request, attributes))
}
