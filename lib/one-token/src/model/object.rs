use one_crypto::model::{
    EllipticCurve, PublicKeyComponents, RsaPrivateComponents, RsaPublicComponents,
};
use secrecy::{ExposeSecret, SecretSlice};

use super::attribute::{Attribute, AttributeType, KeyType, ObjectClass, Template};
use crate::error::TokenError;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct KeyUsage {
    pub sign: bool,
    pub verify: bool,
    pub encrypt: bool,
    pub decrypt: bool,
}

#[derive(Clone, Debug)]
pub enum KeyMaterial {
    RsaPublic {
        modulus_bits: u32,
        components: RsaPublicComponents,
    },
    RsaPrivate {
        modulus_bits: u32,
        components: RsaPrivateComponents,
    },
    EcPublic {
        curve: EllipticCurve,
        point: Vec<u8>,
    },
    EcPrivate {
        curve: EllipticCurve,
        scalar: SecretSlice<u8>,
    },
}

impl KeyMaterial {
    pub fn class(&self) -> ObjectClass {
        match self {
            Self::RsaPublic { .. } | Self::EcPublic { .. } => ObjectClass::PublicKey,
            Self::RsaPrivate { .. } | Self::EcPrivate { .. } => ObjectClass::PrivateKey,
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Self::RsaPublic { .. } | Self::RsaPrivate { .. } => KeyType::Rsa,
            Self::EcPublic { .. } | Self::EcPrivate { .. } => KeyType::Ec,
        }
    }
}

/// Non-material attributes shared by every key object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectAttributes {
    pub label: Vec<u8>,
    pub token: bool,
    pub private: bool,
    pub sensitive: bool,
    pub usage: KeyUsage,
}

impl ObjectAttributes {
    /// Reads the common attributes of a key of `class` from `template`.
    ///
    /// `Private` defaults to true for private keys; `Sensitive` defaults to
    /// `sensitive_by_default` for private keys and is always false for public keys.
    pub fn from_template(
        template: &Template,
        class: ObjectClass,
        sensitive_by_default: bool,
    ) -> Result<Self, TokenError> {
        let is_private_key = class == ObjectClass::PrivateKey;

        let flag = |attribute_type: AttributeType, default: bool| {
            template.flag(attribute_type).unwrap_or(default)
        };

        let attributes = Self {
            label: template
                .bytes(AttributeType::Label)
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            token: flag(AttributeType::Token, false),
            private: flag(AttributeType::Private, is_private_key),
            sensitive: flag(
                AttributeType::Sensitive,
                is_private_key && sensitive_by_default,
            ),
            usage: KeyUsage {
                sign: flag(AttributeType::Sign, false),
                verify: flag(AttributeType::Verify, false),
                encrypt: flag(AttributeType::Encrypt, false),
                decrypt: flag(AttributeType::Decrypt, false),
            },
        };

        attributes.ensure_valid_for(class)?;
        Ok(attributes)
    }

    fn ensure_valid_for(&self, class: ObjectClass) -> Result<(), TokenError> {
        let conflict = match class {
            ObjectClass::PublicKey if self.usage.sign => Some(AttributeType::Sign),
            ObjectClass::PublicKey if self.usage.decrypt => Some(AttributeType::Decrypt),
            ObjectClass::PublicKey if self.sensitive => Some(AttributeType::Sensitive),
            ObjectClass::PrivateKey if self.usage.verify => Some(AttributeType::Verify),
            ObjectClass::PrivateKey if self.usage.encrypt => Some(AttributeType::Encrypt),
            _ => None,
        };

        match conflict {
            Some(attribute_type) => Err(TokenError::AttributeConflict(attribute_type)),
            None => Ok(()),
        }
    }
}

/// A key held by the store. Class, key type and material never change.
#[derive(Clone, Debug)]
pub struct KeyObject {
    attributes: ObjectAttributes,
    material: KeyMaterial,
}

impl KeyObject {
    pub fn new(attributes: ObjectAttributes, material: KeyMaterial) -> Result<Self, TokenError> {
        attributes.ensure_valid_for(material.class())?;
        Ok(Self {
            attributes,
            material,
        })
    }

    pub fn class(&self) -> ObjectClass {
        self.material.class()
    }

    pub fn key_type(&self) -> KeyType {
        self.material.key_type()
    }

    pub fn label(&self) -> &[u8] {
        &self.attributes.label
    }

    pub fn is_token_object(&self) -> bool {
        self.attributes.token
    }

    pub fn attributes(&self) -> &ObjectAttributes {
        &self.attributes
    }

    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Reads one attribute of the object.
    pub fn attribute(&self, attribute_type: AttributeType) -> Result<Attribute, TokenError> {
        let attributes = &self.attributes;
        let class = self.class();
        let invalid = || TokenError::AttributeTypeInvalid(attribute_type);

        let attribute = match attribute_type {
            AttributeType::Class => Attribute::Class(class),
            AttributeType::KeyType => Attribute::KeyType(self.key_type()),
            AttributeType::Label => Attribute::Label(attributes.label.clone()),
            AttributeType::Token => Attribute::Token(attributes.token),
            AttributeType::Private => Attribute::Private(attributes.private),
            AttributeType::Sensitive => Attribute::Sensitive(attributes.sensitive),
            AttributeType::Sign if class == ObjectClass::PrivateKey => {
                Attribute::Sign(attributes.usage.sign)
            }
            AttributeType::Decrypt if class == ObjectClass::PrivateKey => {
                Attribute::Decrypt(attributes.usage.decrypt)
            }
            AttributeType::Verify if class == ObjectClass::PublicKey => {
                Attribute::Verify(attributes.usage.verify)
            }
            AttributeType::Encrypt if class == ObjectClass::PublicKey => {
                Attribute::Encrypt(attributes.usage.encrypt)
            }
            _ => self.material_attribute(attribute_type).ok_or_else(invalid)?,
        };

        if attribute_type.is_private_material() && attributes.sensitive {
            return Err(TokenError::AttributeSensitive(attribute_type));
        }

        Ok(attribute)
    }

    fn material_attribute(&self, attribute_type: AttributeType) -> Option<Attribute> {
        let secret = |value: &SecretSlice<u8>| value.expose_secret().to_vec();

        let attribute = match (&self.material, attribute_type) {
            (
                KeyMaterial::RsaPublic { modulus_bits, .. }
                | KeyMaterial::RsaPrivate { modulus_bits, .. },
                AttributeType::ModulusBits,
            ) => Attribute::ModulusBits(*modulus_bits),
            (KeyMaterial::RsaPublic { components, .. }, AttributeType::Modulus) => {
                Attribute::Modulus(components.modulus.clone())
            }
            (KeyMaterial::RsaPublic { components, .. }, AttributeType::PublicExponent) => {
                Attribute::PublicExponent(components.public_exponent.clone())
            }
            (KeyMaterial::RsaPrivate { components, .. }, attribute_type) => match attribute_type {
                AttributeType::Modulus => Attribute::Modulus(components.modulus.clone()),
                AttributeType::PublicExponent => {
                    Attribute::PublicExponent(components.public_exponent.clone())
                }
                AttributeType::PrivateExponent => {
                    Attribute::PrivateExponent(secret(&components.private_exponent))
                }
                AttributeType::Prime1 => Attribute::Prime1(secret(&components.prime_1)),
                AttributeType::Prime2 => Attribute::Prime2(secret(&components.prime_2)),
                AttributeType::Exponent1 => Attribute::Exponent1(secret(&components.exponent_1)),
                AttributeType::Exponent2 => Attribute::Exponent2(secret(&components.exponent_2)),
                AttributeType::Coefficient => {
                    Attribute::Coefficient(secret(&components.coefficient))
                }
                _ => return None,
            },
            (
                KeyMaterial::EcPublic { curve, .. } | KeyMaterial::EcPrivate { curve, .. },
                AttributeType::EcParams,
            ) => Attribute::EcParams(curve.ec_params().to_vec()),
            (KeyMaterial::EcPublic { point, .. }, AttributeType::EcPoint) => {
                Attribute::EcPoint(point.clone())
            }
            (KeyMaterial::EcPrivate { scalar, .. }, AttributeType::Value) => {
                Attribute::Value(secret(scalar))
            }
            _ => return None,
        };

        Some(attribute)
    }

    /// True if every attribute of `template` is readable and equal on this object.
    pub fn matches(&self, template: &Template) -> bool {
        template.iter().all(|expected| {
            self.attribute(expected.attribute_type())
                .is_ok_and(|actual| &actual == expected)
        })
    }

    /// Changes one modifiable attribute.
    pub fn apply(&mut self, attribute: &Attribute) -> Result<(), TokenError> {
        let mut updated = self.attributes.clone();

        match attribute {
            Attribute::Label(label) => updated.label = label.clone(),
            Attribute::Sign(value) => updated.usage.sign = *value,
            Attribute::Verify(value) => updated.usage.verify = *value,
            Attribute::Encrypt(value) => updated.usage.encrypt = *value,
            Attribute::Decrypt(value) => updated.usage.decrypt = *value,
            Attribute::Sensitive(false) if self.attributes.sensitive => {
                return Err(TokenError::AttributeReadOnly(AttributeType::Sensitive));
            }
            Attribute::Sensitive(value) => updated.sensitive = *value,
            other => return Err(TokenError::AttributeReadOnly(other.attribute_type())),
        }

        updated.ensure_valid_for(self.class())?;
        self.attributes = updated;
        Ok(())
    }

    /// Public key material, for public key objects only.
    pub fn public_key_components(&self) -> Option<PublicKeyComponents> {
        match &self.material {
            KeyMaterial::RsaPublic { components, .. } => {
                Some(PublicKeyComponents::Rsa(components.clone()))
            }
            KeyMaterial::EcPublic { curve, point } => Some(PublicKeyComponents::Ec {
                curve: *curve,
                point: point.clone(),
            }),
            KeyMaterial::RsaPrivate { .. } | KeyMaterial::EcPrivate { .. } => None,
        }
    }
}
