use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants, EnumString};

use crate::error::TokenError;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectClass {
    PublicKey,
    PrivateKey,
    SecretKey,
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyType {
    Rsa,
    Ec,
}

/// A single typed attribute value.
///
/// Integers are unsigned big-endian byte strings. `EcParams` carries the
/// DER-encoded curve OID, `EcPoint` the raw uncompressed SEC1 point and
/// `Value` the EC private scalar.
#[derive(Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(AttributeType), derive(Hash, Display, PartialOrd, Ord))]
pub enum Attribute {
    Class(ObjectClass),
    KeyType(KeyType),
    Label(Vec<u8>),
    Token(bool),
    Private(bool),
    Sensitive(bool),
    Sign(bool),
    Verify(bool),
    Encrypt(bool),
    Decrypt(bool),
    ModulusBits(u32),
    Modulus(Vec<u8>),
    PublicExponent(Vec<u8>),
    PrivateExponent(Vec<u8>),
    Prime1(Vec<u8>),
    Prime2(Vec<u8>),
    Exponent1(Vec<u8>),
    Exponent2(Vec<u8>),
    Coefficient(Vec<u8>),
    EcParams(Vec<u8>),
    EcPoint(Vec<u8>),
    Value(Vec<u8>),
}

impl Attribute {
    pub fn attribute_type(&self) -> AttributeType {
        AttributeType::from(self)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Label(value)
            | Self::Modulus(value)
            | Self::PublicExponent(value)
            | Self::PrivateExponent(value)
            | Self::Prime1(value)
            | Self::Prime2(value)
            | Self::Exponent1(value)
            | Self::Exponent2(value)
            | Self::Coefficient(value)
            | Self::EcParams(value)
            | Self::EcPoint(value)
            | Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Token(value)
            | Self::Private(value)
            | Self::Sensitive(value)
            | Self::Sign(value)
            | Self::Verify(value)
            | Self::Encrypt(value)
            | Self::Decrypt(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attribute_type = self.attribute_type();
        if attribute_type.is_private_material() {
            return write!(f, "{attribute_type}([REDACTED])");
        }

        match self {
            Self::Class(class) => write!(f, "Class({class})"),
            Self::KeyType(key_type) => write!(f, "KeyType({key_type})"),
            Self::Label(label) => write!(f, "Label({:?})", String::from_utf8_lossy(label)),
            Self::ModulusBits(bits) => write!(f, "ModulusBits({bits})"),
            other => match (other.as_bool(), other.as_bytes()) {
                (Some(value), _) => write!(f, "{attribute_type}({value})"),
                (_, Some(bytes)) => write!(f, "{attribute_type}({})", hex::encode(bytes)),
                _ => write!(f, "{attribute_type}"),
            },
        }
    }
}

impl AttributeType {
    /// Attributes carrying key material or domain parameters.
    pub fn is_key_material(&self) -> bool {
        matches!(
            self,
            Self::Modulus
                | Self::PublicExponent
                | Self::EcParams
                | Self::EcPoint
                | Self::ModulusBits
        ) || self.is_private_material()
    }

    /// Attributes that are never revealed for sensitive objects.
    pub fn is_private_material(&self) -> bool {
        matches!(
            self,
            Self::PrivateExponent
                | Self::Prime1
                | Self::Prime2
                | Self::Exponent1
                | Self::Exponent2
                | Self::Coefficient
                | Self::Value
        )
    }

    /// Attributes that may change after the object has been created.
    pub fn is_modifiable(&self) -> bool {
        matches!(
            self,
            Self::Label | Self::Sensitive | Self::Sign | Self::Verify | Self::Encrypt | Self::Decrypt
        )
    }
}

/// Ordered attribute list describing an object to create or to search for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Template(Vec<Attribute>);

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: Attribute) -> Self {
        self.0.push(attribute);
        self
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.0.push(attribute);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, attribute_type: AttributeType) -> bool {
        self.get(attribute_type).is_some()
    }

    pub fn get(&self, attribute_type: AttributeType) -> Option<&Attribute> {
        self.0
            .iter()
            .find(|attribute| attribute.attribute_type() == attribute_type)
    }

    pub fn bytes(&self, attribute_type: AttributeType) -> Option<&[u8]> {
        self.get(attribute_type).and_then(Attribute::as_bytes)
    }

    pub fn flag(&self, attribute_type: AttributeType) -> Option<bool> {
        self.get(attribute_type).and_then(Attribute::as_bool)
    }

    pub fn class(&self) -> Option<ObjectClass> {
        match self.get(AttributeType::Class) {
            Some(Attribute::Class(class)) => Some(*class),
            _ => None,
        }
    }

    pub fn key_type(&self) -> Option<KeyType> {
        match self.get(AttributeType::KeyType) {
            Some(Attribute::KeyType(key_type)) => Some(*key_type),
            _ => None,
        }
    }

    pub fn modulus_bits(&self) -> Option<u32> {
        match self.get(AttributeType::ModulusBits) {
            Some(Attribute::ModulusBits(bits)) => Some(*bits),
            _ => None,
        }
    }

    /// Fails if an attribute type is given twice with different values.
    pub fn ensure_consistent(&self) -> Result<(), TokenError> {
        for (index, attribute) in self.0.iter().enumerate() {
            let conflicting = self.0[index + 1..].iter().any(|other| {
                other.attribute_type() == attribute.attribute_type() && other != attribute
            });
            if conflicting {
                return Err(TokenError::AttributeConflict(attribute.attribute_type()));
            }
        }

        Ok(())
    }
}

impl From<Vec<Attribute>> for Template {
    fn from(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }
}

impl FromIterator<Attribute> for Template {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Template {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
