//! Errors returned by the token object store.

use one_crypto::CryptoProviderError;
use thiserror::Error;

use crate::model::attribute::{AttributeType, ObjectClass};
use crate::model::handle::ObjectHandle;
use crate::model::mechanism::Mechanism;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Missing required attribute `{0}`")]
    MissingRequiredAttribute(AttributeType),
    #[error("Invalid length {length} of attribute `{attribute}`")]
    InvalidAttributeLength {
        attribute: AttributeType,
        length: usize,
    },
    #[error("Invalid value of attribute `{0}`")]
    InvalidAttributeValue(AttributeType),
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),
    #[error("Unsupported key size: {0} bits")]
    UnsupportedKeySize(u32),
    #[error("Unsupported mechanism `{0}`")]
    UnsupportedMechanism(Mechanism),
    #[error("Invalid curve parameters")]
    InvalidCurveParameters,
    #[error("Conflicting attribute `{0}`")]
    AttributeConflict(AttributeType),
    #[error("Attribute `{0}` is read-only")]
    AttributeReadOnly(AttributeType),
    #[error("Attribute `{0}` is not valid for this object")]
    AttributeTypeInvalid(AttributeType),
    #[error("Attribute `{0}` is sensitive")]
    AttributeSensitive(AttributeType),
    #[error("Label `{0}` already in use")]
    DuplicateLabel(String),
    #[error("Object `{0}` not found")]
    HandleNotFound(ObjectHandle),
    #[error("Object `{handle}` has class `{class}`")]
    WrongObjectClass {
        handle: ObjectHandle,
        class: ObjectClass,
    },
    #[error("Key pair creation failed: {0}")]
    PartialPairFailure(#[source] Box<TokenError>),
    #[error("Crypto provider error: `{0}`")]
    PrimitiveFailure(#[from] CryptoProviderError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Attribute001,
    Attribute002,
    Attribute003,
    Attribute004,
    Attribute005,
    Attribute006,
    Attribute007,

    Key001,
    Key002,
    Key003,

    Mechanism001,

    Object001,
    Object002,
    Object003,
    Object004,

    Crypto001,
}

impl ErrorCode {
    pub const fn msg(&self) -> &'static str {
        match self {
            ErrorCode::Attribute001 => "Required attribute missing",
            ErrorCode::Attribute002 => "Attribute has invalid length",
            ErrorCode::Attribute003 => "Attribute has invalid value",
            ErrorCode::Attribute004 => "Conflicting attributes",
            ErrorCode::Attribute005 => "Attribute is read-only",
            ErrorCode::Attribute006 => "Attribute not valid for object",
            ErrorCode::Attribute007 => "Attribute is sensitive",

            ErrorCode::Key001 => "Unsupported key type",
            ErrorCode::Key002 => "Unsupported key size",
            ErrorCode::Key003 => "Invalid curve parameters",

            ErrorCode::Mechanism001 => "Unsupported mechanism",

            ErrorCode::Object001 => "Object not found",
            ErrorCode::Object002 => "Wrong object class",
            ErrorCode::Object003 => "Label already in use",
            ErrorCode::Object004 => "Key pair creation failed",

            ErrorCode::Crypto001 => "Crypto provider failure",
        }
    }
}

impl TokenError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            TokenError::MissingRequiredAttribute(_) => ErrorCode::Attribute001,
            TokenError::InvalidAttributeLength { .. } => ErrorCode::Attribute002,
            TokenError::InvalidAttributeValue(_) => ErrorCode::Attribute003,
            TokenError::AttributeConflict(_) => ErrorCode::Attribute004,
            TokenError::AttributeReadOnly(_) => ErrorCode::Attribute005,
            TokenError::AttributeTypeInvalid(_) => ErrorCode::Attribute006,
            TokenError::AttributeSensitive(_) => ErrorCode::Attribute007,

            TokenError::UnsupportedKeyType(_) => ErrorCode::Key001,
            TokenError::UnsupportedKeySize(_) => ErrorCode::Key002,
            TokenError::InvalidCurveParameters => ErrorCode::Key003,

            TokenError::UnsupportedMechanism(_) => ErrorCode::Mechanism001,

            TokenError::HandleNotFound(_) => ErrorCode::Object001,
            TokenError::WrongObjectClass { .. } => ErrorCode::Object002,
            TokenError::DuplicateLabel(_) => ErrorCode::Object003,
            TokenError::PartialPairFailure(_) => ErrorCode::Object004,

            TokenError::PrimitiveFailure(_) => ErrorCode::Crypto001,
        }
    }
}
