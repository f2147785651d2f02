use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How big-integer attribute bytes relate to their fixed field width on import.
///
/// Some exporters write every integer into a buffer one byte wider than the
/// field, leaving a leading zero "sign" byte. The convention decides whether
/// that byte is required, tolerated or rejected.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaddingConvention {
    /// Fields must be exactly their width.
    Exact,
    /// Fields must be one byte wider than their width, starting with `0x00`.
    SignByte,
    /// Either form; a field of exactly its width is taken as is.
    #[default]
    Lenient,
}

impl PaddingConvention {
    /// Returns the field without padding, or `None` if `value` does not fit `width`.
    pub fn normalize<'a>(&self, value: &'a [u8], width: usize) -> Option<&'a [u8]> {
        let sign_padded = value.len() == width + 1 && value.first() == Some(&0);

        match self {
            Self::Exact => (value.len() == width).then_some(value),
            Self::SignByte => sign_padded.then(|| &value[1..]),
            Self::Lenient if value.len() == width => Some(value),
            Self::Lenient => sign_padded.then(|| &value[1..]),
        }
    }

    /// Variable-length integers lose at most one leading sign byte.
    pub fn strip_sign_byte<'a>(&self, value: &'a [u8]) -> &'a [u8] {
        match self {
            Self::Exact => value,
            Self::SignByte | Self::Lenient => value.strip_prefix(&[0]).unwrap_or(value),
        }
    }
}
