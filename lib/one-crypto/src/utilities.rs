use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rsa::BigUint;

use crate::CryptoProviderError;

pub fn get_rng() -> impl RngCore + CryptoRng {
    ChaCha20Rng::from_entropy()
}

/// Serializes `value` as big-endian bytes left-padded with zeros to exactly `width` bytes.
pub fn to_fixed_width_be(value: &BigUint, width: usize) -> Result<Vec<u8>, CryptoProviderError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > width {
        return Err(CryptoProviderError::Encoding(format!(
            "integer of {} bytes does not fit into {width} bytes",
            bytes.len()
        )));
    }

    let mut result = vec![0u8; width - bytes.len()];
    result.extend_from_slice(&bytes);
    Ok(result)
}
