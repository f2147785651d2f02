//! `struct`s and `enum`s describing token objects.

pub mod attribute;
pub mod handle;
pub mod mechanism;
pub mod object;
pub mod padding;

/// Labels under which device TLS credentials are provisioned.
pub mod labels {
    pub const DEVICE_PRIVATE_KEY_FOR_TLS: &[u8] = b"Device Priv TLS Key";
    pub const DEVICE_PUBLIC_KEY_FOR_TLS: &[u8] = b"Device Pub TLS Key";
}
