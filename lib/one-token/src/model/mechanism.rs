use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Mechanism {
    RsaPkcsKeyPairGen,
    EcKeyPairGen,
    EcEdwardsKeyPairGen,
    AesKeyGen,
}
