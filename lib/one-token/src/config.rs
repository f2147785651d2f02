use std::path::Path;

use figment::Figment;
#[cfg(feature = "config_env")]
use figment::providers::Env;
#[cfg(feature = "config_json")]
use figment::providers::Json;
#[cfg(feature = "config_yaml")]
use figment::providers::Yaml;
use figment::providers::{Data, Format};
use one_crypto::model::EllipticCurve;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::padding::PaddingConvention;


#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parsing error: `{0}`")]
    Parsing(String),
    #[error("Config validation error: `{0}`")]
    Validation(String),
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Convention applied by plain imports.
    pub padding: PaddingConvention,
    /// Reject a non-empty label already used by another object of the same class.
    pub unique_labels: bool,
    pub rsa_modulus_bits: Vec<u32>,
    /// Used when a key-pair request carries no public exponent.
    #[serde(with = "hex::serde")]
    pub rsa_public_exponent: Vec<u8>,
    pub curves: Vec<EllipticCurve>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            padding: PaddingConvention::default(),
            unique_labels: true,
            rsa_modulus_bits: vec![2048, 3072, 4096],
            rsa_public_exponent: vec![0x01, 0x00, 0x01],
            curves: vec![EllipticCurve::P256],
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rsa_modulus_bits.is_empty() {
            return Err(ConfigError::Validation(
                "at least one RSA modulus size required".to_string(),
            ));
        }

        if let Some(bits) = self
            .rsa_modulus_bits
            .iter()
            .find(|bits| **bits < 512 || **bits % 16 != 0)
        {
            return Err(ConfigError::Validation(format!(
                "invalid RSA modulus size {bits}"
            )));
        }

        let exponent = &self.rsa_public_exponent;
        let is_odd = exponent.last().is_some_and(|byte| byte & 1 == 1);
        if !is_odd || exponent.len() > 8 || exponent[0] == 0 {
            return Err(ConfigError::Validation(format!(
                "invalid RSA public exponent {}",
                hex::encode(exponent)
            )));
        }

        Ok(())
    }

    pub fn is_allowed_modulus_bits(&self, bits: u32) -> bool {
        self.rsa_modulus_bits.contains(&bits)
    }

    pub fn is_allowed_curve(&self, curve: EllipticCurve) -> bool {
        self.curves.contains(&curve)
    }
}

pub enum InputFormat {
    #[cfg(feature = "config_yaml")]
    Yaml(Data<Yaml>),
    #[cfg(feature = "config_json")]
    Json(Data<Json>),
}

impl InputFormat {
    #[cfg(feature = "config_yaml")]
    pub fn yaml_file(p: impl AsRef<Path>) -> InputFormat {
        InputFormat::Yaml(Yaml::file(p))
    }

    #[cfg(feature = "config_yaml")]
    pub fn yaml_str(s: impl AsRef<str>) -> InputFormat {
        InputFormat::Yaml(Yaml::string(s.as_ref()))
    }

    #[cfg(feature = "config_json")]
    pub fn json_file(p: impl AsRef<Path>) -> InputFormat {
        InputFormat::Json(Json::file(p))
    }

    #[cfg(feature = "config_json")]
    pub fn json_str(s: impl AsRef<str>) -> InputFormat {
        InputFormat::Json(Json::string(s.as_ref()))
    }
}

impl TokenConfig {
    pub fn from_files(files: &[impl AsRef<Path>]) -> Result<Self, ConfigError> {
        let mut inputs: Vec<InputFormat> = Vec::with_capacity(files.len());

        for path in files {
            #[cfg(feature = "config_yaml")]
            if path
                .as_ref()
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
            {
                inputs.push(InputFormat::yaml_file(path));
                continue;
            }

            #[cfg(feature = "config_json")]
            if path.as_ref().extension() == Some("json".as_ref()) {
                inputs.push(InputFormat::json_file(path));
                continue;
            }

            return Err(ConfigError::Parsing(format!(
                "Unsupported file or missing file extension: {:?}",
                path.as_ref().to_str()
            )));
        }

        TokenConfig::parse(inputs)
    }

    #[cfg(feature = "config_yaml")]
    pub fn from_yaml(
        configs: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ConfigError> {
        let inputs = configs.into_iter().map(InputFormat::yaml_str);

        TokenConfig::parse(inputs)
    }

    /// Merges `inputs` in order, then `TOKEN_`-prefixed environment variables.
    pub fn parse(inputs: impl IntoIterator<Item = InputFormat>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();

        for data in inputs {
            figment = match data {
                #[cfg(feature = "config_yaml")]
                InputFormat::Yaml(content) => figment.merge(content),
                #[cfg(feature = "config_json")]
                InputFormat::Json(content) => figment.merge(content),
            };
        }

        #[cfg(feature = "config_env")]
        {
            figment = figment.merge(Env::prefixed("TOKEN_").split("__").lowercase(false));
        }

        let config = figment
            .extract::<TokenConfig>()
            .map_err(|e| ConfigError::Parsing(e.to_string()))?;
        config.store.validate()?;

        Ok(config)
    }
}
