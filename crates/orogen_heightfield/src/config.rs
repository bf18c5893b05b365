//! # Field Configuration
//!
//! TOML-backed configuration for constructing a [`HeightField`].
//! Generators use the same tagged form as their serde representation:
//!
//! ```toml
//! block_size = 64
//! seed = 883
//!
//! [base]
//! kind = "constant"
//! value = 10.0
//!
//! [rand_max]
//! kind = "linear"
//! height = 40.0
//! slope_x = 0.1
//! slope_y = 0.1
//!
//! [rand_factor]
//! kind = "constant"
//! value = 0.5
//! ```

use orogen_core::FieldSeed;
use serde::{Deserialize, Serialize};

use crate::error::{HeightfieldError, HeightfieldResult};
use crate::field::HeightField;
use crate::generator::ValueGenerator;

/// Everything needed to construct a fresh [`HeightField`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Tile side length in nodes; must be a power of two.
    pub block_size: u16,
    /// Seed for the deterministic random stream.
    pub seed: u64,
    /// Base terrain height per tile coordinate.
    pub base: ValueGenerator,
    /// Initial noise amplitude per tile coordinate.
    pub rand_max: ValueGenerator,
    /// Amplitude decay factor per tile coordinate.
    pub rand_factor: ValueGenerator,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            block_size: 64,
            seed: FieldSeed::default().value(),
            base: ValueGenerator::Constant { value: 0.0 },
            rand_max: ValueGenerator::Constant { value: 20.0 },
            rand_factor: ValueGenerator::Constant { value: 0.5 },
        }
    }
}

impl FieldConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`HeightfieldError::InvalidConfig`] on malformed TOML or
    /// unknown generator kinds.
    pub fn from_toml_str(text: &str) -> HeightfieldResult<Self> {
        toml::from_str(text).map_err(|e| HeightfieldError::InvalidConfig(e.to_string()))
    }
}

impl HeightField {
    /// Constructs an empty field from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HeightfieldError::Configuration`] when the configured
    /// block size is not a power of two.
    pub fn from_config(config: &FieldConfig) -> HeightfieldResult<Self> {
        Self::new(
            config.block_size,
            FieldSeed::new(config.seed),
            config.base.clone(),
            config.rand_max.clone(),
            config.rand_factor.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let config = FieldConfig::from_toml_str(
            r#"
            block_size = 32
            seed = 883

            [base]
            kind = "constant"
            value = 10.0

            [rand_max]
            kind = "linear"
            height = 40.0
            slope_x = 0.1
            slope_y = 0.1

            [rand_factor]
            kind = "constant"
            value = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.block_size, 32);
        assert_eq!(config.seed, 883);
        assert_eq!(
            config.rand_max,
            ValueGenerator::Linear {
                height: 40.0,
                slope_x: 0.1,
                slope_y: 0.1,
            }
        );
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = FieldConfig::from_toml_str("block_size = 16").unwrap();
        assert_eq!(config.block_size, 16);
        assert_eq!(config.rand_factor, FieldConfig::default().rand_factor);
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(matches!(
            FieldConfig::from_toml_str("block_size = ["),
            Err(HeightfieldError::InvalidConfig(_))
        ));
        assert!(matches!(
            FieldConfig::from_toml_str("[base]\nkind = \"perlin\"\nvalue = 1.0"),
            Err(HeightfieldError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_field_from_config() {
        let config = FieldConfig {
            block_size: 8,
            ..FieldConfig::default()
        };
        let field = HeightField::from_config(&config).unwrap();
        assert_eq!(field.block_size(), 8);
        assert_eq!(field.tile_count(), 0);
    }

    #[test]
    fn test_field_from_config_rejects_bad_block_size() {
        let config = FieldConfig {
            block_size: 12,
            ..FieldConfig::default()
        };
        assert!(matches!(
            HeightField::from_config(&config),
            Err(HeightfieldError::Configuration { block_size: 12 })
        ));
    }
}
