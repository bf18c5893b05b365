//! # OROGEN Heightfield
//!
//! Fractal terrain heightmaps over an unbounded tile map.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same terrain
//! 2. **Tiled**: Heights are generated in fixed-size overlapping tiles
//! 3. **Seamless**: Shared tile borders are written through to neighbors
//! 4. **Durable**: The whole field round-trips a versioned binary format
//!
//! ## Core Components
//!
//! - `HeightTile`: One square grid of samples plus midpoint displacement
//! - `HeightField`: Unbounded tile map with on-demand generation
//! - `ValueGenerator`: Per-tile terrain parameters (base, amplitude, decay)
//! - `FieldConfig`: TOML-backed construction parameters
//!
//! ## Example
//!
//! ```rust,ignore
//! use orogen_core::{FieldSeed, NodePos};
//! use orogen_heightfield::{FieldConfig, HeightField};
//!
//! let config = FieldConfig::from_toml_str(text)?;
//! let mut field = HeightField::from_config(&config)?;
//!
//! // Generates the surrounding tiles on first touch.
//! let h = field.ground_height(NodePos::new(100, 200), true)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod field;
pub mod generator;
pub mod serialize;
pub mod tile;

pub use config::FieldConfig;
pub use error::{HeightfieldError, HeightfieldResult};
pub use field::HeightField;
pub use generator::ValueGenerator;
pub use serialize::{FORMAT_VERSION_HIGHEST, FORMAT_VERSION_LEGACY_MAX, FORMAT_VERSION_LOWEST};
pub use tile::{BorderAccess, HeightTile, NullBorder, SingleTileField};
