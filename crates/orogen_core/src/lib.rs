//! # OROGEN Core
//!
//! Foundation types shared by the heightfield subsystem.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same values
//! 2. **Correct at negatives**: Coordinate math floors, never truncates
//! 3. **Sentinel discipline**: "No value" is a reserved float range,
//!    checked through one predicate, never compared ad hoc
//!
//! ## Core Components
//!
//! - `NodePos` / `TileCoord`: world-node and tile-grid coordinates
//! - `sample`: the `UNSET` sentinel and validity predicate
//! - `FieldSeed` / `TerrainRng` / `SeededRng`: injected randomness

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod coords;
pub mod rng;
pub mod sample;

pub use coords::{NodePos, TileCoord};
pub use rng::{FieldSeed, SeededRng, TerrainRng};
pub use sample::{is_valid, UNSET, VALID_MIN};
