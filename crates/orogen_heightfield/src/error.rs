//! # Heightfield Error Types
//!
//! All errors that can occur in the heightfield subsystem.
//!
//! Errors surface to the immediate caller; there is no retry or silent
//! recovery. The one exception is border seeding during tile
//! generation, where a failed read just leaves the sentinel in place.

use thiserror::Error;

/// Errors that can occur in the heightfield subsystem.
#[derive(Error, Debug)]
pub enum HeightfieldError {
    /// Block size unusable for midpoint displacement.
    #[error("invalid block size {block_size}: must be a power of two")]
    Configuration {
        /// The offending block size.
        block_size: u16,
    },

    /// A tile-local write was addressed outside the tile.
    #[error("local position ({x}, {y}) outside tile of side {side}")]
    OutOfRange {
        /// Local X of the attempted write.
        x: i32,
        /// Local Y of the attempted write.
        y: i32,
        /// Tile side length (samples per axis).
        side: i32,
    },

    /// A read with `generate = false` hit a tile that does not exist.
    #[error("no tile at ({x}, {y}) and generation was not requested")]
    TileNotFound {
        /// Tile X coordinate.
        x: i32,
        /// Tile Y coordinate.
        y: i32,
    },

    /// A diamond or square step found zero valid neighbors to average.
    #[error("no valid seed samples around local ({x}, {y}) at distance {distance}")]
    InsufficientSeed {
        /// Local X of the frontier center.
        x: i32,
        /// Local Y of the frontier center.
        y: i32,
        /// Neighbor distance that was probed.
        distance: i32,
    },

    /// No tile accepted a ground-height write.
    #[error("no tile accepted the write at node ({x}, {y})")]
    WriteFailed {
        /// Node X of the attempted write.
        x: i32,
        /// Node Y of the attempted write.
        y: i32,
    },

    /// Malformed value-generator text.
    #[error("malformed value generator: {0}")]
    Format(String),

    /// Serialized input declared a version outside the supported range.
    #[error("unsupported serialization version {0}")]
    VersionMismatch(u8),

    /// Serialized input is corrupt, or the structure cannot be
    /// represented in the requested format version.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O failure while writing serialized output.
    #[error("i/o failure during serialization")]
    Io(#[from] std::io::Error),
}

/// Result type for heightfield operations.
pub type HeightfieldResult<T> = Result<T, HeightfieldError>;
