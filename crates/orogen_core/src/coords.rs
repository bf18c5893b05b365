//! # Coordinate Types
//!
//! Two integer grids exist in the heightfield:
//!
//! - **Node coordinates**: individual height samples in the world.
//! - **Tile coordinates**: square tiles spaced `block_size` nodes apart.
//!
//! Conversion floors toward negative infinity (`div_euclid`), so node
//! -1 with `block_size` 16 lands in tile -1, not tile 0.

/// A world node position (one height sample).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePos {
    /// X coordinate (in nodes).
    pub x: i32,
    /// Y coordinate (in nodes).
    pub y: i32,
}

impl NodePos {
    /// Creates a new node position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this position offset by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A tile coordinate (identifies a tile in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// X coordinate (in tiles, not nodes).
    pub x: i32,
    /// Y coordinate (in tiles, not nodes).
    pub y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a world node position to the tile coordinate containing it.
    #[inline]
    #[must_use]
    pub const fn from_node_pos(node: NodePos, block_size: i32) -> Self {
        Self {
            x: node.x.div_euclid(block_size),
            y: node.y.div_euclid(block_size),
        }
    }

    /// Returns the world node position of the tile's origin (low corner).
    #[inline]
    #[must_use]
    pub const fn origin(self, block_size: i32) -> NodePos {
        NodePos {
            x: self.x * block_size,
            y: self.y * block_size,
        }
    }

    /// Returns the node position of `node` relative to this tile's origin.
    #[inline]
    #[must_use]
    pub const fn local_of(self, node: NodePos, block_size: i32) -> NodePos {
        NodePos {
            x: node.x - self.x * block_size,
            y: node.y - self.y * block_size,
        }
    }

    /// Returns this coordinate offset by `(dx, dy)` tiles.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}
