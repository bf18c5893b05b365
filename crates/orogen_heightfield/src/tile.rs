//! # Height Tiles
//!
//! One tile is a `(block_size + 1) x (block_size + 1)` row-major grid
//! of height samples; adjacent tiles overlap by one sample row/column
//! so they can agree exactly on their shared border.
//!
//! A tile never holds a reference to its owning field. Anything that
//! needs to look past the tile's edge goes through the [`BorderAccess`]
//! capability passed into the call, which keeps ownership acyclic and
//! makes a tile trivially testable in isolation (see [`SingleTileField`]).
//!
//! ## Fill Algorithm
//!
//! [`HeightTile::generate_continued`] seeds the four edges from the
//! surrounding field, fills still-unset corners from caller-supplied
//! values, then runs midpoint displacement: alternating diamond
//! (diagonal-average) and square (orthogonal-average) passes over
//! frontier sets, halving the step and decaying the noise amplitude
//! each round. Frontier sets are BTree-ordered so the random stream is
//! consumed in a reproducible order.

use std::collections::BTreeSet;

use orogen_core::{is_valid, NodePos, TerrainRng, TileCoord, UNSET};

use crate::error::{HeightfieldError, HeightfieldResult};

/// Capability for reading and writing samples beyond a tile's edge.
///
/// Implemented by the owning field (routing to sibling tiles) and by
/// [`NullBorder`] for root tiles with no surroundings.
pub trait BorderAccess {
    /// Reads the sample at a world node position.
    ///
    /// Returns a sentinel (see [`orogen_core::sample`]) when no tile
    /// holds a valid sample there.
    fn height_at(&self, pos: NodePos) -> f32;

    /// Writes the sample at a world node position.
    ///
    /// Returns true if at least one tile accepted the write.
    fn set_height_at(&mut self, pos: NodePos, value: f32) -> bool;
}

/// Border access for a tile with no neighbors: reads are sentinels,
/// writes are rejected.
pub struct NullBorder;

impl BorderAccess for NullBorder {
    fn height_at(&self, _pos: NodePos) -> f32 {
        UNSET
    }

    fn set_height_at(&mut self, _pos: NodePos, _value: f32) -> bool {
        false
    }
}

/// Offsets probed by the square step (orthogonal neighbors).
const ORTHO_DIRS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Offsets probed by the diamond step (diagonal neighbors).
const DIAG_DIRS: [(i32, i32); 4] = [(1, 1), (-1, -1), (-1, 1), (1, -1)];

/// One square tile of height samples.
#[derive(Clone, Debug)]
pub struct HeightTile {
    coord: TileCoord,
    block_size: u16,
    /// Row-major, `(block_size + 1)^2` entries.
    data: Vec<f32>,
}

impl HeightTile {
    /// Creates a tile at `coord` with every sample unset.
    #[must_use]
    pub fn new(coord: TileCoord, block_size: u16) -> Self {
        let side = usize::from(block_size) + 1;
        Self {
            coord,
            block_size,
            data: vec![UNSET; side * side],
        }
    }

    /// Returns the tile's position on its owning field.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Returns the tile spacing in nodes.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> u16 {
        self.block_size
    }

    /// Returns the number of samples per axis (`block_size + 1`).
    #[inline]
    #[must_use]
    pub const fn side(&self) -> i32 {
        self.block_size as i32 + 1
    }

    /// Returns the raw row-major sample array.
    #[inline]
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Returns true if `local` addresses a sample in this tile.
    #[inline]
    #[must_use]
    pub const fn contains(&self, local: NodePos) -> bool {
        let max = self.block_size as i32;
        local.x >= 0 && local.x <= max && local.y >= 0 && local.y <= max
    }

    #[inline]
    fn index(&self, local: NodePos) -> usize {
        #[allow(clippy::cast_sign_loss)]
        {
            (local.y * self.side() + local.x) as usize
        }
    }

    /// Translates a tile-local position to a world node position.
    #[inline]
    #[must_use]
    pub const fn global_of(&self, local: NodePos) -> NodePos {
        NodePos {
            x: self.coord.x * self.block_size as i32 + local.x,
            y: self.coord.y * self.block_size as i32 + local.y,
        }
    }

    /// Reads a sample; out-of-range positions read as unset, never panic.
    #[inline]
    #[must_use]
    pub fn get(&self, local: NodePos) -> f32 {
        if self.contains(local) {
            self.data[self.index(local)]
        } else {
            UNSET
        }
    }

    /// Writes a sample.
    ///
    /// # Errors
    ///
    /// [`HeightfieldError::OutOfRange`] if `local` is outside the tile.
    pub fn set(&mut self, local: NodePos, value: f32) -> HeightfieldResult<()> {
        if !self.contains(local) {
            return Err(HeightfieldError::OutOfRange {
                x: local.x,
                y: local.y,
                side: self.side(),
            });
        }
        let idx = self.index(local);
        self.data[idx] = value;
        Ok(())
    }

    /// Writes a sample, mirroring border samples into the surrounding
    /// field so the shared edge stays visible from sibling tiles.
    ///
    /// Positions strictly outside the tile are only offered to the
    /// border; if the border rejects them nothing is written. Returns
    /// true if any write (local or border) landed.
    pub fn set_through(
        &mut self,
        border: &mut dyn BorderAccess,
        local: NodePos,
        value: f32,
    ) -> bool {
        let max = i32::from(self.block_size);
        let inside = self.contains(local);
        let touches_border = local.x <= 0 || local.y <= 0 || local.x >= max || local.y >= max;

        let mut wrote = false;
        if touches_border {
            wrote = border.set_height_at(self.global_of(local), value);
            if !inside && !wrote {
                return false;
            }
        }
        if inside {
            let idx = self.index(local);
            self.data[idx] = value;
            wrote = true;
        }
        wrote
    }

    /// Reads a sample, falling back to the surrounding field when the
    /// local sample is unset or out of range.
    ///
    /// This is what lets a fresh tile average against samples seeded by
    /// neighbors before its own fill has reached them.
    #[must_use]
    pub fn get_through(&self, border: &dyn BorderAccess, local: NodePos) -> f32 {
        let h = self.get(local);
        if is_valid(h) {
            h
        } else {
            border.height_at(self.global_of(local))
        }
    }

    /// Averages the valid samples among four neighbors of `center` at
    /// distance `d` along `dirs`.
    fn average_neighbors(
        &self,
        border: &dyn BorderAccess,
        center: NodePos,
        dirs: [(i32, i32); 4],
        d: i32,
    ) -> HeightfieldResult<f32> {
        let mut sum = 0.0f32;
        let mut count = 0u32;
        for (dx, dy) in dirs {
            let n = self.get_through(border, center.offset(dx * d, dy * d));
            if is_valid(n) {
                sum += n;
                count += 1;
            }
        }
        if count == 0 {
            return Err(HeightfieldError::InsufficientSeed {
                x: center.x,
                y: center.y,
                distance: d,
            });
        }
        #[allow(clippy::cast_precision_loss)]
        Ok(sum / count as f32)
    }

    /// Diamond step: fills `center` from its diagonal neighbors at
    /// distance `a / 2` and enqueues the surrounding square centers.
    fn make_diamond(
        &mut self,
        border: &mut dyn BorderAccess,
        rng: &mut dyn TerrainRng,
        center: NodePos,
        a: i32,
        rand_max: f32,
        next_squares: &mut BTreeSet<NodePos>,
    ) -> HeightfieldResult<()> {
        let avg = self.average_neighbors(border, center, DIAG_DIRS, a / 2)?;
        let value = avg + rng.next_float_in_range(-rand_max, rand_max);
        let worked = self.set_through(border, center, value);
        if worked && a >= 2 {
            let d = a / 2;
            next_squares.insert(center.offset(-d, 0));
            next_squares.insert(center.offset(d, 0));
            next_squares.insert(center.offset(0, -d));
            next_squares.insert(center.offset(0, d));
        }
        Ok(())
    }

    /// Square step: fills `center` from its orthogonal neighbors at
    /// distance `a / 2` and enqueues the next round's diamond centers.
    fn make_square(
        &mut self,
        border: &mut dyn BorderAccess,
        rng: &mut dyn TerrainRng,
        center: NodePos,
        a: i32,
        rand_max: f32,
        next_diamonds: &mut BTreeSet<NodePos>,
    ) -> HeightfieldResult<()> {
        let avg = self.average_neighbors(border, center, ORTHO_DIRS, a / 2)?;
        let value = avg + rng.next_float_in_range(-rand_max, rand_max);
        let worked = self.set_through(border, center, value);
        if worked && a >= 4 {
            let d = a / 4;
            next_diamonds.insert(center.offset(d, d));
            next_diamonds.insert(center.offset(-d, d));
            next_diamonds.insert(center.offset(-d, -d));
            next_diamonds.insert(center.offset(d, -d));
        }
        Ok(())
    }

    /// Runs midpoint displacement over the whole tile.
    ///
    /// `rand_max` is the starting noise amplitude, multiplied by
    /// `rand_factor` after each halving round. Frontier iteration is
    /// BTree-ordered (ascending local x, then y), so output depends
    /// only on the seed and the pre-existing samples.
    ///
    /// # Errors
    ///
    /// - [`HeightfieldError::Configuration`] if `block_size` is not a
    ///   power of two (the halving loop cannot split evenly).
    /// - [`HeightfieldError::InsufficientSeed`] if an averaging step
    ///   finds zero valid neighbors.
    pub fn diamond_square(
        &mut self,
        border: &mut dyn BorderAccess,
        rng: &mut dyn TerrainRng,
        rand_max: f32,
        rand_factor: f32,
    ) -> HeightfieldResult<()> {
        if !self.block_size.is_power_of_two() {
            return Err(HeightfieldError::Configuration {
                block_size: self.block_size,
            });
        }
        let mut a = i32::from(self.block_size);
        let mut rand_max = rand_max;

        let mut diamonds = BTreeSet::from([NodePos::new(a / 2, a / 2)]);
        while a >= 2 {
            let mut squares = BTreeSet::new();
            for &center in &diamonds {
                self.make_diamond(border, rng, center, a, rand_max, &mut squares)?;
            }

            let mut next_diamonds = BTreeSet::new();
            for &center in &squares {
                self.make_square(border, rng, center, a, rand_max, &mut next_diamonds)?;
            }
            diamonds = next_diamonds;

            a /= 2;
            rand_max *= rand_factor;
        }
        Ok(())
    }

    /// Fills the tile: reset, seed edges from the surrounding field,
    /// fill still-unset corners from `corners`, then run
    /// [`HeightTile::diamond_square`].
    ///
    /// Edge seeding reads each edge node's globally-equivalent position
    /// and copies only values the border reports valid; invalid reads
    /// leave the sentinel and the scan continues. Corners arrive in the
    /// order `(0,0), (1,0), (1,1), (0,1)` (tile-relative units) and are
    /// ignored wherever a neighbor already seeded the sample.
    ///
    /// # Errors
    ///
    /// Same as [`HeightTile::diamond_square`].
    pub fn generate_continued(
        &mut self,
        border: &mut dyn BorderAccess,
        rng: &mut dyn TerrainRng,
        rand_max: f32,
        rand_factor: f32,
        corners: [f32; 4],
    ) -> HeightfieldResult<()> {
        if !self.block_size.is_power_of_two() {
            return Err(HeightfieldError::Configuration {
                block_size: self.block_size,
            });
        }
        let a = i32::from(self.block_size);

        self.data.fill(UNSET);

        // (start, step) for each of the four edges
        let edges = [
            (NodePos::new(0, 0), (1, 0)),
            (NodePos::new(0, a), (1, 0)),
            (NodePos::new(0, 0), (0, 1)),
            (NodePos::new(a, 0), (0, 1)),
        ];
        for (start, (dx, dy)) in edges {
            for s in 0..=a {
                let local = start.offset(dx * s, dy * s);
                let h = border.height_at(self.global_of(local));
                if is_valid(h) {
                    self.set(local, h)?;
                }
            }
        }

        let corner_dirs = [(0, 0), (1, 0), (1, 1), (0, 1)];
        for (i, (dx, dy)) in corner_dirs.into_iter().enumerate() {
            let local = NodePos::new(dx * a, dy * a);
            if !is_valid(self.get(local)) {
                self.set(local, corners[i])?;
            }
        }

        self.diamond_square(border, rng, rand_max, rand_factor)
    }

    /// Serialized length of one tile's sample blob.
    #[must_use]
    pub fn serialized_len(block_size: u16) -> usize {
        let side = usize::from(block_size) + 1;
        side * side * 4
    }

    /// Serializes the sample array: row-major, each sample a big-endian
    /// i32 of `trunc(value * 1000)`.
    ///
    /// Truncation toward zero, not rounding; the byte layout is frozen.
    #[must_use]
    pub fn sample_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.data.len() * 4);
        for &v in &self.data {
            #[allow(clippy::cast_possible_truncation)]
            let q = (v * 1000.0) as i32;
            buf.extend_from_slice(&q.to_be_bytes());
        }
        buf
    }

    /// Restores the sample array from [`HeightTile::sample_bytes`] output.
    ///
    /// Lossy to three decimal digits by design.
    ///
    /// # Errors
    ///
    /// [`HeightfieldError::Serialization`] if `bytes` is not exactly one
    /// sample blob for this tile's block size.
    pub fn load_sample_bytes(&mut self, bytes: &[u8]) -> HeightfieldResult<()> {
        if bytes.len() != self.data.len() * 4 {
            return Err(HeightfieldError::Serialization(format!(
                "tile blob is {} bytes, expected {}",
                bytes.len(),
                self.data.len() * 4
            )));
        }
        for (slot, chunk) in self.data.iter_mut().zip(bytes.chunks_exact(4)) {
            let q = i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            #[allow(clippy::cast_precision_loss)]
            {
                *slot = q as f32 / 1000.0;
            }
        }
        Ok(())
    }
}

/// A single tile bound as a standalone root: no owning field, no
/// neighbors. Exists for direct use of the fill algorithm and for
/// tests; the unbounded case lives in [`crate::field::HeightField`].
pub struct SingleTileField {
    tile: HeightTile,
}

impl SingleTileField {
    /// Creates a root tile at the grid origin with every sample unset.
    #[must_use]
    pub fn new(block_size: u16) -> Self {
        Self {
            tile: HeightTile::new(TileCoord::new(0, 0), block_size),
        }
    }

    /// Fills the tile from the four corner heights.
    ///
    /// # Errors
    ///
    /// Same as [`HeightTile::generate_continued`].
    pub fn generate(
        &mut self,
        rng: &mut dyn TerrainRng,
        rand_max: f32,
        rand_factor: f32,
        corners: [f32; 4],
    ) -> HeightfieldResult<()> {
        self.tile
            .generate_continued(&mut NullBorder, rng, rand_max, rand_factor, corners)
    }

    /// Returns the tile.
    #[must_use]
    pub fn tile(&self) -> &HeightTile {
        &self.tile
    }

    /// Returns the tile mutably.
    pub fn tile_mut(&mut self) -> &mut HeightTile {
        &mut self.tile
    }
}
