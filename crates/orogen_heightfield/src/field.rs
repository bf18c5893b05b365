//! # Height Field
//!
//! A spatially unbounded 2D height field assembled from lazily
//! generated [`HeightTile`]s. Tiles are stored by coordinate in a
//! BTree map; everything that crosses a tile edge is resolved by
//! coordinate lookup, never by stored references.
//!
//! ## Generation Order
//!
//! Requesting a tile with `generate = true` ensures the full 3x3 block
//! around it exists, created in fixed nested order (x outer, y inner,
//! ascending). Each freshly filled tile is inserted before the next one
//! starts, so later tiles in the same pass seed their borders from
//! earlier ones. Which entry tile first touches a region therefore
//! shapes the terrain there; with a fixed seed and a fixed call
//! sequence the result is fully reproducible, and that is the contract.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use orogen_core::{is_valid, FieldSeed, NodePos, SeededRng, TileCoord, UNSET};

use crate::error::{HeightfieldError, HeightfieldResult};
use crate::generator::ValueGenerator;
use crate::tile::{BorderAccess, HeightTile};

/// Reads `pos` from the tile map without generating anything.
///
/// Falls back to the west / south / southwest neighbor's high border
/// (in that order) when the primary sample is missing or unset and
/// `pos` sits on a tile's low border.
fn read_from_tiles(tiles: &BTreeMap<TileCoord, HeightTile>, block_size: u16, pos: NodePos) -> f32 {
    let bs = i32::from(block_size);
    let tc = TileCoord::from_node_pos(pos, bs);
    let local = tc.local_of(pos, bs);

    if let Some(tile) = tiles.get(&tc) {
        let h = tile.get(local);
        if is_valid(h) {
            return h;
        }
    }
    if local.x == 0 {
        if let Some(tile) = tiles.get(&tc.offset(-1, 0)) {
            let h = tile.get(NodePos::new(bs, local.y));
            if is_valid(h) {
                return h;
            }
        }
    }
    if local.y == 0 {
        if let Some(tile) = tiles.get(&tc.offset(0, -1)) {
            let h = tile.get(NodePos::new(local.x, bs));
            if is_valid(h) {
                return h;
            }
        }
    }
    if local.x == 0 && local.y == 0 {
        if let Some(tile) = tiles.get(&tc.offset(-1, -1)) {
            let h = tile.get(NodePos::new(bs, bs));
            if is_valid(h) {
                return h;
            }
        }
    }
    UNSET
}

/// Writes `pos` into every existing tile that shares the sample: the
/// primary tile, plus the west / south / southwest neighbors when the
/// position sits on the primary tile's low border.
///
/// Returns true if at least one tile accepted the write.
fn write_to_tiles(
    tiles: &mut BTreeMap<TileCoord, HeightTile>,
    block_size: u16,
    pos: NodePos,
    value: f32,
) -> bool {
    let bs = i32::from(block_size);
    let tc = TileCoord::from_node_pos(pos, bs);
    let local = tc.local_of(pos, bs);

    let mut wrote = false;
    if let Some(tile) = tiles.get_mut(&tc) {
        wrote |= tile.set(local, value).is_ok();
    }
    if local.x == 0 {
        if let Some(tile) = tiles.get_mut(&tc.offset(-1, 0)) {
            wrote |= tile.set(NodePos::new(bs, local.y), value).is_ok();
        }
    }
    if local.y == 0 {
        if let Some(tile) = tiles.get_mut(&tc.offset(0, -1)) {
            wrote |= tile.set(NodePos::new(local.x, bs), value).is_ok();
        }
    }
    if local.x == 0 && local.y == 0 {
        if let Some(tile) = tiles.get_mut(&tc.offset(-1, -1)) {
            wrote |= tile.set(NodePos::new(bs, bs), value).is_ok();
        }
    }
    wrote
}

/// Border view handed to a tile while it is being filled.
///
/// The tile under generation is not in the map yet, so its own
/// through-writes fall through to whichever siblings share the sample.
struct FieldBorder<'a> {
    block_size: u16,
    tiles: &'a mut BTreeMap<TileCoord, HeightTile>,
}

impl BorderAccess for FieldBorder<'_> {
    fn height_at(&self, pos: NodePos) -> f32 {
        read_from_tiles(self.tiles, self.block_size, pos)
    }

    fn set_height_at(&mut self, pos: NodePos, value: f32) -> bool {
        write_to_tiles(self.tiles, self.block_size, pos, value)
    }
}

/// An unbounded height field of border-consistent fractal tiles.
///
/// Owns every tile, the three terrain-parameter generators, and the
/// injected random stream. All access must be externally serialized if
/// embedded in a concurrent host; generation mutates the tile map and
/// writes across tile boundaries.
pub struct HeightField {
    pub(crate) block_size: u16,
    pub(crate) tiles: BTreeMap<TileCoord, HeightTile>,
    /// Corner height per tile coordinate.
    pub(crate) base: ValueGenerator,
    /// Starting noise amplitude per tile coordinate.
    pub(crate) rand_max: ValueGenerator,
    /// Amplitude decay per tile coordinate.
    pub(crate) rand_factor: ValueGenerator,
    rng: SeededRng,
}

impl HeightField {
    /// Creates an empty field.
    ///
    /// # Errors
    ///
    /// [`HeightfieldError::Configuration`] if `block_size` is not a
    /// power of two.
    pub fn new(
        block_size: u16,
        seed: FieldSeed,
        base: ValueGenerator,
        rand_max: ValueGenerator,
        rand_factor: ValueGenerator,
    ) -> HeightfieldResult<Self> {
        if !block_size.is_power_of_two() {
            return Err(HeightfieldError::Configuration { block_size });
        }
        Ok(Self {
            block_size,
            tiles: BTreeMap::new(),
            base,
            rand_max,
            rand_factor,
            rng: SeededRng::new(seed),
        })
    }

    /// Returns the tile spacing in nodes.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> u16 {
        self.block_size
    }

    /// Returns the number of tiles generated so far.
    #[inline]
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Iterates over tiles in ascending coordinate order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, &HeightTile)> {
        self.tiles.iter().map(|(c, t)| (*c, t))
    }

    /// Generates one tile and inserts it into the map.
    ///
    /// Callers ensure `coord` is absent.
    fn create_tile(&mut self, coord: TileCoord) -> HeightfieldResult<()> {
        tracing::debug!("generating tile ({}, {})", coord.x, coord.y);

        let corners = [
            self.base.evaluate(coord.offset(0, 0)),
            self.base.evaluate(coord.offset(1, 0)),
            self.base.evaluate(coord.offset(1, 1)),
            self.base.evaluate(coord.offset(0, 1)),
        ];
        let rand_max = self.rand_max.evaluate(coord);
        let rand_factor = self.rand_factor.evaluate(coord);

        let mut tile = HeightTile::new(coord, self.block_size);
        let mut border = FieldBorder {
            block_size: self.block_size,
            tiles: &mut self.tiles,
        };
        tile.generate_continued(&mut border, &mut self.rng, rand_max, rand_factor, corners)?;
        self.tiles.insert(coord, tile);
        Ok(())
    }

    /// Fetches the tile at `coord`.
    ///
    /// With `generate = true`, first ensures the tile and all eight of
    /// its neighbors exist; filling a neighbor writes into this tile's
    /// borders, so the whole 3x3 block must be present before the tile
    /// is handed out.
    ///
    /// # Errors
    ///
    /// - [`HeightfieldError::TileNotFound`] when `generate = false` and
    ///   the tile does not exist.
    /// - Generation errors from [`HeightTile::generate_continued`].
    pub fn tile_at(&mut self, coord: TileCoord, generate: bool) -> HeightfieldResult<&HeightTile> {
        if generate {
            for x in (coord.x - 1)..=(coord.x + 1) {
                for y in (coord.y - 1)..=(coord.y + 1) {
                    let p = TileCoord::new(x, y);
                    if !self.tiles.contains_key(&p) {
                        self.create_tile(p)?;
                    }
                }
            }
        }
        self.tiles
            .get(&coord)
            .ok_or(HeightfieldError::TileNotFound {
                x: coord.x,
                y: coord.y,
            })
    }

    /// Reads the ground height at a world node position.
    ///
    /// With `generate = true` the containing tile (and its 3x3
    /// neighborhood) is created on demand. Returns a sentinel when no
    /// valid sample exists; low-border positions fall back to the
    /// west / south / southwest neighbor's high border, first valid
    /// value wins.
    ///
    /// # Errors
    ///
    /// Generation errors when `generate = true`; plain reads never fail.
    pub fn ground_height(&mut self, pos: NodePos, generate: bool) -> HeightfieldResult<f32> {
        if generate {
            let tc = TileCoord::from_node_pos(pos, i32::from(self.block_size));
            self.tile_at(tc, true)?;
        }
        Ok(read_from_tiles(&self.tiles, self.block_size, pos))
    }

    /// Writes the ground height at a world node position, duplicating
    /// low-border samples into the sharing neighbors.
    ///
    /// With `generate = true`, the primary tile and every applicable
    /// sharing neighbor are created first.
    ///
    /// # Errors
    ///
    /// [`HeightfieldError::WriteFailed`] if no tile accepted the write;
    /// generation errors when `generate = true`.
    pub fn set_ground_height(
        &mut self,
        pos: NodePos,
        value: f32,
        generate: bool,
    ) -> HeightfieldResult<()> {
        let bs = i32::from(self.block_size);
        let tc = TileCoord::from_node_pos(pos, bs);
        let local = tc.local_of(pos, bs);

        if generate {
            self.tile_at(tc, true)?;
            if local.x == 0 {
                self.tile_at(tc.offset(-1, 0), true)?;
            }
            if local.y == 0 {
                self.tile_at(tc.offset(0, -1), true)?;
            }
            if local.x == 0 && local.y == 0 {
                self.tile_at(tc.offset(-1, -1), true)?;
            }
        }

        if write_to_tiles(&mut self.tiles, self.block_size, pos, value) {
            Ok(())
        } else {
            Err(HeightfieldError::WriteFailed { x: pos.x, y: pos.y })
        }
    }

    /// Renders the known tile bounding rectangle for debugging.
    ///
    /// Sentinel cells print as a dash, valid cells as fixed-width
    /// decimals, with node coordinates along both axes. Debug tooling
    /// only; not part of the functional contract.
    #[must_use]
    pub fn dump(&self) -> String {
        let Some(first) = self.tiles.keys().next() else {
            return String::from("height field: empty\n");
        };
        let bs = i32::from(self.block_size);
        let (mut min, mut max) = (*first, *first);
        for c in self.tiles.keys() {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        let (x0, y0) = (min.x * bs, min.y * bs);
        let (x1, y1) = ((max.x + 1) * bs, (max.y + 1) * bs);

        let mut out = format!("height field: nodes ({x0},{y0}) to ({x1},{y1})\n");
        out.push_str("      ");
        for x in x0..=x1 {
            let _ = write!(out, "{x:>7}");
        }
        out.push('\n');
        for y in y0..=y1 {
            let _ = write!(out, "{y:>6}");
            for x in x0..=x1 {
                let h = read_from_tiles(&self.tiles, self.block_size, NodePos::new(x, y));
                if is_valid(h) {
                    let _ = write!(out, "{h:>7.1}");
                } else {
                    out.push_str("      -");
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_field(block_size: u16, seed: u64) -> HeightField {
        HeightField::new(
            block_size,
            FieldSeed::new(seed),
            ValueGenerator::Constant { value: 10.0 },
            ValueGenerator::Constant { value: 4.0 },
            ValueGenerator::Constant { value: 0.5 },
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_non_power_of_two_block_size() {
        let result = HeightField::new(
            12,
            FieldSeed::new(1),
            ValueGenerator::Constant { value: 0.0 },
            ValueGenerator::Constant { value: 1.0 },
            ValueGenerator::Constant { value: 0.5 },
        );
        assert!(matches!(
            result,
            Err(HeightfieldError::Configuration { block_size: 12 })
        ));
    }

    #[test]
    fn test_generate_creates_full_neighborhood() {
        let mut field = constant_field(8, 42);
        field.tile_at(TileCoord::new(0, 0), true).unwrap();
        assert_eq!(field.tile_count(), 9);
        for x in -1..=1 {
            for y in -1..=1 {
                assert!(field.tiles.contains_key(&TileCoord::new(x, y)));
            }
        }
    }

    #[test]
    fn test_missing_tile_without_generate_fails() {
        let mut field = constant_field(8, 42);
        assert!(matches!(
            field.tile_at(TileCoord::new(3, 3), false),
            Err(HeightfieldError::TileNotFound { x: 3, y: 3 })
        ));
    }

    #[test]
    fn test_ground_height_without_generate_is_sentinel() {
        let mut field = constant_field(8, 42);
        let h = field.ground_height(NodePos::new(100, 100), false).unwrap();
        assert!(!is_valid(h));
    }

    #[test]
    fn test_ground_height_at_negative_coordinates() {
        let mut field = constant_field(8, 42);
        let h = field.ground_height(NodePos::new(-5, -13), true).unwrap();
        assert!(is_valid(h));
        // Node -5 with block size 8 must resolve to tile -1, not tile 0.
        assert!(field.tiles.contains_key(&TileCoord::new(-1, -2)));
    }

    #[test]
    fn test_set_ground_height_duplicates_low_border() {
        let mut field = constant_field(8, 42);
        // Node x = 0 sits on tile (0,*) low border and tile (-1,*) high border.
        field
            .set_ground_height(NodePos::new(0, 3), 123.0, true)
            .unwrap();
        let primary = field.tiles.get(&TileCoord::new(0, 0)).unwrap();
        let west = field.tiles.get(&TileCoord::new(-1, 0)).unwrap();
        assert!((primary.get(NodePos::new(0, 3)) - 123.0).abs() < f32::EPSILON);
        assert!((west.get(NodePos::new(8, 3)) - 123.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_set_ground_height_corner_reaches_diagonal() {
        let mut field = constant_field(8, 42);
        field
            .set_ground_height(NodePos::new(0, 0), 77.0, true)
            .unwrap();
        let diag = field.tiles.get(&TileCoord::new(-1, -1)).unwrap();
        assert!((diag.get(NodePos::new(8, 8)) - 77.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_set_without_tiles_fails() {
        let mut field = constant_field(8, 42);
        assert!(matches!(
            field.set_ground_height(NodePos::new(4, 4), 1.0, false),
            Err(HeightfieldError::WriteFailed { x: 4, y: 4 })
        ));
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let mut field = constant_field(8, 42);
        field
            .set_ground_height(NodePos::new(21, 17), 55.25, true)
            .unwrap();
        let h = field.ground_height(NodePos::new(21, 17), false).unwrap();
        assert!((h - 55.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dump_renders_values_and_sentinels() {
        let mut field = constant_field(4, 42);
        // A hand-inserted empty tile keeps sentinels visible next to
        // generated values.
        field
            .tiles
            .insert(TileCoord::new(5, 5), HeightTile::new(TileCoord::new(5, 5), 4));
        let mut partial = HeightTile::new(TileCoord::new(5, 6), 4);
        partial.set(NodePos::new(1, 1), 9.5).unwrap();
        field.tiles.insert(TileCoord::new(5, 6), partial);

        let dump = field.dump();
        assert!(dump.contains('-'));
        assert!(dump.contains("9.5"));
    }

    #[test]
    fn test_empty_dump() {
        let field = constant_field(4, 42);
        assert!(field.dump().contains("empty"));
    }
}
