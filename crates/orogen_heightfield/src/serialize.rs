//! # Versioned Wire Format
//!
//! Whole-field serialization, selected by a leading version byte.
//! Supported range is 2 through 10; everything outside is rejected
//! outright. Two layouts exist:
//!
//! ```text
//! version <= 7 (legacy, constant generators only):
//! [1] u8  version
//! [2] u16 block_size
//! [4] i32 round(rand_max * 1000)
//! [4] i32 round(rand_factor * 1000)
//! [4] i32 round(base * 1000)
//! [4] u32 tile_count
//! tile_count x { i16 tile_x, i16 tile_y, sample blob }
//!
//! version > 7:
//! [1] u8  version
//! [2] u16 block_size
//! three generator text lines (rand_max, rand_factor, base)
//! [4] u32 tile_count
//! tile_count x { i16 tile_x, i16 tile_y, sample blob }
//! ```
//!
//! All integers are big-endian. Sample blobs are defined by
//! [`HeightTile::sample_bytes`]. Corruption anywhere aborts the whole
//! reconstruction; a partial field is never returned.

use std::io::{Read, Write};

use orogen_core::{FieldSeed, TileCoord};

use crate::error::{HeightfieldError, HeightfieldResult};
use crate::field::HeightField;
use crate::generator::ValueGenerator;
use crate::tile::HeightTile;

/// Oldest readable/writable format version.
pub const FORMAT_VERSION_LOWEST: u8 = 2;

/// Newest readable/writable format version.
pub const FORMAT_VERSION_HIGHEST: u8 = 10;

/// Last version of the constant-generators-only legacy layout.
pub const FORMAT_VERSION_LEGACY_MAX: u8 = 7;

/// Longest accepted generator text line, sanity cap for corrupt input.
const MAX_GENERATOR_LINE: usize = 256;

fn check_version(version: u8) -> HeightfieldResult<()> {
    if (FORMAT_VERSION_LOWEST..=FORMAT_VERSION_HIGHEST).contains(&version) {
        Ok(())
    } else {
        Err(HeightfieldError::VersionMismatch(version))
    }
}

fn read_exact_or_corrupt(
    r: &mut impl Read,
    buf: &mut [u8],
    what: &str,
) -> HeightfieldResult<()> {
    r.read_exact(buf)
        .map_err(|_| HeightfieldError::Serialization(format!("unexpected end of input in {what}")))
}

fn read_u8(r: &mut impl Read, what: &str) -> HeightfieldResult<u8> {
    let mut buf = [0u8; 1];
    read_exact_or_corrupt(r, &mut buf, what)?;
    Ok(buf[0])
}

fn read_u16_be(r: &mut impl Read, what: &str) -> HeightfieldResult<u16> {
    let mut buf = [0u8; 2];
    read_exact_or_corrupt(r, &mut buf, what)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32_be(r: &mut impl Read, what: &str) -> HeightfieldResult<u32> {
    let mut buf = [0u8; 4];
    read_exact_or_corrupt(r, &mut buf, what)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_i32_be(r: &mut impl Read, what: &str) -> HeightfieldResult<i32> {
    let mut buf = [0u8; 4];
    read_exact_or_corrupt(r, &mut buf, what)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_i16_be(r: &mut impl Read, what: &str) -> HeightfieldResult<i16> {
    let mut buf = [0u8; 2];
    read_exact_or_corrupt(r, &mut buf, what)?;
    Ok(i16::from_be_bytes(buf))
}

/// Reads one newline-terminated generator line from the stream.
///
/// Byte-at-a-time on purpose: binary data follows immediately after
/// the newline, so nothing may be read past it.
fn read_generator(r: &mut impl Read) -> HeightfieldResult<ValueGenerator> {
    let mut line = Vec::new();
    loop {
        let b = read_u8(r, "generator line")?;
        if b == b'\n' {
            break;
        }
        line.push(b);
        if line.len() > MAX_GENERATOR_LINE {
            return Err(HeightfieldError::Serialization(
                "generator line exceeds sanity cap".into(),
            ));
        }
    }
    let text = std::str::from_utf8(&line)
        .map_err(|_| HeightfieldError::Serialization("generator line is not UTF-8".into()))?;
    ValueGenerator::parse(text)
}

/// Quantizes a legacy generator scalar: rounded thousandths.
///
/// Samples truncate; these three scalars round. Both behaviors are
/// frozen by the format.
#[allow(clippy::cast_possible_truncation)]
fn legacy_scalar(value: f32) -> i32 {
    (value * 1000.0).round() as i32
}

fn constant_value(generator: &ValueGenerator, role: &str) -> HeightfieldResult<f32> {
    match *generator {
        ValueGenerator::Constant { value } => Ok(value),
        _ => Err(HeightfieldError::Serialization(format!(
            "cannot write legacy format: {role} generator is not constant"
        ))),
    }
}

fn write_tile_entry(
    w: &mut impl Write,
    coord: TileCoord,
    tile: &HeightTile,
) -> HeightfieldResult<()> {
    let x = i16::try_from(coord.x).map_err(|_| {
        HeightfieldError::Serialization(format!("tile x {} out of i16 range", coord.x))
    })?;
    let y = i16::try_from(coord.y).map_err(|_| {
        HeightfieldError::Serialization(format!("tile y {} out of i16 range", coord.y))
    })?;
    w.write_all(&x.to_be_bytes())?;
    w.write_all(&y.to_be_bytes())?;
    w.write_all(&tile.sample_bytes())?;
    Ok(())
}

fn read_tile_entry(
    r: &mut impl Read,
    block_size: u16,
) -> HeightfieldResult<(TileCoord, HeightTile)> {
    let x = read_i16_be(r, "tile position")?;
    let y = read_i16_be(r, "tile position")?;
    let coord = TileCoord::new(i32::from(x), i32::from(y));

    let mut blob = vec![0u8; HeightTile::serialized_len(block_size)];
    read_exact_or_corrupt(r, &mut blob, "tile samples")?;
    let mut tile = HeightTile::new(coord, block_size);
    tile.load_sample_bytes(&blob)?;
    Ok((coord, tile))
}

impl HeightField {
    /// Serializes the whole field at the given format version.
    ///
    /// # Errors
    ///
    /// - [`HeightfieldError::VersionMismatch`] outside versions 2-10.
    /// - [`HeightfieldError::Serialization`] when a legacy version is
    ///   requested but a generator is not constant, or a tile position
    ///   does not fit the wire's i16 coordinates.
    /// - [`HeightfieldError::Io`] if the writer fails.
    pub fn serialize(&self, w: &mut impl Write, version: u8) -> HeightfieldResult<()> {
        check_version(version)?;
        w.write_all(&[version])?;

        if version <= FORMAT_VERSION_LEGACY_MAX {
            let rand_max = constant_value(&self.rand_max, "rand_max")?;
            let rand_factor = constant_value(&self.rand_factor, "rand_factor")?;
            let base = constant_value(&self.base, "base")?;

            w.write_all(&self.block_size.to_be_bytes())?;
            w.write_all(&legacy_scalar(rand_max).to_be_bytes())?;
            w.write_all(&legacy_scalar(rand_factor).to_be_bytes())?;
            w.write_all(&legacy_scalar(base).to_be_bytes())?;
        } else {
            w.write_all(&self.block_size.to_be_bytes())?;
            w.write_all(self.rand_max.text_line().as_bytes())?;
            w.write_all(self.rand_factor.text_line().as_bytes())?;
            w.write_all(self.base.text_line().as_bytes())?;
        }

        let count = u32::try_from(self.tiles.len()).map_err(|_| {
            HeightfieldError::Serialization("tile count exceeds u32".into())
        })?;
        w.write_all(&count.to_be_bytes())?;
        for (coord, tile) in &self.tiles {
            write_tile_entry(w, *coord, tile)?;
        }
        Ok(())
    }

    /// Reconstructs a field from serialized input.
    ///
    /// The random stream is not part of the wire format; `seed` arms
    /// the restored field for any further generation.
    ///
    /// # Errors
    ///
    /// - [`HeightfieldError::VersionMismatch`] outside versions 2-10.
    /// - [`HeightfieldError::Serialization`] on truncated or corrupt
    ///   input (nothing partial is ever returned).
    /// - [`HeightfieldError::Format`] on a malformed generator line.
    pub fn deserialize(r: &mut impl Read, seed: FieldSeed) -> HeightfieldResult<Self> {
        let version = read_u8(r, "version byte")?;
        check_version(version)?;

        let block_size;
        let (rand_max, rand_factor, base);
        if version <= FORMAT_VERSION_LEGACY_MAX {
            block_size = read_u16_be(r, "block size")?;
            #[allow(clippy::cast_precision_loss)]
            {
                rand_max = ValueGenerator::Constant {
                    value: read_i32_be(r, "rand_max")? as f32 / 1000.0,
                };
                rand_factor = ValueGenerator::Constant {
                    value: read_i32_be(r, "rand_factor")? as f32 / 1000.0,
                };
                base = ValueGenerator::Constant {
                    value: read_i32_be(r, "base")? as f32 / 1000.0,
                };
            }
        } else {
            block_size = read_u16_be(r, "block size")?;
            rand_max = read_generator(r)?;
            rand_factor = read_generator(r)?;
            base = read_generator(r)?;
        }

        let mut field = Self::new(block_size, seed, base, rand_max, rand_factor)?;

        let count = read_u32_be(r, "tile count")?;
        for _ in 0..count {
            let (coord, tile) = read_tile_entry(r, block_size)?;
            field.tiles.insert(coord, tile);
        }

        tracing::info!(
            "restored height field: version={}, block_size={}, tiles={}",
            version,
            block_size,
            count
        );
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orogen_core::NodePos;

    fn generated_field(rand_max: ValueGenerator) -> HeightField {
        let mut field = HeightField::new(
            8,
            FieldSeed::new(42),
            ValueGenerator::Constant { value: 10.0 },
            rand_max,
            ValueGenerator::Constant { value: 0.5 },
        )
        .unwrap();
        field.tile_at(TileCoord::new(0, 0), true).unwrap();
        field.tile_at(TileCoord::new(2, -1), true).unwrap();
        field
    }

    fn assert_fields_match(a: &HeightField, b: &HeightField) {
        assert_eq!(a.block_size(), b.block_size());
        assert_eq!(a.tile_count(), b.tile_count());
        for ((ca, ta), (cb, tb)) in a.tiles().zip(b.tiles()) {
            assert_eq!(ca, cb);
            for (sa, sb) in ta.samples().iter().zip(tb.samples()) {
                assert!((sa - sb).abs() <= 0.001, "{ca:?}: {sa} vs {sb}");
            }
        }
    }

    #[test]
    fn test_modern_round_trip() {
        let field = generated_field(ValueGenerator::Linear {
            height: 3.0,
            slope_x: 0.25,
            slope_y: 0.0,
        });
        let mut bytes = Vec::new();
        field.serialize(&mut bytes, 9).unwrap();

        let restored =
            HeightField::deserialize(&mut bytes.as_slice(), FieldSeed::new(42)).unwrap();
        assert_fields_match(&field, &restored);
        assert_eq!(restored.rand_max, field.rand_max);
        assert_eq!(restored.rand_factor, field.rand_factor);
        assert_eq!(restored.base, field.base);
    }

    #[test]
    fn test_legacy_round_trip() {
        let field = generated_field(ValueGenerator::Constant { value: 4.0 });
        let mut bytes = Vec::new();
        field.serialize(&mut bytes, 7).unwrap();

        let restored =
            HeightField::deserialize(&mut bytes.as_slice(), FieldSeed::new(42)).unwrap();
        assert_fields_match(&field, &restored);
        assert_eq!(
            restored.rand_max,
            ValueGenerator::Constant { value: 4.0 }
        );
    }

    #[test]
    fn test_legacy_rejects_non_constant_generators() {
        let field = generated_field(ValueGenerator::Linear {
            height: 1.0,
            slope_x: 0.1,
            slope_y: 0.1,
        });
        let mut bytes = Vec::new();
        assert!(matches!(
            field.serialize(&mut bytes, 7),
            Err(HeightfieldError::Serialization(_))
        ));
    }

    #[test]
    fn test_version_out_of_range_rejected() {
        let field = generated_field(ValueGenerator::Constant { value: 1.0 });
        let mut bytes = Vec::new();
        assert!(matches!(
            field.serialize(&mut bytes, 1),
            Err(HeightfieldError::VersionMismatch(1))
        ));
        assert!(matches!(
            field.serialize(&mut bytes, 11),
            Err(HeightfieldError::VersionMismatch(11))
        ));

        let input = [1u8, 0, 8];
        assert!(matches!(
            HeightField::deserialize(&mut input.as_ref(), FieldSeed::new(1)),
            Err(HeightfieldError::VersionMismatch(1))
        ));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let field = generated_field(ValueGenerator::Constant { value: 1.0 });
        let mut bytes = Vec::new();
        field.serialize(&mut bytes, 9).unwrap();
        bytes.truncate(bytes.len() - 5);
        assert!(matches!(
            HeightField::deserialize(&mut bytes.as_slice(), FieldSeed::new(1)),
            Err(HeightfieldError::Serialization(_))
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let input: [u8; 0] = [];
        assert!(matches!(
            HeightField::deserialize(&mut input.as_ref(), FieldSeed::new(1)),
            Err(HeightfieldError::Serialization(_))
        ));
    }

    #[test]
    fn test_legacy_layout_is_byte_exact() {
        let mut field = HeightField::new(
            2,
            FieldSeed::new(1),
            ValueGenerator::Constant { value: -1.5 },
            ValueGenerator::Constant { value: 2.0006 },
            ValueGenerator::Constant { value: 0.5 },
        )
        .unwrap();
        let mut tile = HeightTile::new(TileCoord::new(-1, 3), 2);
        for y in 0..=2 {
            for x in 0..=2 {
                tile.set(NodePos::new(x, y), 1.0).unwrap();
            }
        }
        field.tiles.insert(TileCoord::new(-1, 3), tile);

        let mut bytes = Vec::new();
        field.serialize(&mut bytes, 5).unwrap();

        let mut expected = vec![5u8];
        expected.extend_from_slice(&2u16.to_be_bytes());
        expected.extend_from_slice(&2001i32.to_be_bytes()); // rounded, not truncated
        expected.extend_from_slice(&500i32.to_be_bytes());
        expected.extend_from_slice(&(-1500i32).to_be_bytes());
        expected.extend_from_slice(&1u32.to_be_bytes());
        expected.extend_from_slice(&(-1i16).to_be_bytes());
        expected.extend_from_slice(&3i16.to_be_bytes());
        for _ in 0..9 {
            expected.extend_from_slice(&1000i32.to_be_bytes());
        }
        assert_eq!(bytes, expected);
    }
}
