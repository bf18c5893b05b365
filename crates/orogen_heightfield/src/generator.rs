//! # Value Generators
//!
//! A value generator maps a tile coordinate to a scalar. The height
//! field owns three of them (base height, noise amplitude, amplitude
//! decay), which is what lets terrain character vary across the world:
//! a `Linear` amplitude makes mountains grow with distance from origin,
//! a `Constant` one keeps the whole world uniform.
//!
//! ## Text Format
//!
//! Each generator serializes to one newline-terminated line,
//! `"<name> <args...>"`, embedded verbatim in the modern wire format:
//!
//! ```text
//! constant 10
//! linear 2 0.5 -0.25
//! power 0 0.01 0.01 2
//! ```

use orogen_core::TileCoord;
use serde::{Deserialize, Serialize};

use crate::error::{HeightfieldError, HeightfieldResult};

/// A pure function from tile coordinate to scalar.
///
/// A tagged sum type rather than trait objects, so serialization code
/// is forced to handle every variant exhaustively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValueGenerator {
    /// The same value everywhere.
    Constant {
        /// The value returned for every coordinate.
        value: f32,
    },
    /// A plane: `height + slope_x * x + slope_y * y`.
    Linear {
        /// Value at the origin.
        height: f32,
        /// Per-tile increase along X.
        slope_x: f32,
        /// Per-tile increase along Y.
        slope_y: f32,
    },
    /// A power curve: `height + slope_x * x^power + slope_y * y^power`.
    Power {
        /// Value at the origin.
        height: f32,
        /// Coefficient along X.
        slope_x: f32,
        /// Coefficient along Y.
        slope_y: f32,
        /// Exponent applied to each axis.
        power: f32,
    },
}

impl ValueGenerator {
    /// Evaluates the generator at a tile coordinate.
    ///
    /// Pure; no side effects.
    #[must_use]
    pub fn evaluate(&self, pos: TileCoord) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let (x, y) = (pos.x as f32, pos.y as f32);
        match *self {
            Self::Constant { value } => value,
            Self::Linear {
                height,
                slope_x,
                slope_y,
            } => height + slope_x * x + slope_y * y,
            Self::Power {
                height,
                slope_x,
                slope_y,
                power,
            } => height + slope_x * x.powf(power) + slope_y * y.powf(power),
        }
    }

    /// Returns the leading token used in the text format.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "constant",
            Self::Linear { .. } => "linear",
            Self::Power { .. } => "power",
        }
    }

    /// Renders the newline-terminated text line for this generator.
    #[must_use]
    pub fn text_line(&self) -> String {
        match *self {
            Self::Constant { value } => format!("constant {value}\n"),
            Self::Linear {
                height,
                slope_x,
                slope_y,
            } => format!("linear {height} {slope_x} {slope_y}\n"),
            Self::Power {
                height,
                slope_x,
                slope_y,
                power,
            } => format!("power {height} {slope_x} {slope_y} {power}\n"),
        }
    }

    /// Parses a generator from one text line (trailing newline optional).
    ///
    /// # Errors
    ///
    /// Returns [`HeightfieldError::Format`] on an unknown leading token,
    /// wrong argument count, or unparseable number.
    pub fn parse(line: &str) -> HeightfieldResult<Self> {
        let mut tokens = line.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| HeightfieldError::Format("empty generator line".into()))?;
        let args: Vec<f32> = tokens
            .map(|t| {
                t.parse::<f32>()
                    .map_err(|_| HeightfieldError::Format(format!("bad number {t:?} in {name}")))
            })
            .collect::<HeightfieldResult<_>>()?;

        match (name, args.as_slice()) {
            ("constant", &[value]) => Ok(Self::Constant { value }),
            ("linear", &[height, slope_x, slope_y]) => Ok(Self::Linear {
                height,
                slope_x,
                slope_y,
            }),
            ("power", &[height, slope_x, slope_y, power]) => Ok(Self::Power {
                height,
                slope_x,
                slope_y,
                power,
            }),
            ("constant" | "linear" | "power", _) => Err(HeightfieldError::Format(format!(
                "wrong argument count for {name}: {}",
                args.len()
            ))),
            _ => Err(HeightfieldError::Format(format!(
                "unknown generator {name:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<TileCoord> {
        vec![
            TileCoord::new(0, 0),
            TileCoord::new(1, 0),
            TileCoord::new(0, 1),
            TileCoord::new(-4, 7),
            TileCoord::new(123, -55),
        ]
    }

    #[test]
    fn test_constant_evaluate() {
        let g = ValueGenerator::Constant { value: 10.0 };
        for p in sample_points() {
            assert!((g.evaluate(p) - 10.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_linear_evaluate() {
        let g = ValueGenerator::Linear {
            height: 2.0,
            slope_x: 0.5,
            slope_y: -0.25,
        };
        assert!((g.evaluate(TileCoord::new(4, 8)) - 2.0).abs() < 1e-5);
        assert!((g.evaluate(TileCoord::new(-2, 0)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_power_evaluate() {
        let g = ValueGenerator::Power {
            height: 1.0,
            slope_x: 2.0,
            slope_y: 3.0,
            power: 2.0,
        };
        // 1 + 2*3^2 + 3*2^2 = 31
        assert!((g.evaluate(TileCoord::new(3, 2)) - 31.0).abs() < 1e-4);
    }

    #[test]
    fn test_text_round_trip_all_variants() {
        let generators = vec![
            ValueGenerator::Constant { value: 10.0 },
            ValueGenerator::Constant { value: -3.25 },
            ValueGenerator::Linear {
                height: 2.0,
                slope_x: 0.5,
                slope_y: -0.25,
            },
            ValueGenerator::Power {
                height: 0.0,
                slope_x: 0.01,
                slope_y: 0.02,
                power: 2.0,
            },
        ];
        for g in generators {
            let parsed = ValueGenerator::parse(&g.text_line()).unwrap();
            for p in sample_points() {
                let a = g.evaluate(p);
                let b = parsed.evaluate(p);
                assert!(
                    (a - b).abs() < 1e-5 || (a.is_nan() && b.is_nan()),
                    "{g:?} vs {parsed:?} at {p:?}"
                );
            }
        }
    }

    #[test]
    fn test_unknown_token_fails() {
        assert!(matches!(
            ValueGenerator::parse("perlin 1 2 3"),
            Err(HeightfieldError::Format(_))
        ));
    }

    #[test]
    fn test_wrong_arity_fails() {
        assert!(ValueGenerator::parse("constant").is_err());
        assert!(ValueGenerator::parse("linear 1 2").is_err());
        assert!(ValueGenerator::parse("power 1 2 3 4 5").is_err());
    }

    #[test]
    fn test_bad_number_fails() {
        assert!(ValueGenerator::parse("constant ten").is_err());
    }

    #[test]
    fn test_empty_line_fails() {
        assert!(ValueGenerator::parse("   ").is_err());
    }
}
