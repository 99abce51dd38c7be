//! Generator configuration
//!
//! Every tunable the pipeline reads lives in `GeneratorConfig`. Field names on
//! the wire are camelCase (`maxDepth`, `reuseCorridorsBias`, ...), matching
//! the config files the CLI loads.
//!
//! `GeneratorConfig::standard()` is a named preset. Deserialization fills any
//! omitted field from that preset so partial config files load, but the
//! generator itself only ever sees the explicit value it is constructed with.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pathfind::CostParams;

/// Largest accepted grid side
pub const MAX_DIMENSION: u32 = 4096;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("`{field}` must be finite")]
    NonFinite { field: &'static str },

    #[error("`{field}` = {value} is out of range, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Construction-time parameters for a dungeon generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratorConfig {
    // Grid
    /// Tile grid width
    pub width: u32,
    /// Tile grid height
    pub height: u32,

    // BSP
    /// Partitions at this depth are never split further
    pub max_depth: u32,
    /// Minimum side of a partition produced by a split
    pub min_leaf_size: u32,
    /// Candidate splits sampled per partition
    pub split_candidates: u32,

    // Rooms
    /// Smallest room side
    pub room_min_size: u32,
    /// Inset from the partition edges
    pub room_margin: u32,
    /// Candidate rectangles sampled per leaf
    pub room_candidates: u32,
    /// Desired room area as a fraction of the usable leaf area
    pub target_fill: f64,
    /// Spacing kept between a new room and every placed room
    pub room_buffer: u32,

    // Graph
    /// Nearest neighbours considered per room
    pub k_nearest: u32,
    /// Per-step probability of accepting an extra loop edge
    pub extra_loop_chance: f64,
    /// Cap on extra loop edges
    pub max_loops: u32,

    // Corridors
    /// Step cost for entering a Room cell
    pub room_penalty: f64,
    /// Step cost multiplier for entering a Corridor or Door cell
    pub reuse_corridors_bias: f64,
    /// Extra cost when a step changes direction
    pub turn_penalty: f64,
}

impl GeneratorConfig {
    /// The standard 80x50 layout
    pub fn standard() -> Self {
        Self {
            width: 80,
            height: 50,
            max_depth: 5,
            min_leaf_size: 14,
            split_candidates: 8,
            room_min_size: 6,
            room_margin: 2,
            room_candidates: 12,
            target_fill: 0.55,
            room_buffer: 1,
            k_nearest: 4,
            extra_loop_chance: 0.35,
            max_loops: 6,
            room_penalty: 40.0,
            reuse_corridors_bias: 1.1,
            turn_penalty: 0.0,
        }
    }

    /// Parse a (possibly partial) JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a (possibly partial) JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject malformed values.
    ///
    /// Undersized or contradictory settings (a leaf size larger than the
    /// grid, a margin that swallows every leaf) are well-formed and pass;
    /// the generator absorbs them with fallback rooms and paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(ConfigError::OutOfRange {
                field: if self.width > MAX_DIMENSION { "width" } else { "height" },
                value: f64::from(self.width.max(self.height)),
                expected: "at most 4096",
            });
        }

        let counts = [
            ("maxDepth", self.max_depth),
            ("minLeafSize", self.min_leaf_size),
            ("splitCandidates", self.split_candidates),
            ("roomMinSize", self.room_min_size),
            ("roomMargin", self.room_margin),
            ("roomCandidates", self.room_candidates),
            ("roomBuffer", self.room_buffer),
            ("kNearest", self.k_nearest),
            ("maxLoops", self.max_loops),
        ];
        if let Some(&(field, value)) = counts.iter().find(|(_, v)| *v > MAX_DIMENSION) {
            return Err(ConfigError::OutOfRange {
                field,
                value: f64::from(value),
                expected: "at most 4096",
            });
        }

        let floats = [
            ("targetFill", self.target_fill),
            ("extraLoopChance", self.extra_loop_chance),
            ("roomPenalty", self.room_penalty),
            ("reuseCorridorsBias", self.reuse_corridors_bias),
            ("turnPenalty", self.turn_penalty),
        ];
        if let Some(&(field, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite { field });
        }

        if !(self.target_fill > 0.0 && self.target_fill <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "targetFill",
                value: self.target_fill,
                expected: "in (0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&self.extra_loop_chance) {
            return Err(ConfigError::OutOfRange {
                field: "extraLoopChance",
                value: self.extra_loop_chance,
                expected: "in [0, 1]",
            });
        }
        if self.reuse_corridors_bias <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "reuseCorridorsBias",
                value: self.reuse_corridors_bias,
                expected: "greater than 0",
            });
        }
        for (field, value) in [
            ("roomPenalty", self.room_penalty),
            ("turnPenalty", self.turn_penalty),
        ] {
            if value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "at least 0",
                });
            }
        }
        Ok(())
    }

    /// The A* cost knobs
    pub fn cost_params(&self) -> CostParams {
        CostParams {
            room_penalty: self.room_penalty,
            reuse_bias: self.reuse_corridors_bias,
            turn_penalty: self.turn_penalty,
        }
    }
}

/// A cell count as a grid coordinate, saturating at `i32::MAX`
pub(crate) fn cells(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_is_valid() {
        assert!(GeneratorConfig::standard().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_from_preset() {
        let json = r#"{
            "width": 80, "height": 50, "maxDepth": 5, "minLeafSize": 14,
            "roomMinSize": 6, "roomMargin": 2, "targetFill": 0.55,
            "roomBuffer": 1, "kNearest": 4, "maxLoops": 6,
            "extraLoopChance": 0.35, "roomPenalty": 40, "turnPenalty": 0,
            "reuseCorridorsBias": 1.1
        }"#;
        let config = GeneratorConfig::from_json_str(json).unwrap();
        assert_eq!(config.split_candidates, 8);
        assert_eq!(config.room_candidates, 12);
        assert_eq!(config.room_penalty, 40.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = GeneratorConfig::from_json_str(r#"{"widht": 10}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_round_trip_uses_camel_case() {
        let json = serde_json::to_string(&GeneratorConfig::standard()).unwrap();
        assert!(json.contains("\"reuseCorridorsBias\":1.1"));
        assert!(json.contains("\"kNearest\":4"));
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GeneratorConfig::standard());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let config = GeneratorConfig {
            width: 0,
            ..GeneratorConfig::standard()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDimension { width: 0, height: 50 })
        ));
    }

    #[test]
    fn test_bad_probability_rejected() {
        let config = GeneratorConfig {
            extra_loop_chance: 1.5,
            ..GeneratorConfig::standard()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("extraLoopChance"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let config = GeneratorConfig {
            room_penalty: f64::NAN,
            ..GeneratorConfig::standard()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { field: "roomPenalty" })
        ));
    }

    #[test]
    fn test_oversized_counts_rejected() {
        let cases = [
            ("maxDepth", GeneratorConfig { max_depth: u32::MAX, ..GeneratorConfig::standard() }),
            ("minLeafSize", GeneratorConfig { min_leaf_size: u32::MAX, ..GeneratorConfig::standard() }),
            ("splitCandidates", GeneratorConfig { split_candidates: 5000, ..GeneratorConfig::standard() }),
            ("roomMinSize", GeneratorConfig { room_min_size: 1 << 31, ..GeneratorConfig::standard() }),
            ("roomMargin", GeneratorConfig { room_margin: 1 << 30, ..GeneratorConfig::standard() }),
            ("roomCandidates", GeneratorConfig { room_candidates: u32::MAX, ..GeneratorConfig::standard() }),
            ("roomBuffer", GeneratorConfig { room_buffer: 1 << 30, ..GeneratorConfig::standard() }),
            ("kNearest", GeneratorConfig { k_nearest: MAX_DIMENSION + 1, ..GeneratorConfig::standard() }),
            ("maxLoops", GeneratorConfig { max_loops: u32::MAX, ..GeneratorConfig::standard() }),
        ];
        for (name, config) in cases {
            match config.validate() {
                Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, name),
                other => panic!("{name}: expected OutOfRange, got {other:?}"),
            }
        }

        let edge = GeneratorConfig {
            room_buffer: MAX_DIMENSION,
            min_leaf_size: MAX_DIMENSION,
            ..GeneratorConfig::standard()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_cells_saturates() {
        assert_eq!(cells(12), 12);
        assert_eq!(cells(u32::MAX), i32::MAX);
    }

    #[test]
    fn test_contradictory_but_well_formed_is_accepted() {
        let config = GeneratorConfig {
            width: 10,
            height: 10,
            min_leaf_size: 40,
            room_min_size: 30,
            room_margin: 8,
            ..GeneratorConfig::standard()
        };
        assert!(config.validate().is_ok());
    }
}
