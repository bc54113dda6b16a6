use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use terrastream_mesh::DEFAULT_POOL_SIZE;

use crate::node_id::MAX_ADDRESSABLE_DEPTH;

/// How camera-to-node distance is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Horizontal (XZ) distance only.
    #[default]
    Planar,
    /// Full 3D distance.
    Spatial,
}

impl DistanceMetric {
    pub fn distance(self, a: Vec3, b: Vec3) -> f32 {
        match self {
            Self::Planar => Vec2::new(a.x - b.x, a.z - b.z).length(),
            Self::Spatial => a.distance(b),
        }
    }
}

/// Streaming configuration: tree shape, visual radius and generator budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Deepest LOD level a node may reach. Leaves at this depth never split.
    pub max_depth: u8,
    /// World-space extents of a root node.
    pub root_size: Vec3,
    /// Radius around the camera in which root nodes are created.
    pub visual_radius: f32,
    /// Root nodes further than `visual_radius * eviction_factor` are dropped.
    pub eviction_factor: f32,
    /// Number of mesh generators to build the pool with.
    pub generator_count: usize,
    /// Squared distance the camera must move before the coverage pass reruns.
    pub coverage_move_threshold: f32,
    /// Inclusive range of root grid Y layers to populate.
    pub vertical_cells: [i16; 2],
    pub distance_metric: DistanceMetric,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            root_size: Vec3::splat(2048.0),
            visual_radius: 24_000.0,
            eviction_factor: 1.25,
            generator_count: DEFAULT_POOL_SIZE,
            coverage_move_threshold: 10.0,
            vertical_cells: [-1, 2],
            distance_metric: DistanceMetric::Planar,
        }
    }
}

/// Errors from loading or validating a [`StreamConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("max_depth {max_depth} is deeper than the addressable limit {limit}")]
    MaxDepth { max_depth: u8, limit: u8 },
    #[error("root_size must be positive on every axis, got {0}")]
    RootSize(Vec3),
    #[error("visual_radius must be positive, got {0}")]
    VisualRadius(f32),
    #[error("eviction_factor must be at least 1.0, got {0}")]
    EvictionFactor(f32),
    #[error("generator pool must hold at least one generator")]
    NoGenerators,
    #[error("vertical_cells range {min}..={max} is empty")]
    VerticalCells { min: i16, max: i16 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth > MAX_ADDRESSABLE_DEPTH {
            return Err(ConfigError::MaxDepth {
                max_depth: self.max_depth,
                limit: MAX_ADDRESSABLE_DEPTH,
            });
        }
        if !self.root_size.cmpgt(Vec3::ZERO).all() || !self.root_size.is_finite() {
            return Err(ConfigError::RootSize(self.root_size));
        }
        if !(self.visual_radius > 0.0 && self.visual_radius.is_finite()) {
            return Err(ConfigError::VisualRadius(self.visual_radius));
        }
        if !(self.eviction_factor >= 1.0) {
            return Err(ConfigError::EvictionFactor(self.eviction_factor));
        }
        if self.generator_count == 0 {
            return Err(ConfigError::NoGenerators);
        }
        let [min, max] = self.vertical_cells;
        if min > max {
            return Err(ConfigError::VerticalCells { min, max });
        }
        Ok(())
    }

    /// Load and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn eviction_radius(&self) -> f32 {
        self.visual_radius * self.eviction_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = StreamConfig::default();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.root_size, Vec3::splat(2048.0));
        assert_eq!(config.generator_count, 4);
        assert_eq!(config.eviction_radius(), 30_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unaddressable_depth() {
        let config = StreamConfig {
            max_depth: 5,
            ..StreamConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxDepth { max_depth: 5, limit: 4 })
        ));
    }

    #[test]
    fn rejects_degenerate_values() {
        let bad = [
            StreamConfig {
                root_size: Vec3::new(1.0, 0.0, 1.0),
                ..StreamConfig::default()
            },
            StreamConfig {
                visual_radius: f32::NAN,
                ..StreamConfig::default()
            },
            StreamConfig {
                eviction_factor: 0.9,
                ..StreamConfig::default()
            },
            StreamConfig {
                generator_count: 0,
                ..StreamConfig::default()
            },
            StreamConfig {
                vertical_cells: [2, 1],
                ..StreamConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn planar_metric_ignores_height() {
        let a = Vec3::new(0.0, 100.0, 0.0);
        let b = Vec3::new(3.0, -50.0, 4.0);
        assert_eq!(DistanceMetric::Planar.distance(a, b), 5.0);
        assert!(DistanceMetric::Spatial.distance(a, b) > 150.0);
    }

    #[test]
    fn loads_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "max_depth": 2, "visual_radius": 500.0, "distance_metric": "spatial" }}"#
        )
        .unwrap();

        let config = StreamConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.visual_radius, 500.0);
        assert_eq!(config.distance_metric, DistanceMetric::Spatial);
        assert_eq!(config.generator_count, 4);
    }

    #[test]
    fn invalid_json_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_depth": 9 }}"#).unwrap();
        assert!(matches!(
            StreamConfig::from_json_file(file.path()),
            Err(ConfigError::MaxDepth { .. })
        ));

        let missing = StreamConfig::from_json_file("/definitely/not/here.json");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
