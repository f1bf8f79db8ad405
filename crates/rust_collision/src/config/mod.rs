//! Configuration system
//!
//! Collision tuning lives in [`CollisionConfig`], which can be loaded from and
//! saved to TOML or RON files through the [`Config`] trait.

pub use serde::{Serialize, Deserialize};

use crate::foundation::math::Vec3;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from a RON document
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its valid range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Which spatial index a triangle mesh builds over its triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpatialIndexKind {
    /// Adaptive octree; triangles stored in the deepest octant fully containing them
    Octree,
    /// Median-split k-d tree over triangle centroids
    KdTree,
}

/// Spatial index build parameters for static meshes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshIndexConfig {
    /// Index implementation
    pub kind: SpatialIndexKind,

    /// Maximum octree subdivision depth
    pub octree_max_depth: u32,

    /// Inflation applied to k-d tree node boxes
    pub kd_epsilon: f32,
}

impl Default for MeshIndexConfig {
    fn default() -> Self {
        Self {
            kind: SpatialIndexKind::Octree,
            octree_max_depth: 12,
            kd_epsilon: 1.0e-4,
        }
    }
}

/// Narrow-phase tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Slack distance within which near-touching shapes are still reported
    pub collision_tolerance: f32,

    /// Sample the motion path of primitives against static meshes
    pub use_sweep_tests: bool,

    /// Upper bound on the number of sweep samples per detection call
    pub max_sweep_samples: u32,

    /// Box manifold points closer than this fraction of the smallest box side are merged
    pub combination_fraction: f32,

    /// Normal reported when two features coincide and no direction can be derived
    pub fallback_normal: [f32; 3],

    /// Spatial index parameters for meshes built with this configuration
    pub mesh_index: MeshIndexConfig,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            collision_tolerance: 0.05,
            use_sweep_tests: false,
            max_sweep_samples: 16,
            combination_fraction: 0.05,
            fallback_normal: [0.0, 1.0, 0.0],
            mesh_index: MeshIndexConfig::default(),
        }
    }
}

impl Config for CollisionConfig {}

impl CollisionConfig {
    /// Check value ranges; detection assumes a validated configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.collision_tolerance >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "collision_tolerance",
                reason: format!("must be non-negative, got {}", self.collision_tolerance),
            });
        }
        if self.max_sweep_samples == 0 {
            return Err(ConfigError::Invalid {
                field: "max_sweep_samples",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.combination_fraction >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "combination_fraction",
                reason: format!("must be non-negative, got {}", self.combination_fraction),
            });
        }
        if Vec3::from(self.fallback_normal).magnitude_squared() < 1.0e-6 {
            return Err(ConfigError::Invalid {
                field: "fallback_normal",
                reason: "must not be the zero vector".to_string(),
            });
        }
        if self.mesh_index.kd_epsilon < 0.0 {
            return Err(ConfigError::Invalid {
                field: "mesh_index.kd_epsilon",
                reason: format!("must be non-negative, got {}", self.mesh_index.kd_epsilon),
            });
        }
        Ok(())
    }

    /// Unit fallback normal
    pub fn fallback_normal(&self) -> Vec3 {
        Vec3::from(self.fallback_normal)
            .try_normalize(1.0e-6)
            .unwrap_or_else(Vec3::y)
    }
}
