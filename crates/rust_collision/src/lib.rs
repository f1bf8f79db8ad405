//! # Rust Collision
//!
//! Narrow-phase collision detection for rigid-body simulation.
//!
//! ## Features
//!
//! - **Primitives**: Boxes, spheres, capsules, planes, heightmaps and static triangle meshes
//! - **Geometric Queries**: Closest points, intersections and swept-sphere time of impact
//! - **Spatial Indices**: Octree and k-d tree over static mesh triangles
//! - **Pair Detectors**: Contact manifolds with a shared normal per pair
//! - **Configuration**: TOML and RON tuning files
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_collision::prelude::*;
//!
//! let mut ground = CollisionSkin::new();
//! ground.add_primitive(Plane::from_point_normal(Vec3::zeros(), Vec3::y()));
//!
//! let mut ball = CollisionSkin::with_owner(BodyPose::at_rest(Vec3::zeros()));
//! ball.add_primitive(Sphere::new(Vec3::new(0.0, 0.45, 0.0), 0.5));
//!
//! let mut narrow = NarrowPhase::new(CollisionConfig::default()).unwrap();
//! let mut contacts = ContactCollector::new();
//! narrow.detect(&CollDetectInfo::new(&ball, 0, &ground, 0), &mut contacts);
//! assert_eq!(contacts.contact_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for collision users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, ConfigError, MeshIndexConfig, SpatialIndexKind},
        foundation::math::{Quat, Transform, Vec3},
        physics::collision::{
            BodyPose, Capsule, CollDetectInfo, CollisionFunctor, CollisionSkin, ContactCollector, ContactPoint,
            DetectStats, Heightmap, HeightmapData, NarrowPhase, OrientedBox, Plane, Primitive, PrimitiveKind, Sphere,
            TriangleMesh,
        },
    };
}
