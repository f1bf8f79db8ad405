//! Narrow-phase collision detection
//!
//! Turns a candidate pair of collision primitives into contact records for a
//! constraint solver.
//!
//! # Module Organization
//!
//! - [`primitives`] - Geometric primitives and the closed [`Primitive`] variant
//! - [`distance`], [`intersection`], [`overlap`] - Geometric queries
//! - [`skin`] - Per-body primitive lists with start and end of step poses
//! - [`contact`] - Contact records and the consumer callback
//! - [`detect`] - One detector per primitive kind pair
//! - [`dispatch`] - Detector lookup and the [`NarrowPhase`] entry point
//!
//! # Conventions
//!
//! - Every notification carries a single unit normal pointing toward body A
//! - Penetration depth is positive when overlapping and may be slightly
//!   negative for contacts inside the collision tolerance band
//! - Heightmaps, planes and meshes are static; pairs of them are never tested

pub mod contact;
pub mod detect;
pub mod dispatch;
pub mod distance;
pub mod intersection;
pub mod overlap;
pub mod primitives;
pub mod skin;

#[cfg(test)]
mod tests;

pub use contact::{CollisionFunctor, CollisionReport, ContactBuffer, ContactCollector, ContactPoint, MAX_CONTACTS};
pub use dispatch::{DetectStats, Detector, DetectorTable, NarrowPhase};
pub use primitives::{
    Capsule, GeometryError, Heightmap, HeightmapData, OrientedBox, Plane, Primitive, PrimitiveKind, Sphere,
    TriangleMesh,
};
pub use skin::{BodyPose, CollDetectInfo, CollisionSkin};
