//! Physics module for collision detection
//!
//! Only the narrow phase lives here. Broad-phase pair finding and contact
//! resolution belong to the body layer that drives it.

pub mod collision;

pub use collision::{
    CollDetectInfo,
    CollisionFunctor,
    CollisionSkin,
    ContactPoint,
    NarrowPhase,
};
