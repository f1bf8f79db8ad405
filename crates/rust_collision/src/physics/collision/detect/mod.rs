//! Pairwise collision detectors
//!
//! One detector per registered (kindA, kindB) pair. Every detector receives
//! the pair already in its canonical order, reads the start and end of step
//! world primitives from the skins, and notifies the functor at most once.
//!
//! - [`box_box`]: separating axes and clipped manifolds between two boxes
//! - [`round`]: sphere and capsule pairs against each other and against boxes
//! - [`plane`]: boxes, spheres and capsules against infinite planes
//! - [`heightmap`]: boxes, spheres and capsules against height fields
//! - [`mesh`]: boxes, spheres and capsules against static triangle meshes

pub mod box_box;
pub mod heightmap;
pub mod mesh;
pub mod plane;
pub mod round;

use super::contact::{CollisionFunctor, ContactBuffer};
use super::dispatch::DetectStats;
use super::primitives::{Capsule, Heightmap, OrientedBox, Plane, Primitive, PrimitiveKind, Sphere, TriangleMesh};
use super::skin::CollDetectInfo;
use crate::config::CollisionConfig;
use crate::foundation::math::{utils, Vec3};
use crate::spatial::CandidateBuffer;

/// Per-call state lent to a detector by the narrow phase
pub struct DetectContext<'a> {
    /// Validated tuning
    pub config: &'a CollisionConfig,
    /// Scratch buffer for mesh candidate triangles
    pub candidates: &'a mut CandidateBuffer,
    /// Counters updated by the detector
    pub stats: &'a mut DetectStats,
}

impl DetectContext<'_> {
    /// Deliver `contacts` to `functor` if there are any
    pub fn report(
        &mut self,
        info: &CollDetectInfo<'_>,
        normal: Vec3,
        contacts: &ContactBuffer,
        functor: &mut dyn CollisionFunctor,
    ) -> bool {
        if contacts.is_empty() {
            return false;
        }
        if contacts.is_truncated() {
            self.stats.truncated_contacts += contacts.dropped() as u64;
            log::debug!(
                "Dropped {} contacts between {} and {}",
                contacts.dropped(),
                info.kind0().name(),
                info.kind1().name()
            );
        }
        self.stats.notifications += 1;
        self.stats.contacts += contacts.len() as u64;
        functor.collision_notify(info, normal, contacts.as_slice());
        true
    }

    /// Record a truncated candidate query
    pub fn note_candidate_truncation(&mut self, detector: &'static str) {
        if self.candidates.is_truncated() {
            self.stats.truncated_candidates += self.candidates.dropped() as u64;
            log::debug!(
                "{} candidate query dropped {} triangles",
                detector,
                self.candidates.dropped()
            );
        }
    }
}

/// First direction in `candidates` that can be normalized, else the configured fallback
pub(crate) fn resolve_normal(candidates: &[Vec3], config: &CollisionConfig) -> Vec3 {
    candidates
        .iter()
        .find_map(|v| utils::try_normalize(*v))
        .unwrap_or_else(|| config.fallback_normal())
}

/// Number of sweep samples for a primitive of smallest dimension `min_dim` travelling `travel`
pub(crate) fn sweep_sample_count(travel: f32, min_dim: f32, max_samples: u32) -> u32 {
    let step = 0.5 * min_dim;
    if step <= 0.0 || !travel.is_finite() {
        return max_samples;
    }
    let needed = (travel / step).ceil();
    if needed >= max_samples as f32 {
        max_samples
    } else {
        (needed as u32).max(1)
    }
}

#[cold]
fn contract_violation(detector: &'static str, kind: PrimitiveKind) -> ! {
    panic!("{} detector received a {} primitive", detector, kind.name())
}

pub(crate) fn expect_box<'p>(prim: &'p Primitive, detector: &'static str) -> &'p OrientedBox {
    match prim {
        Primitive::Box(b) => b,
        other => contract_violation(detector, other.kind()),
    }
}

pub(crate) fn expect_sphere<'p>(prim: &'p Primitive, detector: &'static str) -> &'p Sphere {
    match prim {
        Primitive::Sphere(s) => s,
        other => contract_violation(detector, other.kind()),
    }
}

pub(crate) fn expect_capsule<'p>(prim: &'p Primitive, detector: &'static str) -> &'p Capsule {
    match prim {
        Primitive::Capsule(c) => c,
        other => contract_violation(detector, other.kind()),
    }
}

pub(crate) fn expect_plane<'p>(prim: &'p Primitive, detector: &'static str) -> &'p Plane {
    match prim {
        Primitive::Plane(p) => p,
        other => contract_violation(detector, other.kind()),
    }
}

pub(crate) fn expect_heightmap<'p>(prim: &'p Primitive, detector: &'static str) -> &'p Heightmap {
    match prim {
        Primitive::Heightmap(h) => h,
        other => contract_violation(detector, other.kind()),
    }
}

pub(crate) fn expect_mesh<'p>(prim: &'p Primitive, detector: &'static str) -> &'p TriangleMesh {
    match prim {
        Primitive::TriangleMesh(m) => m,
        other => contract_violation(detector, other.kind()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_sample_count() {
        assert_eq!(sweep_sample_count(0.0, 1.0, 16), 1);
        assert_eq!(sweep_sample_count(1.0, 1.0, 16), 2);
        assert_eq!(sweep_sample_count(1.1, 1.0, 16), 3);
        assert_eq!(sweep_sample_count(100.0, 1.0, 16), 16);
        assert_eq!(sweep_sample_count(1.0, 0.0, 8), 8);
    }

    #[test]
    fn test_resolve_normal_falls_back() {
        let config = CollisionConfig::default();
        assert_eq!(resolve_normal(&[Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0)], &config), Vec3::x());
        assert_eq!(resolve_normal(&[Vec3::zeros()], &config), Vec3::y());
    }
}
