//! Narrow-phase dispatch
//!
//! The broad phase hands candidate pairs (two skins and a primitive index in
//! each) to [`NarrowPhase::detect`]. The pair's primitive kinds select a
//! [`Detector`] from a fixed [`DetectorTable`]; the pair is swapped into the
//! detector's canonical order when needed, and the detector runs with a
//! candidate buffer borrowed from the narrow phase's pool.

use super::contact::CollisionFunctor;
use super::detect::{box_box, heightmap, mesh, plane, round, DetectContext};
use super::primitives::PrimitiveKind;
use super::skin::CollDetectInfo;
use crate::config::{CollisionConfig, ConfigError};
use crate::foundation::memory::PoolAllocator;
use crate::spatial::CandidateBuffer;

/// Counters accumulated across detector calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectStats {
    /// Pairs that reached a registered detector
    pub pairs_tested: u64,
    /// Functor notifications issued
    pub notifications: u64,
    /// Contact points delivered
    pub contacts: u64,
    /// Contact points dropped because a buffer was full
    pub truncated_contacts: u64,
    /// Mesh triangles dropped because the candidate buffer was full
    pub truncated_candidates: u64,
}

/// Signature shared by every pairwise detector
pub type DetectFn = fn(&CollDetectInfo<'_>, &mut DetectContext<'_>, &mut dyn CollisionFunctor);

/// A registered pairwise detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detector {
    /// Box against box
    BoxBox,
    /// Box against plane
    BoxPlane,
    /// Box against heightmap
    BoxHeightmap,
    /// Box against triangle mesh
    BoxMesh,
    /// Sphere against sphere
    SphereSphere,
    /// Sphere against box
    SphereBox,
    /// Sphere against capsule
    SphereCapsule,
    /// Sphere against plane
    SpherePlane,
    /// Sphere against heightmap
    SphereHeightmap,
    /// Sphere against triangle mesh
    SphereMesh,
    /// Capsule against capsule
    CapsuleCapsule,
    /// Capsule against box
    CapsuleBox,
    /// Capsule against plane
    CapsulePlane,
    /// Capsule against heightmap
    CapsuleHeightmap,
    /// Capsule against triangle mesh
    CapsuleMesh,
}

impl Detector {
    /// Every detector, in registration order
    pub const ALL: [Detector; 15] = [
        Detector::BoxBox,
        Detector::BoxPlane,
        Detector::BoxHeightmap,
        Detector::BoxMesh,
        Detector::SphereSphere,
        Detector::SphereBox,
        Detector::SphereCapsule,
        Detector::SpherePlane,
        Detector::SphereHeightmap,
        Detector::SphereMesh,
        Detector::CapsuleCapsule,
        Detector::CapsuleBox,
        Detector::CapsulePlane,
        Detector::CapsuleHeightmap,
        Detector::CapsuleMesh,
    ];

    /// Canonical (A, B) primitive kinds
    pub fn kinds(self) -> (PrimitiveKind, PrimitiveKind) {
        use PrimitiveKind::*;
        match self {
            Detector::BoxBox => (Box, Box),
            Detector::BoxPlane => (Box, Plane),
            Detector::BoxHeightmap => (Box, Heightmap),
            Detector::BoxMesh => (Box, TriangleMesh),
            Detector::SphereSphere => (Sphere, Sphere),
            Detector::SphereBox => (Sphere, Box),
            Detector::SphereCapsule => (Sphere, Capsule),
            Detector::SpherePlane => (Sphere, Plane),
            Detector::SphereHeightmap => (Sphere, Heightmap),
            Detector::SphereMesh => (Sphere, TriangleMesh),
            Detector::CapsuleCapsule => (Capsule, Capsule),
            Detector::CapsuleBox => (Capsule, Box),
            Detector::CapsulePlane => (Capsule, Plane),
            Detector::CapsuleHeightmap => (Capsule, Heightmap),
            Detector::CapsuleMesh => (Capsule, TriangleMesh),
        }
    }

    /// Name used in logs and contract violation messages
    pub fn name(self) -> &'static str {
        match self {
            Detector::BoxBox => "box-box",
            Detector::BoxPlane => "box-plane",
            Detector::BoxHeightmap => "box-heightmap",
            Detector::BoxMesh => "box-mesh",
            Detector::SphereSphere => "sphere-sphere",
            Detector::SphereBox => "sphere-box",
            Detector::SphereCapsule => "sphere-capsule",
            Detector::SpherePlane => "sphere-plane",
            Detector::SphereHeightmap => "sphere-heightmap",
            Detector::SphereMesh => "sphere-mesh",
            Detector::CapsuleCapsule => "capsule-capsule",
            Detector::CapsuleBox => "capsule-box",
            Detector::CapsulePlane => "capsule-plane",
            Detector::CapsuleHeightmap => "capsule-heightmap",
            Detector::CapsuleMesh => "capsule-mesh",
        }
    }

    /// The detection routine
    pub fn function(self) -> DetectFn {
        match self {
            Detector::BoxBox => box_box::box_box,
            Detector::BoxPlane => plane::box_plane,
            Detector::BoxHeightmap => heightmap::box_heightmap,
            Detector::BoxMesh => mesh::box_mesh,
            Detector::SphereSphere => round::sphere_sphere,
            Detector::SphereBox => round::sphere_box,
            Detector::SphereCapsule => round::sphere_capsule,
            Detector::SpherePlane => plane::sphere_plane,
            Detector::SphereHeightmap => heightmap::sphere_heightmap,
            Detector::SphereMesh => mesh::sphere_mesh,
            Detector::CapsuleCapsule => round::capsule_capsule,
            Detector::CapsuleBox => round::capsule_box,
            Detector::CapsulePlane => plane::capsule_plane,
            Detector::CapsuleHeightmap => heightmap::capsule_heightmap,
            Detector::CapsuleMesh => mesh::capsule_mesh,
        }
    }

    /// Run on a pair already in canonical order
    ///
    /// # Panics
    ///
    /// If the primitive kinds do not match [`Detector::kinds`].
    pub fn detect(self, info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
        (self.function())(info, ctx, functor)
    }
}

/// Detector lookup by primitive kind pair
///
/// Registration is symmetric: both (A, B) and (B, A) map to the same
/// detector, and the detector's own kinds decide the canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorTable {
    entries: [[Option<Detector>; PrimitiveKind::COUNT]; PrimitiveKind::COUNT],
}

impl DetectorTable {
    /// Empty table
    pub fn new() -> Self {
        Self {
            entries: [[None; PrimitiveKind::COUNT]; PrimitiveKind::COUNT],
        }
    }

    /// Table with every built-in detector registered
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for detector in Detector::ALL {
            table.register(detector);
        }
        table
    }

    /// Register `detector` for its kind pair in both orders, replacing any previous entry
    pub fn register(&mut self, detector: Detector) {
        let (a, b) = detector.kinds();
        self.entries[a.index()][b.index()] = Some(detector);
        self.entries[b.index()][a.index()] = Some(detector);
    }

    /// Remove the detector for a kind pair in both orders
    pub fn unregister(&mut self, a: PrimitiveKind, b: PrimitiveKind) {
        self.entries[a.index()][b.index()] = None;
        self.entries[b.index()][a.index()] = None;
    }

    /// Detector for a kind pair, in either order
    pub fn lookup(&self, a: PrimitiveKind, b: PrimitiveKind) -> Option<Detector> {
        self.entries[a.index()][b.index()]
    }
}

impl Default for DetectorTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Narrow-phase entry point
///
/// Owns the validated configuration, the detector table and a pool of
/// candidate buffers. Not synchronized: use one per thread.
#[derive(Debug)]
pub struct NarrowPhase {
    config: CollisionConfig,
    table: DetectorTable,
    candidates: PoolAllocator<CandidateBuffer>,
    stats: DetectStats,
}

impl NarrowPhase {
    /// Create a narrow phase with every built-in detector registered
    pub fn new(config: CollisionConfig) -> Result<Self, ConfigError> {
        Self::with_table(config, DetectorTable::with_defaults())
    }

    /// Create a narrow phase with a custom detector table
    pub fn with_table(config: CollisionConfig, table: DetectorTable) -> Result<Self, ConfigError> {
        config.validate()?;
        log::debug!(
            "Narrow phase ready: tolerance {}, sweep tests {}, {:?} mesh index",
            config.collision_tolerance,
            config.use_sweep_tests,
            config.mesh_index.kind
        );
        Ok(Self {
            config,
            table,
            candidates: PoolAllocator::new(1),
            stats: DetectStats::default(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Detector table
    pub fn table(&self) -> &DetectorTable {
        &self.table
    }

    /// Counters since creation or the last [`NarrowPhase::reset_stats`]
    pub fn stats(&self) -> &DetectStats {
        &self.stats
    }

    /// Zero the counters
    pub fn reset_stats(&mut self) {
        self.stats = DetectStats::default();
    }

    /// Test one candidate pair, notifying `functor` at most once
    ///
    /// Returns false without touching `functor` when no detector is
    /// registered for the pair, which includes every static-static pair.
    /// Otherwise returns true once the detector has run, whether or not it
    /// found contacts.
    pub fn detect(&mut self, info: &CollDetectInfo<'_>, functor: &mut dyn CollisionFunctor) -> bool {
        let Some(detector) = self.table.lookup(info.kind0(), info.kind1()) else {
            log::trace!(
                "No detector for {} / {}",
                info.kind0().name(),
                info.kind1().name()
            );
            return false;
        };

        let mut canonical = *info;
        if detector.kinds().0 != info.kind0() {
            canonical.swap();
        }
        log::trace!("Dispatching {} pair", detector.name());

        let mut candidates = self.candidates.acquire();
        candidates.clear();
        {
            let mut ctx = DetectContext {
                config: &self.config,
                candidates: &mut candidates,
                stats: &mut self.stats,
            };
            ctx.stats.pairs_tested += 1;
            detector.detect(&canonical, &mut ctx, functor);
        }
        self.candidates.release(candidates);
        true
    }
}
