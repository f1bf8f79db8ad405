//! Spatial partitioning data structures
//!
//! Static triangle indices for mesh collision. Both trees answer the same
//! question ("which triangles might overlap this box?") and write their
//! answers into a caller-owned [`CandidateBuffer`] without allocating.
//! Trees are built once per mesh and are read-only afterwards, so they can be
//! shared across threads.

mod kd_tree;
mod octree;

pub use kd_tree::{pack_triangle_key, KdNode, KdTree};
pub use octree::{Octree, OctreeNode, MAX_OCTREE_DEPTH};

use crate::config::{MeshIndexConfig, SpatialIndexKind};
use crate::foundation::math::Vec3;
use crate::physics::collision::primitives::{GeometryError, AABB};

/// Capacity of a [`CandidateBuffer`]
pub const MAX_CANDIDATE_TRIANGLES: usize = 2048;

/// Sentinel for a missing child in flat node arrays
pub const NO_NODE: u32 = u32::MAX;

/// Fixed-capacity list of candidate triangle indices
///
/// Pushing past capacity drops the index and records the loss, so a caller
/// can tell a complete answer from a truncated one.
#[derive(Debug, Clone)]
pub struct CandidateBuffer {
    indices: Box<[u32; MAX_CANDIDATE_TRIANGLES]>,
    len: usize,
    dropped: usize,
}

impl Default for CandidateBuffer {
    fn default() -> Self {
        Self {
            indices: Box::new([0; MAX_CANDIDATE_TRIANGLES]),
            len: 0,
            dropped: 0,
        }
    }
}

impl CandidateBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all entries and the truncation count
    pub fn clear(&mut self) {
        self.len = 0;
        self.dropped = 0;
    }

    /// Append an index; returns false (and counts the drop) when full
    pub fn push(&mut self, index: u32) -> bool {
        if self.len < MAX_CANDIDATE_TRIANGLES {
            self.indices[self.len] = index;
            self.len += 1;
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Stored indices
    pub fn as_slice(&self) -> &[u32] {
        &self.indices[..self.len]
    }

    /// Number of stored indices
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of stored indices
    pub fn capacity(&self) -> usize {
        MAX_CANDIDATE_TRIANGLES
    }

    /// True if any index was dropped since the last clear
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }

    /// Number of indices dropped since the last clear
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Static triangle index over a mesh's local space
pub trait TriangleIndex: Send + Sync {
    /// Append every triangle whose bounds may overlap `aabb`; returns how many were appended
    fn query(&self, aabb: &AABB, out: &mut CandidateBuffer) -> usize;

    /// Bounds of all indexed triangles
    fn bounds(&self) -> AABB;

    /// Number of tree nodes
    fn node_count(&self) -> usize;
}

/// The spatial index a mesh was built with
#[derive(Debug, Clone)]
pub enum MeshIndex {
    /// Adaptive octree
    Octree(Octree),
    /// Centroid-median k-d tree
    KdTree(KdTree),
}

impl MeshIndex {
    /// Build the index selected by `config` over `triangles` (vertex index triples)
    pub fn build(
        config: &MeshIndexConfig,
        triangles: &[[u32; 3]],
        vertices: &[Vec3],
    ) -> Result<Self, GeometryError> {
        match config.kind {
            SpatialIndexKind::Octree => {
                let boxes: Vec<AABB> = triangles
                    .iter()
                    .map(|t| AABB::from_points(&t.map(|i| vertices[i as usize])))
                    .collect();
                Ok(MeshIndex::Octree(Octree::build(&boxes, config.octree_max_depth)))
            }
            SpatialIndexKind::KdTree => Ok(MeshIndex::KdTree(KdTree::build(
                triangles,
                vertices,
                config.kd_epsilon,
            )?)),
        }
    }

    /// Which implementation this is
    pub fn kind(&self) -> SpatialIndexKind {
        match self {
            MeshIndex::Octree(_) => SpatialIndexKind::Octree,
            MeshIndex::KdTree(_) => SpatialIndexKind::KdTree,
        }
    }
}

impl TriangleIndex for MeshIndex {
    fn query(&self, aabb: &AABB, out: &mut CandidateBuffer) -> usize {
        match self {
            MeshIndex::Octree(tree) => tree.query(aabb, out),
            MeshIndex::KdTree(tree) => tree.query(aabb, out),
        }
    }

    fn bounds(&self) -> AABB {
        match self {
            MeshIndex::Octree(tree) => tree.bounds(),
            MeshIndex::KdTree(tree) => tree.bounds(),
        }
    }

    fn node_count(&self) -> usize {
        match self {
            MeshIndex::Octree(tree) => tree.node_count(),
            MeshIndex::KdTree(tree) => tree.node_count(),
        }
    }
}
