//! K-d tree over triangle centroids
//!
//! Every node holds one triangle (the median of its partition along
//! `depth % 3`) plus a region box covering its whole subtree and a tight box
//! around its own triangle. Both boxes are inflated by a small epsilon.
//! Nodes identify their triangle by the packed key of its vertex indices.

use super::{CandidateBuffer, TriangleIndex, NO_NODE};
use crate::foundation::math::Vec3;
use crate::physics::collision::primitives::{GeometryError, AABB};

const KEY_BITS: u32 = 21;
const KEY_MASK: u64 = (1 << KEY_BITS) - 1;

// A median split halves each partition, so depth stays under 32 for u32 triangle counts
const QUERY_STACK_CAPACITY: usize = 2 * 33;

/// Pack three vertex indices (each below 2^21) into one key
pub fn pack_triangle_key(i0: u32, i1: u32, i2: u32) -> Result<u64, GeometryError> {
    for index in [i0, i1, i2] {
        if u64::from(index) > KEY_MASK {
            return Err(GeometryError::VertexKeyOverflow(index));
        }
    }
    Ok(u64::from(i0) | (u64::from(i1) << KEY_BITS) | (u64::from(i2) << (2 * KEY_BITS)))
}

/// Single k-d tree node
#[derive(Debug, Clone)]
pub struct KdNode {
    /// Bounds of this node's triangle and all descendants
    pub region: AABB,
    /// Bounds of this node's own triangle
    pub tight: AABB,
    /// Packed vertex-index key of this node's triangle
    pub key: u64,
    /// Child holding centroids below the median, [`NO_NODE`] when absent
    pub left: u32,
    /// Child holding centroids above the median, [`NO_NODE`] when absent
    pub right: u32,
}

/// Centroid-median k-d tree
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: u32,
    lookup: Vec<(u64, u32)>,
}

struct BuildEntry {
    triangle: u32,
    key: u64,
    centroid: Vec3,
    aabb: AABB,
}

impl KdTree {
    /// Build over `triangles` (vertex index triples into `vertices`)
    ///
    /// Triangles repeating an earlier index triple are dropped; they would map to
    /// the same key.
    pub fn build(
        triangles: &[[u32; 3]],
        vertices: &[Vec3],
        epsilon: f32,
    ) -> Result<Self, GeometryError> {
        let mut lookup = Vec::with_capacity(triangles.len());
        for (i, t) in triangles.iter().enumerate() {
            lookup.push((pack_triangle_key(t[0], t[1], t[2])?, i as u32));
        }
        lookup.sort_unstable();

        let before = lookup.len();
        lookup.dedup_by_key(|entry| entry.0);
        if lookup.len() != before {
            log::warn!(
                "K-d tree dropped {} duplicate triangles",
                before - lookup.len()
            );
        }

        let mut entries: Vec<BuildEntry> = lookup
            .iter()
            .map(|&(key, triangle)| {
                let corners = triangles[triangle as usize].map(|i| vertices[i as usize]);
                BuildEntry {
                    triangle,
                    key,
                    centroid: (corners[0] + corners[1] + corners[2]) / 3.0,
                    aabb: AABB::from_points(&corners),
                }
            })
            .collect();

        let mut nodes = Vec::with_capacity(entries.len());
        let root = Self::build_range(&mut nodes, &mut entries, 0, epsilon);

        log::debug!(
            "Built k-d tree: {} triangles, {} nodes",
            triangles.len(),
            nodes.len()
        );

        Ok(Self {
            nodes,
            root,
            lookup,
        })
    }

    fn build_range(
        nodes: &mut Vec<KdNode>,
        entries: &mut [BuildEntry],
        depth: usize,
        epsilon: f32,
    ) -> u32 {
        if entries.is_empty() {
            return NO_NODE;
        }

        let axis = depth % 3;
        let median = entries.len() / 2;
        entries.select_nth_unstable_by(median, |a, b| {
            a.centroid[axis]
                .total_cmp(&b.centroid[axis])
                .then(a.triangle.cmp(&b.triangle))
        });

        let index = nodes.len();
        let tight = entries[median].aabb.inflated(epsilon);
        nodes.push(KdNode {
            region: tight,
            tight,
            key: entries[median].key,
            left: NO_NODE,
            right: NO_NODE,
        });

        let (below, rest) = entries.split_at_mut(median);
        let above = &mut rest[1..];
        let left = Self::build_range(nodes, below, depth + 1, epsilon);
        let right = Self::build_range(nodes, above, depth + 1, epsilon);

        let mut region = tight;
        for child in [left, right] {
            if child != NO_NODE {
                region = region.merge(&nodes[child as usize].region);
            }
        }

        let node = &mut nodes[index];
        node.region = region;
        node.left = left;
        node.right = right;
        index as u32
    }

    /// Triangle index of the triangle with these vertex indices
    pub fn triangle_for_vertices(&self, i0: u32, i1: u32, i2: u32) -> Option<u32> {
        let key = pack_triangle_key(i0, i1, i2).ok()?;
        self.triangle_for_key(key)
    }

    fn triangle_for_key(&self, key: u64) -> Option<u32> {
        self.lookup
            .binary_search_by_key(&key, |entry| entry.0)
            .ok()
            .map(|slot| self.lookup[slot].1)
    }

    /// Flat node array
    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }
}

impl TriangleIndex for KdTree {
    fn query(&self, aabb: &AABB, out: &mut CandidateBuffer) -> usize {
        if self.root == NO_NODE {
            return 0;
        }

        let mut stack = [0u32; QUERY_STACK_CAPACITY];
        stack[0] = self.root;
        let mut top = 1;
        let mut emitted = 0;

        while top > 0 {
            top -= 1;
            let node = &self.nodes[stack[top] as usize];
            if !node.region.intersects(aabb) {
                continue;
            }

            if node.tight.intersects(aabb) {
                if let Some(triangle) = self.triangle_for_key(node.key) {
                    if out.push(triangle) {
                        emitted += 1;
                    }
                }
            }

            for child in [node.left, node.right] {
                if child != NO_NODE {
                    stack[top] = child;
                    top += 1;
                }
            }
        }

        emitted
    }

    fn bounds(&self) -> AABB {
        if self.root == NO_NODE {
            AABB::new(Vec3::zeros(), Vec3::zeros())
        } else {
            self.nodes[self.root as usize].region
        }
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(count: usize) -> (Vec<Vec3>, Vec<[u32; 3]>) {
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        for i in 0..count {
            let base = vertices.len() as u32;
            let x = i as f32;
            vertices.push(Vec3::new(x, 0.0, 0.0));
            vertices.push(Vec3::new(x + 0.5, 0.0, 0.0));
            vertices.push(Vec3::new(x, 0.0, 0.5));
            triangles.push([base, base + 1, base + 2]);
        }
        (vertices, triangles)
    }

    #[test]
    fn test_key_packing() {
        let key = pack_triangle_key(1, 2, 3).unwrap();
        assert_eq!(key & KEY_MASK, 1);
        assert_eq!((key >> 21) & KEY_MASK, 2);
        assert_eq!(key >> 42, 3);
        assert!(matches!(
            pack_triangle_key(1 << 21, 0, 0),
            Err(GeometryError::VertexKeyOverflow(_))
        ));
    }

    #[test]
    fn test_triangle_lookup() {
        let (vertices, triangles) = strip(8);
        let tree = KdTree::build(&triangles, &vertices, 1e-4).unwrap();
        assert_eq!(tree.node_count(), 8);
        assert_eq!(tree.triangle_for_vertices(9, 10, 11), Some(3));
        assert_eq!(tree.triangle_for_vertices(11, 10, 9), None);
    }

    #[test]
    fn test_kd_query() {
        let (vertices, triangles) = strip(16);
        let tree = KdTree::build(&triangles, &vertices, 1e-4).unwrap();

        let mut out = CandidateBuffer::new();
        let query = AABB::new(Vec3::new(4.6, -1.0, -1.0), Vec3::new(6.2, 1.0, 1.0));
        tree.query(&query, &mut out);

        let mut found = out.as_slice().to_vec();
        found.sort_unstable();
        assert_eq!(found, vec![5, 6]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let vertices = vec![Vec3::zeros(), Vec3::x(), Vec3::z()];
        let triangles = vec![[0, 1, 2], [0, 1, 2]];
        let tree = KdTree::build(&triangles, &vertices, 1e-4).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.triangle_for_vertices(0, 1, 2), Some(0));
    }
}
