//! Octree over static triangles
//!
//! Each triangle is stored exactly once, in the deepest octant that fully
//! contains its bounding box. Triangles straddling an octant boundary stay in
//! the parent, so no triangle is ever split or duplicated. Nodes live in a
//! flat array and own a contiguous range of a flat triangle-index array.

use super::{CandidateBuffer, TriangleIndex, NO_NODE};
use crate::foundation::math::Vec3;
use crate::physics::collision::primitives::AABB;

/// Hard limit on subdivision depth; bounds the query stack
pub const MAX_OCTREE_DEPTH: u32 = 16;

const QUERY_STACK_CAPACITY: usize = 8 * (MAX_OCTREE_DEPTH as usize + 1);

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// Local-space bounds of this node
    pub bounds: AABB,

    /// Child node per octant, [`NO_NODE`] when absent
    pub children: [u32; 8],

    /// Start of this node's range in the triangle-index array
    pub first_triangle: u32,

    /// Number of triangles stored at this node
    pub triangle_count: u32,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl OctreeNode {
    fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            children: [NO_NODE; 8],
            first_triangle: 0,
            triangle_count: 0,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(|&c| c == NO_NODE)
    }
}

/// Bounds of octant `octant` of `bounds`
///
/// Octant layout:
/// 0: -X, -Y, -Z   1: +X, -Y, -Z   2: -X, +Y, -Z   3: +X, +Y, -Z
/// 4: -X, -Y, +Z   5: +X, -Y, +Z   6: -X, +Y, +Z   7: +X, +Y, +Z
fn octant_bounds(bounds: &AABB, octant: usize) -> AABB {
    let center = bounds.center();
    let quarter_extents = bounds.extents() * 0.5;
    let x_sign = if octant & 1 != 0 { 1.0 } else { -1.0 };
    let y_sign = if octant & 2 != 0 { 1.0 } else { -1.0 };
    let z_sign = if octant & 4 != 0 { 1.0 } else { -1.0 };

    let child_center = Vec3::new(
        center.x + quarter_extents.x * x_sign,
        center.y + quarter_extents.y * y_sign,
        center.z + quarter_extents.z * z_sign,
    );
    AABB::from_center_extents(child_center, quarter_extents)
}

/// Octant that fully contains `aabb`, if any
fn containing_octant(bounds: &AABB, aabb: &AABB) -> Option<usize> {
    let center = bounds.center();
    let mut octant = 0;
    for axis in 0..3 {
        if aabb.min[axis] >= center[axis] {
            octant |= 1 << axis;
        } else if aabb.max[axis] > center[axis] {
            return None;
        }
    }
    Some(octant)
}

/// Adaptive octree over triangle bounding boxes
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    triangles: Vec<u32>,
    triangle_boxes: Vec<AABB>,
}

impl Octree {
    /// Build from per-triangle local bounding boxes (triangle `i` has box `boxes[i]`)
    pub fn build(boxes: &[AABB], max_depth: u32) -> Self {
        let max_depth = if max_depth > MAX_OCTREE_DEPTH {
            log::warn!(
                "Octree depth {} exceeds limit, clamping to {}",
                max_depth,
                MAX_OCTREE_DEPTH
            );
            MAX_OCTREE_DEPTH
        } else {
            max_depth
        };

        let root_bounds = if boxes.is_empty() {
            AABB::new(Vec3::zeros(), Vec3::zeros())
        } else {
            boxes.iter().fold(AABB::empty(), |acc, b| acc.merge(b))
        };

        let mut nodes = vec![OctreeNode::new(root_bounds, 0)];
        let mut node_triangles: Vec<Vec<u32>> = vec![Vec::new()];

        for (triangle, aabb) in boxes.iter().enumerate() {
            let mut node = 0usize;
            while nodes[node].depth < max_depth {
                let Some(octant) = containing_octant(&nodes[node].bounds, aabb) else {
                    break;
                };
                let child = nodes[node].children[octant];
                node = if child == NO_NODE {
                    let bounds = octant_bounds(&nodes[node].bounds, octant);
                    let depth = nodes[node].depth + 1;
                    let index = nodes.len();
                    nodes.push(OctreeNode::new(bounds, depth));
                    node_triangles.push(Vec::new());
                    nodes[node].children[octant] = index as u32;
                    index
                } else {
                    child as usize
                };
            }
            node_triangles[node].push(triangle as u32);
        }

        // Flatten per-node lists into contiguous ranges
        let mut triangles = Vec::with_capacity(boxes.len());
        for (node, list) in nodes.iter_mut().zip(node_triangles) {
            node.first_triangle = triangles.len() as u32;
            node.triangle_count = list.len() as u32;
            triangles.extend(list);
        }

        let deepest = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        log::debug!(
            "Built octree: {} triangles, {} nodes, depth {}",
            boxes.len(),
            nodes.len(),
            deepest
        );

        Self {
            nodes,
            triangles,
            triangle_boxes: boxes.to_vec(),
        }
    }

    /// Flat node array; node 0 is the root
    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    /// Triangles stored directly at `node`
    pub fn node_triangles(&self, node: &OctreeNode) -> &[u32] {
        let start = node.first_triangle as usize;
        &self.triangles[start..start + node.triangle_count as usize]
    }

    /// Get all leaf nodes (for debugging and visualization)
    pub fn leaves(&self) -> impl Iterator<Item = &OctreeNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }
}

impl TriangleIndex for Octree {
    fn query(&self, aabb: &AABB, out: &mut CandidateBuffer) -> usize {
        if self.triangle_boxes.is_empty() {
            return 0;
        }

        let mut stack = [0u32; QUERY_STACK_CAPACITY];
        let mut top = 1;
        let mut emitted = 0;

        while top > 0 {
            top -= 1;
            let node = &self.nodes[stack[top] as usize];
            if !node.bounds.intersects(aabb) {
                continue;
            }

            for &triangle in self.node_triangles(node) {
                if self.triangle_boxes[triangle as usize].intersects(aabb) && out.push(triangle) {
                    emitted += 1;
                }
            }

            for &child in node.children.iter().filter(|&&c| c != NO_NODE) {
                stack[top] = child;
                top += 1;
            }
        }

        emitted
    }

    fn bounds(&self) -> AABB {
        self.nodes[0].bounds
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(center: Vec3) -> AABB {
        AABB::from_center_extents(center, Vec3::repeat(0.1))
    }

    #[test]
    fn test_small_triangles_descend() {
        let boxes = vec![
            unit_box_at(Vec3::new(-5.0, -5.0, -5.0)),
            unit_box_at(Vec3::new(5.0, 5.0, 5.0)),
            unit_box_at(Vec3::new(4.0, 4.0, 4.0)),
        ];
        let octree = Octree::build(&boxes, 12);

        assert!(octree.node_count() > 1);
        assert_eq!(octree.node_triangles(&octree.nodes()[0]).len(), 0);
        assert!(octree.leaves().count() >= 2);
    }

    #[test]
    fn test_straddling_triangle_stays_at_root() {
        let boxes = vec![
            AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0)),
            unit_box_at(Vec3::new(-0.5, -0.5, -0.5)),
            unit_box_at(Vec3::new(0.5, 0.5, 0.5)),
        ];
        let octree = Octree::build(&boxes, 12);
        assert_eq!(octree.node_triangles(&octree.nodes()[0]), &[0]);
    }

    #[test]
    fn test_octree_query() {
        let boxes: Vec<AABB> = (0..10)
            .map(|i| unit_box_at(Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        let octree = Octree::build(&boxes, 12);

        let mut out = CandidateBuffer::new();
        let query = AABB::new(Vec3::new(2.5, -1.0, -1.0), Vec3::new(5.05, 1.0, 1.0));
        let count = octree.query(&query, &mut out);

        let mut found = out.as_slice().to_vec();
        found.sort_unstable();
        assert_eq!(count, 3);
        assert_eq!(found, vec![3, 4, 5]);
    }

    #[test]
    fn test_depth_zero_keeps_everything_at_root() {
        let boxes = vec![unit_box_at(Vec3::new(-5.0, 0.0, 0.0)), unit_box_at(Vec3::new(5.0, 0.0, 0.0))];
        let octree = Octree::build(&boxes, 0);
        assert_eq!(octree.node_count(), 1);
        assert_eq!(octree.node_triangles(&octree.nodes()[0]).len(), 2);
    }
}
