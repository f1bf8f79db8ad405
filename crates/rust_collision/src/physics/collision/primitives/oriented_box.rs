//! Oriented boxes

use super::aabb::AABB;
use super::segment::Segment;
use crate::foundation::math::{Quat, Transform, Vec3};

/// Corner index pairs forming the 12 box edges; corner `i` has sign bits x=1, y=2, z=4
const EDGE_CORNERS: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7),
    (0, 2), (1, 3), (4, 6), (5, 7),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

/// A box with arbitrary orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Centre of the box
    pub center: Vec3,
    /// Orientation of the box axes
    pub rotation: Quat,
    /// Half side lengths along the local axes
    pub half_extents: Vec3,
}

impl OrientedBox {
    /// Create a box from centre, orientation and half side lengths
    pub fn new(center: Vec3, rotation: Quat, half_extents: Vec3) -> Self {
        Self {
            center,
            rotation,
            half_extents,
        }
    }

    /// Axis-aligned box
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, Quat::identity(), half_extents)
    }

    /// The box's own frame
    pub fn frame(&self) -> Transform {
        Transform::from_position_rotation(self.center, self.rotation)
    }

    /// Local axes in world space
    pub fn axes(&self) -> [Vec3; 3] {
        let m = self.frame().rotation_matrix();
        [
            m.column(0).into_owned(),
            m.column(1).into_owned(),
            m.column(2).into_owned(),
        ]
    }

    /// Corner `i`; bit 0 selects +x, bit 1 +y, bit 2 +z
    pub fn corner(&self, i: usize) -> Vec3 {
        let sign = |bit: usize| if i & bit != 0 { 1.0 } else { -1.0 };
        let local = Vec3::new(
            sign(1) * self.half_extents.x,
            sign(2) * self.half_extents.y,
            sign(4) * self.half_extents.z,
        );
        self.center + self.rotation * local
    }

    /// All eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| self.corner(i))
    }

    /// All twelve edges
    pub fn edges(&self) -> [Segment; 12] {
        let corners = self.corners();
        std::array::from_fn(|i| {
            let (a, b) = EDGE_CORNERS[i];
            Segment::from_points(corners[a], corners[b])
        })
    }

    /// Point of the box furthest along `direction`
    pub fn support_point(&self, direction: Vec3) -> Vec3 {
        let axes = self.axes();
        let mut point = self.center;
        for (i, axis) in axes.iter().enumerate() {
            let sign = if axis.dot(&direction) >= 0.0 { 1.0 } else { -1.0 };
            point += axis * (sign * self.half_extents[i]);
        }
        point
    }

    /// Half-length of the box's projection onto a unit `axis`
    pub fn projected_radius(&self, axis: &Vec3) -> f32 {
        self.axes()
            .iter()
            .enumerate()
            .map(|(i, a)| self.half_extents[i] * a.dot(axis).abs())
            .sum()
    }

    /// Smallest full side length
    pub fn min_dimension(&self) -> f32 {
        2.0 * self.half_extents.x.min(self.half_extents.y).min(self.half_extents.z)
    }

    /// Map a world point into the box frame (centred, axis-aligned)
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&(point - self.center))
    }

    /// Map a box-frame point to world space
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.center + self.rotation * local
    }

    /// World bounding box
    pub fn aabb(&self) -> AABB {
        AABB::from_center_extents(Vec3::zeros(), self.half_extents).transformed(&self.frame())
    }

    /// Box after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> OrientedBox {
        OrientedBox {
            center: transform.transform_point(self.center),
            rotation: transform.rotation * self.rotation,
            half_extents: self.half_extents,
        }
    }
}
