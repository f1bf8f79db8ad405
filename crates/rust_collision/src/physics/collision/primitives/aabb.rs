//! Axis-aligned bounding boxes

use crate::foundation::math::{utils, Transform, Vec3};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// An inverted box that any `add_point` will replace
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(-f32::MAX),
        }
    }

    /// Smallest box containing all `points`
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.add_point(*point);
        }
        aabb
    }

    /// True if no point has been added to an [`AABB::empty`] box
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a point
    pub fn add_point(&mut self, point: Vec3) {
        self.min = utils::min_vec(self.min, point);
        self.max = utils::max_vec(self.max, point);
    }

    /// Smallest box containing both boxes
    pub fn merge(&self, other: &AABB) -> AABB {
        AABB {
            min: utils::min_vec(self.min, other.min),
            max: utils::max_vec(self.max, other.max),
        }
    }

    /// Grow by `amount` on every side
    pub fn inflated(&self, amount: f32) -> AABB {
        let pad = Vec3::repeat(amount);
        AABB {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB fully contains another AABB
    pub fn contains_aabb(&self, other: &AABB) -> bool {
        other.min.x >= self.min.x && other.max.x <= self.max.x &&
        other.min.y >= self.min.y && other.max.y <= self.max.y &&
        other.min.z >= self.min.z && other.max.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Bounding box of this box after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> AABB {
        let rotation = transform.rotation_matrix().abs();
        let center = transform.transform_point(self.center());
        let extents = rotation * self.extents();
        AABB::from_center_extents(center, extents)
    }

    /// Test ray intersection with this AABB using slab method
    /// Returns the distance to the entry point if the ray intersects, None otherwise
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray_dir.x != 0.0 { 1.0 / ray_dir.x } else { f32::INFINITY },
            if ray_dir.y != 0.0 { 1.0 / ray_dir.y } else { f32::INFINITY },
            if ray_dir.z != 0.0 { 1.0 / ray_dir.z } else { f32::INFINITY },
        );

        let t1 = (self.min.x - ray_origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray_origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray_origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray_origin.y) * inv_dir.y;
        let t5 = (self.min.z - ray_origin.z) * inv_dir.z;
        let t6 = (self.max.z - ray_origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        // Ray intersects if tmax >= tmin and tmax >= 0
        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_then_points() {
        let mut aabb = AABB::empty();
        assert!(aabb.is_empty());
        aabb.add_point(Vec3::new(1.0, 2.0, 3.0));
        aabb.add_point(Vec3::new(-1.0, 0.0, 5.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_contains_and_intersects() {
        let outer = AABB::new(Vec3::repeat(-2.0), Vec3::repeat(2.0));
        let inner = AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0));
        let far = AABB::new(Vec3::repeat(3.0), Vec3::repeat(4.0));

        assert!(outer.contains_aabb(&inner));
        assert!(!inner.contains_aabb(&outer));
        assert!(outer.intersects(&inner));
        assert!(!outer.intersects(&far));
    }

    #[test]
    fn test_transformed_rotated_box_grows() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let transform = Transform::from_position_rotation(Vec3::new(5.0, 0.0, 0.0), rotation);
        let moved = aabb.transformed(&transform);

        assert_relative_eq!(moved.center(), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(moved.extents().x, 2.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(moved.extents().z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_slab() {
        let aabb = AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0));
        let hit = aabb.intersect_ray(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(hit.unwrap(), 4.0, epsilon = 1e-6);
        assert!(aabb.intersect_ray(Vec3::new(-5.0, 3.0, 0.0), Vec3::new(1.0, 0.0, 0.0)).is_none());
    }
}
