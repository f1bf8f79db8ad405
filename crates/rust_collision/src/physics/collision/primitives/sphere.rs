//! Spheres and capsules

use super::aabb::AABB;
use super::segment::Segment;
use crate::foundation::math::{Transform, Vec3};

/// A sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// The center position of the sphere
    pub position: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl Sphere {
    /// Creates a new sphere with the given center and radius
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }

    /// Bounding box
    pub fn aabb(&self) -> AABB {
        AABB::from_center_extents(self.position, Vec3::repeat(self.radius))
    }

    /// Sphere after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> Sphere {
        Sphere {
            position: transform.transform_point(self.position),
            radius: self.radius,
        }
    }
}

/// A capsule: every point within `radius` of the segment `position → position + axis`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    /// Centre of the first end cap
    pub position: Vec3,
    /// Vector from the first end cap centre to the second
    pub axis: Vec3,
    /// Radius of the capsule
    pub radius: f32,
}

impl Capsule {
    /// Create a capsule from its first cap centre, axis vector and radius
    pub fn new(position: Vec3, axis: Vec3, radius: f32) -> Self {
        Self {
            position,
            axis,
            radius,
        }
    }

    /// Length of the core segment
    pub fn length(&self) -> f32 {
        self.axis.magnitude()
    }

    /// Centre of the second end cap
    pub fn end(&self) -> Vec3 {
        self.position + self.axis
    }

    /// Core segment
    pub fn segment(&self) -> Segment {
        Segment::new(self.position, self.axis)
    }

    /// Bounding box
    pub fn aabb(&self) -> AABB {
        let mut aabb = AABB::from_points(&[self.position, self.end()]);
        aabb = aabb.inflated(self.radius);
        aabb
    }

    /// Capsule after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> Capsule {
        Capsule {
            position: transform.transform_point(self.position),
            axis: transform.transform_vector(self.axis),
            radius: self.radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capsule_bounds() {
        let capsule = Capsule::new(Vec3::zeros(), Vec3::new(0.0, 2.0, 0.0), 0.5);
        let aabb = capsule.aabb();
        assert_eq!(aabb.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(aabb.max, Vec3::new(0.5, 2.5, 0.5));
        assert_eq!(capsule.length(), 2.0);
    }

    #[test]
    fn test_sphere_transform_keeps_radius() {
        let sphere = Sphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0);
        let moved = sphere.transformed(&Transform::from_position(Vec3::new(0.0, 5.0, 0.0)));
        assert_eq!(moved.position, Vec3::new(1.0, 5.0, 0.0));
        assert_eq!(moved.radius, 2.0);
    }
}
