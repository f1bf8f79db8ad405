//! Infinite planes

use crate::foundation::math::{Transform, Vec3};

/// Plane defined by normal and offset: points `p` with `normal·p + d = 0`
///
/// The positive half-space (in front of the plane) is solid-free; collision
/// against a plane treats everything behind it as penetrating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Offset from the origin along `-normal`
    pub d: f32,
}

impl Plane {
    /// Create a plane from a normal (normalized here) and offset
    pub fn new(normal: Vec3, d: f32) -> Self {
        let length = normal.magnitude();
        if length > 0.0 {
            Self {
                normal: normal / length,
                d: d / length,
            }
        } else {
            Self { normal, d }
        }
    }

    /// Create a plane through `point` with the given normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            d: -normal.dot(&point),
        }
    }

    /// Plane through three counter-clockwise points
    pub fn from_points(p0: Vec3, p1: Vec3, p2: Vec3) -> Self {
        let normal = (p1 - p0).cross(&(p2 - p0));
        let normal = normal.try_normalize(0.0).unwrap_or_else(Vec3::zeros);
        Self {
            normal,
            d: -normal.dot(&p0),
        }
    }

    /// Signed distance from a point to the plane (positive in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.d
    }

    /// Closest point on the plane
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.distance_to_point(point)
    }

    /// Plane after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> Plane {
        let normal = transform.transform_vector(self.normal);
        let point = transform.transform_point(self.normal * -self.d);
        Plane {
            normal,
            d: -normal.dot(&point),
        }
    }

    /// Same plane facing the other way
    pub fn inverted(&self) -> Plane {
        Plane {
            normal: -self.normal,
            d: -self.d,
        }
    }
}
