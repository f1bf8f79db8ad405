//! Linear primitives: segments, lines and rays

use crate::foundation::math::{Transform, Vec3};

/// A finite line segment `origin + t * delta` for `t` in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point
    pub origin: Vec3,
    /// Vector from the start point to the end point
    pub delta: Vec3,
}

impl Segment {
    /// Create a segment from its start point and start-to-end vector
    pub fn new(origin: Vec3, delta: Vec3) -> Self {
        Self { origin, delta }
    }

    /// Create a segment between two points
    pub fn from_points(start: Vec3, end: Vec3) -> Self {
        Self {
            origin: start,
            delta: end - start,
        }
    }

    /// Point at parameter `t`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.delta * t
    }

    /// End point
    pub fn end(&self) -> Vec3 {
        self.origin + self.delta
    }

    /// Squared length
    pub fn length_sq(&self) -> f32 {
        self.delta.magnitude_squared()
    }

    /// Segment after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> Segment {
        Segment {
            origin: transform.transform_point(self.origin),
            delta: transform.transform_vector(self.delta),
        }
    }
}

/// An infinite line through `origin` along `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// A point on the line
    pub origin: Vec3,
    /// Direction of the line (any non-zero length)
    pub direction: Vec3,
}

impl Line {
    /// Create a new line
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A half-line for ray casting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get a point along the ray at parameter `t`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
