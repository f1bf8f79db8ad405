//! Triangles in origin + two-edge form

use super::aabb::AABB;
use super::plane::Plane;
use super::segment::{Ray, Segment};
use crate::foundation::math::{Transform, Vec3};
use crate::physics::collision::{distance, intersection};

/// A triangle for collision detection, stored as `origin + s*edge0 + t*edge1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub origin: Vec3,
    /// Second vertex minus first vertex
    pub edge0: Vec3,
    /// Third vertex minus first vertex
    pub edge1: Vec3,
}

impl Triangle {
    /// Creates a new triangle from its three vertices
    pub fn from_points(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self {
            origin: v0,
            edge0: v1 - v0,
            edge1: v2 - v0,
        }
    }

    /// Vertex `i` (0, 1 or 2)
    pub fn point(&self, i: usize) -> Vec3 {
        match i {
            0 => self.origin,
            1 => self.origin + self.edge0,
            _ => self.origin + self.edge1,
        }
    }

    /// Point with barycentric-style parameters
    pub fn point_at(&self, s: f32, t: f32) -> Vec3 {
        self.origin + self.edge0 * s + self.edge1 * t
    }

    /// Edge `i` as a segment: 0 = v0→v1, 1 = v1→v2, 2 = v2→v0
    pub fn edge_segment(&self, i: usize) -> Segment {
        let start = self.point(i);
        let end = self.point((i + 1) % 3);
        Segment::from_points(start, end)
    }

    /// Calculates the unnormalized normal (right-hand rule)
    pub fn raw_normal(&self) -> Vec3 {
        self.edge0.cross(&self.edge1)
    }

    /// Calculates the normal of the triangle (right-hand rule); zero when degenerate
    pub fn normal(&self) -> Vec3 {
        self.raw_normal().try_normalize(0.0).unwrap_or_else(Vec3::zeros)
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        self.origin + (self.edge0 + self.edge1) / 3.0
    }

    /// Supporting plane
    pub fn plane(&self) -> Plane {
        let normal = self.normal();
        Plane {
            normal,
            d: -normal.dot(&self.origin),
        }
    }

    /// Bounding box
    pub fn aabb(&self) -> AABB {
        AABB::from_points(&[self.point(0), self.point(1), self.point(2)])
    }

    /// Twice the area
    pub fn double_area(&self) -> f32 {
        self.raw_normal().magnitude()
    }

    /// Triangle after a rigid transform
    pub fn transformed(&self, transform: &Transform) -> Triangle {
        Triangle {
            origin: transform.transform_point(self.origin),
            edge0: transform.transform_vector(self.edge0),
            edge1: transform.transform_vector(self.edge1),
        }
    }

    /// True if `point`, assumed to lie on the triangle's plane, is inside the triangle
    pub fn contains_coplanar_point(&self, point: Vec3) -> bool {
        let normal = self.raw_normal();
        for i in 0..3 {
            let a = self.point(i);
            let b = self.point((i + 1) % 3);
            if (b - a).cross(&(point - a)).dot(&normal) < 0.0 {
                return false;
            }
        }
        true
    }

    /// Closest point on the triangle to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let (_, s, t) = distance::point_triangle_distance_sq(point, self);
        self.point_at(s, t)
    }

    /// Segment crossing as `(t, u, v)`, see [`intersection::segment_triangle_intersection`]
    pub fn intersect_segment(&self, seg: &Segment) -> Option<(f32, f32, f32)> {
        intersection::segment_triangle_intersection(seg, self)
    }

    /// Möller-Trumbore ray-triangle intersection algorithm
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 0.000001;

        // Calculate determinant
        let h = ray.direction.cross(&self.edge1);
        let a = self.edge0.dot(&h);

        // Ray parallel to triangle?
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.origin;
        let u = f * s.dot(&h);

        // Hit outside triangle on u axis?
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&self.edge0);
        let v = f * ray.direction.dot(&q);

        // Hit outside triangle on v axis?
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge1.dot(&q);
        if t >= 0.0 {
            Some((t, u, v))
        } else {
            None
        }
    }
}
