//! Boolean overlap tests
//!
//! Cheaper yes/no versions of the distance and intersection queries, used as
//! conservative pre-tests on mesh candidate triangles before the exact
//! contact queries run.

use super::primitives::{OrientedBox, Sphere, Triangle, AABB};
use crate::foundation::math::{epsilon, utils, Vec3};

/// True if the projections of `points` and a box of `radius` around `center` overlap on `axis`
fn separated_on_axis(axis: &Vec3, points: &[Vec3; 3], center: &Vec3, radius: f32) -> bool {
    let c = axis.dot(center);
    let mut min = f32::MAX;
    let mut max = -f32::MAX;
    for p in points {
        let d = axis.dot(p);
        min = min.min(d);
        max = max.max(d);
    }
    min > c + radius || max < c - radius
}

/// Separating-axis test between a solid box and a triangle over 13 axes
pub fn box_triangle_overlap(obb: &OrientedBox, tri: &Triangle) -> bool {
    let axes = obb.axes();
    let points = [tri.point(0), tri.point(1), tri.point(2)];
    let edges = [tri.edge0, tri.edge1 - tri.edge0, -tri.edge1];

    let separates = |axis: Vec3| -> bool {
        if axis.magnitude_squared() < epsilon::DIRECTION_SQ {
            return false;
        }
        separated_on_axis(&axis, &points, &obb.center, obb.projected_radius(&axis))
    };

    for axis in axes {
        if separates(axis) {
            return false;
        }
    }
    if separates(tri.raw_normal()) {
        return false;
    }
    for box_axis in &axes {
        for edge in &edges {
            if separates(box_axis.cross(edge)) {
                return false;
            }
        }
    }
    true
}

/// Solid sphere against axis-aligned box
pub fn sphere_aabb_overlap(sphere: &Sphere, aabb: &AABB) -> bool {
    let c = sphere.position;
    let closest = Vec3::new(
        utils::clamp(c.x, aabb.min.x, aabb.max.x),
        utils::clamp(c.y, aabb.min.y, aabb.max.y),
        utils::clamp(c.z, aabb.min.z, aabb.max.z),
    );
    (closest - c).magnitude_squared() <= sphere.radius * sphere.radius
}
