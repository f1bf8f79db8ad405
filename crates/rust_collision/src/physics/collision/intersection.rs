//! Analytic intersection and time-of-impact queries

use super::primitives::{Line, OrientedBox, Plane, Ray, Segment, Sphere, Triangle};
use crate::foundation::math::{epsilon, utils, Vec3};

/// Parameter where `line` crosses `plane`; `None` when parallel
pub fn line_plane_intersection(line: &Line, plane: &Plane) -> Option<f32> {
    let denom = plane.normal.dot(&line.direction);
    if denom.abs() < epsilon::PARALLEL {
        return None;
    }
    Some(-plane.distance_to_point(line.origin) / denom)
}

/// Non-negative parameter where `ray` crosses `plane`
pub fn ray_plane_intersection(ray: &Ray, plane: &Plane) -> Option<f32> {
    line_plane_intersection(&Line::new(ray.origin, ray.direction), plane).filter(|&t| t >= 0.0)
}

/// Parameter in `[0, 1]` where `seg` crosses `plane`
pub fn segment_plane_intersection(seg: &Segment, plane: &Plane) -> Option<f32> {
    line_plane_intersection(&Line::new(seg.origin, seg.delta), plane).filter(|t| (0.0..=1.0).contains(t))
}

/// Two-sided segment-triangle test returning `(t, u, v)`
///
/// The hit point is `seg.point_at(t) == tri.point_at(u, v)`.
pub fn segment_triangle_intersection(seg: &Segment, tri: &Triangle) -> Option<(f32, f32, f32)> {
    let h = seg.delta.cross(&tri.edge1);
    let a = tri.edge0.dot(&h);

    // Parallel to the triangle, or a degenerate triangle
    let scale = seg.delta.magnitude() * tri.edge0.magnitude() * tri.edge1.magnitude();
    if a.abs() <= epsilon::EPSILON * scale || scale == 0.0 {
        return None;
    }

    let f = 1.0 / a;
    let s = seg.origin - tri.origin;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&tri.edge0);
    let v = f * seg.delta.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * tri.edge1.dot(&q);
    if (0.0..=1.0).contains(&t) {
        Some((t, u, v))
    } else {
        None
    }
}

/// Portion of `seg` inside a solid box as `(t_enter, t_exit)` within `[0, 1]`
pub fn segment_box_intersection(seg: &Segment, obb: &OrientedBox) -> Option<(f32, f32)> {
    let origin = obb.to_local(seg.origin);
    let delta = obb.rotation.inverse_transform_vector(&seg.delta);
    let h = obb.half_extents;

    let mut t_enter: f32 = 0.0;
    let mut t_exit: f32 = 1.0;
    for i in 0..3 {
        if delta[i].abs() < epsilon::EPSILON {
            if origin[i] < -h[i] || origin[i] > h[i] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / delta[i];
        let mut t0 = (-h[i] - origin[i]) * inv;
        let mut t1 = (h[i] - origin[i]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }
    Some((t_enter, t_exit))
}

/// Earliest root in `[0, 1]` of `a t² + b t + c = 0`, or 0 when `c <= 0` (already inside)
fn earliest_root(a: f32, b: f32, c: f32) -> Option<f32> {
    if c <= 0.0 {
        return Some(0.0);
    }
    if a < epsilon::DIRECTION_SQ {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    if (0.0..=1.0).contains(&t) {
        Some(t)
    } else {
        None
    }
}

/// Earliest parameter in `[0, 1]` at which `seg` is inside `sphere`
pub fn segment_sphere_intersection(seg: &Segment, sphere: &Sphere) -> Option<f32> {
    let rel = seg.origin - sphere.position;
    earliest_root(
        seg.delta.magnitude_squared(),
        2.0 * rel.dot(&seg.delta),
        rel.magnitude_squared() - sphere.radius * sphere.radius,
    )
}

/// First contact of a sphere moving in a straight line during one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptSphereHit {
    /// Fraction of the step at first contact
    pub t: f32,
    /// Sphere centre at first contact
    pub center: Vec3,
    /// Contact point on the obstacle
    pub point: Vec3,
    /// Unit normal pointing from the obstacle toward the sphere
    pub normal: Vec3,
    /// Penetration at the end of the step along `normal`
    pub depth: f32,
}

/// Time of impact of a sphere moving from `old_center` to `new_center` against `plane`
///
/// Rejects motion away from the plane and motion that stays farther than
/// `radius` away. A sphere already touching at the start hits at `t = 0`.
pub fn swept_sphere_plane(
    old_center: Vec3,
    new_center: Vec3,
    radius: f32,
    plane: &Plane,
) -> Option<SweptSphereHit> {
    let d0 = plane.distance_to_point(old_center);
    let d1 = plane.distance_to_point(new_center);
    if d1 >= d0 || d1 > radius {
        return None;
    }

    let t = if d0 <= radius { 0.0 } else { (radius - d0) / (d1 - d0) };
    let center = old_center.lerp(&new_center, t);
    Some(SweptSphereHit {
        t,
        center,
        point: center - plane.normal * plane.distance_to_point(center),
        normal: plane.normal,
        depth: radius - d1,
    })
}

/// Time of impact of a moving sphere against the front face of `tri`
///
/// The plane is tested first. If the sphere meets the plane outside the
/// triangle, each convex edge and convex vertex is swept as well, and the
/// earliest contact wins. Non-convex features never produce hits.
pub fn swept_sphere_triangle(
    old_center: Vec3,
    new_center: Vec3,
    radius: f32,
    tri: &Triangle,
    convex_edges: [bool; 3],
    convex_vertices: [bool; 3],
) -> Option<SweptSphereHit> {
    let normal = utils::try_normalize(tri.raw_normal())?;
    let plane = Plane::from_point_normal(tri.origin, normal);
    if plane.distance_to_point(old_center) < 0.0 {
        return None;
    }
    let face_hit = swept_sphere_plane(old_center, new_center, radius, &plane)?;
    if tri.contains_coplanar_point(face_hit.point) {
        return Some(face_hit);
    }

    let velocity = new_center - old_center;
    let path = Segment::new(old_center, velocity);
    let r_sq = radius * radius;
    let mut best: Option<(f32, Vec3)> = None;

    for (i, &convex) in convex_edges.iter().enumerate() {
        if !convex {
            continue;
        }
        let edge = tri.edge_segment(i);
        let len_sq = edge.length_sq();
        if len_sq <= epsilon::DIRECTION_SQ {
            continue;
        }
        let project = |v: Vec3| v - edge.delta * (v.dot(&edge.delta) / len_sq);
        let w = project(old_center - edge.origin);
        let v = project(velocity);
        let Some(t) = earliest_root(v.magnitude_squared(), 2.0 * w.dot(&v), w.magnitude_squared() - r_sq) else {
            continue;
        };
        let u = (old_center + velocity * t - edge.origin).dot(&edge.delta) / len_sq;
        if (0.0..=1.0).contains(&u) && best.map_or(true, |(bt, _)| t < bt) {
            best = Some((t, edge.point_at(u)));
        }
    }

    for (i, &convex) in convex_vertices.iter().enumerate() {
        if !convex {
            continue;
        }
        let vertex = tri.point(i);
        let Some(t) = segment_sphere_intersection(&path, &Sphere::new(vertex, radius)) else {
            continue;
        };
        if best.map_or(true, |(bt, _)| t < bt) {
            best = Some((t, vertex));
        }
    }

    let (t, point) = best?;
    let center = old_center + velocity * t;
    let normal = utils::try_normalize(center - point).unwrap_or(normal);
    Some(SweptSphereHit {
        t,
        center,
        point,
        normal,
        depth: radius - (new_center - point).dot(&normal),
    })
}
