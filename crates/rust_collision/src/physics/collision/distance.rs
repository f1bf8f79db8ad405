//! Closest-point and squared-distance queries
//!
//! Every routine is pure and allocation-free, and returns the squared
//! distance together with the parameters of the closest point(s). Where a
//! routine classifies Voronoi regions, the reported distance is recomputed
//! from the reconstructed closest points so that it always agrees with the
//! returned parameters.

use super::intersection::segment_triangle_intersection;
use super::primitives::{Line, OrientedBox, Plane, Segment, Triangle};
use crate::foundation::math::{epsilon, utils, Vec3};

/// Squared distance from `point` to `seg` and the parameter `t` of the closest point
pub fn point_segment_distance_sq(point: Vec3, seg: &Segment) -> (f32, f32) {
    let length_sq = seg.length_sq();
    let t = if length_sq > epsilon::DIRECTION_SQ {
        utils::clamp((point - seg.origin).dot(&seg.delta) / length_sq, 0.0, 1.0)
    } else {
        0.0
    };
    ((point - seg.point_at(t)).magnitude_squared(), t)
}

/// Squared distance between two segments and the parameters `(s, t)` of the closest points
///
/// Closest points are `seg0.point_at(s)` and `seg1.point_at(t)`.
pub fn segment_segment_distance_sq(seg0: &Segment, seg1: &Segment) -> (f32, f32, f32) {
    let a00 = seg0.length_sq();
    let a11 = seg1.length_sq();

    let (s, t) = if a00 <= epsilon::DIRECTION_SQ {
        (0.0, point_segment_distance_sq(seg0.origin, seg1).1)
    } else if a11 <= epsilon::DIRECTION_SQ {
        (point_segment_distance_sq(seg1.origin, seg0).1, 0.0)
    } else {
        segment_segment_parameters(seg0, seg1, a00, a11)
    };

    let dist_sq = (seg0.point_at(s) - seg1.point_at(t)).magnitude_squared();
    (dist_sq, s, t)
}

/// Minimise `Q(s,t) = a00 s² + 2 a01 s t + a11 t² + 2 b0 s + 2 b1 t + c` over the unit square
fn segment_segment_parameters(seg0: &Segment, seg1: &Segment, a00: f32, a11: f32) -> (f32, f32) {
    let diff = seg0.origin - seg1.origin;
    let a01 = -seg0.delta.dot(&seg1.delta);
    let b0 = diff.dot(&seg0.delta);
    let b1 = -diff.dot(&seg1.delta);
    let det = (a00 * a11 - a01 * a01).abs();

    let s_on_edge = |numer: f32| utils::clamp(numer / a00, 0.0, 1.0);
    let t_on_edge = |numer: f32| utils::clamp(numer / a11, 0.0, 1.0);

    if det >= epsilon::EPSILON * a00 * a11 {
        let s = a01 * b1 - a11 * b0;
        let t = a01 * b0 - a00 * b1;

        if s >= 0.0 {
            if s <= det {
                if t >= 0.0 {
                    if t <= det {
                        // Interior
                        let inv_det = 1.0 / det;
                        (s * inv_det, t * inv_det)
                    } else {
                        (s_on_edge(-(a01 + b0)), 1.0)
                    }
                } else {
                    (s_on_edge(-b0), 0.0)
                }
            } else if t >= 0.0 {
                if t <= det {
                    (1.0, t_on_edge(-(a01 + b1)))
                } else if -(a01 + b0) <= a00 {
                    (s_on_edge(-(a01 + b0)), 1.0)
                } else {
                    (1.0, t_on_edge(-(a01 + b1)))
                }
            } else if -b0 < a00 {
                (s_on_edge(-b0), 0.0)
            } else {
                (1.0, t_on_edge(-(a01 + b1)))
            }
        } else if t >= 0.0 {
            if t <= det {
                (0.0, t_on_edge(-b1))
            } else if a01 + b0 < 0.0 {
                (s_on_edge(-(a01 + b0)), 1.0)
            } else {
                (0.0, t_on_edge(-b1))
            }
        } else if b0 < 0.0 {
            (s_on_edge(-b0), 0.0)
        } else {
            (0.0, t_on_edge(-b1))
        }
    } else if a01 > 0.0 {
        // Parallel, pointing in opposite directions
        if b0 >= 0.0 {
            (0.0, 0.0)
        } else if -b0 <= a00 {
            (-b0 / a00, 0.0)
        } else {
            (1.0, utils::clamp(-(a00 + b0) / a01, 0.0, 1.0))
        }
    } else {
        // Parallel, pointing the same way
        if -b0 >= a00 {
            (1.0, 0.0)
        } else if b0 <= 0.0 {
            (-b0 / a00, 0.0)
        } else {
            (0.0, utils::clamp(-b0 / a01, 0.0, 1.0))
        }
    }
}

/// Squared distance from `point` to `tri` and the parameters `(s, t)` of the closest point
///
/// The closest point is `tri.point_at(s, t)`, with `s, t >= 0` and `s + t <= 1`.
pub fn point_triangle_distance_sq(point: Vec3, tri: &Triangle) -> (f32, f32, f32) {
    let a00 = tri.edge0.magnitude_squared();
    let a01 = tri.edge0.dot(&tri.edge1);
    let a11 = tri.edge1.magnitude_squared();
    let det = (a00 * a11 - a01 * a01).abs();

    let degenerate = a00 <= epsilon::DIRECTION_SQ || a11 <= epsilon::DIRECTION_SQ;
    let (s, t) = if degenerate || det <= epsilon::EPSILON * a00 * a11 {
        degenerate_triangle_parameters(point, tri)
    } else {
        let diff = tri.origin - point;
        let b0 = diff.dot(&tri.edge0);
        let b1 = diff.dot(&tri.edge1);
        triangle_region_parameters(a00, a01, a11, b0, b1, det)
    };

    let dist_sq = (point - tri.point_at(s, t)).magnitude_squared();
    (dist_sq, s, t)
}

fn triangle_region_parameters(a00: f32, a01: f32, a11: f32, b0: f32, b1: f32, det: f32) -> (f32, f32) {
    let s = a01 * b1 - a11 * b0;
    let t = a01 * b0 - a00 * b1;

    let along_edge0 = |b0: f32| if b0 >= 0.0 { 0.0 } else if -b0 >= a00 { 1.0 } else { -b0 / a00 };
    let along_edge1 = |b1: f32| if b1 >= 0.0 { 0.0 } else if -b1 >= a11 { 1.0 } else { -b1 / a11 };
    let hypotenuse = |numer: f32| {
        let denom = a00 - 2.0 * a01 + a11;
        if numer >= denom { 1.0 } else { numer / denom }
    };

    if s + t <= det {
        if s < 0.0 {
            if t < 0.0 {
                // Region 4: vertex 0 or one of its edges
                if b0 < 0.0 {
                    (along_edge0(b0), 0.0)
                } else {
                    (0.0, along_edge1(b1))
                }
            } else {
                // Region 3
                (0.0, along_edge1(b1))
            }
        } else if t < 0.0 {
            // Region 5
            (along_edge0(b0), 0.0)
        } else {
            // Region 0: interior
            let inv_det = 1.0 / det;
            (s * inv_det, t * inv_det)
        }
    } else if s < 0.0 {
        // Region 2
        let tmp0 = a01 + b0;
        let tmp1 = a11 + b1;
        if tmp1 > tmp0 {
            let s = hypotenuse(tmp1 - tmp0);
            (s, 1.0 - s)
        } else if tmp1 <= 0.0 {
            (0.0, 1.0)
        } else {
            (0.0, along_edge1(b1))
        }
    } else if t < 0.0 {
        // Region 6
        let tmp0 = a01 + b1;
        let tmp1 = a00 + b0;
        if tmp1 > tmp0 {
            let t = hypotenuse(tmp1 - tmp0);
            (1.0 - t, t)
        } else if tmp1 <= 0.0 {
            (1.0, 0.0)
        } else {
            (along_edge0(b0), 0.0)
        }
    } else {
        // Region 1
        let numer = a11 + b1 - a01 - b0;
        if numer <= 0.0 {
            (0.0, 1.0)
        } else {
            let s = hypotenuse(numer);
            (s, 1.0 - s)
        }
    }
}

/// Closest point over the three edges of a sliver triangle
fn degenerate_triangle_parameters(point: Vec3, tri: &Triangle) -> (f32, f32) {
    let (d0, u0) = point_segment_distance_sq(point, &Segment::new(tri.origin, tri.edge0));
    let (d1, u1) = point_segment_distance_sq(point, &Segment::new(tri.origin + tri.edge0, tri.edge1 - tri.edge0));
    let (d2, u2) = point_segment_distance_sq(point, &Segment::new(tri.origin, tri.edge1));

    if d0 <= d1 && d0 <= d2 {
        (u0, 0.0)
    } else if d1 <= d2 {
        (1.0 - u1, u1)
    } else {
        (0.0, u2)
    }
}

/// Signed distance from `point` to `plane` (positive in front)
pub fn point_plane_distance(point: Vec3, plane: &Plane) -> f32 {
    plane.distance_to_point(point)
}

/// Squared distance from `point` to a solid box and the closest box point
pub fn point_box_distance_sq(point: Vec3, obb: &OrientedBox) -> (f32, Vec3) {
    let local = obb.to_local(point);
    let h = obb.half_extents;
    let clamped = Vec3::new(
        utils::clamp(local.x, -h.x, h.x),
        utils::clamp(local.y, -h.y, h.y),
        utils::clamp(local.z, -h.z, h.z),
    );
    ((local - clamped).magnitude_squared(), obb.to_world(clamped))
}

/// Signed distance from `point` to the box surface (negative inside) and the closest surface point
pub fn point_box_signed_distance(point: Vec3, obb: &OrientedBox) -> (f32, Vec3) {
    let local = obb.to_local(point);
    let h = obb.half_extents;

    let inside = (0..3).all(|i| local[i].abs() <= h[i]);
    if !inside {
        let (dist_sq, surface) = point_box_distance_sq(point, obb);
        return (dist_sq.sqrt(), surface);
    }

    // Inside: push out through the nearest face
    let mut axis = 0;
    let mut gap = h[0] - local[0].abs();
    for i in 1..3 {
        let g = h[i] - local[i].abs();
        if g < gap {
            gap = g;
            axis = i;
        }
    }
    let mut surface = local;
    surface[axis] = if local[axis] >= 0.0 { h[axis] } else { -h[axis] };
    (-gap, obb.to_world(surface))
}

/// Shortest push along one of the box face normals that moves `seg` fully out of `obb`
///
/// Returns the push distance, the outward face normal and the point on that
/// face beneath the deepest segment end.
pub fn segment_box_penetration(seg: &Segment, obb: &OrientedBox) -> (f32, Vec3, Vec3) {
    let ends = [obb.to_local(seg.origin), obb.to_local(seg.end())];
    let h = obb.half_extents;

    let mut best = (f32::MAX, 0, 1.0);
    for axis in 0..3 {
        for sign in [1.0_f32, -1.0] {
            let deepest = (sign * ends[0][axis]).min(sign * ends[1][axis]);
            let push = h[axis] - deepest;
            if push < best.0 {
                best = (push, axis, sign);
            }
        }
    }

    let (push, axis, sign) = best;
    let deepest = if sign * ends[0][axis] <= sign * ends[1][axis] { ends[0] } else { ends[1] };
    let mut surface = Vec3::new(
        utils::clamp(deepest.x, -h.x, h.x),
        utils::clamp(deepest.y, -h.y, h.y),
        utils::clamp(deepest.z, -h.z, h.z),
    );
    surface[axis] = sign * h[axis];
    (push, obb.axes()[axis] * sign, obb.to_world(surface))
}

/// Squared distance between an infinite line and a solid box
///
/// Returns the distance, the line parameter of the closest line point and the
/// closest box point. The line direction need not be unit length.
pub fn line_box_distance_sq(line: &Line, obb: &OrientedBox) -> (f32, f32, Vec3) {
    let axes = obb.axes();
    let diff = line.origin - obb.center;
    let mut query = LineBoxQuery {
        extents: obb.half_extents,
        point: Vec3::new(diff.dot(&axes[0]), diff.dot(&axes[1]), diff.dot(&axes[2])),
        direction: Vec3::new(
            line.direction.dot(&axes[0]),
            line.direction.dot(&axes[1]),
            line.direction.dot(&axes[2]),
        ),
        param: 0.0,
    };

    // Reflect into the octant with a non-negative direction
    let mut reflect = [false; 3];
    for i in 0..3 {
        if query.direction[i] < 0.0 {
            query.point[i] = -query.point[i];
            query.direction[i] = -query.direction[i];
            reflect[i] = true;
        }
    }

    let d = query.direction;
    match (d.x > 0.0, d.y > 0.0, d.z > 0.0) {
        (true, true, true) => query.case_no_zeros(),
        (true, true, false) => query.case0(0, 1, 2),
        (true, false, true) => query.case0(0, 2, 1),
        (false, true, true) => query.case0(1, 2, 0),
        (true, false, false) => query.case00(0, 1, 2),
        (false, true, false) => query.case00(1, 0, 2),
        (false, false, true) => query.case00(2, 0, 1),
        (false, false, false) => query.case000(),
    }

    let mut local = query.point;
    for i in 0..3 {
        if reflect[i] {
            local[i] = -local[i];
        }
    }
    let box_point = obb.center + axes[0] * local.x + axes[1] * local.y + axes[2] * local.z;
    let line_point = line.point_at(query.param);
    ((line_point - box_point).magnitude_squared(), query.param, box_point)
}

/// Squared distance between a segment and a solid box
///
/// Returns the distance, the segment parameter in `[0, 1]` and the closest box point.
pub fn segment_box_distance_sq(seg: &Segment, obb: &OrientedBox) -> (f32, f32, Vec3) {
    if seg.length_sq() <= epsilon::DIRECTION_SQ {
        let (dist_sq, box_point) = point_box_distance_sq(seg.origin, obb);
        return (dist_sq, 0.0, box_point);
    }

    let (dist_sq, t, box_point) = line_box_distance_sq(&Line::new(seg.origin, seg.delta), obb);
    if (0.0..=1.0).contains(&t) {
        (dist_sq, t, box_point)
    } else if t < 0.0 {
        let (dist_sq, box_point) = point_box_distance_sq(seg.origin, obb);
        (dist_sq, 0.0, box_point)
    } else {
        let (dist_sq, box_point) = point_box_distance_sq(seg.end(), obb);
        (dist_sq, 1.0, box_point)
    }
}

/// Squared distance between a segment and a triangle
///
/// Returns the distance, the segment parameter and the triangle parameters `(s, t)`.
pub fn segment_triangle_distance_sq(seg: &Segment, tri: &Triangle) -> (f32, f32, f32, f32) {
    if let Some((seg_t, u, v)) = segment_triangle_intersection(seg, tri) {
        return (0.0, seg_t, u, v);
    }

    // Segment endpoints against the face
    let (d_start, s0, t0) = point_triangle_distance_sq(seg.origin, tri);
    let mut best = (d_start, 0.0, s0, t0);

    let (d_end, s1, t1) = point_triangle_distance_sq(seg.end(), tri);
    if d_end < best.0 {
        best = (d_end, 1.0, s1, t1);
    }

    // Segment against the three edges
    let v1 = tri.origin + tri.edge0;
    let edges = [
        Segment::new(tri.origin, tri.edge0),
        Segment::new(v1, tri.edge1 - tri.edge0),
        Segment::new(tri.origin, tri.edge1),
    ];
    for (i, edge) in edges.iter().enumerate() {
        let (dist_sq, seg_t, u) = segment_segment_distance_sq(seg, edge);
        if dist_sq < best.0 {
            let (s, t) = match i {
                0 => (u, 0.0),
                1 => (1.0 - u, u),
                _ => (0.0, u),
            };
            best = (dist_sq, seg_t, s, t);
        }
    }

    best
}

/// Working state for [`line_box_distance_sq`], in reflected box coordinates
struct LineBoxQuery {
    extents: Vec3,
    point: Vec3,
    direction: Vec3,
    param: f32,
}

impl LineBoxQuery {
    /// All direction components positive: pick the face the line crosses first
    fn case_no_zeros(&mut self) {
        let pme = self.point - self.extents;
        let d = self.direction;

        if d.y * pme.x >= d.x * pme.y {
            if d.z * pme.x >= d.x * pme.z {
                self.face(0, 1, 2, pme);
            } else {
                self.face(2, 0, 1, pme);
            }
        } else if d.z * pme.y >= d.y * pme.z {
            self.face(1, 2, 0, pme);
        } else {
            self.face(2, 0, 1, pme);
        }
    }

    /// Line meets the plane `x[i0] = e[i0]`; find the closest approach on that face or its edges
    fn face(&mut self, i0: usize, i1: usize, i2: usize, pme: Vec3) {
        let e = self.extents;
        let d = self.direction;
        let mut ppe = Vec3::zeros();
        ppe[i1] = self.point[i1] + e[i1];
        ppe[i2] = self.point[i2] + e[i2];

        let above1 = d[i0] * ppe[i1] >= d[i1] * pme[i0];
        let above2 = d[i0] * ppe[i2] >= d[i2] * pme[i0];

        if above1 && above2 {
            // Line passes through the face
            let inv = 1.0 / d[i0];
            self.point[i0] = e[i0];
            self.point[i1] -= d[i1] * pme[i0] * inv;
            self.point[i2] -= d[i2] * pme[i0] * inv;
            self.param = -pme[i0] * inv;
        } else if above1 {
            self.edge_i1(i0, i1, i2, pme, ppe);
        } else if above2 {
            self.edge_i2(i0, i1, i2, pme, ppe);
        } else {
            let len_sq = d[i0] * d[i0] + d[i2] * d[i2];
            let tmp = len_sq * ppe[i1] - d[i1] * (d[i0] * pme[i0] + d[i2] * ppe[i2]);
            if tmp >= 0.0 {
                self.edge_i1(i0, i1, i2, pme, ppe);
                return;
            }

            let len_sq = d[i0] * d[i0] + d[i1] * d[i1];
            let tmp = len_sq * ppe[i2] - d[i2] * (d[i0] * pme[i0] + d[i1] * ppe[i1]);
            if tmp >= 0.0 {
                self.edge_i2(i0, i1, i2, pme, ppe);
                return;
            }

            // Corner (e[i0], -e[i1], -e[i2])
            let len_sq = d.magnitude_squared();
            let delta = d[i0] * pme[i0] + d[i1] * ppe[i1] + d[i2] * ppe[i2];
            self.param = -delta / len_sq;
            self.point[i0] = e[i0];
            self.point[i1] = -e[i1];
            self.point[i2] = -e[i2];
        }
    }

    /// Closest approach lies on the face edge running along axis `i1` at `x[i2] = -e[i2]`
    fn edge_i1(&mut self, i0: usize, i1: usize, i2: usize, pme: Vec3, ppe: Vec3) {
        let e = self.extents;
        let d = self.direction;
        let len_sq = d[i0] * d[i0] + d[i2] * d[i2];
        let tmp = len_sq * ppe[i1] - d[i1] * (d[i0] * pme[i0] + d[i2] * ppe[i2]);

        self.point[i0] = e[i0];
        self.point[i2] = -e[i2];
        if tmp <= 2.0 * len_sq * e[i1] {
            let t = tmp / len_sq;
            let full_len_sq = len_sq + d[i1] * d[i1];
            let along = ppe[i1] - t;
            let delta = d[i0] * pme[i0] + d[i1] * along + d[i2] * ppe[i2];
            self.param = -delta / full_len_sq;
            self.point[i1] = t - e[i1];
        } else {
            let full_len_sq = len_sq + d[i1] * d[i1];
            let delta = d[i0] * pme[i0] + d[i1] * pme[i1] + d[i2] * ppe[i2];
            self.param = -delta / full_len_sq;
            self.point[i1] = e[i1];
        }
    }

    /// Closest approach lies on the face edge running along axis `i2` at `x[i1] = -e[i1]`
    fn edge_i2(&mut self, i0: usize, i1: usize, i2: usize, pme: Vec3, ppe: Vec3) {
        let e = self.extents;
        let d = self.direction;
        let len_sq = d[i0] * d[i0] + d[i1] * d[i1];
        let tmp = len_sq * ppe[i2] - d[i2] * (d[i0] * pme[i0] + d[i1] * ppe[i1]);

        self.point[i0] = e[i0];
        self.point[i1] = -e[i1];
        if tmp <= 2.0 * len_sq * e[i2] {
            let t = tmp / len_sq;
            let full_len_sq = len_sq + d[i2] * d[i2];
            let along = ppe[i2] - t;
            let delta = d[i0] * pme[i0] + d[i1] * ppe[i1] + d[i2] * along;
            self.param = -delta / full_len_sq;
            self.point[i2] = t - e[i2];
        } else {
            let full_len_sq = len_sq + d[i2] * d[i2];
            let delta = d[i0] * pme[i0] + d[i1] * ppe[i1] + d[i2] * pme[i2];
            self.param = -delta / full_len_sq;
            self.point[i2] = e[i2];
        }
    }

    /// Direction zero along `i2` only
    fn case0(&mut self, i0: usize, i1: usize, i2: usize) {
        let e = self.extents;
        let d = self.direction;
        let pme0 = self.point[i0] - e[i0];
        let pme1 = self.point[i1] - e[i1];
        let prod0 = d[i1] * pme0;
        let prod1 = d[i0] * pme1;

        if prod0 >= prod1 {
            // Line meets x[i0] = e[i0]
            self.point[i0] = e[i0];
            let ppe1 = self.point[i1] + e[i1];
            let delta = prod0 - d[i0] * ppe1;
            if delta >= 0.0 {
                let inv_len_sq = 1.0 / (d[i0] * d[i0] + d[i1] * d[i1]);
                self.point[i1] = -e[i1];
                self.param = -(d[i0] * pme0 + d[i1] * ppe1) * inv_len_sq;
            } else {
                let inv = 1.0 / d[i0];
                self.point[i1] -= prod0 * inv;
                self.param = -pme0 * inv;
            }
        } else {
            // Line meets x[i1] = e[i1]
            self.point[i1] = e[i1];
            let ppe0 = self.point[i0] + e[i0];
            let delta = prod1 - d[i1] * ppe0;
            if delta >= 0.0 {
                let inv_len_sq = 1.0 / (d[i0] * d[i0] + d[i1] * d[i1]);
                self.point[i0] = -e[i0];
                self.param = -(d[i0] * ppe0 + d[i1] * pme1) * inv_len_sq;
            } else {
                let inv = 1.0 / d[i1];
                self.point[i0] -= prod1 * inv;
                self.param = -pme1 * inv;
            }
        }

        self.clamp_axis(i2);
    }

    /// Direction non-zero along `i0` only
    fn case00(&mut self, i0: usize, i1: usize, i2: usize) {
        self.param = (self.extents[i0] - self.point[i0]) / self.direction[i0];
        self.point[i0] = self.extents[i0];
        self.clamp_axis(i1);
        self.clamp_axis(i2);
    }

    /// Zero direction: plain point query
    fn case000(&mut self) {
        self.param = 0.0;
        for i in 0..3 {
            self.clamp_axis(i);
        }
    }

    fn clamp_axis(&mut self, i: usize) {
        self.point[i] = utils::clamp(self.point[i], -self.extents[i], self.extents[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_point_segment_interior_and_clamped() {
        let seg = Segment::from_points(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0));

        let (d, t) = point_segment_distance_sq(Vec3::new(0.5, 3.0, 0.0), &seg);
        assert_relative_eq!(d, 9.0, epsilon = EPSILON);
        assert_relative_eq!(t, 0.25, epsilon = EPSILON);

        let (d, t) = point_segment_distance_sq(Vec3::new(5.0, 0.0, 4.0), &seg);
        assert_eq!(t, 1.0);
        assert_relative_eq!(d, 25.0, epsilon = EPSILON);

        let point = Segment::new(Vec3::new(1.0, 1.0, 1.0), Vec3::zeros());
        let (d, t) = point_segment_distance_sq(Vec3::zeros(), &point);
        assert_eq!(t, 0.0);
        assert_relative_eq!(d, 3.0, epsilon = EPSILON);
    }

    #[test]
    fn test_segment_segment_crossing() {
        let a = Segment::from_points(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let b = Segment::from_points(Vec3::new(0.0, -1.0, 2.0), Vec3::new(0.0, 1.0, 2.0));
        let (d, s, t) = segment_segment_distance_sq(&a, &b);
        assert_relative_eq!(d, 4.0, epsilon = EPSILON);
        assert_relative_eq!(s, 0.5, epsilon = EPSILON);
        assert_relative_eq!(t, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_segment_segment_endpoint_regions() {
        let a = Segment::from_points(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        let b = Segment::from_points(Vec3::new(3.0, 1.0, 0.0), Vec3::new(3.0, 4.0, 0.0));
        let (d, s, t) = segment_segment_distance_sq(&a, &b);
        assert_relative_eq!(s, 1.0);
        assert_relative_eq!(t, 0.0);
        assert_relative_eq!(d, 5.0, epsilon = EPSILON);
    }

    #[test]
    fn test_segment_segment_parallel() {
        let a = Segment::from_points(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0));
        let same = Segment::from_points(Vec3::new(1.0, 1.0, 0.0), Vec3::new(3.0, 1.0, 0.0));
        let (d, _, _) = segment_segment_distance_sq(&a, &same);
        assert_relative_eq!(d, 1.0, epsilon = EPSILON);

        let opposite = Segment::from_points(Vec3::new(5.0, 1.0, 0.0), Vec3::new(3.0, 1.0, 0.0));
        let (d, s, t) = segment_segment_distance_sq(&a, &opposite);
        assert_relative_eq!(d, 2.0, epsilon = EPSILON);
        assert_relative_eq!(s, 1.0);
        assert_relative_eq!(t, 1.0);
    }

    #[test]
    fn test_point_triangle_regions() {
        let tri = Triangle::from_points(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

        // Above the interior
        let (d, s, t) = point_triangle_distance_sq(Vec3::new(0.25, 0.25, 2.0), &tri);
        assert_relative_eq!(d, 4.0, epsilon = EPSILON);
        assert_relative_eq!(s, 0.25, epsilon = EPSILON);
        assert_relative_eq!(t, 0.25, epsilon = EPSILON);

        // Beyond the hypotenuse
        let (d, s, t) = point_triangle_distance_sq(Vec3::new(1.0, 1.0, 0.0), &tri);
        assert_relative_eq!(d, 0.5, epsilon = EPSILON);
        assert_relative_eq!(s, 0.5, epsilon = EPSILON);
        assert_relative_eq!(t, 0.5, epsilon = EPSILON);

        // Behind vertex 0
        let (d, s, t) = point_triangle_distance_sq(Vec3::new(-1.0, -1.0, 0.0), &tri);
        assert_relative_eq!(d, 2.0, epsilon = EPSILON);
        assert_eq!((s, t), (0.0, 0.0));

        // Past vertex 1
        let (d, s, t) = point_triangle_distance_sq(Vec3::new(3.0, -0.5, 0.0), &tri);
        assert_relative_eq!(d, 4.25, epsilon = EPSILON);
        assert_relative_eq!(s, 1.0, epsilon = EPSILON);
        assert_relative_eq!(t, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_point_triangle_degenerate() {
        let sliver = Triangle::from_points(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let (d, s, t) = point_triangle_distance_sq(Vec3::new(1.5, 1.0, 0.0), &sliver);
        assert_relative_eq!(d, 1.0, epsilon = EPSILON);
        assert_relative_eq!(sliver.point_at(s, t), Vec3::new(1.5, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_point_box() {
        let obb = OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0));
        let (d, p) = point_box_distance_sq(Vec3::new(3.0, 0.5, 0.0), &obb);
        assert_relative_eq!(d, 4.0, epsilon = EPSILON);
        assert_relative_eq!(p, Vec3::new(1.0, 0.5, 0.0), epsilon = EPSILON);

        let (signed, surface) = point_box_signed_distance(Vec3::new(0.0, 0.8, 0.1), &obb);
        assert_relative_eq!(signed, -0.2, epsilon = EPSILON);
        assert_relative_eq!(surface, Vec3::new(0.0, 1.0, 0.1), epsilon = EPSILON);
    }

    #[test]
    fn test_line_box_cases() {
        let obb = OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0));

        // Axis-parallel line passing above the box
        let line = Line::new(Vec3::new(-5.0, 3.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let (d, _, p) = line_box_distance_sq(&line, &obb);
        assert_relative_eq!(d, 4.0, epsilon = EPSILON);
        assert_relative_eq!(p.y, 1.0, epsilon = EPSILON);

        // Diagonal line through the box
        let line = Line::new(Vec3::new(-3.0, -3.0, -3.0), Vec3::new(1.0, 1.0, 1.0));
        let (d, t, _) = line_box_distance_sq(&line, &obb);
        assert_relative_eq!(d, 0.0, epsilon = EPSILON);
        assert!(line.point_at(t).x.abs() <= 1.0 + EPSILON);

        // Diagonal line missing a corner edge
        let line = Line::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(-1.0, 1.0, 0.0));
        let (d, t, p) = line_box_distance_sq(&line, &obb);
        assert_relative_eq!(d, 0.5, epsilon = EPSILON);
        assert_relative_eq!(p.x, 1.0, epsilon = EPSILON);
        assert_relative_eq!(p.y, 1.0, epsilon = EPSILON);
        assert_relative_eq!(t, 1.5, epsilon = EPSILON);
    }

    #[test]
    fn test_line_box_general_direction() {
        let obb = OrientedBox::axis_aligned(Vec3::zeros(), Vec3::new(1.0, 2.0, 0.5));
        let line = Line::new(Vec3::new(4.0, 1.0, 3.0), Vec3::new(0.3, -0.5, 0.8));
        let (d, t, p) = line_box_distance_sq(&line, &obb);

        // Brute force along the line
        let mut best = f32::MAX;
        for i in -4000..4000 {
            let q = line.point_at(i as f32 * 0.005);
            best = best.min(point_box_distance_sq(q, &obb).0);
        }
        assert_relative_eq!(d, best, epsilon = 1e-3);
        assert_relative_eq!((line.point_at(t) - p).magnitude_squared(), d, epsilon = 1e-4);
    }

    #[test]
    fn test_segment_box_clamps_to_endpoint() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), 0.3);
        let obb = OrientedBox::new(Vec3::zeros(), rotation, Vec3::repeat(1.0));
        let seg = Segment::from_points(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 3.0, 0.0));
        let (d, t, p) = segment_box_distance_sq(&seg, &obb);
        assert_eq!(t, 1.0);
        assert_relative_eq!(d, 4.0, epsilon = EPSILON);
        assert_relative_eq!(p.y, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_segment_through_box_pushes_out_nearest_face() {
        let obb = OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0));
        let seg = Segment::from_points(Vec3::new(-3.0, 0.3, 0.0), Vec3::new(3.0, 0.3, 0.0));
        let (push, normal, surface) = segment_box_penetration(&seg, &obb);
        assert_relative_eq!(push, 0.7, epsilon = EPSILON);
        assert_relative_eq!(normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(surface, Vec3::new(-1.0, 1.0, 0.0), epsilon = EPSILON);

        // Both ends near the bottom face: the higher end decides
        let low = Segment::from_points(Vec3::new(0.1, -0.9, 0.1), Vec3::new(0.1, -0.5, 0.1));
        let (push, normal, surface) = segment_box_penetration(&low, &obb);
        assert_relative_eq!(push, 0.5, epsilon = EPSILON);
        assert_relative_eq!(normal, -Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(surface, Vec3::new(0.1, -1.0, 0.1), epsilon = EPSILON);
    }

    #[test]
    fn test_segment_triangle() {
        let tri = Triangle::from_points(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0));

        let piercing = Segment::from_points(Vec3::new(0.5, 1.0, 0.5), Vec3::new(0.5, -1.0, 0.5));
        let (d, seg_t, _, _) = segment_triangle_distance_sq(&piercing, &tri);
        assert_eq!(d, 0.0);
        assert_relative_eq!(seg_t, 0.5, epsilon = EPSILON);

        let hovering = Segment::from_points(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(1.0, 0.5, 0.5));
        let (d, seg_t, s, t) = segment_triangle_distance_sq(&hovering, &tri);
        assert_relative_eq!(d, 0.25, epsilon = EPSILON);
        let closest = tri.point_at(s, t);
        assert_relative_eq!(closest.y, 0.0, epsilon = EPSILON);
        assert_relative_eq!((hovering.point_at(seg_t) - closest).magnitude_squared(), d, epsilon = EPSILON);
    }
}
