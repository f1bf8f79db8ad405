//! Box against box
//!
//! Separating axis test over the three face axes of each box and the nine
//! edge cross products. A face axis produces a manifold of box edges clipped
//! against the other box; an edge axis produces one point where the two
//! support edges pass closest.

use super::{expect_box, DetectContext};
use crate::foundation::math::Vec3;
use crate::physics::collision::contact::{CollisionFunctor, ContactBuffer, ContactPoint};
use crate::physics::collision::distance::segment_segment_distance_sq;
use crate::physics::collision::intersection::segment_box_intersection;
use crate::physics::collision::primitives::{OrientedBox, Segment};
use crate::physics::collision::skin::CollDetectInfo;

const NAME: &str = "box-box";

/// Relative amount by which an edge axis must be shallower than the best face axis
pub(crate) const EDGE_AXIS_MARGIN: f32 = 0.05;

/// Squared length below which an edge cross product is skipped
pub(crate) const PARALLEL_AXIS_SQ: f32 = 1.0e-6;

/// Most manifold points kept for a face contact
pub const MAX_MANIFOLD_POINTS: usize = 8;

/// Which separating axis gave the minimum overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatAxis {
    /// Face normal `i` of box A
    Face0(usize),
    /// Face normal `i` of box B
    Face1(usize),
    /// Cross product of edge `i` of A with edge `j` of B
    Edge(usize, usize),
}

/// Minimum-overlap axis between two boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    /// Axis that produced the minimum
    pub axis: SatAxis,
    /// Unit contact normal pointing from B toward A
    pub normal: Vec3,
    /// Overlap along `normal`; negative when separated within tolerance
    pub depth: f32,
}

/// Run the separating axis test; `None` when some axis separates by more than `tolerance`
pub fn find_separation(box0: &OrientedBox, box1: &OrientedBox, tolerance: f32) -> Option<Separation> {
    let a = box0.axes();
    let b = box1.axes();
    let delta = box0.center - box1.center;
    let overlap_on = |axis: &Vec3| box0.projected_radius(axis) + box1.projected_radius(axis) - delta.dot(axis).abs();

    let mut face: Option<(SatAxis, Vec3, f32)> = None;
    let face_axes = (0..3)
        .map(|i| (SatAxis::Face0(i), a[i]))
        .chain((0..3).map(|i| (SatAxis::Face1(i), b[i])));
    for (id, axis) in face_axes {
        let overlap = overlap_on(&axis);
        if overlap < -tolerance {
            return None;
        }
        if face.map_or(true, |(_, _, best)| overlap < best) {
            face = Some((id, axis, overlap));
        }
    }

    let mut edge: Option<(SatAxis, Vec3, f32)> = None;
    for i in 0..3 {
        for j in 0..3 {
            let axis = a[i].cross(&b[j]);
            let len_sq = axis.magnitude_squared();
            if len_sq < PARALLEL_AXIS_SQ {
                continue;
            }
            let axis = axis / len_sq.sqrt();
            let overlap = overlap_on(&axis);
            if overlap < -tolerance {
                return None;
            }
            if edge.map_or(true, |(_, _, best)| overlap < best) {
                edge = Some((SatAxis::Edge(i, j), axis, overlap));
            }
        }
    }

    let (_, _, face_depth) = face?;
    let (axis, normal, depth) = match edge {
        Some(e) if e.2 < face_depth - EDGE_AXIS_MARGIN * face_depth.abs() => e,
        _ => face?,
    };
    let normal = if delta.dot(&normal) < 0.0 { -normal } else { normal };
    Some(Separation { axis, normal, depth })
}

/// Average of the corners of `obb` lying furthest along `direction`, within `slack`
fn support_feature(obb: &OrientedBox, direction: Vec3, slack: f32) -> Vec3 {
    let corners = obb.corners();
    let max = corners.iter().map(|c| c.dot(&direction)).fold(f32::NEG_INFINITY, f32::max);
    let mut sum = Vec3::zeros();
    let mut count = 0.0;
    for c in &corners {
        if c.dot(&direction) >= max - slack {
            sum += c;
            count += 1.0;
        }
    }
    sum / count
}

/// Edge of `obb` parallel to axis `i` lying furthest along `direction`
fn support_edge(obb: &OrientedBox, i: usize, direction: Vec3) -> Segment {
    let axes = obb.axes();
    let mut center = obb.center;
    for k in 0..3 {
        if k != i {
            let sign = if axes[k].dot(&direction) >= 0.0 { 1.0 } else { -1.0 };
            center += axes[k] * (sign * obb.half_extents[k]);
        }
    }
    let half = axes[i] * obb.half_extents[i];
    Segment::from_points(center - half, center + half)
}

/// Point-merging accumulator with a fixed capacity
pub(crate) struct Manifold {
    points: [Vec3; MAX_MANIFOLD_POINTS],
    weights: [f32; MAX_MANIFOLD_POINTS],
    len: usize,
    dropped: usize,
    merge_dist_sq: f32,
}

impl Manifold {
    pub(crate) fn new(merge_dist: f32) -> Self {
        Self {
            points: [Vec3::zeros(); MAX_MANIFOLD_POINTS],
            weights: [0.0; MAX_MANIFOLD_POINTS],
            len: 0,
            dropped: 0,
            merge_dist_sq: merge_dist * merge_dist,
        }
    }

    pub(crate) fn add(&mut self, point: Vec3) {
        for k in 0..self.len {
            if (self.points[k] - point).magnitude_squared() <= self.merge_dist_sq {
                let w = self.weights[k];
                self.points[k] = (self.points[k] * w + point) / (w + 1.0);
                self.weights[k] = w + 1.0;
                return;
            }
        }
        if self.len < MAX_MANIFOLD_POINTS {
            self.points[self.len] = point;
            self.weights[self.len] = 1.0;
            self.len += 1;
        } else {
            self.dropped += 1;
        }
    }

    pub(crate) fn clip_edges(&mut self, edges_of: &OrientedBox, against: &OrientedBox) {
        for edge in edges_of.edges() {
            if let Some((t_enter, t_exit)) = segment_box_intersection(&edge, against) {
                self.add(edge.point_at(t_enter));
                self.add(edge.point_at(t_exit));
            }
        }
    }

    pub(crate) fn as_slice(&self) -> &[Vec3] {
        &self.points[..self.len]
    }

    pub(crate) fn dropped(&self) -> usize {
        self.dropped
    }
}

pub(crate) fn inflated(obb: &OrientedBox, amount: f32) -> OrientedBox {
    OrientedBox::new(obb.center, obb.rotation, obb.half_extents.add_scalar(amount))
}

/// Contacts for a known separation; offsets relative to `body0` and `body1`
///
/// Returns the number of manifold points discarded past the manifold capacity.
fn build_contacts(
    box0: &OrientedBox,
    box1: &OrientedBox,
    sep: &Separation,
    combination_dist: f32,
    tolerance: f32,
    body0: Vec3,
    body1: Vec3,
    contacts: &mut ContactBuffer,
) -> usize {
    let sat_point = match sep.axis {
        SatAxis::Face0(_) => support_feature(box1, sep.normal, combination_dist),
        SatAxis::Face1(_) => support_feature(box0, -sep.normal, combination_dist),
        SatAxis::Edge(i, j) => {
            let edge0 = support_edge(box0, i, -sep.normal);
            let edge1 = support_edge(box1, j, sep.normal);
            let (_, s, t) = segment_segment_distance_sq(&edge0, &edge1);
            let point = (edge0.point_at(s) + edge1.point_at(t)) * 0.5;
            contacts.push(ContactPoint::at(point, body0, body1, sep.depth));
            return 0;
        }
    };

    let mut manifold = Manifold::new(combination_dist);
    let slack = tolerance.max(0.0);
    manifold.clip_edges(box1, &inflated(box0, slack));
    manifold.clip_edges(box0, &inflated(box1, slack));

    let points = manifold.as_slice();
    if points.is_empty() {
        contacts.push(ContactPoint::at(sat_point, body0, body1, sep.depth));
        return 0;
    }

    let mut min_dist = f32::MAX;
    let mut max_dist = 0.0f32;
    for p in points {
        let d = (p - sat_point).magnitude();
        min_dist = min_dist.min(d);
        max_dist = max_dist.max(d);
    }
    let range = max_dist - min_dist;
    for p in points {
        let depth = if range > f32::EPSILON {
            let d = (p - sat_point).magnitude();
            (1.0 - (d - min_dist) / range) * sep.depth
        } else {
            sep.depth
        };
        contacts.push(ContactPoint::at(*p, body0, body1, depth));
    }
    manifold.dropped()
}

/// Box A against box B
pub fn box_box(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    let tolerance = ctx.config.collision_tolerance;
    let old0 = expect_box(info.old0(), NAME);
    let old1 = expect_box(info.old1(), NAME);

    let (box0, box1, sep) = if let Some(sep) = find_separation(old0, old1, tolerance) {
        (old0, old1, sep)
    } else {
        let new0 = expect_box(info.new0(), NAME);
        let new1 = expect_box(info.new1(), NAME);
        match find_separation(new0, new1, tolerance) {
            Some(sep) => (new0, new1, sep),
            None => return,
        }
    };
    let (body0, body1) = (info.skin0().old_position(), info.skin1().old_position());

    let combination_dist = ctx.config.combination_fraction * box0.min_dimension().min(box1.min_dimension());
    let mut contacts = ContactBuffer::new();
    let dropped = build_contacts(box0, box1, &sep, combination_dist, tolerance, body0, body1, &mut contacts);
    if dropped > 0 {
        ctx.stats.truncated_contacts += dropped as u64;
        log::debug!("Box manifold dropped {} points", dropped);
    }
    ctx.report(info, sep.normal, &contacts, functor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionConfig;
    use crate::foundation::math::Quat;
    use crate::physics::collision::detect::test_support::{body, moving_body, run};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    const EPSILON: f32 = 1e-4;

    fn unit_box(center: Vec3) -> OrientedBox {
        OrientedBox::axis_aligned(center, Vec3::repeat(1.0))
    }

    #[test]
    fn test_boxes_one_point_two_apart() {
        let sep = find_separation(&unit_box(Vec3::zeros()), &unit_box(Vec3::new(1.2, 0.0, 0.0)), 0.05).unwrap();
        assert_eq!(sep.axis, SatAxis::Face0(0));
        assert_relative_eq!(sep.depth, 0.8, epsilon = EPSILON);
        assert_relative_eq!(sep.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);

        let a = body(unit_box(Vec3::zeros()));
        let b = body(unit_box(Vec3::new(1.2, 0.0, 0.0)));
        let (collector, _) = run(box_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_eq!(report.points.len(), 8);
        assert_relative_eq!(report.max_depth(), 0.8, epsilon = EPSILON);
        for p in &report.points {
            assert!(p.initial_penetration >= -EPSILON && p.initial_penetration <= 0.8 + EPSILON);
        }
    }

    #[test]
    fn test_normal_points_toward_a() {
        let a = body(unit_box(Vec3::new(0.0, 1.9, 0.0)));
        let b = body(unit_box(Vec3::zeros()));
        let (collector, _) = run(box_box, &a, &b, &CollisionConfig::default());
        assert_relative_eq!(collector.reports()[0].normal, Vec3::y(), epsilon = EPSILON);
    }

    #[test]
    fn test_separated_boxes() {
        assert!(find_separation(&unit_box(Vec3::zeros()), &unit_box(Vec3::new(2.1, 0.0, 0.0)), 0.05).is_none());

        let a = body(unit_box(Vec3::zeros()));
        let b = body(unit_box(Vec3::new(0.0, 0.0, 3.0)));
        let (collector, stats) = run(box_box, &a, &b, &CollisionConfig::default());
        assert!(collector.reports().is_empty());
        assert_eq!(stats.notifications, 0);
    }

    #[test]
    fn test_crossed_edges() {
        let a = body(OrientedBox::new(
            Vec3::new(0.0, 2.0 * std::f32::consts::SQRT_2 - 0.1, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_4),
            Vec3::repeat(1.0),
        ));
        let b = body(OrientedBox::new(
            Vec3::zeros(),
            Quat::from_axis_angle(&Vec3::x_axis(), FRAC_PI_4),
            Vec3::repeat(1.0),
        ));
        let (collector, _) = run(box_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_eq!(report.points.len(), 1);
        assert_relative_eq!(report.normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.1, epsilon = EPSILON);
        assert_relative_eq!(
            report.points[0].r1,
            Vec3::new(0.0, std::f32::consts::SQRT_2 - 0.05, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_new_pose_used_when_old_is_apart() {
        let a = moving_body(unit_box(Vec3::zeros()), Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 1.9, 0.0));
        let b = body(unit_box(Vec3::zeros()));
        let (collector, _) = run(box_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.max_depth(), 0.1, epsilon = EPSILON);
        // Offsets are measured from the start-of-step body position
        for p in &report.points {
            assert!(p.r0.y > -4.2 && p.r0.y < -3.95, "offset {}", p.r0.y);
        }
    }
}
