//! Sphere and capsule detectors
//!
//! Each pair yields a single contact from the closest features of the two
//! shapes. Depth comes from the start-of-step poses, or from the end-of-step
//! poses when the pair was out of reach at the start.

use super::{expect_box, expect_capsule, expect_sphere, resolve_normal, DetectContext};
use crate::foundation::math::{epsilon, Vec3};
use crate::physics::collision::contact::{CollisionFunctor, ContactBuffer, ContactPoint};
use crate::physics::collision::distance::{
    point_box_distance_sq, point_box_signed_distance, point_segment_distance_sq, segment_box_distance_sq,
    segment_box_penetration, segment_segment_distance_sq,
};
use crate::physics::collision::primitives::{Capsule, OrientedBox};
use crate::physics::collision::skin::CollDetectInfo;

fn report_single(
    info: &CollDetectInfo<'_>,
    ctx: &mut DetectContext<'_>,
    functor: &mut dyn CollisionFunctor,
    point: Vec3,
    normal: Vec3,
    depth: f32,
) {
    let mut contacts = ContactBuffer::new();
    contacts.push(ContactPoint::at(
        point,
        info.skin0().old_position(),
        info.skin1().old_position(),
        depth,
    ));
    ctx.report(info, normal, &contacts, functor);
}

fn capsule_center(capsule: &Capsule) -> Vec3 {
    capsule.position + capsule.axis * 0.5
}

/// Sphere A against sphere B
pub fn sphere_sphere(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "sphere-sphere";
    let old0 = expect_sphere(info.old0(), NAME);
    let old1 = expect_sphere(info.old1(), NAME);
    let new0 = expect_sphere(info.new0(), NAME);
    let new1 = expect_sphere(info.new1(), NAME);

    let old_delta = old0.position - old1.position;
    let new_delta = new0.position - new1.position;
    let radius_sum = old0.radius + old1.radius;
    let reach = radius_sum + ctx.config.collision_tolerance;
    let (sphere1, delta) = if old_delta.magnitude_squared() < reach * reach {
        (old1, old_delta)
    } else if new_delta.magnitude_squared() < reach * reach {
        (new1, new_delta)
    } else {
        return;
    };

    let depth = radius_sum - delta.magnitude();
    let normal = resolve_normal(&[delta, old_delta, new_delta], ctx.config);
    let point = sphere1.position + normal * (sphere1.radius - 0.5 * depth);
    report_single(info, ctx, functor, point, normal, depth);
}

/// Sphere A against capsule B
pub fn sphere_capsule(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "sphere-capsule";
    let old0 = expect_sphere(info.old0(), NAME);
    let old1 = expect_capsule(info.old1(), NAME);
    let new0 = expect_sphere(info.new0(), NAME);
    let new1 = expect_capsule(info.new1(), NAME);

    let (old_seg, new_seg) = (old1.segment(), new1.segment());
    let (old_dist_sq, old_t) = point_segment_distance_sq(old0.position, &old_seg);
    let (new_dist_sq, new_t) = point_segment_distance_sq(new0.position, &new_seg);
    let radius_sum = old0.radius + old1.radius;
    let reach = radius_sum + ctx.config.collision_tolerance;
    let (sphere, capsule, seg_point, dist_sq) = if old_dist_sq < reach * reach {
        (old0, old1, old_seg.point_at(old_t), old_dist_sq)
    } else if new_dist_sq < reach * reach {
        (new0, new1, new_seg.point_at(new_t), new_dist_sq)
    } else {
        return;
    };

    let depth = radius_sum - dist_sq.sqrt();
    let normal = resolve_normal(
        &[sphere.position - seg_point, sphere.position - capsule_center(capsule)],
        ctx.config,
    );
    let point = seg_point + normal * (capsule.radius - 0.5 * depth);
    report_single(info, ctx, functor, point, normal, depth);
}

/// Capsule A against capsule B
pub fn capsule_capsule(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "capsule-capsule";
    let old0 = expect_capsule(info.old0(), NAME);
    let old1 = expect_capsule(info.old1(), NAME);
    let new0 = expect_capsule(info.new0(), NAME);
    let new1 = expect_capsule(info.new1(), NAME);

    let (old_seg0, old_seg1) = (old0.segment(), old1.segment());
    let (new_seg0, new_seg1) = (new0.segment(), new1.segment());
    let (old_dist_sq, old_s, old_t) = segment_segment_distance_sq(&old_seg0, &old_seg1);
    let (new_dist_sq, new_s, new_t) = segment_segment_distance_sq(&new_seg0, &new_seg1);
    let radius_sum = old0.radius + old1.radius;
    let reach = radius_sum + ctx.config.collision_tolerance;
    let (capsule0, capsule1, p0, p1, dist_sq) = if old_dist_sq < reach * reach {
        (old0, old1, old_seg0.point_at(old_s), old_seg1.point_at(old_t), old_dist_sq)
    } else if new_dist_sq < reach * reach {
        (new0, new1, new_seg0.point_at(new_s), new_seg1.point_at(new_t), new_dist_sq)
    } else {
        return;
    };

    let depth = radius_sum - dist_sq.sqrt();
    let normal = resolve_normal(&[p0 - p1, capsule_center(capsule0) - capsule_center(capsule1)], ctx.config);
    let point = p1 + normal * (capsule1.radius - 0.5 * depth);
    report_single(info, ctx, functor, point, normal, depth);
}

/// Normal toward the outside of `obb` and signed depth for a core point at `core` with `radius`
///
/// `box_point` is the closest box point; when the core lies inside the box
/// the nearest face decides the direction.
fn round_box_contact(
    core: Vec3,
    box_point: Vec3,
    dist_sq: f32,
    radius: f32,
    obb: &OrientedBox,
    ctx: &DetectContext<'_>,
) -> (Vec3, f32, Vec3) {
    if dist_sq > epsilon::DIRECTION_SQ {
        let dist = dist_sq.sqrt();
        let normal = resolve_normal(&[core - box_point, core - obb.center], ctx.config);
        (normal, radius - dist, box_point)
    } else {
        let (signed, surface) = point_box_signed_distance(core, obb);
        let normal = resolve_normal(&[surface - core, core - obb.center], ctx.config);
        (normal, radius - signed, surface)
    }
}

/// Sphere A against box B
pub fn sphere_box(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "sphere-box";
    let old0 = expect_sphere(info.old0(), NAME);
    let old1 = expect_box(info.old1(), NAME);
    let new0 = expect_sphere(info.new0(), NAME);
    let new1 = expect_box(info.new1(), NAME);

    let reach = old0.radius + ctx.config.collision_tolerance;
    let (old_dist, _) = point_box_signed_distance(old0.position, old1);
    let (new_dist, _) = point_box_signed_distance(new0.position, new1);
    let (sphere, obb) = if old_dist < reach {
        (old0, old1)
    } else if new_dist < reach {
        (new0, new1)
    } else {
        return;
    };

    let (dist_sq, box_point) = point_box_distance_sq(sphere.position, obb);
    let (normal, depth, surface) = round_box_contact(sphere.position, box_point, dist_sq, sphere.radius, obb, ctx);
    let point = surface - normal * (0.5 * depth);
    report_single(info, ctx, functor, point, normal, depth);
}

/// Capsule A against box B
pub fn capsule_box(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "capsule-box";
    let old0 = expect_capsule(info.old0(), NAME);
    let old1 = expect_box(info.old1(), NAME);
    let new0 = expect_capsule(info.new0(), NAME);
    let new1 = expect_box(info.new1(), NAME);

    let (old_seg, new_seg) = (old0.segment(), new0.segment());
    let old_query = segment_box_distance_sq(&old_seg, old1);
    let new_query = segment_box_distance_sq(&new_seg, new1);
    let reach = old0.radius + ctx.config.collision_tolerance;
    let (capsule, obb, seg, (dist_sq, t, box_point)) = if old_query.0 < reach * reach {
        (old0, old1, old_seg, old_query)
    } else if new_query.0 < reach * reach {
        (new0, new1, new_seg, new_query)
    } else {
        return;
    };

    let (normal, depth, surface) = if dist_sq > epsilon::DIRECTION_SQ {
        round_box_contact(seg.point_at(t), box_point, dist_sq, capsule.radius, obb, ctx)
    } else {
        // Core runs through the box
        let (push, normal, surface) = segment_box_penetration(&seg, obb);
        (normal, capsule.radius + push, surface)
    };
    let point = surface - normal * (0.5 * depth);
    report_single(info, ctx, functor, point, normal, depth);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionConfig;
    use crate::physics::collision::detect::test_support::{body, moving_body, run};
    use crate::physics::collision::primitives::Sphere;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_spheres_one_and_a_half_apart() {
        let a = body(Sphere::new(Vec3::zeros(), 1.0));
        let b = body(Sphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0));
        let (collector, stats) = run(sphere_sphere, &a, &b, &CollisionConfig::default());

        assert_eq!(collector.reports().len(), 1);
        let report = &collector.reports()[0];
        assert_relative_eq!(report.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.5, epsilon = EPSILON);
        // Midway through the overlap
        assert_relative_eq!(report.points[0].r0, Vec3::new(0.75, 0.0, 0.0), epsilon = EPSILON);
        assert_eq!(stats.notifications, 1);
    }

    #[test]
    fn test_disjoint_spheres() {
        let a = body(Sphere::new(Vec3::zeros(), 1.0));
        let b = body(Sphere::new(Vec3::new(2.1, 0.0, 0.0), 1.0));
        let (collector, _) = run(sphere_sphere, &a, &b, &CollisionConfig::default());
        assert!(collector.reports().is_empty());
    }

    #[test]
    fn test_coincident_spheres_use_fallback_normal() {
        let a = body(Sphere::new(Vec3::zeros(), 1.0));
        let b = body(Sphere::new(Vec3::zeros(), 1.0));
        let (collector, _) = run(sphere_sphere, &a, &b, &CollisionConfig::default());
        assert_relative_eq!(collector.reports()[0].normal, Vec3::y());
        assert_relative_eq!(collector.reports()[0].points[0].initial_penetration, 2.0);
    }

    #[test]
    fn test_spheres_meeting_during_step_use_end_pose() {
        // Apart at the start of the step, overlapping at the end
        let a = moving_body(Sphere::new(Vec3::zeros(), 1.0), Vec3::zeros(), Vec3::new(1.5, 0.0, 0.0));
        let b = body(Sphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0));
        let (collector, _) = run(sphere_sphere, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.points[0].initial_penetration, 0.5, epsilon = EPSILON);
        assert_relative_eq!(report.normal, -Vec3::x(), epsilon = EPSILON);
        // Offset still taken from the start position of A
        assert_relative_eq!(report.points[0].r0, Vec3::new(2.25, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_capsule_thrown_into_box_uses_end_pose() {
        let a = moving_body(
            Capsule::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), 0.25),
            Vec3::new(0.0, 6.0, 0.0),
            Vec3::new(0.0, 1.1, 0.0),
        );
        let b = body(OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0)));
        let (collector, _) = run(capsule_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.15, epsilon = EPSILON);
    }

    #[test]
    fn test_sphere_against_capsule_side() {
        let a = body(Sphere::new(Vec3::new(0.0, 0.8, 1.0), 0.5));
        let b = body(Capsule::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 2.0), 0.5));
        let (collector, _) = run(sphere_capsule, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.2, epsilon = EPSILON);
    }

    #[test]
    fn test_crossing_capsules() {
        let a = body(Capsule::new(Vec3::new(-1.0, 0.5, 0.0), Vec3::new(2.0, 0.0, 0.0), 0.3));
        let b = body(Capsule::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 2.0), 0.3));
        let (collector, _) = run(capsule_capsule, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.1, epsilon = EPSILON);

        let far = body(Capsule::new(Vec3::new(-1.0, 2.0, 0.0), Vec3::new(2.0, 0.0, 0.0), 0.3));
        let (collector, _) = run(capsule_capsule, &far, &b, &CollisionConfig::default());
        assert!(collector.reports().is_empty());
    }

    #[test]
    fn test_sphere_resting_on_box() {
        let a = body(Sphere::new(Vec3::new(0.2, 1.4, 0.0), 0.5));
        let b = body(OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0)));
        let (collector, _) = run(sphere_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.1, epsilon = EPSILON);
        assert_relative_eq!(report.points[0].r1, Vec3::new(0.2, 0.95, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_sphere_centre_inside_box() {
        let a = body(Sphere::new(Vec3::new(0.0, 0.0, 0.9), 0.5));
        let b = body(OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0)));
        let (collector, _) = run(sphere_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.normal, Vec3::z(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.6, epsilon = EPSILON);
    }

    #[test]
    fn test_capsule_lying_across_box() {
        let a = body(Capsule::new(Vec3::new(-2.0, 1.25, 0.0), Vec3::new(4.0, 0.0, 0.0), 0.3));
        let b = body(OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0)));
        let (collector, _) = run(capsule_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.05, epsilon = EPSILON);

        let above = body(Capsule::new(Vec3::new(-2.0, 1.5, 0.0), Vec3::new(4.0, 0.0, 0.0), 0.3));
        let (collector, _) = run(capsule_box, &above, &b, &CollisionConfig::default());
        assert!(collector.reports().is_empty());
    }

    #[test]
    fn test_capsule_core_inside_box() {
        let a = body(Capsule::new(Vec3::new(-0.5, -0.2, 0.0), Vec3::new(0.0, 0.4, 0.0), 0.2));
        let b = body(OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0)));
        let (collector, _) = run(capsule_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        // Pushed out through the nearest face
        assert_relative_eq!(report.normal, -Vec3::x(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.7, epsilon = EPSILON);
    }

    #[test]
    fn test_capsule_skewered_through_box() {
        let a = body(Capsule::new(Vec3::new(-3.0, 0.3, 0.0), Vec3::new(6.0, 0.0, 0.0), 0.2));
        let b = body(OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(1.0)));
        let (collector, _) = run(capsule_box, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        // Out through the top face, which is 0.7 above the core
        assert_relative_eq!(report.normal, Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(report.points[0].initial_penetration, 0.9, epsilon = EPSILON);
    }
}
