//! Detectors against infinite planes
//!
//! The plane is always body B and the contact normal is its normal. Box
//! corners, capsule end caps and sphere centres are tested one by one, on
//! the start-of-step pose when it is in reach and on the end-of-step pose
//! otherwise.

use super::{expect_box, expect_capsule, expect_plane, expect_sphere, DetectContext};
use crate::foundation::math::Vec3;
use crate::physics::collision::contact::{CollisionFunctor, ContactBuffer, ContactPoint};
use crate::physics::collision::primitives::{Capsule, Plane};
use crate::physics::collision::skin::CollDetectInfo;

/// Box A against plane B
pub fn box_plane(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "box-plane";
    let old_box = expect_box(info.old0(), NAME);
    let new_box = expect_box(info.new0(), NAME);
    let old_plane = expect_plane(info.old1(), NAME);
    let new_plane = expect_plane(info.new1(), NAME);

    let tolerance = ctx.config.collision_tolerance;
    let (body0, body1) = (info.skin0().old_position(), info.skin1().old_position());

    // Lowest corner distance of each pose
    let old_lowest = old_plane.distance_to_point(old_box.center) - old_box.projected_radius(&old_plane.normal);
    let new_lowest = new_plane.distance_to_point(new_box.center) - new_box.projected_radius(&new_plane.normal);
    let (obb, plane) = if old_lowest < tolerance {
        (old_box, old_plane)
    } else if new_lowest < tolerance {
        (new_box, new_plane)
    } else {
        return;
    };

    let mut contacts = ContactBuffer::new();
    for corner in obb.corners() {
        let depth = -plane.distance_to_point(corner);
        if depth > -tolerance {
            contacts.push(ContactPoint::at(corner, body0, body1, depth));
        }
    }
    ctx.report(info, plane.normal, &contacts, functor);
}

/// Sphere A against plane B
pub fn sphere_plane(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "sphere-plane";
    let old_sphere = expect_sphere(info.old0(), NAME);
    let new_sphere = expect_sphere(info.new0(), NAME);
    let old_plane = expect_plane(info.old1(), NAME);
    let new_plane = expect_plane(info.new1(), NAME);

    let reach = old_sphere.radius + ctx.config.collision_tolerance;
    let old_dist = old_plane.distance_to_point(old_sphere.position);
    let new_dist = new_plane.distance_to_point(new_sphere.position);
    let (sphere, plane, dist) = if old_dist < reach {
        (old_sphere, old_plane, old_dist)
    } else if new_dist < reach {
        (new_sphere, new_plane, new_dist)
    } else {
        return;
    };

    let point = sphere.position - plane.normal * sphere.radius;
    let mut contacts = ContactBuffer::new();
    contacts.push(ContactPoint::at(
        point,
        info.skin0().old_position(),
        info.skin1().old_position(),
        sphere.radius - dist,
    ));
    ctx.report(info, plane.normal, &contacts, functor);
}

/// Capsule A against plane B
pub fn capsule_plane(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "capsule-plane";
    let old_capsule = expect_capsule(info.old0(), NAME);
    let new_capsule = expect_capsule(info.new0(), NAME);
    let old_plane = expect_plane(info.old1(), NAME);
    let new_plane = expect_plane(info.new1(), NAME);

    let reach = old_capsule.radius + ctx.config.collision_tolerance;
    let lowest_end = |capsule: &Capsule, plane: &Plane| {
        plane.distance_to_point(capsule.position).min(plane.distance_to_point(capsule.end()))
    };
    let (capsule, plane) = if lowest_end(old_capsule, old_plane) < reach {
        (old_capsule, old_plane)
    } else if lowest_end(new_capsule, new_plane) < reach {
        (new_capsule, new_plane)
    } else {
        return;
    };

    let (body0, body1) = (info.skin0().old_position(), info.skin1().old_position());
    let mut contacts = ContactBuffer::new();
    for end in [capsule.position, capsule.end()] {
        let dist = plane.distance_to_point(end);
        if dist < reach {
            let point = end - plane.normal * capsule.radius;
            contacts.push(ContactPoint::at(point, body0, body1, capsule.radius - dist));
        }
    }
    ctx.report(info, plane.normal, &contacts, functor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionConfig;
    use crate::foundation::math::Quat;
    use crate::physics::collision::detect::test_support::{body, fixed, moving_body, run};
    use crate::physics::collision::primitives::{OrientedBox, Sphere};
    use approx::assert_relative_eq;

    fn ground() -> Plane {
        Plane::from_point_normal(Vec3::zeros(), Vec3::y())
    }

    #[test]
    fn test_box_resting_on_plane() {
        let a = body(OrientedBox::axis_aligned(Vec3::new(0.0, 0.9, 0.0), Vec3::repeat(1.0)));
        let b = fixed(ground());
        let (collector, _) = run(box_plane, &a, &b, &CollisionConfig::default());

        let report = &collector.reports()[0];
        assert_eq!(report.points.len(), 4);
        assert_relative_eq!(report.normal, Vec3::y());
        for point in &report.points {
            assert_relative_eq!(point.initial_penetration, 0.1, epsilon = 1e-5);
            assert_relative_eq!(point.r0.y, -0.1, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_tilted_box_touches_with_one_corner() {
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4)
            * Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_4);
        let obb = OrientedBox::new(Vec3::zeros(), rotation, Vec3::repeat(0.5));
        let lowest = obb.support_point(-Vec3::y()).y;
        let a = body(OrientedBox::new(Vec3::new(0.0, -lowest - 0.01, 0.0), rotation, Vec3::repeat(0.5)));
        let b = fixed(ground());
        let (collector, _) = run(box_plane, &a, &b, &CollisionConfig::default());
        assert_eq!(collector.reports()[0].points.len(), 1);
    }

    #[test]
    fn test_box_above_plane() {
        let a = body(OrientedBox::axis_aligned(Vec3::new(0.0, 1.2, 0.0), Vec3::repeat(1.0)));
        let b = fixed(ground());
        let (collector, _) = run(box_plane, &a, &b, &CollisionConfig::default());
        assert!(collector.reports().is_empty());
    }

    #[test]
    fn test_sphere_on_plane() {
        let a = body(Sphere::new(Vec3::new(3.0, 0.4, 0.0), 0.5));
        let b = fixed(ground());
        let (collector, _) = run(sphere_plane, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_relative_eq!(report.points[0].initial_penetration, 0.1, epsilon = 1e-6);
        assert_relative_eq!(report.points[0].r1, Vec3::new(3.0, -0.1, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_tunnelling_through_plane_is_reported() {
        let a = moving_body(Sphere::new(Vec3::zeros(), 0.5), Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -2.0, 0.0));
        let b = fixed(ground());
        let (collector, _) = run(sphere_plane, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        // Measured on the end pose, offset from the start position
        assert_relative_eq!(report.points[0].initial_penetration, 2.5, epsilon = 1e-6);
        assert_relative_eq!(report.points[0].r0, Vec3::new(0.0, -4.5, 0.0), epsilon = 1e-6);
        assert_relative_eq!(report.normal, Vec3::y());
    }

    #[test]
    fn test_box_dropping_into_plane_uses_end_pose() {
        let a = moving_body(
            OrientedBox::axis_aligned(Vec3::zeros(), Vec3::repeat(0.5)),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, 0.2, 0.0),
        );
        let b = fixed(ground());
        let (collector, _) = run(box_plane, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_eq!(report.points.len(), 4);
        for point in &report.points {
            assert_relative_eq!(point.initial_penetration, 0.3, epsilon = 1e-5);
            assert_relative_eq!(point.r0.y, -3.3, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_capsule_dropping_into_plane_uses_end_pose() {
        let a = moving_body(
            Capsule::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 0.25),
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(0.0, 0.05, 0.0),
        );
        let b = fixed(ground());
        let (collector, _) = run(capsule_plane, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_eq!(report.points.len(), 2);
        for point in &report.points {
            assert_relative_eq!(point.initial_penetration, 0.2, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_capsule_with_one_end_down() {
        let a = body(Capsule::new(Vec3::new(0.0, 0.25, 0.0), Vec3::new(1.0, 2.0, 0.0), 0.3));
        let b = fixed(ground());
        let (collector, _) = run(capsule_plane, &a, &b, &CollisionConfig::default());
        let report = &collector.reports()[0];
        assert_eq!(report.points.len(), 1);
        assert_relative_eq!(report.points[0].initial_penetration, 0.05, epsilon = 1e-6);

        let flat = body(Capsule::new(Vec3::new(0.0, 0.25, 0.0), Vec3::new(2.0, 0.0, 0.0), 0.3));
        let (collector, _) = run(capsule_plane, &flat, &b, &CollisionConfig::default());
        assert_eq!(collector.reports()[0].points.len(), 2);
    }
}
