use super::random_vec;
use crate::foundation::math::Vec3;
use crate::physics::collision::distance::{point_segment_distance_sq, segment_segment_distance_sq};
use crate::physics::collision::intersection::swept_sphere_plane;
use crate::physics::collision::primitives::{Plane, Segment};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_point_segment_parameter_in_range() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let seg = Segment::new(random_vec(&mut rng, 5.0), random_vec(&mut rng, 5.0));
        let point = random_vec(&mut rng, 10.0);
        let (dist_sq, t) = point_segment_distance_sq(point, &seg);
        assert!((0.0..=1.0).contains(&t));
        assert_relative_eq!(dist_sq, (point - seg.point_at(t)).magnitude_squared(), epsilon = 1e-3);
    }
}

#[test]
fn test_point_segment_interior_projection_is_perpendicular() {
    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..200 {
        let seg = Segment::new(random_vec(&mut rng, 5.0), Vec3::new(4.0, 0.0, 0.0));
        let along = rng.gen_range(0.1..3.9);
        let offset = Vec3::new(0.0, rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
        let point = seg.origin + Vec3::new(along, 0.0, 0.0) + offset;
        let (dist_sq, t) = point_segment_distance_sq(point, &seg);
        assert_relative_eq!(t, along / 4.0, epsilon = 1e-4);
        assert_relative_eq!(dist_sq, offset.magnitude_squared(), epsilon = 1e-3);
    }
}

#[test]
fn test_segment_segment_reconstruction() {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..500 {
        let a = Segment::new(random_vec(&mut rng, 5.0), random_vec(&mut rng, 3.0));
        let b = Segment::new(random_vec(&mut rng, 5.0), random_vec(&mut rng, 3.0));
        let (dist_sq, s, t) = segment_segment_distance_sq(&a, &b);
        assert!((0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t));

        let rebuilt = (a.point_at(s) - b.point_at(t)).magnitude_squared();
        assert_relative_eq!(dist_sq, rebuilt, epsilon = 1e-3);

        // No sampled pair of points is meaningfully closer
        let mut sampled = f32::MAX;
        for i in 0..=16 {
            for j in 0..=16 {
                let d = (a.point_at(i as f32 / 16.0) - b.point_at(j as f32 / 16.0)).magnitude();
                sampled = sampled.min(d);
            }
        }
        assert!(dist_sq.sqrt() <= sampled + 1e-3);
    }
}

#[test]
fn test_swept_sphere_plane_impact() {
    let mut rng = StdRng::seed_from_u64(14);
    for _ in 0..500 {
        let normal = random_vec(&mut rng, 1.0);
        if normal.magnitude_squared() < 0.01 {
            continue;
        }
        let plane = Plane::from_point_normal(random_vec(&mut rng, 5.0), normal.normalize());
        let radius = rng.gen_range(0.1..2.0);
        let d0 = radius + rng.gen_range(0.01..10.0);
        let d1 = radius - rng.gen_range(0.01..10.0);

        let lateral = random_vec(&mut rng, 5.0);
        let base = plane.project_point(random_vec(&mut rng, 5.0));
        let old_center = base + plane.normal * d0;
        let new_center = plane.project_point(base + lateral) + plane.normal * d1;

        let hit = swept_sphere_plane(old_center, new_center, radius, &plane).unwrap();
        assert!(hit.t > 0.0 && hit.t < 1.0);
        assert_relative_eq!(plane.distance_to_point(hit.center), radius, epsilon = 1e-3);
        assert_relative_eq!(hit.depth, radius - d1, epsilon = 1e-3);
    }
}
