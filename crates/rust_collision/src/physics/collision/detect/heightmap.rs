//! Detectors against heightmap terrain
//!
//! Terrain is body B. Each sample point (box corner, capsule end cap, sphere
//! centre) reads the height and normal beneath it, treating the terrain as
//! locally flat. Multi-point contacts share the averaged normal. The end of
//! step pose is sampled only when the start pose has nothing in reach.

use super::{expect_box, expect_capsule, expect_heightmap, expect_sphere, resolve_normal, DetectContext};
use crate::foundation::math::Vec3;
use crate::physics::collision::contact::{CollisionFunctor, ContactBuffer, ContactPoint};
use crate::physics::collision::primitives::{Capsule, Heightmap, OrientedBox};
use crate::physics::collision::skin::CollDetectInfo;

fn terrain_up(terrain: &Heightmap) -> Vec3 {
    terrain.transform.transform_vector(Vec3::y())
}

/// Corners of `obb` within `tolerance` of `terrain`, returning the summed terrain normal
fn corner_contacts(
    obb: &OrientedBox,
    terrain: &Heightmap,
    tolerance: f32,
    bodies: (Vec3, Vec3),
    contacts: &mut ContactBuffer,
) -> Vec3 {
    let mut normal_sum = Vec3::zeros();
    for corner in obb.corners() {
        let (dist, normal) = terrain.height_and_normal(corner);
        if dist < tolerance {
            contacts.push(ContactPoint::at(corner, bodies.0, bodies.1, -dist));
            normal_sum += normal;
        }
    }
    normal_sum
}

/// End caps of `capsule` within `reach` of `terrain`, returning the summed terrain normal
fn cap_contacts(
    capsule: &Capsule,
    terrain: &Heightmap,
    reach: f32,
    bodies: (Vec3, Vec3),
    contacts: &mut ContactBuffer,
) -> Vec3 {
    let mut normal_sum = Vec3::zeros();
    for end in [capsule.position, capsule.end()] {
        let (dist, normal) = terrain.height_and_normal(end);
        if dist < reach {
            let point = end - normal * capsule.radius;
            contacts.push(ContactPoint::at(point, bodies.0, bodies.1, capsule.radius - dist));
            normal_sum += normal;
        }
    }
    normal_sum
}

/// Box A against heightmap B
pub fn box_heightmap(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "box-heightmap";
    let old_box = expect_box(info.old0(), NAME);
    let new_box = expect_box(info.new0(), NAME);
    let old_terrain = expect_heightmap(info.old1(), NAME);
    let new_terrain = expect_heightmap(info.new1(), NAME);

    let tolerance = ctx.config.collision_tolerance;
    let bodies = (info.skin0().old_position(), info.skin1().old_position());

    let mut contacts = ContactBuffer::new();
    let mut terrain = old_terrain;
    let mut normal_sum = corner_contacts(old_box, old_terrain, tolerance, bodies, &mut contacts);
    if contacts.is_empty() {
        terrain = new_terrain;
        normal_sum = corner_contacts(new_box, new_terrain, tolerance, bodies, &mut contacts);
    }
    if contacts.is_empty() {
        return;
    }
    let normal = resolve_normal(&[normal_sum, terrain_up(terrain)], ctx.config);
    ctx.report(info, normal, &contacts, functor);
}

/// Sphere A against heightmap B
pub fn sphere_heightmap(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "sphere-heightmap";
    let old_sphere = expect_sphere(info.old0(), NAME);
    let new_sphere = expect_sphere(info.new0(), NAME);
    let old_terrain = expect_heightmap(info.old1(), NAME);
    let new_terrain = expect_heightmap(info.new1(), NAME);

    let reach = old_sphere.radius + ctx.config.collision_tolerance;
    let old_sample = old_terrain.height_and_normal(old_sphere.position);
    let new_sample = new_terrain.height_and_normal(new_sphere.position);
    let (sphere, terrain, (dist, normal)) = if old_sample.0 < reach {
        (old_sphere, old_terrain, old_sample)
    } else if new_sample.0 < reach {
        (new_sphere, new_terrain, new_sample)
    } else {
        return;
    };

    let normal = resolve_normal(&[normal, terrain_up(terrain)], ctx.config);
    let point = sphere.position - normal * sphere.radius;
    let mut contacts = ContactBuffer::new();
    contacts.push(ContactPoint::at(
        point,
        info.skin0().old_position(),
        info.skin1().old_position(),
        sphere.radius - dist,
    ));
    ctx.report(info, normal, &contacts, functor);
}

/// Capsule A against heightmap B
pub fn capsule_heightmap(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "capsule-heightmap";
    let old_capsule = expect_capsule(info.old0(), NAME);
    let new_capsule = expect_capsule(info.new0(), NAME);
    let old_terrain = expect_heightmap(info.old1(), NAME);
    let new_terrain = expect_heightmap(info.new1(), NAME);

    let reach = old_capsule.radius + ctx.config.collision_tolerance;
    let bodies = (info.skin0().old_position(), info.skin1().old_position());

    let mut contacts = ContactBuffer::new();
    let mut terrain = old_terrain;
    let mut normal_sum = cap_contacts(old_capsule, old_terrain, reach, bodies, &mut contacts);
    if contacts.is_empty() {
        terrain = new_terrain;
        normal_sum = cap_contacts(new_capsule, new_terrain, reach, bodies, &mut contacts);
    }
    if contacts.is_empty() {
        return;
    }
    let normal = resolve_normal(&[normal_sum, terrain_up(terrain)], ctx.config);
    ctx.report(info, normal, &contacts, functor);
}
