//! Detectors against static triangle meshes
//!
//! The mesh is body B and is always read at its end-of-step transform. The
//! moving primitive is tested at the end-of-step pose, or at evenly spaced
//! samples along its path when sweep tests are enabled. Candidate triangles
//! come from the mesh's spatial index and are rejected early by plane
//! distance and boolean overlap tests. Meshes are one-sided: a primitive whose centre is behind a
//! triangle does not collide with it.
//!
//! Spheres and capsules ignore hits on non-convex edges and vertices unless
//! the contact direction matches the face normal, so internal edges of a flat
//! surface never push sideways. When no sample produces a contact, a
//! continuous swept-sphere test catches fast-moving spheres and capsule caps.

use super::box_box::{inflated, Manifold, EDGE_AXIS_MARGIN, PARALLEL_AXIS_SQ};
use super::{expect_box, expect_capsule, expect_mesh, expect_sphere, resolve_normal, sweep_sample_count, DetectContext};
use crate::config::CollisionConfig;
use crate::foundation::math::{epsilon, utils, Vec3};
use crate::physics::collision::contact::{CollisionFunctor, ContactBuffer, ContactPoint};
use crate::physics::collision::distance::{point_triangle_distance_sq, segment_triangle_distance_sq};
use crate::physics::collision::intersection::{
    segment_box_intersection, segment_triangle_intersection, swept_sphere_triangle, SweptSphereHit,
};
use crate::physics::collision::overlap::{box_triangle_overlap, sphere_aabb_overlap};
use crate::physics::collision::primitives::{
    IndexedTriangle, OrientedBox, Segment, Sphere, Triangle, TriangleMesh, AABB,
};
use crate::physics::collision::skin::CollDetectInfo;

/// Barycentric slack when deciding which triangle feature is closest
const FEATURE_EPSILON: f32 = 1.0e-4;

/// Minimum cosine between contact direction and face normal for a non-convex feature to count
const NORMAL_ALIGNMENT: f32 = 0.99;

/// Capsule core hits this close to an end cap are left to the cap test
const CORE_END_MARGIN: f32 = 1.0e-3;

/// Closest feature of a triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feature {
    Face,
    Edge(usize),
    Vertex(usize),
}

/// Classify the closest point `origin + s*edge0 + t*edge1`
fn closest_feature(s: f32, t: f32) -> Feature {
    let on_edge0 = t <= FEATURE_EPSILON;
    let on_edge1 = s + t >= 1.0 - FEATURE_EPSILON;
    let on_edge2 = s <= FEATURE_EPSILON;
    match (on_edge0, on_edge1, on_edge2) {
        (true, _, true) => Feature::Vertex(0),
        (true, true, _) => Feature::Vertex(1),
        (_, true, true) => Feature::Vertex(2),
        (true, _, _) => Feature::Edge(0),
        (_, true, _) => Feature::Edge(1),
        (_, _, true) => Feature::Edge(2),
        _ => Feature::Face,
    }
}

fn feature_allowed(tri: &IndexedTriangle, feature: Feature, direction: Vec3) -> bool {
    let convex = match feature {
        Feature::Face => return true,
        Feature::Edge(i) => tri.is_edge_convex(i),
        Feature::Vertex(i) => tri.is_vertex_convex(i),
    };
    convex || direction.dot(&tri.plane.normal) >= NORMAL_ALIGNMENT
}

/// Contacts gathered across the candidate triangles of one pose
struct MeshContacts {
    contacts: ContactBuffer,
    normal_sum: Vec3,
    manifold_dropped: usize,
}

impl MeshContacts {
    fn new() -> Self {
        Self {
            contacts: ContactBuffer::new(),
            normal_sum: Vec3::zeros(),
            manifold_dropped: 0,
        }
    }

    fn push(&mut self, point: Vec3, normal: Vec3, depth: f32, weight: f32, bodies: (Vec3, Vec3)) {
        self.contacts.push(ContactPoint::at(point, bodies.0, bodies.1, depth));
        self.normal_sum += normal * weight.max(epsilon::EPSILON);
    }

    fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

fn report_mesh_contacts(
    info: &CollDetectInfo<'_>,
    ctx: &mut DetectContext<'_>,
    functor: &mut dyn CollisionFunctor,
    acc: &MeshContacts,
) {
    if acc.manifold_dropped > 0 {
        ctx.stats.truncated_contacts += acc.manifold_dropped as u64;
        log::debug!("Mesh manifold dropped {} points", acc.manifold_dropped);
    }
    let normal = resolve_normal(&[acc.normal_sum], ctx.config);
    ctx.report(info, normal, &acc.contacts, functor);
}

/// Fill the candidate buffer for a world-space box
fn query(ctx: &mut DetectContext<'_>, mesh: &TriangleMesh, world_box: &AABB, detector: &'static str) {
    mesh.triangles_intersecting_aabb(world_box, ctx.candidates);
    ctx.note_candidate_truncation(detector);
}

/// Number of poses to test and the box enclosing all of them
fn sampling(config: &CollisionConfig, old_box: AABB, new_box: AABB, travel: f32, min_dim: f32) -> (u32, AABB) {
    let tolerance = config.collision_tolerance;
    if config.use_sweep_tests {
        let samples = sweep_sample_count(travel, min_dim, config.max_sweep_samples);
        (samples, old_box.merge(&new_box).inflated(tolerance))
    } else {
        (1, new_box.inflated(tolerance))
    }
}

/// A sphere core against one triangle, in mesh space
fn round_triangle_contact(
    core: Vec3,
    dist_sq: f32,
    s: f32,
    t: f32,
    tri: &Triangle,
    indexed: &IndexedTriangle,
    radius: f32,
    tolerance: f32,
    mesh: &TriangleMesh,
    bodies: (Vec3, Vec3),
    acc: &mut MeshContacts,
) {
    let reach = radius + tolerance;
    if dist_sq >= reach * reach {
        return;
    }
    let closest = tri.point_at(s, t);
    let dist = dist_sq.sqrt();
    let direction = if dist > epsilon::EPSILON {
        (core - closest) / dist
    } else {
        indexed.plane.normal
    };
    if !feature_allowed(indexed, closest_feature(s, t), direction) {
        return;
    }

    let depth = radius - dist;
    let point = closest - direction * (0.5 * depth);
    acc.push(
        mesh.transform().transform_point(point),
        mesh.transform().transform_vector(direction),
        depth,
        depth + tolerance,
        bodies,
    );
}

/// Sphere at mesh-space `center` against the candidate triangles
fn sphere_triangles(
    center: Vec3,
    radius: f32,
    mesh: &TriangleMesh,
    candidates: &[u32],
    tolerance: f32,
    bodies: (Vec3, Vec3),
    acc: &mut MeshContacts,
) {
    let reach = radius + tolerance;
    let bound = Sphere::new(center, reach);
    for &index in candidates {
        let indexed = mesh.triangle(index);
        let plane_dist = indexed.plane.distance_to_point(center);
        if plane_dist <= 0.0 || plane_dist >= reach || !sphere_aabb_overlap(&bound, &indexed.aabb) {
            continue;
        }
        let tri = mesh.local_triangle(index);
        let (dist_sq, s, t) = point_triangle_distance_sq(center, &tri);
        round_triangle_contact(center, dist_sq, s, t, &tri, indexed, radius, tolerance, mesh, bodies, acc);
    }
}

/// Capsule with mesh-space core `seg` against the candidate triangles
fn capsule_triangles(
    seg: &Segment,
    radius: f32,
    mesh: &TriangleMesh,
    candidates: &[u32],
    tolerance: f32,
    bodies: (Vec3, Vec3),
    acc: &mut MeshContacts,
) {
    let reach = radius + tolerance;
    let ends = [seg.origin, seg.end()];
    let bound = Sphere::new(seg.point_at(0.5), 0.5 * seg.length_sq().sqrt() + reach);
    for &index in candidates {
        let indexed = mesh.triangle(index);
        let d0 = indexed.plane.distance_to_point(ends[0]);
        let d1 = indexed.plane.distance_to_point(ends[1]);
        if d0.max(d1) <= 0.0 || d0.min(d1) >= reach || !sphere_aabb_overlap(&bound, &indexed.aabb) {
            continue;
        }
        let tri = mesh.local_triangle(index);

        for (end, plane_dist) in ends.iter().zip([d0, d1]) {
            if plane_dist > 0.0 && plane_dist < reach {
                let (dist_sq, s, t) = point_triangle_distance_sq(*end, &tri);
                round_triangle_contact(*end, dist_sq, s, t, &tri, indexed, radius, tolerance, mesh, bodies, acc);
            }
        }

        let (dist_sq, seg_t, s, t) = segment_triangle_distance_sq(seg, &tri);
        if seg_t > CORE_END_MARGIN && seg_t < 1.0 - CORE_END_MARGIN {
            let core = seg.point_at(seg_t);
            round_triangle_contact(core, dist_sq, s, t, &tri, indexed, radius, tolerance, mesh, bodies, acc);
        }
    }
}

/// Minimum-penetration axis between a box and a triangle, oriented toward the box
///
/// Tests the face normal, the three box axes and the nine edge cross products.
/// Cross axes must be shallower than the best face axis by a margin.
pub fn box_triangle_separation(obb: &OrientedBox, tri: &Triangle, tolerance: f32) -> Option<(Vec3, f32)> {
    let normal = utils::try_normalize(tri.raw_normal())?;
    let points = [tri.point(0), tri.point(1), tri.point(2)];
    let penetration = |axis: Vec3| -> (Vec3, f32) {
        let c = axis.dot(&obb.center);
        let r = obb.projected_radius(&axis);
        let (mut lo, mut hi) = (f32::MAX, -f32::MAX);
        for p in &points {
            let d = axis.dot(p);
            lo = lo.min(d);
            hi = hi.max(d);
        }
        let push_forward = hi - (c - r);
        let push_back = (c + r) - lo;
        if push_forward <= push_back {
            (axis, push_forward)
        } else {
            (-axis, push_back)
        }
    };

    let mut best = penetration(normal);
    if best.1 < -tolerance {
        return None;
    }
    let box_axes = obb.axes();
    for axis in box_axes {
        let candidate = penetration(axis);
        if candidate.1 < -tolerance {
            return None;
        }
        if candidate.1 < best.1 {
            best = candidate;
        }
    }

    let face_depth = best.1;
    let edges = [tri.edge0, tri.edge1 - tri.edge0, -tri.edge1];
    for box_axis in &box_axes {
        for edge in &edges {
            let axis = box_axis.cross(edge);
            let len_sq = axis.magnitude_squared();
            if len_sq < PARALLEL_AXIS_SQ * edge.magnitude_squared() {
                continue;
            }
            let candidate = penetration(axis / len_sq.sqrt());
            if candidate.1 < -tolerance {
                return None;
            }
            if candidate.1 < best.1 && candidate.1 < face_depth - EDGE_AXIS_MARGIN * face_depth.abs() {
                best = candidate;
            }
        }
    }
    Some(best)
}

/// Box in mesh space against the candidate triangles
fn box_triangles(
    obb: &OrientedBox,
    mesh: &TriangleMesh,
    candidates: &[u32],
    tolerance: f32,
    combination_dist: f32,
    bodies: (Vec3, Vec3),
    acc: &mut MeshContacts,
) {
    let slack = inflated(obb, tolerance.max(0.0));
    for &index in candidates {
        let indexed = mesh.triangle(index);
        let plane_dist = indexed.plane.distance_to_point(obb.center);
        if plane_dist <= 0.0 || plane_dist >= obb.projected_radius(&indexed.plane.normal) + tolerance {
            continue;
        }
        let tri = mesh.local_triangle(index);
        if !box_triangle_overlap(&slack, &tri) {
            continue;
        }
        let Some((axis, depth)) = box_triangle_separation(obb, &tri, tolerance) else {
            continue;
        };

        let mut manifold = Manifold::new(combination_dist);
        for i in 0..3 {
            let edge = tri.edge_segment(i);
            if let Some((t_enter, t_exit)) = segment_box_intersection(&edge, &slack) {
                manifold.add(edge.point_at(t_enter));
                manifold.add(edge.point_at(t_exit));
            }
        }
        for edge in obb.edges() {
            if let Some((t, _, _)) = segment_triangle_intersection(&edge, &tri) {
                manifold.add(edge.point_at(t));
            }
        }
        if manifold.as_slice().is_empty() {
            // Hovering inside the tolerance band: use corners over the face
            for corner in obb.corners() {
                let d = indexed.plane.distance_to_point(corner);
                if d < tolerance && tri.contains_coplanar_point(indexed.plane.project_point(corner)) {
                    manifold.add(corner);
                }
            }
        }
        if manifold.as_slice().is_empty() {
            manifold.add(obb.support_point(-axis));
        }

        acc.manifold_dropped += manifold.dropped();
        let world_axis = mesh.transform().transform_vector(axis);
        for p in manifold.as_slice() {
            acc.push(mesh.transform().transform_point(*p), world_axis, depth, depth + tolerance, bodies);
        }
    }
}

/// Earliest swept-sphere hit against the candidate triangles, in mesh space
fn swept_sphere_triangles(
    old_center: Vec3,
    new_center: Vec3,
    radius: f32,
    mesh: &TriangleMesh,
    candidates: &[u32],
) -> Option<SweptSphereHit> {
    let path = new_center - old_center;
    let bound = Sphere::new(old_center + path * 0.5, radius + 0.5 * path.magnitude());
    let mut best: Option<SweptSphereHit> = None;
    for &index in candidates {
        let indexed = mesh.triangle(index);
        if !sphere_aabb_overlap(&bound, &indexed.aabb) {
            continue;
        }
        let edges = std::array::from_fn(|i| indexed.is_edge_convex(i));
        let vertices = std::array::from_fn(|i| indexed.is_vertex_convex(i));
        let tri = mesh.local_triangle(index);
        if let Some(hit) = swept_sphere_triangle(old_center, new_center, radius, &tri, edges, vertices) {
            if best.map_or(true, |b| hit.t < b.t) {
                best = Some(hit);
            }
        }
    }
    best
}

/// Continuous fallback for spheres with world-space paths `paths`; reports the earliest hit
fn swept_fallback(
    info: &CollDetectInfo<'_>,
    ctx: &mut DetectContext<'_>,
    functor: &mut dyn CollisionFunctor,
    mesh: &TriangleMesh,
    paths: &[(Vec3, Vec3)],
    radius: f32,
    detector: &'static str,
) {
    if paths.iter().all(|(a, b)| (b - a).magnitude_squared() <= epsilon::DIRECTION_SQ) {
        return;
    }
    let mut swept_box = AABB::empty();
    for (a, b) in paths {
        swept_box.add_point(*a);
        swept_box.add_point(*b);
    }
    let reach = radius + ctx.config.collision_tolerance;
    query(ctx, mesh, &swept_box.inflated(reach), detector);

    let inverse = mesh.inverse_transform();
    let mut best: Option<SweptSphereHit> = None;
    for (old_center, new_center) in paths {
        let hit = swept_sphere_triangles(
            inverse.transform_point(*old_center),
            inverse.transform_point(*new_center),
            radius,
            mesh,
            ctx.candidates.as_slice(),
        );
        if let Some(hit) = hit {
            if best.map_or(true, |b| hit.t < b.t) {
                best = Some(hit);
            }
        }
    }
    let Some(hit) = best else {
        return;
    };

    log::trace!("{} swept fallback hit at t = {}", detector, hit.t);
    let mut contacts = ContactBuffer::new();
    contacts.push(ContactPoint::at(
        mesh.transform().transform_point(hit.point),
        info.skin0().old_position(),
        info.skin1().old_position(),
        hit.depth,
    ));
    let normal = mesh.transform().transform_vector(hit.normal);
    ctx.report(info, normal, &contacts, functor);
}

/// Contacts from any sample pose are offset from the start-of-step positions
fn old_bodies(info: &CollDetectInfo<'_>) -> (Vec3, Vec3) {
    (info.skin0().old_position(), info.skin1().old_position())
}

/// Sphere A against mesh B
pub fn sphere_mesh(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "sphere-mesh";
    let old_sphere = expect_sphere(info.old0(), NAME);
    let new_sphere = expect_sphere(info.new0(), NAME);
    let mesh = expect_mesh(info.new1(), NAME);
    let config = ctx.config;
    let tolerance = config.collision_tolerance;
    let radius = new_sphere.radius;

    let travel = (new_sphere.position - old_sphere.position).magnitude();
    let (samples, query_box) = sampling(config, old_sphere.aabb(), new_sphere.aabb(), travel, 2.0 * radius);
    query(ctx, mesh, &query_box, NAME);

    let inverse = mesh.inverse_transform();
    let mut acc = MeshContacts::new();
    for i in 1..=samples {
        let frac = i as f32 / samples as f32;
        let center = inverse.transform_point(old_sphere.position.lerp(&new_sphere.position, frac));
        sphere_triangles(center, radius, mesh, ctx.candidates.as_slice(), tolerance, old_bodies(info), &mut acc);
        if !acc.is_empty() {
            break;
        }
    }

    if acc.is_empty() {
        swept_fallback(info, ctx, functor, mesh, &[(old_sphere.position, new_sphere.position)], radius, NAME);
    } else {
        report_mesh_contacts(info, ctx, functor, &acc);
    }
}

/// Capsule A against mesh B
pub fn capsule_mesh(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "capsule-mesh";
    let old_capsule = expect_capsule(info.old0(), NAME);
    let new_capsule = expect_capsule(info.new0(), NAME);
    let mesh = expect_mesh(info.new1(), NAME);
    let config = ctx.config;
    let tolerance = config.collision_tolerance;
    let radius = new_capsule.radius;

    let travel = (new_capsule.position - old_capsule.position)
        .magnitude()
        .max((new_capsule.end() - old_capsule.end()).magnitude());
    let (samples, query_box) = sampling(config, old_capsule.aabb(), new_capsule.aabb(), travel, 2.0 * radius);
    query(ctx, mesh, &query_box, NAME);

    let inverse = mesh.inverse_transform();
    let mut acc = MeshContacts::new();
    for i in 1..=samples {
        let frac = i as f32 / samples as f32;
        let start = old_capsule.position.lerp(&new_capsule.position, frac);
        let end = old_capsule.end().lerp(&new_capsule.end(), frac);
        let seg = Segment::from_points(inverse.transform_point(start), inverse.transform_point(end));
        capsule_triangles(&seg, radius, mesh, ctx.candidates.as_slice(), tolerance, old_bodies(info), &mut acc);
        if !acc.is_empty() {
            break;
        }
    }

    if acc.is_empty() {
        let paths = [
            (old_capsule.position, new_capsule.position),
            (old_capsule.end(), new_capsule.end()),
        ];
        swept_fallback(info, ctx, functor, mesh, &paths, radius, NAME);
    } else {
        report_mesh_contacts(info, ctx, functor, &acc);
    }
}

/// Box A against mesh B
pub fn box_mesh(info: &CollDetectInfo<'_>, ctx: &mut DetectContext<'_>, functor: &mut dyn CollisionFunctor) {
    const NAME: &str = "box-mesh";
    let old_box = expect_box(info.old0(), NAME);
    let new_box = expect_box(info.new0(), NAME);
    let mesh = expect_mesh(info.new1(), NAME);
    let config = ctx.config;
    let tolerance = config.collision_tolerance;
    let combination_dist = config.combination_fraction * new_box.min_dimension();

    let travel = old_box
        .corners()
        .iter()
        .zip(new_box.corners().iter())
        .map(|(a, b)| (b - a).magnitude())
        .fold(0.0, f32::max);
    let (samples, query_box) = sampling(config, old_box.aabb(), new_box.aabb(), travel, new_box.min_dimension());
    query(ctx, mesh, &query_box, NAME);

    let old_frame = old_box.frame();
    let new_frame = new_box.frame();
    let mut acc = MeshContacts::new();
    for i in 1..=samples {
        let frac = i as f32 / samples as f32;
        let frame = old_frame.interpolate(&new_frame, frac);
        let sample = OrientedBox::new(frame.position, frame.rotation, new_box.half_extents);
        let local = sample.transformed(mesh.inverse_transform());
        box_triangles(&local, mesh, ctx.candidates.as_slice(), tolerance, combination_dist, old_bodies(info), &mut acc);
        if !acc.is_empty() {
            break;
        }
    }

    if !acc.is_empty() {
        report_mesh_contacts(info, ctx, functor, &acc);
    }
}
