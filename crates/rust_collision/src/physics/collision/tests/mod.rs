//! Randomized property tests across the collision modules
//!
//! Every test seeds its own `StdRng`, so failures reproduce exactly.

mod geometry;

use crate::foundation::math::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::Rng;

pub(super) fn random_vec(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

pub(super) fn random_rotation(rng: &mut StdRng) -> Quat {
    let pi = std::f32::consts::PI;
    Quat::from_euler_angles(rng.gen_range(-pi..pi), rng.gen_range(-pi..pi), rng.gen_range(-pi..pi))
}
