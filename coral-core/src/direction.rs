//! Unit-direction math for growing tips.
//!
//! All functions take and return unit vectors and renormalize their output,
//! so repeated application does not drift off the unit sphere.

use std::f64::consts::TAU;

use glam::{DQuat, DVec3};

use crate::rng::GrowthRng;

/// Cone samples drawn before falling back to reflection when a direction
/// must not point against the growth axis.
pub const MAX_UPWARD_ATTEMPTS: usize = 12;

/// Samples a direction uniformly in azimuth and polar angle inside a cone.
///
/// The cone is centred on `dir` with half-angle `max_angle` (radians).
/// Consumes two draws: azimuth, then polar angle.
///
/// ### Parameters
/// - `dir` - Cone axis; must be unit length.
/// - `max_angle` - Largest polar deviation from `dir`, in radians.
/// - `rng` - Stream to draw from.
///
/// ### Returns
/// A unit vector at most `max_angle` away from `dir`.
pub fn sample_cone(dir: DVec3, max_angle: f64, rng: &mut GrowthRng) -> DVec3 {
    let (u, v) = dir.any_orthonormal_pair();

    let theta = rng.range(0.0, TAU);
    let phi = rng.range(0.0, max_angle);

    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();

    (dir * cos_phi + u * (sin_phi * cos_theta) + v * (sin_phi * sin_theta)).normalize_or(dir)
}

/// Perturbs `dir` inside a cone, optionally keeping it on the upper side of
/// `upward`.
///
/// With `upward = Some(axis)`, samples whose component along `axis` is
/// negative are re-drawn up to [`MAX_UPWARD_ATTEMPTS`] times; the last
/// sample is then mirrored with [`reflect_upward`].
pub fn perturb(dir: DVec3, max_angle: f64, upward: Option<DVec3>, rng: &mut GrowthRng) -> DVec3 {
    let Some(axis) = upward else {
        return sample_cone(dir, max_angle, rng);
    };

    let mut candidate = dir;
    for _ in 0..MAX_UPWARD_ATTEMPTS {
        candidate = sample_cone(dir, max_angle, rng);
        if candidate.dot(axis) >= 0.0 {
            return candidate;
        }
    }
    reflect_upward(candidate, axis)
}

/// Mirrors `dir` across the plane orthogonal to `axis` if it points below it.
#[inline]
pub fn reflect_upward(dir: DVec3, axis: DVec3) -> DVec3 {
    let along = dir.dot(axis);
    if along < 0.0 {
        (dir - axis * (2.0 * along)).normalize_or(axis)
    } else {
        dir
    }
}

/// Rotates `dir` about `axis` by `angle` radians (right-handed).
#[inline]
pub fn twist(dir: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    if angle == 0.0 {
        return dir;
    }
    (DQuat::from_axis_angle(axis, angle) * dir).normalize_or(dir)
}
