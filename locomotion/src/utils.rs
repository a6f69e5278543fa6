use nalgebra as na;

use crate::{Quat, Vec3, constants::ZERO_SQ};

/// World up axis.
#[inline]
pub fn up() -> Vec3 {
    Vec3::y()
}

/// Drop the vertical component.
#[inline]
pub fn horizontal(v: &Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Normalize, returning zero for (near) zero-length input.
#[inline]
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq <= ZERO_SQ {
        Vec3::zeros()
    } else {
        v / len_sq.sqrt()
    }
}

/// Vector projection of `v` onto `onto`; zero when `onto` is zero.
#[inline]
pub fn project(v: &Vec3, onto: &Vec3) -> Vec3 {
    let len_sq = onto.norm_squared();
    if len_sq <= ZERO_SQ {
        return Vec3::zeros();
    }
    onto * (v.dot(onto) / len_sq)
}

/// Shorten `v` to at most `max_len`, keeping its direction.
#[inline]
pub fn clamp_length(v: &Vec3, max_len: f32) -> Vec3 {
    let max_len = max_len.max(0.0);
    let len_sq = v.norm_squared();
    if len_sq > max_len * max_len {
        normalize_or_zero(v) * max_len
    } else {
        *v
    }
}

/// Spherical interpolation between two directions.
///
/// Zero-length inputs fall back to the other direction. Nearly parallel or opposite inputs
/// fall back to a normalized lerp so the result is always defined.
pub fn slerp_directions(from: &Vec3, to: &Vec3, t: f32) -> Vec3 {
    let a = normalize_or_zero(from);
    let b = normalize_or_zero(to);
    if a == Vec3::zeros() {
        return b;
    }
    if b == Vec3::zeros() {
        return a;
    }

    let cos = a.dot(&b).clamp(-1.0, 1.0);
    let angle = cos.acos();
    let sin = angle.sin();
    if sin.abs() <= 1.0e-5 {
        let lerped = normalize_or_zero(&a.lerp(&b, t));
        return if lerped == Vec3::zeros() { a } else { lerped };
    }
    a * (((1.0 - t) * angle).sin() / sin) + b * ((t * angle).sin() / sin)
}

/// Rotation about +Y that takes `from` towards `to`, ignoring pitch and roll (radians).
pub fn yaw_delta(from: &Quat, to: &Quat) -> f32 {
    let diff = to * from.inverse();
    let forward = diff * Vec3::z();
    if forward.x.abs() <= f32::EPSILON && forward.z.abs() <= f32::EPSILON {
        return 0.0;
    }
    forward.x.atan2(forward.z)
}

/// Yaw-only rotation about +Y.
#[inline]
pub fn yaw_rotation(yaw: f32) -> Quat {
    na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), yaw)
}
