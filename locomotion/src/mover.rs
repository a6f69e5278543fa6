use std::fmt::Debug;

use crate::{
    Iso, Quat, Vec3,
    error::MotorError,
    types::{MoveOutcome, MoverProfile},
};

/// Collision-aware displacement of the character's collider.
///
/// The mover owns the collider pose. The motor asks it to move by a displacement and reads
/// back what actually happened; it never positions the collider through anything else except
/// undoing its own push-down offset and following platform yaw.
pub trait CollisionMover {
    /// Non-owning handle to a body in the mover's world.
    type BodyId: Copy + Eq + Debug;

    /// Try to displace the collider by `displacement` and report the result.
    fn move_by(&mut self, displacement: Vec3) -> MoveOutcome<Self::BodyId>;

    /// Called once at the start of every motor tick.
    fn begin_tick(&mut self, _dt: f32) {}

    /// Current collider position.
    fn position(&self) -> Vec3;

    /// Teleport the collider without collision checks.
    fn set_position(&mut self, position: Vec3);

    /// Current collider orientation.
    fn rotation(&self) -> Quat;

    fn set_rotation(&mut self, rotation: Quat);

    /// World pose of `body`, or `None` when the body no longer exists.
    fn body_pose(&self, body: Self::BodyId) -> Option<Iso>;

    fn profile(&self) -> MoverProfile;

    /// Check that the mover can simulate at all. Called once when the motor is built.
    fn validate(&self) -> Result<(), MotorError> {
        validate_profile(&self.profile())
    }
}

/// Reject collider profiles the motor cannot work with.
pub fn validate_profile(profile: &MoverProfile) -> Result<(), MotorError> {
    if !profile.step_height.is_finite() || profile.step_height < 0.0 {
        return Err(MotorError::InvalidMover(format!(
            "step height must be finite and non-negative, got {}",
            profile.step_height
        )));
    }
    if !(profile.slope_limit_degrees > 0.0 && profile.slope_limit_degrees <= 90.0) {
        return Err(MotorError::InvalidMover(format!(
            "slope limit must be within (0, 90] degrees, got {}",
            profile.slope_limit_degrees
        )));
    }
    if !profile.foot_offset.is_finite() {
        return Err(MotorError::InvalidMover(format!(
            "foot offset must be finite, got {}",
            profile.foot_offset
        )));
    }
    Ok(())
}
