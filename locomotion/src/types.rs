/*!
Core data types and math aliases shared by the motor submodules.

This module intentionally contains no algorithms. It defines the data exchanged between
the motor and a collision mover:
- contacts reported while a displacement is resolved
- the outcome of one displacement request
- the collider profile the motor needs for slope and step decisions
*/

use nalgebra as na;

use crate::bitmask_flags::CollisionFlags;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A single contact observed while the mover resolved a displacement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact<B> {
    /// World-space contact point on the touched surface.
    pub point: Vec3,
    /// World-space surface normal, pointing from the surface towards the character.
    pub normal: Vec3,
    /// Was the displacement that produced this contact heading down?
    pub moving_downward: bool,
    /// Body that owns the touched surface, if it has one.
    pub body: Option<B>,
}

/// What actually happened when the mover tried to apply a displacement.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveOutcome<B> {
    /// Translation that was applied to the collider.
    pub actual_displacement: Vec3,
    /// Regions of the collider that touched something.
    pub flags: CollisionFlags,
    /// Contacts in the order they were found.
    pub contacts: Vec<Contact<B>>,
}

impl<B> MoveOutcome<B> {
    /// Outcome of a displacement that touched nothing.
    pub fn unobstructed(displacement: Vec3) -> Self {
        Self {
            actual_displacement: displacement,
            flags: CollisionFlags::default(),
            contacts: Vec::new(),
        }
    }
}

/// Collider properties the motor reads from its mover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoverProfile {
    /// Largest ledge the mover climbs automatically (meters).
    pub step_height: f32,
    /// Ground steeper than this is unwalkable (degrees).
    pub slope_limit_degrees: f32,
    /// Offset along +Y from the collider origin to the centre of its lower hemisphere (meters).
    ///
    /// This is the reference point used to follow moving platforms; it works best when the
    /// character stands on tilting platforms.
    pub foot_offset: f32,
}
