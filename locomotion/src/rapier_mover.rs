use log::trace;
use rapier3d::{
    control::{CharacterAutostep, CharacterLength, KinematicCharacterController},
    prelude::{Capsule, ColliderHandle, QueryFilter},
};
use serde::{Deserialize, Serialize};

use crate::{
    Iso, Quat, Vec3,
    bitmask_flags::CollisionFlags,
    error::MotorError,
    mover::{CollisionMover, validate_profile},
    rapier_world::PlatformWorld,
    types::{Contact, MoveOutcome, MoverProfile},
};

/// Character controller settings.
///
/// Values are expressed in meters and degrees (converted to radians at runtime). Autostep is
/// always enabled and doubles as the step height the motor pushes down by.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Radius of the character capsule.
    pub capsule_radius: f32,
    /// Half the length of the capsule's cylindrical part.
    pub capsule_half_height: f32,
    /// Small gap preserved between the character and its surroundings (meters).
    /// Keep `offset` small but non-zero for numerical stability
    pub offset: f32,
    /// Maximum climbable slope angle (degrees). Steeper ground makes the motor slide.
    pub max_slope_climb_deg: f32,
    /// Minimum slope angle (degrees) before the controller slides on its own.
    pub min_slope_slide_deg: f32,
    /// Autostep maximum height (meters).
    pub autostep_max_height: f32,
    /// Autostep minimum width (meters).
    pub autostep_min_width: f32,
    /// Whether the controller should slide against obstacles.
    pub slide: bool,
    /// Increase if the character gets stuck when sliding (small, meters).
    pub normal_nudge_factor: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            capsule_radius: 0.35,
            capsule_half_height: 0.75,
            offset: 0.01,
            max_slope_climb_deg: 45.0,
            min_slope_slide_deg: 45.0,
            autostep_max_height: 0.3,
            autostep_min_width: 0.2,
            slide: true,
            normal_nudge_factor: 1.0e-4,
        }
    }
}

impl ControllerSettings {
    fn controller(&self) -> KinematicCharacterController {
        KinematicCharacterController {
            offset: CharacterLength::Absolute(self.offset),
            max_slope_climb_angle: self.max_slope_climb_deg.to_radians(),
            min_slope_slide_angle: self.min_slope_slide_deg.to_radians(),
            // The motor pushes the character down itself while grounded.
            snap_to_ground: None,
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.autostep_max_height),
                min_width: CharacterLength::Absolute(self.autostep_min_width),
                include_dynamic_bodies: false,
            }),
            slide: self.slide,
            normal_nudge_factor: self.normal_nudge_factor,
            ..KinematicCharacterController::default()
        }
    }
}

/// [`CollisionMover`] backed by Rapier's kinematic character controller.
///
/// The position is the capsule centre. Bodies are the world's colliders.
pub struct RapierMover {
    world: PlatformWorld,
    settings: ControllerSettings,
    controller: KinematicCharacterController,
    shape: Capsule,
    pose: Iso,
    dt: f32,
}

impl RapierMover {
    pub fn new(world: PlatformWorld, settings: ControllerSettings, position: Vec3) -> Self {
        Self {
            world,
            controller: settings.controller(),
            shape: Capsule::new_y(settings.capsule_half_height, settings.capsule_radius),
            settings,
            pose: Iso::translation(position.x, position.y, position.z),
            dt: 1.0 / 60.0,
        }
    }

    pub fn world(&self) -> &PlatformWorld {
        &self.world
    }

    /// Move platforms through this between ticks.
    pub fn world_mut(&mut self) -> &mut PlatformWorld {
        &mut self.world
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }
}

impl CollisionMover for RapierMover {
    type BodyId = ColliderHandle;

    fn move_by(&mut self, displacement: Vec3) -> MoveOutcome<ColliderHandle> {
        if displacement == Vec3::zeros() {
            return MoveOutcome::unobstructed(displacement);
        }

        let moving_downward = displacement.y < 0.0;
        let center = self.pose.translation.vector;
        let mut flags = CollisionFlags::default();
        let mut contacts = Vec::new();

        let pipeline = self.world.query_pipeline(QueryFilter::default());
        let movement = self.controller.move_shape(
            self.dt,
            &pipeline,
            &self.shape,
            &self.pose,
            displacement,
            |collision| {
                let point = collision.hit.witness1.coords;
                let mut normal = collision.hit.normal1.into_inner();
                // Normals point from the surface towards the character.
                if normal.dot(&(center - point)) < 0.0 {
                    normal = -normal;
                }
                flags = flags.union(CollisionFlags::from_contact_normal(&normal));
                contacts.push(Contact {
                    point,
                    normal,
                    moving_downward,
                    body: Some(collision.handle),
                });
            },
        );

        trace!(
            "moved {:?} of {:?}, {} contacts",
            movement.translation,
            displacement,
            contacts.len()
        );
        self.pose.translation.vector += movement.translation;
        MoveOutcome {
            actual_displacement: movement.translation,
            flags,
            contacts,
        }
    }

    fn begin_tick(&mut self, dt: f32) {
        self.dt = dt;
    }

    fn position(&self) -> Vec3 {
        self.pose.translation.vector
    }

    fn set_position(&mut self, position: Vec3) {
        self.pose.translation.vector = position;
    }

    fn rotation(&self) -> Quat {
        self.pose.rotation
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.pose.rotation = rotation;
    }

    fn body_pose(&self, body: ColliderHandle) -> Option<Iso> {
        self.world.body_pose(body)
    }

    fn profile(&self) -> MoverProfile {
        MoverProfile {
            step_height: self.settings.autostep_max_height,
            slope_limit_degrees: self.settings.max_slope_climb_deg,
            // Centre of the lower hemisphere.
            foot_offset: -self.settings.capsule_half_height,
        }
    }

    fn validate(&self) -> Result<(), MotorError> {
        let s = &self.settings;
        if !(s.capsule_radius.is_finite() && s.capsule_radius > 0.0) {
            return Err(MotorError::InvalidMover(format!(
                "capsule radius must be positive, got {}",
                s.capsule_radius
            )));
        }
        if !(s.capsule_half_height.is_finite() && s.capsule_half_height >= 0.0) {
            return Err(MotorError::InvalidMover(format!(
                "capsule half height must not be negative, got {}",
                s.capsule_half_height
            )));
        }
        if !(s.offset.is_finite() && s.offset >= 0.0) {
            return Err(MotorError::InvalidMover(format!(
                "controller offset must not be negative, got {}",
                s.offset
            )));
        }
        validate_profile(&self.profile())
    }
}
