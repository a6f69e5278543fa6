//! Deterministic mover for motor tests: an infinite floor plane, an optional ceiling and a
//! table of body poses the test moves by hand.

use std::collections::HashMap;

use crate::{
    Iso, Quat, Vec3,
    bitmask_flags::{CollisionFlag, CollisionFlags},
    mover::CollisionMover,
    types::{Contact, MoveOutcome, MoverProfile},
    utils::yaw_rotation,
};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Floor {
    pub height: f32,
    pub normal: Vec3,
    pub body: u32,
}

impl Floor {
    pub fn flat(height: f32, body: u32) -> Self {
        Self {
            height,
            normal: Vec3::y(),
            body,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ScriptedMover {
    pub position: Vec3,
    pub rotation: Quat,
    pub floor: Option<Floor>,
    pub ceiling: Option<f32>,
    pub bodies: HashMap<u32, Iso>,
    pub profile: MoverProfile,
}

impl ScriptedMover {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::identity(),
            floor: None,
            ceiling: None,
            bodies: HashMap::new(),
            profile: MoverProfile {
                step_height: 0.3,
                slope_limit_degrees: 45.0,
                foot_offset: 0.5,
            },
        }
    }

    /// Place a floor owned by `body`, which starts at the world origin.
    pub fn with_floor(mut self, floor: Floor) -> Self {
        self.bodies.insert(floor.body, Iso::identity());
        self.floor = Some(floor);
        self
    }

    pub fn with_ceiling(mut self, height: f32) -> Self {
        self.ceiling = Some(height);
        self
    }

    /// Translate a body by `offset`.
    pub fn shift_body(&mut self, body: u32, offset: Vec3) {
        if let Some(pose) = self.bodies.get_mut(&body) {
            pose.translation.vector += offset;
        }
    }

    /// Turn a body about the vertical axis through its origin.
    pub fn turn_body(&mut self, body: u32, yaw: f32) {
        if let Some(pose) = self.bodies.get_mut(&body) {
            pose.rotation = yaw_rotation(yaw) * pose.rotation;
        }
    }
}

impl CollisionMover for ScriptedMover {
    type BodyId = u32;

    fn move_by(&mut self, displacement: Vec3) -> MoveOutcome<u32> {
        let mut target = self.position + displacement;
        let mut flags = CollisionFlags::default();
        let mut contacts = Vec::new();

        if let Some(floor) = self.floor.filter(|f| target.y < f.height) {
            target.y = floor.height;
            flags.add(CollisionFlag::Below);
            contacts.push(Contact {
                point: Vec3::new(target.x, floor.height, target.z),
                normal: floor.normal,
                moving_downward: displacement.y < 0.0,
                body: Some(floor.body),
            });
        }
        if let Some(ceiling) = self.ceiling.filter(|&c| target.y > c) {
            target.y = ceiling;
            flags.add(CollisionFlag::Above);
            contacts.push(Contact {
                point: Vec3::new(target.x, ceiling, target.z),
                normal: -Vec3::y(),
                moving_downward: false,
                body: None,
            });
        }

        let actual_displacement = target - self.position;
        self.position = target;
        MoveOutcome {
            actual_displacement,
            flags,
            contacts,
        }
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    fn body_pose(&self, body: u32) -> Option<Iso> {
        self.bodies.get(&body).copied()
    }

    fn profile(&self) -> MoverProfile {
        self.profile
    }
}
