/*!
The character motor: one tick of locomotion, end to end.

Per tick the motor
1. samples the attached platform and counts the landing correction down,
2. plans the horizontal velocity from the intent,
3. integrates gravity and starts jumps,
4. carries the character along with its platform,
5. asks the mover to apply `velocity * dt` (pushed down while grounded),
6. reads the ground back from the contacts,
7. rebuilds the velocity from what actually moved and handles landing and falling,
8. records where the character stands on its platform for the next tick.
*/

use log::{debug, trace, warn};

use crate::{
    Vec3,
    bitmask_flags::{CollisionFlag, CollisionFlags},
    config::{MotorConfig, TransferMode, non_negative},
    constants::VERTICAL_UNDERSHOOT_EPS,
    error::MotorError,
    events::{MotorEvent, TickReport},
    ground::{GroundSensor, is_too_steep},
    jump::{JumpInput, JumpState, jump_vertical_speed},
    mover::CollisionMover,
    planner::{self, PlanInput},
    platform::{PlatformTracker, Sample},
    utils::{horizontal, up, yaw_rotation},
};

/// What the character wants to do this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveIntent {
    /// World-space movement direction. Length up to 1 scales the speed.
    pub direction: Vec3,
    /// Jump button state.
    pub jump: bool,
}

impl MoveIntent {
    pub fn walk(direction: Vec3) -> Self {
        Self {
            direction,
            jump: false,
        }
    }

    pub fn with_jump(mut self, jump: bool) -> Self {
        self.jump = jump;
        self
    }
}

pub struct MotorBuilder<M> {
    config: MotorConfig,
    mover: Option<M>,
    controllable: bool,
}

impl<M> Default for MotorBuilder<M> {
    fn default() -> Self {
        Self {
            config: MotorConfig::default(),
            mover: None,
            controllable: true,
        }
    }
}

impl<M: CollisionMover> MotorBuilder<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: MotorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mover(mut self, mover: M) -> Self {
        self.mover = Some(mover);
        self
    }

    pub fn controllable(mut self, controllable: bool) -> Self {
        self.controllable = controllable;
        self
    }

    /// Validate the configuration and the mover and build the motor.
    pub fn build(self) -> Result<CharacterMotor<M>, MotorError> {
        let mover = self.mover.ok_or(MotorError::MissingMover)?;
        self.config.validate()?;
        mover.validate()?;

        debug!("character motor built at {:?}", mover.position());
        Ok(CharacterMotor {
            mover,
            config: self.config,
            controllable: self.controllable,
            velocity: Vec3::zeros(),
            frame_velocity: Vec3::zeros(),
            grounded: true,
            collision_flags: CollisionFlags::default(),
            direction: Vec3::zeros(),
            ground: GroundSensor::new(),
            jump: JumpState::new(),
            platform: PlatformTracker::new(),
            clock: 0.0,
            external_velocity: false,
        })
    }
}

/// Drives one character through its mover.
///
/// The motor starts grounded with zero velocity and no ground normal. If there is nothing under
/// it, the first tick reports a fall.
pub struct CharacterMotor<M: CollisionMover> {
    mover: M,
    config: MotorConfig,
    controllable: bool,
    velocity: Vec3,
    /// Platform velocity handed to the character at the last jump or fall.
    frame_velocity: Vec3,
    grounded: bool,
    collision_flags: CollisionFlags,
    direction: Vec3,
    ground: GroundSensor<M::BodyId>,
    jump: JumpState,
    platform: PlatformTracker<M::BodyId>,
    /// Simulation time in seconds, advanced at the end of every tick.
    clock: f64,
    /// `set_velocity` was called since the last tick.
    external_velocity: bool,
}

impl<M: CollisionMover> CharacterMotor<M> {
    pub fn new(mover: M, config: MotorConfig) -> Result<Self, MotorError> {
        MotorBuilder::new().mover(mover).config(config).build()
    }

    pub fn builder() -> MotorBuilder<M> {
        MotorBuilder::new()
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// A non-positive or non-finite `dt` does nothing.
    pub fn tick(&mut self, dt: f32, intent: &MoveIntent) -> TickReport<M::BodyId> {
        let mut report = TickReport::default();
        if !(dt.is_finite() && dt > 0.0) {
            trace!("skipping tick with dt={dt}");
            return report;
        }
        if std::mem::take(&mut self.external_velocity) {
            report.push(MotorEvent::ExternalVelocity);
        }

        self.mover.begin_tick(dt);
        let now = self.clock;
        self.direction = if self.controllable {
            intent.direction
        } else {
            Vec3::zeros()
        };

        self.update_platform(dt, &mut report);

        let mut velocity = self.plan(dt);
        velocity = self.apply_gravity_and_jumping(now, dt, intent.jump, velocity, &mut report);

        if self.moves_with_platform() {
            self.follow_platform(&mut report);
        }

        let start = self.mover.position();
        let mut displacement = velocity * dt;
        let push_down = self
            .mover
            .profile()
            .step_height
            .max(horizontal(&displacement).norm());
        if self.grounded {
            displacement -= up() * push_down;
        }

        let outcome = self.mover.move_by(displacement);
        self.collision_flags = outcome.flags;

        let ground = self.ground.interpret(&outcome.contacts);
        if ground.is_some() {
            self.frame_velocity = Vec3::zeros();
        }
        if self.config.platform.enabled {
            let mover = &self.mover;
            let hit = ground.and_then(|g| g.body);
            if self.platform.attach_if_changed(hit, |body| mover.body_pose(body)) {
                if let Some(body) = hit {
                    report.push(MotorEvent::PlatformAttached { body });
                }
            }
        }

        self.velocity = self.realized_velocity(start, &velocity, dt);
        self.update_grounding(push_down, &mut report);

        if self.moves_with_platform() {
            self.record_platform_anchor(&mut report);
        }

        self.sanitize_velocity();
        self.clock += f64::from(dt);
        report
    }

    fn update_platform(&mut self, dt: f32, report: &mut TickReport<M::BodyId>) {
        let mover = &self.mover;
        let enabled = self.config.platform.enabled;
        let sample = self.platform.sample_velocity(enabled, dt, |b| mover.body_pose(b));
        if let Sample::Vanished(_) = sample {
            report.push(MotorEvent::PlatformDetached);
        }

        if let Some(platform_velocity) = self.platform.advance_correction(self.grounded) {
            debug!("landing correction removed platform velocity {platform_velocity:?}");
            self.velocity -= platform_velocity;
            report.push(MotorEvent::PlatformVelocityRemoved {
                velocity: platform_velocity,
            });
        }
    }

    fn plan(&self, dt: f32) -> Vec3 {
        planner::plan_velocity(
            &self.config,
            &PlanInput {
                velocity: self.velocity,
                direction: self.direction,
                rotation: self.mover.rotation(),
                grounded: self.grounded,
                ground_normal: self.ground.ground_normal(),
                too_steep: self.too_steep(),
                frame_velocity: self.frame_velocity,
                controllable: self.controllable,
                dt,
            },
        )
    }

    fn apply_gravity_and_jumping(
        &mut self,
        now: f64,
        dt: f32,
        jump_pressed: bool,
        velocity: Vec3,
        report: &mut TickReport<M::BodyId>,
    ) -> Vec3 {
        let input = JumpInput {
            now,
            dt,
            grounded: self.grounded,
            controllable: self.controllable,
            jump_pressed,
            too_steep: self.too_steep(),
            ground_normal: self.ground.ground_normal(),
            previous_vertical_velocity: self.velocity.y,
            gravity: self.config.movement.gravity,
            max_fall_speed: self.config.movement.max_fall_speed,
        };
        let (mut velocity, start) = self.jump.apply(&self.config.jumping, &input, velocity);

        if let Some(start) = start {
            self.grounded = false;
            self.platform.cancel_correction();
            if self.config.platform.transfers_inertia() {
                self.frame_velocity = self.platform.velocity();
                velocity += self.frame_velocity;
            }
            report.push(MotorEvent::Jumped {
                direction: start.direction,
                vertical_speed: start.vertical_speed,
            });
        }
        velocity
    }

    fn moves_with_platform(&self) -> bool {
        self.config.platform.enabled
            && (self.grounded || self.config.platform.transfer == TransferMode::PermaLocked)
            && self.platform.active().is_some()
    }

    /// Move and turn the character with its platform before it moves by itself.
    fn follow_platform(&mut self, report: &mut TickReport<M::BodyId>) {
        let Some(body) = self.platform.active() else {
            return;
        };
        let Some(pose) = self.mover.body_pose(body) else {
            self.detach_platform(report);
            return;
        };
        let Some(carry) = self.platform.carry(&pose) else {
            return;
        };

        if carry.displacement != Vec3::zeros() {
            // Contacts of this move say nothing about the ground under the character.
            self.mover.move_by(carry.displacement);
        }
        if carry.yaw != 0.0 {
            let rotation = self.mover.rotation() * yaw_rotation(carry.yaw);
            self.mover.set_rotation(rotation);
        }
    }

    fn record_platform_anchor(&mut self, report: &mut TickReport<M::BodyId>) {
        let Some(body) = self.platform.active() else {
            return;
        };
        let Some(pose) = self.mover.body_pose(body) else {
            self.detach_platform(report);
            return;
        };
        let foot = self.mover.position() + up() * self.mover.profile().foot_offset;
        self.platform.record_anchor(&pose, foot, self.mover.rotation());
    }

    fn detach_platform(&mut self, report: &mut TickReport<M::BodyId>) {
        debug!("platform vanished, detaching");
        self.platform.detach();
        report.push(MotorEvent::PlatformDetached);
    }

    /// Velocity from the distance actually travelled, stripped of sideways motion that only
    /// came from collision response.
    fn realized_velocity(&mut self, start: Vec3, planned: &Vec3, dt: f32) -> Vec3 {
        let raw = (self.mover.position() - start) / dt;
        let planned_horizontal = horizontal(planned);

        let mut velocity = if planned_horizontal == Vec3::zeros() {
            Vec3::new(0.0, raw.y, 0.0)
        } else {
            let projected = horizontal(&raw).dot(&planned_horizontal)
                / planned_horizontal.norm_squared();
            planned_horizontal * projected.clamp(0.0, 1.0) + up() * raw.y
        };

        if velocity.y < planned.y - VERTICAL_UNDERSHOOT_EPS {
            if velocity.y < 0.0 {
                // Pushed down faster than planned; ignore it.
                velocity.y = planned.y;
            } else {
                trace!("upward motion blocked, ending jump extension");
                self.jump.release_button();
            }
        }
        velocity
    }

    fn update_grounding(&mut self, push_down: f32, report: &mut TickReport<M::BodyId>) {
        let has_ground = self.ground.has_ground();

        if self.grounded && !has_ground {
            self.grounded = false;
            self.platform.cancel_correction();
            if self.config.platform.transfers_inertia() {
                self.frame_velocity = self.platform.velocity();
                self.velocity += self.frame_velocity;
            }
            // Nothing was under the character; take back the push towards the ground.
            let position = self.mover.position() + up() * push_down;
            self.mover.set_position(position);
            debug!("fell at {position:?}");
            report.push(MotorEvent::Fell);
        } else if !self.grounded && has_ground {
            self.grounded = true;
            self.jump.land();
            if self.config.platform.transfers_inertia() {
                self.platform.schedule_landing_correction();
            }
            debug!(
                "landed at {:?} on normal {:?}",
                self.mover.position(),
                self.ground.ground_normal()
            );
            report.push(MotorEvent::Landed);
        }

        if !self.grounded {
            let max_fall_speed = self.config.movement.max_fall_speed;
            self.velocity.y = self.velocity.y.max(-max_fall_speed);
        }
    }

    fn sanitize_velocity(&mut self) {
        if self.velocity.iter().any(|v| !v.is_finite()) {
            warn!("non-finite velocity {:?}, resetting to zero", self.velocity);
            self.velocity = Vec3::zeros();
        }
        if self.frame_velocity.iter().any(|v| !v.is_finite()) {
            warn!("non-finite platform velocity {:?}, resetting to zero", self.frame_velocity);
            self.frame_velocity = Vec3::zeros();
        }
    }

    pub fn set_controllable(&mut self, controllable: bool) {
        self.controllable = controllable;
    }

    pub fn is_controllable(&self) -> bool {
        self.controllable
    }

    /// Force a velocity, e.g. from an explosion. The character becomes airborne.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.grounded = false;
        self.velocity = velocity;
        self.frame_velocity = Vec3::zeros();
        self.platform.cancel_correction();
        self.external_velocity = true;
        debug!("external velocity {velocity:?}");
    }

    /// Change gravity (m/s²). Negative or non-finite values are rejected.
    pub fn set_gravity(&mut self, gravity: f32) -> Result<(), MotorError> {
        non_negative("movement.gravity", gravity)?;
        self.config.movement.gravity = gravity;
        Ok(())
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_jumping(&self) -> bool {
        self.jump.is_jumping()
    }

    pub fn is_sliding(&self) -> bool {
        self.grounded && self.config.sliding.enabled && self.too_steep()
    }

    pub fn is_touching_ceiling(&self) -> bool {
        self.collision_flags.has(CollisionFlag::Above)
    }

    /// Is the current ground steeper than the mover's slope limit?
    pub fn too_steep(&self) -> bool {
        is_too_steep(
            &self.ground.ground_normal(),
            self.mover.profile().slope_limit_degrees,
        )
    }

    /// Movement direction of the last tick; zero while the character is not controllable.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Top speed for a direction in the character's local frame (+Z forward).
    pub fn max_speed_in_direction(&self, direction: &Vec3) -> f32 {
        planner::max_speed_in_direction(&self.config.movement, direction)
    }

    /// Take-off speed needed to reach `height` under the current gravity.
    pub fn calculate_jump_vertical_speed(&self, height: f32) -> f32 {
        jump_vertical_speed(height, self.config.movement.gravity)
    }

    pub fn max_acceleration(&self, grounded: bool) -> f32 {
        if grounded {
            self.config.movement.max_ground_acceleration
        } else {
            self.config.movement.max_air_acceleration
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn ground_normal(&self) -> Vec3 {
        self.ground.ground_normal()
    }

    pub fn collision_flags(&self) -> CollisionFlags {
        self.collision_flags
    }

    pub fn platform_velocity(&self) -> Vec3 {
        self.platform.velocity()
    }

    pub fn attached_platform(&self) -> Option<M::BodyId> {
        self.platform.active()
    }

    /// Platform velocity carried since the last jump or fall.
    pub fn frame_velocity(&self) -> Vec3 {
        self.frame_velocity
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    pub fn mover(&self) -> &M {
        &self.mover
    }

    /// The host moves platforms and other bodies through this.
    pub fn mover_mut(&mut self) -> &mut M {
        &mut self.mover
    }

    pub fn position(&self) -> Vec3 {
        self.mover.position()
    }
}
