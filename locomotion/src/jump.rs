use log::debug;

use crate::{
    Vec3,
    config::JumpConfig,
    constants::{JUMP_BUFFER_SECONDS, UNSET_TIME},
    utils::{slerp_directions, up},
};

/// Speed needed to reach `height` against `gravity`.
#[inline]
pub fn jump_vertical_speed(height: f32, gravity: f32) -> f32 {
    (2.0 * height * gravity).max(0.0).sqrt()
}

/// A jump that started this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpStart {
    pub direction: Vec3,
    pub vertical_speed: f32,
}

/// Per-tick inputs of the jump state machine.
#[derive(Clone, Copy, Debug)]
pub struct JumpInput {
    /// Simulation time at the start of the tick (seconds).
    pub now: f64,
    pub dt: f32,
    pub grounded: bool,
    pub controllable: bool,
    pub jump_pressed: bool,
    pub too_steep: bool,
    pub ground_normal: Vec3,
    /// Vertical velocity realized during the previous tick.
    pub previous_vertical_velocity: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JumpState {
    /// Between a jump start and the next landing.
    jumping: bool,
    /// Still holding the button that started the current jump.
    holding_button: bool,
    last_start_time: f64,
    last_button_down_time: f64,
    direction: Vec3,
}

impl Default for JumpState {
    fn default() -> Self {
        Self {
            jumping: false,
            holding_button: false,
            last_start_time: UNSET_TIME,
            last_button_down_time: UNSET_TIME,
            direction: up(),
        }
    }
}

impl JumpState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn is_holding_button(&self) -> bool {
        self.holding_button
    }

    /// Called on landing.
    pub fn land(&mut self) {
        self.jumping = false;
    }

    /// The extension window ends early, e.g. after hitting a ceiling.
    pub fn release_button(&mut self) {
        self.holding_button = false;
    }

    fn record_button(&mut self, input: &JumpInput) {
        if !input.jump_pressed || !input.controllable {
            self.holding_button = false;
            self.last_button_down_time = UNSET_TIME;
        }
        if input.jump_pressed && input.controllable && self.last_button_down_time < 0.0 {
            self.last_button_down_time = input.now;
        }
    }

    fn extension_active(&self, config: &JumpConfig, input: &JumpInput) -> bool {
        if !(self.jumping && self.holding_button) {
            return false;
        }
        let speed = jump_vertical_speed(config.base_height, input.gravity);
        speed > 0.0 && input.now < self.last_start_time + f64::from(config.extra_height / speed)
    }

    fn jump_buffered(&self, config: &JumpConfig, input: &JumpInput) -> bool {
        config.enabled
            && input.controllable
            && input.now - self.last_button_down_time < JUMP_BUFFER_SECONDS
    }

    /// Integrate gravity into `velocity` and start a jump when one is requested.
    ///
    /// Returns the new velocity and the jump that started, if any. Starting a jump makes the
    /// character airborne; the caller owns the grounded flag and any platform inertia.
    pub fn apply(
        &mut self,
        config: &JumpConfig,
        input: &JumpInput,
        mut velocity: Vec3,
    ) -> (Vec3, Option<JumpStart>) {
        self.record_button(input);

        if input.grounded {
            velocity.y = velocity.y.min(0.0) - input.gravity * input.dt;
        } else {
            velocity.y = input.previous_vertical_velocity - input.gravity * input.dt;
            if self.extension_active(config, input) {
                // Holding the button cancels gravity along the jump direction.
                velocity += self.direction * input.gravity * input.dt;
            }
            velocity.y = velocity.y.max(-input.max_fall_speed);
        }

        if !input.grounded {
            return (velocity, None);
        }

        if !self.jump_buffered(config, input) {
            self.holding_button = false;
            return (velocity, None);
        }

        self.jumping = true;
        self.holding_button = true;
        self.last_start_time = input.now;
        self.last_button_down_time = UNSET_TIME;

        let perp_amount = if input.too_steep {
            config.steep_perp_amount
        } else {
            config.perp_amount
        };
        self.direction = slerp_directions(&up(), &input.ground_normal, perp_amount);

        let vertical_speed = jump_vertical_speed(config.base_height, input.gravity);
        velocity.y = 0.0;
        velocity += self.direction * vertical_speed;

        debug!(
            "jump started at t={:.3}: direction={:?}, vertical speed={:.3}",
            input.now, self.direction, vertical_speed
        );
        (
            velocity,
            Some(JumpStart {
                direction: self.direction,
                vertical_speed,
            }),
        )
    }
}
