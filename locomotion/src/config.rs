/*!
Motor configuration.

Everything here is supplied once when the motor is built and validated up front. Values are
in meters, seconds and degrees. Defaults match a brisk third-person character: 10 m/s in every
direction, 10 m/s² gravity and a 1 m jump that can be extended by 2 m while the button is held.
*/

use serde::{Deserialize, Serialize};

use crate::{curve::SlopeSpeedCurve, error::ConfigError};

/// Horizontal speed limits, acceleration and gravity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Maximum speed moving forward (m/s).
    pub max_forward_speed: f32,
    /// Maximum speed strafing (m/s).
    pub max_sideways_speed: f32,
    /// Maximum speed backing up (m/s).
    pub max_backwards_speed: f32,
    /// Speed multiplier over the slope angle of the current motion (negative = downhill).
    pub slope_speed_curve: SlopeSpeedCurve,
    /// How fast the velocity may change while grounded (m/s²).
    pub max_ground_acceleration: f32,
    /// How fast the velocity may change while airborne (m/s²).
    pub max_air_acceleration: f32,
    /// Downward acceleration (m/s²).
    pub gravity: f32,
    /// Terminal fall speed (m/s).
    pub max_fall_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_forward_speed: 10.0,
            max_sideways_speed: 10.0,
            max_backwards_speed: 10.0,
            slope_speed_curve: SlopeSpeedCurve::default(),
            max_ground_acceleration: 30.0,
            max_air_acceleration: 20.0,
            gravity: 10.0,
            max_fall_speed: 20.0,
        }
    }
}

impl MovementConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("movement.max_forward_speed", self.max_forward_speed)?;
        positive("movement.max_sideways_speed", self.max_sideways_speed)?;
        positive("movement.max_backwards_speed", self.max_backwards_speed)?;
        non_negative("movement.max_ground_acceleration", self.max_ground_acceleration)?;
        non_negative("movement.max_air_acceleration", self.max_air_acceleration)?;
        non_negative("movement.gravity", self.gravity)?;
        non_negative("movement.max_fall_speed", self.max_fall_speed)?;
        self.slope_speed_curve.validate()
    }
}

/// Jump tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Can the character jump?
    pub enabled: bool,
    /// Apex height when the button is released immediately (meters).
    pub base_height: f32,
    /// Extra height gained by holding the button (meters).
    pub extra_height: f32,
    /// How far jumps lean towards the normal of walkable ground. 0 = straight up.
    pub perp_amount: f32,
    /// How far jumps lean towards the normal of too-steep ground. 0 = straight up.
    pub steep_perp_amount: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_height: 1.0,
            extra_height: 2.0,
            perp_amount: 0.0,
            steep_perp_amount: 0.5,
        }
    }
}

impl JumpConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("jumping.base_height", self.base_height)?;
        non_negative("jumping.extra_height", self.extra_height)?;
        unit("jumping.perp_amount", self.perp_amount)?;
        unit("jumping.steep_perp_amount", self.steep_perp_amount)
    }
}

/// How the velocity of the platform under the character carries over into jumps and falls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferMode {
    /// Jumps ignore the platform's motion.
    None,
    /// Jumps start with the platform's velocity, then air control takes over.
    InitTransfer,
    /// Jumps start with the platform's velocity and keep it until landing.
    #[default]
    PermaTransfer,
    /// The character keeps moving with the last platform it touched, even in the air.
    PermaLocked,
}

impl TransferMode {
    /// Does the platform velocity carry over when the character leaves it?
    pub fn transfers_inertia(self) -> bool {
        matches!(self, Self::InitTransfer | Self::PermaTransfer)
    }
}

/// Moving platform support.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub enabled: bool,
    pub transfer: TransferMode,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transfer: TransferMode::PermaTransfer,
        }
    }
}

impl PlatformConfig {
    /// Inertia is exchanged with the platform on jump, fall and landing.
    pub fn transfers_inertia(&self) -> bool {
        self.enabled && self.transfer.transfers_inertia()
    }
}

/// Sliding down surfaces steeper than the slope limit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    /// Does the character report sliding on too steep surfaces?
    pub enabled: bool,
    /// Speed when sliding (m/s).
    pub sliding_speed: f32,
    /// 0.5 lets the player slide sideways at half the downhill sliding speed.
    pub sideways_control: f32,
    /// 0.5 lets the player speed the slide up to 150% or slow it down to 50%.
    pub speed_control: f32,
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sliding_speed: 15.0,
            sideways_control: 1.0,
            speed_control: 0.4,
        }
    }
}

impl SlideConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("sliding.sliding_speed", self.sliding_speed)?;
        unit("sliding.sideways_control", self.sideways_control)?;
        unit("sliding.speed_control", self.speed_control)
    }
}

/// Complete motor configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub movement: MovementConfig,
    pub jumping: JumpConfig,
    pub platform: PlatformConfig,
    pub sliding: SlideConfig,
}

impl MotorConfig {
    /// Check every range constraint. Called once when a motor is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.movement.validate()?;
        self.jumping.validate()?;
        self.sliding.validate()
    }
}

fn finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if finite(field, value)? > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if finite(field, value)? >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&finite(field, value)?) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}
