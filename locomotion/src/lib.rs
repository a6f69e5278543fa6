pub mod bitmask_flags;
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod events;
pub mod ground;
pub mod jump;
pub mod motor;
pub mod mover;
pub mod planner;
pub mod platform;
pub mod rapier_mover;
pub mod rapier_world;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export Rapier so hosts can build worlds and name collider handles
// without depending on `rapier3d` directly.
pub use rapier3d;

pub use bitmask_flags::{CollisionFlag, CollisionFlags};
pub use config::{
    JumpConfig, MotorConfig, MovementConfig, PlatformConfig, SlideConfig, TransferMode,
};
pub use curve::{CurveKey, SlopeSpeedCurve};
pub use error::{ConfigError, MotorError};
pub use events::{MotorEvent, TickReport};
pub use motor::{CharacterMotor, MotorBuilder, MoveIntent};
pub use mover::CollisionMover;
pub use rapier_mover::{ControllerSettings, RapierMover};
pub use rapier_world::{ColliderShapeDef, PlatformWorld, WorldColliderDef};
pub use types::{Contact, Iso, MoveOutcome, MoverProfile, Quat, Vec3};
