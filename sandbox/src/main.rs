//! Headless locomotion sandbox.
//!
//! Builds a small Rapier world (a floor, a low step and a platform sliding back and forth),
//! then drives one character through a scripted sequence of intents at a fixed timestep
//! and logs what happens. Run with `RUST_LOG=debug` to also see the motor's transitions.

use locomotion::{
    CharacterMotor, ColliderShapeDef, ControllerSettings, MotorConfig, MotorEvent, MoveIntent,
    PlatformWorld, RapierMover, Vec3, WorldColliderDef,
};
use log::{error, info};

/// Fixed simulation rate.
const TICK_RATE: u32 = 60;
const DT: f32 = 1.0 / TICK_RATE as f32;
const DURATION_SECONDS: f32 = 12.0;
/// Log a state summary every this many ticks.
const SUMMARY_EVERY: u32 = 30;

const FLOOR_ID: u32 = 1;
const STEP_ID: u32 = 2;
const PLATFORM_ID: u32 = 3;

/// Platform oscillation along X.
const PLATFORM_CENTER: Vec3 = Vec3::new(6.0, 0.25, 0.0);
const PLATFORM_AMPLITUDE: f32 = 2.0;
const PLATFORM_PERIOD_SECONDS: f32 = 4.0;

fn world_defs() -> Vec<WorldColliderDef> {
    vec![
        WorldColliderDef::new(
            FLOOR_ID,
            Vec3::zeros(),
            ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        ),
        WorldColliderDef::new(
            STEP_ID,
            Vec3::new(2.0, 0.1, 0.0),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(0.5, 0.1, 2.0),
            },
        ),
        WorldColliderDef::new(
            PLATFORM_ID,
            PLATFORM_CENTER,
            ColliderShapeDef::RoundCuboid {
                half_extents: Vec3::new(1.5, 0.2, 1.5),
                border_radius: 0.05,
            },
        ),
    ]
}

fn platform_position(time: f32) -> Vec3 {
    let phase = time / PLATFORM_PERIOD_SECONDS * std::f32::consts::TAU;
    PLATFORM_CENTER + Vec3::x() * (PLATFORM_AMPLITUDE * phase.sin())
}

/// Scripted intent: walk towards the platform, hop onto it, ride, then jump off.
fn intent_at(time: f32) -> MoveIntent {
    let towards_platform = Vec3::x();
    match time {
        t if t < 1.0 => MoveIntent::default(),
        t if t < 3.0 => MoveIntent::walk(towards_platform),
        t if t < 3.3 => MoveIntent::walk(towards_platform).with_jump(true),
        t if t < 4.0 => MoveIntent::walk(towards_platform * 0.5),
        t if t < 8.0 => MoveIntent::default(),
        t if t < 8.2 => MoveIntent::walk(Vec3::z()).with_jump(true),
        t if t < 9.0 => MoveIntent::walk(Vec3::z()),
        _ => MoveIntent::default(),
    }
}

fn main() {
    env_logger::init();

    let world = PlatformWorld::build(world_defs(), DT);
    let Some(platform) = world.handle(PLATFORM_ID) else {
        error!("platform collider {PLATFORM_ID} missing from the world");
        return;
    };

    let settings = ControllerSettings::default();
    let mover = RapierMover::new(world, settings, Vec3::new(0.0, 2.0, 0.0));
    let mut motor = match CharacterMotor::new(mover, MotorConfig::default()) {
        Ok(motor) => motor,
        Err(err) => {
            error!("could not build the character motor: {err}");
            return;
        }
    };

    let ticks = (DURATION_SECONDS * TICK_RATE as f32) as u32;
    for tick in 0..ticks {
        let time = tick as f32 * DT;

        let platform_offset = platform_position(time + DT) - platform_position(time);
        motor
            .mover_mut()
            .world_mut()
            .translate_body(platform, platform_offset);

        let report = motor.tick(DT, &intent_at(time));
        for event in report.iter() {
            match event {
                MotorEvent::PlatformAttached { body } if *body == platform => {
                    info!("[{time:6.2}s] stepped onto the moving platform")
                }
                other => info!("[{time:6.2}s] {other:?}"),
            }
        }

        if tick % SUMMARY_EVERY == 0 {
            let p = motor.position();
            let v = motor.velocity();
            info!(
                "[{time:6.2}s] pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2})",
                p.x,
                p.y,
                p.z,
                v.x,
                v.y,
                v.z,
            );
            info!(
                "[{time:6.2}s] grounded={} jumping={} sliding={} platform_vel={:.2}",
                motor.is_grounded(),
                motor.is_jumping(),
                motor.is_sliding(),
                motor.platform_velocity().norm(),
            );
        }
    }

    let p = motor.position();
    info!("finished after {ticks} ticks at ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
}
