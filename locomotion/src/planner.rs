use crate::{
    Quat, Vec3,
    config::{MotorConfig, MovementConfig, TransferMode},
    utils::{clamp_length, horizontal, normalize_or_zero, project, up},
};

/// Everything the planner reads for one tick.
#[derive(Clone, Copy, Debug)]
pub struct PlanInput {
    /// Velocity carried over from the previous tick.
    pub velocity: Vec3,
    /// Desired world-space movement direction; its length acts as a throttle.
    pub direction: Vec3,
    /// Character orientation, used to tell forward from sideways and backwards.
    pub rotation: Quat,
    pub grounded: bool,
    pub ground_normal: Vec3,
    pub too_steep: bool,
    /// Platform velocity injected at the last jump or fall.
    pub frame_velocity: Vec3,
    pub controllable: bool,
    pub dt: f32,
}

/// Project a local-space direction onto elliptical quarter segments spanned by the
/// forward, sideways and backwards speeds and return the resulting speed.
///
/// The zero vector (and any purely vertical direction) has a speed of zero.
pub fn max_speed_in_direction(movement: &MovementConfig, local_direction: &Vec3) -> f32 {
    if *local_direction == Vec3::zeros() {
        return 0.0;
    }
    let z_speed = if local_direction.z > 0.0 {
        movement.max_forward_speed
    } else {
        movement.max_backwards_speed
    };
    let z_ellipse = z_speed / movement.max_sideways_speed;
    let unit = normalize_or_zero(&Vec3::new(
        local_direction.x,
        0.0,
        local_direction.z / z_ellipse,
    ));
    Vec3::new(unit.x, 0.0, unit.z * z_ellipse).norm() * movement.max_sideways_speed
}

/// Turn a horizontal velocity into one running along the ground plane, keeping its speed.
pub fn adjust_to_ground_normal(velocity: &Vec3, ground_normal: &Vec3) -> Vec3 {
    let sideways = up().cross(velocity);
    normalize_or_zero(&sideways.cross(ground_normal)) * velocity.norm()
}

/// Ascent (positive) or descent (negative) angle of a velocity, in degrees.
fn slope_angle_degrees(velocity: &Vec3) -> f32 {
    normalize_or_zero(velocity)
        .y
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees()
}

fn desired_walk_velocity(movement: &MovementConfig, input: &PlanInput, direction: &Vec3) -> Vec3 {
    let local = input.rotation.inverse() * direction;
    let mut max_speed = max_speed_in_direction(movement, &local);
    if input.grounded {
        max_speed *= movement
            .slope_speed_curve
            .evaluate(slope_angle_degrees(&input.velocity));
    }
    input.rotation * (local * max_speed)
}

fn desired_slide_velocity(config: &MotorConfig, input: &PlanInput, direction: &Vec3) -> Vec3 {
    let sliding = &config.sliding;
    let slide_dir = normalize_or_zero(&horizontal(&input.ground_normal));
    let along = project(direction, &slide_dir);
    let across = direction - along;
    (slide_dir + along * sliding.speed_control + across * sliding.sideways_control)
        * sliding.sliding_speed
}

/// The velocity the character wants this tick, before the acceleration limit.
pub fn desired_velocity(config: &MotorConfig, input: &PlanInput) -> Vec3 {
    let direction = if input.controllable {
        input.direction
    } else {
        Vec3::zeros()
    };

    let mut desired = if input.grounded && input.too_steep {
        desired_slide_velocity(config, input, &direction)
    } else {
        desired_walk_velocity(&config.movement, input, &direction)
    };

    if config.platform.enabled && config.platform.transfer == TransferMode::PermaTransfer {
        desired += input.frame_velocity;
        desired.y = 0.0;
    }

    if input.grounded {
        desired = adjust_to_ground_normal(&desired, &input.ground_normal);
    }
    desired
}

/// Accelerate the carried-over velocity towards the desired velocity.
///
/// Airborne characters plan horizontally only; their vertical speed is integrated by the
/// jump state machine. Airborne characters without control keep their velocity (ballistic
/// flight), grounded ones still decelerate, which acts as friction.
pub fn plan_velocity(config: &MotorConfig, input: &PlanInput) -> Vec3 {
    let desired = desired_velocity(config, input);

    let mut velocity = input.velocity;
    if !input.grounded {
        velocity.y = 0.0;
    }

    let max_acceleration = if input.grounded {
        config.movement.max_ground_acceleration
    } else {
        config.movement.max_air_acceleration
    };
    let change = clamp_length(&(desired - velocity), max_acceleration * input.dt);
    if input.grounded || input.controllable {
        velocity += change;
    }

    if input.grounded {
        // The mover lifts the character uphill by itself; only push it down.
        velocity.y = velocity.y.min(0.0);
    }
    velocity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(forward: f32, sideways: f32, backwards: f32) -> MovementConfig {
        MovementConfig {
            max_forward_speed: forward,
            max_sideways_speed: sideways,
            max_backwards_speed: backwards,
            ..MovementConfig::default()
        }
    }

    fn walking(direction: Vec3) -> PlanInput {
        PlanInput {
            velocity: Vec3::zeros(),
            direction,
            rotation: Quat::identity(),
            grounded: true,
            ground_normal: Vec3::y(),
            too_steep: false,
            frame_velocity: Vec3::zeros(),
            controllable: true,
            dt: 0.02,
        }
    }

    #[test]
    fn ellipse_uses_axis_speeds() {
        let m = movement(8.0, 5.0, 3.0);

        assert_eq!(max_speed_in_direction(&m, &Vec3::zeros()), 0.0);
        assert!((max_speed_in_direction(&m, &Vec3::z()) - 8.0).abs() < 1.0e-5);
        assert!((max_speed_in_direction(&m, &-Vec3::z()) - 3.0).abs() < 1.0e-5);
        assert!((max_speed_in_direction(&m, &Vec3::x()) - 5.0).abs() < 1.0e-5);
        assert!((max_speed_in_direction(&m, &-Vec3::x()) - 5.0).abs() < 1.0e-5);

        let diagonal = max_speed_in_direction(&m, &Vec3::new(1.0, 0.0, 1.0));
        assert!(diagonal > 5.0 && diagonal < 8.0);
    }

    #[test]
    fn ellipse_speed_is_never_negative() {
        let m = movement(10.0, 4.0, 2.0);
        for i in 0..16 {
            let angle = i as f32 / 16.0 * std::f32::consts::TAU;
            let dir = Vec3::new(angle.cos(), 0.3 * (i as f32 - 8.0), angle.sin());
            assert!(max_speed_in_direction(&m, &dir) >= 0.0);
        }
        assert_eq!(max_speed_in_direction(&m, &Vec3::y()), 0.0);
    }

    #[test]
    fn zero_input_plans_zero_speed() {
        let config = MotorConfig::default();
        let desired = desired_velocity(&config, &walking(Vec3::zeros()));
        assert_eq!(desired, Vec3::zeros());
    }

    #[test]
    fn ground_acceleration_is_clamped() {
        let config = MotorConfig::default();
        let velocity = plan_velocity(&config, &walking(Vec3::z()));

        // 30 m/s² over 20 ms.
        assert!((velocity.norm() - 0.6).abs() < 1.0e-4);
        assert!(velocity.z > 0.0);
    }

    #[test]
    fn airborne_without_control_keeps_velocity() {
        let config = MotorConfig::default();
        let mut input = walking(Vec3::x());
        input.grounded = false;
        input.controllable = false;
        input.velocity = Vec3::new(0.0, -3.0, 4.0);

        let velocity = plan_velocity(&config, &input);
        assert_eq!(velocity, Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn grounded_velocity_follows_slope_but_never_rises() {
        let mut config = MotorConfig::default();
        config.movement.max_ground_acceleration = 1000.0;
        config.movement.slope_speed_curve = crate::curve::SlopeSpeedCurve::flat();
        let normal = Vec3::new(0.0, 0.8, 0.6);

        // Walking down the slope (+z descends for this normal).
        let mut input = walking(Vec3::z());
        input.ground_normal = normal;
        let down = plan_velocity(&config, &input);
        assert!(down.y < 0.0);
        assert!(down.dot(&normal).abs() < 1.0e-4);
        assert!((down.norm() - 10.0).abs() < 1.0e-3);

        // Walking up it is clamped to horizontal motion.
        input.direction = -Vec3::z();
        let uphill = plan_velocity(&config, &input);
        assert_eq!(uphill.y, 0.0);
    }

    #[test]
    fn steep_ground_slides_downhill() {
        let config = MotorConfig::default();
        let mut input = walking(Vec3::zeros());
        input.ground_normal = Vec3::new(0.9, 0.436, 0.0).normalize();
        input.too_steep = true;

        let desired = desired_velocity(&config, &input);
        assert!(desired.x > 0.0);
        assert!((desired.norm() - config.sliding.sliding_speed).abs() < 1.0e-3);
    }

    #[test]
    fn perma_transfer_adds_frame_velocity() {
        let config = MotorConfig::default();
        let mut input = walking(Vec3::zeros());
        input.grounded = false;
        input.frame_velocity = Vec3::new(3.0, 1.0, 0.0);

        assert_eq!(desired_velocity(&config, &input), Vec3::new(3.0, 0.0, 0.0));
    }
}
