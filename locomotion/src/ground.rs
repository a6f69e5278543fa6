use log::trace;

use crate::{
    Vec3,
    constants::{GROUNDED_NORMAL_Y, HIT_POINT_JITTER_SQ},
    types::Contact,
};

/// The contact chosen as "the floor" for one move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundContact<B> {
    /// Ground normal after jitter suppression.
    pub normal: Vec3,
    /// Raw contact point.
    pub point: Vec3,
    /// Body owning the floor, the platform-attach candidate.
    pub body: Option<B>,
}

/// Is ground with this normal too steep to walk on?
///
/// The boundary belongs to the steep side: a normal exactly at the slope limit slides.
#[inline]
pub fn is_too_steep(ground_normal: &Vec3, slope_limit_degrees: f32) -> bool {
    ground_normal.y <= slope_limit_degrees.to_radians().cos()
}

/// Does this normal count as standing on something?
#[inline]
pub fn is_ground_normal(normal: &Vec3) -> bool {
    normal.y > GROUNDED_NORMAL_Y
}

/// Turns the contacts of each move into a stable ground normal.
///
/// Only contacts hit while moving down and facing up qualify; the one facing most upward
/// wins. A winner that lands within [`HIT_POINT_JITTER_SQ`] of the previous tick's hit point
/// keeps the previous tick's normal, which stops the normal from flickering when the mover
/// reports slightly different normals for the same spot (typically on edges).
#[derive(Clone, Debug)]
pub struct GroundSensor<B> {
    /// Most recently chosen normal; zero until the first ground contact.
    normal: Vec3,
    /// Normal chosen during the previous move, zero when it found no ground.
    previous_move_normal: Vec3,
    /// Most recently recorded ground hit point.
    last_hit_point: Option<Vec3>,
    current: Option<GroundContact<B>>,
}

impl<B> Default for GroundSensor<B> {
    fn default() -> Self {
        Self {
            normal: Vec3::zeros(),
            previous_move_normal: Vec3::zeros(),
            last_hit_point: None,
            current: None,
        }
    }
}

impl<B: Copy + PartialEq> GroundSensor<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret every contact of one move and return the chosen ground, if any.
    pub fn interpret(&mut self, contacts: &[Contact<B>]) -> Option<GroundContact<B>> {
        self.current = None;
        for contact in contacts {
            self.observe(contact);
        }

        // Comparisons during the next move use this move's results.
        self.previous_move_normal = self.current.map(|c| c.normal).unwrap_or_else(Vec3::zeros);
        if let Some(ground) = self.current {
            self.normal = ground.normal;
            self.last_hit_point = Some(ground.point);
        }
        self.current
    }

    fn observe(&mut self, contact: &Contact<B>) {
        let best_y = self.current.map_or(0.0, |c| c.normal.y);
        if contact.normal.y <= 0.0 || contact.normal.y <= best_y || !contact.moving_downward {
            return;
        }

        let near_previous = self
            .last_hit_point
            .is_some_and(|p| (contact.point - p).norm_squared() <= HIT_POINT_JITTER_SQ);
        let normal = if near_previous && self.previous_move_normal != Vec3::zeros() {
            trace!("ground contact within jitter radius, keeping previous normal");
            self.previous_move_normal
        } else {
            contact.normal
        };

        self.current = Some(GroundContact {
            normal,
            point: contact.point,
            body: contact.body,
        });
    }

    /// Most recently chosen ground normal (zero if no ground was ever touched).
    pub fn ground_normal(&self) -> Vec3 {
        self.normal
    }

    /// Did the last move end on ground?
    pub fn has_ground(&self) -> bool {
        self.current.is_some_and(|c| is_ground_normal(&c.normal))
    }

    pub fn last_hit_point(&self) -> Option<Vec3> {
        self.last_hit_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(point: Vec3, normal: Vec3, body: u32) -> Contact<u32> {
        Contact {
            point,
            normal,
            moving_downward: true,
            body: Some(body),
        }
    }

    #[test]
    fn picks_the_most_upward_contact() {
        let mut sensor = GroundSensor::new();
        let slope = Vec3::new(0.6, 0.8, 0.0);
        let flat = Vec3::y();

        let ground = sensor
            .interpret(&[
                contact(Vec3::new(0.0, 0.0, 0.0), slope, 1),
                contact(Vec3::new(1.0, 0.0, 0.0), flat, 2),
                contact(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.866), 3),
            ])
            .unwrap();

        assert_eq!(ground.normal, flat);
        assert_eq!(ground.body, Some(2));
        assert!(sensor.has_ground());
        assert_eq!(sensor.last_hit_point(), Some(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn ignores_ceilings_and_upward_moves() {
        let mut sensor = GroundSensor::<u32>::new();
        let mut rising = contact(Vec3::zeros(), Vec3::y(), 1);
        rising.moving_downward = false;
        let ceiling = contact(Vec3::zeros(), -Vec3::y(), 2);

        assert!(sensor.interpret(&[rising, ceiling]).is_none());
        assert!(!sensor.has_ground());
        assert_eq!(sensor.last_hit_point(), None);
        assert_eq!(sensor.ground_normal(), Vec3::zeros());
    }

    #[test]
    fn near_coincident_contacts_keep_previous_normal() {
        let mut sensor = GroundSensor::new();
        let first = Vec3::new(0.0, 1.0, 0.0);
        let wobble = Vec3::new(0.1, 0.995, 0.0).normalize();

        sensor.interpret(&[contact(Vec3::new(1.0, 0.0, 1.0), first, 7)]);
        assert_eq!(sensor.ground_normal(), first);

        // 0.02 m away: squared distance 0.0004 is inside the jitter radius.
        sensor.interpret(&[contact(Vec3::new(1.02, 0.0, 1.0), wobble, 7)]);
        assert_eq!(sensor.ground_normal(), first);

        // Far away contacts take their own normal.
        sensor.interpret(&[contact(Vec3::new(3.0, 0.0, 1.0), wobble, 7)]);
        assert_eq!(sensor.ground_normal(), wobble);
    }

    #[test]
    fn jitter_reuse_needs_ground_on_previous_move() {
        let mut sensor = GroundSensor::new();
        let wobble = Vec3::new(0.1, 0.995, 0.0).normalize();

        sensor.interpret(&[contact(Vec3::zeros(), Vec3::y(), 1)]);
        // A move without ground in between.
        assert!(sensor.interpret(&[]).is_none());
        assert_eq!(sensor.ground_normal(), Vec3::y());

        sensor.interpret(&[contact(Vec3::zeros(), wobble, 1)]);
        assert_eq!(sensor.ground_normal(), wobble);
    }

    #[test]
    fn slope_limit_boundary_is_steep() {
        let limit = 45.0_f32;
        let boundary = Vec3::new(0.0, limit.to_radians().cos(), limit.to_radians().sin());

        assert!(is_too_steep(&boundary, limit));
        assert!(!is_too_steep(&Vec3::y(), limit));
        assert!(is_too_steep(&Vec3::zeros(), limit));
    }
}
