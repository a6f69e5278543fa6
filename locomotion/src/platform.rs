use log::{debug, trace};
use nalgebra as na;

use crate::{
    Iso, Quat, Vec3,
    constants::LANDING_CORRECTION_TICKS,
    utils::yaw_delta,
};

/// Where the character stands on its platform, recorded at the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Anchor {
    local_point: Vec3,
    global_point: Vec3,
    local_rotation: Quat,
    global_rotation: Quat,
}

/// Pending removal of the platform velocity after landing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LandingCorrection<B> {
    /// Ticks left before the correction fires.
    pub remaining: u8,
    /// Platform the character landed on.
    pub body: B,
}

/// Displacement and yaw the platform imposed on the character since the last tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlatformCarry {
    pub displacement: Vec3,
    /// Radians about +Y.
    pub yaw: f32,
}

/// Result of sampling the platform at the start of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sample<B> {
    Tracking,
    /// The attached body no longer exists in the world.
    Vanished(B),
}

/// Follows the platform the character stands on.
///
/// The platform is referenced by a copyable id and resolved through the mover every tick;
/// the tracker never owns it.
#[derive(Clone, Debug)]
pub struct PlatformTracker<B> {
    active: Option<B>,
    anchor: Option<Anchor>,
    /// Platform pose seen at the previous sample.
    last_pose: Option<Iso>,
    velocity: Vec3,
    new_attachment: bool,
    correction: Option<LandingCorrection<B>>,
}

impl<B> Default for PlatformTracker<B> {
    fn default() -> Self {
        Self {
            active: None,
            anchor: None,
            last_pose: None,
            velocity: Vec3::zeros(),
            new_attachment: false,
            correction: None,
        }
    }
}

impl<B: Copy + Eq + std::fmt::Debug> PlatformTracker<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<B> {
        self.active
    }

    /// Velocity of the attach point, zero without an attachment.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn is_new_attachment(&self) -> bool {
        self.new_attachment
    }

    pub fn pending_correction(&self) -> Option<LandingCorrection<B>> {
        self.correction
    }

    fn local_point(&self) -> Vec3 {
        self.anchor.map_or_else(Vec3::zeros, |a| a.local_point)
    }

    /// Update the platform velocity from the attached body's motion since the last sample.
    ///
    /// The first sample after an attachment keeps the previous velocity: the stored pose was
    /// taken mid-tick and would produce a spike.
    pub fn sample_velocity(
        &mut self,
        enabled: bool,
        dt: f32,
        resolve: impl Fn(B) -> Option<Iso>,
    ) -> Sample<B> {
        let Some(body) = self.active.filter(|_| enabled) else {
            self.velocity = Vec3::zeros();
            return Sample::Tracking;
        };
        let Some(pose) = resolve(body) else {
            debug!("platform {body:?} vanished, detaching");
            self.detach();
            return Sample::Vanished(body);
        };

        if !self.new_attachment {
            if let Some(last) = self.last_pose {
                let local = na::Point3::from(self.local_point());
                self.velocity = (pose * local - last * local) / dt;
            }
        }
        self.last_pose = Some(pose);
        self.new_attachment = false;
        Sample::Tracking
    }

    /// Count the landing correction down. Returns the velocity to remove when it fires.
    pub fn advance_correction(&mut self, grounded: bool) -> Option<Vec3> {
        let mut correction = self.correction.take()?;
        correction.remaining = correction.remaining.saturating_sub(1);
        if correction.remaining > 0 {
            self.correction = Some(correction);
            return None;
        }
        if grounded && self.active == Some(correction.body) {
            trace!("removing platform velocity {:?} after landing", self.velocity);
            Some(self.velocity)
        } else {
            None
        }
    }

    /// Switch to the body of this move's ground contact. Returns true when the attachment changed.
    ///
    /// Moves without ground, and ground whose body cannot be resolved, keep the current
    /// attachment.
    pub fn attach_if_changed(&mut self, hit: Option<B>, pose: impl Fn(B) -> Option<Iso>) -> bool {
        let Some(body) = hit else {
            return false;
        };
        if self.active == Some(body) {
            return false;
        }
        let Some(pose) = pose(body) else {
            return false;
        };
        debug!("attached to platform {body:?}");
        self.active = Some(body);
        self.anchor = None;
        self.last_pose = Some(pose);
        self.new_attachment = true;
        if self.correction.is_some_and(|c| c.body != body) {
            self.correction = None;
        }
        true
    }

    /// Motion of the anchor since it was recorded, as of the platform's current pose.
    pub fn carry(&self, pose: &Iso) -> Option<PlatformCarry> {
        let anchor = self.anchor?;
        let global_point = pose * na::Point3::from(anchor.local_point);
        let global_rotation = pose.rotation * anchor.local_rotation;
        Some(PlatformCarry {
            displacement: global_point.coords - anchor.global_point,
            yaw: yaw_delta(&anchor.global_rotation, &global_rotation),
        })
    }

    /// Remember where the character stands relative to the platform.
    pub fn record_anchor(&mut self, pose: &Iso, global_point: Vec3, global_rotation: Quat) {
        self.anchor = Some(Anchor {
            local_point: pose.inverse_transform_point(&global_point.into()).coords,
            global_point,
            local_rotation: pose.rotation.inverse() * global_rotation,
            global_rotation,
        });
    }

    /// Start the countdown that removes the platform velocity after landing.
    pub fn schedule_landing_correction(&mut self) {
        self.correction = self.active.map(|body| LandingCorrection {
            remaining: LANDING_CORRECTION_TICKS,
            body,
        });
    }

    pub fn cancel_correction(&mut self) {
        if self.correction.take().is_some() {
            trace!("landing correction cancelled");
        }
    }

    pub fn detach(&mut self) {
        self.active = None;
        self.anchor = None;
        self.last_pose = None;
        self.velocity = Vec3::zeros();
        self.new_attachment = false;
        self.correction = None;
    }
}
