use crate::Vec3;

/// Something noteworthy that happened during one motor tick.
#[derive(Clone, Debug, PartialEq)]
pub enum MotorEvent<B> {
    /// A jump started.
    Jumped { direction: Vec3, vertical_speed: f32 },
    /// The character touched ground after being airborne.
    Landed,
    /// The character lost the ground without jumping.
    Fell,
    /// A velocity was forced on the character since the previous tick.
    ExternalVelocity,
    /// The character now follows a different body.
    PlatformAttached { body: B },
    /// The landing correction fired and removed the platform's velocity.
    PlatformVelocityRemoved { velocity: Vec3 },
    /// The followed body vanished from the world.
    PlatformDetached,
}

/// Events of one tick in the order they happened.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport<B> {
    pub events: Vec<MotorEvent<B>>,
}

impl<B> Default for TickReport<B> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<B> TickReport<B> {
    pub(crate) fn push(&mut self, event: MotorEvent<B>) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotorEvent<B>> {
        self.events.iter()
    }

    pub fn jumped(&self) -> bool {
        self.iter().any(|e| matches!(e, MotorEvent::Jumped { .. }))
    }

    pub fn landed(&self) -> bool {
        self.iter().any(|e| matches!(e, MotorEvent::Landed))
    }

    pub fn fell(&self) -> bool {
        self.iter().any(|e| matches!(e, MotorEvent::Fell))
    }

    /// Velocity removed by the landing correction this tick, if it fired.
    pub fn removed_platform_velocity(&self) -> Option<Vec3> {
        self.iter().find_map(|e| match e {
            MotorEvent::PlatformVelocityRemoved { velocity } => Some(*velocity),
            _ => None,
        })
    }
}
