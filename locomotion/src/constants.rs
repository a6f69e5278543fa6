/// A jump request is honoured if the button went down at most this long ago (seconds).
///
/// Players often press jump a moment before touching the ground; buffering the press keeps
/// the landing jump from being swallowed.
pub const JUMP_BUFFER_SECONDS: f64 = 0.2;

/// Sentinel timestamp meaning "no button press recorded".
pub const UNSET_TIME: f64 = -100.0;

/// A ground normal whose Y component is at or below this value does not count as ground.
pub const GROUNDED_NORMAL_Y: f32 = 0.01;

/// Squared distance (m^2) under which a new ground contact is treated as the previous one.
///
/// Contacts this close reuse the previous ground normal, which keeps the normal from
/// oscillating when the mover reports near-coincident hits on edges.
pub const HIT_POINT_JITTER_SQ: f32 = 0.001;

/// Number of ticks to wait after landing before removing the platform velocity.
pub const LANDING_CORRECTION_TICKS: u8 = 2;

/// Tolerance (m/s) when comparing realized vertical velocity against the planned one.
pub const VERTICAL_UNDERSHOOT_EPS: f32 = 0.001;

/// Contact normals steeper than this (|n.y| <= value) count as side hits.
pub const SIDE_NORMAL_Y: f32 = 0.1;

/// Squared length under which a vector is treated as zero.
pub const ZERO_SQ: f32 = 1.0e-12;
