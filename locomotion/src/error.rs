use thiserror::Error;

/// A configuration value outside its allowed range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("`{field}` must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("`{field}` must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },

    #[error("slope speed curve keys must be sorted by angle (key {index} is out of order)")]
    UnsortedCurve { index: usize },
}

/// Errors raised while building or commanding a motor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotorError {
    #[error("invalid motor configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("a collision mover is required to build a motor")]
    MissingMover,

    #[error("collision mover rejected: {0}")]
    InvalidMover(String),
}
