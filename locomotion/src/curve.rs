use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One sample of a [`SlopeSpeedCurve`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Slope angle of the current motion in degrees (negative = downhill).
    pub angle: f32,
    /// Speed multiplier at that angle.
    pub multiplier: f32,
}

impl CurveKey {
    pub const fn new(angle: f32, multiplier: f32) -> Self {
        Self { angle, multiplier }
    }
}

/// Piecewise-linear speed multiplier over the ascent/descent angle.
///
/// Keys are sorted by angle. Between two keys the multiplier is interpolated linearly;
/// outside the sampled range the nearest end key is used. An empty curve is a constant 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlopeSpeedCurve {
    keys: Vec<CurveKey>,
}

impl Default for SlopeSpeedCurve {
    /// Full speed on flat ground and downhill, fading to a standstill on a vertical climb.
    fn default() -> Self {
        Self::new(vec![
            CurveKey::new(-90.0, 1.0),
            CurveKey::new(0.0, 1.0),
            CurveKey::new(90.0, 0.0),
        ])
    }
}

impl SlopeSpeedCurve {
    pub fn new(keys: Vec<CurveKey>) -> Self {
        Self { keys }
    }

    /// A curve that never changes speed.
    pub fn flat() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in &self.keys {
            if !key.angle.is_finite() {
                return Err(ConfigError::NotFinite {
                    field: "slope_speed_curve.angle",
                    value: key.angle,
                });
            }
            if !key.multiplier.is_finite() {
                return Err(ConfigError::NotFinite {
                    field: "slope_speed_curve.multiplier",
                    value: key.multiplier,
                });
            }
        }
        if let Some(index) = self
            .keys
            .windows(2)
            .position(|pair| pair[1].angle < pair[0].angle)
        {
            return Err(ConfigError::UnsortedCurve { index: index + 1 });
        }
        Ok(())
    }

    pub fn evaluate(&self, angle: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };
        if angle <= first.angle {
            return first.multiplier;
        }
        if angle >= last.angle {
            return last.multiplier;
        }

        // First key strictly past `angle`; the range checks above guarantee 1..len.
        let upper = self.keys.partition_point(|k| k.angle <= angle);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.angle - a.angle;
        if span <= f32::EPSILON {
            return b.multiplier;
        }
        let t = (angle - a.angle) / span;
        a.multiplier + (b.multiplier - a.multiplier) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_curve_slows_uphill_only() {
        let curve = SlopeSpeedCurve::default();

        assert!((curve.evaluate(-45.0) - 1.0).abs() < 1.0e-6);
        assert!((curve.evaluate(0.0) - 1.0).abs() < 1.0e-6);
        assert!((curve.evaluate(45.0) - 0.5).abs() < 1.0e-6);
        assert!(curve.evaluate(90.0).abs() < 1.0e-6);
    }

    #[test]
    fn evaluation_clamps_outside_sampled_range() {
        let curve = SlopeSpeedCurve::new(vec![CurveKey::new(-10.0, 2.0), CurveKey::new(10.0, 0.5)]);

        assert_eq!(curve.evaluate(-80.0), 2.0);
        assert_eq!(curve.evaluate(80.0), 0.5);
        assert_eq!(SlopeSpeedCurve::flat().evaluate(33.0), 1.0);
    }

    #[test]
    fn unsorted_keys_are_rejected() {
        let curve = SlopeSpeedCurve::new(vec![
            CurveKey::new(0.0, 1.0),
            CurveKey::new(30.0, 0.8),
            CurveKey::new(10.0, 0.9),
        ]);

        assert_eq!(curve.validate(), Err(ConfigError::UnsortedCurve { index: 2 }));
        assert!(SlopeSpeedCurve::default().validate().is_ok());
    }
}
