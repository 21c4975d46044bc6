//! Easing curves used by modifiers
//!
//! An interpolator maps normalized progress `t` in [0, 1] to an eased
//! fraction. Modifiers clamp `t` before calling, so implementations only
//! need to be defined on the unit interval.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

pub trait Interpolator: Send + Sync {
    fn interpolate(&self, t: f32) -> f32;
}

/// Built-in easing curves
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "factor", rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// Starts slow, ends fast: `t^(2 * factor)`
    Accelerate(f32),
    /// Starts fast, ends slow: `1 - (1 - t)^(2 * factor)`
    Decelerate(f32),
    /// Slow at both ends, cosine shaped
    AccelerateDecelerate,
}

impl Interpolator for Easing {
    fn interpolate(&self, t: f32) -> f32 {
        match *self {
            Self::Linear => t,
            Self::Accelerate(factor) => {
                if factor == 1.0 {
                    t * t
                } else {
                    t.powf(2.0 * factor)
                }
            },
            Self::Decelerate(factor) => {
                if factor == 1.0 {
                    1.0 - (1.0 - t) * (1.0 - t)
                } else {
                    1.0 - (1.0 - t).powf(2.0 * factor)
                }
            },
            Self::AccelerateDecelerate => ((t + 1.0) * PI).cos() / 2.0 + 0.5,
        }
    }
}

impl<F> Interpolator for F
where
    F: Fn(f32) -> f32 + Send + Sync,
{
    fn interpolate(&self, t: f32) -> f32 {
        self(t)
    }
}
