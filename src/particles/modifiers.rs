//! Per-tick property modifiers
//!
//! A modifier recomputes one particle property from the time elapsed since
//! activation. Modifiers hold no per-particle state, so applying one twice
//! with the same elapsed time gives the same result.

use super::interpolator::{Easing, Interpolator};
use super::particle::Particle;

pub trait ParticleModifier: Send + Sync {
    fn apply(&self, particle: &mut Particle, elapsed_ms: u64);
}

/// Eased progress through `[start_ms, end_ms]`, clamped to [0, 1]
fn progress(interpolator: &dyn Interpolator, start_ms: u64, end_ms: u64, elapsed_ms: u64) -> f32 {
    if elapsed_ms >= end_ms {
        return 1.0;
    }
    if elapsed_ms <= start_ms {
        return 0.0;
    }
    let t = (elapsed_ms - start_ms) as f32 / (end_ms - start_ms) as f32;
    interpolator.interpolate(t)
}

/// Fades alpha from `initial` to `target` between two points of a
/// particle's life
pub struct AlphaModifier {
    initial: u8,
    target: u8,
    start_ms: u64,
    end_ms: u64,
    interpolator: Box<dyn Interpolator>,
}

impl AlphaModifier {
    pub fn new(initial: u8, target: u8, start_ms: u64, end_ms: u64) -> Self {
        Self::with_interpolator(initial, target, start_ms, end_ms, Easing::Linear)
    }

    pub fn with_interpolator(
        initial: u8,
        target: u8,
        start_ms: u64,
        end_ms: u64,
        interpolator: impl Interpolator + 'static,
    ) -> Self {
        Self {
            initial,
            target,
            start_ms,
            end_ms: end_ms.max(start_ms),
            interpolator: Box::new(interpolator),
        }
    }
}

impl ParticleModifier for AlphaModifier {
    fn apply(&self, particle: &mut Particle, elapsed_ms: u64) {
        if elapsed_ms < self.start_ms {
            particle.alpha = self.initial;
        } else if elapsed_ms > self.end_ms {
            particle.alpha = self.target;
        } else {
            let f = progress(self.interpolator.as_ref(), self.start_ms, self.end_ms, elapsed_ms);
            let delta = self.target as f32 - self.initial as f32;
            particle.alpha = (self.initial as f32 + delta * f).clamp(0.0, 255.0) as u8;
        }
    }
}

/// Scales a particle from `initial` to `target` between two points of its
/// life
pub struct ScaleModifier {
    initial: f32,
    target: f32,
    start_ms: u64,
    end_ms: u64,
    interpolator: Box<dyn Interpolator>,
}

impl ScaleModifier {
    pub fn new(initial: f32, target: f32, start_ms: u64, end_ms: u64) -> Self {
        Self::with_interpolator(initial, target, start_ms, end_ms, Easing::Linear)
    }

    pub fn with_interpolator(
        initial: f32,
        target: f32,
        start_ms: u64,
        end_ms: u64,
        interpolator: impl Interpolator + 'static,
    ) -> Self {
        Self {
            initial,
            target,
            start_ms,
            end_ms: end_ms.max(start_ms),
            interpolator: Box::new(interpolator),
        }
    }
}

impl ParticleModifier for ScaleModifier {
    fn apply(&self, particle: &mut Particle, elapsed_ms: u64) {
        if elapsed_ms < self.start_ms {
            particle.scale = self.initial;
        } else if elapsed_ms > self.end_ms {
            particle.scale = self.target;
        } else {
            let f = progress(self.interpolator.as_ref(), self.start_ms, self.end_ms, elapsed_ms);
            particle.scale = self.initial + (self.target - self.initial) * f;
        }
    }
}
