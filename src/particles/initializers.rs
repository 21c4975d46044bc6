//! One-shot property initializers
//!
//! Each initializer assigns one property of a particle when it is pulled
//! from the pool, before the particle is placed at its origin. Ranges are
//! sampled uniformly in `[min, max)`; a range whose bounds are equal yields
//! the bound itself without touching the random source.

use log::warn;
use rand::distr::{Distribution, Uniform};
use rand::RngCore;

use super::particle::Particle;
use crate::math::Vec2;

pub trait ParticleInitializer: Send + Sync {
    fn init_particle(&self, particle: &mut Particle, rng: &mut dyn RngCore);
}

/// Uniform sample in `[min, max)`, or `min` when the range is empty.
/// Reversed bounds sample the same interval as ordered ones.
pub fn sample_range(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    if min == max {
        return min;
    }
    let (low, high) = if min < max { (min, max) } else { (max, min) };
    let Ok(uniform) = Uniform::new(low, high) else {
        // Non-finite bounds
        return min;
    };
    loop {
        let value = uniform.sample(rng);
        // Rounding can land exactly on the excluded bound
        if value < high {
            return value;
        }
    }
}

/// Raise `max` by whole turns until it is no smaller than `min`.
///
/// Keeps ranges that cross 0° intact: 270..90 becomes 270..450 rather than
/// collapsing onto the opposite arc. Non-finite angles collapse to 0°.
pub fn normalize_angle_range(min: f32, max: f32) -> (f32, f32) {
    if !min.is_finite() || !max.is_finite() {
        warn!("non-finite angle range {}..{}, using 0°", min, max);
        return (0.0, 0.0);
    }
    if max >= min {
        return (min, max);
    }

    let turns = ((min - max) / 360.0).ceil();
    let wrapped = max + turns * 360.0;
    if !wrapped.is_finite() {
        return (min, min);
    }
    // Past ~1e9 degrees f32 can't resolve a turn; pin to min
    (min, wrapped.max(min))
}

/// Velocity from a speed range and a direction range (degrees, clockwise
/// from +x)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedModuleAndAngleInitializer {
    min_speed: f32,
    max_speed: f32,
    min_angle: f32,
    max_angle: f32,
}

impl SpeedModuleAndAngleInitializer {
    pub fn new(min_speed: f32, max_speed: f32, min_angle: f32, max_angle: f32) -> Self {
        let (min_angle, max_angle) = normalize_angle_range(min_angle, max_angle);
        Self {
            min_speed,
            max_speed,
            min_angle,
            max_angle,
        }
    }

    pub fn angle_range(&self) -> (f32, f32) {
        (self.min_angle, self.max_angle)
    }
}

impl ParticleInitializer for SpeedModuleAndAngleInitializer {
    fn init_particle(&self, particle: &mut Particle, rng: &mut dyn RngCore) {
        let speed = sample_range(rng, self.min_speed, self.max_speed);
        let angle = sample_range(rng, self.min_angle, self.max_angle);
        particle.velocity = Vec2::from_polar(speed, angle);
    }
}

/// Velocity from independent x and y ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedByComponentsInitializer {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
}

impl SpeedByComponentsInitializer {
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

impl ParticleInitializer for SpeedByComponentsInitializer {
    fn init_particle(&self, particle: &mut Particle, rng: &mut dyn RngCore) {
        particle.velocity = Vec2::new(
            sample_range(rng, self.min_x, self.max_x),
            sample_range(rng, self.min_y, self.max_y),
        );
    }
}

/// Acceleration from a magnitude range and a direction range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationInitializer {
    min_acceleration: f32,
    max_acceleration: f32,
    min_angle: f32,
    max_angle: f32,
}

impl AccelerationInitializer {
    pub fn new(min_acceleration: f32, max_acceleration: f32, min_angle: f32, max_angle: f32) -> Self {
        let (min_angle, max_angle) = normalize_angle_range(min_angle, max_angle);
        Self {
            min_acceleration,
            max_acceleration,
            min_angle,
            max_angle,
        }
    }
}

impl ParticleInitializer for AccelerationInitializer {
    fn init_particle(&self, particle: &mut Particle, rng: &mut dyn RngCore) {
        let magnitude = sample_range(rng, self.min_acceleration, self.max_acceleration);
        let angle = sample_range(rng, self.min_angle, self.max_angle);
        particle.acceleration = Vec2::from_polar(magnitude, angle);
    }
}

/// Starting rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationInitializer {
    min_angle: f32,
    max_angle: f32,
}

impl RotationInitializer {
    pub fn new(min_angle: f32, max_angle: f32) -> Self {
        Self {
            min_angle,
            max_angle,
        }
    }
}

impl ParticleInitializer for RotationInitializer {
    fn init_particle(&self, particle: &mut Particle, rng: &mut dyn RngCore) {
        let angle = sample_range(rng, self.min_angle, self.max_angle);
        particle.initial_rotation = angle;
        particle.rotation = angle;
    }
}

/// Rotation speed, stored in degrees per millisecond
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSpeedInitializer {
    min_speed: f32,
    max_speed: f32,
}

impl RotationSpeedInitializer {
    /// Range in degrees per millisecond
    pub fn new(min_speed: f32, max_speed: f32) -> Self {
        Self {
            min_speed,
            max_speed,
        }
    }

    /// Range in degrees per second
    pub fn per_second(min_speed: f32, max_speed: f32) -> Self {
        Self::new(min_speed / 1000.0, max_speed / 1000.0)
    }
}

impl ParticleInitializer for RotationSpeedInitializer {
    fn init_particle(&self, particle: &mut Particle, rng: &mut dyn RngCore) {
        particle.rotation_speed = sample_range(rng, self.min_speed, self.max_speed);
    }
}

/// Size multiplier applied to the particle's sprite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleInitializer {
    min_scale: f32,
    max_scale: f32,
}

impl ScaleInitializer {
    pub fn new(min_scale: f32, max_scale: f32) -> Self {
        Self {
            min_scale,
            max_scale,
        }
    }
}

impl ParticleInitializer for ScaleInitializer {
    fn init_particle(&self, particle: &mut Particle, rng: &mut dyn RngCore) {
        particle.scale = sample_range(rng, self.min_scale, self.max_scale);
    }
}
