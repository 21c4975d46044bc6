//! Pooled particle emitter
//!
//! A `ParticleSystem` owns a fixed set of particles. Each tick it launches
//! particles from the pool at the configured rate, running every
//! initializer once per launch, then advances the live ones through the
//! modifier chain and recycles those past their time to live.

mod emitter;
mod initializers;
mod interpolator;
mod modifiers;
mod particle;
mod pool;
mod system;
mod view;

pub use emitter::EmitterRect;
pub use initializers::{
    normalize_angle_range, sample_range, AccelerationInitializer, ParticleInitializer,
    RotationInitializer, RotationSpeedInitializer, ScaleInitializer, SpeedByComponentsInitializer,
    SpeedModuleAndAngleInitializer,
};
pub use interpolator::{Easing, Interpolator};
pub use modifiers::{AlphaModifier, ParticleModifier, ScaleModifier};
pub use particle::{Appearance, Particle};
pub use pool::{ActiveParticles, ParticlePool};
pub use system::{ParticleSystem, TickStats};
pub use view::{ParticleView, RedrawFlag};
