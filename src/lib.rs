//! sportsview: a pooled 2D particle emitter
//!
//! The engine lives in [`particles`]. [`display`] draws live particles into
//! a software pixel buffer, [`driver`] ticks a system at a fixed cadence,
//! [`config`] loads emitter presets from JSON and [`remote`] listens for
//! link status over MQTT.

pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod math;
pub mod particles;
pub mod remote;
pub mod sprite;

pub use error::{ConfigError, ParticleError, RemoteError};
pub use math::Vec2;
pub use particles::{
    ActiveParticles, Appearance, EmitterRect, Particle, ParticleSystem, ParticleView, RedrawFlag,
    TickStats,
};
pub use sprite::{Animation, Frame, Sprite};
