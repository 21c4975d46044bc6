//! Emitter presets
//!
//! A preset captures a whole particle effect as JSON: pool size, lifetime,
//! emission rate, initializers, modifiers, and optionally the emitter
//! geometry and RNG seed.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::particles::{
    AlphaModifier, Appearance, Easing, EmitterRect, ParticleSystem, ParticleView, ScaleModifier,
};

/// One initializer registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitializerConfig {
    /// Speed in px/ms, any direction
    Speed { min: f32, max: f32 },
    SpeedModuleAndAngle {
        min_speed: f32,
        max_speed: f32,
        min_angle: f32,
        max_angle: f32,
    },
    SpeedByComponents {
        min_x: f32,
        max_x: f32,
        min_y: f32,
        max_y: f32,
    },
    InitialRotation { min_angle: f32, max_angle: f32 },
    Scale { min: f32, max: f32 },
    /// Degrees per second
    RotationSpeed { min: f32, max: f32 },
    Acceleration {
        min_acceleration: f32,
        max_acceleration: f32,
        min_angle: f32,
        max_angle: f32,
    },
}

/// One modifier registration; times are milliseconds into a particle's life
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModifierConfig {
    Alpha {
        initial: u8,
        target: u8,
        start_ms: u64,
        end_ms: u64,
        #[serde(default)]
        easing: Easing,
    },
    Scale {
        initial: f32,
        target: f32,
        start_ms: u64,
        end_ms: u64,
        #[serde(default)]
        easing: Easing,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeOut {
    pub duration_ms: u64,
    #[serde(default)]
    pub easing: Easing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterPreset {
    pub max_particles: usize,
    pub time_to_live_ms: u64,
    pub particles_per_second: u32,
    /// `[min_x, max_x, min_y, max_y]`; absent means the host decides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitter: Option<Vec<f32>>,
    #[serde(default)]
    pub initializers: Vec<InitializerConfig>,
    #[serde(default)]
    pub modifiers: Vec<ModifierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<FadeOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl EmitterPreset {
    /// Parse and validate a preset
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let preset: Self = serde_json::from_str(json)?;
        preset.validate()?;
        Ok(preset)
    }

    /// Load preset from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save preset to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.emitter {
            Some(values) if values.len() < 4 => Err(ConfigError::InvalidEmitter(values.len())),
            _ => Ok(()),
        }
    }

    /// Emitter geometry, if the preset carries a usable one
    pub fn emitter_rect(&self) -> Option<EmitterRect> {
        let values = self.emitter.as_deref()?;
        let rect = EmitterRect::from_slice(values);
        if rect.is_none() {
            warn!("skipping emitter with {} values, need 4", values.len());
        }
        rect
    }

    /// Register this preset's initializers and modifiers on `system` and
    /// set its start time. Emission is not started.
    pub fn apply(&self, system: &mut ParticleSystem) {
        if let Some(start) = self.start_time_ms {
            system.set_start_time(start);
        }

        for init in &self.initializers {
            match *init {
                InitializerConfig::Speed { min, max } => {
                    system.set_speed_range(min, max);
                }
                InitializerConfig::SpeedModuleAndAngle {
                    min_speed,
                    max_speed,
                    min_angle,
                    max_angle,
                } => {
                    system.set_speed_module_and_angle_range(min_speed, max_speed, min_angle, max_angle);
                }
                InitializerConfig::SpeedByComponents {
                    min_x,
                    max_x,
                    min_y,
                    max_y,
                } => {
                    system.set_speed_by_components_range(min_x, max_x, min_y, max_y);
                }
                InitializerConfig::InitialRotation {
                    min_angle,
                    max_angle,
                } => {
                    system.set_initial_rotation_range(min_angle, max_angle);
                }
                InitializerConfig::Scale { min, max } => {
                    system.set_scale_range(min, max);
                }
                InitializerConfig::RotationSpeed { min, max } => {
                    system.set_rotation_speed_range(min, max);
                }
                InitializerConfig::Acceleration {
                    min_acceleration,
                    max_acceleration,
                    min_angle,
                    max_angle,
                } => {
                    system.set_acceleration_module_and_angle_range(
                        min_acceleration,
                        max_acceleration,
                        min_angle,
                        max_angle,
                    );
                }
            }
        }

        for modifier in &self.modifiers {
            match *modifier {
                ModifierConfig::Alpha {
                    initial,
                    target,
                    start_ms,
                    end_ms,
                    easing,
                } => {
                    system.add_modifier(AlphaModifier::with_interpolator(
                        initial, target, start_ms, end_ms, easing,
                    ));
                }
                ModifierConfig::Scale {
                    initial,
                    target,
                    start_ms,
                    end_ms,
                    easing,
                } => {
                    system.add_modifier(ScaleModifier::with_interpolator(
                        initial, target, start_ms, end_ms, easing,
                    ));
                }
            }
        }

        if let Some(fade) = self.fade_out {
            system.set_fade_out_with(fade.duration_ms, fade.easing);
        }
    }

    /// Construct a configured system drawing every particle with
    /// `appearance`
    pub fn build(&self, view: Arc<dyn ParticleView>, appearance: Appearance) -> ParticleSystem {
        let mut system = match self.seed {
            Some(seed) => ParticleSystem::with_seed(
                view,
                self.max_particles,
                appearance,
                self.time_to_live_ms,
                seed,
            ),
            None => ParticleSystem::new(view, self.max_particles, appearance, self.time_to_live_ms),
        };
        self.apply(&mut system);
        system
    }

    /// Start emitting at the preset rate. `fallback` is used when the
    /// preset carries no usable emitter.
    pub fn start_emitting(&self, system: &mut ParticleSystem, fallback: Option<EmitterRect>) {
        let emitter = self.emitter_rect().or(fallback);
        system.prepare_emitting(self.particles_per_second, emitter);
    }
}

impl Default for EmitterPreset {
    /// Sparks thrown up and off the rim of a gauge
    fn default() -> Self {
        Self {
            max_particles: 100,
            time_to_live_ms: 800,
            particles_per_second: 50,
            emitter: None,
            initializers: vec![
                InitializerConfig::Scale { min: 0.7, max: 1.3 },
                InitializerConfig::SpeedModuleAndAngle {
                    min_speed: 0.07,
                    max_speed: 0.16,
                    min_angle: -120.0,
                    max_angle: -80.0,
                },
                InitializerConfig::RotationSpeed {
                    min: 90.0,
                    max: 180.0,
                },
            ],
            modifiers: Vec::new(),
            fade_out: Some(FadeOut {
                duration_ms: 200,
                easing: Easing::Accelerate(1.0),
            }),
            start_time_ms: None,
            seed: None,
        }
    }
}
