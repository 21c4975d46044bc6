//! Particle system: pool ownership, emission scheduling and the tick loop
//!
//! Emission is budgeted against the simulation clock: by time `now` the
//! system should have launched `rate * (now - emission_start)` particles.
//! Each tick launches particles until that budget is met, the pool runs
//! dry, or the cutoff time has passed. Launches missed because the pool was
//! empty are written off rather than replayed as a burst later.

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::emitter::EmitterRect;
use super::initializers::{
    AccelerationInitializer, ParticleInitializer, RotationInitializer, RotationSpeedInitializer,
    ScaleInitializer, SpeedByComponentsInitializer, SpeedModuleAndAngleInitializer,
};
use super::interpolator::{Easing, Interpolator};
use super::modifiers::{AlphaModifier, ParticleModifier};
use super::particle::{Appearance, Particle};
use super::pool::{ActiveParticles, ParticlePool};
use super::view::ParticleView;
use crate::error::ParticleError;

/// What a single `on_update` did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Particles pulled from the pool this tick
    pub activated: usize,
    /// Particles returned to the pool this tick
    pub expired: usize,
    /// Particles alive after the tick
    pub active: usize,
}

pub struct ParticleSystem {
    view: Arc<dyn ParticleView>,
    pool: Arc<Mutex<ParticlePool>>,
    initializers: Vec<Box<dyn ParticleInitializer>>,
    modifiers: Vec<Box<dyn ParticleModifier>>,
    rng: StdRng,

    max_particles: usize,
    time_to_live: u64,

    // Emission schedule
    particles_per_ms: f64,
    activated: u64,
    forfeited: u64,
    emission_start: u64,
    /// None: emit forever
    cutoff: Option<u64>,
    emitter: EmitterRect,

    current_time: u64,
    last_update: Option<u64>,
    prepared: bool,
}

impl ParticleSystem {
    /// Build a system with `max_particles` pooled particles, all drawn with
    /// `appearance`, each living `time_to_live` milliseconds
    pub fn new(
        view: Arc<dyn ParticleView>,
        max_particles: usize,
        appearance: Appearance,
        time_to_live: u64,
    ) -> Self {
        Self::with_rng(
            view,
            max_particles,
            appearance,
            time_to_live,
            StdRng::from_os_rng(),
        )
    }

    /// Like `new`, with reproducible sampling
    pub fn with_seed(
        view: Arc<dyn ParticleView>,
        max_particles: usize,
        appearance: Appearance,
        time_to_live: u64,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            view,
            max_particles,
            appearance,
            time_to_live,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        view: Arc<dyn ParticleView>,
        max_particles: usize,
        appearance: Appearance,
        time_to_live: u64,
        rng: StdRng,
    ) -> Self {
        let particles = (0..max_particles)
            .map(|_| Particle::new(appearance.clone()))
            .collect();

        Self {
            view,
            pool: Arc::new(Mutex::new(ParticlePool::new(particles))),
            initializers: Vec::new(),
            modifiers: Vec::new(),
            rng,
            max_particles,
            time_to_live,
            particles_per_ms: 0.0,
            activated: 0,
            forfeited: 0,
            emission_start: 0,
            cutoff: None,
            emitter: EmitterRect::default(),
            current_time: 0,
            last_update: None,
            prepared: false,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Register a modifier; it runs every tick for every active particle
    pub fn add_modifier(&mut self, modifier: impl ParticleModifier + 'static) -> &mut Self {
        self.modifiers.push(Box::new(modifier));
        self
    }

    /// Register an initializer; it runs once per activation, in order
    pub fn add_initializer(&mut self, initializer: impl ParticleInitializer + 'static) -> &mut Self {
        self.initializers.push(Box::new(initializer));
        self
    }

    /// Speed in pixels per millisecond, any direction
    pub fn set_speed_range(&mut self, min_speed: f32, max_speed: f32) -> &mut Self {
        self.add_initializer(SpeedModuleAndAngleInitializer::new(
            min_speed, max_speed, 0.0, 360.0,
        ))
    }

    /// Speed in pixels per millisecond within an angle range in degrees
    /// (0° right, 90° down). A range like 270..90 wraps through 0°.
    pub fn set_speed_module_and_angle_range(
        &mut self,
        min_speed: f32,
        max_speed: f32,
        min_angle: f32,
        max_angle: f32,
    ) -> &mut Self {
        self.add_initializer(SpeedModuleAndAngleInitializer::new(
            min_speed, max_speed, min_angle, max_angle,
        ))
    }

    pub fn set_speed_by_components_range(
        &mut self,
        min_x: f32,
        max_x: f32,
        min_y: f32,
        max_y: f32,
    ) -> &mut Self {
        self.add_initializer(SpeedByComponentsInitializer::new(min_x, max_x, min_y, max_y))
    }

    /// Starting tilt in degrees, clockwise
    pub fn set_initial_rotation_range(&mut self, min_angle: f32, max_angle: f32) -> &mut Self {
        self.add_initializer(RotationInitializer::new(min_angle, max_angle))
    }

    /// Size multiplier around the sprite's center
    pub fn set_scale_range(&mut self, min_scale: f32, max_scale: f32) -> &mut Self {
        self.add_initializer(ScaleInitializer::new(min_scale, max_scale))
    }

    /// Fixed rotation speed in degrees per second
    pub fn set_rotation_speed(&mut self, degrees_per_second: f32) -> &mut Self {
        self.add_initializer(RotationSpeedInitializer::per_second(
            degrees_per_second,
            degrees_per_second,
        ))
    }

    /// Rotation speed range in degrees per second, either sign
    pub fn set_rotation_speed_range(&mut self, min: f32, max: f32) -> &mut Self {
        self.add_initializer(RotationSpeedInitializer::per_second(min, max))
    }

    /// Acceleration in pixels per millisecond squared within an angle range
    pub fn set_acceleration_module_and_angle_range(
        &mut self,
        min_acceleration: f32,
        max_acceleration: f32,
        min_angle: f32,
        max_angle: f32,
    ) -> &mut Self {
        self.add_initializer(AccelerationInitializer::new(
            min_acceleration,
            max_acceleration,
            min_angle,
            max_angle,
        ))
    }

    /// Constant acceleration toward `angle` degrees
    pub fn set_acceleration(&mut self, acceleration: f32, angle: f32) -> &mut Self {
        self.add_initializer(AccelerationInitializer::new(
            acceleration,
            acceleration,
            angle,
            angle,
        ))
    }

    /// Linear fade to transparent over the last `duration_ms` of each
    /// particle's life
    pub fn set_fade_out(&mut self, duration_ms: u64) -> &mut Self {
        self.set_fade_out_with(duration_ms, Easing::Linear)
    }

    pub fn set_fade_out_with(
        &mut self,
        duration_ms: u64,
        interpolator: impl Interpolator + 'static,
    ) -> &mut Self {
        let start = self.time_to_live.saturating_sub(duration_ms);
        self.add_modifier(AlphaModifier::with_interpolator(
            255,
            0,
            start,
            self.time_to_live,
            interpolator,
        ))
    }

    /// Set the simulation clock. `stop_emitting` and new emission windows
    /// are measured from this value.
    pub fn set_start_time(&mut self, time_ms: u64) -> &mut Self {
        self.current_time = time_ms;
        self
    }

    // ========================================================================
    // Emission control
    // ========================================================================

    /// Start emitting `particles_per_second` forever from `emitter`.
    ///
    /// Passing None keeps the previous emitter geometry.
    pub fn prepare_emitting(&mut self, particles_per_second: u32, emitter: Option<EmitterRect>) {
        self.configure_emitter(emitter);
        self.activated = 0;
        self.forfeited = 0;
        self.emission_start = self.current_time;
        self.particles_per_ms = f64::from(particles_per_second) / 1000.0;
        self.cutoff = None;
        self.publish();
        debug!(
            "emitting {}/s from {:?} at t={}",
            particles_per_second, self.emitter, self.current_time
        );
    }

    /// Emit for `duration_ms` starting at the current simulation time
    pub fn emit_for(
        &mut self,
        particles_per_second: u32,
        emitter: Option<EmitterRect>,
        duration_ms: u64,
    ) {
        self.prepare_emitting(particles_per_second, emitter);
        self.cutoff = Some(self.current_time.saturating_add(duration_ms));
    }

    /// Launch up to `count` particles at once, at the current simulation
    /// time, with no follow-up emission. Returns how many were launched.
    pub fn one_shot(&mut self, emitter: Option<EmitterRect>, count: usize) -> usize {
        self.prepare_emitting(0, emitter);
        self.cutoff = Some(self.current_time);

        let now = self.current_time;
        let pool = Arc::clone(&self.pool);
        let mut pool = pool.lock().unwrap_or_else(PoisonError::into_inner);
        let mut launched = 0;
        while launched < count {
            let Some(particle) = pool.activate_next() else {
                break;
            };
            launch(
                particle,
                &self.initializers,
                &mut self.rng,
                &self.emitter,
                self.time_to_live,
                now,
            );
            launched += 1;
        }
        drop(pool);

        self.activated += launched as u64;
        self.view.post_invalidate();
        launched
    }

    /// Move the emission area without touching live particles
    pub fn update_emit_point(&mut self, emitter: Option<EmitterRect>) {
        self.configure_emitter(emitter);
    }

    /// Stop launching new particles from the next tick on. Live particles
    /// play out their remaining lifetime.
    pub fn stop_emitting(&mut self) {
        self.cutoff = Some(self.current_time);
        debug!("emission stopped at t={}", self.current_time);
    }

    /// Stop emitting and return every live particle to the pool
    pub fn cancel(&mut self) {
        self.stop_emitting();
        let released = self
            .pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release_all();
        debug!("cancelled {} live particles", released);
        self.view.post_invalidate();
    }

    fn configure_emitter(&mut self, emitter: Option<EmitterRect>) {
        match emitter {
            Some(rect) => self.emitter = rect,
            None => debug!("no emitter geometry given, keeping {:?}", self.emitter),
        }
    }

    fn publish(&mut self) {
        self.view.set_particles(self.particles());
        self.prepared = true;
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the simulation to `now_ms`: launch due particles, update the
    /// live ones, recycle the expired, then ask the view to redraw.
    ///
    /// A `now_ms` earlier than the previous tick is ignored.
    pub fn on_update(&mut self, now_ms: u64) -> Result<TickStats, ParticleError> {
        if !self.prepared {
            return Err(ParticleError::NotPrepared);
        }

        if let Some(last) = self.last_update {
            if now_ms < last {
                debug!("ignoring tick at t={} after t={}", now_ms, last);
                return Ok(TickStats {
                    active: self.active_count(),
                    ..TickStats::default()
                });
            }
        }
        self.last_update = Some(now_ms);

        let pool = Arc::clone(&self.pool);
        let mut pool = pool.lock().unwrap_or_else(PoisonError::into_inner);

        let mut activated = 0;
        while self.emission_open(now_ms) && self.emission_due(now_ms) {
            let Some(particle) = pool.activate_next() else {
                break;
            };
            launch(
                particle,
                &self.initializers,
                &mut self.rng,
                &self.emitter,
                self.time_to_live,
                now_ms,
            );
            self.activated += 1;
            activated += 1;
        }

        // Pool ran dry with launches still owed: write them off
        if !pool.has_free() && self.emission_open(now_ms) && self.emission_due(now_ms) {
            let owed = self.emission_budget(now_ms).ceil() as u64;
            self.forfeited = owed.saturating_sub(self.activated);
        }

        let modifiers = &self.modifiers;
        let expired = pool.retain_active(|p| p.update(now_ms, modifiers));
        let active = pool.active_len();
        drop(pool);

        self.current_time = self.current_time.max(now_ms);
        self.view.post_invalidate();

        let stats = TickStats {
            activated,
            expired,
            active,
        };
        trace!("t={} {:?}", now_ms, stats);
        Ok(stats)
    }

    #[inline]
    fn emission_open(&self, now_ms: u64) -> bool {
        self.cutoff.map_or(true, |cutoff| now_ms < cutoff)
    }

    #[inline]
    fn emission_budget(&self, now_ms: u64) -> f64 {
        self.particles_per_ms * now_ms.saturating_sub(self.emission_start) as f64
    }

    #[inline]
    fn emission_due(&self, now_ms: u64) -> bool {
        ((self.activated + self.forfeited) as f64) < self.emission_budget(now_ms)
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Handle to the live particles, the same one given to the view
    pub fn particles(&self) -> ActiveParticles {
        ActiveParticles::new(Arc::clone(&self.pool))
    }

    /// Particles launched since emission was last prepared
    pub fn activated_count(&self) -> u64 {
        self.activated
    }

    pub fn active_count(&self) -> usize {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active_len()
    }

    pub fn pooled_count(&self) -> usize {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .free_len()
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn time_to_live(&self) -> u64 {
        self.time_to_live
    }

    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    pub fn emitter(&self) -> EmitterRect {
        self.emitter
    }

    /// Whether a tick at the current time could still launch particles
    pub fn is_emitting(&self) -> bool {
        self.prepared && self.particles_per_ms > 0.0 && self.emission_open(self.current_time)
    }
}

/// Pull-from-pool sequence: reset, run initializers, place, stamp start
fn launch(
    particle: &mut Particle,
    initializers: &[Box<dyn ParticleInitializer>],
    rng: &mut dyn RngCore,
    emitter: &EmitterRect,
    time_to_live: u64,
    now_ms: u64,
) {
    particle.init();
    for initializer in initializers {
        initializer.init_particle(particle, rng);
    }
    let (x, y) = emitter.sample(rng);
    particle.configure(time_to_live, x, y);
    particle.activate(now_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::view::RedrawFlag;
    use crate::sprite::Sprite;

    fn system(max: usize, ttl: u64) -> (ParticleSystem, Arc<RedrawFlag>) {
        let view = Arc::new(RedrawFlag::new());
        let appearance = Appearance::still(Arc::new(Sprite::soft_dot(2, (255, 255, 255))));
        let system = ParticleSystem::with_seed(view.clone(), max, appearance, ttl, 42);
        (system, view)
    }

    fn assert_conserved(system: &ParticleSystem) {
        assert_eq!(
            system.active_count() + system.pooled_count(),
            system.max_particles()
        );
    }

    #[test]
    fn test_update_before_prepare_fails() {
        let (mut system, _) = system(4, 100);
        assert!(matches!(
            system.on_update(10),
            Err(ParticleError::NotPrepared)
        ));
    }

    #[test]
    fn test_prepare_publishes_handle() {
        let (mut system, view) = system(4, 100);
        assert!(view.particles().is_none());
        system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
        system.on_update(2).unwrap();
        assert!(view.take_dirty());
        assert_eq!(view.particles().unwrap().len(), 2);
    }

    #[test]
    fn test_rate_budget_with_pool_limit() {
        let (mut system, _) = system(5, 50);
        system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
        let stats = system.on_update(3).unwrap();
        assert_eq!(stats.activated, 3);
        assert_eq!(system.activated_count(), 3);

        let stats = system.on_update(10).unwrap();
        assert_eq!(stats.activated, 2);
        assert_eq!(system.pooled_count(), 0);
        assert_conserved(&system);
    }

    #[test]
    fn test_zero_rate_never_emits() {
        let (mut system, _) = system(10, 100);
        system.prepare_emitting(0, Some(EmitterRect::point(0.0, 0.0)));
        for now in [0, 50, 500, 5000] {
            system.on_update(now).unwrap();
            assert_eq!(system.active_count(), 0);
        }
    }

    #[test]
    fn test_empty_pool_is_inert() {
        let (mut system, _) = system(0, 100);
        system.prepare_emitting(1000, None);
        let stats = system.on_update(100).unwrap();
        assert_eq!(stats, TickStats::default());
    }

    #[test]
    fn test_no_catch_up_burst_after_exhaustion() {
        let (mut system, _) = system(2, 10);
        system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
        system.on_update(5).unwrap();
        assert_eq!(system.active_count(), 2);

        // Both expire at t > 15; long gap accrues a large budget
        let stats = system.on_update(100).unwrap();
        assert_eq!(stats.expired, 2);
        // Only one ms worth of emission since the write-off
        let stats = system.on_update(101).unwrap();
        assert_eq!(stats.activated, 1);
        assert_conserved(&system);
    }

    #[test]
    fn test_particles_expire_after_ttl() {
        let (mut system, _) = system(1, 50);
        system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
        system.on_update(1).unwrap();
        system.stop_emitting();
        assert_eq!(system.active_count(), 1);

        system.on_update(51).unwrap();
        assert_eq!(system.active_count(), 1);
        let stats = system.on_update(52).unwrap();
        assert_eq!(stats.expired, 1);
        assert_eq!(system.active_count(), 0);
    }

    #[test]
    fn test_stop_emitting_freezes_count() {
        let (mut system, _) = system(100, 1000);
        system.prepare_emitting(100, Some(EmitterRect::point(0.0, 0.0)));
        system.set_start_time(200);
        system.on_update(200).unwrap();
        let before = system.activated_count();
        assert_eq!(before, 20);

        system.stop_emitting();
        assert!(!system.is_emitting());
        system.on_update(250).unwrap();
        system.on_update(900).unwrap();
        assert_eq!(system.activated_count(), before);
        assert!(system.pooled_count() > 0);
    }

    #[test]
    fn test_emit_for_cuts_off() {
        let (mut system, _) = system(100, 10_000);
        system.emit_for(1000, Some(EmitterRect::point(0.0, 0.0)), 10);
        system.on_update(9).unwrap();
        assert_eq!(system.activated_count(), 9);
        system.on_update(20).unwrap();
        assert_eq!(system.activated_count(), 9);
    }

    #[test]
    fn test_one_shot_launches_immediately() {
        let (mut system, _) = system(8, 100);
        let launched = system.one_shot(Some(EmitterRect::point(3.0, 4.0)), 20);
        assert_eq!(launched, 8);
        let stats = system.on_update(50).unwrap();
        assert_eq!(stats.activated, 0);
        assert_eq!(stats.active, 8);
        system
            .particles()
            .read(|ps| assert!(ps.iter().all(|p| p.position.x == 3.0 && p.position.y == 4.0)));
    }

    #[test]
    fn test_non_monotonic_tick_is_ignored() {
        let (mut system, _) = system(10, 100);
        system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
        system.on_update(5).unwrap();
        let stats = system.on_update(2).unwrap();
        assert_eq!(stats.activated, 0);
        assert_eq!(stats.expired, 0);
        assert_eq!(stats.active, 5);
        assert_conserved(&system);
    }

    #[test]
    fn test_update_emit_point_keeps_live_particles() {
        let (mut system, _) = system(10, 1000);
        system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
        system.on_update(2).unwrap();
        system.update_emit_point(Some(EmitterRect::point(50.0, 50.0)));
        system.update_emit_point(None);
        assert_eq!(system.emitter(), EmitterRect::point(50.0, 50.0));
        system.on_update(3).unwrap();

        let origins = system.particles().snapshot();
        assert_eq!(origins.len(), 3);
        assert_eq!(origins.iter().filter(|p| p.position.x == 50.0).count(), 1);
    }

    #[test]
    fn test_cancel_returns_everything() {
        let (mut system, _) = system(6, 1000);
        system.prepare_emitting(1000, None);
        system.on_update(4).unwrap();
        system.cancel();
        assert_eq!(system.active_count(), 0);
        assert_eq!(system.pooled_count(), 6);
    }

    #[test]
    fn test_fade_out_runs_through_modifiers() {
        let (mut system, _) = system(1, 100);
        system.set_fade_out(50);
        system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
        system.on_update(1).unwrap();
        system.on_update(76).unwrap();
        let alpha = system.particles().read(|ps| ps[0].alpha);
        assert!((alpha as i32 - 127).abs() <= 1, "alpha was {}", alpha);
    }

    #[test]
    fn test_initializers_run_before_configure() {
        let (mut system, _) = system(3, 1000);
        system
            .set_speed_by_components_range(0.1, 0.1, 0.0, 0.0)
            .set_scale_range(2.0, 2.0)
            .set_initial_rotation_range(30.0, 30.0);
        system.prepare_emitting(1000, Some(EmitterRect::point(10.0, 10.0)));
        system.on_update(1).unwrap();
        system.on_update(101).unwrap();
        system.particles().read(|ps| {
            let p = &ps[0];
            assert!((p.position.x - 20.0).abs() < 1e-3);
            assert_eq!(p.scale, 2.0);
            assert_eq!(p.rotation, 30.0);
        });
    }
}
