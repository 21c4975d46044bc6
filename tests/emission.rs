//! End-to-end emission scenarios through the public API

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sportsview::particles::AlphaModifier;
use sportsview::{
    ActiveParticles, Animation, Appearance, EmitterRect, Frame, ParticleError, ParticleSystem,
    ParticleView, Sprite,
};

/// View that counts what the system tells it
#[derive(Default)]
struct CountingView {
    published: Mutex<Option<ActiveParticles>>,
    invalidations: AtomicUsize,
}

impl ParticleView for CountingView {
    fn set_particles(&self, particles: ActiveParticles) {
        *self.published.lock().unwrap() = Some(particles);
    }

    fn post_invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

fn dot() -> Appearance {
    Appearance::still(Arc::new(Sprite::soft_dot(3, (255, 255, 255))))
}

fn new_system(max: usize, ttl: u64) -> (ParticleSystem, Arc<CountingView>) {
    let view = Arc::new(CountingView::default());
    let system = ParticleSystem::with_seed(view.clone(), max, dot(), ttl, 2024);
    (system, view)
}

#[test]
fn test_pool_is_conserved_over_long_run() {
    let (mut system, _view) = new_system(10, 120);
    system.set_speed_range(0.05, 0.2);
    system.prepare_emitting(400, Some(EmitterRect::new(0.0, 50.0, 0.0, 50.0)));

    let mut now = 0;
    while now <= 2000 {
        let stats = system.on_update(now).unwrap();
        assert_eq!(stats.active, system.active_count());
        assert_eq!(system.active_count() + system.pooled_count(), 10);
        now += 7;
    }
}

#[test]
fn test_live_particles_never_outlive_ttl() {
    let (mut system, _view) = new_system(50, 100);
    system.prepare_emitting(500, Some(EmitterRect::point(0.0, 0.0)));

    for now in (0..1000).step_by(13) {
        system.on_update(now).unwrap();
        system.particles().read(|live| {
            for p in live {
                assert!(p.elapsed() <= p.time_to_live());
            }
        });
    }

    system.stop_emitting();
    system.on_update(5000).unwrap();
    assert_eq!(system.active_count(), 0);
    assert_eq!(system.pooled_count(), 50);
}

#[test]
fn test_stop_then_tick_launches_nothing() {
    let (mut system, _view) = new_system(300, 1000);
    system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
    system.on_update(200).unwrap();
    let launched = system.activated_count();
    assert_eq!(launched, 200);

    system.stop_emitting();
    let stats = system.on_update(250).unwrap();
    assert_eq!(stats.activated, 0);
    assert_eq!(system.activated_count(), launched);
    assert!(!system.is_emitting());
}

#[test]
fn test_zero_rate() {
    let (mut system, _view) = new_system(5, 100);
    system.prepare_emitting(0, Some(EmitterRect::point(0.0, 0.0)));
    for now in [0, 10, 1000, 100_000] {
        assert_eq!(system.on_update(now).unwrap().activated, 0);
    }
    assert_eq!(system.active_count(), 0);
}

#[test]
fn test_rate_limited_by_pool() {
    let (mut system, _view) = new_system(5, 1000);
    system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));

    assert_eq!(system.on_update(3).unwrap().activated, 3);
    assert_eq!(system.on_update(10).unwrap().activated, 2);
    assert_eq!(system.active_count(), 5);
    assert_eq!(system.pooled_count(), 0);
}

#[test]
fn test_refill_after_exhaustion_is_paced() {
    let (mut system, _view) = new_system(5, 10);
    system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));

    assert_eq!(system.on_update(10).unwrap().activated, 5);
    let stats = system.on_update(21).unwrap();
    assert_eq!(stats.activated, 0);
    assert_eq!(stats.expired, 5);

    // Owed launches from the dry spell are not replayed
    assert_eq!(system.on_update(22).unwrap().activated, 1);
}

#[test]
fn test_wrapping_angle_range_heads_right() {
    let (mut system, _view) = new_system(200, 1000);
    system.set_speed_module_and_angle_range(0.1, 0.1, 270.0, 90.0);
    system.one_shot(Some(EmitterRect::point(0.0, 0.0)), 200);

    let live = system.particles().snapshot();
    assert_eq!(live.len(), 200);
    let mut saw_up = false;
    let mut saw_down = false;
    for p in &live {
        assert!(p.velocity.x >= -1e-6, "velocity {:?} points left", p.velocity);
        saw_up |= p.velocity.y < -0.05;
        saw_down |= p.velocity.y > 0.05;
    }
    assert!(saw_up && saw_down);
}

#[test]
fn test_fade_is_idempotent_at_same_time() {
    let (mut system, _view) = new_system(1, 200);
    system.set_fade_out(100);
    system.one_shot(Some(EmitterRect::point(0.0, 0.0)), 1);

    system.on_update(150).unwrap();
    let first = system.particles().snapshot()[0].alpha;
    system.on_update(150).unwrap();
    let second = system.particles().snapshot()[0].alpha;

    assert_eq!(first, second);
    assert!((first as i32 - 128).abs() <= 1);
}

#[test]
fn test_custom_modifier_window() {
    let (mut system, _view) = new_system(1, 1000);
    system.add_modifier(AlphaModifier::new(0, 255, 0, 100));
    system.one_shot(Some(EmitterRect::point(0.0, 0.0)), 1);

    system.on_update(0).unwrap();
    assert_eq!(system.particles().snapshot()[0].alpha, 0);
    system.on_update(500).unwrap();
    assert_eq!(system.particles().snapshot()[0].alpha, 255);
}

#[test]
fn test_motion_is_closed_form() {
    let (mut system, _view) = new_system(1, 1000);
    system.set_speed_by_components_range(0.1, 0.1, 0.0, 0.0);
    system.set_acceleration(0.001, 90.0);
    system.set_rotation_speed(180.0);
    system.one_shot(Some(EmitterRect::point(10.0, 20.0)), 1);

    // Irregular steps land on the same state as one big step
    for now in [3, 17, 40, 81, 100] {
        system.on_update(now).unwrap();
    }
    let p = &system.particles().snapshot()[0];
    assert!((p.position.x - 20.0).abs() < 1e-3);
    assert!((p.position.y - 25.0).abs() < 1e-3);
    assert!((p.rotation - 18.0).abs() < 1e-3);
}

#[test]
fn test_one_shot_animation_expires_particle() {
    let frame = |shade| Frame {
        sprite: Arc::new(Sprite::solid(2, 2, (shade, shade, shade))),
        duration_ms: 50,
    };
    let animation = Animation::new(vec![frame(100), frame(200)]).unwrap().once();

    let view = Arc::new(CountingView::default());
    let mut system =
        ParticleSystem::with_seed(view, 3, Appearance::animated(Arc::new(animation)), 1000, 1);
    system.one_shot(Some(EmitterRect::point(0.0, 0.0)), 3);

    system.on_update(60).unwrap();
    let shown = system.particles().read(|live| {
        live.iter()
            .map(|p| match p.appearance() {
                Appearance::Animated { frame, .. } => *frame,
                Appearance::Still(_) => usize::MAX,
            })
            .collect::<Vec<_>>()
    });
    assert_eq!(shown, vec![1, 1, 1]);

    let stats = system.on_update(100).unwrap();
    assert_eq!(stats.expired, 3);
    assert_eq!(system.pooled_count(), 3);
}

#[test]
fn test_view_contract() {
    let (mut system, view) = new_system(5, 100);
    assert!(matches!(system.on_update(0), Err(ParticleError::NotPrepared)));
    assert!(view.published.lock().unwrap().is_none());

    system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
    let published = view.published.lock().unwrap().clone().unwrap();

    system.on_update(4).unwrap();
    system.on_update(8).unwrap();
    assert_eq!(view.invalidations.load(Ordering::SeqCst), 2);
    // Same pool the system mutates
    assert_eq!(published.len(), system.active_count());
}

#[test]
fn test_backwards_tick_is_ignored() {
    let (mut system, _view) = new_system(20, 1000);
    system.prepare_emitting(1000, Some(EmitterRect::point(0.0, 0.0)));
    system.on_update(10).unwrap();
    let before = system.activated_count();

    let stats = system.on_update(5).unwrap();
    assert_eq!(stats.activated, 0);
    assert_eq!(system.activated_count(), before);
    assert_eq!(system.current_time(), 10);
}
