//! Fixed-step tick thread
//!
//! Advances a shared particle system by a constant step of simulation time
//! per wall-clock step. The thread holds only a weak link, so it winds down
//! on its own once every owner of the system is gone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error};

use crate::particles::ParticleSystem;

/// Default tick interval, roughly one frame at 60Hz
pub const DEFAULT_STEP: Duration = Duration::from_millis(16);

pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn the tick thread. Simulation time continues from the system's
    /// current time and advances by `step` per iteration.
    pub fn start(system: &Arc<Mutex<ParticleSystem>>, step: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let weak = Arc::downgrade(system);
        let start_ms = system
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current_time();

        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || run(weak, flag, start_ms, step));
        debug!("ticker started at t={} with step {:?}", start_ms, step);

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Whether the tick thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop ticking and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("ticker thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(system: Weak<Mutex<ParticleSystem>>, stop: Arc<AtomicBool>, start_ms: u64, step: Duration) {
    let step_ms = step.as_millis().max(1) as u64;
    let mut now = start_ms;

    while !stop.load(Ordering::Acquire) {
        let Some(system) = system.upgrade() else {
            debug!("particle system dropped, ticker exiting");
            break;
        };

        let result = system
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_update(now);
        drop(system);

        if let Err(e) = result {
            error!("tick at t={} failed: {}", now, e);
            break;
        }

        now += step_ms;
        thread::sleep(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{Appearance, EmitterRect, RedrawFlag};
    use crate::sprite::Sprite;

    fn shared_system(prepared: bool) -> (Arc<RedrawFlag>, Arc<Mutex<ParticleSystem>>) {
        let view = Arc::new(RedrawFlag::new());
        let sprite = Arc::new(Sprite::solid(1, 1, (255, 255, 255)));
        let mut system = ParticleSystem::with_seed(view.clone(), 50, Appearance::still(sprite), 100, 7);
        if prepared {
            system.prepare_emitting(1000, Some(EmitterRect::point(10.0, 10.0)));
        }
        (view, Arc::new(Mutex::new(system)))
    }

    #[test]
    fn test_ticker_advances_system() {
        let (view, system) = shared_system(true);
        let ticker = Ticker::start(&system, Duration::from_millis(1));
        thread::sleep(Duration::from_millis(50));
        ticker.stop();

        let system = system.lock().unwrap();
        assert!(system.current_time() > 0);
        assert!(system.activated_count() > 0);
        assert!(view.take_dirty());
    }

    #[test]
    fn test_ticker_exits_when_system_dropped() {
        let (_view, system) = shared_system(true);
        let ticker = Ticker::start(&system, Duration::from_millis(1));
        drop(system);
        thread::sleep(Duration::from_millis(50));
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_ticker_exits_when_not_prepared() {
        let (_view, system) = shared_system(false);
        let ticker = Ticker::start(&system, Duration::from_millis(1));
        thread::sleep(Duration::from_millis(50));
        assert!(!ticker.is_running());
        assert_eq!(system.lock().unwrap().current_time(), 0);
    }

    #[test]
    fn test_drop_stops_thread() {
        let (_view, system) = shared_system(true);
        {
            let _ticker = Ticker::start(&system, Duration::from_millis(1));
            thread::sleep(Duration::from_millis(10));
        }
        let frozen = system.lock().unwrap().current_time();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(system.lock().unwrap().current_time(), frozen);
    }
}
