//! sportsview demo host
//!
//! Opens a window with a gauge ring and throws sparks off its rim while the
//! remote link is down. Space toggles emission by hand.

mod fps;
mod window;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use sdl2::keyboard::Keycode;
use sportsview::config::EmitterPreset;
use sportsview::display::{self, PixelBuffer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use sportsview::driver::Ticker;
use sportsview::remote::{LinkStatus, LinkStatusClient};
use sportsview::{Appearance, EmitterRect, ParticleSystem, RedrawFlag, Sprite};

use fps::FpsCounter;
use window::{InputEvent, RenderTarget, Window};

const BACKGROUND: (u8, u8, u8) = (12, 12, 20);
const RING: (u8, u8, u8) = (90, 90, 110);
const SPARK: (u8, u8, u8) = (255, 190, 60);

#[derive(Parser)]
#[command(name = "sportsview", version, about = "Particle emitter demo")]
struct Cli {
    /// Window width
    #[arg(short = 'W', long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Window height
    #[arg(short = 'H', long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Disable VSync for uncapped framerate
    #[arg(long)]
    no_vsync: bool,

    /// Emitter preset JSON (built-in sparks if omitted)
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Simulation step in milliseconds
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// MQTT broker for link status; emission follows the link when set
    #[arg(long)]
    mqtt_host: Option<String>,

    /// MQTT topic for link status
    #[arg(long, default_value_t = LinkStatusClient::default_topic().to_string())]
    mqtt_topic: String,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Gauge ring centered in the window
struct Gauge {
    cx: f32,
    cy: f32,
    radius: f32,
}

impl Gauge {
    fn centered(width: u32, height: u32) -> Self {
        Self {
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
            radius: width.min(height) as f32 * 0.38,
        }
    }

    /// Thin strip just outside the right edge of the ring
    fn rim_emitter(&self) -> EmitterRect {
        let x = self.cx + self.radius;
        EmitterRect::new(x, x + 16.0, self.cy, self.cy)
    }

    fn draw(&self, buffer: &mut PixelBuffer) {
        let (r, g, b) = RING;
        let radius = self.radius as i32;
        for offset in 0..3 {
            buffer.draw_circle(self.cx as i32, self.cy as i32, radius - offset, r, g, b);
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn set_emitting(system: &Mutex<ParticleSystem>, preset: &EmitterPreset, emitting: bool) {
    let mut system = system.lock().unwrap_or_else(PoisonError::into_inner);
    if emitting == system.is_emitting() {
        return;
    }
    if emitting {
        // None keeps the rim emitter set at startup
        preset.start_emitting(&mut system, None);
    } else {
        system.stop_emitting();
    }
    info!("emission {}", if emitting { "on" } else { "off" });
}

fn connect_link(cli: &Cli) -> Option<LinkStatusClient> {
    let host = cli.mqtt_host.as_deref()?;
    match LinkStatusClient::new(host, &cli.mqtt_topic) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("link status unavailable: {}", e);
            None
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let preset = match &cli.preset {
        Some(path) => EmitterPreset::load(path)
            .with_context(|| format!("loading preset {}", path.display()))?,
        None => EmitterPreset::default(),
    };

    let (width, height) = (cli.width, cli.height);
    let (mut window, texture_creator) =
        Window::open("sportsview", width, height, !cli.no_vsync).map_err(anyhow::Error::msg)?;
    let mut target =
        RenderTarget::with_size(&texture_creator, width, height).map_err(anyhow::Error::msg)?;
    let mut buffer = PixelBuffer::with_size(width, height);

    let gauge = Gauge::centered(width, height);
    let view = Arc::new(RedrawFlag::new());
    let sprite = Arc::new(Sprite::soft_dot(4, SPARK));

    let mut system = preset.build(view.clone(), Appearance::still(sprite));
    preset.start_emitting(&mut system, Some(gauge.rim_emitter()));
    let system = Arc::new(Mutex::new(system));

    let ticker = Ticker::start(&system, Duration::from_millis(cli.tick_ms.max(1)));
    let link = connect_link(&cli);

    info!(
        "{}x{}, {} particles, {}/s",
        width, height, preset.max_particles, preset.particles_per_second
    );

    let mut fps_counter = FpsCounter::new(60);
    let mut emitting = true;

    'main: loop {
        fps_counter.tick();

        for event in window.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::Space) => {
                    emitting = !emitting;
                    set_emitting(&system, &preset, emitting);
                }
                InputEvent::KeyDown(Keycode::F) => {
                    info!(
                        "{:.0} fps ({:.1} ms)",
                        fps_counter.avg_fps(),
                        fps_counter.avg_frame_time_ms()
                    );
                }
                InputEvent::KeyDown(_) => {}
            }
        }

        // Sparks fly while the link is down
        if let Some(status) = link.as_ref().and_then(LinkStatusClient::poll) {
            emitting = status == LinkStatus::Disconnected;
            set_emitting(&system, &preset, emitting);
        }

        if view.take_dirty() {
            let (r, g, b) = BACKGROUND;
            buffer.clear(r, g, b);
            gauge.draw(&mut buffer);
            if let Some(particles) = view.particles() {
                display::draw_particles(&mut buffer, &particles);
            }
        }

        window
            .present(&mut target, &buffer)
            .map_err(anyhow::Error::msg)?;
    }

    ticker.stop();
    Ok(())
}
