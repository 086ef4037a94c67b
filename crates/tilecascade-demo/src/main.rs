#![forbid(unsafe_code)]

//! Terminal demo for the cascade tile grid.
//!
//! Keys: `c` cascade, `r` reset, `m` toggle reduced motion, `b` toggle the
//! back art, arrows move the keyboard focus, Enter/Space activate the
//! focused tile, `q` quits. Moving the mouse across tiles flips them.
//!
//! # Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `TILECASCADE_SEED` | Fixed cascade seed (u64). |
//! | `TILECASCADE_REDUCED_MOTION` | Start with reduced motion enabled. |
//! | `TILECASCADE_LOG_FILE` | Write logs to this file. No logging without it. |
//! | `TILECASCADE_LOG` | `EnvFilter` directives, default `info`. |

mod app;
mod render;
mod session;

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tilecascade_core::motion::{EnvMotionPreference, MotionPreference, MotionToggle};
use tilecascade_grid::{GridConfig, LayoutConfig};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::session::TerminalSession;

const SEED_ENV: &str = "TILECASCADE_SEED";
const LOG_ENV: &str = "TILECASCADE_LOG";
const LOG_FILE_ENV: &str = "TILECASCADE_LOG_FILE";

const FRAME: Duration = Duration::from_millis(33);

/// Preferred tile edge in terminal columns.
const TILE_CELLS: f64 = 12.0;

fn init_logging() -> io::Result<()> {
    let Some(path) = std::env::var_os(LOG_FILE_ENV) else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(io::Error::other)
}

fn grid_config() -> GridConfig {
    let config = GridConfig::default()
        .with_layout(LayoutConfig::default().with_target_tile(TILE_CELLS));
    match std::env::var(SEED_ENV).ok().map(|raw| raw.trim().parse::<u64>()) {
        Some(Ok(seed)) => config.with_seed(seed),
        Some(Err(err)) => {
            tracing::warn!(%err, "ignoring malformed {SEED_ENV}");
            config
        }
        None => config,
    }
}

fn run() -> io::Result<()> {
    init_logging()?;

    let session = TerminalSession::enter()?;
    let motion = MotionToggle::new(EnvMotionPreference::detect().reduced_motion());
    let mut app = App::new(grid_config(), session.size()?, motion);
    tracing::info!(size = ?app.size(), layout = ?app.grid().layout(), "demo started");

    let mut stdout = io::BufWriter::new(io::stdout());
    let mut last = Instant::now();
    while !app.should_quit() && !session.terminate_requested() {
        render::draw(&mut stdout, app.grid(), app.size(), &app.hud())?;

        let deadline = last + FRAME;
        while let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            if !crossterm::event::poll(wait)? {
                break;
            }
            let event = crossterm::event::read()?;
            app.handle_event(event, Instant::now());
        }

        let now = Instant::now();
        app.tick(now.saturating_duration_since(last), now);
        last = now;
    }

    tracing::info!("demo exiting");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("tilecascade-demo: {err}");
        std::process::exit(1);
    }
}
