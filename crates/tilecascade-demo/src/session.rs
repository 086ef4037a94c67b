#![forbid(unsafe_code)]

//! Terminal session guard.
//!
//! Entering the session switches to raw mode, the alternate screen, and
//! mouse capture. Dropping it (or panicking) restores the terminal in the
//! reverse order.

use std::io::{self, Write};
use std::sync::OnceLock;
#[cfg(unix)]
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[derive(Debug)]
pub struct TerminalSession {
    alternate_screen_enabled: bool,
    mouse_enabled: bool,
    #[cfg(unix)]
    terminate: Arc<AtomicBool>,
}

impl TerminalSession {
    /// Enter raw mode, the alternate screen, and mouse capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal refuses any of the modes. Whatever
    /// was already enabled is restored when the partial session drops.
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        crossterm::terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut session = Self {
            alternate_screen_enabled: false,
            mouse_enabled: false,
            #[cfg(unix)]
            terminate: Arc::new(AtomicBool::new(false)),
        };

        #[cfg(unix)]
        for signal in [signal_hook::consts::SIGTERM, signal_hook::consts::SIGHUP] {
            signal_hook::flag::register(signal, Arc::clone(&session.terminate))?;
        }

        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
        session.alternate_screen_enabled = true;

        crossterm::execute!(stdout, crossterm::event::EnableMouseCapture)?;
        session.mouse_enabled = true;

        crossterm::execute!(stdout, crossterm::cursor::Hide)?;
        tracing::info!("alternate screen and mouse capture enabled");

        Ok(session)
    }

    /// Current terminal size (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    /// Whether a termination signal has arrived.
    pub fn terminate_requested(&self) -> bool {
        #[cfg(unix)]
        {
            self.terminate.load(Ordering::Relaxed)
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    fn cleanup(&mut self) {
        let mut stdout = io::stdout();

        if self.mouse_enabled {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
            self.mouse_enabled = false;
        }

        let _ = crossterm::execute!(stdout, crossterm::cursor::Show);

        if self.alternate_screen_enabled {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
        }

        let _ = crossterm::terminal::disable_raw_mode();
        tracing::info!("terminal restored");
        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
    let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
    let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}
