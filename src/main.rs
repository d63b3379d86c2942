//! alarm-dash — a live terminal dashboard for the light-controlled alarm.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────────────────────┐ watch cells ┌──────────┐  draw()  ┌──────────┐
//! │ poll.rs (thread+runtime) │ ──────────► │ cards/   │ ───────► │  ui.rs   │
//! │  sync::start per feed    │             │ app.rs   │          │ (render) │
//! │  CommandRunner tasks     │ ◄────────── │ (state)  │          └──────────┘
//! └──────────────────────────┘  Command    └──────────┘
//!            │      ▲                           ▲
//!            ▼      │ CommandResult (mpsc)      │ handle_key_event()
//!        api/ (HTTP adapter)               ┌──────────┐
//!                                          │ input.rs │
//!                                          └──────────┘
//! ```
//!
//! * **`api/`** — the backend adapter: request builders, the `Transport`
//!   seam and its reqwest implementation, payload decoding.
//! * **`sync/`** — the synchronized state cell and the per-subscription
//!   scheduler that keeps it fresh.
//! * **`command`** — one-shot user actions (set alarm, take image, toggle).
//! * **`poll`** — the dedicated thread hosting the async runtime.
//! * **`cards/`** — what each card polls and how it renders.
//! * **`app`** — focus and command bookkeeping on top of the cards.
//! * **`ui`** — layout: where each card goes.
//! * **`input`** — maps key events to `App` mutations and commands.
//! * **`main`** — wires everything together: parse config, set up logging
//!   and the terminal, and run the event loop.

mod api;
mod app;
mod cards;
mod command;
mod config;
mod error;
mod input;
mod poll;
mod sync;
mod ui;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{ApiClient, HttpTransport};
use app::App;
use cards::Cards;
use command::CommandRunner;
use config::Config;
use poll::PollThread;

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Open the log for appending, so earlier sessions stay readable.
fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Send `tracing` output to the log file; the terminal belongs to the UI.
fn init_logging(config: &Config) -> Result<()> {
    let file = open_log(&config.log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let config = Arc::new(Config::parse());
    init_logging(&config)?;
    info!(api_url = %config.api_url, device = %config.device, "starting");

    // -- backend and background polling -------------------------------------
    let poll = PollThread::spawn()?;
    let runtime = poll.handle().clone();
    let transport = HttpTransport::new(config.timeout()).context("building HTTP client")?;
    let api = ApiClient::new(config.api_url.clone(), Arc::new(transport))?;

    let cards = Cards::mount(&runtime, &api, &config)?;
    let (runner, results) = CommandRunner::new(api, runtime.clone());

    let _detections = cards.detection.feed().reader().on_change(&runtime, |snapshot| {
        if let Some(detection) = &snapshot.value {
            info!(result = %detection.result, time = %detection.time, "detection");
        }
    });

    // -- terminal setup (Drop restores on exit or panic) ---------------------
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(cards);

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain finished commands and take new feed snapshots.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        // 1. Process command results and feed changes
        while let Ok(result) = results.try_recv() {
            app.apply_result(result);
        }
        app.refresh();

        // 2. Render
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // 3. Handle input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = input::handle_key_event(&mut app, key) {
                    runner.dispatch(command);
                }
            }
        }

        if app.quit {
            break;
        }
    }

    info!("shutting down");
    // Cards own the scheduler handles; dropping them cancels every feed
    // before the runtime goes away.
    drop(app);
    drop(guard);
    drop(poll);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn log_file_keeps_previous_sessions() {
        let path = std::env::temp_dir().join(format!("alarm-dash-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        writeln!(open_log(&path).unwrap(), "first session").unwrap();
        writeln!(open_log(&path).unwrap(), "second session").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(contents, "first session\nsecond session\n");
    }

    #[test]
    fn log_file_in_missing_directory_is_an_error() {
        let path = std::env::temp_dir().join("alarm-dash-no-such-dir").join("x.log");
        let err = open_log(&path).unwrap_err();
        assert!(err.to_string().starts_with("opening log file"));
    }
}
