//! trialscope - Terminal dashboard for a pre-computed clinical-trial pipeline.
//!
//! Loads a static JSON dataset produced by an offline process and lets the
//! user filter it by sponsor, indication, domain area, role, and free text,
//! viewing the result as a card grid or a fixed-window Gantt timeline.

mod app;
mod data;
mod filter;
mod models;
mod theme;
mod timeline;
mod ui;

use std::io::{self, stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use app::App;
use data::{DataClient, DataCommand, DataMessage};

/// Frame rate for the event loop (approximately 30 FPS)
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install().ok();

    // The dataset source is the only argument: an http(s) URL or a file path
    let args: Vec<String> = std::env::args().collect();
    let source = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or(data::DEFAULT_SOURCE);

    run_tui(source).await
}

/// Run the TUI application
async fn run_tui(source: &str) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Create communication channels
    let (data_tx, mut data_rx) = mpsc::channel::<DataMessage>(8);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<DataCommand>(8);

    // Create the loader and spawn the worker task
    let client = DataClient::new(source)?;
    let worker = tokio::spawn(async move { run_data_worker(client, data_tx, &mut cmd_rx).await });

    // Kick off the one-time load
    cmd_tx.send(DataCommand::Reload).await.ok();

    // Create application state
    let mut app = App::new();

    // Main event loop
    let result = run_event_loop(&mut terminal, &mut app, &mut data_rx, &cmd_tx).await;

    // Cleanup
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    worker.abort();

    result
}

/// Run the dataset loader worker task
async fn run_data_worker(
    client: DataClient,
    tx: mpsc::Sender<DataMessage>,
    rx: &mut mpsc::Receiver<DataCommand>,
) {
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                match cmd {
                    DataCommand::Reload => {
                        match client.fetch_dataset().await {
                            Ok(dataset) => {
                                tx.send(DataMessage::DatasetLoaded(dataset)).await.ok();
                            }
                            Err(e) => {
                                tx.send(DataMessage::Error(format!("{:#}", e))).await.ok();
                            }
                        }
                    }
                    DataCommand::Shutdown => {
                        break;
                    }
                }
            }
        }
    }
}

/// Run the main event loop
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    data_rx: &mut mpsc::Receiver<DataMessage>,
    cmd_tx: &mpsc::Sender<DataCommand>,
) -> Result<()> {
    loop {
        // Per-frame housekeeping
        app.tick();

        // Render the UI
        terminal.draw(|frame| ui::render(frame, app))?;

        // Check for loader messages (non-blocking)
        while let Ok(msg) = data_rx.try_recv() {
            app.handle_data_message(msg);
        }

        // Handle input events with timeout so the loop keeps ticking
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = app.handle_key(key) {
                        cmd_tx.send(cmd).await.ok();
                    }
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
