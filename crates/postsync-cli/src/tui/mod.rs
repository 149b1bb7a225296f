//! postsync TUI
//!
//! Terminal user interface for browsing and adding posts.
//!
//! ## Layout
//!
//! - Top: new-post form (title, body, submit)
//! - Middle: post list
//! - Bottom: status bar with inline errors
//!
//! A failed first load replaces the whole screen with the error.
//!
//! ## Keys
//!
//! - j/k or ↑/↓: Move selection
//! - g/G: Jump to first/last post
//! - r: Refresh the list
//! - i or a: Edit the form
//! - Tab: Switch between title and body (while editing)
//! - Enter: Submit the form (while editing)
//! - Esc: Leave the form
//! - ?: Help
//! - q: Quit

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use postsync_core::{Config, Draft, HttpTransport, SyncCoordinator, SyncError, SyncPhase};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use app::{App, InputMode};

type Coordinator = SyncCoordinator<HttpTransport>;

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    // Initialize TUI logging (file-based, only if POSTSYNC_LOG is set)
    init_tui_logging(&config);

    let mut coordinator = SyncCoordinator::new(std::sync::Arc::new(
        HttpTransport::from_config(&config)?,
    ));

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new();

    // Rejections from spawned operations
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();

    // Start the first load
    spawn_initialize(&coordinator, config.default_limit, notice_tx.clone());

    let result = run_app(
        &mut terminal,
        &mut app,
        &mut coordinator,
        &config,
        notice_tx,
        notice_rx,
    )
    .await;

    // Drop results of anything still in flight
    coordinator.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    coordinator: &mut Coordinator,
    config: &Config,
    notice_tx: mpsc::UnboundedSender<String>,
    mut notice_rx: mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    let mut events = coordinator
        .take_events()
        .ok_or_else(|| anyhow::anyhow!("Coordinator events already taken"))?;
    let mut snapshots = coordinator.subscribe();

    loop {
        // Check for status message timeout
        app.check_status_timeout();

        // Draw UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                app.handle_sync_event(event);
            }

            Ok(()) = snapshots.changed() => {
                let snapshot = snapshots.borrow_and_update().clone();
                app.apply_snapshot(snapshot);
            }

            Some(notice) = notice_rx.recv() => {
                app.set_status(notice);
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                // Check for terminal events (non-blocking)
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        match app.input_mode {
                            InputMode::Normal => {
                                handle_normal_mode(app, coordinator, config, &notice_tx, key.code, key.modifiers);
                            }
                            InputMode::Editing => {
                                handle_editing_mode(app, coordinator, &notice_tx, key.code, key.modifiers);
                            }
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events in normal mode
fn handle_normal_mode(
    app: &mut App,
    coordinator: &Coordinator,
    config: &Config,
    notice_tx: &mpsc::UnboundedSender<String>,
    code: KeyCode,
    modifiers: KeyModifiers,
) {
    match code {
        // Quit
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        // Navigation
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('g') | KeyCode::Home => app.move_to_first(),
        KeyCode::Char('G') | KeyCode::End => app.move_to_last(),

        // Pull-to-refresh
        KeyCode::Char('r') => {
            spawn_refresh(coordinator, config.refresh_limit, notice_tx.clone());
        }

        // Form
        KeyCode::Char('i') | KeyCode::Char('a') => {
            if matches!(app.phase(), SyncPhase::Ready | SyncPhase::Refreshing | SyncPhase::Submitting) {
                app.enter_edit_mode();
            } else {
                app.set_status("Load the list before adding posts");
            }
        }

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

/// Handle key events while editing the form
fn handle_editing_mode(
    app: &mut App,
    coordinator: &Coordinator,
    notice_tx: &mpsc::UnboundedSender<String>,
    code: KeyCode,
    modifiers: KeyModifiers,
) {
    match code {
        KeyCode::Esc => app.exit_edit_mode(),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.exit_edit_mode(),
        KeyCode::Tab | KeyCode::BackTab => app.next_field(),
        KeyCode::Enter => {
            // Button is disabled while a submit is in flight
            if app.is_submitting() {
                return;
            }
            let draft = app.submit_draft();
            spawn_submit(coordinator, draft, notice_tx.clone());
        }
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn spawn_initialize(
    coordinator: &Coordinator,
    limit: u32,
    notice_tx: mpsc::UnboundedSender<String>,
) {
    let coordinator = coordinator.clone();
    tokio::spawn(async move {
        if let Err(e) = coordinator.initialize(limit).await {
            report_rejection(&e, &notice_tx);
        }
    });
}

fn spawn_refresh(coordinator: &Coordinator, limit: u32, notice_tx: mpsc::UnboundedSender<String>) {
    debug!("Refresh requested (limit {})", limit);
    let coordinator = coordinator.clone();
    tokio::spawn(async move {
        if let Err(e) = coordinator.refresh(limit).await {
            report_rejection(&e, &notice_tx);
        }
    });
}

fn spawn_submit(coordinator: &Coordinator, draft: Draft, notice_tx: mpsc::UnboundedSender<String>) {
    debug!("Submit requested");
    let coordinator = coordinator.clone();
    tokio::spawn(async move {
        if let Err(e) = coordinator.submit_draft(&draft).await {
            report_rejection(&e, &notice_tx);
        }
    });
}

/// Forward errors the coordinator does not record as its error state
fn report_rejection(error: &SyncError, notice_tx: &mpsc::UnboundedSender<String>) {
    if matches!(error, SyncError::Transport(_) | SyncError::Closed) {
        return;
    }
    let message = match error.recovery_suggestion() {
        Some(hint) => format!("{} - {}", error, hint),
        None => error.to_string(),
    };
    let _ = notice_tx.send(message);
}

fn init_tui_logging(config: &Config) {
    // Only log if POSTSYNC_LOG is set
    let Ok(log_level) = std::env::var("POSTSYNC_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "postsync_core={},postsync_cli={}",
        log_level, log_level
    ));

    // Initialize file-based logging (ignore error if already initialized)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
