//! Terminal dashboard for dockview
//!
//! Built with Ratatui. Shows local containers grouped by compose project and
//! drives start/stop/restart and log viewing from the keyboard.

pub mod app;
mod event;
pub mod input;
pub mod ui;

pub use app::{App, AppError, AppResult, StatusMessage, TaskResult};
pub use event::{Event, EventHandler};
pub use input::{Command, KeySequencer};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dockview_config::DashboardConfig;
use dockview_runtime::ContainerRuntime;
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;

/// Run the dashboard until the user quits
pub async fn run(runtime: Arc<dyn ContainerRuntime>, config: &DashboardConfig) -> AppResult<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run
    let mut app = App::new(runtime, config);
    let res = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}
