//! Dashboard state and event loop

use crate::event::{Event, EventHandler};
use crate::input::{Command, KeySequencer};
use crate::ui;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dockview_config::DashboardConfig;
use dockview_core::{
    ActionDispatcher, ActionResult, BatchResult, Cursor, LaunchError, LogStreamLauncher,
    Published, RefreshHandle, RefreshLoop, RefreshRequest, RowFilter, SnapshotReceiver,
};
use dockview_runtime::{ContainerAction, ContainerRecord, ContainerRuntime, RuntimeKind};
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// How long a status message stays in the footer
const STATUS_TTL: Duration = Duration::from_secs(5);

const TICK_RATE: Duration = Duration::from_millis(100);

/// Outcome of work that ran off the UI loop
#[derive(Debug)]
pub enum TaskResult {
    Action(ActionResult),
    Batch(BatchResult),
    Logs {
        name: String,
        result: Result<(), LaunchError>,
    },
}

/// Transient footer message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    set_at: Instant,
}

/// Application state
///
/// Owned by the UI loop. Container state is only ever read from the latest
/// published snapshot; actions report back through `TaskResult`s.
pub struct App {
    /// Runtime shown in the header
    pub runtime_kind: RuntimeKind,
    /// Latest state from the refresh loop
    pub published: Published,
    /// Highlighted container
    pub cursor: Cursor,
    /// Pending multi-key sequence
    pub keys: KeySequencer,
    /// Include stopped containers in the list
    pub show_stopped: bool,
    /// Help overlay visible
    pub show_help: bool,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
    /// Actions and log launches not yet reported back
    pub pending_tasks: usize,
    /// Table widget state (selected display line, scroll offset)
    pub table_state: TableState,
    snapshots: SnapshotReceiver,
    refresh_alive: bool,
    refresh: RefreshHandle,
    dispatcher: ActionDispatcher,
    logs: Arc<LogStreamLauncher>,
    results_tx: mpsc::UnboundedSender<TaskResult>,
    results_rx: mpsc::UnboundedReceiver<TaskResult>,
}

impl App {
    /// Create the dashboard and start polling `runtime` in the background
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: &DashboardConfig) -> Self {
        let logs = LogStreamLauncher::from_config(runtime.clone(), &config.logs);
        Self::with_log_launcher(runtime, config, logs)
    }

    /// Like `new`, with an explicit log launcher
    pub fn with_log_launcher(
        runtime: Arc<dyn ContainerRuntime>,
        config: &DashboardConfig,
        logs: LogStreamLauncher,
    ) -> Self {
        let (refresh, snapshots) =
            RefreshLoop::new(runtime.clone(), config.refresh.interval()).spawn();
        let dispatcher = ActionDispatcher::new(
            runtime.clone(),
            snapshots.clone(),
            config.actions.batch_concurrency,
        );
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let published = snapshots.borrow().clone();

        tracing::debug!(
            "Dashboard started: interval={}s, batch concurrency={}, log viewer={}",
            config.refresh.interval_secs,
            config.actions.batch_concurrency,
            logs.viewer_name()
        );

        Self {
            runtime_kind: runtime.kind(),
            published,
            cursor: Cursor::new(),
            keys: KeySequencer::new(config.keys.sequence_timeout()),
            show_stopped: config.ui.show_stopped,
            show_help: false,
            status: None,
            should_quit: false,
            pending_tasks: 0,
            table_state: TableState::default(),
            snapshots,
            refresh_alive: true,
            refresh,
            dispatcher,
            logs: Arc::new(logs),
            results_tx,
            results_rx,
        }
    }

    /// Run the application main loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> AppResult<()> {
        let mut events = EventHandler::new(TICK_RATE);

        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;

            tokio::select! {
                event = events.next() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                changed = self.snapshots.changed(), if self.refresh_alive => {
                    if changed.is_ok() {
                        self.apply_snapshot();
                    } else {
                        tracing::warn!("Refresh loop stopped");
                        self.refresh_alive = false;
                        self.set_error("Background refresh stopped");
                    }
                }
                Some(result) = self.results_rx.recv() => self.handle_task_result(result),
            }
        }

        // In-flight actions are left to finish on their own
        self.refresh.shutdown();
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key, Instant::now()),
            Event::Tick => {
                let now = Instant::now();
                self.keys.expire(now);
                self.expire_status(now);
            }
            Event::Resize(_, _) => {
                // Terminal will redraw automatically
            }
        }
    }

    /// Feed a key press as if typed now
    pub fn send_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        self.handle_key(KeyEvent::new(code, modifiers), Instant::now());
    }

    /// Feed a key press observed at `now`
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let command = self.keys.feed(key, now);

        // Any key closes help; only quit still acts
        if self.show_help && key.kind != KeyEventKind::Release {
            self.keys.reset();
            self.show_help = false;
            if command == Some(Command::Quit) {
                self.should_quit = true;
            }
            return;
        }

        if let Some(command) = command {
            self.handle_command(command);
        }
    }

    pub fn handle_command(&mut self, command: Command) {
        tracing::trace!("Command: {:?}", command);
        match command {
            Command::NavigateUp => self.navigate(|cursor, rows| cursor.move_by(rows, -1)),
            Command::NavigateDown => self.navigate(|cursor, rows| cursor.move_by(rows, 1)),
            Command::JumpTop => self.navigate(|cursor, rows| cursor.first(rows)),
            Command::JumpBottom => self.navigate(|cursor, rows| cursor.last(rows)),
            Command::Start => self.spawn_action(ContainerAction::Start),
            Command::Stop => self.spawn_action(ContainerAction::Stop),
            Command::Restart => self.spawn_action(ContainerAction::Restart),
            Command::StartAll => self.spawn_batch(ContainerAction::Start),
            Command::StopAll => self.spawn_batch(ContainerAction::Stop),
            Command::RestartAll => self.spawn_batch(ContainerAction::Restart),
            Command::OpenLogs => self.spawn_open_logs(),
            Command::ForceRefresh => match self.refresh.request() {
                RefreshRequest::Scheduled => self.set_status("Refreshing..."),
                RefreshRequest::Coalesced => self.set_status("Refresh already in progress"),
            },
            Command::ToggleStopped => {
                self.show_stopped = !self.show_stopped;
                self.reconcile_cursor();
                if self.show_stopped {
                    self.set_status("Showing all containers");
                } else {
                    self.set_status("Hiding stopped containers");
                }
            }
            Command::ToggleHelp => self.show_help = !self.show_help,
            Command::Quit => self.should_quit = true,
        }
    }

    /// Take the latest published state and re-anchor the cursor on it
    pub fn apply_snapshot(&mut self) {
        let published = self.snapshots.borrow_and_update().clone();
        tracing::trace!(
            "Applying snapshot generation {} ({} containers)",
            published.generation,
            published.snapshot.container_count()
        );
        self.published = published;
        self.reconcile_cursor();
    }

    /// Wait for the refresh loop to publish, then apply it.
    /// Returns false once the loop has stopped.
    pub async fn next_snapshot(&mut self) -> bool {
        if self.snapshots.changed().await.is_err() {
            return false;
        }
        self.apply_snapshot();
        true
    }

    /// Wait for one background task to report back, then handle it
    pub async fn next_task_result(&mut self) -> bool {
        match self.results_rx.recv().await {
            Some(result) => {
                self.handle_task_result(result);
                true
            }
            None => false,
        }
    }

    pub fn handle_task_result(&mut self, result: TaskResult) {
        self.pending_tasks = self.pending_tasks.saturating_sub(1);
        match result {
            TaskResult::Action(result) => {
                if result.is_success() {
                    self.set_status(result.message());
                } else {
                    self.set_error(result.message());
                }
                self.refresh.request();
            }
            TaskResult::Batch(batch) => {
                if batch.failures().next().is_none() {
                    self.set_status(batch.message());
                } else {
                    self.set_error(batch.message());
                }
                self.refresh.request();
            }
            TaskResult::Logs { name, result } => match result {
                Ok(()) => self.set_status(format!("Opened logs for {}", name)),
                Err(e) => {
                    tracing::warn!("Could not open logs for {}: {}", name, e);
                    self.set_error(format!("Could not open logs for {}: {}", name, e));
                }
            },
        }
    }

    pub fn row_filter(&self) -> RowFilter {
        if self.show_stopped {
            RowFilter::All
        } else {
            RowFilter::RunningOnly
        }
    }

    /// Record of the highlighted container in the current snapshot
    pub fn selected_container(&self) -> Option<&ContainerRecord> {
        let id = self.cursor.selected_id()?;
        self.published.snapshot.find(id)
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            set_at: Instant::now(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
            set_at: Instant::now(),
        });
    }

    fn expire_status(&mut self, now: Instant) {
        if let Some(status) = &self.status {
            if now.duration_since(status.set_at) >= STATUS_TTL {
                self.status = None;
            }
        }
    }

    fn navigate(&mut self, step: impl FnOnce(&mut Cursor, &[dockview_core::Row<'_>])) {
        let snapshot = self.published.snapshot.clone();
        let rows = snapshot.rows(self.row_filter());
        step(&mut self.cursor, &rows);
    }

    fn reconcile_cursor(&mut self) {
        self.navigate(|cursor, rows| cursor.reconcile(rows));
    }

    fn spawn_action(&mut self, action: ContainerAction) {
        let Some((id, name)) = self
            .selected_container()
            .map(|c| (c.id.clone(), c.name.clone()))
        else {
            self.set_error("No container selected");
            return;
        };

        self.set_status(format!("{} {}...", action.progressive(), name));
        self.pending_tasks += 1;
        let dispatcher = self.dispatcher.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = dispatcher.dispatch(&id, action).await;
            let _ = tx.send(TaskResult::Action(result));
        });
    }

    fn spawn_batch(&mut self, action: ContainerAction) {
        let Some(project) = self.cursor.selected_project().cloned() else {
            self.set_error("No project selected");
            return;
        };

        self.set_status(format!(
            "{} all containers in {}...",
            action.progressive(),
            project
        ));
        self.pending_tasks += 1;
        let dispatcher = self.dispatcher.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let batch = dispatcher.dispatch_all(&project, action).await;
            let _ = tx.send(TaskResult::Batch(batch));
        });
    }

    fn spawn_open_logs(&mut self) {
        let Some((id, name)) = self
            .selected_container()
            .map(|c| (c.id.clone(), c.name.clone()))
        else {
            self.set_error("No container selected");
            return;
        };

        self.set_status(format!("Opening logs for {}...", name));
        self.pending_tasks += 1;
        let logs = self.logs.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = logs.open_logs(&id).await;
            let _ = tx.send(TaskResult::Logs { name, result });
        });
    }
}
