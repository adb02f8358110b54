use async_trait::async_trait;
use dockview_config::DashboardConfig;
use dockview_core::{LaunchError, LogStreamLauncher, LogViewerLauncher};
use dockview_runtime::test_support::{exited, running, MockRuntime};
use dockview_runtime::{ContainerRecord, LogConfig, LogStream};
use dockview_tui::App;
use ratatui::{backend::TestBackend, Terminal};
use std::sync::{Arc, Mutex};

/// Log viewer that records pipelines instead of opening a terminal
#[derive(Default)]
pub struct RecordingViewer {
    pub launched: Mutex<Vec<String>>,
}

#[async_trait]
impl LogViewerLauncher for RecordingViewer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn launch(&self, stream: &LogStream, formatter: &str) -> Result<(), LaunchError> {
        self.launched
            .lock()
            .unwrap()
            .push(stream.piped_through(formatter));
        Ok(())
    }
}

/// App wired to a mock runtime, with handles for inspecting what it did
#[allow(dead_code)]
pub struct TestApp {
    pub app: App,
    pub runtime: MockRuntime,
    pub viewer: Arc<RecordingViewer>,
}

/// Config with a long refresh interval so only explicit refreshes poll
#[allow(dead_code)]
pub fn test_config() -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.refresh.interval_secs = 3600;
    config
}

/// web (running) and db (exited) in "app", cache (running) in "infra"
#[allow(dead_code)]
pub fn sample_containers() -> Vec<ContainerRecord> {
    vec![
        running("web", Some("app")),
        exited("db", Some("app")),
        running("cache", Some("infra")),
    ]
}

/// Build an App over `records` without waiting for the first poll
#[allow(dead_code)]
pub fn new_test_app(records: Vec<ContainerRecord>) -> TestApp {
    let runtime = MockRuntime::with_containers(records);
    let viewer = Arc::new(RecordingViewer::default());
    let shared: Arc<MockRuntime> = Arc::new(runtime.clone());
    let logs = LogStreamLauncher::new(
        shared.clone(),
        viewer.clone(),
        LogConfig::default(),
        "dockview-fmt",
    );
    let app = App::with_log_launcher(shared, &test_config(), logs);
    TestApp {
        app,
        runtime,
        viewer,
    }
}

/// Build an App over `records` and apply the first snapshot
#[allow(dead_code)]
pub async fn test_app(records: Vec<ContainerRecord>) -> TestApp {
    let mut test = new_test_app(records);
    assert!(test.app.next_snapshot().await, "refresh loop stopped");
    test
}

/// Render the app to a TestBackend and capture output as a string
#[allow(dead_code)]
pub fn render_app(app: &mut App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| dockview_tui::ui::draw(frame, app))
        .unwrap();
    let buffer = terminal.backend().buffer().clone();
    buffer_to_string(&buffer)
}

/// Convert a ratatui buffer to a string representation
#[allow(dead_code)]
pub fn buffer_to_string(buffer: &ratatui::buffer::Buffer) -> String {
    let mut output = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            let cell = buffer.get(x, y);
            output.push_str(cell.symbol());
        }
        output.push('\n');
    }
    output
}
