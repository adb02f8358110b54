//! Opening live container logs in a separate viewer
//!
//! The dashboard never renders log lines itself. It resolves the container,
//! asks the runtime for the follow-mode log command, and hands the resulting
//! pipeline to a viewer (an iTerm2 tab, or any terminal emulator command).

use crate::error::LaunchError;
use async_trait::async_trait;
use dockview_config::{LauncherKind, LogsConfig};
use dockview_runtime::{ContainerId, ContainerRuntime, LogConfig, LogStream, RuntimeError};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Something that can display a continuous log pipeline
#[async_trait]
pub trait LogViewerLauncher: Send + Sync {
    fn name(&self) -> &str;

    /// Start showing `stream`, piped through `formatter`, and return once it is handed off
    async fn launch(&self, stream: &LogStream, formatter: &str) -> Result<(), LaunchError>;
}

/// Opens a new iTerm2 tab through osascript
pub struct ITermLauncher;

impl ITermLauncher {
    fn script(pipeline: &str) -> String {
        format!(
            r#"tell application "iTerm"
    activate
    if (count of windows) = 0 then
        create window with default profile
    else
        tell current window to create tab with default profile
    end if
    tell current session of current window to write text "{}"
end tell"#,
            applescript_escape(pipeline)
        )
    }
}

#[async_trait]
impl LogViewerLauncher for ITermLauncher {
    fn name(&self) -> &str {
        "iterm"
    }

    async fn launch(&self, stream: &LogStream, formatter: &str) -> Result<(), LaunchError> {
        let pipeline = stream.piped_through(formatter);
        tracing::debug!("Opening iTerm2 tab: {}", pipeline);

        let output = Command::new("osascript")
            .arg("-e")
            .arg(Self::script(&pipeline))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| LaunchError::Spawn(format!("osascript: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(LaunchError::Spawn(format!("osascript: {}", stderr)));
        }
        Ok(())
    }
}

/// Runs a configured terminal emulator with the pipeline as its last argument,
/// e.g. `["wezterm", "start", "--", "sh", "-c"]`
pub struct TerminalCommandLauncher {
    command: Vec<String>,
}

impl TerminalCommandLauncher {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Full argv for a pipeline
    pub fn argv(&self, pipeline: &str) -> Vec<String> {
        let mut argv = self.command.clone();
        argv.push(pipeline.to_string());
        argv
    }
}

#[async_trait]
impl LogViewerLauncher for TerminalCommandLauncher {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn launch(&self, stream: &LogStream, formatter: &str) -> Result<(), LaunchError> {
        let argv = self.argv(&stream.piped_through(formatter));
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| LaunchError::NoViewer("logs.terminal_command is empty".to_string()))?;
        tracing::debug!("Spawning log terminal: {:?}", argv);

        // The terminal outlives this call; it is not waited on.
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LaunchError::Spawn(format!("{}: {}", program, e)))?;
        Ok(())
    }
}

/// Used when no viewer is configured or usable on this platform
pub struct UnavailableLauncher {
    reason: String,
}

impl UnavailableLauncher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LogViewerLauncher for UnavailableLauncher {
    fn name(&self) -> &str {
        "none"
    }

    async fn launch(&self, _stream: &LogStream, _formatter: &str) -> Result<(), LaunchError> {
        Err(LaunchError::NoViewer(self.reason.clone()))
    }
}

/// Pick the viewer described by the configuration
pub fn launcher_from_config(config: &LogsConfig) -> Arc<dyn LogViewerLauncher> {
    match config.launcher {
        LauncherKind::Iterm => Arc::new(ITermLauncher),
        LauncherKind::Terminal if !config.terminal_command.is_empty() => {
            Arc::new(TerminalCommandLauncher::new(config.terminal_command.clone()))
        }
        LauncherKind::Terminal => Arc::new(UnavailableLauncher::new(
            "logs.launcher is \"terminal\" but logs.terminal_command is empty",
        )),
        LauncherKind::None => Arc::new(UnavailableLauncher::new("log viewing is disabled")),
        LauncherKind::Auto => {
            if cfg!(target_os = "macos") {
                Arc::new(ITermLauncher)
            } else if !config.terminal_command.is_empty() {
                Arc::new(TerminalCommandLauncher::new(config.terminal_command.clone()))
            } else {
                Arc::new(UnavailableLauncher::new(
                    "set logs.terminal_command to open logs on this platform",
                ))
            }
        }
    }
}

/// Opens the live log stream of a container in the configured viewer
pub struct LogStreamLauncher {
    runtime: Arc<dyn ContainerRuntime>,
    viewer: Arc<dyn LogViewerLauncher>,
    log_config: LogConfig,
    formatter: String,
}

impl LogStreamLauncher {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        viewer: Arc<dyn LogViewerLauncher>,
        log_config: LogConfig,
        formatter: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            viewer,
            log_config,
            formatter: formatter.into(),
        }
    }

    pub fn from_config(runtime: Arc<dyn ContainerRuntime>, config: &LogsConfig) -> Self {
        let log_config = LogConfig {
            tail: Some(config.tail),
            ..LogConfig::default()
        };
        Self::new(
            runtime,
            launcher_from_config(config),
            log_config,
            config.formatter.clone(),
        )
    }

    pub fn viewer_name(&self) -> &str {
        self.viewer.name()
    }

    /// Resolve `id` against the runtime and open its log stream.
    ///
    /// A container that no longer exists yields `ContainerGone` and nothing is launched.
    pub async fn open_logs(&self, id: &ContainerId) -> Result<(), LaunchError> {
        let resolved = match self.runtime.resolve(id).await {
            Ok(resolved) => resolved,
            Err(RuntimeError::ContainerNotFound(_)) => {
                return Err(LaunchError::ContainerGone(id.short().to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let stream = self.runtime.log_stream(&resolved, &self.log_config);
        tracing::info!(
            "Opening logs for {} via {}",
            resolved.short(),
            self.viewer.name()
        );
        self.viewer.launch(&stream, &self.formatter).await
    }
}

/// Escape a string for use inside an AppleScript string literal
fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockview_runtime::test_support::{MockCall, MockRuntime};
    use std::sync::Mutex;

    /// Records launched pipelines instead of opening anything
    #[derive(Default)]
    struct RecordingLauncher {
        launched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LogViewerLauncher for RecordingLauncher {
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

    fn launcher(mock: &MockRuntime, viewer: Arc<RecordingLauncher>) -> LogStreamLauncher {
        LogStreamLauncher::new(
            Arc::new(mock.clone()),
            viewer,
            LogConfig::default(),
            "dockview-fmt",
        )
    }

    #[tokio::test]
    async fn test_open_logs_hands_pipeline_to_viewer() {
        let mock = MockRuntime::new();
        let viewer = Arc::new(RecordingLauncher::default());

        launcher(&mock, viewer.clone())
            .open_logs(&ContainerId::new("web"))
            .await
            .unwrap();

        assert!(mock.was_called(&MockCall::Resolve {
            id: "web".to_string()
        }));
        let launched = viewer.launched.lock().unwrap();
        assert_eq!(
            launched.as_slice(),
            ["docker logs -f --tail=200 web 2>&1 | dockview-fmt"]
        );
    }

    #[tokio::test]
    async fn test_open_logs_for_vanished_container() {
        let mock = MockRuntime::new();
        mock.mark_missing("web");
        let viewer = Arc::new(RecordingLauncher::default());

        let err = launcher(&mock, viewer.clone())
            .open_logs(&ContainerId::new("web"))
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::ContainerGone(ref id) if id == "web"));
        assert!(viewer.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_viewer_reports_reason() {
        let mock = MockRuntime::new();
        let launcher = LogStreamLauncher::new(
            Arc::new(mock),
            Arc::new(UnavailableLauncher::new("log viewing is disabled")),
            LogConfig::default(),
            "dockview-fmt",
        );

        let err = launcher
            .open_logs(&ContainerId::new("web"))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::NoViewer(_)));
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_launcher_from_config() {
        let mut config = LogsConfig {
            launcher: LauncherKind::None,
            ..LogsConfig::default()
        };
        assert_eq!(launcher_from_config(&config).name(), "none");

        config.launcher = LauncherKind::Iterm;
        assert_eq!(launcher_from_config(&config).name(), "iterm");

        config.launcher = LauncherKind::Terminal;
        assert_eq!(launcher_from_config(&config).name(), "none");

        config.terminal_command = vec!["xterm".to_string(), "-e".to_string()];
        assert_eq!(launcher_from_config(&config).name(), "terminal");
    }

    #[test]
    fn test_auto_launcher_without_terminal_command() {
        let config = LogsConfig::default();
        let expected = if cfg!(target_os = "macos") { "iterm" } else { "none" };
        assert_eq!(launcher_from_config(&config).name(), expected);
    }

    #[test]
    fn test_from_config_uses_configured_tail() {
        let mock = MockRuntime::new();
        let config = LogsConfig {
            tail: 50,
            formatter: "jq .".to_string(),
            ..LogsConfig::default()
        };
        let launcher = LogStreamLauncher::from_config(Arc::new(mock), &config);
        assert_eq!(launcher.log_config.tail, Some(50));
        assert!(launcher.log_config.follow);
        assert_eq!(launcher.formatter, "jq .");
    }

    #[test]
    fn test_terminal_argv_appends_pipeline() {
        let launcher =
            TerminalCommandLauncher::new(vec!["wezterm".into(), "start".into(), "--".into()]);
        assert_eq!(
            launcher.argv("docker logs -f web 2>&1 | dockview-fmt"),
            vec!["wezterm", "start", "--", "docker logs -f web 2>&1 | dockview-fmt"]
        );
    }

    #[test]
    fn test_iterm_script_escapes_quotes() {
        let script = ITermLauncher::script(r#"docker logs 'a b' "c" \x"#);
        assert!(script.contains(r#"write text "docker logs 'a b' \"c\" \\x""#));
        assert!(script.starts_with("tell application \"iTerm\""));
    }

    #[test]
    fn test_applescript_escape() {
        assert_eq!(applescript_escape("plain"), "plain");
        assert_eq!(applescript_escape(r#"a"b"#), r#"a\"b"#);
        assert_eq!(applescript_escape(r"a\b"), r"a\\b");
    }
}
