//! Common types for the runtime client

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label compose (and podman-compose) put on every container of a project
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
/// Label older podman-compose releases use instead
pub const PODMAN_COMPOSE_PROJECT_LABEL: &str = "io.podman.compose.project";

/// Container ID wrapper
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// First 12 characters
    pub fn short(&self) -> &str {
        self.0
            .char_indices()
            .nth(12)
            .map_or(self.0.as_str(), |(end, _)| &self.0[..end])
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Project a container belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectLabel {
    /// Started by compose under this project name
    Compose(String),
    /// No project label; grouped under the implicit standalone project
    Standalone,
}

impl ProjectLabel {
    /// Derive the project from a container's labels
    pub fn from_labels(labels: &HashMap<String, String>) -> Self {
        [COMPOSE_PROJECT_LABEL, PODMAN_COMPOSE_PROJECT_LABEL]
            .iter()
            .filter_map(|key| labels.get(*key))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(|value| Self::Compose(value.to_string()))
            .unwrap_or(Self::Standalone)
    }

    pub fn compose(name: impl Into<String>) -> Self {
        Self::Compose(name.into())
    }
}

impl std::fmt::Display for ProjectLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compose(name) => write!(f, "{}", name),
            Self::Standalone => write!(f, "(standalone)"),
        }
    }
}

/// Container runtime kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    Docker,
    Podman,
}

impl RuntimeKind {
    /// Guess the runtime from the executable name, defaulting to docker
    pub fn from_program(program: &str) -> Self {
        let name = std::path::Path::new(program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(program);
        if name.starts_with("podman") {
            Self::Podman
        } else {
            Self::Docker
        }
    }
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Podman => write!(f, "podman"),
        }
    }
}

/// Container status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Running,
    Exited,
    /// Any other runtime state (created, paused, restarting, dead, ...)
    Other(String),
}

impl ContainerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Fall back to the human-readable status column ("Up 3 minutes", "Exited (0) ...")
    pub fn from_status_text(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with("Up") {
            Self::Running
        } else if text.starts_with("Exited") {
            Self::Exited
        } else if text.is_empty() {
            Self::Other("unknown".to_string())
        } else {
            Self::Other(text.to_lowercase())
        }
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Exited => write!(f, "exited"),
            Self::Other(state) => write!(f, "{}", state),
        }
    }
}

impl From<&str> for ContainerStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "running" => Self::Running,
            "exited" => Self::Exited,
            "" => Self::Other("unknown".to_string()),
            other => Self::Other(other.to_string()),
        }
    }
}

/// Mutating command a container can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
}

impl ContainerAction {
    /// Runtime CLI subcommand
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }

    /// "Starting", "Stopping", "Restarting"
    pub fn progressive(&self) -> &'static str {
        match self {
            Self::Start => "Starting",
            Self::Stop => "Stopping",
            Self::Restart => "Restarting",
        }
    }

    /// "started", "stopped", "restarted"
    pub fn past(&self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
        }
    }
}

impl std::fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_arg())
    }
}

/// One container as seen by a single poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub name: String,
    pub project: ProjectLabel,
    pub status: ContainerStatus,
    /// Human-readable status from the runtime, e.g. "Up 3 minutes"
    pub status_text: String,
    pub image: String,
    /// Published host ports, sorted and deduplicated
    pub ports: Vec<u16>,
    pub labels: HashMap<String, String>,
}

impl ContainerRecord {
    /// Host ports joined for display, or "-" when nothing is published
    pub fn ports_display(&self) -> String {
        if self.ports.is_empty() {
            "-".to_string()
        } else {
            self.ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Follow log output
    pub follow: bool,
    /// Number of lines from end to show
    pub tail: Option<u64>,
    /// Show timestamps
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            follow: true,
            tail: Some(200),
            timestamps: false,
        }
    }
}

/// A continuous log stream, described as the runtime invocation that produces it
///
/// The stream is consumed by whatever runs the command (usually an external
/// terminal), so it is handed over as a program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStream {
    pub container: ContainerId,
    pub program: String,
    pub args: Vec<String>,
}

impl LogStream {
    /// Shell-quoted command line, suitable for `sh -c`
    pub fn command_line(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }

    /// Command line with stderr merged and piped through `formatter`
    pub fn piped_through(&self, formatter: &str) -> String {
        if formatter.trim().is_empty() {
            format!("{} 2>&1", self.command_line())
        } else {
            format!("{} 2>&1 | {}", self.command_line(), formatter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_project_label_from_compose_label() {
        let project = ProjectLabel::from_labels(&labels(&[(COMPOSE_PROJECT_LABEL, "app")]));
        assert_eq!(project, ProjectLabel::compose("app"));
        assert_eq!(project.to_string(), "app");
    }

    #[test]
    fn test_project_label_podman_fallback() {
        let project =
            ProjectLabel::from_labels(&labels(&[(PODMAN_COMPOSE_PROJECT_LABEL, "infra")]));
        assert_eq!(project, ProjectLabel::compose("infra"));
    }

    #[test]
    fn test_project_label_missing_or_empty_is_standalone() {
        assert_eq!(ProjectLabel::from_labels(&HashMap::new()), ProjectLabel::Standalone);
        let empty = labels(&[(COMPOSE_PROJECT_LABEL, "  ")]);
        assert_eq!(ProjectLabel::from_labels(&empty), ProjectLabel::Standalone);
        assert_eq!(ProjectLabel::Standalone.to_string(), "(standalone)");
    }

    #[test]
    fn test_container_status_from_str() {
        assert_eq!(ContainerStatus::from("running"), ContainerStatus::Running);
        assert_eq!(ContainerStatus::from("Exited"), ContainerStatus::Exited);
        assert_eq!(
            ContainerStatus::from("paused"),
            ContainerStatus::Other("paused".to_string())
        );
    }

    #[test]
    fn test_container_status_from_status_text() {
        assert_eq!(
            ContainerStatus::from_status_text("Up 3 minutes (healthy)"),
            ContainerStatus::Running
        );
        assert_eq!(
            ContainerStatus::from_status_text("Exited (137) 2 hours ago"),
            ContainerStatus::Exited
        );
        assert_eq!(
            ContainerStatus::from_status_text("Created"),
            ContainerStatus::Other("created".to_string())
        );
    }

    #[test]
    fn test_short_id_cuts_on_char_boundary() {
        assert_eq!(ContainerId::new("0123456789abcdef").short(), "0123456789ab");
        assert_eq!(ContainerId::new("abc").short(), "abc");
        assert_eq!(ContainerId::new("aééééééééééééé").short(), "aééééééééééé");
    }

    #[test]
    fn test_runtime_kind_from_program() {
        assert_eq!(RuntimeKind::from_program("docker"), RuntimeKind::Docker);
        assert_eq!(RuntimeKind::from_program("/usr/bin/podman"), RuntimeKind::Podman);
        assert_eq!(RuntimeKind::from_program("nerdctl"), RuntimeKind::Docker);
    }

    #[test]
    fn test_log_stream_command_line_quotes_args() {
        let stream = LogStream {
            container: ContainerId::new("web 1"),
            program: "docker".to_string(),
            args: vec!["logs".into(), "-f".into(), "web 1".into()],
        };
        assert_eq!(stream.command_line(), "docker logs -f 'web 1'");
        assert_eq!(
            stream.piped_through("dockview-fmt"),
            "docker logs -f 'web 1' 2>&1 | dockview-fmt"
        );
        assert_eq!(stream.piped_through(""), "docker logs -f 'web 1' 2>&1");
    }

    #[test]
    fn test_ports_display() {
        let mut record = ContainerRecord {
            id: ContainerId::new("abc"),
            name: "web".into(),
            project: ProjectLabel::Standalone,
            status: ContainerStatus::Running,
            status_text: "Up".into(),
            image: "nginx".into(),
            ports: vec![],
            labels: HashMap::new(),
        };
        assert_eq!(record.ports_display(), "-");
        record.ports = vec![80, 8080];
        assert_eq!(record.ports_display(), "80, 8080");
    }
}
