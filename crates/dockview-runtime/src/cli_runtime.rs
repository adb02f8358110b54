//! CLI-based runtime client for Docker and Podman
//!
//! Uses direct CLI commands instead of the API socket, so credentials,
//! contexts and Docker alternatives (Colima, OrbStack, ...) work unchanged.

use crate::{
    ContainerAction, ContainerId, ContainerRecord, ContainerRuntime, ContainerStatus, LogConfig,
    LogStream, ProjectLabel, Result, RuntimeError, RuntimeKind,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;

/// CLI-based runtime client
#[derive(Debug, Clone)]
pub struct CliRuntime {
    /// Command to use ("docker" or "podman")
    cmd: String,
    /// Optional prefix (e.g., ["flatpak-spawn", "--host"] for Toolbox)
    cmd_prefix: Vec<String>,
    kind: RuntimeKind,
}

impl CliRuntime {
    pub fn new(cmd: impl Into<String>, cmd_prefix: Vec<String>) -> Self {
        let cmd = cmd.into();
        let kind = RuntimeKind::from_program(&cmd);
        Self {
            cmd,
            cmd_prefix,
            kind,
        }
    }

    pub fn docker() -> Self {
        Self::new("docker", Vec::new())
    }

    pub fn podman() -> Self {
        Self::new("podman", Vec::new())
    }

    /// Run a command and get its stdout
    async fn run_cmd(&self, args: &[&str]) -> Result<String> {
        let mut cmd = self.build_command();
        cmd.args(args);
        tracing::debug!("Running {} {}", self.cmd, args.join(" "));

        // Not killed on drop: quitting the dashboard must not abort a runtime-side operation.
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RuntimeError::Unavailable(format!("failed to run {}: {}", self.cmd, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(RuntimeError::CommandFailed {
                command: format!("{} {}", self.cmd, args.first().unwrap_or(&"")),
                reason,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Build a command with the correct prefix.
    fn build_command(&self) -> Command {
        if self.cmd_prefix.is_empty() {
            Command::new(&self.cmd)
        } else {
            let mut c = Command::new(&self.cmd_prefix[0]);
            for prefix_arg in &self.cmd_prefix[1..] {
                c.arg(prefix_arg);
            }
            c.arg(&self.cmd);
            c
        }
    }

    /// Program and leading arguments, prefix included
    fn runtime_args(&self) -> (String, Vec<String>) {
        if self.cmd_prefix.is_empty() {
            (self.cmd.clone(), vec![])
        } else {
            let mut args: Vec<String> = self.cmd_prefix[1..].to_vec();
            args.push(self.cmd.clone());
            (self.cmd_prefix[0].clone(), args)
        }
    }
}

#[async_trait]
impl ContainerRuntime for CliRuntime {
    async fn list(&self) -> Result<Vec<ContainerRecord>> {
        let output = self
            .run_cmd(&["ps", "-a", "--no-trunc", "--format", "{{json .}}"])
            .await
            .map_err(|e| match e {
                RuntimeError::CommandFailed { reason, .. } => RuntimeError::Unavailable(reason),
                other => other,
            })?;
        parse_list_output(&output)
    }

    async fn invoke(&self, id: &ContainerId, action: ContainerAction) -> Result<()> {
        self.run_cmd(&[action.as_arg(), &id.0])
            .await
            .map_err(|e| classify_missing(e, id))?;
        Ok(())
    }

    async fn resolve(&self, id: &ContainerId) -> Result<ContainerId> {
        let output = self
            .run_cmd(&["container", "inspect", "--format", "{{.Id}}", &id.0])
            .await
            .map_err(|e| classify_missing(e, id))?;
        let full = output.lines().next().unwrap_or("").trim();
        if full.is_empty() {
            return Err(RuntimeError::ContainerNotFound(id.to_string()));
        }
        Ok(ContainerId::new(full))
    }

    fn log_stream(&self, id: &ContainerId, config: &LogConfig) -> LogStream {
        let (program, mut args) = self.runtime_args();
        args.push("logs".to_string());

        if config.follow {
            args.push("-f".to_string());
        }
        if config.timestamps {
            args.push("-t".to_string());
        }
        if let Some(tail) = config.tail {
            args.push(format!("--tail={}", tail));
        }

        args.push(id.0.clone());

        LogStream {
            container: id.clone(),
            program,
            args,
        }
    }

    async fn ping(&self) -> Result<()> {
        self.run_cmd(&["version"])
            .await
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn kind(&self) -> RuntimeKind {
        self.kind
    }
}

/// Turn "No such container" failures into `ContainerNotFound`
fn classify_missing(err: RuntimeError, id: &ContainerId) -> RuntimeError {
    match err {
        RuntimeError::CommandFailed { ref reason, .. }
            if reason.to_lowercase().contains("no such container")
                || reason.to_lowercase().contains("no container with name or id") =>
        {
            RuntimeError::ContainerNotFound(id.to_string())
        }
        other => other,
    }
}

/// Parse `ps --format {{json .}}` output into records.
///
/// Accepts one JSON object per line (docker, podman) or a single JSON array
/// (podman `--format json`). Records that fail to parse are skipped; an array
/// listing that is not valid JSON as a whole is a `Parse` error.
fn parse_list_output(output: &str) -> Result<Vec<ContainerRecord>> {
    let trimmed = output.trim();
    if trimmed.starts_with('[') {
        let values = serde_json::from_str::<Vec<Value>>(trimmed)
            .map_err(|e| RuntimeError::Parse(format!("container listing: {}", e)))?;
        return Ok(values
            .iter()
            .enumerate()
            .filter_map(|(i, value)| match parse_ps_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping container record #{}: {}", i + 1, e);
                    None
                }
            })
            .collect());
    }

    let mut records = Vec::new();
    for (i, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = serde_json::from_str::<Value>(line)
            .map_err(|e| RuntimeError::Parse(e.to_string()))
            .and_then(|value| parse_ps_value(&value));
        match parsed {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping container record on line {}: {}", i + 1, e),
        }
    }
    Ok(records)
}

/// Parse one `ps` JSON object (docker or podman field layout)
fn parse_ps_value(value: &Value) -> Result<ContainerRecord> {
    let obj = value
        .as_object()
        .ok_or_else(|| RuntimeError::Parse("expected a JSON object".into()))?;

    let id = ["ID", "Id"]
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|id| !id.is_empty())
        .ok_or_else(|| RuntimeError::Parse("record has no ID".into()))?;
    let id = ContainerId::new(id);

    let name = match obj.get("Names") {
        Some(Value::String(names)) => names.split(',').next().unwrap_or("").trim().to_string(),
        Some(Value::Array(names)) => names
            .first()
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        _ => String::new(),
    };
    let name = if name.is_empty() {
        id.short().to_string()
    } else {
        name.trim_start_matches('/').to_string()
    };

    let status_text = string_field(obj, "Status");
    let state = string_field(obj, "State");
    let status = if state.is_empty() {
        ContainerStatus::from_status_text(&status_text)
    } else {
        ContainerStatus::from(state.as_str())
    };

    let labels = match obj.get("Labels") {
        Some(Value::String(s)) => parse_cli_labels(s),
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect(),
        _ => HashMap::new(),
    };

    let ports = match obj.get("Ports") {
        Some(Value::String(s)) => parse_host_ports(s),
        Some(Value::Array(entries)) => parse_podman_ports(entries),
        _ => Vec::new(),
    };

    Ok(ContainerRecord {
        project: ProjectLabel::from_labels(&labels),
        id,
        name,
        status,
        status_text,
        image: string_field(obj, "Image"),
        ports,
        labels,
    })
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Parse CLI labels format "key=value,key2=value2" into HashMap
fn parse_cli_labels(label_str: &str) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    for part in label_str.split(',') {
        if let Some((key, value)) = part.split_once('=') {
            labels.insert(key.to_string(), value.to_string());
        }
    }
    labels
}

/// Extract published host ports from docker's ports column,
/// e.g. "0.0.0.0:8080->80/tcp, :::8080->80/tcp, 443/tcp"
fn parse_host_ports(ports_str: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for entry in ports_str.split(',') {
        let Some((host, _)) = entry.trim().split_once("->") else {
            continue;
        };
        let Some((_, host_port)) = host.rsplit_once(':') else {
            continue;
        };
        push_port_range(&mut ports, host_port);
    }
    ports.sort_unstable();
    ports.dedup();
    ports
}

/// Podman reports ports as objects: {"host_port": 8080, "container_port": 80, "range": 1}
fn parse_podman_ports(entries: &[Value]) -> Vec<u16> {
    let mut ports = Vec::new();
    for entry in entries {
        let Some(host_port) = entry.get("host_port").and_then(Value::as_u64) else {
            continue;
        };
        let range = entry.get("range").and_then(Value::as_u64).unwrap_or(1).max(1);
        for offset in 0..range {
            if let Ok(port) = u16::try_from(host_port + offset) {
                if port != 0 {
                    ports.push(port);
                }
            }
        }
    }
    ports.sort_unstable();
    ports.dedup();
    ports
}

/// Push "8080" or "8000-8002" into `ports`
fn push_port_range(ports: &mut Vec<u16>, spec: &str) {
    match spec.split_once('-') {
        Some((start, end)) => {
            if let (Ok(start), Ok(end)) = (start.parse::<u16>(), end.parse::<u16>()) {
                if start <= end {
                    ports.extend(start..=end);
                }
            }
        }
        None => {
            if let Ok(port) = spec.parse::<u16>() {
                ports.push(port);
            }
        }
    }
}
