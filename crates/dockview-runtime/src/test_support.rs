//! Test support utilities for dockview-runtime
//!
//! Provides MockRuntime and helpers for unit testing the refresh loop,
//! dispatcher and dashboard without requiring a real Docker/Podman runtime.

use crate::*;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records which methods were called on the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    List,
    Invoke { id: String, action: ContainerAction },
    Resolve { id: String },
    Ping,
}

/// Configurable mock runtime for testing
///
/// Cloning shares all state, so a test can keep a handle while the code under
/// test owns another.
#[derive(Clone)]
pub struct MockRuntime {
    pub kind: RuntimeKind,
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    /// Result for list calls once `list_queue` is drained
    pub list_result: Arc<Mutex<Result<Vec<ContainerRecord>>>>,
    /// Results consumed one per list call before falling back to `list_result`
    pub list_queue: Arc<Mutex<VecDeque<Result<Vec<ContainerRecord>>>>>,
    /// Invoke failures by container ID (value is the failure reason)
    pub invoke_failures: Arc<Mutex<HashMap<String, String>>>,
    /// Container IDs that resolve reports as missing
    pub missing: Arc<Mutex<HashSet<String>>>,
    /// Delay applied to every list call
    pub list_latency: Arc<Mutex<Duration>>,
    /// Delay applied to every invoke call
    pub invoke_latency: Arc<Mutex<Duration>>,
    list_in_flight: Arc<AtomicUsize>,
    max_list_in_flight: Arc<AtomicUsize>,
    invoke_in_flight: Arc<AtomicUsize>,
    max_invoke_in_flight: Arc<AtomicUsize>,
}

impl MockRuntime {
    /// Create a new mock runtime with no containers and no failures
    pub fn new() -> Self {
        Self {
            kind: RuntimeKind::Docker,
            calls: Arc::new(Mutex::new(Vec::new())),
            list_result: Arc::new(Mutex::new(Ok(Vec::new()))),
            list_queue: Arc::new(Mutex::new(VecDeque::new())),
            invoke_failures: Arc::new(Mutex::new(HashMap::new())),
            missing: Arc::new(Mutex::new(HashSet::new())),
            list_latency: Arc::new(Mutex::new(Duration::ZERO)),
            invoke_latency: Arc::new(Mutex::new(Duration::ZERO)),
            list_in_flight: Arc::new(AtomicUsize::new(0)),
            max_list_in_flight: Arc::new(AtomicUsize::new(0)),
            invoke_in_flight: Arc::new(AtomicUsize::new(0)),
            max_invoke_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock whose listing always returns `records`
    pub fn with_containers(records: Vec<ContainerRecord>) -> Self {
        let mock = Self::new();
        mock.set_containers(records);
        mock
    }

    pub fn set_containers(&self, records: Vec<ContainerRecord>) {
        *self.list_result.lock().unwrap() = Ok(records);
    }

    /// Make every subsequent list call fail as unavailable
    pub fn set_unavailable(&self, reason: &str) {
        *self.list_result.lock().unwrap() = Err(RuntimeError::Unavailable(reason.to_string()));
    }

    /// Queue a one-shot list result
    pub fn push_list_result(&self, result: Result<Vec<ContainerRecord>>) {
        self.list_queue.lock().unwrap().push_back(result);
    }

    pub fn fail_invoke(&self, id: &str, reason: &str) {
        self.invoke_failures
            .lock()
            .unwrap()
            .insert(id.to_string(), reason.to_string());
    }

    pub fn mark_missing(&self, id: &str) {
        self.missing.lock().unwrap().insert(id.to_string());
    }

    pub fn set_list_latency(&self, latency: Duration) {
        *self.list_latency.lock().unwrap() = latency;
    }

    pub fn set_invoke_latency(&self, latency: Duration) {
        *self.invoke_latency.lock().unwrap() = latency;
    }

    /// Record a call
    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Check if a specific call was made
    pub fn was_called(&self, call: &MockCall) -> bool {
        self.calls.lock().unwrap().contains(call)
    }

    pub fn list_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockCall::List))
            .count()
    }

    pub fn invoke_calls(&self) -> Vec<(String, ContainerAction)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                MockCall::Invoke { id, action } => Some((id.clone(), *action)),
                _ => None,
            })
            .collect()
    }

    /// Highest number of list calls that were running at the same time
    pub fn max_concurrent_lists(&self) -> usize {
        self.max_list_in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of invoke calls that were running at the same time
    pub fn max_concurrent_invokes(&self) -> usize {
        self.max_invoke_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks concurrent calls for the lifetime of the guard
struct InFlight<'a> {
    current: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self { current }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Clone a Result (RuntimeError does not implement Clone)
fn clone_result<T: Clone>(r: &Result<T>) -> Result<T> {
    match r {
        Ok(v) => Ok(v.clone()),
        Err(e) => Err(clone_runtime_error(e)),
    }
}

fn clone_runtime_error(e: &RuntimeError) -> RuntimeError {
    match e {
        RuntimeError::Unavailable(s) => RuntimeError::Unavailable(s.clone()),
        RuntimeError::ContainerNotFound(s) => RuntimeError::ContainerNotFound(s.clone()),
        RuntimeError::CommandFailed { command, reason } => RuntimeError::CommandFailed {
            command: command.clone(),
            reason: reason.clone(),
        },
        RuntimeError::Parse(s) => RuntimeError::Parse(s.clone()),
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn list(&self) -> Result<Vec<ContainerRecord>> {
        self.record(MockCall::List);
        let _guard = InFlight::enter(&self.list_in_flight, &self.max_list_in_flight);

        let latency = *self.list_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let queued = self.list_queue.lock().unwrap().pop_front();
        if let Some(result) = queued {
            return result;
        }
        let guard = self.list_result.lock().unwrap();
        clone_result(&guard)
    }

    async fn invoke(&self, id: &ContainerId, action: ContainerAction) -> Result<()> {
        self.record(MockCall::Invoke {
            id: id.0.clone(),
            action,
        });
        let _guard = InFlight::enter(&self.invoke_in_flight, &self.max_invoke_in_flight);

        let latency = *self.invoke_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let failure = self.invoke_failures.lock().unwrap().get(&id.0).cloned();
        match failure {
            Some(reason) => Err(RuntimeError::CommandFailed {
                command: format!("docker {}", action),
                reason,
            }),
            None => Ok(()),
        }
    }

    async fn resolve(&self, id: &ContainerId) -> Result<ContainerId> {
        self.record(MockCall::Resolve { id: id.0.clone() });
        if self.missing.lock().unwrap().contains(&id.0) {
            Err(RuntimeError::ContainerNotFound(id.0.clone()))
        } else {
            Ok(id.clone())
        }
    }

    fn log_stream(&self, id: &ContainerId, config: &LogConfig) -> LogStream {
        let mut args = vec!["logs".to_string()];
        if config.follow {
            args.push("-f".to_string());
        }
        if let Some(tail) = config.tail {
            args.push(format!("--tail={}", tail));
        }
        args.push(id.0.clone());
        LogStream {
            container: id.clone(),
            program: self.kind.to_string(),
            args,
        }
    }

    async fn ping(&self) -> Result<()> {
        self.record(MockCall::Ping);
        Ok(())
    }

    fn kind(&self) -> RuntimeKind {
        self.kind
    }
}

/// Build a container record for tests
pub fn record(id: &str, project: Option<&str>, status: ContainerStatus) -> ContainerRecord {
    let mut labels = HashMap::new();
    if let Some(project) = project {
        labels.insert(COMPOSE_PROJECT_LABEL.to_string(), project.to_string());
    }
    let status_text = match &status {
        ContainerStatus::Running => "Up 5 minutes".to_string(),
        ContainerStatus::Exited => "Exited (0) 1 minute ago".to_string(),
        ContainerStatus::Other(state) => state.clone(),
    };
    ContainerRecord {
        id: ContainerId::new(id),
        name: id.to_string(),
        project: ProjectLabel::from_labels(&labels),
        status,
        status_text,
        image: format!("{}:latest", id),
        ports: Vec::new(),
        labels,
    }
}

/// `record` shorthand for a running container
pub fn running(id: &str, project: Option<&str>) -> ContainerRecord {
    record(id, project, ContainerStatus::Running)
}

/// `record` shorthand for an exited container
pub fn exited(id: &str, project: Option<&str>) -> ContainerRecord {
    record(id, project, ContainerStatus::Exited)
}
