//! Start/stop/restart commands, single and project-wide
//!
//! The dispatcher never touches displayed state. Callers request a refresh
//! afterwards and let the next published snapshot show the new status.

use crate::refresh::SnapshotReceiver;
use dockview_runtime::{ContainerAction, ContainerId, ContainerRuntime, ProjectLabel};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Outcome of one runtime command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
}

/// Result of running an action against one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub container: ContainerId,
    pub name: String,
    pub action: ContainerAction,
    pub outcome: Outcome,
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }

    /// One-line status message
    pub fn message(&self) -> String {
        match &self.outcome {
            Outcome::Succeeded => format!("{} {}", self.name, self.action.past()),
            Outcome::Failed(reason) => {
                format!("Failed to {} {}: {}", self.action, self.name, reason)
            }
        }
    }
}

/// Aggregated results of a project-wide action, in project member order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub project: ProjectLabel,
    pub action: ContainerAction,
    pub results: Vec<ActionResult>,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// One-line status message listing every failure with its reason
    pub fn message(&self) -> String {
        let total = self.results.len();
        if total == 0 {
            return format!("{} has no containers", self.project);
        }

        let failures: Vec<String> = self
            .results
            .iter()
            .filter_map(|r| match &r.outcome {
                Outcome::Failed(reason) => Some(format!("{}: {}", r.name, reason)),
                Outcome::Succeeded => None,
            })
            .collect();

        if failures.is_empty() {
            format!("{} {} ({} containers)", self.project, self.action.past(), total)
        } else {
            format!(
                "{}: {} of {} failed to {} ({})",
                self.project,
                failures.len(),
                total,
                self.action,
                failures.join("; ")
            )
        }
    }
}

/// Runs mutating commands against the runtime
#[derive(Clone)]
pub struct ActionDispatcher {
    runtime: Arc<dyn ContainerRuntime>,
    snapshots: SnapshotReceiver,
    concurrency: usize,
}

impl ActionDispatcher {
    /// `concurrency` bounds how many commands a project-wide action runs at once
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        snapshots: SnapshotReceiver,
        concurrency: usize,
    ) -> Self {
        Self {
            runtime,
            snapshots,
            concurrency: concurrency.max(1),
        }
    }

    /// Run `action` against a single container
    pub async fn dispatch(&self, id: &ContainerId, action: ContainerAction) -> ActionResult {
        let name = self
            .snapshots
            .borrow()
            .snapshot
            .find(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.short().to_string());
        run_one(self.runtime.as_ref(), id.clone(), name, action).await
    }

    /// Run `action` against every container currently in `project`.
    ///
    /// Members come from the latest published snapshot at call time. Failures
    /// are collected per container; successful ones are never rolled back.
    ///
    /// At most `concurrency` invocations run at once. Dropping the returned
    /// future (e.g. on quit) leaves started invocations to finish on the
    /// runtime side, but members still queued are never started.
    pub async fn dispatch_all(
        &self,
        project: &ProjectLabel,
        action: ContainerAction,
    ) -> BatchResult {
        let members: Vec<(ContainerId, String)> = {
            let published = self.snapshots.borrow();
            published
                .snapshot
                .group(project)
                .map(|g| {
                    g.containers
                        .iter()
                        .map(|c| (c.id.clone(), c.name.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        tracing::info!(
            "{} {} containers in {} (up to {} at a time)",
            action.progressive(),
            members.len(),
            project,
            self.concurrency
        );

        let mut results: Vec<(usize, ActionResult)> = stream::iter(members.into_iter().enumerate())
            .map(|(i, (id, name))| {
                let runtime = self.runtime.clone();
                async move { (i, run_one(runtime.as_ref(), id, name, action).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.sort_by_key(|(i, _)| *i);

        BatchResult {
            project: project.clone(),
            action,
            results: results.into_iter().map(|(_, r)| r).collect(),
        }
    }
}

async fn run_one(
    runtime: &dyn ContainerRuntime,
    id: ContainerId,
    name: String,
    action: ContainerAction,
) -> ActionResult {
    tracing::debug!("{} {} ({})", action.progressive(), name, id.short());
    let outcome = match runtime.invoke(&id, action).await {
        Ok(()) => {
            tracing::info!("{} {}", name, action.past());
            Outcome::Succeeded
        }
        Err(e) => {
            tracing::warn!("Failed to {} {}: {}", action, name, e);
            Outcome::Failed(e.to_string())
        }
    };
    ActionResult {
        container: id,
        name,
        action,
        outcome,
    }
}
