//! Container runtime client for dockview
//!
//! This crate provides an abstraction over the local container runtime
//! (Docker or Podman), driven through its command-line client.

mod cli_runtime;
mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
mod types;

pub use cli_runtime::CliRuntime;
pub use error::*;
pub use types::*;

use async_trait::async_trait;

/// Trait for container runtimes
///
/// Implementations are stateless: every call reflects the runtime's current truth.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List all containers, running or not
    async fn list(&self) -> Result<Vec<ContainerRecord>>;

    /// Start, stop or restart a container
    async fn invoke(&self, id: &ContainerId, action: ContainerAction) -> Result<()>;

    /// Check the container still exists and return its full ID
    async fn resolve(&self, id: &ContainerId) -> Result<ContainerId>;

    /// Describe a continuous log stream for a container
    fn log_stream(&self, id: &ContainerId, config: &LogConfig) -> LogStream;

    /// Check if the runtime is reachable
    async fn ping(&self) -> Result<()>;

    /// Which runtime this is
    fn kind(&self) -> RuntimeKind;
}

/// Create the runtime client described by the configuration
pub fn create_runtime(config: &dockview_config::RuntimeConfig) -> CliRuntime {
    tracing::debug!(
        "Using runtime '{}' (prefix: {:?})",
        config.program,
        config.prefix
    );
    CliRuntime::new(config.program.clone(), config.prefix.clone())
}
