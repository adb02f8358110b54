//! Error types for dockview-core

use thiserror::Error;

/// Opening a live log viewer failed
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("No log viewer available: {0}")]
    NoViewer(String),

    #[error("Container no longer exists: {0}")]
    ContainerGone(String),

    #[error("Could not resolve container: {0}")]
    Runtime(#[from] dockview_runtime::RuntimeError),

    #[error("Failed to launch log viewer: {0}")]
    Spawn(String),
}
