//! End-to-end tests against the local container runtime.
//!
//! Nothing here creates or changes containers; the tests only read state.
//! Requires Docker or Podman. Tests skip gracefully if no runtime is detected.

use dockview_core::logs::UnavailableLauncher;
use dockview_core::{LaunchError, LogStreamLauncher, ProjectTree, RefreshLoop, RowFilter};
use dockview_runtime::{CliRuntime, ContainerId, ContainerRuntime, LogConfig, RuntimeError};
use std::sync::Arc;
use std::time::Duration;

/// Get a runtime for testing.
///
/// Respects `DOCKVIEW_TEST_RUNTIME` (`docker` or `podman`).
/// Falls back to the first runtime that answers when unset.
async fn get_test_runtime() -> Option<CliRuntime> {
    let candidates: Vec<CliRuntime> = match std::env::var("DOCKVIEW_TEST_RUNTIME").as_deref() {
        Ok("docker") => vec![CliRuntime::docker()],
        Ok("podman") => vec![CliRuntime::podman()],
        _ => vec![CliRuntime::docker(), CliRuntime::podman()],
    };
    for runtime in candidates {
        match runtime.ping().await {
            Ok(()) => return Some(runtime),
            Err(e) => eprintln!("Skipping {}: {}", runtime.kind(), e),
        }
    }
    None
}

const BOGUS_ID: &str = "dockview-test-no-such-container-0000";

#[tokio::test]
async fn test_listing_builds_tree() {
    let Some(runtime) = get_test_runtime().await else {
        eprintln!("Skipping test: no container runtime available");
        return;
    };

    let records = runtime.list().await.expect("list containers");
    let count = records.len();
    let snapshot = ProjectTree::build(records, None);
    assert!(snapshot.container_count() <= count);
    assert_eq!(
        snapshot.rows(RowFilter::All).len(),
        snapshot.container_count()
    );
}

#[tokio::test]
async fn test_resolve_missing_container() {
    let Some(runtime) = get_test_runtime().await else {
        eprintln!("Skipping test: no container runtime available");
        return;
    };

    let err = runtime
        .resolve(&ContainerId::new(BOGUS_ID))
        .await
        .unwrap_err();
    assert!(
        matches!(err, RuntimeError::ContainerNotFound(_)),
        "unexpected error: {}",
        err
    );
}

#[tokio::test]
async fn test_open_logs_for_missing_container() {
    let Some(runtime) = get_test_runtime().await else {
        eprintln!("Skipping test: no container runtime available");
        return;
    };

    let launcher = LogStreamLauncher::new(
        Arc::new(runtime),
        Arc::new(UnavailableLauncher::new("not used")),
        LogConfig::default(),
        "dockview-fmt",
    );
    let err = launcher
        .open_logs(&ContainerId::new(BOGUS_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, LaunchError::ContainerGone(_)), "{}", err);
}

#[tokio::test]
async fn test_refresh_loop_publishes_from_real_runtime() {
    let Some(runtime) = get_test_runtime().await else {
        eprintln!("Skipping test: no container runtime available");
        return;
    };

    let (handle, mut rx) = RefreshLoop::new(Arc::new(runtime), Duration::from_secs(30)).spawn();
    tokio::time::timeout(Duration::from_secs(30), rx.changed())
        .await
        .expect("first poll within 30s")
        .expect("refresh loop alive");
    assert!(!rx.borrow().is_stale());
    handle.shutdown();
}
