//! Refresh loop and dispatcher working together over a mock runtime

use dockview_core::{ActionDispatcher, Cursor, Freshness, RefreshLoop, RefreshRequest, RowFilter};
use dockview_runtime::test_support::{exited, running, MockRuntime};
use dockview_runtime::{ContainerAction, ContainerId, ProjectLabel};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_action_then_forced_refresh_shows_new_status() {
    let mock = MockRuntime::with_containers(vec![
        running("web", Some("app")),
        exited("db", Some("app")),
    ]);
    let runtime = Arc::new(mock.clone());
    let (refresh, mut rx) = RefreshLoop::new(runtime.clone(), Duration::from_secs(60)).spawn();
    rx.changed().await.unwrap();

    let dispatcher = ActionDispatcher::new(runtime, rx.clone(), 4);
    let result = dispatcher
        .dispatch(&ContainerId::new("db"), ContainerAction::Start)
        .await;
    assert!(result.is_success());

    // The dispatcher does not touch displayed state; the next poll does
    assert!(!rx
        .borrow()
        .snapshot
        .find(&ContainerId::new("db"))
        .unwrap()
        .status
        .is_running());

    mock.set_containers(vec![running("web", Some("app")), running("db", Some("app"))]);
    assert_eq!(refresh.request(), RefreshRequest::Scheduled);
    rx.changed().await.unwrap();

    let published = rx.borrow().clone();
    assert_eq!(published.freshness, Freshness::Fresh);
    assert_eq!(published.snapshot.running_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cursor_follows_container_across_polls() {
    let mock = MockRuntime::with_containers(vec![
        running("web", Some("app")),
        exited("db", Some("app")),
        running("cache", Some("infra")),
    ]);
    let (_refresh, mut rx) =
        RefreshLoop::new(Arc::new(mock.clone()), Duration::from_secs(5)).spawn();
    rx.changed().await.unwrap();

    let mut cursor = Cursor::new();
    {
        let published = rx.borrow_and_update();
        cursor.select_row(&published.snapshot.rows(RowFilter::All), 2);
    }
    assert_eq!(cursor.selected_id(), Some(&ContainerId::new("cache")));

    mock.set_containers(vec![
        running("cache", Some("infra")),
        running("api", Some("app")),
        running("web", Some("app")),
    ]);
    rx.changed().await.unwrap();

    let published = rx.borrow_and_update();
    let rows = published.snapshot.rows(RowFilter::All);
    cursor.reconcile(&rows);
    assert_eq!(cursor.selected_id(), Some(&ContainerId::new("cache")));
    let names: Vec<&str> = rows.iter().map(|r| r.container.name.as_str()).collect();
    assert_eq!(names, vec!["web", "api", "cache"]);
}

#[tokio::test(start_paused = true)]
async fn test_project_restart_during_outage_reports_every_container() {
    let mock = MockRuntime::with_containers(vec![
        running("web", Some("app")),
        running("worker", Some("app")),
    ]);
    let runtime = Arc::new(mock.clone());
    let (_refresh, mut rx) = RefreshLoop::new(runtime.clone(), Duration::from_secs(1)).spawn();
    rx.changed().await.unwrap();

    mock.set_unavailable("daemon stopped");
    mock.fail_invoke("web", "daemon stopped");
    mock.fail_invoke("worker", "daemon stopped");
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_stale());

    let dispatcher = ActionDispatcher::new(runtime, rx.clone(), 2);
    let batch = dispatcher
        .dispatch_all(&ProjectLabel::compose("app"), ContainerAction::Restart)
        .await;
    assert_eq!(batch.results.len(), 2);
    assert_eq!(batch.succeeded(), 0);
}
