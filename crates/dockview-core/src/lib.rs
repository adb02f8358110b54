//! Core logic for dockview
//!
//! Everything between the runtime client and the screen: grouping containers
//! into a stable project tree, keeping a selection on it across refreshes,
//! polling in the background, and running start/stop/restart commands.

pub mod cursor;
pub mod dispatch;
mod error;
pub mod logs;
pub mod refresh;
pub mod tree;

pub use cursor::Cursor;
pub use dispatch::{ActionDispatcher, ActionResult, BatchResult, Outcome};
pub use error::*;
pub use logs::{launcher_from_config, LogStreamLauncher, LogViewerLauncher};
pub use refresh::{
    Freshness, Published, RefreshHandle, RefreshLoop, RefreshRequest, SnapshotReceiver,
};
pub use tree::{ProjectGroup, ProjectTree, Row, RowFilter, TreeSnapshot};
