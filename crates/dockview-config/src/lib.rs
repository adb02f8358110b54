//! Configuration for dockview
//!
//! Handles the dashboard configuration file (`~/.config/dockview/config.toml`).

mod error;
mod settings;

pub use error::*;
pub use settings::*;
