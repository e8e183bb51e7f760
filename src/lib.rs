//! Watch steam download speeds.
//!
//! Finds the steam libraries on this machine, reads the app manifests in
//! each, and measures how fast the download directory of every downloading
//! title grows.

pub mod app;
pub mod config;
mod error;
pub use error::SteamrateError as Error;
mod existing_directory;
pub use existing_directory::ExistingDirectory;
pub mod monitor;
pub mod size;
pub mod steam;

pub use app::{AppManifest, StateFlags, Status};
pub use config::Config;
pub use monitor::{Monitor, Report};
