pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod utils;

pub use crate::config::{AppSettings, ConfySettings, SettingsStore};
pub use crate::core::engine::AppEngine;
pub use crate::core::platform::{DownloadEvent, ModPlatform, PlatformResult};
pub use crate::models::snapshot::StateSnapshot;
