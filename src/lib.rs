pub mod alerts;
pub mod auth;
pub mod cli;
pub mod display;
pub mod error;
pub mod import;
pub mod manager;
pub mod models;
pub mod recording;
pub mod schema;
pub mod settings;
pub mod stats;

pub use crate::error::{AttendanceError, AttendanceResult, ValidationError};
pub use crate::manager::AttendanceManager;
pub use crate::settings::Settings;

/// Loads the settings (from `config_path`, or `config.toml` when `None`) and connects to the
/// database they name.
pub fn create_default_manager(
    config_path: Option<&str>,
) -> AttendanceResult<(AttendanceManager, Settings)> {
    let settings = match config_path {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let manager = AttendanceManager::connect(&settings.database_url)?;

    Ok((manager, settings))
}
