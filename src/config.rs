use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    /// Path of the SQLite database file.
    pub database_path: String,
    /// Directory holding original/thumbnail image files. Attachment rows
    /// store paths underneath this directory.
    #[serde(default)]
    pub image_directory: Option<String>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = fs::read_to_string(path_ref)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path_ref, e)))?;
    let app_config: AppConfig = toml::from_str(&contents).map_err(|e| {
        Error::Config(format!(
            "Failed to parse TOML from config file {:?}: {}",
            path_ref, e
        ))
    })?;
    Ok(app_config)
}
