mod schema;

pub use schema::Config;

use crate::grading::{validate_detection, validate_grading};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Get the config directory path (~/.config/omr-grade/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("omr-grade"))
}

/// Get the default config file path (~/.config/omr-grade/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path
///   (~/.config/omr-grade/config.yaml), and a missing default file yields the
///   default configuration.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p
        }
        None => match get_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                debug!("no config file, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!("Failed to parse config: invalid YAML in {}", config_path.display())
    })?;

    debug!(path = %config_path.display(), "loaded config");
    Ok(config)
}

/// Validate every section of the configuration, collecting all errors.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref grading) = config.grading {
        if let Err(e) = validate_grading(grading) {
            errors.extend(e);
        }
    }
    if let Some(ref detection) = config.detection {
        if let Err(e) = validate_detection(detection) {
            errors.extend(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
