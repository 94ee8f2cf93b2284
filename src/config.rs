//! Handles application configuration loading and management.
//!
//! This module defines the `AppConfig` struct which holds the slideshow path
//! and the playback tuning knobs (start slide, lazy-load window and delay).
//! It provides the `load_config` function to read these settings from an INI file.

use configparser::ini::Ini;
use super::errors::ConfigError;
use log::{info, debug, error};
use std::path::PathBuf;
use std::time::Duration;

const SETTINGS_SECTION: &str = "settings";

/// Number of slides kept materialized around the current one when not configured.
pub const DEFAULT_MAX_LOADED_SLIDES: usize = 6;
/// Delay before a deferred lazy-load pass when not configured.
pub const DEFAULT_LAZY_LOAD_DELAY_MS: u64 = 500;

/// Holds the application's configuration parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub slideshow_path: PathBuf,
    pub start_index: usize,
    pub max_loaded_slides: usize,
    pub lazy_load_delay: Duration,
}

impl AppConfig {
    /// A configuration with default playback settings for the given document.
    pub fn new(slideshow_path: impl Into<PathBuf>) -> Self {
        Self {
            slideshow_path: slideshow_path.into(),
            start_index: 0,
            max_loaded_slides: DEFAULT_MAX_LOADED_SLIDES,
            lazy_load_delay: Duration::from_millis(DEFAULT_LAZY_LOAD_DELAY_MS),
        }
    }

    /// Window half-width: slides kept on each side of the current slide.
    pub fn window_half_width(&self) -> usize {
        self.max_loaded_slides / 2
    }
}

/// Loads application configuration from the specified INI file path.
///
/// Reads settings from the `[settings]` section of the INI file. Only
/// `slideshow` is required; the playback settings fall back to defaults.
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read, is malformed,
/// if `slideshow` is missing, or if a numeric setting is not a number.
#[must_use = "loading configuration can fail, the Result must be handled"]
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Attempting to load config from: {}", path);
    if !std::path::Path::new(path).is_file() {
        error!("Config file '{}' does not exist", path);
        return Err(ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file '{}' not found", path),
        )));
    }

    let mut config_parser = Ini::new();
    config_parser.load(path).map_err(|e| {
        error!("Error loading config file '{}': {}", path, e);
        ConfigError::Parse(e)
    })?;

    let app_config = config_from_ini(&config_parser)?;
    info!("Configuration loaded successfully from {}: {:?}", path, app_config);
    Ok(app_config)
}

/// Builds an `AppConfig` from an already parsed INI document.
pub fn config_from_ini(config_parser: &Ini) -> Result<AppConfig, ConfigError> {
    let slideshow = config_parser.get(SETTINGS_SECTION, "slideshow")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            error!("Missing configuration key 'slideshow' in section '[{}]'", SETTINGS_SECTION);
            ConfigError::MissingKey("slideshow".to_string())
        })?;
    debug!("Loaded config value for key 'slideshow': {}", slideshow);

    let mut app_config = AppConfig::new(slideshow);

    if let Some(start_index) = get_number(config_parser, "start_index")? {
        app_config.start_index = start_index as usize;
    }
    if let Some(max_loaded) = get_number(config_parser, "max_loaded_slides")? {
        app_config.max_loaded_slides = max_loaded as usize;
    }
    if let Some(delay_ms) = get_number(config_parser, "lazy_load_delay_ms")? {
        app_config.lazy_load_delay = Duration::from_millis(delay_ms);
    }
    Ok(app_config)
}

fn get_number(config_parser: &Ini, key: &str) -> Result<Option<u64>, ConfigError> {
    match config_parser.get(SETTINGS_SECTION, key) {
        None => {
            debug!("Config key '{}' not set, using default", key);
            Ok(None)
        }
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            error!("Config key '{}' has non-numeric value '{}'", key, raw);
            ConfigError::InvalidValue { key: key.to_string(), value: raw }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_all_settings() {
        let file = write_config(
            "[settings]\nslideshow = /tmp/show.json\nstart_index = 3\nmax_loaded_slides = 4\nlazy_load_delay_ms = 250\n",
        );
        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.slideshow_path, PathBuf::from("/tmp/show.json"));
        assert_eq!(config.start_index, 3);
        assert_eq!(config.max_loaded_slides, 4);
        assert_eq!(config.window_half_width(), 2);
        assert_eq!(config.lazy_load_delay, Duration::from_millis(250));
    }

    #[test]
    fn optional_settings_default() {
        let file = write_config("[settings]\nslideshow = show.json\n");
        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config, AppConfig::new("show.json"));
        assert_eq!(config.window_half_width(), DEFAULT_MAX_LOADED_SLIDES / 2);
    }

    #[test]
    fn missing_slideshow_is_an_error() {
        let file = write_config("[settings]\nstart_index = 1\n");
        match load_config(file.path().to_str().unwrap()) {
            Err(ConfigError::MissingKey(key)) => assert_eq!(key, "slideshow"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let file = write_config("[settings]\nslideshow = a.json\nmax_loaded_slides = many\n");
        assert!(matches!(
            load_config(file.path().to_str().unwrap()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.conf");
        assert!(matches!(load_config(path.to_str().unwrap()), Err(ConfigError::Io(_))));
    }
}
