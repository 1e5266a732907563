//! Locating, parsing and validating [`QuadConfig`].
//!
//! `ConfigLoader::load()` reads `$NOVADE_QUAD_CONFIG` when set, otherwise
//! `config.toml` in the per-user configuration directory. A missing file is not
//! an error: the defaults are used. Everything that is loaded goes through
//! [`ConfigLoader::validate`] before it is handed out.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use tracing::{debug, info};

use crate::config::QuadConfig;
use crate::error::ConfigError;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "NOVADE_QUAD_CONFIG";
const CONFIG_FILE_NAME: &str = "config.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Namespace for configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the configuration from its default location, together with the
    /// path it was resolved to.
    pub fn load() -> Result<(QuadConfig, PathBuf), ConfigError> {
        let path = Self::config_path(std::env::var_os(CONFIG_PATH_ENV))?;
        let config = Self::load_from_path(&path)?;
        Ok((config, path))
    }

    /// Resolves the file to read, preferring an explicit override.
    pub fn config_path(override_path: Option<OsString>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = override_path.filter(|path| !path.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("org", "NovaDE", "novade-quad")
            .ok_or(ConfigError::DirectoryUnavailable)?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load_from_path(path: &Path) -> Result<QuadConfig, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                info!(path = %path.display(), "loading configuration");
                Self::load_from_str(&content)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                let config = QuadConfig::default();
                Self::validate(&config)?;
                Ok(config)
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn load_from_str(content: &str) -> Result<QuadConfig, ConfigError> {
        let config: QuadConfig = toml::from_str(content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &QuadConfig) -> Result<(), ConfigError> {
        if config.window.width == 0 || config.window.height == 0 {
            return Err(ConfigError::Validation(format!(
                "window size must be positive, got {}x{}",
                config.window.width, config.window.height
            )));
        }
        if i32::try_from(config.window.width).is_err() || i32::try_from(config.window.height).is_err()
        {
            return Err(ConfigError::Validation(
                "window size does not fit a native window".to_string(),
            ));
        }

        if let Some(component) = config
            .render
            .clear_color
            .iter()
            .find(|c| !(0.0..=1.0).contains(*c))
        {
            return Err(ConfigError::Validation(format!(
                "clear_color components must lie in [0, 1], got {component}"
            )));
        }
        if config.render.swap_interval < 0 {
            return Err(ConfigError::Validation(format!(
                "swap_interval must not be negative, got {}",
                config.render.swap_interval
            )));
        }
        if config.render.max_frames == Some(0) {
            return Err(ConfigError::Validation(
                "max_frames must be at least 1 when set".to_string(),
            ));
        }

        let level = config.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "invalid log level `{}`, expected one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        let format = config.logging.format.to_lowercase();
        if !LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "invalid log format `{}`, expected text or json",
                config.logging.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchMode;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn empty_document_yields_defaults() {
        let config = ConfigLoader::load_from_str("").expect("empty config is valid");
        assert_eq!(config, QuadConfig::default());
        assert_eq!(config.render.dispatch, DispatchMode::Pending);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = ConfigLoader::load_from_str(
            r#"
            [window]
            title = "custom"

            [render]
            dispatch = "blocking"
            max_frames = 3
            "#,
        )
        .expect("valid config");
        assert_eq!(config.window.title, "custom");
        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert_eq!(config.render.dispatch, DispatchMode::Blocking);
        assert_eq!(config.render.max_frames, Some(3));
        assert_eq!(config.input.exit_key, 1);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ConfigLoader::load_from_str("[window]\ndepth = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[rstest]
    #[case("[window]\nwidth = 0\n")]
    #[case("[window]\nheight = 0\n")]
    #[case("[render]\nclear_color = [0.0, 0.0, 1.5, 1.0]\n")]
    #[case("[render]\nswap_interval = -1\n")]
    #[case("[render]\nmax_frames = 0\n")]
    #[case("[logging]\nlevel = \"verbose\"\n")]
    #[case("[logging]\nformat = \"xml\"\n")]
    fn invalid_values_fail_validation(#[case] content: &str) {
        let err = ConfigLoader::load_from_str(content).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "got {err:?}");
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let config = ConfigLoader::load_from_str("[logging]\nlevel = \"DEBUG\"\n");
        assert!(config.is_ok());
    }

    #[test]
    fn reads_a_file_from_disk() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[input]\nexit_key = 16\nexit_on_close = false").expect("write");
        let config = ConfigLoader::load_from_path(file.path()).expect("valid file");
        assert_eq!(config.input.exit_key, 16);
        assert!(!config.input.exit_on_close);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().expect("temp dir");
        let config = ConfigLoader::load_from_path(&dir.path().join("absent.toml"))
            .expect("defaults");
        assert_eq!(config, QuadConfig::default());
    }

    #[test]
    fn unreadable_path_is_a_read_error() {
        let dir = tempdir().expect("temp dir");
        let err = ConfigLoader::load_from_path(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }), "got {err:?}");
    }

    #[test]
    fn explicit_path_overrides_the_config_dir() {
        let path = ConfigLoader::config_path(Some(OsString::from("/tmp/quad.toml")))
            .expect("explicit path");
        assert_eq!(path, PathBuf::from("/tmp/quad.toml"));
    }
}
