//! Configuration loading and serial-port resolution
//!
//! Bootstrap settings live in an optional TOML file; anything that matters at
//! run time can be overridden per invocation. Resolution priority:
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`SEQBOX_PORT`)
//! 3. TOML config file (`~/.config/seqbox/config.toml`)
//! 4. None; the caller decides whether that is an error

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming the serial port to use
pub const PORT_ENV_VAR: &str = "SEQBOX_PORT";

/// Bootstrap configuration loaded from the TOML file
///
/// These settings cannot change during a run. Minimal by design: everything
/// here is also overridable on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Serial port to use when none is given on the command line
    #[serde(default)]
    pub default_port: Option<String>,

    /// Folder that relative schedule paths are resolved against
    #[serde(default)]
    pub schedule_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load the TOML config file if one exists
///
/// Missing files are not an error: a default config is returned so the
/// application always starts. An unparsable file IS an error; silently
/// ignoring a typo'd config confuses operators.
pub fn load_toml_config() -> Result<TomlConfig> {
    let Some(path) = config_file_path() else {
        return Ok(TomlConfig::default());
    };
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Resolve the serial port to use, following the priority order above
pub fn resolve_port(cli_arg: Option<&str>, config: &TomlConfig) -> Result<String> {
    if let Some(port) = cli_arg {
        return Ok(port.to_string());
    }

    if let Ok(port) = std::env::var(PORT_ENV_VAR) {
        if !port.is_empty() {
            return Ok(port);
        }
    }

    if let Some(port) = &config.default_port {
        return Ok(port.clone());
    }

    Err(Error::Config(format!(
        "no serial port configured: pass --port, set {}, or set default_port in the config file",
        PORT_ENV_VAR
    )))
}

/// Resolve a schedule path against the configured schedule folder
///
/// Absolute paths pass through unchanged; relative paths are joined onto
/// `schedule_folder` when one is configured.
pub fn resolve_schedule_path(path: &std::path::Path, config: &TomlConfig) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match &config.schedule_folder {
        Some(folder) => folder.join(path),
        None => path.to_path_buf(),
    }
}

/// Platform config file location (`<config dir>/seqbox/config.toml`)
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("seqbox").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::Path;

    #[test]
    #[serial]
    fn test_resolve_port_cli_wins() {
        std::env::set_var(PORT_ENV_VAR, "/dev/ttyUSB9");
        let config = TomlConfig {
            default_port: Some("/dev/ttyACM0".to_string()),
            ..Default::default()
        };

        let port = resolve_port(Some("COM3"), &config).expect("should resolve");
        assert_eq!(port, "COM3");
        std::env::remove_var(PORT_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_resolve_port_env_over_config() {
        std::env::set_var(PORT_ENV_VAR, "/dev/ttyUSB9");
        let config = TomlConfig {
            default_port: Some("/dev/ttyACM0".to_string()),
            ..Default::default()
        };

        let port = resolve_port(None, &config).expect("should resolve");
        assert_eq!(port, "/dev/ttyUSB9");
        std::env::remove_var(PORT_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_resolve_port_config_fallback() {
        std::env::remove_var(PORT_ENV_VAR);
        let config = TomlConfig {
            default_port: Some("/dev/ttyACM0".to_string()),
            ..Default::default()
        };

        let port = resolve_port(None, &config).expect("should resolve");
        assert_eq!(port, "/dev/ttyACM0");
    }

    #[test]
    #[serial]
    fn test_resolve_port_nothing_configured() {
        std::env::remove_var(PORT_ENV_VAR);
        let result = resolve_port(None, &TomlConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_config_parse() {
        let config: TomlConfig = toml::from_str(
            r#"
            default_port = "/dev/ttyACM1"
            schedule_folder = "/srv/schedules"

            [logging]
            level = "debug"
            "#,
        )
        .expect("should parse");

        assert_eq!(config.default_port.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(
            config.schedule_folder,
            Some(PathBuf::from("/srv/schedules"))
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_toml_config_empty_file_uses_defaults() {
        let config: TomlConfig = toml::from_str("").expect("should parse");
        assert!(config.default_port.is_none());
        assert!(config.schedule_folder.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_resolve_schedule_path() {
        let config = TomlConfig {
            schedule_folder: Some(PathBuf::from("/srv/schedules")),
            ..Default::default()
        };

        assert_eq!(
            resolve_schedule_path(Path::new("run.csv"), &config),
            PathBuf::from("/srv/schedules/run.csv")
        );
        assert_eq!(
            resolve_schedule_path(Path::new("/tmp/run.csv"), &config),
            PathBuf::from("/tmp/run.csv")
        );
        assert_eq!(
            resolve_schedule_path(Path::new("run.csv"), &TomlConfig::default()),
            PathBuf::from("run.csv")
        );
    }
}
