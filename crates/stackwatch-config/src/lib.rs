//! Configuration for stackwatch
//!
//! Loads the tag and parameter files passed on the command line, and the
//! layered watch settings (defaults, settings file, environment).

pub mod error;

pub use error::{ConfigError, Result};

use serde::Deserialize;
use stackwatch_core::{Parameter, RetryConfig, Tag, WatchConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the settings file location
pub const CONFIG_PATH_ENV: &str = "STACKWATCH_CONFIG_PATH";
pub const POLL_INTERVAL_ENV: &str = "STACKWATCH_POLL_INTERVAL_SECS";
pub const TIMEOUT_ENV: &str = "STACKWATCH_TIMEOUT_SECS";
pub const REGION_ENV: &str = "STACKWATCH_REGION";
pub const PROFILE_ENV: &str = "STACKWATCH_PROFILE";

/// Settings directory (`~/.config/stackwatch`)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stackwatch"))
}

/// Settings file, honoring `STACKWATCH_CONFIG_PATH`
pub fn settings_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    get_config_dir().map(|dir| dir.join("config.json"))
}

/// Reads a file, treating a missing file as absent
fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Loads stack tags from a JSON file
///
/// A missing file yields no tags. Anything other than an array of
/// `{"Key", "Value"}` string pairs is rejected.
pub fn load_tags(path: &Path) -> Result<Vec<Tag>> {
    let Some(content) = read_optional(path)? else {
        tracing::debug!("No tags file at {}", path.display());
        return Ok(Vec::new());
    };

    serde_json::from_str(&content).map_err(|source| ConfigError::InvalidTags {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads template parameters from a JSON file
///
/// Same rules as [`load_tags`], with `{"ParameterKey", "ParameterValue"}` pairs.
pub fn load_parameters(path: &Path) -> Result<Vec<Parameter>> {
    let Some(content) = read_optional(path)? else {
        tracing::debug!("No parameters file at {}", path.display());
        return Ok(Vec::new());
    };

    serde_json::from_str(&content).map_err(|source| ConfigError::InvalidParameters {
        path: path.to_path_buf(),
        source,
    })
}

/// User settings for the watch loop and the aws CLI
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSettings {
    pub poll_interval_secs: u64,
    pub max_polls: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_polls: None,
            timeout_secs: None,
            region: None,
            profile: None,
        }
    }
}

impl WatchSettings {
    /// Defaults, then the settings file, then environment variables
    pub fn load() -> Result<Self> {
        let mut settings = match settings_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env()?;
        Ok(settings)
    }

    /// Reads a settings file; a missing file gives the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let Some(content) = read_optional(path)? else {
            return Ok(Self::default());
        };

        tracing::debug!("Loading settings from {}", path.display());
        serde_json::from_str(&content).map_err(|source| ConfigError::InvalidSettingsFile {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(secs) = env_secs(POLL_INTERVAL_ENV)? {
            self.poll_interval_secs = secs;
        }
        if let Some(secs) = env_secs(TIMEOUT_ENV)? {
            self.timeout_secs = Some(secs);
        }
        if let Ok(region) = std::env::var(REGION_ENV) {
            self.region = Some(region);
        }
        if let Ok(profile) = std::env::var(PROFILE_ENV) {
            self.profile = Some(profile);
        }
        Ok(())
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            max_polls: self.max_polls,
            timeout: self.timeout_secs.map(Duration::from_secs),
            change_set_retry: RetryConfig::default(),
        }
    }
}

fn env_secs(var: &'static str) -> Result<Option<u64>> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvVar { var, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_tags() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tags.json",
            r#"[{"Key": "Env", "Value": "prod"}, {"Key": "Team", "Value": "infra"}]"#,
        );

        let tags = load_tags(&path).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].key, "Env");
        assert_eq!(tags[1].value, "infra");
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");

        assert!(load_tags(&path).unwrap().is_empty());
        assert!(load_parameters(&path).unwrap().is_empty());
    }

    #[test]
    fn test_tags_must_be_a_list() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tags.json", r#"{"Key": "Env"}"#);

        let err = load_tags(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTags { .. }));
        let message = err.to_string();
        assert!(message.contains("Unable to load tags"));
        assert!(message.contains("aws-properties-resource-tags"));
    }

    #[test]
    fn test_tag_value_is_required() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tags.json", r#"[{"Key": "Env"}]"#);

        let err = load_tags(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTags { .. }));
        let message = err.to_string();
        assert!(message.contains("Unable to load tags"));
        assert!(message.contains("\"Value\""));
    }

    #[test]
    fn test_tag_values_must_be_strings() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tags.json", r#"[{"Key": "Port", "Value": 8080}]"#);
        assert!(matches!(
            load_tags(&path),
            Err(ConfigError::InvalidTags { .. })
        ));

        let path = write(&dir, "extra.json", r#"[{"Key": "a", "Value": "b", "Extra": "c"}]"#);
        assert!(matches!(
            load_tags(&path),
            Err(ConfigError::InvalidTags { .. })
        ));
    }

    #[test]
    fn test_load_parameters() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "params.json",
            r#"[{"ParameterKey": "InstanceType", "ParameterValue": "t3.micro"}]"#,
        );

        let params = load_parameters(&path).unwrap();
        assert_eq!(
            params,
            vec![Parameter {
                parameter_key: "InstanceType".to_string(),
                parameter_value: "t3.micro".to_string(),
            }]
        );

        let bad = write(&dir, "bad.json", "not json");
        let err = load_parameters(&bad).unwrap_err();
        assert!(err.to_string().contains("Unable to load parameters"));
    }

    #[test]
    fn test_settings_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"poll_interval_secs": 2, "timeout_secs": 600, "region": "eu-west-1"}"#,
        );

        let settings = WatchSettings::from_file(&path).unwrap();
        assert_eq!(settings.poll_interval_secs, 2);
        assert_eq!(settings.timeout_secs, Some(600));
        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.profile, None);

        let config = settings.watch_config();
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_settings_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.json", r#"{"poll_intervall_secs": 2}"#);
        assert!(matches!(
            WatchSettings::from_file(&path),
            Err(ConfigError::InvalidSettingsFile { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"poll_interval_secs": 2, "region": "eu-west-1"}"#,
        );

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, Some(path.to_str().unwrap())),
                (POLL_INTERVAL_ENV, Some("9")),
                (REGION_ENV, Some("us-east-1")),
                (TIMEOUT_ENV, None),
                (PROFILE_ENV, None),
            ],
            || {
                let settings = WatchSettings::load().unwrap();
                assert_eq!(settings.poll_interval_secs, 9);
                assert_eq!(settings.region.as_deref(), Some("us-east-1"));
                assert_eq!(settings.timeout_secs, None);
            },
        );
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("config.json");

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, Some(missing.to_str().unwrap())),
                (TIMEOUT_ENV, Some("soon")),
            ],
            || {
                let err = WatchSettings::load().unwrap_err();
                assert!(matches!(
                    err,
                    ConfigError::InvalidEnvVar { var: TIMEOUT_ENV, .. }
                ));
            },
        );
    }

    #[test]
    #[serial]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("config.json");

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, Some(missing.to_str().unwrap())),
                (POLL_INTERVAL_ENV, None),
                (TIMEOUT_ENV, None),
                (REGION_ENV, None),
                (PROFILE_ENV, None),
            ],
            || {
                assert_eq!(WatchSettings::load().unwrap(), WatchSettings::default());
            },
        );
    }
}
