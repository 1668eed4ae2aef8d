//! Optional configuration file, JSON or YAML by extension.

use crate::collector::CollectorSet;
use crate::error::{HoststatError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default scrape interval for the watch loop.
pub const DEFAULT_INTERVAL_SECS: u64 = 15;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Scrape interval in seconds for the watch loop.
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Collectors to force on.
    #[serde(default)]
    pub enable_collectors: Vec<String>,

    /// Collectors to force off.
    #[serde(default)]
    pub disable_collectors: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            HoststatError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&raw),
            _ => Self::from_json(&raw),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| HoststatError::Config(e.to_string()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| HoststatError::Config(e.to_string()))
    }

    /// Apply the enable/disable lists to a collector set. Unknown names
    /// are configuration errors rather than silent no-ops.
    pub fn apply(&self, set: &mut CollectorSet) -> Result<()> {
        for name in &self.enable_collectors {
            set.set_enabled(name, true)?;
        }
        for name in &self.disable_collectors {
            set.set_enabled(name, false)?;
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.interval(), Duration::from_secs(DEFAULT_INTERVAL_SECS));
        assert!(config.enable_collectors.is_empty());
        assert!(config.disable_collectors.is_empty());
    }

    #[test]
    fn json_config_round_trips() {
        let config = Config::from_json(
            r#"{"interval_secs": 30, "disable_collectors": ["cpu"]}"#,
        )
        .unwrap();
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.disable_collectors, vec!["cpu"]);
    }

    #[test]
    fn yaml_config_round_trips() {
        let config = Config::from_yaml("interval_secs: 60\nenable_collectors: [cpu]\n").unwrap();
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.enable_collectors, vec!["cpu"]);
    }

    #[test]
    fn load_picks_format_by_extension() {
        let mut json = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        writeln!(json, r#"{{"interval_secs": 5}}"#).unwrap();
        let config = Config::load(json.path()).unwrap();
        assert_eq!(config.interval(), Duration::from_secs(5));

        let mut yaml = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(yaml, "interval_secs: 7").unwrap();
        let config = Config::load(yaml.path()).unwrap();
        assert_eq!(config.interval(), Duration::from_secs(7));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load(Path::new("/nonexistent/hoststat.json")).unwrap_err();
        assert!(matches!(err, HoststatError::Config(_)));
    }
}
