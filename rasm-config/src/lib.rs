//! Binding configuration for rasm
//!
//! Declares parameter specs and the control -> parameter table. Stored as
//! JSON under the user config directory; a missing or broken file falls
//! back to the built-in table for the rasm_origin patch.

use rasm_params::{
    DisplayScale, ParameterId, ParameterRegistry, ParameterSpec, SpecError, DEFAULT_DISPLAY_SCALE,
};
use rasm_sync::{BindingOptions, MappingEntry, SyncMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Spec fields for one parameter, keyed by parameter id in [`Config`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub step: f64,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ParameterConfig {
    fn new(min: f64, max: f64, step: f64, inverted: bool, label: &str) -> Self {
        Self {
            min,
            max,
            step,
            inverted,
            unit: String::new(),
            label: Some(label.to_string()),
        }
    }

    /// Validate into a spec
    pub fn to_spec(&self, id: impl Into<ParameterId>) -> Result<ParameterSpec, SpecError> {
        let spec = ParameterSpec::new(id, self.min, self.max)?
            .with_step(self.step)?
            .inverted(self.inverted)
            .with_unit(self.unit.clone());
        Ok(match &self.label {
            Some(label) => spec.with_label(label.clone()),
            None => spec,
        })
    }
}

/// How a control presents its parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// `0..display_scale`
    #[default]
    Percent,
    /// The parameter's own range
    Native,
}

/// One control binding row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    pub control: String,
    pub parameter: ParameterId,
    #[serde(default)]
    pub sync: SyncMode,
    pub epsilon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub display: DisplayMode,
}

fn default_display_scale() -> f64 {
    DEFAULT_DISPLAY_SCALE
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterConfig>,
    #[serde(default)]
    pub controls: Vec<ControlConfig>,
    #[serde(default = "default_display_scale")]
    pub display_scale: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Config {
    /// Built-in table for the rasm_origin patch
    pub fn builtin() -> Self {
        let parameters = [
            ("volume", ParameterConfig::new(0.0, 1.0, 0.01, false, "Volume")),
            ("sensitivity", ParameterConfig::new(20.0, 80.0, 5.0, true, "Sensitivity")),
            ("responsiveness", ParameterConfig::new(0.0, 10.0, 1.0, true, "Responsiveness")),
            ("dynamics", ParameterConfig::new(0.0, 4.0, 1.0, false, "Dynamics")),
            ("release", ParameterConfig::new(0.0, 10.0, 1.0, false, "Release")),
        ];
        let controls = ["volume", "sensitivity", "dynamics", "responsiveness", "release"]
            .into_iter()
            .map(|name| ControlConfig {
                control: format!("{name}-slider"),
                parameter: name.into(),
                sync: SyncMode::Both,
                epsilon: 1e-4,
                poll_interval_ms: Some(100),
                display: DisplayMode::Percent,
            })
            .collect();

        Self {
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            controls,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }

    /// Load config from the default location
    ///
    /// Falls back to the built-in config if the file is missing or can't
    /// be parsed. A missing file is created from the built-in config.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => {
                info!(path = %path.display(), "config loaded");
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using built-in");
                let config = Self::builtin();
                if let Err(e) = config.save_to(&path) {
                    warn!(path = %path.display(), error = %e, "could not write default config");
                }
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "bad config, using built-in");
                Self::builtin()
            }
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rasm")
            .join("bindings.json")
    }

    /// Build the spec registry, dropping (and logging) invalid specs
    pub fn registry(&self) -> ParameterRegistry {
        let mut registry = ParameterRegistry::new();
        for (key, parameter) in &self.parameters {
            match parameter.to_spec(key.as_str()) {
                Ok(spec) => {
                    if let Err(e) = registry.insert(spec) {
                        warn!(parameter = %key, error = %e, "rejected parameter spec");
                    }
                }
                Err(e) => warn!(parameter = %key, error = %e, "rejected parameter spec"),
            }
        }
        registry
    }

    /// Control rows as binding entries
    ///
    /// Options are validated when the binding is created, not here.
    pub fn mapping_entries(&self) -> Vec<MappingEntry> {
        self.controls
            .iter()
            .map(|c| MappingEntry {
                control: c.control.clone(),
                parameter: c.parameter.clone(),
                options: BindingOptions {
                    sync: c.sync,
                    epsilon: c.epsilon,
                    poll_interval: c.poll_interval_ms.map(Duration::from_millis),
                    display: self.display_for(c.display),
                },
            })
            .collect()
    }

    pub fn display_for(&self, mode: DisplayMode) -> DisplayScale {
        match mode {
            DisplayMode::Percent => DisplayScale::Normalized(self.display_scale),
            DisplayMode::Native => DisplayScale::Native,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = Config::builtin().registry();
        assert_eq!(registry.len(), 5);

        let sensitivity = registry.lookup(&"sensitivity".into()).unwrap();
        assert_eq!(sensitivity.min(), 20.0);
        assert_eq!(sensitivity.max(), 80.0);
        assert_eq!(sensitivity.step(), 5.0);
        assert!(sensitivity.is_inverted());
        assert_eq!(sensitivity.label(), "Sensitivity");
    }

    #[test]
    fn test_builtin_entries() {
        let entries = Config::builtin().mapping_entries();
        let controls: Vec<&str> = entries.iter().map(|e| e.control.as_str()).collect();
        assert_eq!(
            controls,
            [
                "volume-slider",
                "sensitivity-slider",
                "dynamics-slider",
                "responsiveness-slider",
                "release-slider"
            ]
        );
        for entry in &entries {
            assert_eq!(entry.options.sync, SyncMode::Both);
            assert_eq!(entry.options.poll_interval, Some(Duration::from_millis(100)));
            assert_eq!(entry.options.display, DisplayScale::Normalized(100.0));
            assert!(entry.options.validate().is_ok());
        }
    }

    #[test]
    fn test_parse_minimal() {
        let config = Config::parse(
            r#"{
                "parameters": { "3": { "min": 0, "max": 10, "step": 1 } },
                "controls": [
                    { "control": "gain-slider", "parameter": 3, "epsilon": 0.5, "display": "native" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.display_scale, 100.0);
        let entries = config.mapping_entries();
        assert_eq!(entries[0].parameter, ParameterId::new("3"));
        assert_eq!(entries[0].options.sync, SyncMode::Push);
        assert_eq!(entries[0].options.poll_interval, None);
        assert_eq!(entries[0].options.display, DisplayScale::Native);
        assert!(config.registry().contains(&"3".into()));
    }

    #[test]
    fn test_epsilon_is_required() {
        let result = Config::parse(r#"{ "controls": [ { "control": "a", "parameter": "b" } ] }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_spec_is_dropped() {
        let config = Config::parse(
            r#"{
                "parameters": {
                    "broken": { "min": 5, "max": 5 },
                    "negative": { "min": 0, "max": 1, "step": -0.1 },
                    "fine": { "min": 0, "max": 1 }
                }
            }"#,
        )
        .unwrap();

        let registry = config.registry();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&"fine".into()));
    }

    #[test]
    fn test_custom_display_scale() {
        let mut config = Config::builtin();
        config.display_scale = 1000.0;
        assert_eq!(
            config.mapping_entries()[0].options.display,
            DisplayScale::Normalized(1000.0)
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("rasm-config-test-{}", std::process::id()));
        let path = dir.join("bindings.json");

        let config = Config::builtin();
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load_from(Path::new("/nonexistent/rasm/bindings.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
