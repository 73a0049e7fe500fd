//! Configuration types and parsing.
//!
//! This module defines the indicator configuration schema. The Config type
//! is intended to be a stable schema that stays simple and
//! serialization-friendly; derived values (clamped thresholds, ring
//! geometry) are computed by accessors or by the gauge module.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use toml::Table;

use crate::error::{Error, Result};

/// Known valid values for indicator.position.
const VALID_POSITIONS: &[&str] = &["top-left", "top-right", "bottom-left", "bottom-right"];

/// Embedded default configuration TOML, compiled into the binary.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config.toml");

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path where config was found, if any.
    pub source: Option<PathBuf>,
    /// Whether defaults were used (no config file found).
    pub used_defaults: bool,
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Indicator placement, polling, and visibility thresholds.
    pub indicator: IndicatorConfig,

    /// Gauge drawing parameters.
    pub gauge: GaugeConfig,
}

impl Config {
    /// Load configuration from the embedded default TOML string.
    pub fn from_default_toml() -> Result<Self> {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, merging with embedded defaults.
    ///
    /// User-provided values override defaults, but any missing sections or
    /// fields fall back to the embedded default config.
    ///
    /// Returns an error if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_with_defaults(&content)
    }

    /// Load configuration from a TOML string, merging with embedded defaults.
    ///
    /// This parses both the default config and user config as TOML tables,
    /// deep-merges them (user values win), then deserializes the result.
    fn load_with_defaults(user_toml: &str) -> Result<Self> {
        // This should never fail since it's embedded and tested
        let mut base: Table = toml::from_str(DEFAULT_CONFIG_TOML)
            .expect("embedded DEFAULT_CONFIG_TOML should always be valid");

        let user: Table = toml::from_str(user_toml)?;

        deep_merge_toml(&mut base, user);

        let config: Config = base.try_into()?;
        Ok(config)
    }

    /// Find and load configuration using the XDG lookup chain.
    ///
    /// If `explicit_path` is `Some`, that path is used directly and an error
    /// is returned if it doesn't exist or can't be parsed (no fallback).
    ///
    /// If `explicit_path` is `None`, searches in order:
    /// 1. `$XDG_CONFIG_HOME/batring/config.toml`
    /// 2. `~/.config/batring/config.toml`
    /// 3. `./config.toml` (current working directory)
    ///
    /// If no config file is found in the search chain, the embedded defaults
    /// are used.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<ConfigLoadResult> {
        // If an explicit path was provided, use it strictly (no fallback)
        if let Some(path) = explicit_path {
            let config = Self::load(path)?;
            return Ok(ConfigLoadResult {
                config,
                source: Some(path.to_path_buf()),
                used_defaults: false,
            });
        }

        // No explicit path - search the XDG chain.
        // Rule: if a config file exists but fails to load, that's an error
        // (no silent fallback). Only use defaults when no config files exist.
        let search_paths = Self::config_search_paths();
        let mut first_error: Option<(PathBuf, Error)> = None;

        for path in &search_paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        return Ok(ConfigLoadResult {
                            config,
                            source: Some(path.clone()),
                            used_defaults: false,
                        });
                    }
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some((path.clone(), e));
                        }
                    }
                }
            }
        }

        if let Some((path, error)) = first_error {
            tracing::error!(
                "Config file {:?} exists but failed to load: {}",
                path,
                error
            );
            return Err(error);
        }

        // No config files exist anywhere - use embedded default TOML
        tracing::info!("No config file found, using built-in default config");
        tracing::debug!(
            "Searched: {}",
            search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let config = Self::from_default_toml()?;

        Ok(ConfigLoadResult {
            config,
            source: None,
            used_defaults: true,
        })
    }

    /// Get the list of paths to search for config files.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. $XDG_CONFIG_HOME/batring/config.toml
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("batring/config.toml"));
        }

        // 2. ~/.config/batring/config.toml
        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/batring/config.toml"));
        }

        // 3. ./config.toml (cwd)
        paths.push(PathBuf::from("config.toml"));

        paths
    }

    /// Validate the configuration, returning errors for invalid values.
    ///
    /// This performs strict validation - any invalid value causes an error.
    /// All problems are collected into a single `ConfigValidation` error.
    ///
    /// Note that the visibility thresholds are intentionally *not* validated
    /// here: out-of-range threshold values are clamped by their accessors
    /// instead of rejecting the whole config.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !VALID_POSITIONS.contains(&self.indicator.position.as_str()) {
            errors.push(format!(
                "indicator.position: invalid value '{}', expected one of: {}",
                self.indicator.position,
                VALID_POSITIONS.join(", ")
            ));
        }

        if self.indicator.size == 0 {
            errors.push("indicator.size: must be greater than 0".to_string());
        }

        if self.indicator.poll_interval_secs == 0 {
            errors.push("indicator.poll_interval_secs: must be greater than 0".to_string());
        }

        if !(0.0..1.0).contains(&self.gauge.inner_ratio) || self.gauge.inner_ratio == 0.0 {
            errors.push(format!(
                "gauge.inner_ratio: invalid value '{}', must be in (0.0, 1.0)",
                self.gauge.inner_ratio
            ));
        }

        if !(0.0..1.0).contains(&self.gauge.font_ratio) || self.gauge.font_ratio == 0.0 {
            errors.push(format!(
                "gauge.font_ratio: invalid value '{}', must be in (0.0, 1.0)",
                self.gauge.font_ratio
            ));
        }

        if self.gauge.padding < 0.0 {
            errors.push(format!(
                "gauge.padding: invalid value '{}', must not be negative",
                self.gauge.padding
            ));
        }

        let min_dim = self.indicator.size as f64;
        if min_dim / 2.0 - self.gauge.padding <= 0.0 {
            errors.push(format!(
                "gauge.padding: value '{}' leaves no room for the ring at indicator.size {}",
                self.gauge.padding, self.indicator.size
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation(errors))
        }
    }

    /// Print a human-readable summary of the configuration.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Indicator:".to_string());
        lines.push(format!("  size: {}px", self.indicator.size));
        lines.push(format!(
            "  position: {} (margin {}px)",
            self.indicator.position, self.indicator.margin
        ));
        lines.push(format!(
            "  poll interval: {}s",
            self.indicator.poll_interval_secs
        ));
        lines.push(format!(
            "  thresholds: charging < {}, discharging < {}",
            self.indicator.charging_threshold(),
            self.indicator.discharging_threshold()
        ));

        lines.push("\nGauge:".to_string());
        lines.push(format!("  padding: {}px", self.gauge.padding));
        lines.push(format!("  inner_ratio: {}", self.gauge.inner_ratio));
        lines.push(format!("  font_ratio: {}", self.gauge.font_ratio));
        if self.gauge.icon_path.is_empty() {
            lines.push("  icon: built-in bolt".to_string());
        } else {
            lines.push(format!("  icon: {}", self.gauge.icon_path));
        }

        lines.join("\n")
    }
}

/// Deep merge two TOML tables, with `overlay` values taking precedence.
///
/// For nested tables, recursively merges. For arrays and other values,
/// the overlay value completely replaces the base value.
fn deep_merge_toml(base: &mut Table, overlay: Table) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            // Both are tables: recursively merge
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge_toml(base_table, overlay_table);
            }
            // Otherwise: overlay value wins (insert or replace)
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Indicator placement, polling, and visibility thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorConfig {
    /// Show the indicator while charging and below this percentage.
    ///
    /// Stored raw; read through [`IndicatorConfig::charging_threshold`],
    /// which clamps to [0, 100].
    pub charging_threshold: i64,

    /// Show the indicator while discharging and below this percentage.
    ///
    /// Stored raw; read through [`IndicatorConfig::discharging_threshold`],
    /// which clamps to [0, 100].
    pub discharging_threshold: i64,

    /// Seconds between battery polls. Property-change events from the power
    /// service trigger refreshes independently of this interval.
    pub poll_interval_secs: u32,

    /// Edge length of the square gauge surface in pixels.
    pub size: u32,

    /// Screen corner the indicator is anchored to.
    pub position: String,

    /// Distance from the screen edges in pixels.
    pub margin: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            charging_threshold: 80,
            discharging_threshold: 90,
            poll_interval_secs: 2,
            size: 28,
            position: "top-right".to_string(),
            margin: 4,
        }
    }
}

impl IndicatorConfig {
    /// Charging visibility threshold, clamped to [0, 100].
    ///
    /// Out-of-range stored values must not propagate into the visibility
    /// policy, so clamping happens here at the configuration boundary.
    pub fn charging_threshold(&self) -> i32 {
        self.charging_threshold.clamp(0, 100) as i32
    }

    /// Discharging visibility threshold, clamped to [0, 100].
    pub fn discharging_threshold(&self) -> i32 {
        self.discharging_threshold.clamp(0, 100) as i32
    }
}

/// Gauge drawing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GaugeConfig {
    /// Distance from the surface edge to the outer ring radius, in pixels.
    pub padding: f64,

    /// Inner radius as a fraction of the outer radius.
    pub inner_ratio: f64,

    /// Label font size as a fraction of the surface height.
    pub font_ratio: f64,

    /// Optional path to a vector icon used as the charging glyph.
    /// Empty string means the built-in bolt icon.
    pub icon_path: String,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            padding: 2.0,
            inner_ratio: 0.9,
            font_ratio: 0.33,
            icon_path: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.indicator.charging_threshold(), 80);
        assert_eq!(config.indicator.discharging_threshold(), 90);
        assert_eq!(config.indicator.poll_interval_secs, 2);
        assert_eq!(config.gauge.padding, 2.0);
        assert_eq!(config.gauge.inner_ratio, 0.9);
        assert_eq!(config.gauge.font_ratio, 0.33);
    }

    #[test]
    fn test_thresholds_clamped() {
        let mut config = Config::default();
        config.indicator.charging_threshold = 250;
        config.indicator.discharging_threshold = -30;

        assert_eq!(config.indicator.charging_threshold(), 100);
        assert_eq!(config.indicator.discharging_threshold(), 0);

        // Clamping is not an error; the config still validates.
        config.validate().expect("clamped thresholds should validate");
    }

    #[test]
    fn test_load_with_defaults_merges_partial_config() {
        let config = Config::load_with_defaults(
            r#"
            [indicator]
            charging_threshold = 50
            "#,
        )
        .unwrap();

        // Overridden value
        assert_eq!(config.indicator.charging_threshold(), 50);
        // Everything else falls back to the embedded defaults
        assert_eq!(config.indicator.discharging_threshold(), 90);
        assert_eq!(config.gauge.inner_ratio, 0.9);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = Config::load_with_defaults(
            r#"
            [indicator]
            charge_threshold = 50
            "#,
        );
        assert!(result.is_err(), "typo'd keys should be rejected");
    }

    #[test]
    fn test_validate_rejects_bad_position() {
        let mut config = Config::default();
        config.indicator.position = "center".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("indicator.position"));
    }

    #[test]
    fn test_validate_rejects_bad_ratios() {
        let mut config = Config::default();
        config.gauge.inner_ratio = 1.5;
        config.gauge.font_ratio = 0.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("gauge.inner_ratio"));
        assert!(err.contains("gauge.font_ratio"));
    }

    #[test]
    fn test_validate_rejects_zero_inner_ratio() {
        // 0.0 would collapse the annulus into a solid disk.
        let mut config = Config::default();
        config.gauge.inner_ratio = 0.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("gauge.inner_ratio"));
    }

    #[test]
    fn test_validate_rejects_padding_larger_than_surface() {
        let mut config = Config::default();
        config.indicator.size = 10;
        config.gauge.padding = 6.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("gauge.padding"));
    }

    #[test]
    fn test_validate_collects_multiple_errors() {
        let mut config = Config::default();
        config.indicator.position = "middle".to_string();
        config.indicator.poll_interval_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("indicator.position"));
        assert!(err.contains("indicator.poll_interval_secs"));
    }

    #[test]
    fn test_deep_merge_nested_tables() {
        let mut base: Table = toml::from_str(
            r#"
            [indicator]
            size = 28
            margin = 4
            "#,
        )
        .unwrap();
        let overlay: Table = toml::from_str(
            r#"
            [indicator]
            margin = 8
            "#,
        )
        .unwrap();

        deep_merge_toml(&mut base, overlay);

        let indicator = base["indicator"].as_table().unwrap();
        assert_eq!(indicator["size"].as_integer(), Some(28));
        assert_eq!(indicator["margin"].as_integer(), Some(8));
    }
}
