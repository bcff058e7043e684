use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project configuration, relative to the project root.
pub const CONFIG_DIR: &str = ".promptbandit";

/// Prefix for environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "PROMPTBANDIT_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {name}: {value}. Must be strictly between 0 and 1")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error(
        "Invalid thresholds: elimination_probability_threshold ({0}) must be below winner_probability_threshold ({1})"
    )]
    InvertedThresholds(f64, f64),

    #[error("Invalid draws: {0}. Must be at least 1")]
    InvalidDraws(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .promptbandit/config.yaml
    /// 3. .promptbandit/local.yaml (optional local overrides)
    /// 4. Environment variables (PROMPTBANDIT_* prefix)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// [`Self::load`] rooted at `project_dir` instead of the working directory.
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Config> {
        let config_dir = project_dir.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Yaml::file(config_dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let experiment = &config.experiment;
        for (name, value) in [
            (
                "winner_probability_threshold",
                experiment.winner_probability_threshold,
            ),
            (
                "elimination_probability_threshold",
                experiment.elimination_probability_threshold,
            ),
            ("credible_interval_mass", experiment.credible_interval_mass),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        if experiment.elimination_probability_threshold >= experiment.winner_probability_threshold
        {
            return Err(ConfigError::InvertedThresholds(
                experiment.elimination_probability_threshold,
                experiment.winner_probability_threshold,
            ));
        }

        if config.simulation.draws == 0 {
            return Err(ConfigError::InvalidDraws(config.simulation.draws));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}
