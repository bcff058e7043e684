use serde::{Deserialize, Serialize};

/// Default probability an arm must reach to be declared the winner.
pub const WINNER_PROBABILITY_THRESHOLD: f64 = 0.90;

/// Default minimum trials every arm needs before any decision is made.
pub const MIN_SAMPLES_PER_ARM: u64 = 100;

/// Default probability at or below which the bottom arm may be culled.
pub const ELIMINATION_PROBABILITY_THRESHOLD: f64 = 0.05;

/// Default posterior mass covered by reported credible intervals.
pub const CREDIBLE_INTERVAL_MASS: f64 = 0.95;

/// Default number of joint posterior draws for probability-of-best.
pub const MONTE_CARLO_DRAWS: usize = 10_000;

/// Main configuration structure for promptbandit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Decision thresholds
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// Monte Carlo settings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Thresholds used by the recommendation policy and comparison output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExperimentConfig {
    #[serde(default = "default_winner_probability_threshold")]
    pub winner_probability_threshold: f64,

    #[serde(default = "default_min_samples_per_arm")]
    pub min_samples_per_arm: u64,

    #[serde(default = "default_elimination_probability_threshold")]
    pub elimination_probability_threshold: f64,

    #[serde(default = "default_credible_interval_mass")]
    pub credible_interval_mass: f64,
}

const fn default_winner_probability_threshold() -> f64 {
    WINNER_PROBABILITY_THRESHOLD
}

const fn default_min_samples_per_arm() -> u64 {
    MIN_SAMPLES_PER_ARM
}

const fn default_elimination_probability_threshold() -> f64 {
    ELIMINATION_PROBABILITY_THRESHOLD
}

const fn default_credible_interval_mass() -> f64 {
    CREDIBLE_INTERVAL_MASS
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            winner_probability_threshold: default_winner_probability_threshold(),
            min_samples_per_arm: default_min_samples_per_arm(),
            elimination_probability_threshold: default_elimination_probability_threshold(),
            credible_interval_mass: default_credible_interval_mass(),
        }
    }
}

/// Monte Carlo configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SimulationConfig {
    /// Joint posterior draws per comparison
    #[serde(default = "default_draws")]
    pub draws: usize,

    /// Fixed seed for reproducible comparisons; fresh entropy per call when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

const fn default_draws() -> usize {
    MONTE_CARLO_DRAWS
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            draws: default_draws(),
            seed: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation policy for file output: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
