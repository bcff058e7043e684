//! Comparison results reported to operators and the REST layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::prompt_version::ArmStatus;

/// Advice produced by the recommendation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// At least one arm is below the minimum sample size.
    CollectingData,
    /// The top arm is confidently the best.
    DeclareWinner,
    /// The bottom arm is almost certainly not the best.
    EliminateWorst,
    /// No decision yet.
    ContinueTesting,
}

impl RecommendedAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CollectingData => "collecting_data",
            Self::DeclareWinner => "declare_winner",
            Self::EliminateWorst => "eliminate_worst",
            Self::ContinueTesting => "continue_testing",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendedAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "collecting_data" => Ok(Self::CollectingData),
            "declare_winner" => Ok(Self::DeclareWinner),
            "eliminate_worst" => Ok(Self::EliminateWorst),
            "continue_testing" => Ok(Self::ContinueTesting),
            _ => Err(anyhow::anyhow!("Invalid recommended action: {s}")),
        }
    }
}

/// Per-version statistics computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionStats {
    pub version_id: Uuid,
    pub version_number: u32,
    pub is_baseline: bool,
    /// Number of recorded trials.
    pub sample_size: u64,
    /// Posterior mean `alpha / (alpha + beta)`.
    pub mean_estimate: f64,
    /// Raw `successes / trials`; `None` before the first trial.
    pub booking_rate: Option<f64>,
    /// Monte Carlo estimate of P(this version has the highest rate).
    pub probability_best: f64,
    pub credible_interval_lower: f64,
    pub credible_interval_upper: f64,
    pub arm_status: ArmStatus,
}

/// Aggregate comparison of an agent's active and paused versions.
///
/// `versions` is ordered by `probability_best` descending, ties broken by
/// the lower `version_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub agent_id: Uuid,
    pub versions: Vec<VersionStats>,
    pub winner_id: Option<Uuid>,
    pub winner_probability: Option<f64>,
    pub recommended_action: RecommendedAction,
    pub min_samples_needed: u64,
    /// Version named by an `eliminate_worst` recommendation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eliminate_version_id: Option<Uuid>,
}

impl VersionComparison {
    /// Top-ranked version, if any.
    pub fn leader(&self) -> Option<&VersionStats> {
        self.versions.first()
    }

    /// Bottom-ranked version, if any.
    pub fn laggard(&self) -> Option<&VersionStats> {
        self.versions.last()
    }

    /// Fewest trials across compared versions.
    pub fn min_sample_size(&self) -> Option<u64> {
        self.versions.iter().map(|v| v.sample_size).min()
    }

    pub fn get(&self, version_id: Uuid) -> Option<&VersionStats> {
        self.versions.iter().find(|v| v.version_id == version_id)
    }

    /// Sum of `probability_best`; ~1.0 for any non-empty comparison.
    pub fn total_probability(&self) -> f64 {
        self.versions.iter().map(|v| v.probability_best).sum()
    }
}
