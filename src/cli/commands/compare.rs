//! Offline comparison of arm counters loaded from a snapshot file.
//!
//! ```yaml
//! arms:
//!   - label: baseline
//!     successes: 48
//!     trials: 160
//!   - label: shorter-greeting
//!     successes: 61
//!     trials: 158
//!     status: paused
//! ```

use anyhow::{ensure, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::InMemoryVersionRepository;
use crate::cli::commands::cancel_on_ctrl_c;
use crate::cli::display::{comparison_table, percent, ArmReport};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ArmState, ArmStatus, Config, RecommendedAction};
use crate::services::ComparisonEngine;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Snapshot file (.yaml, .yml or .json)
    pub file: PathBuf,

    /// Seed for the Monte Carlo estimate (defaults to simulation.seed)
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub arms: Vec<ArmSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArmSnapshot {
    pub label: String,
    pub successes: u64,
    pub trials: u64,
    #[serde(default = "default_status")]
    pub status: ArmStatus,
}

const fn default_status() -> ArmStatus {
    ArmStatus::Active
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw)
                .with_context(|| format!("Invalid JSON snapshot {}", path.display()))?,
            _ => serde_yaml::from_str(&raw)
                .with_context(|| format!("Invalid YAML snapshot {}", path.display()))?,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.arms.is_empty(), "Snapshot contains no arms");
        for arm in &self.arms {
            ensure!(
                arm.successes <= arm.trials,
                "Arm '{}' has more successes ({}) than trials ({})",
                arm.label,
                arm.successes,
                arm.trials
            );
        }
        Ok(())
    }

    /// Arm states in file order; the first arm is the baseline.
    fn arm_states(&self) -> Vec<(String, ArmState)> {
        self.arms
            .iter()
            .zip(1_u32..)
            .map(|(arm, version_number)| {
                let state = ArmState {
                    version_id: Uuid::new_v4(),
                    version_number,
                    is_baseline: version_number == 1,
                    is_production: version_number == 1,
                    successes: arm.successes,
                    trials: arm.trials,
                    arm_status: arm.status,
                };
                (arm.label.clone(), state)
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ComparisonOutput {
    pub arms: Vec<ArmReport>,
    pub recommended_action: RecommendedAction,
    pub winner: Option<String>,
    pub winner_probability: Option<f64>,
    pub min_samples_needed: u64,
    pub eliminate: Option<String>,
    #[serde(skip)]
    credible_interval_mass: f64,
}

impl CommandOutput for ComparisonOutput {
    fn to_human(&self) -> String {
        let mut out = comparison_table(&self.arms, self.credible_interval_mass).to_string();
        out.push_str(&format!("\n\nRecommendation: {}", self.recommended_action));
        if self.recommended_action == RecommendedAction::CollectingData {
            out.push_str(&format!(" ({} more trials needed)", self.min_samples_needed));
        }
        if let Some(label) = &self.eliminate {
            out.push_str(&format!("\nEliminate: {label}"));
        }
        if let (Some(label), Some(p)) = (&self.winner, self.winner_probability) {
            out.push_str(&format!("\nWinner: {label} (P(best) {})", percent(p)));
        }
        out
    }
}

pub async fn execute(args: CompareArgs, config: &Config, json_mode: bool) -> Result<()> {
    let snapshot = Snapshot::load(&args.file)?;
    let result = compare_snapshot(&snapshot, config, args.seed).await?;
    output(&result, json_mode);
    Ok(())
}

/// Run the comparison off the async runtime; Ctrl-C cancels it.
pub async fn compare_snapshot(
    snapshot: &Snapshot,
    config: &Config,
    seed: Option<u64>,
) -> Result<ComparisonOutput> {
    let labelled = snapshot.arm_states();
    let labels: HashMap<Uuid, String> = labelled
        .iter()
        .map(|(label, arm)| (arm.version_id, label.clone()))
        .collect();
    let arms: Vec<ArmState> = labelled.into_iter().map(|(_, arm)| arm).collect();

    let engine = ComparisonEngine::new(
        Arc::new(InMemoryVersionRepository::new()),
        config.experiment.clone(),
        config.simulation.clone(),
    );
    let seed = seed.or(config.simulation.seed).unwrap_or_else(rand::random);
    let cancel = cancel_on_ctrl_c();
    let agent_id = Uuid::new_v4();

    let (comparison, arms) = tokio::task::spawn_blocking(move || {
        engine
            .evaluate(agent_id, &arms, seed, &cancel)
            .map(|comparison| (comparison, arms))
    })
    .await
    .context("Comparison task failed")??;

    let label = |id: &Uuid| labels.get(id).cloned().unwrap_or_else(|| id.to_string());
    let mass = config.experiment.credible_interval_mass;

    let mut rows: Vec<ArmReport> = comparison
        .versions
        .iter()
        .map(|stats| ArmReport::from_stats(label(&stats.version_id), stats))
        .collect();
    rows.extend(
        arms.iter()
            .filter(|arm| arm.arm_status.is_terminal())
            .map(|arm| eliminated_row(label(&arm.version_id), arm, mass)),
    );

    Ok(ComparisonOutput {
        arms: rows,
        recommended_action: comparison.recommended_action,
        winner: comparison.winner_id.as_ref().map(label),
        winner_probability: comparison.winner_probability,
        min_samples_needed: comparison.min_samples_needed,
        eliminate: comparison.eliminate_version_id.as_ref().map(label),
        credible_interval_mass: mass,
    })
}

fn eliminated_row(label: String, arm: &ArmState, mass: f64) -> ArmReport {
    let posterior = arm.posterior();
    let (lower, upper) = posterior.credible_interval(mass);
    ArmReport {
        label,
        version_number: arm.version_number,
        arm_status: arm.arm_status,
        true_rate: None,
        sample_size: arm.trials,
        booking_rate: arm.booking_rate(),
        mean_estimate: posterior.mean(),
        credible_interval_lower: lower,
        credible_interval_upper: upper,
        probability_best: None,
    }
}
