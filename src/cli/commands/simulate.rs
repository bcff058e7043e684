//! Synthetic experiment: versions with known booking rates compete under
//! Thompson sampling, optionally with an operator applying recommendations.

use anyhow::{ensure, Context, Result};
use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::adapters::InMemoryVersionRepository;
use crate::cli::commands::cancel_on_ctrl_c;
use crate::cli::display::{comparison_table, create_progress_bar, percent, ArmReport};
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{
    Config, NewPromptVersion, PromptContent, RecommendedAction, VersionComparison,
};
use crate::services::ExperimentService;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// True booking rate of a simulated version; repeat once per version
    #[arg(long = "rate", required = true, value_name = "RATE")]
    pub rates: Vec<f64>,

    /// Number of simulated conversations
    #[arg(short = 'n', long, default_value_t = 5_000)]
    pub conversations: u64,

    /// Compare every N conversations and act on the recommendation
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub apply_every: Option<u64>,

    /// Seed for outcome generation (defaults to simulation.seed)
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SimulationOutput {
    pub agent_id: Uuid,
    pub conversations: u64,
    pub seed: u64,
    pub arms: Vec<ArmReport>,
    pub recommended_action: RecommendedAction,
    pub winner: Option<String>,
    pub winner_probability: Option<f64>,
    pub min_samples_needed: u64,
    pub eliminate: Option<String>,
    /// Operator actions taken during the run
    pub applied: Vec<String>,
    #[serde(skip)]
    credible_interval_mass: f64,
}

impl CommandOutput for SimulationOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!(
                "Simulated {} conversations across {} versions (seed {})",
                self.conversations,
                self.arms.len(),
                self.seed
            ),
            String::new(),
            comparison_table(&self.arms, self.credible_interval_mass).to_string(),
            String::new(),
        ];

        let mut recommendation = format!("Recommendation: {}", self.recommended_action);
        match self.recommended_action {
            RecommendedAction::CollectingData => {
                recommendation.push_str(&format!(
                    " ({} more trials needed on the least-sampled version)",
                    self.min_samples_needed
                ));
            }
            RecommendedAction::EliminateWorst => {
                if let Some(label) = &self.eliminate {
                    recommendation.push_str(&format!(" ({label})"));
                }
            }
            RecommendedAction::DeclareWinner | RecommendedAction::ContinueTesting => {}
        }
        lines.push(recommendation);

        if let (Some(label), Some(p)) = (&self.winner, self.winner_probability) {
            lines.push(format!("Winner: {label} (P(best) {})", percent(p)));
        }

        if !self.applied.is_empty() {
            lines.push(String::new());
            lines.push("Applied:".to_string());
            lines.extend(self.applied.iter().map(|a| format!("  {a}")));
        }

        lines.join("\n")
    }
}

pub async fn execute(args: SimulateArgs, config: &Config, json_mode: bool) -> Result<()> {
    for rate in &args.rates {
        ensure!(
            (0.0..=1.0).contains(rate),
            "Booking rate {rate} must be between 0 and 1"
        );
    }

    let service = ExperimentService::in_memory(config);
    let agent_id = Uuid::new_v4();

    let mut truth: HashMap<Uuid, f64> = HashMap::new();
    let mut labels: HashMap<Uuid, String> = HashMap::new();
    for (index, rate) in args.rates.iter().enumerate() {
        let version = service
            .create_version(NewPromptVersion::new(
                agent_id,
                PromptContent::new(format!("Simulated prompt #{}", index + 1)),
            ))
            .await?;
        truth.insert(version.version_id, *rate);
        labels.insert(version.version_id, format!("v{}", version.version_number));
    }

    let seed = args
        .seed
        .or(config.simulation.seed)
        .unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    tracing::info!(
        %agent_id,
        versions = truth.len(),
        conversations = args.conversations,
        seed,
        "Starting simulation"
    );

    let progress = create_progress_bar(args.conversations, json_mode);
    let mut applied = Vec::new();
    let mut served = 0;

    for conversation in 1..=args.conversations {
        let version_id = match service.select_version(agent_id).await {
            Ok(id) => id,
            Err(DomainError::NoActiveVersion(_)) => break,
            Err(err) => return Err(err.into()),
        };
        let rate = truth
            .get(&version_id)
            .copied()
            .context("Allocator returned a version outside the simulation")?;
        service.record_outcome(version_id, rng.gen_bool(rate)).await?;
        served = conversation;
        progress.inc(1);

        if let Some(every) = args.apply_every {
            if conversation % every == 0 {
                let comparison = service.compare(agent_id).await?;
                if let Some(note) = apply(&service, &comparison, &labels, conversation).await? {
                    progress.println(&note);
                    applied.push(note);
                    if comparison.recommended_action == RecommendedAction::DeclareWinner {
                        break;
                    }
                }
            }
        }
    }
    progress.finish_and_clear();

    let cancel = cancel_on_ctrl_c();
    let comparison = service.compare_with_cancel(agent_id, &cancel).await?;
    let versions = service.list_versions(agent_id).await?;
    let mass = config.experiment.credible_interval_mass;

    let label = |id: &Uuid| labels.get(id).cloned().unwrap_or_else(|| id.to_string());
    let with_truth = |id: Uuid, report: ArmReport| match truth.get(&id) {
        Some(rate) => report.with_true_rate(*rate),
        None => report,
    };

    // Compared versions in rank order, then eliminated ones
    let mut arms: Vec<ArmReport> = comparison
        .versions
        .iter()
        .map(|stats| {
            with_truth(
                stats.version_id,
                ArmReport::from_stats(label(&stats.version_id), stats),
            )
        })
        .collect();
    arms.extend(
        versions
            .iter()
            .filter(|v| comparison.get(v.version_id).is_none())
            .map(|v| {
                with_truth(
                    v.version_id,
                    ArmReport::uncompared(label(&v.version_id), v, mass),
                )
            }),
    );

    let result = SimulationOutput {
        agent_id,
        conversations: served,
        seed,
        arms,
        recommended_action: comparison.recommended_action,
        winner: comparison.winner_id.as_ref().map(label),
        winner_probability: comparison.winner_probability,
        min_samples_needed: comparison.min_samples_needed,
        eliminate: comparison.eliminate_version_id.as_ref().map(label),
        applied,
        credible_interval_mass: mass,
    };

    output(&result, json_mode);
    Ok(())
}

/// Act on a recommendation the way an operator would.
async fn apply(
    service: &ExperimentService<InMemoryVersionRepository>,
    comparison: &VersionComparison,
    labels: &HashMap<Uuid, String>,
    conversation: u64,
) -> Result<Option<String>> {
    let name = |id: Uuid| labels.get(&id).cloned().unwrap_or_else(|| id.to_string());

    match comparison.recommended_action {
        RecommendedAction::EliminateWorst => {
            let Some(id) = comparison.eliminate_version_id else {
                return Ok(None);
            };
            service.eliminate(id).await?;
            Ok(Some(format!(
                "after {conversation} conversations: eliminated {}",
                name(id)
            )))
        }
        RecommendedAction::DeclareWinner => {
            let Some(id) = comparison.winner_id else {
                return Ok(None);
            };
            service.activate_as_winner(id).await?;
            Ok(Some(format!(
                "after {conversation} conversations: promoted {} to production",
                name(id)
            )))
        }
        RecommendedAction::CollectingData | RecommendedAction::ContinueTesting => Ok(None),
    }
}
