//! Table builder wrapper around comfy-table for consistent list display.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::domain::models::{ArmStatus, BetaPosterior, PromptVersion, VersionStats};

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// One row of a comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct ArmReport {
    pub label: String,
    pub version_number: u32,
    pub arm_status: ArmStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub true_rate: Option<f64>,
    pub sample_size: u64,
    pub booking_rate: Option<f64>,
    pub mean_estimate: f64,
    pub credible_interval_lower: f64,
    pub credible_interval_upper: f64,
    /// `None` for eliminated versions, which are not compared.
    pub probability_best: Option<f64>,
}

impl ArmReport {
    pub fn from_stats(label: impl Into<String>, stats: &VersionStats) -> Self {
        Self {
            label: label.into(),
            version_number: stats.version_number,
            arm_status: stats.arm_status,
            true_rate: None,
            sample_size: stats.sample_size,
            booking_rate: stats.booking_rate,
            mean_estimate: stats.mean_estimate,
            credible_interval_lower: stats.credible_interval_lower,
            credible_interval_upper: stats.credible_interval_upper,
            probability_best: Some(stats.probability_best),
        }
    }

    /// Row for a version left out of the comparison.
    pub fn uncompared(label: impl Into<String>, version: &PromptVersion, mass: f64) -> Self {
        let posterior: BetaPosterior = version.posterior();
        let (lower, upper) = posterior.credible_interval(mass);
        Self {
            label: label.into(),
            version_number: version.version_number,
            arm_status: version.arm_status,
            true_rate: None,
            sample_size: version.trials,
            booking_rate: version.booking_rate(),
            mean_estimate: posterior.mean(),
            credible_interval_lower: lower,
            credible_interval_upper: upper,
            probability_best: None,
        }
    }

    #[must_use]
    pub const fn with_true_rate(mut self, rate: f64) -> Self {
        self.true_rate = Some(rate);
        self
    }
}

/// Comparison table: one row per arm, in the given order.
pub fn comparison_table(rows: &[ArmReport], mass: f64) -> Table {
    let show_truth = rows.iter().any(|r| r.true_rate.is_some());
    let interval_header = format!("{:.0}% CI", mass * 100.0);

    let mut headers = vec![
        "version",
        "status",
        "trials",
        "rate",
        "mean",
        interval_header.as_str(),
        "p(best)",
    ];
    if show_truth {
        headers.push("true rate");
    }

    let mut table = list_table(&headers);
    for row in rows {
        let status = match row.arm_status {
            ArmStatus::Active => style(row.arm_status.as_str()).green(),
            ArmStatus::Paused => style(row.arm_status.as_str()).yellow(),
            ArmStatus::Eliminated => style(row.arm_status.as_str()).dim(),
        };
        let mut cells = vec![
            Cell::new(&row.label),
            Cell::new(status),
            Cell::new(row.sample_size).set_alignment(CellAlignment::Right),
            Cell::new(row.booking_rate.map_or_else(|| "-".to_string(), percent))
                .set_alignment(CellAlignment::Right),
            Cell::new(percent(row.mean_estimate)).set_alignment(CellAlignment::Right),
            Cell::new(format!(
                "{} - {}",
                percent(row.credible_interval_lower),
                percent(row.credible_interval_upper)
            )),
            Cell::new(row.probability_best.map_or_else(|| "-".to_string(), percent))
                .set_alignment(CellAlignment::Right),
        ];
        if show_truth {
            cells.push(
                Cell::new(row.true_rate.map_or_else(|| "-".to_string(), percent))
                    .set_alignment(CellAlignment::Right),
            );
        }
        table.add_row(cells);
    }
    table
}
