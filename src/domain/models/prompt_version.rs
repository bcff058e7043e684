use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::posterior::BetaPosterior;

/// Highest generation temperature accepted for a prompt version.
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Bandit-arm participation status of a prompt version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmStatus {
    Active,
    Paused,
    Eliminated,
}

impl ArmStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Eliminated => "eliminated",
        }
    }

    /// Eliminated is terminal; nothing leaves it.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Eliminated)
    }
}

impl fmt::Display for ArmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "eliminated" => Ok(Self::Eliminated),
            _ => Err(anyhow::anyhow!("Invalid arm status: {s}")),
        }
    }
}

/// Immutable prompt content carried by a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptContent {
    /// System prompt text
    pub system_prompt: String,

    /// Optional first message the agent speaks
    pub initial_greeting: Option<String>,

    /// Generation temperature (0.0 - 2.0)
    pub temperature: f64,
}

impl PromptContent {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            initial_greeting: None,
            temperature: 0.7,
        }
    }

    #[must_use]
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.initial_greeting = Some(greeting.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.system_prompt.trim().is_empty() {
            return Err("system prompt cannot be empty".to_string());
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(format!(
                "temperature {} outside 0.0..={MAX_TEMPERATURE}",
                self.temperature
            ));
        }
        Ok(())
    }
}

/// Request to create a new prompt version for an agent.
#[derive(Debug, Clone)]
pub struct NewPromptVersion {
    pub agent_id: Uuid,
    pub content: PromptContent,
    /// Stage the version as `paused` so it receives no traffic until resumed.
    pub stage_without_traffic: bool,
}

impl NewPromptVersion {
    pub const fn new(agent_id: Uuid, content: PromptContent) -> Self {
        Self {
            agent_id,
            content,
            stage_without_traffic: false,
        }
    }

    #[must_use]
    pub const fn staged(mut self) -> Self {
        self.stage_without_traffic = true;
        self
    }
}

/// Content overrides applied when forking an existing version.
#[derive(Debug, Clone, Default)]
pub struct ForkOverrides {
    pub system_prompt: Option<String>,
    /// `Some(None)` clears the greeting; `None` keeps the source's.
    pub initial_greeting: Option<Option<String>>,
    pub temperature: Option<f64>,
    pub stage_without_traffic: bool,
}

impl ForkOverrides {
    pub fn apply(&self, source: &PromptContent) -> PromptContent {
        PromptContent {
            system_prompt: self
                .system_prompt
                .clone()
                .unwrap_or_else(|| source.system_prompt.clone()),
            initial_greeting: self
                .initial_greeting
                .clone()
                .unwrap_or_else(|| source.initial_greeting.clone()),
            temperature: self.temperature.unwrap_or(source.temperature),
        }
    }
}

/// One candidate system prompt for one agent, and its bandit arm state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    /// Unique version identifier
    pub version_id: Uuid,

    /// Owning agent
    pub agent_id: Uuid,

    /// Per-agent sequence number, starting at 1
    pub version_number: u32,

    /// Prompt content (immutable)
    pub content: PromptContent,

    /// The agent's first version
    pub is_baseline: bool,

    /// Serves traffic when no experiment is running
    pub is_production: bool,

    /// Recorded successful interactions
    pub successes: u64,

    /// Recorded interactions
    pub trials: u64,

    /// Bandit participation status
    pub arm_status: ArmStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl PromptVersion {
    /// Create a version with zeroed statistics.
    pub fn new(
        agent_id: Uuid,
        version_number: u32,
        content: PromptContent,
        arm_status: ArmStatus,
    ) -> Self {
        let now = Utc::now();
        let first = version_number == 1;
        Self {
            version_id: Uuid::new_v4(),
            agent_id,
            version_number,
            content,
            is_baseline: first,
            is_production: first,
            successes: 0,
            trials: 0,
            arm_status,
            created_at: now,
            updated_at: now,
        }
    }

    pub const fn failures(&self) -> u64 {
        self.trials - self.successes
    }

    /// Raw empirical success rate; `None` before the first trial.
    pub fn booking_rate(&self) -> Option<f64> {
        (self.trials > 0).then(|| self.successes as f64 / self.trials as f64)
    }

    /// Beta posterior under a uniform Beta(1, 1) prior.
    pub fn posterior(&self) -> BetaPosterior {
        BetaPosterior::from_counts(self.successes, self.trials)
    }

    pub fn is_active(&self) -> bool {
        self.arm_status == ArmStatus::Active
    }

    /// Active and paused versions take part in comparisons.
    pub fn is_comparable(&self) -> bool {
        self.arm_status != ArmStatus::Eliminated
    }

    /// Record one outcome.
    pub fn record(&mut self, success: bool) {
        self.trials += 1;
        if success {
            self.successes += 1;
        }
        self.updated_at = Utc::now();
    }

    pub fn set_status(&mut self, status: ArmStatus) {
        self.arm_status = status;
        self.updated_at = Utc::now();
    }
}
