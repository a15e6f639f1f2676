//! Structured validation reporting.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::orchestrator::{Outcome, OutcomeStatus};

/// Stage at which a variant failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    Render,
    Validate,
}

impl std::fmt::Display for FailedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render => write!(f, "render"),
            Self::Validate => write!(f, "validate"),
        }
    }
}

/// Serializable view of one [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub chart: String,
    pub values: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<FailedStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub output: String,
}

impl From<&Outcome> for OutcomeRecord {
    fn from(outcome: &Outcome) -> Self {
        let failed_stage = match outcome.status() {
            OutcomeStatus::Valid => None,
            OutcomeStatus::RenderFailed => Some(FailedStage::Render),
            OutcomeStatus::Invalid => Some(FailedStage::Validate),
        };
        Self {
            chart: outcome.chart.clone(),
            values: outcome.values.clone(),
            success: outcome.is_success(),
            failed_stage,
            error: outcome.error.as_ref().map(ToString::to_string),
            output: outcome.output.clone(),
        }
    }
}

/// Aggregated report for one chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub chart: String,
    pub generated_at: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Sorted by values file for stable output.
    pub outcomes: Vec<OutcomeRecord>,
}

impl Report {
    pub fn new(chart: impl Into<String>, outcomes: &[Outcome]) -> Self {
        let mut records: Vec<OutcomeRecord> = outcomes.iter().map(OutcomeRecord::from).collect();
        records.sort_by(|a, b| a.values.cmp(&b.values));

        let failed = records.iter().filter(|record| !record.success).count();
        Self {
            chart: chart.into(),
            generated_at: Utc::now().to_rfc3339(),
            total: records.len(),
            passed: records.len() - failed,
            failed,
            outcomes: records,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// `1` if any variant failed, `0` otherwise.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_failures())
    }
}
