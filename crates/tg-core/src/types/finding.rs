use crate::types::ids::RunId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

/// Variant order is the presentation order: findings sort critical first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Performance,
    Cost,
    Reliability,
    Architecture,
}

impl FindingCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Cost => "cost",
            Self::Reliability => "reliability",
            Self::Architecture => "architecture",
        }
    }
}

/// Reference into the event log backing a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Evidence {
    Events { event_ids: Vec<u64> },
    Stat { name: String, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: FindingCategory,
    pub severity: Severity,
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

impl Finding {
    /// Stable id so re-analysis of the same run is idempotent: two findings
    /// with the same run, category, and title collapse to one.
    pub fn stable_id(run_id: &RunId, category: FindingCategory, title: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(run_id.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(category.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(title.as_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..8])
    }
}
