use crate::types::ids::RunId;
use crate::types::value::MetaMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    RunEnd,
    LlmCallStart,
    LlmCallEnd,
    ToolCallStart,
    ToolCallEnd,
    DelegationStart,
    DelegationEnd,
    Error,
}

/// The three paired start/end families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairKind {
    Llm,
    Tool,
    Delegation,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunStart => "run_start",
            Self::RunEnd => "run_end",
            Self::LlmCallStart => "llm_call_start",
            Self::LlmCallEnd => "llm_call_end",
            Self::ToolCallStart => "tool_call_start",
            Self::ToolCallEnd => "tool_call_end",
            Self::DelegationStart => "delegation_start",
            Self::DelegationEnd => "delegation_end",
            Self::Error => "error",
        }
    }

    pub fn pair_kind(self) -> Option<PairKind> {
        match self {
            Self::LlmCallStart | Self::LlmCallEnd => Some(PairKind::Llm),
            Self::ToolCallStart | Self::ToolCallEnd => Some(PairKind::Tool),
            Self::DelegationStart | Self::DelegationEnd => Some(PairKind::Delegation),
            Self::RunStart | Self::RunEnd | Self::Error => None,
        }
    }

    pub fn is_start(self) -> bool {
        matches!(
            self,
            Self::LlmCallStart | Self::ToolCallStart | Self::DelegationStart
        )
    }

    pub fn is_end(self) -> bool {
        matches!(
            self,
            Self::LlmCallEnd | Self::ToolCallEnd | Self::DelegationEnd
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(from = "String", into = "String")]
pub enum AgentType {
    Orchestrator,
    Summarizer,
    Diagrammer,
    Other(String),
}

impl AgentType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::Summarizer => "summarizer",
            Self::Diagrammer => "diagrammer",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for AgentType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "orchestrator" => Self::Orchestrator,
            "summarizer" => Self::Summarizer,
            "diagrammer" => Self::Diagrammer,
            _ => Self::Other(value),
        }
    }
}

impl From<AgentType> for String {
    fn from(value: AgentType) -> Self {
        value.as_str().to_string()
    }
}

impl From<&str> for AgentType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

/// One immutable fact recorded during a run. `event_id` is assigned by the
/// store, strictly increasing within the run; `duration_ms` is whatever the
/// producer measured and is never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventRecord {
    pub run_id: RunId,
    pub event_id: u64,
    pub at: DateTime<Utc>,
    pub event_type: EventType,
    pub agent_type: AgentType,
    pub step_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_agent: Option<AgentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_agent: Option<AgentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "MetaMap::is_empty")]
    pub metadata: MetaMap,
}
