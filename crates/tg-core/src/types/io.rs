use crate::types::event::{AgentType, EventType};
use crate::types::ids::RunId;
use crate::types::value::MetaMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Producer-facing event shape: everything on `EventRecord` except the
/// `event_id`, which the store assigns on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordEventInput {
    pub run_id: RunId,
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

impl RecordEventInput {
    /// Minimal well-formed input; callers set the optional fields they need.
    pub fn new(
        run_id: RunId,
        at: DateTime<Utc>,
        event_type: EventType,
        agent_type: AgentType,
        step_name: impl Into<String>,
    ) -> Self {
        Self {
            run_id,
            at,
            event_type,
            agent_type,
            step_name: step_name.into(),
            duration_ms: None,
            success: None,
            tool_name: None,
            model: None,
            from_agent: None,
            to_agent: None,
            error_message: None,
            metadata: MetaMap::new(),
        }
    }
}
