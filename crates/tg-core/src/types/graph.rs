use crate::types::event::{AgentType, EventRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Agent,
    Tool,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Delegation,
    ToolInvocation,
    Sequence,
}

/// Per-agent aggregate accumulated in the grouping pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentNode {
    pub agent_type: AgentType,
    pub event_count: usize,
    pub error_count: usize,
    /// Sum of producer-reported durations over resolved start/end pairs.
    pub total_duration_ms: f64,
    /// Steps with an unmatched start or a start-less end.
    pub incomplete_steps: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolCall {
    pub agent: AgentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolNode {
    pub tool_name: String,
    pub call_count: usize,
    pub calls: Vec<ToolCall>,
    pub incomplete_calls: usize,
}

/// Fine-detail node carrying the raw event for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventNode {
    pub event: EventRecord,
    /// Set when this event is an end with no matching start.
    pub incomplete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum NodeData {
    Agent(AgentNode),
    Tool(ToolNode),
    Event(EventNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub data: NodeData,
}

impl GraphNode {
    pub fn agent_id(agent: &AgentType) -> String {
        format!("agent_{agent}")
    }

    pub fn tool_id(tool_name: &str) -> String {
        format!("tool_{tool_name}")
    }

    pub fn event_id(event_id: u64) -> String {
        format!("event_{event_id}")
    }
}

/// Directed relation between two node ids. Carries no identity beyond the
/// `(source, target, kind)` triple; duplicates by that triple are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
