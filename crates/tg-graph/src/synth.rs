use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tg_core::types::{
    AgentNode, AgentType, EdgeKind, EventNode, EventRecord, EventType, Graph, GraphEdge, GraphNode,
    NodeData, NodeKind, PairKind, ToolCall, ToolNode,
};
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    /// Agent and tool nodes only.
    #[default]
    Standard,
    /// Additionally one node per raw event, linked by sequence edges.
    Fine,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct GraphOptions {
    pub detail: DetailLevel,
}

/// Turns one run's ordered event log into nodes and edges.
///
/// Single pass, no retained state; the input is a snapshot and may describe
/// a run that is still receiving events. Identical input always yields
/// identical output, with node order following first encounter.
pub fn synthesize(events: &[EventRecord], options: &GraphOptions) -> Graph {
    let mut builder = GraphBuilder::new(options.detail);
    for (idx, event) in events.iter().enumerate() {
        builder.observe(idx, event);
    }
    builder.finish(events)
}

struct GraphBuilder {
    detail: DetailLevel,
    agents: Vec<AgentNode>,
    agent_index: HashMap<AgentType, usize>,
    tools: Vec<ToolNode>,
    tool_index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    edge_set: HashSet<GraphEdge>,
    /// Unmatched starts, FIFO per (pair kind, agent, step) key.
    pending: HashMap<(PairKind, AgentType, String), VecDeque<usize>>,
    /// Indices of start events consumed by a matching end.
    consumed: HashSet<usize>,
    /// Event ids flagged open or start-less, surfaced on fine-detail nodes.
    incomplete_events: HashSet<u64>,
    /// Previous event id per agent, for sequence edges in fine mode.
    last_event: HashMap<AgentType, u64>,
}

impl GraphBuilder {
    fn new(detail: DetailLevel) -> Self {
        Self {
            detail,
            agents: Vec::new(),
            agent_index: HashMap::new(),
            tools: Vec::new(),
            tool_index: HashMap::new(),
            edges: Vec::new(),
            edge_set: HashSet::new(),
            pending: HashMap::new(),
            consumed: HashSet::new(),
            incomplete_events: HashSet::new(),
            last_event: HashMap::new(),
        }
    }

    fn ensure_agent(&mut self, agent: &AgentType) -> usize {
        if let Some(&idx) = self.agent_index.get(agent) {
            return idx;
        }
        let idx = self.agents.len();
        self.agents.push(AgentNode {
            agent_type: agent.clone(),
            event_count: 0,
            error_count: 0,
            total_duration_ms: 0.0,
            incomplete_steps: 0,
        });
        self.agent_index.insert(agent.clone(), idx);
        idx
    }

    fn ensure_tool(&mut self, tool_name: &str) -> usize {
        if let Some(&idx) = self.tool_index.get(tool_name) {
            return idx;
        }
        let idx = self.tools.len();
        self.tools.push(ToolNode {
            tool_name: tool_name.to_string(),
            call_count: 0,
            calls: Vec::new(),
            incomplete_calls: 0,
        });
        self.tool_index.insert(tool_name.to_string(), idx);
        idx
    }

    fn push_edge(&mut self, source: String, target: String, kind: EdgeKind) {
        let edge = GraphEdge {
            source,
            target,
            kind,
        };
        if self.edge_set.insert(edge.clone()) {
            self.edges.push(edge);
        }
    }

    fn observe(&mut self, idx: usize, event: &EventRecord) {
        let agent_idx = self.ensure_agent(&event.agent_type);
        self.agents[agent_idx].event_count += 1;
        if event.success == Some(false) || event.event_type == EventType::Error {
            self.agents[agent_idx].error_count += 1;
        }

        if let Some(kind) = event.event_type.pair_kind() {
            self.observe_paired(idx, event, kind);
        }

        if self.detail == DetailLevel::Fine {
            let node_id = GraphNode::event_id(event.event_id);
            if let Some(prev) = self.last_event.insert(event.agent_type.clone(), event.event_id) {
                self.push_edge(GraphNode::event_id(prev), node_id, EdgeKind::Sequence);
            }
        }
    }

    fn observe_paired(&mut self, idx: usize, event: &EventRecord, kind: PairKind) {
        if kind == PairKind::Tool {
            if let Some(tool_name) = event.tool_name.clone() {
                self.ensure_tool(&tool_name);
                self.push_edge(
                    GraphNode::agent_id(&event.agent_type),
                    GraphNode::tool_id(&tool_name),
                    EdgeKind::ToolInvocation,
                );
            }
        }
        if kind == PairKind::Delegation {
            self.observe_delegation(event);
        }

        let key = (
            kind,
            event.agent_type.clone(),
            event.step_name.clone(),
        );
        if event.event_type.is_start() {
            self.pending.entry(key).or_default().push_back(idx);
            return;
        }

        // End event: pair it with the earliest unmatched start for the same
        // key, or treat it as a zero-start synthetic pair.
        let start = self.pending.get_mut(&key).and_then(VecDeque::pop_front);
        match start {
            Some(start_idx) => {
                self.consumed.insert(start_idx);
                let duration = event.duration_ms.unwrap_or(0.0);
                let agent_idx = self.ensure_agent(&event.agent_type);
                self.agents[agent_idx].total_duration_ms += duration;
                if kind == PairKind::Tool {
                    if let Some(tool_name) = &event.tool_name {
                        let tool_idx = self.ensure_tool(tool_name);
                        self.tools[tool_idx].calls.push(ToolCall {
                            agent: event.agent_type.clone(),
                            duration_ms: event.duration_ms,
                            success: event.success,
                        });
                    }
                }
            }
            None => {
                debug!(event_id = event.event_id, "end event without matching start");
                self.incomplete_events.insert(event.event_id);
                let agent_idx = self.ensure_agent(&event.agent_type);
                self.agents[agent_idx].incomplete_steps += 1;
                if kind == PairKind::Tool {
                    if let Some(tool_name) = &event.tool_name {
                        let tool_idx = self.ensure_tool(tool_name);
                        self.tools[tool_idx].incomplete_calls += 1;
                        self.tools[tool_idx].calls.push(ToolCall {
                            agent: event.agent_type.clone(),
                            duration_ms: None,
                            success: event.success,
                        });
                    }
                }
            }
        }
    }

    fn observe_delegation(&mut self, event: &EventRecord) {
        let (Some(from), Some(to)) = (event.from_agent.clone(), event.to_agent.clone()) else {
            return;
        };
        // Materialize both endpoints; the delegate may never emit an event
        // of its own.
        self.ensure_agent(&from);
        self.ensure_agent(&to);
        self.push_edge(
            GraphNode::agent_id(&from),
            GraphNode::agent_id(&to),
            EdgeKind::Delegation,
        );
    }

    fn finish(mut self, events: &[EventRecord]) -> Graph {
        // Trailing starts with no end so far are open steps, not errors.
        for (idx, event) in events.iter().enumerate() {
            if !event.event_type.is_start() || self.consumed.contains(&idx) {
                continue;
            }
            self.incomplete_events.insert(event.event_id);
            let agent_idx = self.ensure_agent(&event.agent_type);
            self.agents[agent_idx].incomplete_steps += 1;
            if event.event_type.pair_kind() == Some(PairKind::Tool) {
                if let Some(tool_name) = &event.tool_name {
                    let tool_idx = self.ensure_tool(tool_name);
                    self.tools[tool_idx].incomplete_calls += 1;
                    self.tools[tool_idx].calls.push(ToolCall {
                        agent: event.agent_type.clone(),
                        duration_ms: None,
                        success: None,
                    });
                }
            }
        }

        let mut nodes = Vec::with_capacity(self.agents.len() + self.tools.len());
        for agent in self.agents {
            nodes.push(GraphNode {
                id: GraphNode::agent_id(&agent.agent_type),
                kind: NodeKind::Agent,
                label: title_case(agent.agent_type.as_str()),
                data: NodeData::Agent(agent),
            });
        }
        for mut tool in self.tools {
            tool.call_count = tool.calls.len();
            nodes.push(GraphNode {
                id: GraphNode::tool_id(&tool.tool_name),
                kind: NodeKind::Tool,
                label: tool.tool_name.clone(),
                data: NodeData::Tool(tool),
            });
        }
        if self.detail == DetailLevel::Fine {
            for event in events {
                nodes.push(GraphNode {
                    id: GraphNode::event_id(event.event_id),
                    kind: NodeKind::Event,
                    label: event.event_type.as_str().to_string(),
                    data: NodeData::Event(EventNode {
                        event: event.clone(),
                        incomplete: self.incomplete_events.contains(&event.event_id),
                    }),
                });
            }
        }

        Graph {
            nodes,
            edges: self.edges,
        }
    }
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
