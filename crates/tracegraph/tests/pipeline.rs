use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracegraph::{
    AgentType, AnalysisError, AnalyzerConfig, EventType, Evidence, Finding, FindingCategory,
    GraphOptions, NodeData, NodeKind, RecordEventInput, ReasoningService, RunDigest, RunId,
    Severity, StoreConfig, StoreError, Strategy, Tracegraph,
};

fn ts(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, secs).unwrap()
}

fn run_id(value: &str) -> RunId {
    RunId::new(value.to_string()).unwrap()
}

fn event(
    run: &RunId,
    secs: u32,
    event_type: EventType,
    agent: AgentType,
) -> RecordEventInput {
    RecordEventInput::new(run.clone(), ts(secs), event_type, agent, "step")
}

fn tool_pair(
    tg: &Tracegraph,
    run: &RunId,
    secs: u32,
    tool: &str,
    duration_ms: f64,
) {
    let mut start = event(run, secs, EventType::ToolCallStart, AgentType::Orchestrator);
    start.tool_name = Some(tool.to_string());
    tg.record_event(start).unwrap();

    let mut end = event(run, secs + 1, EventType::ToolCallEnd, AgentType::Orchestrator);
    end.tool_name = Some(tool.to_string());
    end.duration_ms = Some(duration_ms);
    end.success = Some(true);
    tg.record_event(end).unwrap();
}

#[tokio::test]
async fn scenario_a_slow_tool_call() {
    let tg = Tracegraph::new(
        StoreConfig::default(),
        AnalyzerConfig {
            slow_tool_call_ms: 3000.0,
            ..AnalyzerConfig::default()
        },
    );
    let id = tg.start_run(Some(run_id("scenario-a"))).unwrap();
    tg.record_event(event(&id, 0, EventType::RunStart, AgentType::Orchestrator))
        .unwrap();
    tool_pair(&tg, &id, 1, "kb_search", 5200.0);
    tg.record_event(event(&id, 3, EventType::RunEnd, AgentType::Orchestrator))
        .unwrap();

    let findings = tg.analyze(&id, Strategy::Deterministic).await.unwrap();
    assert_eq!(findings.len(), 1);
    let finding = &findings[0];
    assert_eq!(finding.category, FindingCategory::Performance);
    assert_eq!(finding.severity, Severity::High);
    assert!(finding.title.contains("kb_search"));
    assert!(finding.evidence.iter().any(|e| matches!(
        e,
        Evidence::Events { event_ids } if event_ids == &vec![3]
    )));

    let graph = tg.synthesize_graph(&id, GraphOptions::default()).unwrap();
    let agents = graph.nodes.iter().filter(|n| n.kind == NodeKind::Agent).count();
    let tools = graph.nodes.iter().filter(|n| n.kind == NodeKind::Tool).count();
    assert_eq!(agents, 1);
    assert_eq!(tools, 1);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].source, "agent_orchestrator");
    assert_eq!(graph.edges[0].target, "tool_kb_search");
}

#[tokio::test]
async fn scenario_b_redundant_tool_use() {
    let tg = Tracegraph::new(
        StoreConfig::default(),
        AnalyzerConfig {
            redundancy_threshold: 5,
            ..AnalyzerConfig::default()
        },
    );
    let id = tg.start_run(Some(run_id("scenario-b"))).unwrap();
    for i in 0..6u32 {
        tool_pair(&tg, &id, i * 2, "kb_search", 100.0);
    }

    let findings = tg.analyze(&id, Strategy::Deterministic).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].category, FindingCategory::Performance);
    assert_eq!(findings[0].severity, Severity::Medium);

    // Same log under a looser threshold stays quiet.
    let loose = Tracegraph::new(
        StoreConfig::default(),
        AnalyzerConfig {
            redundancy_threshold: 7,
            ..AnalyzerConfig::default()
        },
    );
    let id2 = loose.start_run(Some(run_id("scenario-b2"))).unwrap();
    for i in 0..6u32 {
        tool_pair(&loose, &id2, i * 2, "kb_search", 100.0);
    }
    assert!(loose
        .analyze(&id2, Strategy::Deterministic)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn scenario_c_lone_end_event() {
    let tg = Tracegraph::default();
    let id = run_id("scenario-c");
    let mut end = event(&id, 0, EventType::LlmCallEnd, AgentType::Summarizer);
    end.duration_ms = Some(1800.0);
    end.model = Some("claude-sonnet".to_string());
    tg.record_event(end).unwrap();

    let graph = tg.synthesize_graph(&id, GraphOptions::default()).unwrap();
    assert_eq!(graph.nodes.len(), 1);
    match &graph.nodes[0].data {
        NodeData::Agent(agent) => {
            assert_eq!(agent.incomplete_steps, 1);
            assert!(agent.total_duration_ms.abs() < f64::EPSILON);
        }
        other => panic!("expected agent node, got {other:?}"),
    }
}

#[tokio::test]
async fn events_keep_append_order_and_count() {
    let tg = Tracegraph::default();
    let id = tg.start_run(None).unwrap();
    tg.record_event(event(&id, 0, EventType::RunStart, AgentType::Orchestrator))
        .unwrap();
    tool_pair(&tg, &id, 1, "kb_search", 50.0);
    tg.record_event(event(&id, 3, EventType::RunEnd, AgentType::Orchestrator))
        .unwrap();

    let events = tg.get_events(&id).unwrap();
    let ids: Vec<u64> = events.iter().map(|e| e.event_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(tg.get_run(&id).unwrap().summary.total_events, 4);
}

#[tokio::test]
async fn synthesis_is_idempotent_over_a_snapshot() {
    let tg = Tracegraph::default();
    let id = tg.start_run(Some(run_id("idempotent"))).unwrap();
    tg.record_event(event(&id, 0, EventType::RunStart, AgentType::Orchestrator))
        .unwrap();
    tool_pair(&tg, &id, 1, "kb_search", 50.0);
    let mut delegation = event(&id, 3, EventType::DelegationStart, AgentType::Orchestrator);
    delegation.from_agent = Some(AgentType::Orchestrator);
    delegation.to_agent = Some(AgentType::Summarizer);
    tg.record_event(delegation).unwrap();

    let options = GraphOptions {
        detail: tracegraph::DetailLevel::Fine,
    };
    let first = tg.synthesize_graph(&id, options).unwrap();
    let second = tg.synthesize_graph(&id, options).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn deleted_runs_are_unknown() {
    let tg = Tracegraph::default();
    let id = tg.start_run(Some(run_id("doomed"))).unwrap();
    tg.record_event(event(&id, 0, EventType::RunStart, AgentType::Orchestrator))
        .unwrap();

    tg.delete_run(&id).unwrap();
    assert!(tg.list_runs().is_empty());
    assert!(matches!(
        tg.get_events(&id),
        Err(StoreError::RunNotFound { .. })
    ));
    assert!(matches!(
        tg.synthesize_graph(&id, GraphOptions::default()),
        Err(StoreError::RunNotFound { .. })
    ));
}

struct CannedService {
    findings: Vec<Finding>,
}

#[async_trait]
impl ReasoningService for CannedService {
    async fn analyze_run(&self, _digest: &RunDigest) -> Result<Vec<Finding>, AnalysisError> {
        Ok(self.findings.clone())
    }
}

struct BrokenService;

#[async_trait]
impl ReasoningService for BrokenService {
    async fn analyze_run(&self, _digest: &RunDigest) -> Result<Vec<Finding>, AnalysisError> {
        Err(AnalysisError::ServiceUnavailable {
            message: "no route to host".to_string(),
        })
    }
}

#[tokio::test]
async fn assisted_strategy_merges_service_findings() {
    let canned = Finding {
        id: "svc-finding".to_string(),
        title: "Sequential agents could overlap".to_string(),
        description: "Summarizer waits on orchestrator output it does not use".to_string(),
        category: FindingCategory::Architecture,
        severity: Severity::Low,
        suggestion: "Run the agents concurrently".to_string(),
        impact_estimate: None,
        evidence: Vec::new(),
    };
    let tg = Tracegraph::new(
        StoreConfig::default(),
        AnalyzerConfig {
            slow_tool_call_ms: 3000.0,
            ..AnalyzerConfig::default()
        },
    )
    .with_reasoning(Arc::new(CannedService {
        findings: vec![canned],
    }));

    let id = tg.start_run(Some(run_id("assisted"))).unwrap();
    tool_pair(&tg, &id, 0, "kb_search", 5200.0);

    let findings = tg.analyze(&id, Strategy::Assisted).await.unwrap();
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].severity, Severity::High);
    assert_eq!(findings[1].id, "svc-finding");
}

#[tokio::test]
async fn assisted_strategy_falls_back_when_service_fails() {
    let tg = Tracegraph::new(
        StoreConfig::default(),
        AnalyzerConfig {
            slow_tool_call_ms: 3000.0,
            ..AnalyzerConfig::default()
        },
    )
    .with_reasoning(Arc::new(BrokenService));

    let id = tg.start_run(Some(run_id("fallback"))).unwrap();
    tool_pair(&tg, &id, 0, "kb_search", 5200.0);

    let findings = tg.analyze(&id, Strategy::Assisted).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert!(findings[0].title.contains("kb_search"));
}

#[tokio::test]
async fn assisted_without_service_uses_deterministic() {
    let tg = Tracegraph::new(
        StoreConfig::default(),
        AnalyzerConfig {
            slow_tool_call_ms: 3000.0,
            ..AnalyzerConfig::default()
        },
    );
    let id = tg.start_run(Some(run_id("no-service"))).unwrap();
    tool_pair(&tg, &id, 0, "kb_search", 5200.0);

    let assisted = tg.analyze(&id, Strategy::Assisted).await.unwrap();
    let deterministic = tg.analyze(&id, Strategy::Deterministic).await.unwrap();
    assert_eq!(assisted, deterministic);
}
