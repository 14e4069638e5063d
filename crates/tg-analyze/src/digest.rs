use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tg_core::types::{EventRecord, EventType, Run, RunId, RunStatus, RunSummary};
use utoipa::ToSchema;

/// Per-tool aggregate handed to the reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolDigest {
    pub tool_name: String,
    pub calls: u64,
    pub failures: u64,
    pub avg_duration_ms: f64,
    pub max_duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SlowCall {
    pub event_id: u64,
    pub step_name: String,
    pub duration_ms: f64,
}

/// Structured digest of one run: what the assisted strategy sends out
/// instead of raw, unbounded event text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RunDigest {
    pub run_id: RunId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub summary: RunSummary,
    pub tools: Vec<ToolDigest>,
    /// Top five end events by reported duration.
    pub slowest_calls: Vec<SlowCall>,
    pub max_delegation_depth: u64,
}

pub fn digest_run(run: &Run, events: &[EventRecord]) -> RunDigest {
    struct Acc {
        calls: u64,
        failures: u64,
        total_ms: f64,
        max_ms: f64,
    }
    let mut tools: BTreeMap<String, Acc> = BTreeMap::new();
    let mut depth: u64 = 0;
    let mut max_depth: u64 = 0;
    let mut ends: Vec<&EventRecord> = Vec::new();

    for event in events {
        match event.event_type {
            EventType::ToolCallEnd => {
                if let Some(tool) = &event.tool_name {
                    let acc = tools.entry(tool.clone()).or_insert(Acc {
                        calls: 0,
                        failures: 0,
                        total_ms: 0.0,
                        max_ms: 0.0,
                    });
                    acc.calls += 1;
                    if event.success == Some(false) {
                        acc.failures += 1;
                    }
                    if let Some(duration) = event.duration_ms {
                        acc.total_ms += duration;
                        acc.max_ms = acc.max_ms.max(duration);
                    }
                }
            }
            EventType::DelegationStart => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            EventType::DelegationEnd => depth = depth.saturating_sub(1),
            _ => {}
        }
        if event.event_type.is_end() && event.duration_ms.is_some() {
            ends.push(event);
        }
    }

    ends.sort_by(|a, b| {
        b.duration_ms
            .partial_cmp(&a.duration_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.event_id.cmp(&b.event_id))
    });

    RunDigest {
        run_id: run.run_id.clone(),
        status: run.status,
        started_at: run.started_at,
        ended_at: run.ended_at,
        summary: run.summary,
        tools: tools
            .into_iter()
            .map(|(tool_name, acc)| ToolDigest {
                tool_name,
                calls: acc.calls,
                failures: acc.failures,
                avg_duration_ms: if acc.calls > 0 {
                    acc.total_ms / acc.calls as f64
                } else {
                    0.0
                },
                max_duration_ms: acc.max_ms,
            })
            .collect(),
        slowest_calls: ends
            .into_iter()
            .take(5)
            .map(|event| SlowCall {
                event_id: event.event_id,
                step_name: event.step_name.clone(),
                duration_ms: event.duration_ms.unwrap_or(0.0),
            })
            .collect(),
        max_delegation_depth: max_depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tg_core::types::AgentType;

    fn mk(event_id: u64, event_type: EventType) -> EventRecord {
        EventRecord {
            run_id: RunId::new("run-1".to_string()).unwrap(),
            event_id,
            at: Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap(),
            event_type,
            agent_type: AgentType::Orchestrator,
            step_name: format!("step_{event_id}"),
            duration_ms: None,
            success: None,
            tool_name: None,
            model: None,
            from_agent: None,
            to_agent: None,
            error_message: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_digest_aggregates_tools_and_slowest_calls() {
        let run = Run::new(
            RunId::new("run-1".to_string()).unwrap(),
            Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap(),
        );
        let mut events = Vec::new();
        for (id, duration, ok) in [(1u64, 100.0, true), (2, 400.0, false), (3, 250.0, true)] {
            let mut end = mk(id, EventType::ToolCallEnd);
            end.tool_name = Some("kb_search".to_string());
            end.duration_ms = Some(duration);
            end.success = Some(ok);
            events.push(end);
        }

        let digest = digest_run(&run, &events);
        assert_eq!(digest.tools.len(), 1);
        let tool = &digest.tools[0];
        assert_eq!(tool.calls, 3);
        assert_eq!(tool.failures, 1);
        assert!((tool.avg_duration_ms - 250.0).abs() < f64::EPSILON);
        assert!((tool.max_duration_ms - 400.0).abs() < f64::EPSILON);

        // Slowest first.
        let ids: Vec<u64> = digest.slowest_calls.iter().map(|c| c.event_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_digest_tracks_delegation_depth() {
        let run = Run::new(
            RunId::new("run-1".to_string()).unwrap(),
            Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap(),
        );
        let events = vec![
            mk(1, EventType::DelegationStart),
            mk(2, EventType::DelegationStart),
            mk(3, EventType::DelegationEnd),
            mk(4, EventType::DelegationEnd),
        ];
        let digest = digest_run(&run, &events);
        assert_eq!(digest.max_delegation_depth, 2);
    }
}
