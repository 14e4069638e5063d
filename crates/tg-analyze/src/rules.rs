use crate::config::AnalyzerConfig;
use std::collections::BTreeMap;
use tg_core::types::{
    AgentType, EventRecord, EventType, Evidence, Finding, FindingCategory, RunId, Severity,
};

/// Deterministic strategy: a fixed battery of pure rules evaluated
/// independently over the event log. Each rule is order-independent and
/// individually testable; the result is sorted by severity, then category.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, run_id: &RunId, events: &[EventRecord]) -> Vec<Finding> {
        let mut findings = Vec::new();
        findings.extend(self.slow_tool_calls(run_id, events));
        findings.extend(self.slow_llm_calls(run_id, events));
        findings.extend(self.redundant_tool_calls(run_id, events));
        findings.extend(self.error_rates(run_id, events));
        findings.extend(self.delegation_depth(run_id, events));
        findings.extend(self.tool_volume(run_id, events));
        sort_findings(&mut findings);
        findings
    }

    /// Any tool call slower than the threshold, one finding per tool.
    fn slow_tool_calls(&self, run_id: &RunId, events: &[EventRecord]) -> Vec<Finding> {
        let mut slow: BTreeMap<&str, Vec<&EventRecord>> = BTreeMap::new();
        for event in events {
            if event.event_type != EventType::ToolCallEnd {
                continue;
            }
            let (Some(tool), Some(duration)) = (event.tool_name.as_deref(), event.duration_ms)
            else {
                continue;
            };
            if duration > self.config.slow_tool_call_ms {
                slow.entry(tool).or_default().push(event);
            }
        }

        slow.into_iter()
            .map(|(tool, hits)| {
                let max = hits.iter().filter_map(|e| e.duration_ms).fold(0.0, f64::max);
                let title = format!("Slow tool calls: {tool}");
                Finding {
                    id: Finding::stable_id(run_id, FindingCategory::Performance, &title),
                    description: format!(
                        "{} call(s) to {tool} exceeded {:.0}ms (slowest: {max:.0}ms)",
                        hits.len(),
                        self.config.slow_tool_call_ms,
                    ),
                    title,
                    category: FindingCategory::Performance,
                    severity: Severity::High,
                    suggestion: format!(
                        "Profile {tool} and consider caching results or narrowing its inputs"
                    ),
                    impact_estimate: Some("Directly reduces end-to-end run latency".to_string()),
                    evidence: vec![
                        Evidence::Events {
                            event_ids: hits.iter().map(|e| e.event_id).collect(),
                        },
                        Evidence::Stat {
                            name: "max_duration_ms".to_string(),
                            value: max,
                        },
                    ],
                }
            })
            .collect()
    }

    /// Same threshold check for LLM calls, one finding per model.
    fn slow_llm_calls(&self, run_id: &RunId, events: &[EventRecord]) -> Vec<Finding> {
        let mut slow: BTreeMap<&str, Vec<&EventRecord>> = BTreeMap::new();
        for event in events {
            if event.event_type != EventType::LlmCallEnd {
                continue;
            }
            let Some(duration) = event.duration_ms else {
                continue;
            };
            if duration > self.config.slow_llm_call_ms {
                slow.entry(event.model.as_deref().unwrap_or("unknown"))
                    .or_default()
                    .push(event);
            }
        }

        slow.into_iter()
            .map(|(model, hits)| {
                let max = hits.iter().filter_map(|e| e.duration_ms).fold(0.0, f64::max);
                let title = format!("Slow LLM calls: {model}");
                Finding {
                    id: Finding::stable_id(run_id, FindingCategory::Performance, &title),
                    description: format!(
                        "{} LLM call(s) to {model} exceeded {:.0}ms (slowest: {max:.0}ms)",
                        hits.len(),
                        self.config.slow_llm_call_ms,
                    ),
                    title,
                    category: FindingCategory::Performance,
                    severity: Severity::High,
                    suggestion: "Trim prompt size, stream the response, or pick a faster model"
                        .to_string(),
                    impact_estimate: Some("Directly reduces end-to-end run latency".to_string()),
                    evidence: vec![
                        Evidence::Events {
                            event_ids: hits.iter().map(|e| e.event_id).collect(),
                        },
                        Evidence::Stat {
                            name: "max_duration_ms".to_string(),
                            value: max,
                        },
                    ],
                }
            })
            .collect()
    }

    /// The same tool invoked more than N times by the same agent.
    fn redundant_tool_calls(&self, run_id: &RunId, events: &[EventRecord]) -> Vec<Finding> {
        let mut counts: BTreeMap<(AgentType, &str), Vec<u64>> = BTreeMap::new();
        for event in events {
            if event.event_type != EventType::ToolCallStart {
                continue;
            }
            if let Some(tool) = event.tool_name.as_deref() {
                counts
                    .entry((event.agent_type.clone(), tool))
                    .or_default()
                    .push(event.event_id);
            }
        }

        counts
            .into_iter()
            .filter(|(_, ids)| ids.len() as u64 > self.config.redundancy_threshold)
            .map(|((agent, tool), ids)| {
                let title = format!("Redundant tool use: {tool} by {agent}");
                Finding {
                    id: Finding::stable_id(run_id, FindingCategory::Performance, &title),
                    description: format!(
                        "{agent} invoked {tool} {} times within one run",
                        ids.len()
                    ),
                    title,
                    category: FindingCategory::Performance,
                    severity: Severity::Medium,
                    suggestion: format!(
                        "Batch or cache {tool} calls instead of re-invoking it per step"
                    ),
                    impact_estimate: Some("Fewer round trips per run".to_string()),
                    evidence: vec![
                        Evidence::Stat {
                            name: "invocations".to_string(),
                            value: ids.len() as f64,
                        },
                        Evidence::Events { event_ids: ids },
                    ],
                }
            })
            .collect()
    }

    /// Failure ratio per call kind (each tool, each model).
    fn error_rates(&self, run_id: &RunId, events: &[EventRecord]) -> Vec<Finding> {
        struct Tally {
            total: u64,
            failures: u64,
            failed_ids: Vec<u64>,
        }
        let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
        for event in events {
            let kind = match event.event_type {
                EventType::ToolCallEnd => event
                    .tool_name
                    .as_deref()
                    .map(|tool| format!("tool {tool}")),
                EventType::LlmCallEnd => {
                    Some(format!("llm {}", event.model.as_deref().unwrap_or("unknown")))
                }
                _ => None,
            };
            let Some(kind) = kind else { continue };
            let tally = tallies.entry(kind).or_insert(Tally {
                total: 0,
                failures: 0,
                failed_ids: Vec::new(),
            });
            tally.total += 1;
            if event.success == Some(false) {
                tally.failures += 1;
                tally.failed_ids.push(event.event_id);
            }
        }

        tallies
            .into_iter()
            .filter(|(_, tally)| {
                tally.failures > 0
                    && (tally.failures as f64 / tally.total as f64) > self.config.error_rate_threshold
            })
            .map(|(kind, tally)| {
                let rate = tally.failures as f64 / tally.total as f64;
                let title = format!("High error rate: {kind}");
                Finding {
                    id: Finding::stable_id(run_id, FindingCategory::Reliability, &title),
                    description: format!(
                        "{} of {} call(s) failed ({:.0}%)",
                        tally.failures,
                        tally.total,
                        rate * 100.0
                    ),
                    title,
                    category: FindingCategory::Reliability,
                    severity: Severity::Critical,
                    suggestion: "Investigate the failing calls and add retries or guards upstream"
                        .to_string(),
                    impact_estimate: Some("Failed calls waste the whole run".to_string()),
                    evidence: vec![
                        Evidence::Events {
                            event_ids: tally.failed_ids,
                        },
                        Evidence::Stat {
                            name: "error_rate".to_string(),
                            value: rate,
                        },
                    ],
                }
            })
            .collect()
    }

    /// Delegation nesting deeper than the configured limit.
    fn delegation_depth(&self, run_id: &RunId, events: &[EventRecord]) -> Vec<Finding> {
        let mut depth: u64 = 0;
        let mut max_depth: u64 = 0;
        for event in events {
            match event.event_type {
                EventType::DelegationStart => {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                }
                EventType::DelegationEnd => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        if max_depth <= self.config.delegation_depth_limit {
            return Vec::new();
        }
        let title = "Deep delegation chain".to_string();
        vec![Finding {
            id: Finding::stable_id(run_id, FindingCategory::Architecture, &title),
            description: format!(
                "Delegations nested {max_depth} deep (limit {})",
                self.config.delegation_depth_limit
            ),
            title,
            category: FindingCategory::Architecture,
            severity: Severity::Medium,
            suggestion: "Flatten the agent hierarchy or let the orchestrator fan out directly"
                .to_string(),
            impact_estimate: Some("Each hop adds latency and failure surface".to_string()),
            evidence: vec![Evidence::Stat {
                name: "max_depth".to_string(),
                value: max_depth as f64,
            }],
        }]
    }

    /// Overall tool-call volume beyond which batching or caching pays off.
    fn tool_volume(&self, run_id: &RunId, events: &[EventRecord]) -> Vec<Finding> {
        let calls: Vec<u64> = events
            .iter()
            .filter(|e| e.event_type == EventType::ToolCallStart)
            .map(|e| e.event_id)
            .collect();
        if calls.len() as u64 <= self.config.tool_volume_threshold {
            return Vec::new();
        }
        let title = "High tool call volume".to_string();
        vec![Finding {
            id: Finding::stable_id(run_id, FindingCategory::Cost, &title),
            description: format!("The run made {} tool calls", calls.len()),
            title,
            category: FindingCategory::Cost,
            severity: Severity::Low,
            suggestion: "Cache or batch tool calls to reduce overhead".to_string(),
            impact_estimate: Some("Reduced latency and per-call cost".to_string()),
            evidence: vec![Evidence::Stat {
                name: "tool_calls".to_string(),
                value: calls.len() as f64,
            }],
        }]
    }
}

/// Presentation order: severity (critical first), then category name, then
/// title for a stable tie-break.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
            .then_with(|| a.title.cmp(&b.title))
    });
}
