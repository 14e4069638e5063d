use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tg_core::error::StoreError;
use tg_core::types::{EventRecord, EventType, PairKind, RecordEventInput, Run, RunId, RunStatus};
use tg_core::validation::validate_event;
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct StoreConfig {
    /// Strict mode: `record_event` requires a started run and `start_run`
    /// rejects duplicates. Lenient mode auto-creates on first event and
    /// treats re-starts as no-ops.
    pub strict: bool,
}

struct RunState {
    run: Run,
    events: Vec<EventRecord>,
    next_event_id: u64,
}

impl RunState {
    fn new(run_id: RunId, started_at: DateTime<Utc>) -> Self {
        Self {
            run: Run::new(run_id, started_at),
            events: Vec::new(),
            next_event_id: 1,
        }
    }
}

/// In-process registry of runs and their append-only event logs. The single
/// point of truth for everything downstream; synthesis and analysis read
/// snapshots and never mutate it.
///
/// One coarse lock guards the whole registry. Appends are O(1) and readers
/// clone snapshots out, so hold times stay short.
pub struct TelemetryStore {
    config: StoreConfig,
    runs: RwLock<HashMap<RunId, RunState>>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl TelemetryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a run record. With no id, one is generated. Re-starting an
    /// existing run is a no-op returning the existing id, unless strict mode
    /// insists on creation semantics.
    pub fn start_run(&self, run_id: Option<RunId>) -> Result<RunId, StoreError> {
        let run_id = run_id.unwrap_or_else(RunId::generate);
        let mut runs = self.runs.write().expect("store lock poisoned");
        if runs.contains_key(&run_id) {
            if self.config.strict {
                return Err(StoreError::RunExists {
                    run_id: run_id.to_string(),
                });
            }
            return Ok(run_id);
        }
        info!(run_id = %run_id, "run started");
        runs.insert(run_id.clone(), RunState::new(run_id.clone(), Utc::now()));
        Ok(run_id)
    }

    /// Validates and appends one event, updating the run's summary in the
    /// same critical section. A rejected event leaves the run untouched.
    pub fn record_event(&self, input: RecordEventInput) -> Result<EventRecord, StoreError> {
        let mut runs = self.runs.write().expect("store lock poisoned");

        let last_at = runs
            .get(&input.run_id)
            .and_then(|state| state.events.last().map(|event| event.at));
        validate_event(&input, last_at)?;

        if self.config.strict && !runs.contains_key(&input.run_id) {
            return Err(StoreError::RunNotFound {
                run_id: input.run_id.to_string(),
            });
        }
        let state = runs.entry(input.run_id.clone()).or_insert_with(|| {
            info!(run_id = %input.run_id, "run auto-created on first event");
            RunState::new(input.run_id.clone(), input.at)
        });

        let event = EventRecord {
            run_id: input.run_id,
            event_id: state.next_event_id,
            at: input.at,
            event_type: input.event_type,
            agent_type: input.agent_type,
            step_name: input.step_name,
            duration_ms: input.duration_ms,
            success: input.success,
            tool_name: input.tool_name,
            model: input.model,
            from_agent: input.from_agent,
            to_agent: input.to_agent,
            error_message: input.error_message,
            metadata: input.metadata,
        };
        state.next_event_id += 1;

        let summary = &mut state.run.summary;
        summary.total_events += 1;
        match event.event_type.pair_kind() {
            Some(PairKind::Llm) if event.event_type.is_start() => summary.llm_calls += 1,
            Some(PairKind::Tool) if event.event_type.is_start() => summary.tool_calls += 1,
            Some(PairKind::Delegation) if event.event_type.is_start() => summary.delegations += 1,
            _ => {}
        }
        if event.success == Some(false) || event.event_type == EventType::Error {
            summary.error_count += 1;
        }

        if event.event_type == EventType::RunEnd {
            close_run(&mut state.run, event.at);
        }

        debug!(
            run_id = %event.run_id,
            event_id = event.event_id,
            event_type = ?event.event_type,
            "event recorded"
        );
        state.events.push(event.clone());
        Ok(event)
    }

    /// Marks the run completed, or failed when any recorded event failed.
    /// A no-op on an already closed run; status never transitions back.
    pub fn end_run(&self, run_id: &RunId) -> Result<Run, StoreError> {
        let mut runs = self.runs.write().expect("store lock poisoned");
        let state = runs.get_mut(run_id).ok_or_else(|| StoreError::RunNotFound {
            run_id: run_id.to_string(),
        })?;
        close_run(&mut state.run, Utc::now());
        info!(run_id = %run_id, status = ?state.run.status, "run ended");
        Ok(state.run.clone())
    }

    pub fn get_run(&self, run_id: &RunId) -> Result<Run, StoreError> {
        let runs = self.runs.read().expect("store lock poisoned");
        runs.get(run_id)
            .map(|state| state.run.clone())
            .ok_or_else(|| StoreError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    /// All runs, most recently started first.
    pub fn list_runs(&self) -> Vec<Run> {
        let runs = self.runs.read().expect("store lock poisoned");
        let mut all: Vec<Run> = runs.values().map(|state| state.run.clone()).collect();
        all.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all
    }

    /// Point-in-time snapshot of the run's event log, in append order.
    pub fn get_events(&self, run_id: &RunId) -> Result<Vec<EventRecord>, StoreError> {
        let runs = self.runs.read().expect("store lock poisoned");
        runs.get(run_id)
            .map(|state| state.events.clone())
            .ok_or_else(|| StoreError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    pub fn delete_run(&self, run_id: &RunId) -> Result<(), StoreError> {
        let mut runs = self.runs.write().expect("store lock poisoned");
        if runs.remove(run_id).is_none() {
            return Err(StoreError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        info!(run_id = %run_id, "run deleted");
        Ok(())
    }
}

fn close_run(run: &mut Run, at: DateTime<Utc>) {
    if run.status != RunStatus::Running {
        return;
    }
    run.ended_at = Some(at);
    run.status = if run.summary.error_count > 0 {
        RunStatus::Failed
    } else {
        RunStatus::Completed
    };
    let elapsed = at.signed_duration_since(run.started_at);
    run.summary.total_duration_ms = Some(elapsed.num_milliseconds().max(0) as f64);
}
