//! Telemetry core for multi-agent runs: an append-only in-process store,
//! a deterministic graph synthesizer, and a heuristic optimization
//! analyzer, composed behind one surface for the API layer to mount.
//!
//! The store instance is explicitly constructed and owned by the caller;
//! there is no process-wide singleton.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

pub use tg_analyze::{
    Analyzer, AnalyzerConfig, AssistedAnalyzer, ReasoningService, RunDigest, digest_run,
};
pub use tg_core::error::{AnalysisError, StoreError, TracegraphError};
pub use tg_core::types::{
    AgentType, EventRecord, EventType, Evidence, Finding, FindingCategory, Graph, GraphEdge,
    GraphNode, MetaMap, MetaValue, NodeData, NodeKind, RecordEventInput, Run, RunId, RunStatus,
    RunSummary, Severity,
};
pub use tg_graph::{DetailLevel, GraphOptions, synthesize};
pub use tg_store::{StoreConfig, TelemetryStore};

/// Which analysis strategy `analyze` runs. Assisted analysis always
/// degrades to the deterministic battery when no reasoning service is
/// configured or the external call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Deterministic,
    Assisted,
}

pub struct Tracegraph {
    store: TelemetryStore,
    assisted: AssistedAnalyzer,
    reasoning: Option<Arc<dyn ReasoningService>>,
}

impl Default for Tracegraph {
    fn default() -> Self {
        Self::new(StoreConfig::default(), AnalyzerConfig::default())
    }
}

impl Tracegraph {
    pub fn new(store_config: StoreConfig, analyzer_config: AnalyzerConfig) -> Self {
        Self {
            store: TelemetryStore::new(store_config),
            assisted: AssistedAnalyzer::new(Analyzer::new(analyzer_config)),
            reasoning: None,
        }
    }

    #[must_use]
    pub fn with_reasoning(mut self, service: Arc<dyn ReasoningService>) -> Self {
        self.reasoning = Some(service);
        self
    }

    pub fn store(&self) -> &TelemetryStore {
        &self.store
    }

    pub fn start_run(&self, run_id: Option<RunId>) -> Result<RunId, StoreError> {
        self.store.start_run(run_id)
    }

    pub fn record_event(&self, input: RecordEventInput) -> Result<EventRecord, StoreError> {
        self.store.record_event(input)
    }

    pub fn end_run(&self, run_id: &RunId) -> Result<Run, StoreError> {
        self.store.end_run(run_id)
    }

    pub fn get_run(&self, run_id: &RunId) -> Result<Run, StoreError> {
        self.store.get_run(run_id)
    }

    pub fn list_runs(&self) -> Vec<Run> {
        self.store.list_runs()
    }

    pub fn get_events(&self, run_id: &RunId) -> Result<Vec<EventRecord>, StoreError> {
        self.store.get_events(run_id)
    }

    pub fn delete_run(&self, run_id: &RunId) -> Result<(), StoreError> {
        self.store.delete_run(run_id)
    }

    /// Synthesizes the run's graph from a point-in-time snapshot of its
    /// event log. Pure over the snapshot; never fails for a known run.
    pub fn synthesize_graph(
        &self,
        run_id: &RunId,
        options: GraphOptions,
    ) -> Result<Graph, StoreError> {
        let events = self.store.get_events(run_id)?;
        Ok(synthesize(&events, &options))
    }

    /// Produces findings for the run, ordered by severity then category.
    /// The snapshot is taken up front; no store lock is held across the
    /// assisted strategy's external call.
    pub async fn analyze(
        &self,
        run_id: &RunId,
        strategy: Strategy,
    ) -> Result<Vec<Finding>, StoreError> {
        let run = self.store.get_run(run_id)?;
        let events = self.store.get_events(run_id)?;
        let findings = match (strategy, &self.reasoning) {
            (Strategy::Assisted, Some(service)) => {
                self.assisted.analyze(service.as_ref(), &run, &events).await
            }
            _ => self.assisted.analyzer().analyze(run_id, &events),
        };
        Ok(findings)
    }
}
