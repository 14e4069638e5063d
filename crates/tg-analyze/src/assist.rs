use crate::digest::{RunDigest, digest_run};
use crate::rules::{Analyzer, sort_findings};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tg_core::error::AnalysisError;
use tg_core::types::{EventRecord, Finding, Run};
use tokio::time::timeout;
use tracing::warn;

/// External reasoning capability the assisted strategy delegates to. The
/// implementation owns transport and parsing; it returns findings in the
/// shared schema or an error.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn analyze_run(&self, digest: &RunDigest) -> Result<Vec<Finding>, AnalysisError>;
}

/// Decorator enforcing the fallback contract: the deterministic battery
/// always runs, the external call is time-boxed, and any failure or
/// unusable response degrades to the deterministic result instead of
/// surfacing an error.
pub struct AssistedAnalyzer {
    analyzer: Analyzer,
}

impl AssistedAnalyzer {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub async fn analyze(
        &self,
        service: &dyn ReasoningService,
        run: &Run,
        events: &[EventRecord],
    ) -> Vec<Finding> {
        let baseline = self.analyzer.analyze(&run.run_id, events);
        let digest = digest_run(run, events);
        let deadline = Duration::from_millis(self.analyzer.config().assist_timeout_ms);

        match timeout(deadline, service.analyze_run(&digest)).await {
            Ok(Ok(assisted)) => merge(baseline, assisted),
            Ok(Err(err)) => {
                warn!(run_id = %run.run_id, error = %err, "assisted analysis failed, using deterministic findings");
                baseline
            }
            Err(_) => {
                warn!(run_id = %run.run_id, "assisted analysis timed out, using deterministic findings");
                baseline
            }
        }
    }
}

/// Union of both strategies, deduplicated by id; an assisted finding
/// supersedes the heuristic one with the same id. Assisted findings
/// missing an id or title are dropped as unusable.
fn merge(baseline: Vec<Finding>, assisted: Vec<Finding>) -> Vec<Finding> {
    let mut merged: Vec<Finding> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for finding in assisted {
        if finding.id.is_empty() || finding.title.is_empty() {
            warn!("dropping assisted finding without id or title");
            continue;
        }
        if seen.insert(finding.id.clone()) {
            merged.push(finding);
        }
    }
    for finding in baseline {
        if seen.insert(finding.id.clone()) {
            merged.push(finding);
        }
    }
    sort_findings(&mut merged);
    merged
}
