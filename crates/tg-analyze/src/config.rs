/// Thresholds for the deterministic rule battery. Defaults follow the
/// behavior the rules were tuned against; every threshold is a
/// strictly-greater comparison.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Tool calls slower than this are flagged performance/high.
    pub slow_tool_call_ms: f64,
    /// LLM calls slower than this are flagged performance/high.
    pub slow_llm_call_ms: f64,
    /// Invocations of one tool by one agent beyond this count are flagged
    /// as redundancy.
    pub redundancy_threshold: u64,
    /// Failure ratio per call kind beyond which reliability/critical fires.
    pub error_rate_threshold: f64,
    /// Maximum tolerated delegation nesting depth.
    pub delegation_depth_limit: u64,
    /// Total tool calls in one run beyond this count suggest caching.
    pub tool_volume_threshold: u64,
    /// Upper bound on the assisted strategy's external call.
    pub assist_timeout_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            slow_tool_call_ms: 5000.0,
            slow_llm_call_ms: 5000.0,
            redundancy_threshold: 5,
            error_rate_threshold: 0.10,
            delegation_depth_limit: 3,
            tool_volume_threshold: 10,
            assist_timeout_ms: 10_000,
        }
    }
}
