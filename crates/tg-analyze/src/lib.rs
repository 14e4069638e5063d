pub mod assist;
pub mod config;
pub mod digest;
pub mod rules;

pub use crate::assist::{AssistedAnalyzer, ReasoningService};
pub use crate::config::AnalyzerConfig;
pub use crate::digest::{RunDigest, ToolDigest, digest_run};
pub use crate::rules::Analyzer;
