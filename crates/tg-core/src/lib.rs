pub mod error;
pub mod validation;

pub mod types;

pub use crate::error::{AnalysisError, StoreError, TracegraphError};
pub use crate::validation::validate_event;
