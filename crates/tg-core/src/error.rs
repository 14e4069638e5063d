use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run not found: {run_id}")]
    RunNotFound { run_id: String },
    #[error("run already exists: {run_id}")]
    RunExists { run_id: String },
    #[error("invalid event: {message}")]
    InvalidEvent { message: String },
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("reasoning service unavailable: {message}")]
    ServiceUnavailable { message: String },
    #[error("reasoning service timed out")]
    Timeout,
    #[error("unparseable reasoning response: {message}")]
    InvalidResponse { message: String },
}

#[derive(Debug, Error)]
pub enum TracegraphError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
