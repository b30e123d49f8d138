#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid word id: {0}")]
    InvalidWordId(i64),
    #[error("word {0} is not in the learning queue")]
    WordNotInQueue(i64),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("snapshot must be a JSON object, got {0}")]
    InvalidSnapshot(&'static str),
    #[error("unsupported payload version: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
