/// Domain-level failures raised by the services before anything is written.
///
/// Backend failures never show up here: the gateway logs them and hands back
/// an empty or missing result instead.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("score must be a finite number >= 0 (got {0})")]
    InvalidScore(f64),

    #[error("unknown attendance status: {0}")]
    InvalidStatus(String),

    #[error("unknown target audience: {0}")]
    InvalidAudience(String),

    #[error("unknown priority: {0}")]
    InvalidPriority(String),

    #[error("invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: String, end: String },
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidScore(_) => "invalid_score",
            ServiceError::InvalidStatus(_)
            | ServiceError::InvalidAudience(_)
            | ServiceError::InvalidPriority(_)
            | ServiceError::InvalidDate { .. }
            | ServiceError::InvalidRange { .. } => "bad_params",
        }
    }
}
