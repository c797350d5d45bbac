use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("malformed filter token: {reason}")]
    MalformedToken { reason: String },
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),
    #[error("failed to encode the filter with {0:?}")]
    Encode(serde_json::Error),
}

impl FilterError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}
