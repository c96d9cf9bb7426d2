use thiserror::Error;

/// Errors from the Matryoshka dimension transform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("cannot truncate a {len}-dimensional vector to {target} dimensions")]
    Dimension { len: usize, target: usize },

    #[error("vector prefix of {target} dimensions has zero norm")]
    ZeroVector { target: usize },
}

/// Errors from collaborator transports (embedding service, index, blob store).
///
/// Used by the port traits in strata-core; adapters in strata-infra map
/// their transport-specific failures into these variants.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("authentication failed")]
    Authentication,

    #[error("rate limited")]
    RateLimited,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("index error: {0}")]
    Index(String),
}

/// Errors raised while ingesting one source object or document page.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type: '{0}'")]
    UnsupportedType(String),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("embedding job {handle} failed: {reason}")]
    JobFailed { handle: String, reason: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("source object error: {0}")]
    Source(String),

    #[error("document extraction error: {0}")]
    Extraction(String),

    #[error("embedding service error: {0}")]
    Embedding(String),

    #[error("ingestion timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors raised while answering a query.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("query embedding failed: {0}")]
    Embedding(String),

    #[error("vector search failed: {0}")]
    Search(String),

    #[error("answer generation failed: {0}")]
    Generation(String),
}

impl RetrievalError {
    /// Whether this error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RetrievalError::InvalidRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_display() {
        let err = TransformError::Dimension { len: 256, target: 1024 };
        assert_eq!(
            err.to_string(),
            "cannot truncate a 256-dimensional vector to 1024 dimensions"
        );
    }

    #[test]
    fn test_ingest_error_from_transform() {
        let err: IngestError = TransformError::ZeroVector { target: 256 }.into();
        assert!(matches!(err, IngestError::Transform(_)));
        assert!(err.to_string().contains("zero norm"));
    }

    #[test]
    fn test_job_failed_display() {
        let err = IngestError::JobFailed {
            handle: "arn:aws:bedrock:job/abc".to_string(),
            reason: "expired".to_string(),
        };
        assert!(err.to_string().contains("job/abc"));
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_retrieval_error_client_classification() {
        assert!(RetrievalError::InvalidRequest("empty".into()).is_client_error());
        assert!(!RetrievalError::Search("boom".into()).is_client_error());
    }
}
