use thiserror::Error;

use crate::types::ExecutionStatus;

/// Boxed error carried across the collaborator seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failed call against the control plane or the report sink.
///
/// Not retried here: whatever retry policy applies lives in the client that
/// produced the error.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct TransportError {
    pub operation: &'static str,
    #[source]
    pub source: BoxError,
}

impl TransportError {
    pub fn new(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("input required and not supplied: {0}")]
    MissingInput(&'static str),

    #[error("missing AWS credentials: {0}")]
    MissingCredentials(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("pipeline execution {execution_id} finished with status {status}: {url}")]
    UnsuccessfulExecution {
        execution_id: String,
        status: ExecutionStatus,
        url: String,
    },

    #[error("polling cancelled before the execution reached a terminal state")]
    Cancelled,
}

impl PollError {
    /// Configuration problems are detected before any network call.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PollError::MissingInput(_) | PollError::MissingCredentials(_)
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, PollError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, PollError>;
