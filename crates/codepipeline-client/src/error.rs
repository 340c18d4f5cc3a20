use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} returned {status}: {code}: {message}")]
    Api {
        operation: String,
        status: u16,
        code: String,
        message: String,
    },

    #[error("failed to parse {operation} response: {source}")]
    Parse {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("none found in the environment, shared profile files, container endpoint or instance metadata. Try adding @aws-actions/configure-aws-credentials earlier in your job to set up AWS credentials.")]
    MissingCredentials,

    #[error("{provider} credentials unavailable: {reason}. Try adding @aws-actions/configure-aws-credentials earlier in your job to set up AWS credentials.")]
    CredentialsUnavailable {
        provider: &'static str,
        reason: String,
    },

    #[error("profile '{profile}' in {path} is incomplete: {reason}")]
    Profile {
        profile: String,
        path: String,
        reason: String,
    },

    #[error("no AWS region configured: set AWS_REGION, AWS_DEFAULT_REGION or a profile region")]
    MissingRegion,
}

impl ClientError {
    /// Throttling and server-side failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::Api { status, code, .. } => {
                *status >= 500 || *status == 429 || code.contains("Throttling")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
