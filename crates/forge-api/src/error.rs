/// Errors returned by the backend proxy client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    /// The proxy rejected the bearer credential (HTTP 401).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any other non-2xx response. `message` is the server's own message when
    /// it sent one.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The job-status endpoint reported a terminal failure.
    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// The message to show a user: the server's text where available.
    pub fn message(&self) -> String {
        match self {
            Error::Unauthorized { message } | Error::Api { message, .. } => message.clone(),
            Error::JobFailed(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
