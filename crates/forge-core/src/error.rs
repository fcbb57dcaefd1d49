//! The user-facing failure taxonomy of the request orchestrator.

pub const SIGN_IN_AGAIN: &str = "Your session has expired. Please sign in again.";
pub const GENERIC_FAILURE: &str = "An unknown error occurred.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Missing prompt, image, or an out-of-range setting. Raised before any
    /// request is sent.
    #[error("{0}")]
    Validation(String),

    /// The proxy answered 401.
    #[error("unauthorized: {0}")]
    Auth(String),

    /// The request went through but no artifact came back.
    #[error("{0}")]
    ProviderRefusal(String),

    /// Network failure or a non-2xx answer.
    #[error("{0}")]
    Transport(String),

    /// A video job reached its Failed state.
    #[error("{0}")]
    JobFailure(String),
}

impl Error {
    /// The single string a user gets to see.
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth(_) => SIGN_IN_AGAIN.to_string(),
            Error::Validation(message)
            | Error::ProviderRefusal(message)
            | Error::Transport(message)
            | Error::JobFailure(message) => {
                if message.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    message.clone()
                }
            }
        }
    }
}

impl From<forge_api::Error> for Error {
    fn from(err: forge_api::Error) -> Self {
        match err {
            forge_api::Error::Unauthorized { message } => Error::Auth(message),
            forge_api::Error::JobFailed(message) => Error::JobFailure(message),
            other => Error::Transport(other.message()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_into_taxonomy() {
        let auth: Error = forge_api::Error::Unauthorized {
            message: "Unauthorized: Invalid token.".into(),
        }
        .into();
        assert_eq!(auth.user_message(), SIGN_IN_AGAIN);

        let server: Error = forge_api::Error::Api {
            status: 500,
            message: "Failed to generate video.".into(),
        }
        .into();
        assert_eq!(server, Error::Transport("Failed to generate video.".into()));

        let job: Error = forge_api::Error::JobFailed("quota".into()).into();
        assert_eq!(job, Error::JobFailure("quota".into()));
    }

    #[test]
    fn blank_messages_fall_back_to_generic_text() {
        assert_eq!(Error::Transport("  ".into()).user_message(), GENERIC_FAILURE);
    }
}
