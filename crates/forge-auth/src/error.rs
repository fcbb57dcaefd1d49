#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("session json parse error: {0}")]
    SessionParse(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] forge_db::Error),

    #[error("{}", .0.message())]
    Api(#[from] forge_api::Error),

    #[error("invalid redirect payload: {0}")]
    InvalidRedirectPayload(String),

    #[error("{0}")]
    Other(String),
}
