#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid base64 string")]
    InvalidDataUrl,

    #[error("unsupported image type '{mime}' for {name}")]
    UnsupportedType { name: String, mime: String },
}

pub type Result<T> = std::result::Result<T, Error>;
