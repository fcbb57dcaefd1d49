//! Conversions between binary content and the base64 text form that travels
//! through the backend proxy.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// A parsed `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub payload: String,
}

impl DataUrl {
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode(&self.payload)
    }
}

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded.trim())?)
}

pub fn to_data_url(mime_type: &str, encoded: &str) -> String {
    format!("data:{mime_type};base64,{encoded}")
}

/// Parse a data URL into its media type and base64 payload.
pub fn parse_data_url(input: &str) -> Result<DataUrl> {
    let (header, payload) = input.split_once(',').ok_or(Error::InvalidDataUrl)?;
    let mime_type = header
        .split_once(':')
        .and_then(|(_, rest)| rest.split_once(';'))
        .map(|(mime, _)| mime)
        .filter(|mime| !mime.is_empty())
        .ok_or(Error::InvalidDataUrl)?;

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        payload: payload.to_string(),
    })
}

/// The payload after the first comma, or the whole input when it carries no
/// data URL header.
pub fn split_data_url_payload(input: &str) -> &str {
    match input.split_once(',') {
        Some((_, payload)) => payload,
        None => input,
    }
}
