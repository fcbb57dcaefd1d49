use std::path::Path;

use crate::encoding::{decode, encode};
use crate::error::{Error, Result};

/// Media types the photo editor accepts on upload.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// An image read from disk, ready to be sent through the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub encoded: String,
}

impl ImageFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(Error::UnsupportedType {
                name,
                mime: mime_type,
            });
        }

        let bytes = std::fs::read(path)?;
        Ok(Self {
            name,
            mime_type,
            encoded: encode(bytes),
        })
    }
}

/// Decode a base64 payload and write the bytes to `path`.
pub fn save_encoded(path: impl AsRef<Path>, encoded: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, decode(encoded)?)?;
    Ok(())
}
