pub mod encoding;
pub mod error;
mod file;

pub use encoding::{DataUrl, decode, encode, parse_data_url, split_data_url_payload, to_data_url};
pub use error::{Error, Result};
pub use file::{ACCEPTED_MIME_TYPES, ImageFile, save_encoded};
