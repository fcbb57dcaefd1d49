mod client;
pub mod error;
pub mod models;
pub mod types;

use async_trait::async_trait;

pub use client::HttpBackend;
pub use error::{Error, Result};
pub use models::{DEFAULT_PHOTO_MODEL, PHOTO_MODELS, PhotoModel};
pub use types::{
    AspectRatio, AuthUser, EditImageRequest, EditImageResponse, GenerateImagesRequest,
    GenerateImagesResponse, GenerateVideoRequest, LoginRequest, SignupRequest, StartImage,
    VideoStatus, VideoSubmission,
};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Configuration for the backend proxy client.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
        }
    }
}

/// Create an HTTP backend with the given config.
pub fn backend(config: BackendConfig) -> HttpBackend {
    HttpBackend::new(config)
}

/// The generative-media operations the proxy exposes.
///
/// Every call takes the caller's bearer token explicitly; `None` sends the
/// request unauthenticated and lets the proxy answer 401.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn edit_image(
        &self,
        token: Option<&str>,
        request: &EditImageRequest,
    ) -> Result<EditImageResponse>;

    async fn generate_images(
        &self,
        token: Option<&str>,
        request: &GenerateImagesRequest,
    ) -> Result<GenerateImagesResponse>;

    async fn generate_video(
        &self,
        token: Option<&str>,
        request: &GenerateVideoRequest,
    ) -> Result<VideoSubmission>;

    async fn video_status(&self, token: Option<&str>, operation_name: &str) -> Result<VideoStatus>;
}
