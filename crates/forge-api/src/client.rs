//! reqwest implementation of the backend proxy contract.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{
    AuthUser, EditImageRequest, EditImageResponse, ErrorBody, GenerateImagesRequest,
    GenerateImagesResponse, GenerateVideoRequest, LoginRequest, SignupRequest, StatusBody,
    VideoAccepted, VideoStatus, VideoSubmission,
};
use crate::{BackendConfig, MediaBackend};

pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // -- auth --

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthUser> {
        let url = self.endpoint(&["api", "auth", "login"])?;
        tracing::debug!(%url, email = %request.email, "login request");
        self.post_json(url, None, request).await
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthUser> {
        let url = self.endpoint(&["api", "auth", "signup"])?;
        tracing::debug!(%url, email = %request.email, "signup request");
        self.post_json(url, None, request).await
    }

    /// Where the browser goes to start the Google sign-in redirect flow.
    pub fn google_authorize_url(&self) -> Result<Url> {
        self.endpoint(&["api", "auth", "google"])
    }

    // -- internals --

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|_| Error::InvalidUrl(self.config.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json<B, T>(&self, url: Url, token: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(self.client.post(url), token).json(body);
        let resp = ensure_success(request.send().await?).await?;
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl MediaBackend for HttpBackend {
    async fn edit_image(
        &self,
        token: Option<&str>,
        request: &EditImageRequest,
    ) -> Result<EditImageResponse> {
        let url = self.endpoint(&["api", "gemini", "edit-image"])?;
        tracing::debug!(%url, model = %request.model, "edit-image request");
        self.post_json(url, token, request).await
    }

    async fn generate_images(
        &self,
        token: Option<&str>,
        request: &GenerateImagesRequest,
    ) -> Result<GenerateImagesResponse> {
        let url = self.endpoint(&["api", "gemini", "generate-images"])?;
        tracing::debug!(
            %url,
            count = request.number_of_images,
            aspect_ratio = request.aspect_ratio.as_str(),
            "generate-images request"
        );
        self.post_json(url, token, request).await
    }

    async fn generate_video(
        &self,
        token: Option<&str>,
        request: &GenerateVideoRequest,
    ) -> Result<VideoSubmission> {
        let url = self.endpoint(&["api", "gemini", "generate-video"])?;
        tracing::debug!(%url, "generate-video request");
        let resp = self
            .authorized(self.client.post(url), token)
            .json(request)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        if is_binary(resp.headers()) {
            let video = resp.bytes().await?.to_vec();
            return Ok(VideoSubmission::Completed { video });
        }

        let accepted: VideoAccepted = serde_json::from_str(&resp.text().await?)?;
        Ok(VideoSubmission::Accepted {
            operation_name: accepted.operation_name,
        })
    }

    async fn video_status(&self, token: Option<&str>, operation_name: &str) -> Result<VideoStatus> {
        let url = self.endpoint(&["api", "gemini", "video-status", operation_name])?;
        tracing::trace!(%url, "video-status poll");
        let resp = self
            .authorized(self.client.get(url), token)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        if is_binary(resp.headers()) {
            let video = resp.bytes().await?.to_vec();
            return Ok(VideoStatus::Ready { video });
        }

        let body: StatusBody = serde_json::from_str(&resp.text().await?)?;
        classify_status(body)
    }
}

fn classify_status(body: StatusBody) -> Result<VideoStatus> {
    if let Some(message) = error_text(body.error.as_ref()) {
        return Err(Error::JobFailed(message));
    }

    match body.status.as_deref() {
        Some("pending") | Some("running") => Ok(VideoStatus::Pending),
        Some("failed") | Some("error") => Err(Error::JobFailed(
            body.message
                .unwrap_or_else(|| "Video generation failed.".to_string()),
        )),
        other => Err(Error::UnexpectedResponse(format!(
            "unknown video status: {}",
            other.unwrap_or("<missing>")
        ))),
    }
}

fn error_text(error: Option<&serde_json::Value>) -> Option<String> {
    match error? {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(|message| message.as_str())
            .map(str::to_string)
            .or_else(|| Some(serde_json::Value::Object(map.clone()).to_string())),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn is_binary(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value.starts_with("video/") || value.starts_with("application/octet-stream")
        })
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body_text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body_text)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
    tracing::warn!(status = status.as_u16(), %message, "backend request failed");

    if status == StatusCode::UNAUTHORIZED {
        Err(Error::Unauthorized { message })
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tokio::sync::Mutex;

    use super::*;
    use crate::types::{AspectRatio, StartImage};

    #[derive(Clone, Default)]
    struct Seen {
        requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn serve(router: Router) -> HttpBackend {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        HttpBackend::new(BackendConfig {
            base_url: format!("http://{addr}/"),
        })
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    async fn record_edit(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        seen.requests.lock().await.push((bearer(&headers), body));
        Json(json!({"newImageBase64": "ZWRpdGVk", "text": "done"}))
    }

    #[tokio::test]
    async fn edit_image_sends_bearer_and_camel_case_body() {
        let seen = Seen::default();
        let backend = serve(
            Router::new()
                .route("/api/gemini/edit-image", post(record_edit))
                .with_state(seen.clone()),
        )
        .await;

        let response = backend
            .edit_image(
                Some("tok-1"),
                &EditImageRequest {
                    image: "b3JpZw==".into(),
                    mime_type: "image/png".into(),
                    prompt: "make it blue.".into(),
                    model: "m".into(),
                },
            )
            .await
            .expect("edit succeeds");

        assert_eq!(response.new_image_base64.as_deref(), Some("ZWRpdGVk"));
        assert_eq!(response.text.as_deref(), Some("done"));

        let requests = seen.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0.as_deref(), Some("Bearer tok-1"));
        assert_eq!(
            requests[0].1,
            json!({"image":"b3JpZw==","mimeType":"image/png","prompt":"make it blue.","model":"m"})
        );
    }

    #[tokio::test]
    async fn unauthorized_carries_server_message() {
        let backend = serve(Router::new().route(
            "/api/gemini/generate-images",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Unauthorized: No token provided."})),
                )
            }),
        ))
        .await;

        let err = backend
            .generate_images(
                None,
                &GenerateImagesRequest {
                    prompt: "p".into(),
                    number_of_images: 1,
                    aspect_ratio: AspectRatio::Square,
                },
            )
            .await
            .expect_err("401 is an error");

        match err {
            Error::Unauthorized { message } => {
                assert_eq!(message, "Unauthorized: No token provided.")
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_without_body_uses_generic_message() {
        let backend = serve(Router::new().route(
            "/api/gemini/generate-images",
            post(|| async { StatusCode::BAD_GATEWAY }),
        ))
        .await;

        let err = backend
            .generate_images(
                Some("t"),
                &GenerateImagesRequest {
                    prompt: "p".into(),
                    number_of_images: 1,
                    aspect_ratio: AspectRatio::Square,
                },
            )
            .await
            .expect_err("502 is an error");
        assert_eq!(err.message(), "HTTP error! status: 502");
    }

    #[tokio::test]
    async fn video_submit_and_status_variants() {
        async fn status(Path(operation): Path<String>) -> axum::response::Response {
            match operation.as_str() {
                "models/veo/operations/pending" => Json(json!({"status": "pending"})).into_response(),
                "models/veo/operations/done" => {
                    ([(header::CONTENT_TYPE, "video/mp4")], vec![0u8, 1, 2]).into_response()
                }
                _ => Json(json!({"status": "failed", "error": {"message": "quota exceeded"}}))
                    .into_response(),
            }
        }

        let backend = serve(
            Router::new()
                .route(
                    "/api/gemini/generate-video",
                    post(|Json(body): Json<Value>| async move {
                        assert_eq!(body["startImage"]["mimeType"], "image/png");
                        (
                            StatusCode::ACCEPTED,
                            Json(json!({"operationName": "models/veo/operations/pending"})),
                        )
                    }),
                )
                .route("/api/gemini/video-status/{operation}", get(status)),
        )
        .await;

        let submission = backend
            .generate_video(
                Some("t"),
                &GenerateVideoRequest {
                    prompt: "a cat".into(),
                    start_image: Some(StartImage {
                        base64: "AA==".into(),
                        mime_type: "image/png".into(),
                    }),
                },
            )
            .await
            .expect("submit");
        assert_eq!(
            submission,
            VideoSubmission::Accepted {
                operation_name: "models/veo/operations/pending".into()
            }
        );

        assert_eq!(
            backend
                .video_status(Some("t"), "models/veo/operations/pending")
                .await
                .expect("pending poll"),
            VideoStatus::Pending
        );
        assert_eq!(
            backend
                .video_status(Some("t"), "models/veo/operations/done")
                .await
                .expect("done poll"),
            VideoStatus::Ready {
                video: vec![0, 1, 2]
            }
        );
        match backend
            .video_status(Some("t"), "models/veo/operations/broken")
            .await
        {
            Err(Error::JobFailed(message)) => assert_eq!(message, "quota exceeded"),
            other => panic!("expected job failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_parses_document_id_user() {
        let backend = serve(Router::new().route(
            "/api/auth/login",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "_id": "u1",
                    "name": "Ada",
                    "email": body["email"],
                    "token": "jwt"
                }))
            }),
        ))
        .await;

        let user = backend
            .login(&LoginRequest {
                email: "ada@example.com".into(),
                password: "pw".into(),
            })
            .await
            .expect("login");
        assert_eq!(
            user,
            AuthUser {
                id: "u1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                token: "jwt".into(),
            }
        );
        assert_eq!(
            backend.google_authorize_url().expect("url").path(),
            "/api/auth/google"
        );
    }
}
