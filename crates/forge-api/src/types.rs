//! Backend proxy wire types.
//!
//! These are the raw JSON shapes sent to / received from `/api/gemini/*`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditImageRequest {
    /// Base64 payload of the image being edited.
    pub image: String,
    pub mime_type: String,
    pub prompt: String,
    pub model: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditImageResponse {
    #[serde(default)]
    pub new_image_base64: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// Image generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Standard,
        AspectRatio::StandardPortrait,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::StandardPortrait => "3:4",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagesRequest {
    pub prompt: String,
    pub number_of_images: u8,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateImagesResponse {
    #[serde(default)]
    pub images: Vec<String>,
}

// ---------------------------------------------------------------------------
// Video generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StartImage {
    pub base64: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_image: Option<StartImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoAccepted {
    pub operation_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Outcome of `POST /generate-video`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSubmission {
    /// Job accepted; poll with this operation handle.
    Accepted { operation_name: String },
    /// The proxy finished the job inline and returned the video bytes.
    Completed { video: Vec<u8> },
}

/// Outcome of a single `GET /video-status/{operation}` poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStatus {
    Pending,
    Ready { video: Vec<u8> },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// The user record returned by login, signup, and the OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub token: String,
}

/// Accepts both document ids (`"64f..."`) and numeric ids (`1`).
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_user_accepts_document_and_numeric_ids() {
        let doc: AuthUser = serde_json::from_str(
            r#"{"_id":"64f1","name":"Ada","email":"ada@example.com","token":"t1"}"#,
        )
        .expect("document id");
        assert_eq!(doc.id, "64f1");

        let numeric: AuthUser =
            serde_json::from_str(r#"{"id":1,"name":"Ada","email":"ada@example.com","token":"t"}"#)
                .expect("numeric id");
        assert_eq!(numeric.id, "1");
    }

    #[test]
    fn aspect_ratio_serializes_as_ratio_text() {
        let body = GenerateImagesRequest {
            prompt: "a fox".into(),
            number_of_images: 2,
            aspect_ratio: AspectRatio::Landscape,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"prompt":"a fox","numberOfImages":2,"aspectRatio":"16:9"})
        );
        assert_eq!(AspectRatio::parse(" 3:4 "), Some(AspectRatio::StandardPortrait));
        assert_eq!(AspectRatio::parse("2:1"), None);
    }

    #[test]
    fn video_request_omits_missing_start_image() {
        let json = serde_json::to_value(GenerateVideoRequest {
            prompt: "p".into(),
            start_image: None,
        })
        .expect("serialize");
        assert_eq!(json, serde_json::json!({"prompt":"p"}));
    }
}
