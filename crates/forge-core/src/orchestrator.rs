//! Edit and image-generation requests: validate, send, fold the result back.
//!
//! Each request is split into a synchronous `prepare` step that validates
//! and snapshots its inputs, an async `execute` step that owns everything it
//! needs, and an `apply` step that folds the reply into the caller's state.
//! The event loop can therefore drive the network future without holding a
//! borrow on its model.

use std::ops::RangeInclusive;
use std::sync::Arc;

use forge_api::{AspectRatio, EditImageRequest, GenerateImagesRequest, MediaBackend};
use forge_auth::Session;

use crate::artifact::ArtifactRef;
use crate::error::{Error, Result};
use crate::prompt::{Adjustments, edit_instruction};
use crate::subjects::{SubjectCollection, SubjectId};

pub const MISSING_EDIT_INPUT: &str = "Please select an image and provide an editing prompt.";
pub const MISSING_GENERATION_PROMPT: &str = "Please provide a prompt to generate an image.";
pub const NO_IMAGE_RETURNED: &str =
    "The AI did not return an image. It might have refused the request. Please try a different prompt.";
pub const NO_IMAGES_RETURNED: &str =
    "The AI did not return any images. It might have refused the request. Please try a different prompt.";
pub const IMAGE_COUNT_RANGE: RangeInclusive<u8> = 1..=4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditParams {
    pub prompt: String,
    pub adjustments: Adjustments,
    pub model: String,
}

impl Default for EditParams {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            adjustments: Adjustments::default(),
            model: forge_api::DEFAULT_PHOTO_MODEL.to_string(),
        }
    }
}

/// A validated edit bound to the subject it was built from.
#[derive(Debug, Clone)]
pub struct PreparedEdit {
    subject: SubjectId,
    request: EditImageRequest,
}

impl PreparedEdit {
    pub fn subject(&self) -> SubjectId {
        self.subject
    }

    pub fn request(&self) -> &EditImageRequest {
        &self.request
    }
}

/// What the proxy sent back for an edit, not yet applied.
#[derive(Debug, Clone)]
pub struct EditReply {
    subject: SubjectId,
    artifact: Option<ArtifactRef>,
    text: Option<String>,
}

impl EditReply {
    /// Commentary the provider returned alongside (or instead of) an image.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Append the returned image to the subject's history. A reply without an
    /// image is a refusal and leaves the history alone.
    pub fn apply(self, subjects: &mut SubjectCollection) -> Result<EditOutcome> {
        let Some(artifact) = self.artifact else {
            return Err(Error::ProviderRefusal(NO_IMAGE_RETURNED.to_string()));
        };
        let Some(subject) = subjects.by_id_mut(self.subject) else {
            tracing::debug!(subject = ?self.subject, "edited subject was removed; dropping reply");
            return Err(Error::Validation(
                "The edited image is no longer open.".to_string(),
            ));
        };

        subject.history.append(artifact.clone());
        tracing::info!(
            subject = ?self.subject,
            index = subject.history.current_index(),
            "edit appended to history"
        );
        Ok(EditOutcome {
            subject: self.subject,
            artifact,
            text: self.text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub subject: SubjectId,
    pub artifact: ArtifactRef,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateParams {
    pub prompt: String,
    pub count: u8,
    pub aspect_ratio: AspectRatio,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            count: 1,
            aspect_ratio: AspectRatio::default(),
        }
    }
}

/// Images produced in generation mode. Replaced wholesale, never undone.
#[derive(Debug, Default, Clone)]
pub struct GeneratedGallery {
    images: Vec<ArtifactRef>,
}

impl GeneratedGallery {
    pub fn replace(&mut self, images: Vec<ArtifactRef>) {
        self.images = images;
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn images(&self) -> &[ArtifactRef] {
        &self.images
    }

    pub fn get(&self, index: usize) -> Option<&ArtifactRef> {
        self.images.get(index)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[derive(Clone)]
pub struct RequestOrchestrator {
    backend: Arc<dyn MediaBackend>,
}

impl RequestOrchestrator {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self { backend }
    }

    pub fn prepare_edit(
        &self,
        subjects: &SubjectCollection,
        params: &EditParams,
    ) -> Result<PreparedEdit> {
        let subject = match subjects.active() {
            Some(subject) if !params.prompt.trim().is_empty() => subject,
            _ => return Err(Error::Validation(MISSING_EDIT_INPUT.to_string())),
        };
        params.adjustments.validate()?;

        Ok(PreparedEdit {
            subject: subject.id(),
            request: EditImageRequest {
                image: subject.current().encoded().to_string(),
                mime_type: subject.mime_type.clone(),
                prompt: edit_instruction(&params.prompt, &params.adjustments),
                model: params.model.clone(),
            },
        })
    }

    pub async fn execute_edit(
        &self,
        session: Option<&Session>,
        prepared: PreparedEdit,
    ) -> Result<EditReply> {
        tracing::info!(subject = ?prepared.subject, model = %prepared.request.model, "sending edit");
        let response = self
            .backend
            .edit_image(session.map(Session::bearer), &prepared.request)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "edit request failed"))?;

        Ok(EditReply {
            subject: prepared.subject,
            artifact: response
                .new_image_base64
                .filter(|encoded| !encoded.is_empty())
                .map(ArtifactRef::from),
            text: response.text.filter(|text| !text.trim().is_empty()),
        })
    }

    /// Edit the active subject in one call.
    pub async fn edit(
        &self,
        session: Option<&Session>,
        subjects: &mut SubjectCollection,
        params: &EditParams,
    ) -> Result<EditOutcome> {
        let prepared = self.prepare_edit(subjects, params)?;
        self.execute_edit(session, prepared).await?.apply(subjects)
    }

    pub fn prepare_generation(&self, params: &GenerateParams) -> Result<GenerateImagesRequest> {
        if params.prompt.trim().is_empty() {
            return Err(Error::Validation(MISSING_GENERATION_PROMPT.to_string()));
        }
        if !IMAGE_COUNT_RANGE.contains(&params.count) {
            return Err(Error::Validation(
                "You can generate between 1 and 4 images at a time.".to_string(),
            ));
        }
        Ok(GenerateImagesRequest {
            prompt: params.prompt.trim().to_string(),
            number_of_images: params.count,
            aspect_ratio: params.aspect_ratio,
        })
    }

    pub async fn execute_generation(
        &self,
        session: Option<&Session>,
        request: GenerateImagesRequest,
    ) -> Result<Vec<ArtifactRef>> {
        tracing::info!(
            count = request.number_of_images,
            aspect_ratio = request.aspect_ratio.as_str(),
            "generating images"
        );
        let response = self
            .backend
            .generate_images(session.map(Session::bearer), &request)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "generation request failed"))?;

        let images: Vec<ArtifactRef> = response
            .images
            .into_iter()
            .filter(|encoded| !encoded.is_empty())
            .map(ArtifactRef::from)
            .collect();
        if images.is_empty() {
            return Err(Error::ProviderRefusal(NO_IMAGES_RETURNED.to_string()));
        }
        Ok(images)
    }

    /// Clear the gallery, generate, and refill it on success.
    pub async fn generate_images(
        &self,
        session: Option<&Session>,
        gallery: &mut GeneratedGallery,
        params: &GenerateParams,
    ) -> Result<usize> {
        let request = self.prepare_generation(params)?;
        gallery.clear();
        let images = self.execute_generation(session, request).await?;
        let count = images.len();
        gallery.replace(images);
        Ok(count)
    }
}
