pub mod artifact;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod prompt;
pub mod subjects;
pub mod video;

pub use artifact::{ArtifactRef, TransientArtifact, TransientArtifacts};
pub use error::{Error, Result};
pub use history::{EditHistory, HistoryError};
pub use orchestrator::{
    EditOutcome, EditParams, EditReply, GenerateParams, GeneratedGallery, PreparedEdit,
    RequestOrchestrator,
};
pub use prompt::{
    Adjustments, VideoEffect, VideoQuality, VideoSettings, VideoStyle,
    adjustment_clause, edit_instruction, video_instruction,
};
pub use subjects::{Subject, SubjectCollection, SubjectError, SubjectId};
pub use video::{
    DEFAULT_POLL_INTERVAL, GenerationJob, JobState, VideoEvent, VideoGenerator, VideoRequest,
};
