//! The video job state machine and its background poller.
//!
//! `Idle -> Submitting -> Polling -> {Succeeded, Failed}`. Transitions only
//! move forward; a terminal state is never left except by a new submission,
//! which starts a fresh job.

use std::sync::Arc;
use std::time::Duration;

use forge_api::{GenerateVideoRequest, MediaBackend, StartImage, VideoStatus, VideoSubmission};
use forge_auth::Session;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::artifact::{TransientArtifact, TransientArtifacts};
use crate::error::{Error, Result};
use crate::prompt::{VideoSettings, video_instruction};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const MISSING_VIDEO_PROMPT: &str = "Please provide a prompt to generate a video.";
pub const VIDEO_FAILED: &str = "An unknown error occurred during video generation.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobState {
    #[default]
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_running(self) -> bool {
        matches!(self, JobState::Submitting | JobState::Polling)
    }
}

#[derive(Debug, Default)]
pub struct GenerationJob {
    state: JobState,
    operation_name: Option<String>,
    result: Option<TransientArtifact>,
    error: Option<String>,
    polls: u32,
}

impl GenerationJob {
    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    pub fn result(&self) -> Option<&TransientArtifact> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Status polls that came back pending.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    fn release_result(&mut self) {
        if let Some(video) = self.result.take()
            && let Err(err) = video.release()
        {
            tracing::warn!(error = %err, "failed to release previous video");
        }
    }
}

/// Progress reported by the poller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEvent {
    /// The proxy accepted the job under this operation handle.
    Polling { operation_name: String },
    Pending,
    Succeeded { video: Vec<u8> },
    Failed { message: String },
}

#[derive(Debug, Clone, Default)]
pub struct VideoRequest {
    pub prompt: String,
    pub settings: VideoSettings,
    pub start_image: Option<StartImage>,
}

/// The running poller. Dropping it aborts the task.
#[derive(Debug)]
struct PollerHandle {
    task: JoinHandle<()>,
    events: mpsc::UnboundedReceiver<VideoEvent>,
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drives one video job at a time. A new submission cancels the previous
/// poller and releases the previous result.
pub struct VideoGenerator {
    backend: Arc<dyn MediaBackend>,
    artifacts: TransientArtifacts,
    poll_interval: Duration,
    job: GenerationJob,
    poller: Option<PollerHandle>,
}

impl VideoGenerator {
    pub fn new(backend: Arc<dyn MediaBackend>, artifacts: TransientArtifacts) -> Self {
        Self {
            backend,
            artifacts,
            poll_interval: DEFAULT_POLL_INTERVAL,
            job: GenerationJob::default(),
            poller: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn job(&self) -> &GenerationJob {
        &self.job
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_some()
    }

    /// Start a job. Must be called inside a tokio runtime.
    pub fn submit(&mut self, session: Option<&Session>, request: VideoRequest) -> Result<()> {
        if request.prompt.trim().is_empty() {
            return Err(Error::Validation(MISSING_VIDEO_PROMPT.to_string()));
        }
        request.settings.validate()?;

        self.reset();
        self.job.state = JobState::Submitting;

        let wire = GenerateVideoRequest {
            prompt: video_instruction(&request.prompt, &request.settings),
            start_image: request.start_image,
        };
        let (tx, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_job(
            Arc::clone(&self.backend),
            session.map(|session| session.bearer().to_string()),
            wire,
            self.poll_interval,
            tx,
        ));
        self.poller = Some(PollerHandle { task, events });
        tracing::info!(duration_secs = request.settings.duration_secs, "video job submitted");
        Ok(())
    }

    /// Wait for the next poller event and apply it. `None` once no job is
    /// running.
    pub async fn advance(&mut self) -> Option<JobState> {
        let poller = self.poller.as_mut()?;
        let event = poller.events.recv().await;
        match event {
            Some(event) => Some(self.apply(event)),
            None => {
                self.poller = None;
                if self.job.state.is_running() {
                    self.fail(VIDEO_FAILED.to_string());
                }
                Some(self.job.state)
            }
        }
    }

    pub fn apply(&mut self, event: VideoEvent) -> JobState {
        match (self.job.state, event) {
            (JobState::Submitting, VideoEvent::Polling { operation_name }) => {
                tracing::debug!(%operation_name, "video job accepted");
                self.job.operation_name = Some(operation_name);
                self.job.state = JobState::Polling;
            }
            (JobState::Polling, VideoEvent::Pending) => {
                self.job.polls += 1;
                tracing::debug!(polls = self.job.polls, "video job still pending");
            }
            (state, VideoEvent::Succeeded { video }) if state.is_running() => {
                self.poller = None;
                match self.artifacts.acquire(&video, "mp4") {
                    Ok(artifact) => {
                        tracing::info!(len = artifact.len(), "video job succeeded");
                        self.job.result = Some(artifact);
                        self.job.state = JobState::Succeeded;
                    }
                    Err(err) => self.fail(format!("Could not store the generated video: {err}")),
                }
            }
            (state, VideoEvent::Failed { message }) if state.is_running() => {
                self.poller = None;
                self.fail(message);
            }
            (state, event) => {
                tracing::debug!(?state, ?event, "ignoring stale video event");
            }
        }
        self.job.state
    }

    /// Stop local polling and release any result.
    pub fn reset(&mut self) {
        self.poller = None;
        self.job.release_result();
        self.job = GenerationJob::default();
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(%message, "video job failed");
        self.job.error = Some(if message.trim().is_empty() {
            VIDEO_FAILED.to_string()
        } else {
            message
        });
        self.job.state = JobState::Failed;
    }
}

async fn run_job(
    backend: Arc<dyn MediaBackend>,
    token: Option<String>,
    request: GenerateVideoRequest,
    interval: Duration,
    tx: mpsc::UnboundedSender<VideoEvent>,
) {
    let token = token.as_deref();
    let operation_name = match backend.generate_video(token, &request).await {
        Ok(VideoSubmission::Accepted { operation_name }) => operation_name,
        Ok(VideoSubmission::Completed { video }) => {
            let _ = tx.send(VideoEvent::Succeeded { video });
            return;
        }
        Err(err) => {
            let _ = tx.send(failed(err));
            return;
        }
    };
    if tx
        .send(VideoEvent::Polling {
            operation_name: operation_name.clone(),
        })
        .is_err()
    {
        return;
    }

    loop {
        tokio::time::sleep(interval).await;
        let event = match backend.video_status(token, &operation_name).await {
            Ok(VideoStatus::Pending) => VideoEvent::Pending,
            Ok(VideoStatus::Ready { video }) => VideoEvent::Succeeded { video },
            Err(err) => failed(err),
        };
        let terminal = !matches!(event, VideoEvent::Pending);
        if tx.send(event).is_err() || terminal {
            return;
        }
    }
}

fn failed(err: forge_api::Error) -> VideoEvent {
    VideoEvent::Failed {
        message: Error::from(err).user_message(),
    }
}
