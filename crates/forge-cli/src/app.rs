use std::future::Future;
use std::pin::Pin;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use forge_api::{GenerateImagesRequest, PHOTO_MODELS, PhotoModel, StartImage};
use forge_auth::Session;
use forge_core::video::VIDEO_FAILED;
use forge_core::{
    Adjustments, ArtifactRef, EditReply, EditParams, Error, GenerateParams, GeneratedGallery,
    JobState, PreparedEdit, RequestOrchestrator, SubjectCollection, VideoGenerator, VideoRequest,
    VideoSettings,
};
use forge_media::ImageFile;

use crate::command::{self, Adjustment, Command, HELP};
use crate::suggestions;

// ---------------------------------------------------------------------------
// Editor modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorMode {
    #[default]
    Photo,
    Generation,
    Video,
}

impl EditorMode {
    pub const ALL: [EditorMode; 3] = [EditorMode::Photo, EditorMode::Generation, EditorMode::Video];

    pub fn label(self) -> &'static str {
        match self {
            EditorMode::Photo => "Photo",
            EditorMode::Generation => "Generate",
            EditorMode::Video => "Video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "photo" | "edit" => Some(EditorMode::Photo),
            "generate" | "generation" | "image" => Some(EditorMode::Generation),
            "video" => Some(EditorMode::Video),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            EditorMode::Photo => EditorMode::Generation,
            EditorMode::Generation => EditorMode::Video,
            EditorMode::Video => EditorMode::Photo,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests handed to the run loop
// ---------------------------------------------------------------------------

/// Network work the run loop should drive. At most one is in flight.
#[derive(Debug)]
pub enum Request {
    Edit(PreparedEdit),
    Generate(GenerateImagesRequest),
}

#[derive(Debug)]
enum ReplyOutcome {
    Edit(forge_core::Result<EditReply>),
    Generate(forge_core::Result<Vec<ArtifactRef>>),
}

/// A finished request, tagged with the epoch it was issued in.
#[derive(Debug)]
pub struct Reply {
    epoch: u64,
    outcome: ReplyOutcome,
}

pub type PendingReply = Pin<Box<dyn Future<Output = Reply> + Send>>;

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

pub struct App {
    pub mode: EditorMode,
    orchestrator: RequestOrchestrator,
    session: Option<Session>,

    pub subjects: SubjectCollection,
    pub adjustments: Adjustments,
    pub model_index: usize,

    pub generate: GenerateParams,
    pub gallery: GeneratedGallery,

    pub video: VideoGenerator,
    pub video_settings: VideoSettings,
    pub start_image: Option<ImageFile>,

    pub input: String,
    pub cursor_pos: usize,
    /// An edit or generation request is in flight.
    pub busy: bool,
    /// Bumped whenever in-flight work is abandoned; replies from an older
    /// epoch are dropped.
    epoch: u64,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Commentary returned by the provider with the last edit.
    pub response_text: Option<String>,
    pub show_suggestions: bool,
    loading_ticks: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        orchestrator: RequestOrchestrator,
        video: VideoGenerator,
        session: Option<Session>,
    ) -> Self {
        Self {
            mode: EditorMode::default(),
            orchestrator,
            session,
            subjects: SubjectCollection::new(),
            adjustments: Adjustments::default(),
            model_index: 0,
            generate: GenerateParams::default(),
            gallery: GeneratedGallery::default(),
            video,
            video_settings: VideoSettings::default(),
            start_image: None,
            input: String::new(),
            cursor_pos: 0,
            busy: false,
            epoch: 0,
            error: None,
            notice: None,
            response_text: None,
            show_suggestions: false,
            loading_ticks: 0,
            should_quit: false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn model(&self) -> &'static PhotoModel {
        &PHOTO_MODELS[self.model_index.min(PHOTO_MODELS.len() - 1)]
    }

    pub fn is_busy(&self) -> bool {
        self.busy || self.video.job().state().is_running()
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        suggestions::for_mode(self.mode)
    }

    /// The rotating status line shown while a video job runs.
    pub fn loading_message(&self) -> Option<&'static str> {
        self.video
            .job()
            .state()
            .is_running()
            .then(|| suggestions::loading_message(self.loading_ticks))
    }

    /// Handle a keyboard event. Returns work for the run loop, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Request> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                if self.busy {
                    self.cancel();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('z') if ctrl => self.execute(Command::Undo),
            KeyCode::Char('y') if ctrl => self.execute(Command::Redo),
            KeyCode::Tab => self.switch_mode(self.mode.next()),
            KeyCode::F(1) => self.show_suggestions = !self.show_suggestions,
            KeyCode::Esc => {
                if self.show_suggestions {
                    self.show_suggestions = false;
                } else if self.busy {
                    self.cancel();
                }
            }
            KeyCode::Enter => return self.submit(),

            // Step through open images
            KeyCode::Up if self.mode == EditorMode::Photo => {
                if let Some(index) = self.subjects.active_index()
                    && index > 0
                {
                    self.execute(Command::Select(index - 1));
                }
            }
            KeyCode::Down if self.mode == EditorMode::Photo => {
                if let Some(index) = self.subjects.active_index()
                    && index + 1 < self.subjects.len()
                {
                    self.execute(Command::Select(index + 1));
                }
            }

            // Text input
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.input.remove(prev);
                    self.cursor_pos = prev;
                }
            }
            KeyCode::Delete => {
                if self.cursor_pos < self.input.len() {
                    self.input.remove(self.cursor_pos);
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor_pos = prev;
                }
            }
            KeyCode::Right => {
                if let Some(c) = self.input[self.cursor_pos..].chars().next() {
                    self.cursor_pos += c.len_utf8();
                }
            }
            KeyCode::Home => self.cursor_pos = 0,
            KeyCode::End => self.cursor_pos = self.input.len(),
            _ => {}
        }
        None
    }

    /// Build the future for a request. It owns everything it needs, so the
    /// run loop can poll it while the app keeps handling input.
    pub fn dispatch(&self, request: Request) -> PendingReply {
        let orchestrator = self.orchestrator.clone();
        let session = self.session.clone();
        let epoch = self.epoch;
        Box::pin(async move {
            let outcome = match request {
                Request::Edit(prepared) => {
                    ReplyOutcome::Edit(orchestrator.execute_edit(session.as_ref(), prepared).await)
                }
                Request::Generate(request) => ReplyOutcome::Generate(
                    orchestrator
                        .execute_generation(session.as_ref(), request)
                        .await,
                ),
            };
            Reply { epoch, outcome }
        })
    }

    pub fn handle_reply(&mut self, reply: Reply) {
        if reply.epoch != self.epoch {
            tracing::debug!(epoch = reply.epoch, "dropping reply from abandoned request");
            return;
        }
        self.busy = false;

        match reply.outcome {
            ReplyOutcome::Edit(Ok(reply)) => {
                let text = reply.text().map(str::to_owned);
                match reply.apply(&mut self.subjects) {
                    Ok(outcome) => {
                        self.response_text = outcome.text;
                        self.notice = Some("Edit applied.".to_string());
                    }
                    Err(err) => {
                        self.response_text = text;
                        self.fail(err);
                    }
                }
            }
            ReplyOutcome::Generate(Ok(images)) => {
                self.notice = Some(format!(
                    "Generated {} image(s). Save one with :save <n> <file>.",
                    images.len()
                ));
                self.gallery.replace(images);
            }
            ReplyOutcome::Edit(Err(err)) | ReplyOutcome::Generate(Err(err)) => self.fail(err),
        }
    }

    pub fn handle_video_update(&mut self, state: JobState) {
        match state {
            JobState::Succeeded => {
                self.notice = Some("Your video is ready. Save it with :save <file>.".to_string());
            }
            JobState::Failed => {
                self.error = Some(self.video.job().error().unwrap_or(VIDEO_FAILED).to_string());
            }
            JobState::Idle | JobState::Submitting | JobState::Polling => {}
        }
    }

    /// Advance the loading message while a video job runs.
    pub fn tick(&mut self) {
        if self.video.job().state().is_running() {
            self.loading_ticks += 1;
        }
    }

    fn submit(&mut self) -> Option<Request> {
        if let Some(line) = self.input.trim().strip_prefix(':') {
            let parsed = command::parse(line);
            self.clear_input();
            match parsed {
                Ok(command) => self.execute(command),
                Err(message) => self.error = Some(message),
            }
            return None;
        }

        if self.is_busy() {
            self.notice = Some("Please wait for the current request to finish.".to_string());
            return None;
        }
        self.error = None;
        self.notice = None;
        self.response_text = None;
        self.show_suggestions = false;

        match self.mode {
            EditorMode::Photo => {
                let params = EditParams {
                    prompt: self.input.clone(),
                    adjustments: self.adjustments,
                    model: self.model().id.to_string(),
                };
                match self.orchestrator.prepare_edit(&self.subjects, &params) {
                    Ok(prepared) => {
                        self.busy = true;
                        Some(Request::Edit(prepared))
                    }
                    Err(err) => {
                        self.fail(err);
                        None
                    }
                }
            }
            EditorMode::Generation => {
                let params = GenerateParams {
                    prompt: self.input.clone(),
                    ..self.generate.clone()
                };
                match self.orchestrator.prepare_generation(&params) {
                    Ok(request) => {
                        self.gallery.clear();
                        self.busy = true;
                        Some(Request::Generate(request))
                    }
                    Err(err) => {
                        self.fail(err);
                        None
                    }
                }
            }
            EditorMode::Video => {
                let request = VideoRequest {
                    prompt: self.input.clone(),
                    settings: self.video_settings,
                    start_image: self.start_image.as_ref().map(|image| StartImage {
                        base64: image.encoded.clone(),
                        mime_type: image.mime_type.clone(),
                    }),
                };
                match self.video.submit(self.session.as_ref(), request) {
                    Ok(()) => self.loading_ticks = 0,
                    Err(err) => self.fail(err),
                }
                None
            }
        }
    }

    fn execute(&mut self, command: Command) {
        self.error = None;
        self.notice = None;
        let result = match command {
            Command::Quit => {
                self.should_quit = true;
                Ok(())
            }
            Command::Help => {
                self.notice = Some(HELP.to_string());
                Ok(())
            }
            Command::Mode(mode) => {
                self.switch_mode(mode);
                Ok(())
            }
            Command::Open(paths) => self.open(paths),
            Command::Remove(index) => self
                .subjects
                .remove(index)
                .map(|removed| self.notice = Some(format!("Removed {}.", removed.name)))
                .map_err(|err| err.to_string()),
            Command::Select(index) => self.subjects.select(index).map_err(|err| err.to_string()),
            Command::Undo => self.step_history(true),
            Command::Redo => self.step_history(false),
            Command::Save { index, path } => self.save(index, &path),
            Command::Adjust(kind, value) => {
                let slot = match kind {
                    Adjustment::Brightness => &mut self.adjustments.brightness,
                    Adjustment::Contrast => &mut self.adjustments.contrast,
                    Adjustment::Saturation => &mut self.adjustments.saturation,
                };
                *slot = value;
                Ok(())
            }
            Command::ResetAdjustments => {
                self.adjustments = Adjustments::default();
                Ok(())
            }
            Command::Model(index) => {
                if index < PHOTO_MODELS.len() {
                    self.model_index = index;
                    Ok(())
                } else {
                    Err(format!("There are {} models to choose from.", PHOTO_MODELS.len()))
                }
            }
            Command::Count(count) => {
                self.generate.count = count;
                Ok(())
            }
            Command::Aspect(ratio) => {
                self.generate.aspect_ratio = ratio;
                Ok(())
            }
            Command::Duration(secs) => {
                self.video_settings.duration_secs = secs;
                Ok(())
            }
            Command::Quality(quality) => {
                self.video_settings.quality = quality;
                Ok(())
            }
            Command::Style(style) => {
                self.video_settings.style = style;
                Ok(())
            }
            Command::Effect(effect) => {
                self.video_settings.effect = effect;
                Ok(())
            }
            Command::StartImage(path) => self.set_start_image(path),
            Command::Suggestions => {
                self.show_suggestions = !self.show_suggestions;
                Ok(())
            }
            Command::UseSuggestion(index) => match self.suggestions().get(index) {
                Some(suggestion) => {
                    self.input = suggestion.to_string();
                    self.cursor_pos = self.input.len();
                    self.show_suggestions = false;
                    Ok(())
                }
                None => Err(format!(
                    "There are {} suggestions to choose from.",
                    self.suggestions().len()
                )),
            },
        };

        if let Err(message) = result {
            self.error = Some(message);
        }
    }

    fn open(&mut self, paths: Vec<std::path::PathBuf>) -> Result<(), String> {
        if self.mode != EditorMode::Photo {
            return Err("Switch to photo mode to open images.".to_string());
        }

        let mut loaded = Vec::new();
        let mut failures = Vec::new();
        for path in paths {
            match ImageFile::load(&path) {
                Ok(image) => loaded.push(image),
                Err(err) => failures.push(format!("{}: {err}", path.display())),
            }
        }

        let count = loaded.len();
        if self.subjects.add(loaded).is_some() {
            self.response_text = None;
            self.notice = Some(format!("Opened {count} image(s)."));
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("; "))
        }
    }

    fn step_history(&mut self, undo: bool) -> Result<(), String> {
        if self.mode != EditorMode::Photo {
            return Err("Undo and redo apply to photo edits.".to_string());
        }
        let subject = self
            .subjects
            .active_mut()
            .ok_or_else(|| "Open an image first.".to_string())?;
        let stepped = if undo {
            subject.history.undo()
        } else {
            subject.history.redo()
        };
        stepped.map(|_| ()).map_err(|err| err.to_string())
    }

    fn save(&mut self, index: Option<usize>, path: &std::path::Path) -> Result<(), String> {
        match self.mode {
            EditorMode::Photo => {
                let subject = self
                    .subjects
                    .active()
                    .ok_or_else(|| "Open an image first.".to_string())?;
                subject.current().save(path).map_err(|err| err.to_string())?;
            }
            EditorMode::Generation => {
                let image = self
                    .gallery
                    .get(index.unwrap_or(0))
                    .ok_or_else(|| "No generated image at that position.".to_string())?;
                image.save(path).map_err(|err| err.to_string())?;
            }
            EditorMode::Video => {
                let video = self
                    .video
                    .job()
                    .result()
                    .ok_or_else(|| "No video has been generated yet.".to_string())?;
                video.save_to(path).map_err(|err| err.to_string())?;
            }
        }
        self.notice = Some(format!("Saved to {}.", path.display()));
        Ok(())
    }

    fn set_start_image(&mut self, path: Option<std::path::PathBuf>) -> Result<(), String> {
        if self.mode != EditorMode::Video {
            return Err("Start images apply to video mode.".to_string());
        }
        self.start_image = match path {
            Some(path) => Some(ImageFile::load(&path).map_err(|err| err.to_string())?),
            None => None,
        };
        Ok(())
    }

    fn switch_mode(&mut self, mode: EditorMode) {
        if mode != self.mode {
            self.reset_state();
            self.mode = mode;
            tracing::debug!(mode = mode.label(), "switched editor mode");
        }
    }

    /// Forget everything tied to the current mode.
    fn reset_state(&mut self) {
        self.epoch += 1;
        self.busy = false;
        self.clear_input();
        self.error = None;
        self.notice = None;
        self.response_text = None;
        self.show_suggestions = false;

        self.subjects.clear();
        self.adjustments = Adjustments::default();
        self.model_index = 0;

        self.video.reset();
        self.video_settings = VideoSettings::default();
        self.start_image = None;
        self.loading_ticks = 0;

        self.gallery.clear();
        self.generate = GenerateParams::default();
    }

    fn cancel(&mut self) {
        self.epoch += 1;
        self.busy = false;
        self.notice = Some("Request cancelled.".to_string());
    }

    fn fail(&mut self, err: Error) {
        tracing::debug!(error = %err, "request failed");
        self.error = Some(err.user_message());
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.input[..self.cursor_pos]
            .char_indices()
            .next_back()
            .map(|(index, _)| index)
    }
}
