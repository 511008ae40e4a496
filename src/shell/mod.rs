//! Presentation shell: composes upload intake, the analysis session, the
//! player and the feedback list, and derives what is on screen.

pub mod view;

pub use view::{FeedbackEntry, FeedbackPanel, PlayerPanel, ShellView, StatsPanel};

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use crate::api::{AnalysisResult, AnalysisService};
use crate::bridge::{self, ClickTarget};
use crate::error::{AnalysisError, MediaError};
use crate::media::{self, VideoFile};
use crate::player::{parse_display_time, MediaEvent, MediaSurface, PlaybackController};
use crate::session::{AnalysisSession, AnalysisTicket, SessionStatus};

type AnalysisRequest = Pin<Box<dyn Future<Output = Result<AnalysisResult, AnalysisError>>>>;

/// The outstanding request together with the ticket it will complete
struct PendingAnalysis {
    ticket: AnalysisTicket,
    request: AnalysisRequest,
}

pub struct CoachShell<A: AnalysisService, S: MediaSurface> {
    service: A,
    session: AnalysisSession,
    player: PlaybackController<S>,
    upload: Option<VideoFile>,
    pending: Option<PendingAnalysis>,
    timeout: Option<Duration>,
}

impl<A, S> CoachShell<A, S>
where
    A: AnalysisService + Clone + 'static,
    S: MediaSurface,
{
    pub fn new(service: A, surface: S) -> Self {
        Self {
            service,
            session: AnalysisSession::new(),
            player: PlaybackController::new(surface),
            upload: None,
            pending: None,
            timeout: None,
        }
    }

    /// Give up on an analysis after `timeout`; by default requests may wait forever
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    pub fn player(&self) -> &PlaybackController<S> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlaybackController<S> {
        &mut self.player
    }

    pub fn upload(&self) -> Option<&VideoFile> {
        self.upload.as_ref()
    }

    /// True while a request is outstanding
    pub fn is_analyzing(&self) -> bool {
        self.pending.is_some()
    }

    /// Take a selection of files. The first video replaces the current upload
    /// and starts its analysis without waiting for it; a selection without
    /// videos changes nothing. Returns whether a video was accepted.
    pub fn accept_upload<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<bool, MediaError> {
        let Some(file) = media::first_video(paths)? else {
            return Ok(false);
        };

        tracing::info!("Uploading {} ({})", file.name, file.display_size());
        self.player.load(file.path.clone());
        self.upload = Some(file.clone());
        let ticket = self.session.begin(file);
        self.dispatch(ticket);
        Ok(true)
    }

    /// Start a retry after a failure without waiting for it; false when
    /// there was nothing to retry
    pub fn start_retry(&mut self) -> bool {
        match self.session.begin_retry() {
            Some(ticket) => {
                self.dispatch(ticket);
                true
            }
            None => false,
        }
    }

    /// Wait for the outstanding request and apply its outcome. Never resolves
    /// while nothing is outstanding.
    ///
    /// The request lives in the shell, so dropping this future (for example
    /// when it loses a `select!`) loses no progress.
    pub async fn settle(&mut self) -> bool {
        let result = match self.pending.as_mut() {
            Some(pending) => pending.request.as_mut().await,
            None => return std::future::pending::<bool>().await,
        };
        let Some(pending) = self.pending.take() else {
            return false;
        };

        let applied = self.session.complete(&pending.ticket, result);
        if applied {
            self.report_analysed_duration();
        }
        applied
    }

    /// Select files and wait for the resulting analysis
    pub async fn upload_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<bool, MediaError> {
        if !self.accept_upload(paths)? {
            return Ok(false);
        }
        self.settle().await;
        Ok(true)
    }

    /// Retry after a failure and wait for it; false when there was nothing to retry
    pub async fn retry(&mut self) -> bool {
        if !self.start_retry() {
            return false;
        }
        self.settle().await;
        true
    }

    /// "Upload New Video": forget the upload, the player source and the analysis
    pub fn upload_new_video(&mut self) {
        self.upload = None;
        // Dropping the request aborts it at the transport level.
        self.pending = None;
        self.player.unload();
        self.session.clear_analysis();
    }

    /// Build the request future for `ticket` and make it the outstanding one.
    /// A request it replaces is dropped, which aborts it.
    fn dispatch(&mut self, ticket: AnalysisTicket) {
        let service = self.service.clone();
        let file = ticket.file().clone();
        let cancel = ticket.cancel_token();
        let timeout = self.timeout;

        let request: AnalysisRequest = Box::pin(async move {
            let call = service.analyze(&file, cancel.clone());
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => {
                        cancel.cancel();
                        Err(AnalysisError::Timeout(limit))
                    }
                },
                None => call.await,
            }
        });

        self.pending = Some(PendingAnalysis { ticket, request });
    }

    /// Click a feedback entry, or its nested timestamp control
    pub fn click_feedback(&mut self, index: usize, target: ClickTarget) -> Option<usize> {
        let item = self.session.feedback().get(index)?;
        Some(bridge::dispatch_click(item, target, &mut self.player))
    }

    /// Forward a surface event to the player
    pub fn media_event(&mut self, event: MediaEvent) {
        if let Some(resource) = self.player.resource() {
            self.player.handle_event(resource, event);
        }
    }

    pub fn view(&self) -> ShellView {
        let Some(file) = &self.upload else {
            return ShellView::UploadPrompt;
        };

        let feedback = match self.session.status() {
            SessionStatus::InFlight { .. } => FeedbackPanel::Loading,
            SessionStatus::Failed { message } => FeedbackPanel::Error {
                message: message.clone(),
                can_retry: self.session.last_file().is_some(),
            },
            SessionStatus::Idle | SessionStatus::Succeeded { .. } => FeedbackPanel::Items {
                items: self
                    .session
                    .feedback()
                    .iter()
                    .enumerate()
                    .map(|(i, item)| FeedbackEntry::new(i, item))
                    .collect(),
            },
        };

        let stats = match self.session.stats() {
            Some(stats) => StatsPanel::Stats {
                stats: stats.clone(),
            },
            None => StatsPanel::Placeholder,
        };

        ShellView::Workspace {
            file: file.name.clone(),
            player: self.player.state().into(),
            feedback,
            stats,
        }
    }

    /// Surfaces that cannot decode never report a duration; fall back to the
    /// one the service measured.
    fn report_analysed_duration(&mut self) {
        if self.player.state().duration.is_some() {
            return;
        }
        let Some(duration) = self
            .session
            .stats()
            .and_then(|stats| parse_display_time(&stats.duration))
        else {
            return;
        };
        self.media_event(MediaEvent::LoadedMetadata { duration });
    }
}
