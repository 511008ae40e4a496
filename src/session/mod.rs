//! Lifecycle of one upload-and-analyze cycle.
//!
//! Every request gets a sequence number when it begins. A result is applied
//! only if its ticket is still the latest one issued; starting a new
//! analysis or clearing the session cancels and invalidates the previous
//! ticket.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::{AnalysisResult, AnalysisService, FeedbackItem, VideoStats};
use crate::error::AnalysisError;
use crate::media::VideoFile;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    InFlight {
        file: VideoFile,
    },
    Succeeded {
        stats: VideoStats,
        feedback: Vec<FeedbackItem>,
    },
    Failed {
        message: String,
    },
}

/// Handle for one outstanding request
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    seq: u64,
    file: VideoFile,
    cancel: CancellationToken,
}

impl AnalysisTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn file(&self) -> &VideoFile {
        &self.file
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[derive(Debug)]
pub struct AnalysisSession {
    status: SessionStatus,
    last_file: Option<VideoFile>,
    issued: u64,
    in_flight: Option<CancellationToken>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            last_file: None,
            issued: 0,
            in_flight: None,
        }
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, SessionStatus::InFlight { .. })
    }

    pub fn stats(&self) -> Option<&VideoStats> {
        match &self.status {
            SessionStatus::Succeeded { stats, .. } => Some(stats),
            _ => None,
        }
    }

    /// Empty unless the last analysis succeeded
    pub fn feedback(&self) -> &[FeedbackItem] {
        match &self.status {
            SessionStatus::Succeeded { feedback, .. } => feedback,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn last_file(&self) -> Option<&VideoFile> {
        self.last_file.as_ref()
    }

    /// Drop any previous result and go in flight for `file`
    pub fn begin(&mut self, file: VideoFile) -> AnalysisTicket {
        self.cancel_in_flight();
        self.issued += 1;

        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        self.last_file = Some(file.clone());
        self.status = SessionStatus::InFlight { file: file.clone() };

        tracing::debug!("Analysis #{} started for {}", self.issued, file.name);
        AnalysisTicket {
            seq: self.issued,
            file,
            cancel,
        }
    }

    /// Begin again with the last file, but only after a failure
    pub fn begin_retry(&mut self) -> Option<AnalysisTicket> {
        if !matches!(self.status, SessionStatus::Failed { .. }) {
            return None;
        }
        let file = self.last_file.clone()?;
        Some(self.begin(file))
    }

    /// Apply a finished request. Returns false when the ticket was superseded
    /// and the result was discarded.
    pub fn complete(
        &mut self,
        ticket: &AnalysisTicket,
        result: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        if ticket.seq != self.issued || !self.is_loading() {
            tracing::debug!(
                "Discarding result of analysis #{} (latest is #{})",
                ticket.seq,
                self.issued
            );
            return false;
        }

        self.in_flight = None;
        self.status = match result {
            Ok(AnalysisResult { stats, feedback }) => {
                tracing::info!(
                    "Analysis #{} finished with {} feedback items",
                    ticket.seq,
                    feedback.len()
                );
                SessionStatus::Succeeded { stats, feedback }
            }
            Err(e) => {
                tracing::warn!("Analysis #{} failed: {}", ticket.seq, e);
                SessionStatus::Failed {
                    message: e.to_string(),
                }
            }
        };
        true
    }

    /// Back to idle, whatever the current state. A request still in flight
    /// is cancelled and its result will be ignored.
    pub fn clear_analysis(&mut self) {
        self.cancel_in_flight();
        // Invalidate outstanding tickets even though nothing new begins.
        self.issued += 1;
        self.status = SessionStatus::Idle;
    }

    /// Run one full analysis against `service`
    pub async fn start_analysis<A: AnalysisService>(
        &mut self,
        service: &A,
        file: VideoFile,
    ) -> &SessionStatus {
        let ticket = self.begin(file);
        let result = service.analyze(&ticket.file, ticket.cancel_token()).await;
        self.complete(&ticket, result);
        &self.status
    }

    /// Re-run the last file after a failure; `None` if there is nothing to retry
    pub async fn retry<A: AnalysisService>(&mut self, service: &A) -> Option<&SessionStatus> {
        let ticket = self.begin_retry()?;
        let result = service.analyze(&ticket.file, ticket.cancel_token()).await;
        self.complete(&ticket, result);
        Some(&self.status)
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}
