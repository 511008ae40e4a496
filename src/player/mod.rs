//! Playback transport for the single loaded video.
//!
//! The controller is the only writer of [`PlaybackState`]. Commands are
//! forwarded to the bound [`MediaSurface`]; progress flows back through
//! [`PlaybackController::handle_event`].

pub mod rate;
pub mod surface;

pub use rate::PlaybackRate;
pub use surface::{HeadlessSurface, MediaEvent, MediaSurface, ResourceId};

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::PlaybackError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_time: f64,
    /// Unknown until the surface reports metadata
    pub duration: Option<f64>,
    pub playback_rate: PlaybackRate,
    pub is_playing: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: None,
            playback_rate: PlaybackRate::Normal,
            is_playing: false,
        }
    }
}

type TimeObserver = Box<dyn FnMut(f64) + Send>;

pub struct PlaybackController<S: MediaSurface> {
    surface: S,
    resource: Option<(ResourceId, PathBuf)>,
    next_resource: u64,
    state: PlaybackState,
    on_time_update: Option<TimeObserver>,
}

impl<S: MediaSurface> PlaybackController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            resource: None,
            next_resource: 0,
            state: PlaybackState::default(),
            on_time_update: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn resource(&self) -> Option<ResourceId> {
        self.resource.as_ref().map(|(id, _)| *id)
    }

    pub fn source(&self) -> Option<&Path> {
        self.resource.as_ref().map(|(_, path)| path.as_path())
    }

    /// Called with the new position on every time update from the surface
    pub fn set_time_observer(&mut self, observer: impl FnMut(f64) + Send + 'static) {
        self.on_time_update = Some(Box::new(observer));
    }

    /// Bind a new media source. Position, duration and play state start over;
    /// the chosen rate is kept.
    pub fn load(&mut self, source: impl Into<PathBuf>) -> ResourceId {
        let source = source.into();
        self.next_resource += 1;
        let id = ResourceId(self.next_resource);

        tracing::debug!("Loading media {:?} as {:?}", source, id);
        self.surface.load(id, &source);
        self.surface.set_playback_rate(self.state.playback_rate.as_f64());

        self.state = PlaybackState {
            playback_rate: self.state.playback_rate,
            ..PlaybackState::default()
        };
        self.resource = Some((id, source));
        id
    }

    pub fn unload(&mut self) {
        if self.resource.take().is_some() {
            self.surface.unload();
        }
        self.state = PlaybackState {
            playback_rate: self.state.playback_rate,
            ..PlaybackState::default()
        };
    }

    pub fn toggle_play_pause(&mut self) {
        if self.resource.is_none() {
            return;
        }
        if self.state.is_playing {
            self.surface.pause();
        } else {
            self.surface.play();
        }
        self.state.is_playing = !self.state.is_playing;
    }

    /// Move to `seconds`, clamped to the known extent of the media
    pub fn seek(&mut self, seconds: f64) {
        if self.resource.is_none() {
            tracing::debug!("Seek to {} ignored: no media loaded", seconds);
            return;
        }
        let target = self.clamp_time(seconds);
        self.surface.set_current_time(target);
        self.state.current_time = target;
    }

    /// Seek, then resume playback even if paused
    pub fn seek_and_play(&mut self, seconds: f64) {
        if self.resource.is_none() {
            return;
        }
        self.seek(seconds);
        self.surface.play();
        self.state.is_playing = true;
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<PlaybackRate, PlaybackError> {
        let rate = PlaybackRate::try_from(rate)?;
        self.surface.set_playback_rate(rate.as_f64());
        self.state.playback_rate = rate;
        Ok(rate)
    }

    /// Reflect a surface notification into the state. Events tagged with a
    /// resource other than the loaded one are dropped.
    pub fn handle_event(&mut self, resource: ResourceId, event: MediaEvent) {
        if self.resource() != Some(resource) {
            tracing::trace!("Dropping {:?} for stale {:?}", event, resource);
            return;
        }

        match event {
            MediaEvent::TimeUpdate(seconds) => {
                self.state.current_time = self.clamp_time(seconds);
                let now = self.state.current_time;
                if let Some(observer) = self.on_time_update.as_mut() {
                    observer(now);
                }
            }
            MediaEvent::LoadedMetadata { duration } => {
                if duration.is_finite() && duration >= 0.0 {
                    self.state.duration = Some(duration);
                    self.state.current_time = self.clamp_time(self.state.current_time);
                }
            }
            MediaEvent::Play => self.state.is_playing = true,
            MediaEvent::Pause => self.state.is_playing = false,
            MediaEvent::Ended => {
                self.state.is_playing = false;
                if let Some(duration) = self.state.duration {
                    self.state.current_time = duration;
                }
            }
        }
    }

    fn clamp_time(&self, seconds: f64) -> f64 {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        match self.state.duration {
            Some(duration) => seconds.min(duration),
            None => seconds,
        }
    }
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Parse a display duration such as `0:45` or `1:02:03` into seconds
pub fn parse_display_time(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut parts = 0;
    for part in text.trim().split(':') {
        let value: f64 = part.trim().parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        total = total * 60.0 + value;
        parts += 1;
    }
    (1..=3).contains(&parts).then_some(total)
}
