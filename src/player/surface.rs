use std::path::{Path, PathBuf};

/// Identifies one loaded media resource. A new id is handed out on every load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub(crate) u64);

/// Progress and state notifications coming from the rendering surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    TimeUpdate(f64),
    LoadedMetadata { duration: f64 },
    Play,
    Pause,
    Ended,
}

/// Native media element the controller drives.
///
/// The surface owns decoding and rendering; it reports back through
/// [`MediaEvent`]s delivered to `PlaybackController::handle_event`.
pub trait MediaSurface {
    fn load(&mut self, resource: ResourceId, source: &Path);
    fn unload(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn set_current_time(&mut self, seconds: f64);
    fn set_playback_rate(&mut self, rate: f64);
}

/// Surface for terminals: keeps the commanded state, renders nothing
#[derive(Debug, Default, Clone)]
pub struct HeadlessSurface {
    pub source: Option<PathBuf>,
    pub resource: Option<ResourceId>,
    pub playing: bool,
    pub position: f64,
    pub rate: f64,
}

impl MediaSurface for HeadlessSurface {
    fn load(&mut self, resource: ResourceId, source: &Path) {
        tracing::debug!("Headless surface bound to {:?}", source);
        self.source = Some(source.to_path_buf());
        self.resource = Some(resource);
        self.playing = false;
        self.position = 0.0;
    }

    fn unload(&mut self) {
        self.source = None;
        self.resource = None;
        self.playing = false;
        self.position = 0.0;
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.position = seconds;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }
}
