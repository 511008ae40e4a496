pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod media;
pub mod player;
pub mod session;
pub mod shell;

pub use api::{AnalysisClient, AnalysisResult, AnalysisService, FeedbackItem, VideoStats};
pub use config::Config;
pub use error::{AnalysisError, MediaError, PlaybackError};
pub use player::{HeadlessSurface, MediaSurface, PlaybackController, PlaybackRate};
pub use session::{AnalysisSession, SessionStatus};
pub use shell::CoachShell;
