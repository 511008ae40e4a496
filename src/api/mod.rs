pub mod client;
pub mod types;

pub use client::AnalysisClient;
pub use types::{AnalysisResult, FeedbackCategory, FeedbackItem, VideoStats};

use tokio_util::sync::CancellationToken;

use crate::error::AnalysisError;
use crate::media::VideoFile;

/// Anything that can turn an uploaded video into stats and feedback.
///
/// Implementations must return promptly with [`AnalysisError::Cancelled`]
/// once `cancel` fires.
#[allow(async_fn_in_trait)]
pub trait AnalysisService {
    async fn analyze(
        &self,
        file: &VideoFile,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError>;
}
