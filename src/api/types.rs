use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::player::format_time;

/// Summary of the analysed video, as displayed in the stats panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub duration: String,
    pub file_size: String,
    pub resolution: String,
    #[serde(rename = "fps", alias = "frameRate")]
    pub frame_rate: u32,
    pub upload_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    Positive,
    Improvement,
    Technique,
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedbackCategory::Positive => "positive",
            FeedbackCategory::Improvement => "improvement",
            FeedbackCategory::Technique => "technique",
        };
        f.pad(s)
    }
}

/// One timestamped coaching comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: String,
    #[serde(rename = "timestamp", alias = "timestampSeconds")]
    pub timestamp_seconds: f64,
    #[serde(rename = "time", alias = "displayTime", default)]
    pub display_time: String,
    pub message: String,
    #[serde(rename = "type")]
    pub category: FeedbackCategory,
    /// Free-text grouping such as "Technique" or "Movement"
    #[serde(rename = "category")]
    pub label: String,
}

/// Body of a successful `POST /analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub stats: VideoStats,
    pub feedback: Vec<FeedbackItem>,
}

impl AnalysisResult {
    /// Check the invariants the wire format cannot express, and derive
    /// missing display times from the timestamp.
    pub fn validate(mut self) -> Result<Self, String> {
        let mut seen = HashSet::new();
        for item in &mut self.feedback {
            if !item.timestamp_seconds.is_finite() || item.timestamp_seconds < 0.0 {
                return Err(format!(
                    "feedback {} has invalid timestamp {}",
                    item.id, item.timestamp_seconds
                ));
            }
            if !seen.insert(item.id.clone()) {
                return Err(format!("duplicate feedback id {}", item.id));
            }
            if item.display_time.is_empty() {
                item.display_time = format_time(item.timestamp_seconds);
            }
        }
        Ok(self)
    }
}
