use serde::Serialize;
use std::fmt;

use crate::api::{FeedbackCategory, FeedbackItem, VideoStats};
use crate::player::{format_time, PlaybackRate, PlaybackState};

/// Everything on screen, derived from shell state on demand
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ShellView {
    UploadPrompt,
    Workspace {
        file: String,
        player: PlayerPanel,
        feedback: FeedbackPanel,
        stats: StatsPanel,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPanel {
    pub position: String,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub rate: PlaybackRate,
    pub playing: bool,
}

impl From<&PlaybackState> for PlayerPanel {
    fn from(state: &PlaybackState) -> Self {
        Self {
            position: format!(
                "{} / {}",
                format_time(state.current_time),
                format_time(state.duration.unwrap_or(0.0))
            ),
            current_time: state.current_time,
            duration: state.duration,
            rate: state.playback_rate,
            playing: state.is_playing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedbackPanel {
    Loading,
    Error { message: String, can_retry: bool },
    Items { items: Vec<FeedbackEntry> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackEntry {
    pub index: usize,
    pub time: String,
    pub category: FeedbackCategory,
    pub label: String,
    pub message: String,
}

impl FeedbackEntry {
    pub fn new(index: usize, item: &FeedbackItem) -> Self {
        Self {
            index,
            time: item.display_time.clone(),
            category: item.category,
            label: item.label.clone(),
            message: item.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatsPanel {
    Stats { stats: VideoStats },
    Placeholder,
}

const STATS_PLACEHOLDER: &str = "Upload a video to see stats";

impl fmt::Display for ShellView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellView::UploadPrompt => {
                writeln!(f, "Upload Your Training Video")?;
                writeln!(f, "  upload <path>...   (MP4, MOV, AVI up to 100MB)")?;
                writeln!(f)?;
                writeln!(f, "{}", STATS_PLACEHOLDER)
            }
            ShellView::Workspace {
                file,
                player,
                feedback,
                stats,
            } => {
                writeln!(f, "Video: {}", file)?;
                writeln!(
                    f,
                    "  {} {}  speed {}",
                    if player.playing { "\u{25B6}" } else { "\u{23F8}" },
                    player.position,
                    player.rate
                )?;

                writeln!(f, "\nAI Coach Feedback")?;
                write!(f, "{}", feedback)?;

                writeln!(f)?;
                write!(f, "{}", stats)
            }
        }
    }
}

impl fmt::Display for FeedbackPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackPanel::Loading => writeln!(f, "  Analyzing video..."),
            FeedbackPanel::Error { message, can_retry } => {
                writeln!(f, "  Analysis Failed")?;
                writeln!(f, "  {}", message)?;
                if *can_retry {
                    writeln!(f, "  [retry] Try Again")?;
                }
                Ok(())
            }
            FeedbackPanel::Items { items } if items.is_empty() => {
                writeln!(f, "  No feedback available yet.")
            }
            FeedbackPanel::Items { items } => {
                for entry in items {
                    writeln!(
                        f,
                        "  [{}] {:>5}  {:<11} {}",
                        entry.index, entry.time, entry.category, entry.label
                    )?;
                    writeln!(f, "        {}", entry.message)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for StatsPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsPanel::Placeholder => writeln!(f, "{}", STATS_PLACEHOLDER),
            StatsPanel::Stats { stats } => {
                writeln!(f, "Video Stats")?;
                writeln!(f, "  Duration     {}", stats.duration)?;
                writeln!(f, "  File Size    {}", stats.file_size)?;
                writeln!(f, "  Resolution   {}", stats.resolution)?;
                writeln!(f, "  Frame Rate   {} fps", stats.frame_rate)?;
                writeln!(f, "  Upload Date  {}", stats.upload_date)?;
                writeln!(f, "  [new] Upload New Video")
            }
        }
    }
}
