pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "video-coach")]
#[command(about = "Upload a training video for analysis and review the feedback")]
#[command(version)]
pub struct Cli {
    /// Use alternate config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Human-readable output instead of JSON
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check configuration and analysis service status
    Doctor,

    /// Check the analysis service health endpoint
    Health,

    /// Analyze a video and print stats and feedback
    Analyze {
        /// Candidate files; the first video is used
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Analyze a video, then review feedback interactively
    Review {
        /// Candidate files; the first video is used
        files: Vec<PathBuf>,
    },

    /// Configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Set the analysis service base URL
    SetUrl {
        /// e.g. http://localhost:5000
        url: String,
    },
}

/// One line typed into the review shell
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewCommand {
    Play,
    Pause,
    Toggle,
    Seek(f64),
    Rate(f64),
    /// Click the timestamp control of a feedback entry
    Jump(usize),
    /// Click a feedback entry
    Open(usize),
    /// Time update from the surface
    Tick(f64),
    Retry,
    Upload(Vec<PathBuf>),
    New,
    Status,
    Help,
    Quit,
}

impl std::str::FromStr for ReviewCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(ReviewCommand::Status);
        };
        let rest: Vec<&str> = words.collect();

        let number = |what: &str| -> Result<f64, String> {
            rest.first()
                .ok_or_else(|| format!("{} needs a value", what))?
                .parse::<f64>()
                .map_err(|_| format!("{} needs a number", what))
        };
        let index = |what: &str| -> Result<usize, String> {
            rest.first()
                .ok_or_else(|| format!("{} needs a feedback number", what))?
                .parse::<usize>()
                .map_err(|_| format!("{} needs a feedback number", what))
        };

        match verb {
            "play" => Ok(ReviewCommand::Play),
            "pause" => Ok(ReviewCommand::Pause),
            "toggle" => Ok(ReviewCommand::Toggle),
            "seek" => Ok(ReviewCommand::Seek(number("seek")?)),
            "rate" | "speed" => Ok(ReviewCommand::Rate(number("rate")?)),
            "jump" => Ok(ReviewCommand::Jump(index("jump")?)),
            "open" => Ok(ReviewCommand::Open(index("open")?)),
            "tick" => Ok(ReviewCommand::Tick(number("tick")?)),
            "retry" => Ok(ReviewCommand::Retry),
            "upload" if rest.is_empty() => Err("upload needs at least one path".to_string()),
            "upload" => Ok(ReviewCommand::Upload(rest.iter().map(PathBuf::from).collect())),
            "new" => Ok(ReviewCommand::New),
            "status" => Ok(ReviewCommand::Status),
            "help" | "?" => Ok(ReviewCommand::Help),
            "quit" | "exit" | "q" => Ok(ReviewCommand::Quit),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}
