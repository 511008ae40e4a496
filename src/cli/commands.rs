use anyhow::{Context, Result};
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{Commands, ConfigCommands, ReviewCommand};
use video_coach::bridge::ClickTarget;
use video_coach::player::MediaEvent;
use video_coach::{
    AnalysisClient, AnalysisService, CoachShell, Config, HeadlessSurface, MediaSurface,
    SessionStatus,
};

type TerminalShell = CoachShell<AnalysisClient, HeadlessSurface>;

pub async fn dispatch(
    config: &Config,
    config_path: Option<&Path>,
    command: Commands,
    pretty: bool,
) -> Result<()> {
    match command {
        Commands::Doctor => doctor(config, config_path, pretty).await,
        Commands::Health => health(config, pretty).await,
        Commands::Analyze { files } => analyze(config, &files, pretty).await,
        Commands::Review { files } => review(config, &files, pretty).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_show(config, config_path, pretty),
            ConfigCommands::SetUrl { url } => config_set_url(config, config_path, &url),
        },
    }
}

fn terminal_shell(config: &Config) -> TerminalShell {
    CoachShell::new(AnalysisClient::from_config(config), HeadlessSurface::default())
        .with_timeout(config.service.timeout())
}

/// Doctor command - check configuration and service status
pub async fn doctor(config: &Config, config_path: Option<&Path>, pretty: bool) -> Result<()> {
    let client = AnalysisClient::from_config(config);
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    let mut checks = vec![];

    checks.push(json!({
        "name": "config",
        "status": if path.exists() { "ok" } else { "warning" },
        "message": if path.exists() { "Found" } else { "Not found, using defaults" },
        "path": path.display().to_string()
    }));

    let healthy = client.check_health().await;
    checks.push(json!({
        "name": "service",
        "status": if healthy { "ok" } else { "error" },
        "message": if healthy { "Healthy" } else { "Unreachable or unhealthy" },
        "path": client.base_url()
    }));

    checks.push(json!({
        "name": "timeout",
        "status": "ok",
        "message": match config.service.timeout_secs {
            Some(secs) => format!("{} seconds", secs),
            None => "none".to_string(),
        }
    }));

    if pretty {
        println!("Video Coach Doctor\n");
        for check in &checks {
            let icon = match check["status"].as_str().unwrap_or("unknown") {
                "ok" => "\u{2714}",
                "warning" => "\u{26A0}",
                "error" => "\u{2718}",
                _ => "?",
            };
            println!(
                "{} {}: {}",
                icon,
                check["name"].as_str().unwrap_or(""),
                check["message"].as_str().unwrap_or("")
            );
            if let Some(path) = check["path"].as_str() {
                println!("    Path: {}", path);
            }
        }
    } else {
        println!("{}", serde_json::to_string(&json!({ "checks": checks }))?);
    }

    Ok(())
}

/// Health command - exit status reflects the result
pub async fn health(config: &Config, pretty: bool) -> Result<()> {
    let client = AnalysisClient::from_config(config);
    let healthy = client.check_health().await;

    if pretty {
        println!(
            "{} {}",
            client.base_url(),
            if healthy { "is healthy" } else { "is unavailable" }
        );
    } else {
        println!(
            "{}",
            json!({ "base_url": client.base_url(), "healthy": healthy })
        );
    }

    if healthy {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Analysis service at {} is unavailable", client.base_url()))
    }
}

/// Analyze command - one upload, print the outcome
pub async fn analyze(config: &Config, files: &[PathBuf], pretty: bool) -> Result<()> {
    let mut shell = terminal_shell(config);

    if !shell.upload_files(files).await? {
        // Non-video selections are dropped without an error, like the picker does.
        tracing::debug!("No video among {:?}", files);
        if !pretty {
            println!("{}", json!({ "status": "idle" }));
        }
        return Ok(());
    }

    if pretty {
        print!("{}", shell.view());
    } else {
        let output = json!({
            "file": shell.upload(),
            "session": shell.session().status(),
        });
        println!("{}", serde_json::to_string(&output)?);
    }

    match shell.session().status() {
        SessionStatus::Failed { message } => Err(anyhow::anyhow!("Analysis failed: {}", message)),
        _ => Ok(()),
    }
}

/// Review command - interactive shell over stdin.
///
/// Analysis runs alongside the prompt: commands keep working while a request
/// is outstanding, and the view is printed again when its outcome lands.
pub async fn review(config: &Config, files: &[PathBuf], pretty: bool) -> Result<()> {
    let mut shell = terminal_shell(config);

    if !files.is_empty() {
        if let Some(note) = apply(&mut shell, ReviewCommand::Upload(files.to_vec())) {
            println!("{}", note);
        }
    }
    print_view(&shell, pretty)?;
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match line.parse::<ReviewCommand>() {
                    Ok(ReviewCommand::Quit) => break,
                    Ok(ReviewCommand::Help) => print_help(),
                    Ok(command) => {
                        if let Some(note) = apply(&mut shell, command) {
                            println!("{}", note);
                        }
                        print_view(&shell, pretty)?;
                    }
                    Err(e) => println!("{}", e),
                }
            }
            _ = shell.settle() => {
                println!();
                print_view(&shell, pretty)?;
            }
        }
        prompt()?;
    }

    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

/// Apply one review command; returns a note to show the user, if any.
///
/// Never waits on the analysis service. Bad input ends up in the note.
fn apply<A, S>(shell: &mut CoachShell<A, S>, command: ReviewCommand) -> Option<String>
where
    A: AnalysisService + Clone + 'static,
    S: MediaSurface,
{
    match command {
        ReviewCommand::Play => {
            if !shell.player().state().is_playing {
                shell.player_mut().toggle_play_pause();
            }
            None
        }
        ReviewCommand::Pause => {
            if shell.player().state().is_playing {
                shell.player_mut().toggle_play_pause();
            }
            None
        }
        ReviewCommand::Toggle => {
            shell.player_mut().toggle_play_pause();
            None
        }
        ReviewCommand::Seek(seconds) => {
            shell.player_mut().seek(seconds);
            None
        }
        ReviewCommand::Rate(rate) => shell
            .player_mut()
            .set_playback_rate(rate)
            .err()
            .map(|e| e.to_string()),
        ReviewCommand::Jump(index) => shell
            .click_feedback(index, ClickTarget::Timestamp)
            .is_none()
            .then(|| format!("No feedback entry {}", index)),
        ReviewCommand::Open(index) => shell
            .click_feedback(index, ClickTarget::Entry)
            .is_none()
            .then(|| format!("No feedback entry {}", index)),
        ReviewCommand::Tick(seconds) => {
            shell.media_event(MediaEvent::TimeUpdate(seconds));
            None
        }
        ReviewCommand::Retry => (!shell.start_retry()).then(|| "Nothing to retry".to_string()),
        // Non-video selections are dropped silently; unreadable ones are reported.
        ReviewCommand::Upload(paths) => shell.accept_upload(&paths).err().map(|e| e.to_string()),
        ReviewCommand::New => {
            shell.upload_new_video();
            None
        }
        ReviewCommand::Status | ReviewCommand::Help | ReviewCommand::Quit => None,
    }
}

fn print_view(shell: &TerminalShell, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", shell.view());
    } else {
        println!("{}", serde_json::to_string(&shell.view())?);
    }
    Ok(())
}

fn print_help() {
    println!("Playback:  play | pause | toggle | seek <s> | rate <0.25-2>");
    println!("Feedback:  jump <n> (timestamp) | open <n> (entry)");
    println!("Session:   upload <paths>... | retry | new | status | quit");
    println!("Surface:   tick <s>  (report playback progress)");
}

/// Config show - print the effective configuration
pub fn config_show(config: &Config, config_path: Option<&Path>, pretty: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    if pretty {
        println!("Config file: {}", path.display());
        println!("Base URL:    {}", config.service.base_url());
        println!(
            "Timeout:     {}",
            config
                .service
                .timeout_secs
                .map(|s| format!("{}s", s))
                .unwrap_or_else(|| "none".to_string())
        );
        println!("Format:      {}", config.output.default_format);
    } else {
        let output = json!({
            "path": path.display().to_string(),
            "base_url": config.service.base_url(),
            "timeout_secs": config.service.timeout_secs,
            "default_format": config.output.default_format,
        });
        println!("{}", serde_json::to_string(&output)?);
    }
    Ok(())
}

/// Config set-url - persist a new service base URL
pub fn config_set_url(config: &Config, config_path: Option<&Path>, url: &str) -> Result<()> {
    reqwest::Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;

    let mut updated = config.clone();
    updated.set_base_url(url);
    let written = updated.write(config_path)?;
    println!("Base URL set to {} ({})", updated.service.base_url(), written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use video_coach::api::FeedbackCategory;
    use video_coach::media::VideoFile;
    use video_coach::shell::{FeedbackPanel, ShellView};
    use video_coach::{AnalysisError, AnalysisResult, FeedbackItem, VideoStats};

    /// Answers every upload at once, except videos named "stall.mp4"
    #[derive(Clone, Copy)]
    struct Coach;

    impl AnalysisService for Coach {
        async fn analyze(
            &self,
            file: &VideoFile,
            cancel: CancellationToken,
        ) -> Result<AnalysisResult, AnalysisError> {
            if file.name == "stall.mp4" {
                cancel.cancelled().await;
                return Err(AnalysisError::Cancelled);
            }
            Ok(AnalysisResult {
                stats: VideoStats {
                    duration: "1:00".to_string(),
                    file_size: "1.0 MB".to_string(),
                    resolution: "1920x1080".to_string(),
                    frame_rate: 60,
                    upload_date: "2024-06-01".to_string(),
                },
                feedback: vec![FeedbackItem {
                    id: "1".to_string(),
                    timestamp_seconds: 12.0,
                    display_time: "0:12".to_string(),
                    message: "Keep your elbow up.".to_string(),
                    category: FeedbackCategory::Improvement,
                    label: "Technique".to_string(),
                }],
            })
        }
    }

    fn review_shell() -> CoachShell<Coach, HeadlessSurface> {
        CoachShell::new(Coach, HeadlessSurface::default())
    }

    fn write_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"frames").unwrap();
        path
    }

    fn upload(paths: &[PathBuf]) -> ReviewCommand {
        ReviewCommand::Upload(paths.to_vec())
    }

    #[tokio::test]
    async fn missing_feedback_entry_is_a_note() {
        let mut shell = review_shell();
        assert_eq!(
            apply(&mut shell, ReviewCommand::Jump(3)),
            Some("No feedback entry 3".to_string())
        );
        assert_eq!(
            apply(&mut shell, ReviewCommand::Open(0)),
            Some("No feedback entry 0".to_string())
        );
    }

    #[tokio::test]
    async fn jump_seeks_to_the_feedback_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let video = write_file(dir.path(), "serve.mp4");

        let mut shell = review_shell();
        assert_eq!(apply(&mut shell, upload(&[video])), None);
        assert!(shell.settle().await);

        assert_eq!(apply(&mut shell, ReviewCommand::Jump(0)), None);
        assert_eq!(shell.player().state().current_time, 12.0);
        assert!(shell.player().state().is_playing);
    }

    #[tokio::test]
    async fn unsupported_rate_is_a_note() {
        let mut shell = review_shell();
        let note = apply(&mut shell, ReviewCommand::Rate(3.0)).unwrap();
        assert!(note.contains("Unsupported playback rate"));
        assert_eq!(shell.player().state().playback_rate.as_f64(), 1.0);
        assert_eq!(apply(&mut shell, ReviewCommand::Rate(1.5)), None);
    }

    #[tokio::test]
    async fn retry_without_failure_is_a_note() {
        let dir = tempfile::tempdir().unwrap();
        let video = write_file(dir.path(), "serve.mp4");

        let mut shell = review_shell();
        assert_eq!(
            apply(&mut shell, ReviewCommand::Retry),
            Some("Nothing to retry".to_string())
        );

        apply(&mut shell, upload(&[video]));
        shell.settle().await;
        assert_eq!(
            apply(&mut shell, ReviewCommand::Retry),
            Some("Nothing to retry".to_string())
        );
        assert!(!shell.is_analyzing());
    }

    #[tokio::test]
    async fn non_video_upload_is_dropped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let notes = write_file(dir.path(), "notes.txt");

        let mut shell = review_shell();
        assert_eq!(apply(&mut shell, upload(&[notes])), None);
        assert_eq!(shell.view(), ShellView::UploadPrompt);
        assert!(!shell.is_analyzing());
    }

    #[tokio::test]
    async fn missing_upload_path_keeps_the_shell_usable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("typo.mp4");
        let video = write_file(dir.path(), "serve.mp4");

        let mut shell = review_shell();
        let note = apply(&mut shell, upload(&[missing])).unwrap();
        assert!(note.contains("Video file not found"));
        assert_eq!(shell.view(), ShellView::UploadPrompt);

        assert_eq!(apply(&mut shell, upload(&[video])), None);
        assert!(shell.is_analyzing());
        assert!(shell.settle().await);
        assert_eq!(shell.session().stats().unwrap().frame_rate, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_take_effect_while_analysis_is_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let stalled = write_file(dir.path(), "stall.mp4");
        let replacement = write_file(dir.path(), "serve.mp4");

        let mut shell = review_shell();
        apply(&mut shell, upload(&[stalled]));
        let waited = tokio::time::timeout(Duration::from_secs(30), shell.settle()).await;
        assert!(waited.is_err());
        assert!(matches!(
            shell.view(),
            ShellView::Workspace {
                feedback: FeedbackPanel::Loading,
                ..
            }
        ));

        // Stale playback stays navigable.
        assert_eq!(apply(&mut shell, ReviewCommand::Seek(4.0)), None);
        assert_eq!(shell.player().state().current_time, 4.0);

        // A replacement upload takes over the running analysis.
        assert_eq!(apply(&mut shell, upload(&[replacement])), None);
        assert_eq!(shell.upload().unwrap().name, "serve.mp4");
        assert!(shell.settle().await);
        assert_eq!(shell.session().feedback().len(), 1);

        // So does starting over.
        let stalled = write_file(dir.path(), "stall.mp4");
        apply(&mut shell, upload(&[stalled]));
        assert_eq!(apply(&mut shell, ReviewCommand::New), None);
        assert_eq!(shell.view(), ShellView::UploadPrompt);
        assert_eq!(shell.session().status(), &SessionStatus::Idle);
        assert!(!shell.is_analyzing());
    }
}
