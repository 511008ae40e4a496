//! Local file intake.
//!
//! Only files whose guessed media type starts with `video/` are accepted.
//! Anything else is dropped without surfacing an error.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::MediaError;

/// A local video selected for upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoFile {
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl VideoFile {
    /// Inspect a path, returning `None` when it is not a video
    pub fn from_path(path: &Path) -> Result<Option<Self>, MediaError> {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::VIDEO {
            tracing::debug!("Ignoring non-video file {:?} ({})", path, mime);
            return Ok(None);
        }

        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::NotFound(path.display().to_string())
            } else {
                MediaError::Io {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })?;
        if !metadata.is_file() {
            tracing::debug!("Ignoring {:?}: not a regular file", path);
            return Ok(None);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());

        Ok(Some(Self {
            path: path.to_path_buf(),
            name,
            mime_type: mime.essence_str().to_string(),
            size: metadata.len(),
        }))
    }

    /// Open the file for a streamed upload
    pub async fn open(&self) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::open(&self.path).await
    }

    /// Human-readable size, e.g. "10.0 MB"
    pub fn display_size(&self) -> String {
        format_size(self.size)
    }
}

/// Pick the first video out of a multi-file selection (drag and drop).
///
/// Unreadable entries are skipped like non-video ones. The first such error
/// is returned only when the selection holds no usable video at all.
pub fn first_video<P: AsRef<Path>>(paths: &[P]) -> Result<Option<VideoFile>, MediaError> {
    let mut first_error = None;
    for path in paths {
        match VideoFile::from_path(path.as_ref()) {
            Ok(Some(file)) => return Ok(Some(file)),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("Skipping {:?}: {}", path.as_ref(), e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
