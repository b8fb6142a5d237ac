// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video track probing.
//!
//! Datasets need the framerate and duration of the video they annotate.
//! These are read from the first video track reported by the `mediainfo`
//! command line tool.

use crate::error::{AnnotationError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable overriding the `mediainfo` executable.
pub const MEDIAINFO_ENV: &str = "VIDANNOTATE_MEDIAINFO";

/// Key details of a video track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frames per second
    pub framerate: f64,
    /// Duration in seconds
    pub duration: f64,
}

/// Source of video track details for a media file.
pub trait VideoProbe {
    fn probe(&self, path: &Path) -> Result<VideoDetails>;
}

/// Known details act as a probe that reports them for any file.
impl VideoProbe for VideoDetails {
    fn probe(&self, _path: &Path) -> Result<VideoDetails> {
        Ok(*self)
    }
}

/// Probe backed by the `mediainfo` executable.
#[derive(Debug, Clone)]
pub struct MediaInfoProbe {
    program: PathBuf,
}

impl Default for MediaInfoProbe {
    fn default() -> Self {
        Self::new("mediainfo")
    }
}

impl MediaInfoProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use the executable named by `VIDANNOTATE_MEDIAINFO`, or `mediainfo` on the `PATH`.
    pub fn from_env() -> Self {
        match std::env::var_os(MEDIAINFO_ENV) {
            Some(program) if !program.is_empty() => Self::new(program),
            _ => Self::default(),
        }
    }
}

impl VideoProbe for MediaInfoProbe {
    fn probe(&self, path: &Path) -> Result<VideoDetails> {
        log::debug!("Running {} on {}", self.program.display(), path.display());

        let output = Command::new(&self.program)
            .arg("--Output=JSON")
            .arg(path)
            .output()
            .map_err(|e| {
                AnnotationError::VideoProbe(format!("failed to run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnnotationError::VideoProbe(format!(
                "{} exited with {} for {}: {}",
                self.program.display(),
                output.status,
                path.display(),
                stderr.trim()
            )));
        }

        let response: MediaInfoResponse = serde_json::from_slice(&output.stdout).map_err(|e| {
            AnnotationError::VideoProbe(format!("unreadable mediainfo output for {}: {e}", path.display()))
        })?;

        let details = parse_details(&response)?;
        if details.framerate <= 0.0 {
            log::warn!("{} reports a framerate of {}", path.display(), details.framerate);
        }
        Ok(details)
    }
}

#[derive(Debug, Deserialize)]
struct MediaInfoResponse {
    media: Option<MediaInfoMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoMedia {
    #[serde(default)]
    track: Vec<MediaInfoTrack>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoTrack {
    #[serde(rename = "@type")]
    track_type: String,
    #[serde(rename = "Sampled_Width")]
    sampled_width: Option<String>,
    #[serde(rename = "Width")]
    width: Option<String>,
    #[serde(rename = "Sampled_Height")]
    sampled_height: Option<String>,
    #[serde(rename = "Height")]
    height: Option<String>,
    #[serde(rename = "FrameRate")]
    frame_rate: Option<String>,
    #[serde(rename = "Duration")]
    duration: Option<String>,
}

fn parse_details(response: &MediaInfoResponse) -> Result<VideoDetails> {
    let track = response
        .media
        .iter()
        .flat_map(|media| media.track.iter())
        .find(|track| track.track_type == "Video")
        .ok_or_else(|| AnnotationError::VideoProbe("could not locate video track".into()))?;

    Ok(VideoDetails {
        width: parse_number(track.sampled_width.as_ref().or(track.width.as_ref()), "width")?,
        height: parse_number(track.sampled_height.as_ref().or(track.height.as_ref()), "height")?,
        framerate: parse_number(track.frame_rate.as_ref(), "framerate")?,
        duration: parse_number(track.duration.as_ref(), "duration")?,
    })
}

fn parse_number<T: std::str::FromStr>(value: Option<&String>, what: &str) -> Result<T> {
    value
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| AnnotationError::VideoProbe(format!("video track has no valid {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> MediaInfoResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_first_video_track() {
        let parsed = response(
            r#"{"media": {"@ref": "clip.mp4", "track": [
                {"@type": "General", "Duration": "12.000"},
                {"@type": "Video", "Width": "1920", "Height": "1080",
                 "Sampled_Width": "1920", "Sampled_Height": "1080",
                 "FrameRate": "29.970", "Duration": "11.979"},
                {"@type": "Video", "Width": "640", "Height": "480",
                 "FrameRate": "25.000", "Duration": "1.0"}
            ]}}"#,
        );
        let details = parse_details(&parsed).unwrap();
        assert_eq!(
            details,
            VideoDetails {
                width: 1920,
                height: 1080,
                framerate: 29.97,
                duration: 11.979,
            }
        );
    }

    #[test]
    fn test_width_falls_back_when_unsampled() {
        let parsed = response(
            r#"{"media": {"track": [
                {"@type": "Video", "Width": "640", "Height": "360",
                 "FrameRate": "25", "Duration": "4.0"}
            ]}}"#,
        );
        let details = parse_details(&parsed).unwrap();
        assert_eq!((details.width, details.height), (640, 360));
    }

    #[test]
    fn test_no_video_track() {
        let parsed = response(r#"{"media": {"track": [{"@type": "Audio", "Duration": "3.0"}]}}"#);
        assert!(matches!(parse_details(&parsed), Err(AnnotationError::VideoProbe(_))));

        let empty = response(r#"{"media": null}"#);
        assert!(matches!(parse_details(&empty), Err(AnnotationError::VideoProbe(_))));
    }

    #[test]
    fn test_missing_framerate() {
        let parsed = response(
            r#"{"media": {"track": [{"@type": "Video", "Width": "640", "Height": "360", "Duration": "4.0"}]}}"#,
        );
        assert!(matches!(parse_details(&parsed), Err(AnnotationError::VideoProbe(_))));
    }

    #[test]
    fn test_fixed_details_probe() {
        let details = VideoDetails {
            width: 320,
            height: 240,
            framerate: 30.0,
            duration: 60.0,
        };
        assert_eq!(details.probe(Path::new("anything.mp4")).unwrap(), details);
    }

    #[test]
    fn test_missing_executable() {
        let probe = MediaInfoProbe::new("/nonexistent/mediainfo-binary");
        assert!(matches!(
            probe.probe(Path::new("clip.mp4")),
            Err(AnnotationError::VideoProbe(_))
        ));
    }
}
