// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotated video datasets.
//!
//! [`AnnotatedVideo`] is the root of the annotation model. It owns the
//! ordered, non-overlapping segments of a single video and mediates every
//! segment and frame mutation, addressing them by playback position.
//!
//! Segments are closed intervals and may touch. When a position is both the
//! end of one segment and the start of the next, it belongs to the later
//! segment. All lookups are O(n) scans over the segment list.

use super::frame::AnnotatedFrame;
use super::schema::{load_schema, SchemaRoot};
use super::segment::AnnotatedSegment;
use crate::error::{AnnotationError, Result};
use crate::io::media::{MediaInfoProbe, VideoDetails, VideoProbe};
use crate::io::serialization::{self, DatasetFile};
use crate::util::paths;
use std::path::{Path, PathBuf};

/// A video together with its metadata schema and annotated segments.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedVideo {
    video: PathBuf,
    /// Probed at load time, never persisted
    details: VideoDetails,
    schema_file: PathBuf,
    /// Loaded at load time, never persisted
    schema: SchemaRoot,
    segments: Vec<AnnotatedSegment>,
}

impl AnnotatedVideo {
    /// Create an empty dataset from already-resolved parts.
    pub fn new(video: PathBuf, details: VideoDetails, schema_file: PathBuf, schema: SchemaRoot) -> Self {
        Self {
            video,
            details,
            schema_file,
            schema,
            segments: Vec::new(),
        }
    }

    /// Create an empty dataset for a video file, probing it with `mediainfo`.
    pub fn for_video(video: &Path, schema_file: &Path) -> Result<Self> {
        Self::for_video_with(&MediaInfoProbe::from_env(), video, schema_file)
    }

    /// Create an empty dataset for a video file using the supplied probe.
    pub fn for_video_with(probe: &dyn VideoProbe, video: &Path, schema_file: &Path) -> Result<Self> {
        let video = paths::absolute(video)?;
        let schema_file = paths::absolute(schema_file)?;

        let details = probe.probe(&video)?;
        let schema = load_schema(&schema_file)?;

        log::info!(
            "Opened {} ({}x{} @ {} fps, {}s)",
            video.display(),
            details.width,
            details.height,
            details.framerate,
            details.duration
        );
        Ok(Self::new(video, details, schema_file, schema))
    }

    /// Load a dataset file, probing its video with `mediainfo`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json_file_with(&MediaInfoProbe::from_env(), path)
    }

    /// Load a dataset file using the supplied probe.
    ///
    /// The stored video and schema paths are resolved relative to the
    /// dataset file's directory. Segment contents are restored as written.
    pub fn from_json_file_with(probe: &dyn VideoProbe, path: &Path) -> Result<Self> {
        let data = serialization::import_json(path)?;

        let dir = parent_dir(&paths::absolute(path)?);
        let video = paths::resolve(&dir, Path::new(&data.video))?;
        let schema_file = paths::resolve(&dir, Path::new(&data.schema))?;

        let mut dataset = Self::for_video_with(probe, &video, &schema_file)?;
        dataset.segments = data
            .segments
            .iter()
            .map(|record| AnnotatedSegment::from_record(&dataset.schema, record))
            .collect::<Result<Vec<_>>>()?;

        if !dataset.is_consistent() {
            log::warn!("{} contains overlapping or unordered segments", path.display());
        }
        log::info!("Loaded {} segments from {}", dataset.segments.len(), path.display());
        Ok(dataset)
    }

    /// Write the dataset to a JSON file.
    ///
    /// The video and schema paths are stored relative to the file's directory.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let dir = parent_dir(&paths::absolute(path)?);
        let data = DatasetFile {
            video: path_string(&paths::relative_to(&self.video, &dir)),
            schema: path_string(&paths::relative_to(&self.schema_file, &dir)),
            segments: self.segments.iter().map(AnnotatedSegment::to_record).collect(),
        };

        serialization::export_json(&data, path)?;
        log::info!("Saved {} segments to {}", self.segments.len(), path.display());
        Ok(())
    }

    pub fn video(&self) -> &Path {
        &self.video
    }

    pub fn details(&self) -> &VideoDetails {
        &self.details
    }

    pub fn schema_file(&self) -> &Path {
        &self.schema_file
    }

    pub fn schema(&self) -> &SchemaRoot {
        &self.schema
    }

    /// The segments in chronological order.
    pub fn segments(&self) -> &[AnnotatedSegment] {
        &self.segments
    }

    /// Round a position (in seconds) to the nearest frame boundary.
    ///
    /// Positions are returned unchanged if the framerate is unusable.
    pub fn to_nearest_frame(&self, position: f64) -> f64 {
        let framerate = self.details.framerate;
        if !(framerate.is_finite() && framerate > 0.0) {
            return position;
        }
        (position * framerate).round() / framerate
    }

    /// Index of the segment containing `position`, if any.
    pub fn get_segment_index(&self, position: f64) -> Option<usize> {
        // Reverse scan so a shared boundary resolves to the later segment
        self.segments
            .iter()
            .rposition(|segment| segment.contains(position))
    }

    pub fn get_segment(&self, position: f64) -> Option<&AnnotatedSegment> {
        self.get_segment_index(position).map(|index| &self.segments[index])
    }

    /// Mutable access to the segment containing `position`, for metadata edits.
    pub fn segment_mut(&mut self, position: f64) -> Option<&mut AnnotatedSegment> {
        let index = self.get_segment_index(position)?;
        Some(&mut self.segments[index])
    }

    fn require_segment(&mut self, position: f64) -> Result<&mut AnnotatedSegment> {
        self.segment_mut(position)
            .ok_or(AnnotationError::NoSegment(position))
    }

    /// The frame at `position`, if the containing segment has one there.
    pub fn get_frame(&self, position: f64) -> Result<Option<&AnnotatedFrame>> {
        let segment = self
            .get_segment(position)
            .ok_or(AnnotationError::NoSegment(position))?;
        Ok(segment.get_frame(position))
    }

    /// Mutable access to the frame at `position`, for metadata edits.
    pub fn frame_mut(&mut self, position: f64) -> Result<Option<&mut AnnotatedFrame>> {
        Ok(self.require_segment(position)?.get_frame_mut(position))
    }

    fn sort_segments(&mut self) {
        self.segments.sort_by(|a, b| a.start().total_cmp(&b.start()));
    }

    /// Add a segment starting at `start`.
    ///
    /// The new segment extends up to the start of the next segment, or to
    /// the end of the video if there is none.
    pub fn add_segment(&mut self, start: f64) -> Result<&mut AnnotatedSegment> {
        // Written so that NaN fails the check
        if !(start >= 0.0 && start <= self.details.duration) {
            return Err(AnnotationError::OutOfBounds {
                what: "segment starting time",
                position: start,
            });
        }

        if self.get_segment(start).is_some() {
            return Err(AnnotationError::Overlap(start));
        }

        let end = self
            .segments
            .iter()
            .map(AnnotatedSegment::start)
            .find(|&next| next > start)
            .unwrap_or(self.details.duration);

        if !(end > start) {
            return Err(AnnotationError::InvalidRange { start, end });
        }

        self.sort_segments();
        let index = self.segments.partition_point(|segment| segment.start() < start);
        self.segments
            .insert(index, AnnotatedSegment::new(&self.schema, start, end));
        log::debug!("Added segment {start}s-{end}s, dataset now has {} segments", self.segments.len());

        Ok(&mut self.segments[index])
    }

    /// Remove the segment containing `position`, along with its frames.
    pub fn delete_segment(&mut self, position: f64) -> Result<()> {
        let index = self
            .get_segment_index(position)
            .ok_or(AnnotationError::NoSegment(position))?;
        let removed = self.segments.remove(index);
        log::debug!(
            "Deleted segment {}s-{}s with {} frames",
            removed.start(),
            removed.end(),
            removed.frames().len()
        );
        Ok(())
    }

    /// Number of frames truncating the segment at `position` to `end` would discard.
    pub fn truncate_would_discard(&self, position: f64, end: f64) -> Result<usize> {
        let segment = self
            .get_segment(position)
            .ok_or(AnnotationError::NoSegment(position))?;
        Ok(segment.truncate_would_discard(end))
    }

    /// Move the end of the segment containing `position` to `end`.
    ///
    /// The new end may not run past the next segment or the end of the video.
    pub fn truncate_segment(&mut self, position: f64, end: f64) -> Result<()> {
        let index = self
            .get_segment_index(position)
            .ok_or(AnnotationError::NoSegment(position))?;

        let limit = self
            .segments
            .get(index + 1)
            .map(AnnotatedSegment::start)
            .unwrap_or(self.details.duration);
        if !(end <= limit) {
            return Err(AnnotationError::OutOfBounds {
                what: "segment end",
                position: end,
            });
        }

        self.segments[index].truncate(end)
    }

    /// Add a frame at `position` to the segment containing it.
    pub fn add_frame(&mut self, position: f64) -> Result<&mut AnnotatedFrame> {
        self.require_segment(position)?.add_frame(position)
    }

    /// Remove the frame at `position`.
    pub fn delete_frame(&mut self, position: f64) -> Result<()> {
        self.require_segment(position)?.delete_frame(position)
    }

    /// Whether segments are ordered, non-overlapping and frames lie within
    /// their segments. Loaded files are not guaranteed to satisfy this.
    pub fn is_consistent(&self) -> bool {
        let ordered = self
            .segments
            .windows(2)
            .all(|pair| pair[0].end() <= pair[1].start());

        let bounded = self.segments.iter().all(|segment| {
            segment.start() < segment.end()
                && segment.start() >= 0.0
                && segment.end() <= self.details.duration
                && segment.frames().iter().all(|frame| segment.contains(frame.position()))
                && segment
                    .frames()
                    .windows(2)
                    .all(|pair| pair[0].position() < pair[1].position())
        });

        ordered && bounded
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
