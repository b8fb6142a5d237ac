// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotated segments.
//!
//! A segment is a closed time interval `[start, end]` on the video
//! timeline. It owns its frames and keeps them sorted by position, with no
//! two frames sharing a position. Frame lookups are O(n) scans using exact
//! position equality; positions are expected to come from
//! [`AnnotatedVideo::to_nearest_frame`](super::dataset::AnnotatedVideo::to_nearest_frame).

use super::frame::AnnotatedFrame;
use super::metadata::Metadata;
use super::schema::{FieldGroup, SchemaRoot};
use crate::error::{AnnotationError, Result};
use crate::io::serialization::SegmentRecord;
use std::sync::Arc;

/// A bounded time interval with its own metadata and annotated frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSegment {
    start: f64,
    end: f64,
    pub metadata: Metadata,
    frames: Vec<AnnotatedFrame>,
    frame_fields: Arc<FieldGroup>,
}

impl AnnotatedSegment {
    /// Create an empty segment spanning `[start, end]`.
    ///
    /// Bounds are validated by the owning dataset, not here.
    pub fn new(schema: &SchemaRoot, start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            metadata: Metadata::new(Arc::clone(&schema.segments)),
            frames: Vec::new(),
            frame_fields: Arc::clone(&schema.frames),
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Whether `position` lies within `[start, end]`.
    pub fn contains(&self, position: f64) -> bool {
        self.start <= position && position <= self.end
    }

    /// The frames of this segment in chronological order.
    pub fn frames(&self) -> &[AnnotatedFrame] {
        &self.frames
    }

    pub fn get_frame_index(&self, position: f64) -> Option<usize> {
        self.frames.iter().position(|frame| frame.position() == position)
    }

    pub fn get_frame(&self, position: f64) -> Option<&AnnotatedFrame> {
        self.get_frame_index(position).map(|index| &self.frames[index])
    }

    pub fn get_frame_mut(&mut self, position: f64) -> Option<&mut AnnotatedFrame> {
        let index = self.get_frame_index(position)?;
        Some(&mut self.frames[index])
    }

    fn sort_frames(&mut self) {
        self.frames.sort_by(|a, b| a.position().total_cmp(&b.position()));
    }

    /// Add a frame with default metadata at `position`.
    pub fn add_frame(&mut self, position: f64) -> Result<&mut AnnotatedFrame> {
        if !self.contains(position) {
            return Err(AnnotationError::OutOfBounds {
                what: "frame time",
                position,
            });
        }

        if self.get_frame_index(position).is_some() {
            return Err(AnnotationError::DuplicateFrame(position));
        }

        self.frames
            .push(AnnotatedFrame::new(Arc::clone(&self.frame_fields), position));
        self.sort_frames();
        log::debug!("Added frame at {position}s, segment now has {} frames", self.frames.len());

        let index = self
            .get_frame_index(position)
            .ok_or(AnnotationError::NotFound(position))?;
        Ok(&mut self.frames[index])
    }

    /// Remove the frame at `position`.
    pub fn delete_frame(&mut self, position: f64) -> Result<()> {
        let index = self
            .get_frame_index(position)
            .ok_or(AnnotationError::NotFound(position))?;
        self.frames.remove(index);
        log::debug!("Deleted frame at {position}s");
        Ok(())
    }

    /// Number of frames a truncation to `end` would discard.
    pub fn truncate_would_discard(&self, end: f64) -> usize {
        self.frames.iter().filter(|frame| frame.position() > end).count()
    }

    /// Move the end of the segment to `end`, discarding any frames after it.
    pub fn truncate(&mut self, end: f64) -> Result<()> {
        // NaN and infinite ends fail this check
        if !(end > self.start && end.is_finite()) {
            return Err(AnnotationError::InvalidRange {
                start: self.start,
                end,
            });
        }

        let before = self.frames.len();
        self.end = end;
        self.frames.retain(|frame| frame.position() <= end);
        log::debug!(
            "Truncated segment starting at {}s to end at {end}s, discarded {} frames",
            self.start,
            before - self.frames.len()
        );
        Ok(())
    }

    pub fn to_record(&self) -> SegmentRecord {
        SegmentRecord {
            start: self.start,
            end: self.end,
            metadata: self.metadata.to_plain(),
            frames: self.frames.iter().map(AnnotatedFrame::to_record).collect(),
        }
    }

    /// Rebuild a segment from its persisted form.
    ///
    /// Frames are restored as written. Bounds and duplicate positions are not
    /// re-checked; the file is trusted to come from a consistent dataset.
    pub fn from_record(schema: &SchemaRoot, record: &SegmentRecord) -> Result<Self> {
        let mut segment = Self::new(schema, record.start, record.end);
        segment.metadata.update_from_plain(&record.metadata)?;
        segment.frames = record
            .frames
            .iter()
            .map(|frame| AnnotatedFrame::from_record(Arc::clone(&segment.frame_fields), frame))
            .collect::<Result<Vec<_>>>()?;
        Ok(segment)
    }
}
