// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotated frames.

use super::metadata::Metadata;
use super::schema::FieldGroup;
use crate::error::Result;
use crate::io::serialization::FrameRecord;
use std::sync::Arc;

/// A single annotated instant within a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedFrame {
    position: f64,
    pub metadata: Metadata,
}

impl AnnotatedFrame {
    /// Create a frame at `position` (in seconds) with default metadata.
    pub fn new(fields: Arc<FieldGroup>, position: f64) -> Self {
        Self {
            position,
            metadata: Metadata::new(fields),
        }
    }

    /// Position of the frame in seconds.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn to_record(&self) -> FrameRecord {
        FrameRecord {
            position: self.position,
            metadata: self.metadata.to_plain(),
        }
    }

    /// Rebuild a frame from its persisted form.
    pub fn from_record(fields: Arc<FieldGroup>, record: &FrameRecord) -> Result<Self> {
        let mut frame = Self::new(fields, record.position);
        frame.metadata.update_from_plain(&record.metadata)?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnnotationError;
    use crate::models::schema::{FieldType, FieldValue, SchemaField};

    fn fields() -> Arc<FieldGroup> {
        Arc::new(FieldGroup::new(vec![SchemaField::new("occluded", FieldType::Boolean)]).unwrap())
    }

    #[test]
    fn test_record_roundtrip() {
        let mut frame = AnnotatedFrame::new(fields(), 1.5);
        frame.metadata.set("occluded", FieldValue::Bool(true)).unwrap();

        let record = frame.to_record();
        assert_eq!(record.position, 1.5);

        let restored = AnnotatedFrame::from_record(fields(), &record).unwrap();
        assert_eq!(restored, frame);
    }

    #[test]
    fn test_record_with_unknown_metadata() {
        let mut record = AnnotatedFrame::new(fields(), 0.0).to_record();
        record.metadata.insert("speed".into(), serde_json::json!(3));
        assert!(matches!(
            AnnotatedFrame::from_record(fields(), &record),
            Err(AnnotationError::UnknownField(_))
        ));
    }
}
