// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Dataset file serialization and deserialization.
//!
//! A dataset file is pretty-printed JSON holding the video and schema paths
//! (relative to the dataset file's directory) and the annotated segments.
//! Writes are not atomic: a failure part-way through can leave a truncated
//! file behind.

use crate::error::{AnnotationError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Persisted form of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub position: f64,
    pub metadata: Map<String, Value>,
}

/// Persisted form of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub start: f64,
    pub end: f64,
    pub metadata: Map<String, Value>,
    pub frames: Vec<FrameRecord>,
}

/// Persisted form of a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub video: String,
    pub schema: String,
    pub segments: Vec<SegmentRecord>,
}

/// Parse dataset JSON text.
pub fn parse_dataset(json: &str) -> Result<DatasetFile> {
    let data: Value = serde_json::from_str(json)?;

    for key in ["video", "schema"] {
        if !data.get(key).is_some_and(Value::is_string) {
            return Err(AnnotationError::MalformedDataset(format!(
                "dataset does not contain a top-level \"{key}\" string"
            )));
        }
    }
    if !data.get("segments").is_some_and(Value::is_array) {
        return Err(AnnotationError::MalformedDataset(
            "dataset does not contain a top-level \"segments\" array".into(),
        ));
    }

    serde_json::from_value(data).map_err(|e| AnnotationError::MalformedDataset(e.to_string()))
}

/// Import a dataset file.
pub fn import_json(path: &Path) -> Result<DatasetFile> {
    let json = std::fs::read_to_string(path)?;
    parse_dataset(&json)
}

/// Render a dataset as pretty-printed JSON with four-space indentation.
pub fn to_pretty_json(data: &DatasetFile) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    data.serialize(&mut serializer)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Export a dataset file.
pub fn export_json(data: &DatasetFile, path: &Path) -> Result<()> {
    let json = to_pretty_json(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DatasetFile {
        DatasetFile {
            video: "clip.mp4".into(),
            schema: "schema.yml".into(),
            segments: vec![SegmentRecord {
                start: 0.0,
                end: 4.0,
                metadata: json!({"activity": "walking"}).as_object().unwrap().clone(),
                frames: vec![FrameRecord {
                    position: 1.0,
                    metadata: json!({"occluded": false}).as_object().unwrap().clone(),
                }],
            }],
        }
    }

    #[test]
    fn test_text_roundtrip() {
        let data = sample();
        let text = to_pretty_json(&data).unwrap();
        assert!(text.contains("\n    \"video\": \"clip.mp4\""));
        assert_eq!(parse_dataset(&text).unwrap(), data);
    }

    #[test]
    fn test_missing_top_level_fields() {
        for json in [
            r#"{"schema": "s.yml", "segments": []}"#,
            r#"{"video": 3, "schema": "s.yml", "segments": []}"#,
            r#"{"video": "v.mp4", "segments": []}"#,
            r#"{"video": "v.mp4", "schema": "s.yml"}"#,
            r#"{"video": "v.mp4", "schema": "s.yml", "segments": {}}"#,
            r#"[]"#,
        ] {
            assert!(
                matches!(parse_dataset(json), Err(AnnotationError::MalformedDataset(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_malformed_segment() {
        let json = r#"{"video": "v.mp4", "schema": "s.yml", "segments": [{"start": 0}]}"#;
        assert!(matches!(parse_dataset(json), Err(AnnotationError::MalformedDataset(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse_dataset("{"), Err(AnnotationError::Json(_))));
    }
}
