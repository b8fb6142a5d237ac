// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the annotation data model.

use crate::util::time::format_position;
use thiserror::Error;

/// Errors raised by schema loading, metadata access and dataset mutation.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("invalid schema: {0}")]
    SchemaFormat(String),

    #[error("unrecognised metadata datatype \"{0}\"")]
    UnknownType(String),

    #[error("invalid dataset: {0}")]
    MalformedDataset(String),

    #[error("unrecognised metadata field \"{0}\"")]
    UnknownField(String),

    #[error("invalid value {value} for metadata field \"{field}\"")]
    InvalidValue { field: String, value: String },

    #[error("metadata field \"{field}\" expects a {expected} value, got {value}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("cannot parse \"{text}\" as {expected} for metadata field \"{field}\"")]
    Coercion {
        field: String,
        expected: &'static str,
        text: String,
    },

    #[error("{what} {} is out of bounds", at(.position))]
    OutOfBounds { what: &'static str, position: f64 },

    #[error("an existing segment already contains the position {}", at(.0))]
    Overlap(f64),

    #[error("cannot add a duplicate frame at position {}", at(.0))]
    DuplicateFrame(f64),

    #[error("segment end {} must come after segment start {}", at(.end), at(.start))]
    InvalidRange { start: f64, end: f64 },

    #[error("no frame found at position {}", at(.0))]
    NotFound(f64),

    #[error("no segment found at position {}", at(.0))]
    NoSegment(f64),

    #[error("video probe failed: {0}")]
    VideoProbe(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn at(position: &f64) -> String {
    format_position(*position)
}

/// Result type for annotation operations.
pub type Result<T> = std::result::Result<T, AnnotationError>;
