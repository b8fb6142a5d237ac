// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline annotation.
//!
//! A dataset marks up a video with non-overlapping time segments and, within
//! each segment, individual annotated frames. Segments and frames carry
//! metadata validated against a user-supplied schema, and datasets are
//! persisted as JSON files that refer to their video and schema by relative
//! path.

pub mod error;
pub mod io;
pub mod models;
pub mod util;

pub use error::{AnnotationError, Result};
pub use io::media::{MediaInfoProbe, VideoDetails, VideoProbe};
pub use models::dataset::AnnotatedVideo;
pub use models::frame::AnnotatedFrame;
pub use models::metadata::Metadata;
pub use models::schema::{FieldGroup, FieldType, FieldValue, SchemaField, SchemaRoot};
pub use models::segment::AnnotatedSegment;
