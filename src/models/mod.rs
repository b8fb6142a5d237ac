// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The annotation data model.

pub mod dataset;
pub mod frame;
pub mod metadata;
pub mod schema;
pub mod segment;
