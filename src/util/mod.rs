// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Small helpers shared by the model and I/O layers.

pub mod paths;
pub mod time;
