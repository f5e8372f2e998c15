// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod buffers;    // image buffers + pools
pub mod config;     // YAML config + validation
pub mod engine;     // graph executors
pub mod errors;     // error handling
pub mod graph;      // graph construction + verification
pub mod observability;
pub mod perf;       // execution timing
pub mod stages;     // built-in transforms
pub mod traits;     // unified abstractions
