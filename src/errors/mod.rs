// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod buffer;
mod execution;
mod graph;

pub use buffer::BufferError;
pub use execution::{ExecutionError, StageError};
pub use graph::{GraphError, ValidationIssue};
