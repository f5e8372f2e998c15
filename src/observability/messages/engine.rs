// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for executor lifecycle and dispatch events.

use std::fmt::{Display, Formatter};
use tracing::Span;

use crate::observability::messages::StructuredLog;

/// A single-shot graph execution started.
///
/// # Log Level
/// `debug!` - High-frequency event in pipelined sessions
pub struct ExecutionStarted {
    pub stage_count: usize,
}

impl Display for ExecutionStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Starting graph execution over {} stages", self.stage_count)
    }
}

impl StructuredLog for ExecutionStarted {
    fn log(&self) {
        tracing::debug!(stage_count = self.stage_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("execution", span_name = name, stage_count = self.stage_count)
    }
}

/// A graph execution finished successfully.
///
/// # Log Level
/// `debug!` - High-frequency event in pipelined sessions
pub struct ExecutionCompleted {
    pub duration_us: u128,
}

impl Display for ExecutionCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Graph execution completed in {}us", self.duration_us)
    }
}

impl StructuredLog for ExecutionCompleted {
    fn log(&self) {
        tracing::debug!(duration_us = self.duration_us, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("execution", span_name = name, duration_us = self.duration_us)
    }
}

/// A pipelined session came up with its parameter queues registered.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineStarted {
    pub param_count: usize,
    pub queue_depth: usize,
}

impl Display for PipelineStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipelined session started: {} parameter queues, depth {}",
            self.param_count, self.queue_depth
        )
    }
}

impl StructuredLog for PipelineStarted {
    fn log(&self) {
        tracing::info!(
            param_count = self.param_count,
            queue_depth = self.queue_depth,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            param_count = self.param_count,
            queue_depth = self.queue_depth,
        )
    }
}

/// A dispatched execution failed inside the pipelined session.
///
/// # Log Level
/// `error!` - Failure requiring caller attention
pub struct DispatchFailed<'a> {
    pub sequence: u64,
    pub error: &'a dyn std::error::Error,
}

impl Display for DispatchFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dispatch {} failed: {}", self.sequence, self.error)
    }
}

impl StructuredLog for DispatchFailed<'_> {
    fn log(&self) {
        tracing::error!(
            sequence = self.sequence,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("dispatch", span_name = name, sequence = self.sequence)
    }
}
