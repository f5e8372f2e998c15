// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::buffers::{BufferId, BufferState, ImageDesc};
use crate::graph::{ParamIndex, StageId};

/// Opaque failure reported by a stage transform.
///
/// The engine treats stages as black boxes; whatever detail a transform wants
/// to surface travels in the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StageError {
    pub message: String,
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Errors raised while executing a graph, in either scheduling mode.
///
/// Taxonomy: capacity errors (`QueueFull`) are transient and recoverable by
/// retrying after a drain; `Timeout` is a recoverable signal that does not
/// corrupt queue state; `StageFailed` is fatal to the single dispatch that
/// contained it, never to the whole session.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A stage transform reported failure. Execution of the containing
    /// dispatch halted; downstream buffers were not produced.
    #[error("stage {stage_id} '{stage_name}' failed: {source}")]
    StageFailed {
        stage_id: StageId,
        stage_name: String,
        #[source]
        source: StageError,
    },
    /// The ready side of a parameter queue is at capacity. Retry after
    /// draining the done side.
    #[error("parameter {param}: queue is full (depth {depth})")]
    QueueFull { param: ParamIndex, depth: usize },
    /// An enqueued buffer's shape disagrees with the parameter's declared
    /// shape.
    #[error("parameter {param}: buffer {buffer} is {actual}, parameter expects {expected}")]
    ShapeMismatch {
        param: ParamIndex,
        buffer: BufferId,
        expected: ImageDesc,
        actual: ImageDesc,
    },
    /// A blocking dequeue gave up before any buffer reached the done side.
    #[error("parameter {param}: timed out waiting for a done buffer")]
    Timeout { param: ParamIndex },
    #[error("unknown graph parameter {0}")]
    UnknownParameter(ParamIndex),
    /// A buffer was offered in a state that forbids the transition, for
    /// example enqueued ready while already sitting in another queue.
    #[error("buffer {buffer} is {state}; it cannot be enqueued ready again")]
    BufferStateViolation {
        buffer: BufferId,
        state: BufferState,
    },
    /// The caller supplied the wrong number of parameter buffers.
    #[error("graph exposes {expected} parameters but {actual} buffers were supplied")]
    ParamCountMismatch { expected: usize, actual: usize },
    /// The graph was not verified before execution.
    #[error("graph has not been verified")]
    NotVerified,
    /// The dispatch worker is no longer running.
    #[error("pipelined session worker is gone")]
    WorkerGone,
}
