// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::buffers::{BufferId, ImageDesc, Rect};

/// Errors from patch-based buffer access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The requested window does not lie inside the buffer.
    #[error("{buffer}: window ({rect:?}) exceeds image bounds ({desc})")]
    WindowOutOfBounds {
        buffer: BufferId,
        desc: ImageDesc,
        rect: Rect,
    },
    /// The caller's payload does not match the window size.
    #[error("{buffer}: patch payload is {actual} bytes, window needs {expected}")]
    PatchSizeMismatch {
        buffer: BufferId,
        expected: usize,
        actual: usize,
    },
}
