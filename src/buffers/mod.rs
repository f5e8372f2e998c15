// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod format;
mod image;
mod pool;

pub use format::{ImageDesc, PixelFormat, Rect};
pub use image::{BufferId, ImageBuffer};
pub use pool::{BufferPool, BufferState};
