//! Fixed-shape image buffers with patch-based access windows.
//!
//! An [`ImageBuffer`] is the unit of data that flows through a graph: a block
//! of pixels with a fixed [`ImageDesc`] shape and a process-unique identity.
//! Callers fill and drain buffers through rectangular patch copies rather
//! than raw pointer access, so the stride math lives in exactly one place.
//!
//! Ownership discipline: a buffer has exactly one legitimate owner at each
//! instant (a queue, an in-flight execution, or the caller). The engine moves
//! buffers by value between those owners; it never shares them.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::buffers::format::{ImageDesc, Rect};
use crate::errors::BufferError;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique, stable identity of a buffer.
///
/// The id survives every enqueue/dequeue round trip, which is what lets the
/// pipelined executor keep a lifecycle ledger per buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// A fixed-shape block of pixel data.
#[derive(Debug)]
pub struct ImageBuffer {
    id: BufferId,
    desc: ImageDesc,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Allocates a zero-filled buffer of the given shape with a fresh id.
    pub fn new(desc: ImageDesc) -> Self {
        Self {
            id: BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)),
            desc,
            data: vec![0; desc.byte_len()],
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    /// Copies `src` into the given window, row by row.
    ///
    /// `src` must hold exactly `rect.width() * rect.height()` pixels in the
    /// buffer's own format, densely packed (no padding between rows).
    pub fn write_patch(&mut self, rect: Rect, src: &[u8]) -> Result<(), BufferError> {
        let (row_len, stride) = self.patch_layout(&rect, src.len())?;
        for (row, chunk) in src.chunks_exact(row_len).enumerate() {
            let y = rect.start_y as usize + row;
            let offset = y * stride + rect.start_x as usize * self.desc.format.bytes_per_pixel();
            self.data[offset..offset + row_len].copy_from_slice(chunk);
        }
        Ok(())
    }

    /// Copies the given window into `dst`, row by row, densely packed.
    pub fn read_patch(&self, rect: Rect, dst: &mut [u8]) -> Result<(), BufferError> {
        let (row_len, stride) = self.patch_layout(&rect, dst.len())?;
        for (row, chunk) in dst.chunks_exact_mut(row_len).enumerate() {
            let y = rect.start_y as usize + row;
            let offset = y * stride + rect.start_x as usize * self.desc.format.bytes_per_pixel();
            chunk.copy_from_slice(&self.data[offset..offset + row_len]);
        }
        Ok(())
    }

    /// Overwrites every byte of the payload.
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Whole payload, read-only. Row `y` starts at `y * desc.row_bytes()`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whole payload, writable.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn patch_layout(&self, rect: &Rect, payload_len: usize) -> Result<(usize, usize), BufferError> {
        if !rect.fits(&self.desc) {
            return Err(BufferError::WindowOutOfBounds {
                buffer: self.id,
                desc: self.desc,
                rect: *rect,
            });
        }
        let row_len = rect.width() as usize * self.desc.format.bytes_per_pixel();
        let expected = row_len * rect.height() as usize;
        if payload_len != expected {
            return Err(BufferError::PatchSizeMismatch {
                buffer: self.id,
                expected,
                actual: payload_len,
            });
        }
        Ok((row_len, self.desc.row_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::format::PixelFormat;

    #[test]
    fn ids_are_unique() {
        let desc = ImageDesc::new(4, 4, PixelFormat::Gray8);
        let a = ImageBuffer::new(desc);
        let b = ImageBuffer::new(desc);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn patch_round_trip() {
        let desc = ImageDesc::new(8, 8, PixelFormat::Gray8);
        let mut buf = ImageBuffer::new(desc);

        let rect = Rect::new(2, 2, 6, 6);
        let src: Vec<u8> = (0u8..16).collect();
        buf.write_patch(rect, &src).unwrap();

        let mut out = vec![0u8; 16];
        buf.read_patch(rect, &mut out).unwrap();
        assert_eq!(out, src);

        // Pixels outside the window stay untouched.
        assert_eq!(buf.as_bytes()[0], 0);
    }

    #[test]
    fn write_patch_rejects_bad_window() {
        let desc = ImageDesc::new(4, 4, PixelFormat::Gray8);
        let mut buf = ImageBuffer::new(desc);
        let rect = Rect::new(0, 0, 8, 4);
        let err = buf.write_patch(rect, &[0u8; 32]).unwrap_err();
        assert!(matches!(err, BufferError::WindowOutOfBounds { .. }));
    }

    #[test]
    fn write_patch_rejects_short_payload() {
        let desc = ImageDesc::new(4, 4, PixelFormat::Rgb8);
        let mut buf = ImageBuffer::new(desc);
        let err = buf.write_patch(desc.full_rect(), &[0u8; 10]).unwrap_err();
        assert!(matches!(err, BufferError::PatchSizeMismatch { expected: 48, actual: 10, .. }));
    }
}
