// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Affine warp over grayscale images, nearest-neighbor sampled.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::buffers::{ImageDesc, PixelFormat};
use crate::errors::StageError;
use crate::traits::{SlotDesc, Stage, StageIo};

/// Warps a `Gray8` input (`src`) into a `Gray8` output (`dst`) of the same
/// shape through a 3x2 affine matrix, sampling nearest-neighbor.
///
/// For each output pixel `(x, y)` the source location is
///
/// ```text
/// src_x = m[0]*x + m[2]*y + m[4]
/// src_y = m[1]*x + m[3]*y + m[5]
/// ```
///
/// Samples that land outside the source image produce 0. The matrix lives
/// behind a mutex so a caller can retarget the warp between dispatches while
/// the stage instance sits inside a running graph; each `run` reads one
/// consistent snapshot.
pub struct AffineWarp {
    matrix: Mutex<[f32; 6]>,
    inputs: [SlotDesc; 1],
    outputs: [SlotDesc; 1],
}

impl AffineWarp {
    /// Starts as the identity warp.
    pub fn new(width: u32, height: u32) -> Self {
        let desc = ImageDesc::new(width, height, PixelFormat::Gray8);
        Self {
            matrix: Mutex::new([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
            inputs: [SlotDesc::new("src", desc)],
            outputs: [SlotDesc::new("dst", desc)],
        }
    }

    /// Replaces the warp matrix. Takes effect on the next `run`.
    pub fn set_matrix(&self, matrix: [f32; 6]) {
        *self.matrix.lock().expect("warp matrix lock poisoned") = matrix;
    }

    /// Convenience constructor for a rotation about the image center.
    pub fn rotation_matrix(width: u32, height: u32, radians: f32) -> [f32; 6] {
        let (sin, cos) = radians.sin_cos();
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        [
            cos,
            sin,
            -sin,
            cos,
            cx - cx * cos + cy * sin,
            cy - cx * sin - cy * cos,
        ]
    }
}

#[async_trait]
impl Stage for AffineWarp {
    fn name(&self) -> &str {
        "affine_warp"
    }

    fn input_slots(&self) -> &[SlotDesc] {
        &self.inputs
    }

    fn output_slots(&self) -> &[SlotDesc] {
        &self.outputs
    }

    async fn run(&self, io: StageIo<'_>) -> Result<(), StageError> {
        let m = *self.matrix.lock().expect("warp matrix lock poisoned");
        let desc = self.inputs[0].desc;
        let (w, h) = (desc.width as i64, desc.height as i64);
        let src = io.inputs[0].as_bytes();
        let dst = io.outputs[0].as_bytes_mut();

        for y in 0..desc.height {
            for x in 0..desc.width {
                let fx = m[0] * x as f32 + m[2] * y as f32 + m[4];
                let fy = m[1] * x as f32 + m[3] * y as f32 + m[5];
                let sx = fx.round() as i64;
                let sy = fy.round() as i64;
                let value = if sx >= 0 && sx < w && sy >= 0 && sy < h {
                    src[(sy * w + sx) as usize]
                } else {
                    0
                };
                dst[(y * desc.width + x) as usize] = value;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::ImageBuffer;

    #[tokio::test]
    async fn identity_matrix_copies_the_image() {
        let stage = AffineWarp::new(4, 4);
        let desc = ImageDesc::new(4, 4, PixelFormat::Gray8);
        let mut src = ImageBuffer::new(desc);
        for (i, b) in src.as_bytes_mut().iter_mut().enumerate() {
            *b = i as u8;
        }
        let expected = src.as_bytes().to_vec();
        let mut outputs = [ImageBuffer::new(desc)];

        stage
            .run(StageIo {
                inputs: std::slice::from_ref(&src),
                outputs: &mut outputs,
            })
            .await
            .unwrap();
        assert_eq!(outputs[0].as_bytes(), expected.as_slice());
    }

    #[tokio::test]
    async fn translation_shifts_and_zero_fills() {
        let stage = AffineWarp::new(4, 1);
        // Shift right by one: output x samples source x - 1.
        stage.set_matrix([1.0, 0.0, 0.0, 1.0, -1.0, 0.0]);
        let desc = ImageDesc::new(4, 1, PixelFormat::Gray8);
        let mut src = ImageBuffer::new(desc);
        src.as_bytes_mut().copy_from_slice(&[10, 20, 30, 40]);
        let mut outputs = [ImageBuffer::new(desc)];

        stage
            .run(StageIo {
                inputs: std::slice::from_ref(&src),
                outputs: &mut outputs,
            })
            .await
            .unwrap();
        assert_eq!(outputs[0].as_bytes(), &[0, 10, 20, 30]);
    }
}
