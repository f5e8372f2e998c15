// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Trivial transforms: byte-for-byte copy, constant fill, and two-input
//! averaging.

use async_trait::async_trait;

use crate::buffers::ImageDesc;
use crate::errors::StageError;
use crate::traits::{SlotDesc, Stage, StageIo};

/// Copies its input buffer into its output buffer unchanged.
///
/// Input slot `src` and output slot `dst` share one declared shape.
pub struct IdentityCopy {
    inputs: [SlotDesc; 1],
    outputs: [SlotDesc; 1],
}

impl IdentityCopy {
    pub fn new(desc: ImageDesc) -> Self {
        Self {
            inputs: [SlotDesc::new("src", desc)],
            outputs: [SlotDesc::new("dst", desc)],
        }
    }
}

#[async_trait]
impl Stage for IdentityCopy {
    fn name(&self) -> &str {
        "identity_copy"
    }

    fn input_slots(&self) -> &[SlotDesc] {
        &self.inputs
    }

    fn output_slots(&self) -> &[SlotDesc] {
        &self.outputs
    }

    async fn run(&self, io: StageIo<'_>) -> Result<(), StageError> {
        let src = io.inputs[0].as_bytes().to_vec();
        io.outputs[0].as_bytes_mut().copy_from_slice(&src);
        Ok(())
    }
}

/// Source transform with no inputs: fills its single output `dst` with a
/// constant byte.
pub struct ConstantFill {
    value: u8,
    outputs: [SlotDesc; 1],
}

impl ConstantFill {
    pub fn new(desc: ImageDesc, value: u8) -> Self {
        Self {
            value,
            outputs: [SlotDesc::new("dst", desc)],
        }
    }
}

#[async_trait]
impl Stage for ConstantFill {
    fn name(&self) -> &str {
        "constant_fill"
    }

    fn input_slots(&self) -> &[SlotDesc] {
        &[]
    }

    fn output_slots(&self) -> &[SlotDesc] {
        &self.outputs
    }

    async fn run(&self, io: StageIo<'_>) -> Result<(), StageError> {
        io.outputs[0].fill(self.value);
        Ok(())
    }
}

/// Averages two same-shape inputs `a` and `b` byte by byte into `dst`.
///
/// Both inputs may legally be wired to the same buffer, in which case the
/// blend degenerates to a copy.
pub struct MeanBlend {
    inputs: [SlotDesc; 2],
    outputs: [SlotDesc; 1],
}

impl MeanBlend {
    pub fn new(desc: ImageDesc) -> Self {
        Self {
            inputs: [SlotDesc::new("a", desc), SlotDesc::new("b", desc)],
            outputs: [SlotDesc::new("dst", desc)],
        }
    }
}

#[async_trait]
impl Stage for MeanBlend {
    fn name(&self) -> &str {
        "mean_blend"
    }

    fn input_slots(&self) -> &[SlotDesc] {
        &self.inputs
    }

    fn output_slots(&self) -> &[SlotDesc] {
        &self.outputs
    }

    async fn run(&self, io: StageIo<'_>) -> Result<(), StageError> {
        let a = io.inputs[0].as_bytes().to_vec();
        let b = io.inputs[1].as_bytes().to_vec();
        for (out, (x, y)) in io.outputs[0].as_bytes_mut().iter_mut().zip(a.iter().zip(&b)) {
            *out = ((*x as u16 + *y as u16) / 2) as u8;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::{ImageBuffer, PixelFormat};

    #[tokio::test]
    async fn identity_copy_preserves_bytes() {
        let desc = ImageDesc::new(4, 4, PixelFormat::Gray8);
        let stage = IdentityCopy::new(desc);
        let mut src = ImageBuffer::new(desc);
        src.fill(0xAB);
        let mut outputs = [ImageBuffer::new(desc)];

        stage
            .run(StageIo {
                inputs: std::slice::from_ref(&src),
                outputs: &mut outputs,
            })
            .await
            .unwrap();
        assert!(outputs[0].as_bytes().iter().all(|&b| b == 0xAB));
    }

    #[tokio::test]
    async fn constant_fill_writes_its_value() {
        let desc = ImageDesc::new(3, 3, PixelFormat::Rgb8);
        let stage = ConstantFill::new(desc, 0x40);
        let mut outputs = [ImageBuffer::new(desc)];

        stage
            .run(StageIo {
                inputs: &[],
                outputs: &mut outputs,
            })
            .await
            .unwrap();
        assert!(outputs[0].as_bytes().iter().all(|&b| b == 0x40));
    }

    #[tokio::test]
    async fn mean_blend_averages_its_inputs() {
        let desc = ImageDesc::new(4, 4, PixelFormat::Gray8);
        let stage = MeanBlend::new(desc);
        let mut a = ImageBuffer::new(desc);
        a.fill(0x10);
        let mut b = ImageBuffer::new(desc);
        b.fill(0x30);
        let mut outputs = [ImageBuffer::new(desc)];

        stage
            .run(StageIo {
                inputs: &[a, b],
                outputs: &mut outputs,
            })
            .await
            .unwrap();
        assert!(outputs[0].as_bytes().iter().all(|&v| v == 0x20));
    }
}
