// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deterministically failing stage for exercising error paths.

use async_trait::async_trait;

use crate::buffers::ImageDesc;
use crate::errors::StageError;
use crate::traits::{SlotDesc, Stage, StageIo};

/// Copies `src` to `dst` like [`IdentityCopy`], except it fails whenever the
/// first byte of the input equals the trigger value. The trigger travels in
/// the frame data itself, so failure injection works identically in
/// single-shot and pipelined runs.
///
/// [`IdentityCopy`]: crate::stages::IdentityCopy
pub struct FailOnValue {
    trigger: u8,
    inputs: [SlotDesc; 1],
    outputs: [SlotDesc; 1],
}

impl FailOnValue {
    pub fn new(desc: ImageDesc, trigger: u8) -> Self {
        Self {
            trigger,
            inputs: [SlotDesc::new("src", desc)],
            outputs: [SlotDesc::new("dst", desc)],
        }
    }
}

#[async_trait]
impl Stage for FailOnValue {
    fn name(&self) -> &str {
        "fail_on_value"
    }

    fn input_slots(&self) -> &[SlotDesc] {
        &self.inputs
    }

    fn output_slots(&self) -> &[SlotDesc] {
        &self.outputs
    }

    async fn run(&self, io: StageIo<'_>) -> Result<(), StageError> {
        if io.inputs[0].as_bytes().first() == Some(&self.trigger) {
            return Err(StageError::new(format!(
                "input starts with trigger byte {:#04x}",
                self.trigger
            )));
        }
        let src = io.inputs[0].as_bytes().to_vec();
        io.outputs[0].as_bytes_mut().copy_from_slice(&src);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::{ImageBuffer, PixelFormat};

    #[tokio::test]
    async fn fails_only_on_the_trigger_byte() {
        let desc = ImageDesc::new(2, 2, PixelFormat::Gray8);
        let stage = FailOnValue::new(desc, 0xFF);

        let mut src = ImageBuffer::new(desc);
        src.fill(0x01);
        let mut outputs = [ImageBuffer::new(desc)];
        stage
            .run(StageIo {
                inputs: std::slice::from_ref(&src),
                outputs: &mut outputs,
            })
            .await
            .unwrap();
        assert_eq!(outputs[0].as_bytes()[0], 0x01);

        src.fill(0xFF);
        let err = stage
            .run(StageIo {
                inputs: std::slice::from_ref(&src),
                outputs: &mut outputs,
            })
            .await
            .unwrap_err();
        assert!(err.message.contains("trigger"));
    }
}
