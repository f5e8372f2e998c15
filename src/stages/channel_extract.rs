// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Extracts one color plane from an interleaved RGB image.

use async_trait::async_trait;

use crate::buffers::{ImageDesc, PixelFormat};
use crate::errors::StageError;
use crate::traits::{SlotDesc, Stage, StageIo};

/// Which plane of an RGB pixel to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
}

impl ColorChannel {
    fn byte_offset(self) -> usize {
        match self {
            ColorChannel::Red => 0,
            ColorChannel::Green => 1,
            ColorChannel::Blue => 2,
        }
    }
}

/// Turns an `Rgb8` input (`src`) into a `Gray8` output (`dst`) of the same
/// width and height by copying one channel per pixel.
pub struct ChannelExtract {
    channel: ColorChannel,
    inputs: [SlotDesc; 1],
    outputs: [SlotDesc; 1],
}

impl ChannelExtract {
    pub fn new(width: u32, height: u32, channel: ColorChannel) -> Self {
        Self {
            channel,
            inputs: [SlotDesc::new("src", ImageDesc::new(width, height, PixelFormat::Rgb8))],
            outputs: [SlotDesc::new("dst", ImageDesc::new(width, height, PixelFormat::Gray8))],
        }
    }
}

#[async_trait]
impl Stage for ChannelExtract {
    fn name(&self) -> &str {
        "channel_extract"
    }

    fn input_slots(&self) -> &[SlotDesc] {
        &self.inputs
    }

    fn output_slots(&self) -> &[SlotDesc] {
        &self.outputs
    }

    async fn run(&self, io: StageIo<'_>) -> Result<(), StageError> {
        let offset = self.channel.byte_offset();
        let src: Vec<u8> = io.inputs[0]
            .as_bytes()
            .chunks_exact(3)
            .map(|px| px[offset])
            .collect();
        io.outputs[0].as_bytes_mut().copy_from_slice(&src);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::ImageBuffer;

    #[tokio::test]
    async fn extracts_the_requested_plane() {
        let stage = ChannelExtract::new(2, 1, ColorChannel::Green);
        let mut src = ImageBuffer::new(ImageDesc::new(2, 1, PixelFormat::Rgb8));
        src.as_bytes_mut().copy_from_slice(&[10, 20, 30, 40, 50, 60]);
        let mut outputs = [ImageBuffer::new(ImageDesc::new(2, 1, PixelFormat::Gray8))];

        stage
            .run(StageIo {
                inputs: std::slice::from_ref(&src),
                outputs: &mut outputs,
            })
            .await
            .unwrap();
        assert_eq!(outputs[0].as_bytes(), &[20, 50]);
    }

    #[test]
    fn slots_declare_the_format_change() {
        let stage = ChannelExtract::new(8, 4, ColorChannel::Red);
        assert_eq!(stage.input_slots()[0].desc.format, PixelFormat::Rgb8);
        assert_eq!(stage.output_slots()[0].desc.format, PixelFormat::Gray8);
        assert_eq!(stage.input_slots()[0].desc.width, 8);
    }
}
