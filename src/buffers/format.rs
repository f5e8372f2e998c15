// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pixel formats, image shapes, and rectangular access windows.

use std::fmt;

/// Element layout of a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single 8-bit plane (luma / extracted channel).
    Gray8,
    /// Interleaved 8-bit red, green, blue.
    Rgb8,
    /// Interleaved 8-bit red, green, blue, alpha.
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Gray8 => "Gray8",
            PixelFormat::Rgb8 => "Rgb8",
            PixelFormat::Rgba8 => "Rgba8",
        };
        write!(f, "{}", name)
    }
}

/// Fixed shape of an image buffer: dimensions plus element layout.
///
/// Two buffers (or a buffer and a stage slot) are compatible when their
/// descriptors compare equal. Compatibility is checked once at graph
/// verification time, not at every execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl ImageDesc {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self { width, height, format }
    }

    /// Bytes in one row of pixels.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Total payload size in bytes.
    pub fn byte_len(&self) -> usize {
        self.row_bytes() * self.height as usize
    }

    /// The window covering the entire image.
    pub fn full_rect(&self) -> Rect {
        Rect {
            start_x: 0,
            start_y: 0,
            end_x: self.width,
            end_y: self.height,
        }
    }
}

impl fmt::Display for ImageDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.format)
    }
}

/// Rectangular access window with exclusive end coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
}

impl Rect {
    pub fn new(start_x: u32, start_y: u32, end_x: u32, end_y: u32) -> Self {
        Self { start_x, start_y, end_x, end_y }
    }

    pub fn width(&self) -> u32 {
        self.end_x.saturating_sub(self.start_x)
    }

    pub fn height(&self) -> u32 {
        self.end_y.saturating_sub(self.start_y)
    }

    /// Whether this window lies fully inside an image of the given shape.
    pub fn fits(&self, desc: &ImageDesc) -> bool {
        self.start_x <= self.end_x
            && self.start_y <= self.end_y
            && self.end_x <= desc.width
            && self.end_y <= desc.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_len_accounts_for_format() {
        let gray = ImageDesc::new(64, 32, PixelFormat::Gray8);
        let rgb = ImageDesc::new(64, 32, PixelFormat::Rgb8);
        assert_eq!(gray.byte_len(), 64 * 32);
        assert_eq!(rgb.byte_len(), 64 * 32 * 3);
    }

    #[test]
    fn full_rect_fits_its_own_desc() {
        let desc = ImageDesc::new(17, 9, PixelFormat::Rgba8);
        assert!(desc.full_rect().fits(&desc));
    }

    #[test]
    fn out_of_bounds_rect_does_not_fit() {
        let desc = ImageDesc::new(16, 16, PixelFormat::Gray8);
        let rect = Rect::new(8, 8, 24, 16);
        assert!(!rect.fits(&desc));
    }
}
