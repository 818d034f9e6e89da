//! Captured frame data structures

use bytes::Bytes;
use std::time::Instant;

/// Pixel format of the captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// BGRA 8-bit per channel
    Bgra8,
    /// RGBA 8-bit per channel
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        4
    }
}

/// Frame written into a capture surface
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Raw pixel data
    pub data: Bytes,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Stride (bytes per row, may include padding)
    pub stride: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Capture timestamp
    pub timestamp: Instant,
    /// Frame sequence number
    pub sequence: u64,
}

impl CapturedFrame {
    /// Build a tightly packed frame, `data` must hold `width * height` pixels
    pub fn packed(
        data: Bytes,
        width: u32,
        height: u32,
        format: PixelFormat,
        sequence: u64,
    ) -> Self {
        Self {
            data,
            width,
            height,
            stride: width * format.bytes_per_pixel() as u32,
            format,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Whether the buffer is large enough for the declared geometry
    pub fn is_well_formed(&self) -> bool {
        let min_stride = self.width as usize * self.format.bytes_per_pixel();
        let stride = self.stride as usize;
        if stride < min_stride || self.height == 0 {
            return false;
        }
        let needed = stride * (self.height as usize - 1) + min_stride;
        self.data.len() >= needed
    }

    /// (r, g, b) of the pixel at (x, y)
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let offset = y as usize * self.stride as usize + x as usize * 4;
        let px = &self.data[offset..offset + 4];
        match self.format {
            PixelFormat::Bgra8 => (px[2], px[1], px[0]),
            PixelFormat::Rgba8 => (px[0], px[1], px[2]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_frame_geometry() {
        let data = Bytes::from(vec![0u8; 4 * 4 * 2]);
        let frame = CapturedFrame::packed(data, 4, 2, PixelFormat::Rgba8, 0);
        assert_eq!(frame.stride, 16);
        assert!(frame.is_well_formed());
    }

    #[test]
    fn test_short_buffer_rejected() {
        let frame = CapturedFrame::packed(Bytes::from(vec![0u8; 10]), 4, 2, PixelFormat::Rgba8, 0);
        assert!(!frame.is_well_formed());
    }

    #[test]
    fn test_channel_order() {
        let data = Bytes::from(vec![10u8, 20, 30, 255]);
        let bgra = CapturedFrame::packed(data.clone(), 1, 1, PixelFormat::Bgra8, 0);
        let rgba = CapturedFrame::packed(data, 1, 1, PixelFormat::Rgba8, 0);
        assert_eq!(bgra.rgb_at(0, 0), (30, 20, 10));
        assert_eq!(rgba.rgb_at(0, 0), (10, 20, 30));
    }
}
