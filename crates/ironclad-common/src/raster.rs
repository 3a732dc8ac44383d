//! Decoded RGBA rasters and the decode-service contract.

use crate::error::DecodeError;
use crate::rect::PixelRect;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Rgba {
    /// Creates an opaque color.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Returns the color as `[r, g, b, a]`.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A decoded `width` x `height` pixel buffer with alpha, row-major RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Bytes per pixel.
    pub const CHANNELS: usize = 4;

    /// Creates a fully transparent raster.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * Self::CHANNELS],
        }
    }

    /// Wraps an existing RGBA8 buffer.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DecodeError> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if pixels.len() != expected {
            return Err(DecodeError::Truncated {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Raster width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Reads one pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        let p = self.pixels.get(i..i + Self::CHANNELS)?;
        Some(Rgba {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        })
    }

    /// Fills a rectangle with a color, clipped to the raster bounds.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        let bytes = color.to_bytes();
        for row in y..y_end {
            let start = (row as usize * self.width as usize + x as usize) * Self::CHANNELS;
            let end = (row as usize * self.width as usize + x_end as usize) * Self::CHANNELS;
            if let Some(span) = self.pixels.get_mut(start..end) {
                for px in span.chunks_exact_mut(Self::CHANNELS) {
                    px.copy_from_slice(&bytes);
                }
            }
        }
    }

    /// Tight bounding box of all pixels with non-zero alpha.
    ///
    /// Returns an empty rectangle at the origin for fully transparent rasters.
    #[must_use]
    pub fn opaque_bounds(&self) -> PixelRect {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut any = false;

        for (i, px) in self.pixels.chunks_exact(Self::CHANNELS).enumerate() {
            if px[3] == 0 {
                continue;
            }
            let x = (i % self.width as usize) as u32;
            let y = (i / self.width as usize) as u32;
            any = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        if !any {
            return PixelRect::default();
        }
        PixelRect::new(
            min_x as i32,
            min_y as i32,
            (max_x - min_x + 1) as i32,
            (max_y - min_y + 1) as i32,
        )
    }
}

/// External decode service: turns a packed image buffer into a raster.
///
/// The packed format is owned by the implementor; the core only relies on
/// the result being a decoded raster with alpha.
pub trait RasterDecoder {
    /// Decodes `bytes` into a raster.
    fn decode(&self, bytes: &[u8]) -> Result<Raster, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_read() {
        let mut raster = Raster::new(8, 8);
        raster.fill_rect(2, 2, 3, 3, Rgba::opaque(1, 2, 3));
        assert_eq!(raster.pixel(2, 2), Some(Rgba::opaque(1, 2, 3)));
        assert_eq!(raster.pixel(4, 4), Some(Rgba::opaque(1, 2, 3)));
        assert_eq!(raster.pixel(5, 5).map(|p| p.a), Some(0));
        assert_eq!(raster.pixel(8, 0), None);
    }

    #[test]
    fn test_fill_is_clipped() {
        let mut raster = Raster::new(4, 4);
        raster.fill_rect(3, 3, 10, 10, Rgba::opaque(9, 9, 9));
        assert_eq!(raster.pixel(3, 3), Some(Rgba::opaque(9, 9, 9)));
    }

    #[test]
    fn test_opaque_bounds() {
        let mut raster = Raster::new(16, 16);
        assert!(raster.opaque_bounds().is_empty());
        raster.fill_rect(3, 5, 4, 2, Rgba::opaque(0, 0, 0));
        assert_eq!(raster.opaque_bounds(), PixelRect::new(3, 5, 4, 2));
    }

    #[test]
    fn test_from_rgba_length_check() {
        assert!(Raster::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            Raster::from_rgba(2, 2, vec![0; 15]),
            Err(DecodeError::Truncated {
                expected: 16,
                actual: 15
            })
        );
    }
}
