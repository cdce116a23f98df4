// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::Color;
use understory_atlas::MaterialBlend;

use crate::sample::Premul;

/// An RGBA8 pixel buffer.
///
/// Pixels are stored with straight (non-premultiplied) alpha, one row after
/// another starting with the **top** row, the layout image encoders expect.
/// Coordinate-taking methods use bottom-left pixel space instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelSurface {
    /// Create a transparent black surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 rows, top row first.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The pixel at `(x, y)`, counted from the bottom-left corner.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let offset = self.offset(x, y)?;
        let px = &self.data[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Fill every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        let px = [rgba.r, rgba.g, rgba.b, rgba.a];
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = (self.height - 1 - y) as usize;
        Some((row * self.width as usize + x as usize) * 4)
    }

    /// Write a premultiplied sample at `(x, y)` (bottom-left origin).
    pub(crate) fn write(&mut self, x: u32, y: u32, src: Premul, blend: MaterialBlend) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let px = &mut self.data[offset..offset + 4];
        let out = match blend {
            MaterialBlend::Replace => src,
            MaterialBlend::SrcOver => {
                let dst = premultiply(px);
                let inv = 1.0 - src[3];
                [
                    src[0] + dst[0] * inv,
                    src[1] + dst[1] * inv,
                    src[2] + dst[2] * inv,
                    src[3] + dst[3] * inv,
                ]
            }
        };
        px.copy_from_slice(&unpremultiply(out));
    }
}

fn premultiply(px: &[u8]) -> Premul {
    let a = f32::from(px[3]) / 255.0;
    [
        f32::from(px[0]) / 255.0 * a,
        f32::from(px[1]) / 255.0 * a,
        f32::from(px[2]) / 255.0 * a,
        a,
    ]
}

fn unpremultiply(c: Premul) -> [u8; 4] {
    let a = c[3];
    if a.is_nan() || a <= 0.0 {
        return [0; 4];
    }
    [
        channel_to_u8(c[0] / a),
        channel_to_u8(c[1] / a),
        channel_to_u8(c[2] / a),
        channel_to_u8(a),
    ]
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "values are explicitly clamped to [0, 255] before casting"
)]
fn channel_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_is_transparent() {
        let surface = PixelSurface::new(3, 2);
        assert_eq!(surface.data().len(), 3 * 2 * 4);
        assert!(surface.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn pixel_addresses_from_bottom_left() {
        let mut surface = PixelSurface::new(2, 2);
        surface.write(0, 0, [1.0, 0.0, 0.0, 1.0], MaterialBlend::Replace);

        assert_eq!(surface.pixel(0, 0), Some([255, 0, 0, 255]));
        // Bottom-left pixel is the first pixel of the last stored row.
        assert_eq!(&surface.data()[8..12], &[255, 0, 0, 255]);
        assert_eq!(surface.pixel(2, 0), None);
        assert_eq!(surface.pixel(0, 2), None);
    }

    #[test]
    fn replace_writes_alpha_through() {
        let mut surface = PixelSurface::new(1, 1);
        surface.fill(Color::from_rgba8(10, 20, 30, 255));
        surface.write(0, 0, [0.0; 4], MaterialBlend::Replace);
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn src_over_composites_half_alpha() {
        let mut surface = PixelSurface::new(1, 1);
        surface.fill(Color::from_rgba8(0, 0, 255, 255));
        surface.write(0, 0, [0.5, 0.0, 0.0, 0.5], MaterialBlend::SrcOver);
        assert_eq!(surface.pixel(0, 0), Some([128, 0, 128, 255]));
    }

    #[test]
    fn out_of_bounds_write_is_ignored() {
        let mut surface = PixelSurface::new(1, 1);
        surface.write(5, 5, [1.0; 4], MaterialBlend::Replace);
        assert_eq!(surface.pixel(0, 0), Some([0; 4]));
    }
}
