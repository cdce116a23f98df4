// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture storage and filtered sampling.

use peniko::{Extend, ImageAlphaType, ImageFormat, ImageQuality, ImageSampler};
use understory_atlas::TextureDesc;

/// Premultiplied RGBA in `[0, 1]`.
pub(crate) type Premul = [f32; 4];

/// Source texture decoded into premultiplied floats, bottom row first.
#[derive(Clone, Debug)]
pub(crate) struct Texture {
    width: u32,
    height: u32,
    texels: Vec<Premul>,
}

impl Texture {
    /// Decode tightly packed, top-row-first pixel data.
    ///
    /// Missing trailing bytes read as transparent black so short uploads
    /// never fault.
    pub(crate) fn from_pixels(desc: &TextureDesc, pixels: &[u8]) -> Self {
        let width = desc.width as usize;
        let height = desc.height as usize;
        let mut texels = vec![[0.0; 4]; width * height];

        for row in 0..height {
            // Flip so that index 0 is the bottom row, matching UV space.
            let dst_row = height - 1 - row;
            for col in 0..width {
                let offset = (row * width + col) * 4;
                let Some(px) = pixels.get(offset..offset + 4) else {
                    continue;
                };
                let [c0, c1, c2, a] = [px[0], px[1], px[2], px[3]].map(|c| f32::from(c) / 255.0);
                let (r, g, b) = match desc.format {
                    ImageFormat::Bgra8 => (c2, c1, c0),
                    _ => (c0, c1, c2),
                };
                texels[dst_row * width + col] = match desc.alpha_type {
                    ImageAlphaType::Alpha => [r * a, g * a, b * a, a],
                    ImageAlphaType::AlphaPremultiplied => [r, g, b, a],
                };
            }
        }

        Self {
            width: desc.width,
            height: desc.height,
            texels,
        }
    }

    fn texel(&self, x: i64, y: i64, sampler: &ImageSampler) -> Premul {
        let x = extend_index(x, self.width, sampler.x_extend);
        let y = extend_index(y, self.height, sampler.y_extend);
        self.texels[y * self.width as usize + x]
    }

    /// Sample at UV coordinates `(u, v)`, origin bottom-left.
    ///
    /// Texel centres sit at half-integer texel coordinates. `ImageQuality::Low`
    /// picks the nearest texel; other qualities filter bilinearly.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "texel coordinates are floored and saturate on cast"
    )]
    pub(crate) fn sample(&self, u: f64, v: f64, sampler: &ImageSampler) -> Premul {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let tx = u * f64::from(self.width);
        let ty = v * f64::from(self.height);

        match sampler.quality {
            ImageQuality::Low => self.texel(tx.floor() as i64, ty.floor() as i64, sampler),
            ImageQuality::Medium | ImageQuality::High => {
                let fx = tx - 0.5;
                let fy = ty - 0.5;
                let x0 = fx.floor();
                let y0 = fy.floor();
                let wx = (fx - x0) as f32;
                let wy = (fy - y0) as f32;
                let (x0, y0) = (x0 as i64, y0 as i64);

                let bl = self.texel(x0, y0, sampler);
                let (x1, y1) = (x0.saturating_add(1), y0.saturating_add(1));
                let br = self.texel(x1, y0, sampler);
                let tl = self.texel(x0, y1, sampler);
                let tr = self.texel(x1, y1, sampler);

                let mut out = [0.0; 4];
                for (i, c) in out.iter_mut().enumerate() {
                    let bottom = bl[i] + (br[i] - bl[i]) * wx;
                    let top = tl[i] + (tr[i] - tl[i]) * wx;
                    *c = bottom + (top - bottom) * wy;
                }
                out
            }
        }
    }
}

/// Map a possibly out-of-range texel index into `0..len`.
#[allow(
    clippy::cast_possible_truncation,
    reason = "the result is always in 0..len, which fits in usize"
)]
fn extend_index(i: i64, len: u32, extend: Extend) -> usize {
    let n = i64::from(len);
    let mapped = match extend {
        Extend::Pad => i.clamp(0, n - 1),
        Extend::Repeat => i.rem_euclid(n),
        Extend::Reflect => {
            let m = i.rem_euclid(2 * n);
            if m >= n { 2 * n - 1 - m } else { m }
        }
    };
    mapped as usize
}
