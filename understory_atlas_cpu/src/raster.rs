// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quad rasterization.

use kurbo::{Affine, Point, Rect};
use peniko::ImageSampler;
use understory_atlas::{MaterialBlend, TexturedQuad};

use crate::sample::Texture;
use crate::surface::PixelSurface;

/// Everything needed to shade a quad.
pub(crate) struct QuadShader<'a> {
    pub(crate) texture: &'a Texture,
    pub(crate) sampler: &'a ImageSampler,
    pub(crate) blend: MaterialBlend,
}

/// Map normalized viewport space onto the pixels of `viewport`.
fn viewport_transform(viewport: Rect) -> Affine {
    Affine::translate((viewport.x0, viewport.y0))
        * Affine::scale_non_uniform(viewport.width(), viewport.height())
}

/// Rasterize `quad` into `surface`.
///
/// Vertex positions go through `projection` into normalized viewport space
/// and then onto `viewport`. Output is clipped to the viewport and to the
/// surface. Pixels are covered when their centre lies inside the quad
/// (left/bottom edges inclusive, right/top exclusive), and texture
/// coordinates are interpolated bilinearly from the four corners, which is
/// exact for the rectangular UV sets the blitter emits.
///
/// Quads are assumed axis-aligned after projection. Degenerate or non-finite
/// geometry draws nothing.
#[allow(
    clippy::cast_possible_truncation,
    reason = "pixel bounds are clamped to the surface before casting"
)]
pub(crate) fn fill_quad(
    surface: &mut PixelSurface,
    viewport: Rect,
    projection: Affine,
    quad: &TexturedQuad,
    shader: &QuadShader<'_>,
) {
    if !(viewport.width() > 0.0 && viewport.height() > 0.0) {
        return;
    }
    let to_pixels = viewport_transform(viewport) * projection;
    let det = to_pixels.determinant();
    if det == 0.0 || !det.is_finite() {
        return;
    }
    let to_local = to_pixels.inverse();

    let [p0, p1, _, p3] = quad.positions;
    let span_s = p3.x - p0.x;
    let span_t = p1.y - p0.y;
    if span_s == 0.0 || span_t == 0.0 || !span_s.is_finite() || !span_t.is_finite() {
        return;
    }

    let bounds = quad
        .positions
        .iter()
        .map(|p| to_pixels * *p)
        .fold(Rect::from_points(to_pixels * p0, to_pixels * p0), |r, p| {
            r.union_pt(p)
        });
    let clip = bounds
        .intersect(viewport)
        .intersect(Rect::new(
            0.0,
            0.0,
            f64::from(surface.width()),
            f64::from(surface.height()),
        ));
    if !(clip.x0.is_finite() && clip.y0.is_finite() && clip.x1.is_finite() && clip.y1.is_finite())
    {
        return;
    }

    let x_start = clip.x0.floor().max(0.0) as u32;
    let y_start = clip.y0.floor().max(0.0) as u32;
    let x_end = clip.x1.ceil().min(f64::from(surface.width())) as u32;
    let y_end = clip.y1.ceil().min(f64::from(surface.height())) as u32;

    for y in y_start..y_end {
        let cy = f64::from(y) + 0.5;
        if cy < clip.y0 || cy >= clip.y1 {
            continue;
        }
        for x in x_start..x_end {
            let cx = f64::from(x) + 0.5;
            if cx < clip.x0 || cx >= clip.x1 {
                continue;
            }
            let local = to_local * Point::new(cx, cy);
            let s = (local.x - p0.x) / span_s;
            let t = (local.y - p0.y) / span_t;
            if !((0.0..1.0).contains(&s) && (0.0..1.0).contains(&t)) {
                continue;
            }
            let uv = interpolate_uv(&quad.uvs, s, t);
            let sample = shader.texture.sample(uv.x, uv.y, shader.sampler);
            surface.write(x, y, sample, shader.blend);
        }
    }
}

/// Bilinear interpolation over corners ordered bottom-left, top-left,
/// top-right, bottom-right.
fn interpolate_uv(uvs: &[Point; 4], s: f64, t: f64) -> Point {
    let bottom = uvs[0].lerp(uvs[3], s);
    let top = uvs[1].lerp(uvs[2], s);
    bottom.lerp(top, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::ImageQuality;
    use understory_atlas::{TextureDesc, UNIT_QUAD_CORNERS};

    fn white() -> Texture {
        Texture::from_pixels(&TextureDesc::rgba8(1, 1), &[255; 4])
    }

    fn nearest() -> ImageSampler {
        ImageSampler {
            quality: ImageQuality::Low,
            ..ImageSampler::default()
        }
    }

    fn covered(surface: &PixelSurface) -> usize {
        surface
            .data()
            .chunks_exact(4)
            .filter(|px| px[3] != 0)
            .count()
    }

    #[test]
    fn uv_interpolation_hits_corners() {
        let uvs = [
            Point::new(0.1, 0.2),
            Point::new(0.1, 0.8),
            Point::new(0.6, 0.8),
            Point::new(0.6, 0.2),
        ];
        assert_eq!(interpolate_uv(&uvs, 0.0, 0.0), uvs[0]);
        assert_eq!(interpolate_uv(&uvs, 0.0, 1.0), uvs[1]);
        assert_eq!(interpolate_uv(&uvs, 1.0, 1.0), uvs[2]);
        assert_eq!(interpolate_uv(&uvs, 1.0, 0.0), uvs[3]);
    }

    #[test]
    fn fills_exactly_the_viewport() {
        let tex = white();
        let sampler = nearest();
        let shader = QuadShader {
            texture: &tex,
            sampler: &sampler,
            blend: MaterialBlend::Replace,
        };
        let mut surface = PixelSurface::new(8, 8);
        fill_quad(
            &mut surface,
            Rect::new(2.0, 1.0, 6.0, 4.0),
            Affine::IDENTITY,
            &TexturedQuad::unit(UNIT_QUAD_CORNERS),
            &shader,
        );

        assert_eq!(covered(&surface), 4 * 3);
        assert_eq!(surface.pixel(2, 1), Some([255; 4]));
        assert_eq!(surface.pixel(5, 3), Some([255; 4]));
        assert_eq!(surface.pixel(6, 3), Some([0; 4]));
        assert_eq!(surface.pixel(2, 4), Some([0; 4]));
    }

    #[test]
    fn viewport_outside_surface_is_clipped() {
        let tex = white();
        let sampler = nearest();
        let shader = QuadShader {
            texture: &tex,
            sampler: &sampler,
            blend: MaterialBlend::Replace,
        };
        let mut surface = PixelSurface::new(4, 4);
        fill_quad(
            &mut surface,
            Rect::new(-2.0, 2.0, 2.0, 10.0),
            Affine::IDENTITY,
            &TexturedQuad::unit(UNIT_QUAD_CORNERS),
            &shader,
        );
        assert_eq!(covered(&surface), 2 * 2);
    }

    #[test]
    fn projection_shrinks_quad_inside_viewport() {
        let tex = white();
        let sampler = nearest();
        let shader = QuadShader {
            texture: &tex,
            sampler: &sampler,
            blend: MaterialBlend::Replace,
        };
        let mut surface = PixelSurface::new(8, 8);
        fill_quad(
            &mut surface,
            Rect::new(0.0, 0.0, 8.0, 8.0),
            Affine::scale(0.5),
            &TexturedQuad::unit(UNIT_QUAD_CORNERS),
            &shader,
        );
        assert_eq!(covered(&surface), 16);
        assert_eq!(surface.pixel(3, 3), Some([255; 4]));
        assert_eq!(surface.pixel(4, 4), Some([0; 4]));
    }

    #[test]
    fn degenerate_viewports_draw_nothing() {
        let tex = white();
        let sampler = nearest();
        let shader = QuadShader {
            texture: &tex,
            sampler: &sampler,
            blend: MaterialBlend::Replace,
        };
        let quad = TexturedQuad::unit(UNIT_QUAD_CORNERS);
        let mut surface = PixelSurface::new(4, 4);
        for viewport in [
            Rect::new(1.0, 1.0, 1.0, 3.0),
            Rect::new(3.0, 0.0, 1.0, 4.0),
            Rect::new(f64::NAN, 0.0, 4.0, 4.0),
            Rect::new(0.0, 0.0, f64::INFINITY, 4.0),
        ] {
            fill_quad(&mut surface, viewport, Affine::IDENTITY, &quad, &shader);
        }
        fill_quad(
            &mut surface,
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Affine::scale(0.0),
            &quad,
            &shader,
        );
        assert_eq!(covered(&surface), 0);
    }
}
