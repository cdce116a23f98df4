// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single textured-quad blit.

use kurbo::Point;

use crate::backend::{BlitBackend, MaterialId, TextureId, TexturedQuad};
use crate::geometry::AtlasRect;

/// Material pass used for every blit.
pub const BLIT_PASS: u32 = 0;

/// Draw `texture` into `viewport` of the bound target.
///
/// The texture is bound into `material`'s texture slot and the material's
/// first pass is activated. Rasterization is restricted to `viewport` (pixel
/// space, bottom-left origin) and one unit quad is emitted whose vertex `i`
/// samples `uv_corners[i]`. The viewport does the placement; the vertex
/// positions never change.
///
/// Nothing is validated: a missing texture or material, or a degenerate
/// viewport, simply produces no visible output.
pub fn draw_rect<B: BlitBackend + ?Sized>(
    backend: &mut B,
    material: MaterialId,
    texture: Option<TextureId>,
    viewport: AtlasRect,
    uv_corners: [Point; 4],
) {
    backend.set_material_texture(material, texture);
    backend.activate_material(material, BLIT_PASS);
    backend.set_viewport(viewport.to_kurbo());
    backend.draw_quad(&TexturedQuad::unit(uv_corners));
}
