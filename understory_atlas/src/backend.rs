// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resource handles and the backend traits the compositor draws through.

use core::ops::{Deref, DerefMut};

use kurbo::{Affine, Point, Size};
use peniko::Color;
pub use peniko::{ImageAlphaType, ImageFormat, ImageSampler};

use crate::geometry::UNIT_QUAD_CORNERS;

/// Identifier for a source texture.
///
/// Textures are owned by the backend and referenced by handle from
/// [`AtlasConfig`](crate::AtlasConfig); the config never owns pixel data.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureId(pub u32);

/// Identifier for an offscreen output surface.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceId(pub u32);

/// Identifier for a draw material.
///
/// A material carries the sampling and blending policy for every quad drawn
/// with it, plus a single texture slot that the blitter rebinds per draw.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialId(pub u32);

/// Where rasterization output goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The host's display (the default framebuffer).
    Display,
    /// An offscreen surface.
    Surface(SurfaceId),
}

impl From<Option<SurfaceId>> for RenderTarget {
    #[inline]
    fn from(surface: Option<SurfaceId>) -> Self {
        surface.map_or(Self::Display, Self::Surface)
    }
}

/// Description of a source texture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureDesc {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Pixel format of the data passed to [`AtlasResources::create_texture`].
    pub format: ImageFormat,
    /// How the alpha channel of the data is to be interpreted.
    pub alpha_type: ImageAlphaType,
}

impl TextureDesc {
    /// Straight-alpha RGBA8 texture of the given size.
    #[inline]
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: ImageFormat::Rgba8,
            alpha_type: ImageAlphaType::Alpha,
        }
    }
}

/// How a material writes sampled colors into the target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaterialBlend {
    /// Overwrite the destination with the sample, alpha included.
    #[default]
    Replace,
    /// Composite the sample over the destination.
    SrcOver,
}

/// Description of a draw material.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    /// Sampling policy: filter quality and extend (wrap) modes.
    ///
    /// [`peniko::ImageQuality::Low`] samples the nearest texel; `Medium` and
    /// `High` sample bilinearly.
    pub sampler: ImageSampler,
    /// Blend policy for every quad drawn with this material.
    pub blend: MaterialBlend,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            sampler: ImageSampler::default(),
            blend: MaterialBlend::Replace,
        }
    }
}

/// A textured quad ready for rasterization.
///
/// Positions are in the space set up by the current projection; the blitter
/// always emits the unit quad and relies on the viewport for placement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TexturedQuad {
    /// Vertex positions, clockwise from bottom-left.
    pub positions: [Point; 4],
    /// Texture coordinates paired with `positions` by index.
    pub uvs: [Point; 4],
    /// Vertex color shared by all four vertices.
    pub color: Color,
}

impl TexturedQuad {
    /// Vertex color emitted by the blitter: transparent black.
    pub const VERTEX_COLOR: Color = Color::TRANSPARENT;

    /// The unit quad with the given texture coordinates.
    #[inline]
    pub fn unit(uvs: [Point; 4]) -> Self {
        Self {
            positions: UNIT_QUAD_CORNERS,
            uvs,
            color: Self::VERTEX_COLOR,
        }
    }
}

/// Lifetime management for the resources a [`BlitBackend`] draws with.
pub trait AtlasResources {
    /// Create a texture from tightly packed, row-major pixel data.
    ///
    /// Rows are ordered top to bottom, as image files store them.
    fn create_texture(&mut self, desc: TextureDesc, pixels: &[u8]) -> TextureId;
    /// Destroy a previously created texture.
    fn destroy_texture(&mut self, id: TextureId);

    /// Create an offscreen surface. Its initial contents are transparent black.
    fn create_surface(&mut self, width: u32, height: u32) -> SurfaceId;
    /// Destroy a previously created surface.
    fn destroy_surface(&mut self, id: SurfaceId);

    /// Create a material.
    fn create_material(&mut self, desc: MaterialDesc) -> MaterialId;
    /// Destroy a previously created material.
    fn destroy_material(&mut self, id: MaterialId);
}

/// Immediate-mode drawing interface consumed by the blitter and compositor.
///
/// Implementations are the capability object for all mutable rendering state:
/// the bound target, the viewport, the projection stack and material texture
/// slots. Holding `&mut` to a backend is what makes the compositor the single
/// writer of that state for the duration of a frame.
///
/// Handles that do not name a live resource must be tolerated (ignored).
pub trait BlitBackend: AtlasResources {
    /// Size of the host display in pixels.
    fn display_size(&self) -> Size;

    /// Size of `surface` in pixels, or `None` if it does not exist.
    fn surface_size(&self, surface: SurfaceId) -> Option<Size>;

    /// Size of `target` in pixels.
    ///
    /// Unknown surfaces fall back to the display size.
    fn target_size(&self, target: RenderTarget) -> Size {
        match target {
            RenderTarget::Display => self.display_size(),
            RenderTarget::Surface(id) => self
                .surface_size(id)
                .unwrap_or_else(|| self.display_size()),
        }
    }

    /// Make `target` the destination of subsequent clears and draws.
    fn bind_target(&mut self, target: RenderTarget);

    /// Fill the whole bound target with `color`, ignoring the viewport.
    fn clear(&mut self, color: Color);

    /// Save the current projection and replace it with `projection`.
    ///
    /// Projections map vertex positions into normalized viewport space, where
    /// the unit square covers the viewport exactly.
    fn push_projection(&mut self, projection: Affine);

    /// Restore the projection saved by the matching [`push_projection`](Self::push_projection).
    fn pop_projection(&mut self);

    /// Bind `texture` into the texture slot of `material`.
    fn set_material_texture(&mut self, material: MaterialId, texture: Option<TextureId>);

    /// Make `pass` of `material` the active shading state for draws.
    fn activate_material(&mut self, material: MaterialId, pass: u32);

    /// Restrict rasterization to `viewport`, in bottom-left pixel space.
    fn set_viewport(&mut self, viewport: kurbo::Rect);

    /// Rasterize one quad with the active material into the current viewport.
    fn draw_quad(&mut self, quad: &TexturedQuad);
}

/// Saved projection that is restored when the scope is dropped.
///
/// Created by [`BlitBackendExt::projection_scope`]. Dereferences to the
/// backend, so drawing happens through the scope while it is alive.
#[derive(Debug)]
pub struct ProjectionScope<'a, B: BlitBackend + ?Sized> {
    backend: &'a mut B,
}

impl<B: BlitBackend + ?Sized> Deref for ProjectionScope<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        &*self.backend
    }
}

impl<B: BlitBackend + ?Sized> DerefMut for ProjectionScope<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut *self.backend
    }
}

impl<B: BlitBackend + ?Sized> Drop for ProjectionScope<'_, B> {
    fn drop(&mut self) {
        self.backend.pop_projection();
    }
}

/// Convenience helpers for all [`BlitBackend`] implementations.
pub trait BlitBackendExt: BlitBackend {
    /// Push `projection` and return a guard that pops it on drop.
    ///
    /// The pop also runs while unwinding, so no exit path leaks the
    /// projection into rendering that follows.
    #[inline]
    fn projection_scope(&mut self, projection: Affine) -> ProjectionScope<'_, Self> {
        self.push_projection(projection);
        ProjectionScope { backend: self }
    }

    /// Run `f` with `projection` pushed, popping it afterwards.
    #[inline]
    fn with_projection<R>(&mut self, projection: Affine, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut scope = self.projection_scope(projection);
        f(&mut *scope)
    }
}

impl<B: BlitBackend + ?Sized> BlitBackendExt for B {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_quad_uses_transparent_black() {
        let quad = TexturedQuad::unit(UNIT_QUAD_CORNERS);
        assert_eq!(quad.positions, UNIT_QUAD_CORNERS);
        let c = quad.color.to_rgba8();
        assert_eq!((c.r, c.g, c.b, c.a), (0, 0, 0, 0));
    }

    #[test]
    fn missing_surface_targets_display() {
        assert_eq!(RenderTarget::from(None), RenderTarget::Display);
        assert_eq!(
            RenderTarget::from(Some(SurfaceId(3))),
            RenderTarget::Surface(SurfaceId(3))
        );
    }

    #[test]
    fn default_material_replaces() {
        let desc = MaterialDesc::default();
        assert_eq!(desc.blend, MaterialBlend::Replace);
        assert_eq!(desc.sampler, ImageSampler::default());
    }
}
