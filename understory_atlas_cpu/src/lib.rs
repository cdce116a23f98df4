// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_atlas_cpu --heading-base-level=0

//! CPU rasterizing backend for Understory Atlas.
//!
//! This crate implements [`BlitBackend`] with plain RGBA8 pixel buffers, so
//! atlas compositions can be rendered and inspected without a GPU. It is
//! small and unoptimized; it is intended for tests, tooling, and headless
//! export.
//!
//! - Textures are decoded to premultiplied floats on upload.
//! - Materials choose nearest (`ImageQuality::Low`) or bilinear sampling,
//!   the extend mode per axis, and a
//!   [`MaterialBlend`](understory_atlas::MaterialBlend).
//! - Surfaces (and the display) are [`PixelSurface`]s with straight alpha.

mod raster;
mod sample;
mod surface;

use kurbo::{Affine, Rect, Size};
use peniko::Color;
use understory_atlas::{
    AtlasResources, BlitBackend, MaterialDesc, MaterialId, RenderTarget, SurfaceId, TextureDesc,
    TextureId, TexturedQuad,
};

use crate::raster::{QuadShader, fill_quad};
use crate::sample::Texture;
pub use crate::surface::PixelSurface;

#[derive(Clone, Debug)]
struct Material {
    desc: MaterialDesc,
    texture: Option<TextureId>,
}

/// CPU implementation of the atlas blit backend.
#[derive(Debug)]
pub struct CpuBackend {
    display: PixelSurface,
    surfaces: Vec<Option<PixelSurface>>,
    textures: Vec<Option<Texture>>,
    materials: Vec<Option<Material>>,

    target: RenderTarget,
    viewport: Rect,
    projection: Affine,
    projection_stack: Vec<Affine>,
    active_material: Option<MaterialId>,
}

impl CpuBackend {
    /// Create a backend whose display is `width` by `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            display: PixelSurface::new(width, height),
            surfaces: Vec::new(),
            textures: Vec::new(),
            materials: Vec::new(),
            target: RenderTarget::Display,
            viewport: Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
            projection: Affine::IDENTITY,
            projection_stack: Vec::new(),
            active_material: None,
        }
    }

    /// The display buffer.
    pub fn display(&self) -> &PixelSurface {
        &self.display
    }

    /// An offscreen surface, if it exists.
    pub fn surface(&self, id: SurfaceId) -> Option<&PixelSurface> {
        self.surfaces.get(id.0 as usize)?.as_ref()
    }

    /// The buffer behind `target`, if it exists.
    pub fn target(&self, target: RenderTarget) -> Option<&PixelSurface> {
        match target {
            RenderTarget::Display => Some(&self.display),
            RenderTarget::Surface(id) => self.surface(id),
        }
    }

    /// The pixel at `(x, y)` of `target`, counted from the bottom-left corner.
    pub fn pixel(&self, target: RenderTarget, x: u32, y: u32) -> Option<[u8; 4]> {
        self.target(target)?.pixel(x, y)
    }

    fn bound_surface_mut(&mut self) -> Option<&mut PixelSurface> {
        match self.target {
            RenderTarget::Display => Some(&mut self.display),
            RenderTarget::Surface(id) => self.surfaces.get_mut(id.0 as usize)?.as_mut(),
        }
    }
}

fn dimensions(surface: &PixelSurface) -> Size {
    Size::new(f64::from(surface.width()), f64::from(surface.height()))
}

impl AtlasResources for CpuBackend {
    fn create_texture(&mut self, desc: TextureDesc, pixels: &[u8]) -> TextureId {
        let id = u32::try_from(self.textures.len())
            .expect("CpuBackend: too many textures for u32 TextureId");
        self.textures.push(Some(Texture::from_pixels(&desc, pixels)));
        TextureId(id)
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(slot) = self.textures.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    fn create_surface(&mut self, width: u32, height: u32) -> SurfaceId {
        let id = u32::try_from(self.surfaces.len())
            .expect("CpuBackend: too many surfaces for u32 SurfaceId");
        self.surfaces.push(Some(PixelSurface::new(width, height)));
        SurfaceId(id)
    }

    fn destroy_surface(&mut self, id: SurfaceId) {
        if let Some(slot) = self.surfaces.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    fn create_material(&mut self, desc: MaterialDesc) -> MaterialId {
        let id = u32::try_from(self.materials.len())
            .expect("CpuBackend: too many materials for u32 MaterialId");
        self.materials.push(Some(Material {
            desc,
            texture: None,
        }));
        MaterialId(id)
    }

    fn destroy_material(&mut self, id: MaterialId) {
        if let Some(slot) = self.materials.get_mut(id.0 as usize) {
            *slot = None;
        }
        if self.active_material == Some(id) {
            self.active_material = None;
        }
    }
}

impl BlitBackend for CpuBackend {
    fn display_size(&self) -> Size {
        dimensions(&self.display)
    }

    fn surface_size(&self, surface: SurfaceId) -> Option<Size> {
        self.surface(surface).map(dimensions)
    }

    fn bind_target(&mut self, target: RenderTarget) {
        self.target = target;
    }

    fn clear(&mut self, color: Color) {
        if let Some(surface) = self.bound_surface_mut() {
            surface.fill(color);
        }
    }

    fn push_projection(&mut self, projection: Affine) {
        self.projection_stack.push(self.projection);
        self.projection = projection;
    }

    fn pop_projection(&mut self) {
        self.projection = self.projection_stack.pop().unwrap_or(Affine::IDENTITY);
    }

    fn set_material_texture(&mut self, material: MaterialId, texture: Option<TextureId>) {
        if let Some(Some(slot)) = self.materials.get_mut(material.0 as usize) {
            slot.texture = texture;
        }
    }

    fn activate_material(&mut self, material: MaterialId, pass: u32) {
        if pass != 0 {
            log::debug!("CpuBackend: materials have a single pass; using pass 0 for {pass}");
        }
        self.active_material = Some(material);
    }

    fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    fn draw_quad(&mut self, quad: &TexturedQuad) {
        let Some(material_id) = self.active_material else {
            return;
        };
        let Some(Some(material)) = self.materials.get(material_id.0 as usize) else {
            return;
        };
        let Some(texture_id) = material.texture else {
            return;
        };
        let Some(Some(texture)) = self.textures.get(texture_id.0 as usize) else {
            return;
        };
        let surface = match self.target {
            RenderTarget::Display => Some(&mut self.display),
            RenderTarget::Surface(id) => self
                .surfaces
                .get_mut(id.0 as usize)
                .and_then(Option::as_mut),
        };
        let Some(surface) = surface else {
            return;
        };
        fill_quad(
            surface,
            self.viewport,
            self.projection,
            quad,
            &QuadShader {
                texture,
                sampler: &material.desc.sampler,
                blend: material.desc.blend,
            },
        );
    }
}
