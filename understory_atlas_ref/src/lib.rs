// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_atlas_ref --heading-base-level=0

//! Understory Atlas Reference Backend.
//!
//! This crate provides a small, stateful implementation of
//! [`BlitBackend`] and [`AtlasResources`]
//! for **call recording and state tracing**.
//!
//! It does **not** rasterize to pixels. It is intended for tests and
//! debugging that want to assert on the calls a compositor makes and the
//! backend state at the time each call is applied.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Affine, Rect, Size};
use peniko::Color;
use understory_atlas::{
    AtlasResources, BlitBackend, MaterialDesc, MaterialId, RenderTarget, SurfaceId, TextureDesc,
    TextureId, TexturedQuad,
};

/// A state-changing backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum StateOp {
    /// [`BlitBackend::bind_target`].
    BindTarget(RenderTarget),
    /// [`BlitBackend::clear`].
    Clear(Color),
    /// [`BlitBackend::push_projection`].
    PushProjection(Affine),
    /// [`BlitBackend::pop_projection`].
    PopProjection,
    /// [`BlitBackend::set_material_texture`].
    SetMaterialTexture {
        /// Material whose slot was written.
        material: MaterialId,
        /// Texture bound into the slot.
        texture: Option<TextureId>,
    },
    /// [`BlitBackend::activate_material`].
    ActivateMaterial {
        /// Material made active.
        material: MaterialId,
        /// Pass made active.
        pass: u32,
    },
    /// [`BlitBackend::set_viewport`].
    SetViewport(Rect),
}

/// Snapshot of the current backend state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    /// Currently bound render target.
    pub target: RenderTarget,
    /// Current projection.
    pub projection: Affine,
    /// Number of saved projections.
    pub projection_depth: u32,
    /// Active material and pass, if any.
    pub material: Option<(MaterialId, u32)>,
    /// Texture in the active material's slot.
    pub texture: Option<TextureId>,
    /// Current viewport, if one has been set.
    pub viewport: Option<Rect>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            target: RenderTarget::Display,
            projection: Affine::IDENTITY,
            projection_depth: 0,
            material: None,
            texture: None,
            viewport: None,
        }
    }
}

/// Event recorded by the reference backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// State operation and the resulting state snapshot.
    State {
        /// State operation that was applied.
        op: StateOp,
        /// Snapshot after applying the state operation.
        state: StateSnapshot,
    },
    /// Drawn quad and the state snapshot used for drawing.
    Draw {
        /// Quad that was drawn.
        quad: TexturedQuad,
        /// Snapshot at the time of drawing.
        state: StateSnapshot,
    },
}

/// Simple reference implementation of the blit backend.
///
/// This backend:
/// - Stores resource descriptors in vectors keyed by their IDs,
/// - Tracks the bound target, viewport, projection stack and material slots,
/// - Records [`Event`]s as state and draw calls are applied.
#[derive(Default, Debug)]
pub struct RefBackend {
    display: Size,
    textures: Vec<Option<(TextureDesc, Vec<u8>)>>,
    surfaces: Vec<Option<Size>>,
    materials: Vec<Option<(MaterialDesc, Option<TextureId>)>>,

    /// Log of events in the order they were applied.
    events: Vec<Event>,
    /// Current state.
    state: StateSnapshot,
    projection_stack: Vec<Affine>,
}

impl RefBackend {
    /// Create a backend whose display is `width` by `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            display: Size::new(f64::from(width), f64::from(height)),
            ..Self::default()
        }
    }

    /// Returns a slice of recorded events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the quads drawn so far, with the state each was drawn under.
    pub fn quads(&self) -> impl Iterator<Item = (&TexturedQuad, &StateSnapshot)> + '_ {
        self.events.iter().filter_map(|event| match event {
            Event::Draw { quad, state } => Some((quad, state)),
            Event::State { .. } => None,
        })
    }

    /// Returns the current state.
    pub fn state(&self) -> &StateSnapshot {
        &self.state
    }

    /// Returns the descriptor of a live texture.
    pub fn texture_desc(&self, id: TextureId) -> Option<&TextureDesc> {
        self.textures
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .map(|(desc, _)| desc)
    }

    /// Returns the descriptor of a live material.
    pub fn material_desc(&self, id: MaterialId) -> Option<&MaterialDesc> {
        self.materials
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .map(|(desc, _)| desc)
    }

    /// Clears all recorded events but keeps resources and state.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn material_texture(&self, id: MaterialId) -> Option<TextureId> {
        self.materials
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .and_then(|(_, texture)| *texture)
    }

    fn refresh_texture(&mut self) {
        self.state.texture = self
            .state
            .material
            .and_then(|(id, _)| self.material_texture(id));
    }

    fn record_state(&mut self, op: StateOp) {
        self.events.push(Event::State {
            op,
            state: self.state.clone(),
        });
    }
}

impl AtlasResources for RefBackend {
    fn create_texture(&mut self, desc: TextureDesc, pixels: &[u8]) -> TextureId {
        let id = u32::try_from(self.textures.len())
            .expect("RefBackend: too many textures for u32 TextureId");
        self.textures.push(Some((desc, pixels.to_vec())));
        TextureId(id)
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(slot) = self.textures.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    fn create_surface(&mut self, width: u32, height: u32) -> SurfaceId {
        let id = u32::try_from(self.surfaces.len())
            .expect("RefBackend: too many surfaces for u32 SurfaceId");
        self.surfaces
            .push(Some(Size::new(f64::from(width), f64::from(height))));
        SurfaceId(id)
    }

    fn destroy_surface(&mut self, id: SurfaceId) {
        if let Some(slot) = self.surfaces.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    fn create_material(&mut self, desc: MaterialDesc) -> MaterialId {
        let id = u32::try_from(self.materials.len())
            .expect("RefBackend: too many materials for u32 MaterialId");
        self.materials.push(Some((desc, None)));
        MaterialId(id)
    }

    fn destroy_material(&mut self, id: MaterialId) {
        if let Some(slot) = self.materials.get_mut(id.0 as usize) {
            *slot = None;
        }
        if self.state.material.is_some_and(|(active, _)| active == id) {
            self.state.material = None;
            self.state.texture = None;
        }
    }
}

impl BlitBackend for RefBackend {
    fn display_size(&self) -> Size {
        self.display
    }

    fn surface_size(&self, surface: SurfaceId) -> Option<Size> {
        self.surfaces.get(surface.0 as usize).copied().flatten()
    }

    fn bind_target(&mut self, target: RenderTarget) {
        self.state.target = target;
        self.record_state(StateOp::BindTarget(target));
    }

    fn clear(&mut self, color: Color) {
        self.record_state(StateOp::Clear(color));
    }

    fn push_projection(&mut self, projection: Affine) {
        self.projection_stack.push(self.state.projection);
        self.state.projection = projection;
        self.state.projection_depth = u32::try_from(self.projection_stack.len())
            .expect("RefBackend: too many projection stack entries for u32");
        self.record_state(StateOp::PushProjection(projection));
    }

    fn pop_projection(&mut self) {
        self.state.projection = self.projection_stack.pop().unwrap_or(Affine::IDENTITY);
        self.state.projection_depth = u32::try_from(self.projection_stack.len())
            .expect("RefBackend: too many projection stack entries for u32");
        self.record_state(StateOp::PopProjection);
    }

    fn set_material_texture(&mut self, material: MaterialId, texture: Option<TextureId>) {
        if let Some(Some((_, slot))) = self.materials.get_mut(material.0 as usize) {
            *slot = texture;
        }
        self.refresh_texture();
        self.record_state(StateOp::SetMaterialTexture { material, texture });
    }

    fn activate_material(&mut self, material: MaterialId, pass: u32) {
        self.state.material = Some((material, pass));
        self.refresh_texture();
        self.record_state(StateOp::ActivateMaterial { material, pass });
    }

    fn set_viewport(&mut self, viewport: Rect) {
        self.state.viewport = Some(viewport);
        self.record_state(StateOp::SetViewport(viewport));
    }

    fn draw_quad(&mut self, quad: &TexturedQuad) {
        self.events.push(Event::Draw {
            quad: *quad,
            state: self.state.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_atlas::{BlitBackendExt, UNIT_QUAD_CORNERS};

    #[test]
    fn state_and_draw_are_recorded_in_order() {
        let mut backend = RefBackend::new(8, 8);
        let material = backend.create_material(MaterialDesc::default());

        backend.activate_material(material, 0);
        backend.draw_quad(&TexturedQuad::unit(UNIT_QUAD_CORNERS));

        assert_eq!(backend.events().len(), 2);
        assert!(matches!(backend.events()[1], Event::Draw { .. }));
    }

    #[test]
    fn material_slot_follows_rebinding() {
        let mut backend = RefBackend::new(8, 8);
        let texture = backend.create_texture(TextureDesc::rgba8(1, 1), &[0, 0, 0, 0]);
        let material = backend.create_material(MaterialDesc::default());

        backend.activate_material(material, 0);
        assert_eq!(backend.state().texture, None);

        backend.set_material_texture(material, Some(texture));
        assert_eq!(backend.state().texture, Some(texture));

        backend.set_material_texture(material, None);
        assert_eq!(backend.state().texture, None);
    }

    #[test]
    fn projection_scope_restores_on_drop() {
        let mut backend = RefBackend::new(8, 8);
        backend.push_projection(Affine::scale(2.0));

        {
            let scope = backend.projection_scope(Affine::IDENTITY);
            assert_eq!(scope.state().projection_depth, 2);
        }

        assert_eq!(backend.state().projection, Affine::scale(2.0));
        assert_eq!(backend.state().projection_depth, 1);
    }

    #[test]
    fn with_projection_pops_after_closure() {
        let mut backend = RefBackend::new(8, 8);
        let depth = backend.with_projection(Affine::translate((1.0, 0.0)), |b| {
            b.state().projection_depth
        });
        assert_eq!(depth, 1);
        assert_eq!(backend.state().projection_depth, 0);
        assert_eq!(backend.state().projection, Affine::IDENTITY);
    }

    #[test]
    fn unbalanced_pop_is_tolerated() {
        let mut backend = RefBackend::new(8, 8);
        backend.pop_projection();
        assert_eq!(backend.state().projection_depth, 0);
        assert_eq!(backend.state().projection, Affine::IDENTITY);
    }

    #[test]
    fn surface_sizes_and_destroy_are_tolerant() {
        let mut backend = RefBackend::new(640, 480);
        let surface = backend.create_surface(32, 16);
        assert_eq!(backend.surface_size(surface), Some(Size::new(32.0, 16.0)));
        assert_eq!(
            backend.target_size(RenderTarget::Surface(surface)),
            Size::new(32.0, 16.0)
        );

        backend.destroy_surface(surface);
        backend.destroy_surface(surface);
        assert_eq!(backend.surface_size(surface), None);
        assert_eq!(
            backend.target_size(RenderTarget::Surface(surface)),
            Size::new(640.0, 480.0)
        );

        let texture = backend.create_texture(TextureDesc::rgba8(1, 1), &[0, 0, 0, 0]);
        let material = backend.create_material(MaterialDesc::default());
        backend.destroy_texture(texture);
        backend.destroy_material(material);
        backend.destroy_texture(texture);
        backend.destroy_material(material);
        assert!(backend.texture_desc(texture).is_none());
        assert!(backend.material_desc(material).is_none());
    }

    #[test]
    fn clear_events_keeps_state() {
        let mut backend = RefBackend::new(8, 8);
        let surface = backend.create_surface(4, 4);
        backend.bind_target(RenderTarget::Surface(surface));
        backend.clear_events();

        assert!(backend.events().is_empty());
        assert_eq!(backend.state().target, RenderTarget::Surface(surface));
    }
}
