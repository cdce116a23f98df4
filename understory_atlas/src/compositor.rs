// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame composition: clear the output and blit every configured rect pair.

use alloc::vec::Vec;

use kurbo::{Affine, Size};
use peniko::Color;

use crate::backend::{BlitBackend, BlitBackendExt, RenderTarget, SurfaceId};
use crate::blit::draw_rect;
use crate::config::{AtlasConfig, FrameDiagnostic, RenderMode};
use crate::geometry::{
    AtlasRect, UNIT_QUAD_CORNERS, normalized_rect_to_pixel_rect, rect_to_corner_points,
};

/// Projection under which the unit quad covers the current viewport exactly.
pub const UNIT_ORTHO: Affine = Affine::IDENTITY;

/// Color the output is cleared to before drawing.
pub const CLEAR_COLOR: Color = Color::TRANSPARENT;

/// What happened while rendering one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Target that was drawn into.
    pub target: RenderTarget,
    /// Mode the frame was actually drawn in.
    pub effective_mode: RenderMode,
    /// Pixel size the UV-space destination rects were scaled by.
    pub destination_scale: Size,
    /// Number of quads handed to the backend.
    pub quads_drawn: usize,
    /// Recoverable problems, in the order they were noticed.
    pub diagnostics: Vec<FrameDiagnostic>,
}

/// Render one frame of `config` into `output`, or into the display if
/// `output` is `None` or does not name a live surface.
///
/// The target is cleared to transparent black, then:
/// - in [`RenderMode::Default`] the whole texture is stretched over the
///   whole target;
/// - in [`RenderMode::Arranged`] each `src_rects[i]` region of the texture is
///   drawn into the `dest_rects[i]` region of the target, in list order, so
///   later pairs cover earlier ones where they overlap.
///
/// Mismatched list lengths degrade this frame to `Default` and are reported
/// in [`FrameReport::diagnostics`] and as a warning log line. The projection
/// active before the call is restored on every exit path. Without a material
/// the target is cleared and nothing is drawn.
pub fn render_frame<B: BlitBackend + ?Sized>(
    backend: &mut B,
    config: &AtlasConfig,
    output: Option<SurfaceId>,
) -> FrameReport {
    let target = match output {
        Some(id) if backend.surface_size(id).is_some() => RenderTarget::Surface(id),
        Some(id) => {
            log::debug!("surface {id:?} does not exist; rendering to the display");
            RenderTarget::Display
        }
        None => RenderTarget::Display,
    };
    let destination_scale = backend.target_size(target);

    let mut diagnostics = Vec::new();
    let (effective_mode, diagnostic) = config.resolve_mode();
    if let Some(diagnostic) = diagnostic {
        log::warn!("{diagnostic}");
        diagnostics.push(diagnostic);
    }

    backend.bind_target(target);
    backend.clear(CLEAR_COLOR);

    let Some(material) = config.material else {
        log::debug!("no draw material configured; frame left clear");
        return FrameReport {
            target,
            effective_mode,
            destination_scale,
            quads_drawn: 0,
            diagnostics,
        };
    };

    let mut scope = backend.projection_scope(UNIT_ORTHO);
    let quads_drawn = match effective_mode {
        RenderMode::Default => {
            let full = AtlasRect::from_size(destination_scale.width, destination_scale.height);
            draw_rect(&mut *scope, material, config.texture, full, UNIT_QUAD_CORNERS);
            1
        }
        RenderMode::Arranged => {
            for (dest, src) in config.pairs() {
                let viewport = normalized_rect_to_pixel_rect(
                    dest,
                    destination_scale.width,
                    destination_scale.height,
                );
                draw_rect(
                    &mut *scope,
                    material,
                    config.texture,
                    viewport,
                    rect_to_corner_points(src),
                );
            }
            config.dest_rects.len()
        }
    };
    drop(scope);

    log::trace!(
        "rendered {quads_drawn} quad(s) in {effective_mode:?} mode at {}x{}",
        destination_scale.width,
        destination_scale.height
    );

    FrameReport {
        target,
        effective_mode,
        destination_scale,
        quads_drawn,
        diagnostics,
    }
}

/// Adapter that owns a configuration and renders it on request.
///
/// Hosts call [`render`](Self::render) from their per-frame hook instead of
/// relying on an implicit callback contract.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AtlasComponent {
    /// Configuration read on every frame.
    pub config: AtlasConfig,
    /// Surface to render into; `None` renders to the display.
    pub output: Option<SurfaceId>,
}

impl AtlasComponent {
    /// Create a component rendering `config` into `output`.
    pub fn new(config: AtlasConfig, output: Option<SurfaceId>) -> Self {
        Self { config, output }
    }

    /// Render one frame.
    pub fn render<B: BlitBackend + ?Sized>(&self, backend: &mut B) -> FrameReport {
        render_frame(backend, &self.config, self.output)
    }
}
