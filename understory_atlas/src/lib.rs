// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_atlas --heading-base-level=0

//! Understory Atlas: rearrange rectangular pieces of a texture.
//!
//! Given one source texture and a list of (destination, source) rect pairs,
//! this crate composes an output surface in which every source region of the
//! texture is resampled into its destination region. A fallback mode draws
//! the whole texture stretched over the whole output.
//!
//! # Position in the stack
//!
//! - **Configuration** ([`AtlasConfig`]): texture and material handles, the
//!   [`RenderMode`], and the two parallel rect lists, all in UV space.
//! - **Composition** ([`render_frame`], [`AtlasComponent`]): clears the
//!   output and issues one blit per rect pair.
//! - **Backends**: implementations of [`BlitBackend`] that own textures,
//!   surfaces and materials and rasterize quads. See
//!   `understory_atlas_cpu` for a CPU rasterizer and `understory_atlas_ref`
//!   for a recording backend used in tests.
//!
//! # Coordinate conventions
//!
//! Both UV space and pixel space put the origin at the **bottom-left**.
//! Corners are always listed clockwise from bottom-left, matching
//! [`UNIT_QUAD_CORNERS`]. Rects are never clamped or validated: degenerate
//! input yields degenerate (possibly empty) output, never a panic.
//!
//! # Example
//!
//! ```ignore
//! use understory_atlas::*;
//!
//! let mut backend = MyBackend::new(256, 256);
//! let texture = backend.create_texture(TextureDesc::rgba8(64, 64), &pixels);
//! let material = backend.create_material(MaterialDesc::default());
//! let output = backend.create_surface(256, 256);
//!
//! let mut config = AtlasConfig::new()
//!     .with_texture(texture)
//!     .with_material(material)
//!     .with_mode(RenderMode::Arranged);
//! // Left half of the texture into the bottom-left quarter of the output,
//! // right half into the top-right quarter.
//! config.push_pair((0.0, 0.0, 0.5, 0.5), (0.0, 0.0, 0.5, 1.0));
//! config.push_pair((0.5, 0.5, 0.5, 0.5), (0.5, 0.0, 0.5, 1.0));
//!
//! let report = render_frame(&mut backend, &config, Some(output));
//! assert!(report.diagnostics.is_empty());
//! ```

#![no_std]

extern crate alloc;

mod backend;
mod blit;
mod compositor;
mod config;
mod geometry;

pub use backend::{
    AtlasResources, BlitBackend, BlitBackendExt, ImageAlphaType, ImageFormat, ImageSampler,
    MaterialBlend, MaterialDesc, MaterialId, ProjectionScope, RenderTarget, SurfaceId, TextureDesc,
    TextureId, TexturedQuad,
};
pub use blit::{BLIT_PASS, draw_rect};
pub use compositor::{AtlasComponent, CLEAR_COLOR, FrameReport, UNIT_ORTHO, render_frame};
pub use config::{AtlasConfig, FrameDiagnostic, RenderMode};
pub use geometry::{
    AtlasRect, UNIT_QUAD_CORNERS, normalized_rect_to_pixel_rect, rect_to_corner_points,
};
