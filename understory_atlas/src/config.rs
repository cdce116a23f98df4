// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance configuration and frame diagnostics.

use alloc::vec::Vec;
use core::fmt;

use crate::backend::{MaterialId, TextureId};
use crate::geometry::AtlasRect;

/// How a frame is composed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderMode {
    /// Stretch the whole texture over the whole output.
    #[default]
    Default,
    /// Draw each source rect of the texture into its paired destination rect.
    Arranged,
}

/// Recoverable condition noticed while preparing a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrameDiagnostic {
    /// Destination and source rect lists differ in length, so the frame was
    /// drawn in [`RenderMode::Default`] instead of [`RenderMode::Arranged`].
    RectCountMismatch {
        /// Number of destination (viewport) rects.
        dest: usize,
        /// Number of source (UV) rects.
        src: usize,
    },
}

impl fmt::Display for FrameDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RectCountMismatch { dest, src } => write!(
                f,
                "viewport rects length must equal uv rects length ({dest} != {src})"
            ),
        }
    }
}

impl core::error::Error for FrameDiagnostic {}

/// Configuration for one atlas-rearranging component.
///
/// The host edits this between frames; rendering only reads it. Texture and
/// material are handles into a backend, not owned resources.
///
/// `dest_rects[i]` and `src_rects[i]` form a pair: the UV-space region of the
/// output to fill and the UV-space region of the texture to fill it from.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AtlasConfig {
    /// Source texture.
    pub texture: Option<TextureId>,
    /// Material used for every draw; its texture slot is rebound per draw.
    pub material: Option<MaterialId>,
    /// Requested mode.
    pub mode: RenderMode,
    /// Destination rects in output UV space.
    pub dest_rects: Vec<AtlasRect>,
    /// Source rects in texture UV space.
    pub src_rects: Vec<AtlasRect>,
}

impl AtlasConfig {
    /// Create an empty configuration in [`RenderMode::Default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source texture.
    #[must_use]
    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Set the draw material.
    #[must_use]
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the requested mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append a destination/source pair, keeping both lists the same length.
    pub fn push_pair(&mut self, dest: impl Into<AtlasRect>, src: impl Into<AtlasRect>) {
        self.dest_rects.push(dest.into());
        self.src_rects.push(src.into());
    }

    /// Remove all rect pairs.
    pub fn clear_pairs(&mut self) {
        self.dest_rects.clear();
        self.src_rects.clear();
    }

    /// Iterate over `(dest, src)` pairs.
    ///
    /// Stops at the shorter list when the lengths differ.
    pub fn pairs(&self) -> impl Iterator<Item = (AtlasRect, AtlasRect)> + '_ {
        self.dest_rects
            .iter()
            .copied()
            .zip(self.src_rects.iter().copied())
    }

    /// Mode a frame rendered now would use.
    ///
    /// [`RenderMode::Arranged`] degrades to [`RenderMode::Default`] when the
    /// rect lists differ in length. The mismatch is reported whatever the
    /// requested mode, and the config itself is left untouched.
    pub fn resolve_mode(&self) -> (RenderMode, Option<FrameDiagnostic>) {
        let dest = self.dest_rects.len();
        let src = self.src_rects.len();
        if dest != src {
            return (
                RenderMode::Default,
                Some(FrameDiagnostic::RectCountMismatch { dest, src }),
            );
        }
        (self.mode, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn matched_lengths_keep_requested_mode() {
        let mut config = AtlasConfig::new().with_mode(RenderMode::Arranged);
        config.push_pair(AtlasRect::UNIT, AtlasRect::UNIT);
        assert_eq!(config.resolve_mode(), (RenderMode::Arranged, None));
    }

    #[test]
    fn mismatch_degrades_without_mutating() {
        let config = AtlasConfig {
            mode: RenderMode::Arranged,
            dest_rects: vec![AtlasRect::UNIT; 2],
            src_rects: vec![AtlasRect::UNIT; 3],
            ..AtlasConfig::default()
        };
        let (mode, diag) = config.resolve_mode();
        assert_eq!(mode, RenderMode::Default);
        assert_eq!(
            diag,
            Some(FrameDiagnostic::RectCountMismatch { dest: 2, src: 3 })
        );
        assert_eq!(config.mode, RenderMode::Arranged);
        assert_eq!(config.dest_rects.len(), 2);
    }

    #[test]
    fn empty_arranged_config_is_honored() {
        let config = AtlasConfig::new().with_mode(RenderMode::Arranged);
        assert_eq!(config.resolve_mode(), (RenderMode::Arranged, None));
    }

    #[test]
    fn pairs_zip_in_order() {
        let mut config = AtlasConfig::new();
        config.push_pair((0.0, 0.0, 0.5, 0.5), (0.5, 0.0, 0.5, 1.0));
        config.push_pair((0.5, 0.5, 0.5, 0.5), (0.0, 0.0, 0.5, 1.0));

        let pairs: Vec<_> = config.pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].0, AtlasRect::new(0.5, 0.5, 0.5, 0.5));
        assert_eq!(pairs[1].1, AtlasRect::new(0.0, 0.0, 0.5, 1.0));

        config.clear_pairs();
        assert_eq!(config.pairs().count(), 0);
    }

    #[test]
    fn diagnostic_message_names_both_lists() {
        let msg = FrameDiagnostic::RectCountMismatch { dest: 2, src: 3 }.to_string();
        assert!(msg.starts_with("viewport rects length must equal uv rects length"));
        assert!(msg.contains("2 != 3"));
    }
}
