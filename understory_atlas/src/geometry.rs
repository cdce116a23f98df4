// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangles and quad corner helpers.
//!
//! All coordinates in this module use a bottom-left origin. A rect is said to
//! be in *UV space* when its fields are normalized to the source or target
//! extent (conceptually `[0, 1]`), and in *pixel space* when they are absolute
//! pixel units of an output surface. Neither range is enforced.

use kurbo::Point;

/// Canonical corners of the unit quad, clockwise from bottom-left.
///
/// Every quad the blitter emits uses these as vertex positions; only the
/// texture coordinates change from one rect to the next.
pub const UNIT_QUAD_CORNERS: [Point; 4] = [
    Point::new(0.0, 0.0),
    Point::new(0.0, 1.0),
    Point::new(1.0, 1.0),
    Point::new(1.0, 0.0),
];

/// An axis-aligned rectangle stored as origin plus size.
///
/// The origin is the bottom-left corner. Negative sizes are representable and
/// are passed through untouched by the helpers in this crate.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtlasRect {
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl AtlasRect {
    /// The unit rect `(0, 0, 1, 1)`, covering a whole texture or surface in UV space.
    pub const UNIT: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Create a rect from its bottom-left corner and size.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rect covering `width` by `height` pixels from the origin.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (`x + width`).
    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge (`y + height`).
    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Returns `true` if the rect covers no area.
    ///
    /// Rects with a negative width or height count as empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Convert to kurbo's min/max rectangle.
    ///
    /// The result is not normalized; a negative width yields `x1 < x0`.
    #[inline]
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.max_x(), self.max_y())
    }

    /// Convert from kurbo's min/max rectangle.
    #[inline]
    pub fn from_kurbo(rect: kurbo::Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }
}

impl From<kurbo::Rect> for AtlasRect {
    #[inline]
    fn from(rect: kurbo::Rect) -> Self {
        Self::from_kurbo(rect)
    }
}

impl From<(f64, f64, f64, f64)> for AtlasRect {
    #[inline]
    fn from((x, y, width, height): (f64, f64, f64, f64)) -> Self {
        Self::new(x, y, width, height)
    }
}

/// Corners of `rect` in the same clockwise order as [`UNIT_QUAD_CORNERS`].
///
/// `[ (x, y), (x, y + h), (x + w, y + h), (x + w, y) ]`
#[inline]
pub fn rect_to_corner_points(rect: AtlasRect) -> [Point; 4] {
    [
        Point::new(rect.x, rect.y),
        Point::new(rect.x, rect.max_y()),
        Point::new(rect.max_x(), rect.max_y()),
        Point::new(rect.max_x(), rect.y),
    ]
}

/// Scale a UV-space rect to the pixel space of a `surface_width` by
/// `surface_height` surface.
///
/// No clamping or rounding is applied.
#[inline]
pub fn normalized_rect_to_pixel_rect(
    rect: AtlasRect,
    surface_width: f64,
    surface_height: f64,
) -> AtlasRect {
    AtlasRect::new(
        rect.x * surface_width,
        rect.y * surface_height,
        rect.width * surface_width,
        rect.height * surface_height,
    )
}
