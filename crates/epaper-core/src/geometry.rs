// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel-space geometry used by crop gestures and overlay rendering.

use serde::{Deserialize, Serialize};

/// Width and height of an image in pixels.
///
/// Natural sizes come from integer raster dimensions; rendered sizes may be
/// fractional (layout pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self {
            width: f64::from(width),
            height: f64::from(height),
        }
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pull the point inside `0..size`. A NaN coordinate lands on 0.
    pub fn clamp_to(&self, size: ImageSize) -> Self {
        Self {
            x: bound(self.x, 0.0, size.width),
            y: bound(self.y, 0.0, size.height),
        }
    }
}

/// `value` limited to `lo..=hi`. Unlike `f64::clamp` this never panics: NaN
/// maps to `lo` and an inverted range yields `hi`.
fn bound(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// An axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Top-left corner X coordinate
    pub x: f64,
    /// Top-left corner Y coordinate
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two drag points, in either order.
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Rectangle covering `ratio` of each dimension, centered in `size`.
    ///
    /// This is the automatic crop box offered when a crop gesture opens.
    pub fn centered(size: ImageSize, ratio: f64) -> Self {
        let ratio = bound(ratio, 0.0, 1.0);
        let width = size.width * ratio;
        let height = size.height * ratio;
        Self {
            x: (size.width - width) / 2.0,
            y: (size.height - height) / 2.0,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Zero width or zero height.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// No NaN or infinite coordinate.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Keep the rectangle inside `0..size`, shrinking it where it overhangs.
    ///
    /// NaN coordinates collapse onto the nearest valid edge.
    pub fn clamp_to(&self, size: ImageSize) -> Self {
        let x = bound(self.x, 0.0, size.width);
        let y = bound(self.y, 0.0, size.height);
        let right = bound(self.right(), x, size.width);
        let bottom = bound(self.bottom(), y, size.height);
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Move the rectangle back inside `0..size` without changing its size
    /// (unless it is larger than the image).
    pub fn shift_inside(&self, size: ImageSize) -> Self {
        let width = bound(self.width, 0.0, size.width);
        let height = bound(self.height, 0.0, size.height);
        Self {
            x: bound(self.x, 0.0, size.width - width),
            y: bound(self.y, 0.0, size.height - height),
            width,
            height,
        }
    }

    /// Integer pixel bounds `(x, y, width, height)` for cropping a raster of
    /// `size`, rounded outward to whole pixels and clipped to the raster.
    pub fn to_crop_bounds(&self, size: ImageSize) -> (u32, u32, u32, u32) {
        let clipped = self.clamp_to(size);
        let left = clipped.x.floor();
        let top = clipped.y.floor();
        let right = clipped.right().ceil().min(size.width);
        let bottom = clipped.bottom().ceil().min(size.height);
        (
            left as u32,
            top as u32,
            (right - left).max(0.0) as u32,
            (bottom - top).max(0.0) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes_drag_direction() {
        let rect = PixelRect::from_corners(PixelPoint::new(50.0, 80.0), PixelPoint::new(10.0, 20.0));
        assert_eq!(rect, PixelRect::new(10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn centered_box_uses_ratio() {
        let rect = PixelRect::centered(ImageSize::new(800.0, 1200.0), 0.5);
        assert_eq!(rect, PixelRect::new(200.0, 300.0, 400.0, 600.0));
    }

    #[test]
    fn clamp_shrinks_overhang() {
        let size = ImageSize::new(100.0, 100.0);
        let rect = PixelRect::new(-10.0, 90.0, 50.0, 30.0).clamp_to(size);
        assert_eq!(rect, PixelRect::new(0.0, 90.0, 40.0, 10.0));
    }

    #[test]
    fn shift_inside_keeps_size() {
        let size = ImageSize::new(100.0, 100.0);
        let rect = PixelRect::new(80.0, -5.0, 30.0, 20.0).shift_inside(size);
        assert_eq!(rect, PixelRect::new(70.0, 0.0, 30.0, 20.0));
    }

    #[test]
    fn crop_bounds_round_outward() {
        let size = ImageSize::new(100.0, 50.0);
        let bounds = PixelRect::new(10.4, 5.6, 20.2, 10.1).to_crop_bounds(size);
        assert_eq!(bounds, (10, 5, 21, 11));
    }

    #[test]
    fn crop_bounds_clip_to_raster() {
        let size = ImageSize::new(100.0, 50.0);
        let bounds = PixelRect::new(90.0, 40.0, 30.0, 30.0).to_crop_bounds(size);
        assert_eq!(bounds, (90, 40, 10, 10));
    }

    #[test]
    fn nan_rect_clamps_without_panicking() {
        let size = ImageSize::new(1000.0, 1000.0);
        let nan = PixelRect::new(f64::NAN, 0.0, 10.0, 10.0);
        assert!(!nan.is_finite());

        let clamped = nan.clamp_to(size);
        assert!(clamped.is_finite());
        assert_eq!(clamped, PixelRect::new(0.0, 0.0, 0.0, 10.0));

        let shifted = PixelRect::new(f64::NAN, f64::NAN, f64::NAN, 10.0).shift_inside(size);
        assert!(shifted.is_finite());

        let point = PixelPoint::new(f64::NAN, 2000.0).clamp_to(size);
        assert_eq!(point, PixelPoint::new(0.0, 1000.0));
    }

    #[test]
    fn zero_sized_image_is_not_usable() {
        assert!(!ImageSize::new(0.0, 100.0).is_usable());
        assert!(!ImageSize::new(f64::NAN, 100.0).is_usable());
        assert!(ImageSize::from_pixels(1, 1).is_usable());
    }
}
