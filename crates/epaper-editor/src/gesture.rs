// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop gesture: the rectangle an editor drags out on the page before it is
// committed as a region. Everything here is in natural pixels and clamped to
// the image; normalization happens only at commit time.

use epaper_core::geometry::{ImageSize, PixelPoint, PixelRect};

/// Edge or corner grabbed by a resize drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }
}

/// An in-progress crop selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CropGesture {
    bounds: ImageSize,
    auto_ratio: f64,
    rect: PixelRect,
    anchor: Option<PixelPoint>,
}

impl CropGesture {
    /// Open a gesture on an image of `bounds`, seeded with the automatic
    /// centered box covering `auto_ratio` of each dimension.
    pub fn new(bounds: ImageSize, auto_ratio: f64) -> Self {
        Self {
            bounds,
            auto_ratio,
            rect: PixelRect::centered(bounds, auto_ratio),
            anchor: None,
        }
    }

    /// Current box in natural pixels.
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn bounds(&self) -> ImageSize {
        self.bounds
    }

    fn clamp_point(&self, point: PixelPoint) -> PixelPoint {
        point.clamp_to(self.bounds)
    }

    /// Start a free-form selection at `point`, discarding the current box.
    pub fn start_drag(&mut self, point: PixelPoint) {
        let point = self.clamp_point(point);
        self.anchor = Some(point);
        self.rect = PixelRect::from_corners(point, point);
    }

    /// Extend the free-form selection to `point`.
    ///
    /// Without a prior `start_drag` the drag is anchored at the current
    /// box's top-left corner.
    pub fn drag_to(&mut self, point: PixelPoint) {
        let anchor = *self
            .anchor
            .get_or_insert(PixelPoint::new(self.rect.x, self.rect.y));
        self.rect = PixelRect::from_corners(anchor, self.clamp_point(point));
    }

    /// Move the whole box, keeping its size and staying inside the image.
    /// A non-finite offset leaves the box where it is.
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.anchor = None;
        self.rect = self.rect.offset(dx, dy).shift_inside(self.bounds);
    }

    /// Drag `handle` to `point`. Crossing the opposite edge flips the box.
    pub fn resize(&mut self, handle: Handle, point: PixelPoint) {
        self.anchor = None;
        let point = self.clamp_point(point);
        let mut left = self.rect.x;
        let mut top = self.rect.y;
        let mut right = self.rect.right();
        let mut bottom = self.rect.bottom();
        if handle.moves_left() {
            left = point.x;
        }
        if handle.moves_right() {
            right = point.x;
        }
        if handle.moves_top() {
            top = point.y;
        }
        if handle.moves_bottom() {
            bottom = point.y;
        }
        self.rect = PixelRect::from_corners(
            PixelPoint::new(left, top),
            PixelPoint::new(right, bottom),
        );
    }

    /// Replace the box outright (e.g. typed coordinates).
    pub fn set_rect(&mut self, rect: PixelRect) {
        self.anchor = None;
        self.rect = rect.clamp_to(self.bounds);
    }

    /// Back to the automatic box.
    pub fn reset(&mut self) {
        self.anchor = None;
        self.rect = PixelRect::centered(self.bounds, self.auto_ratio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture() -> CropGesture {
        CropGesture::new(ImageSize::new(1000.0, 2000.0), 0.5)
    }

    #[test]
    fn opens_with_centered_half_box() {
        assert_eq!(gesture().rect(), PixelRect::new(250.0, 500.0, 500.0, 1000.0));
    }

    #[test]
    fn drag_builds_box_in_any_direction() {
        let mut g = gesture();
        g.start_drag(PixelPoint::new(400.0, 600.0));
        g.drag_to(PixelPoint::new(100.0, 200.0));
        assert_eq!(g.rect(), PixelRect::new(100.0, 200.0, 300.0, 400.0));
    }

    #[test]
    fn drag_is_clamped_to_image() {
        let mut g = gesture();
        g.start_drag(PixelPoint::new(900.0, 1900.0));
        g.drag_to(PixelPoint::new(1500.0, 2500.0));
        assert_eq!(g.rect(), PixelRect::new(900.0, 1900.0, 100.0, 100.0));
    }

    #[test]
    fn move_stops_at_the_edge() {
        let mut g = gesture();
        g.move_by(-400.0, 0.0);
        assert_eq!(g.rect(), PixelRect::new(0.0, 500.0, 500.0, 1000.0));
        g.move_by(0.0, 5000.0);
        assert_eq!(g.rect(), PixelRect::new(0.0, 1000.0, 500.0, 1000.0));
    }

    #[test]
    fn resize_moves_only_grabbed_edges() {
        let mut g = gesture();
        g.resize(Handle::Right, PixelPoint::new(900.0, 0.0));
        assert_eq!(g.rect(), PixelRect::new(250.0, 500.0, 650.0, 1000.0));
        g.resize(Handle::TopLeft, PixelPoint::new(300.0, 600.0));
        assert_eq!(g.rect(), PixelRect::new(300.0, 600.0, 600.0, 900.0));
    }

    #[test]
    fn resize_past_opposite_edge_flips() {
        let mut g = gesture();
        g.resize(Handle::Left, PixelPoint::new(800.0, 0.0));
        assert_eq!(g.rect(), PixelRect::new(750.0, 500.0, 50.0, 1000.0));
    }

    #[test]
    fn reset_restores_auto_box() {
        let mut g = gesture();
        g.set_rect(PixelRect::new(-10.0, 0.0, 50.0, 50.0));
        assert_eq!(g.rect(), PixelRect::new(0.0, 0.0, 40.0, 50.0));
        g.reset();
        assert_eq!(g.rect(), gesture().rect());
    }

    #[test]
    fn nan_input_keeps_box_finite() {
        let mut g = gesture();
        g.move_by(f64::NAN, 10.0);
        assert_eq!(g.rect(), gesture().rect());

        g.start_drag(PixelPoint::new(f64::NAN, 100.0));
        g.drag_to(PixelPoint::new(300.0, f64::NAN));
        assert_eq!(g.rect(), PixelRect::new(0.0, 0.0, 300.0, 100.0));

        g.set_rect(PixelRect::new(f64::NAN, 0.0, 10.0, 10.0));
        assert!(g.rect().is_finite());
    }
}
