// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay projection and hit-testing for the reader.
//
// Overlays are derived state: they are recomputed from the stored
// percentages whenever the rendered image size changes and never cached as
// pixels.

use epaper_core::geometry::{ImageSize, PixelPoint, PixelRect};
use epaper_core::region::to_display_rect;
use epaper_core::types::{Page, Region};

/// A region positioned on the rendered page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay<'a> {
    pub region: &'a Region,
    pub rect: PixelRect,
}

impl<'a> Overlay<'a> {
    /// Tooltip label, falling back to "Story Detail" for blank titles.
    pub fn label(&self) -> &'a str {
        self.region.label()
    }

    pub fn links_article(&self) -> bool {
        self.region.article_id.is_some()
    }

    pub fn is_degenerate(&self) -> bool {
        self.rect.is_degenerate()
    }
}

/// Project every region of `page` onto the image rendered at `rendered`.
///
/// The iterator is lazy and can be cloned to restart it; projecting the same
/// page at the same size always yields the same overlays.
pub fn render_overlays(
    page: &Page,
    rendered: ImageSize,
) -> impl ExactSizeIterator<Item = Overlay<'_>> + Clone + '_ {
    page.regions.iter().map(move |region| Overlay {
        region,
        rect: to_display_rect(region, rendered),
    })
}

/// The region under `point` on the rendered page.
///
/// Overlapping regions resolve to the one added last.
pub fn hit_test(page: &Page, rendered: ImageSize, point: PixelPoint) -> Option<&Region> {
    page.regions
        .iter()
        .rev()
        .find(|region| to_display_rect(region, rendered).contains(point))
}
