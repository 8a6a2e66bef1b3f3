// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region model: title resolution and the mapping between pixel rectangles
// and percentage coordinates.
//
// Stored regions are always percentages of the image's *natural* size. The
// editor normalizes against the natural size; the reader maps back against
// whatever size the image is currently rendered at.

use serde::{Deserialize, Serialize};

use crate::config::ClampPolicy;
use crate::error::{EpaperError, Result};
use crate::geometry::{ImageSize, PixelRect};
use crate::types::Region;

/// Title given to a region with neither a manual title nor a linked article.
pub const FALLBACK_REGION_TITLE: &str = "Hotlink Region";

/// Tooltip label for a stored region whose title is blank.
pub const READER_LABEL_FALLBACK: &str = "Story Detail";

/// A rectangle in percentage coordinates (0–100 of the natural image size).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Whether any edge lies outside the 0–100 square.
    pub fn overhangs(&self) -> bool {
        self.x < 0.0 || self.y < 0.0 || self.x + self.width > 100.0 || self.y + self.height > 100.0
    }

    /// Clamp into the 0–100 square: `x, y >= 0`, `x + width <= 100`,
    /// `y + height <= 100`. A NaN edge collapses onto its lower bound.
    pub fn clamped(&self) -> Self {
        let x = self.x.max(0.0).min(100.0);
        let y = self.y.max(0.0).min(100.0);
        let right = (self.x + self.width).max(x).min(100.0);
        let bottom = (self.y + self.height).max(y).min(100.0);
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    pub fn apply(&self, policy: ClampPolicy) -> Self {
        match policy {
            ClampPolicy::Clamp => self.clamped(),
            ClampPolicy::Permissive => *self,
        }
    }
}

/// Resolve the display title of a new region.
///
/// A non-blank manual title wins, then the linked article's title, then
/// [`FALLBACK_REGION_TITLE`].
pub fn resolve_title(manual_title: &str, linked_article_title: Option<&str>) -> String {
    let manual = manual_title.trim();
    if !manual.is_empty() {
        return manual.to_owned();
    }
    match linked_article_title.map(str::trim) {
        Some(title) if !title.is_empty() => title.to_owned(),
        _ => FALLBACK_REGION_TITLE.to_owned(),
    }
}

/// Convert a pixel rectangle on the natural image into percentages.
///
/// Fails with [`EpaperError::InvalidImageDimensions`] when the natural size
/// is zero or not finite, i.e. the image has not finished loading, and with
/// [`EpaperError::InvalidRegion`] when the rectangle has a NaN or infinite
/// coordinate.
pub fn to_normalized(pixel_rect: PixelRect, natural: ImageSize) -> Result<NormalizedRect> {
    if !natural.is_usable() {
        return Err(EpaperError::InvalidImageDimensions {
            width: natural.width,
            height: natural.height,
        });
    }
    let normalized = NormalizedRect {
        x: pixel_rect.x / natural.width * 100.0,
        y: pixel_rect.y / natural.height * 100.0,
        width: pixel_rect.width / natural.width * 100.0,
        height: pixel_rect.height / natural.height * 100.0,
    };
    if !pixel_rect.is_finite() || !normalized.is_finite() {
        return Err(EpaperError::InvalidRegion(format!(
            "non-finite rectangle {pixel_rect:?}"
        )));
    }
    Ok(normalized)
}

/// Project a stored region onto an image rendered at `rendered`.
///
/// Pass the natural size to recover source-resolution pixel bounds.
pub fn to_display_rect(region: &Region, rendered: ImageSize) -> PixelRect {
    PixelRect {
        x: region.x / 100.0 * rendered.width,
        y: region.y / 100.0 * rendered.height,
        width: region.width / 100.0 * rendered.width,
        height: region.height / 100.0 * rendered.height,
    }
}
