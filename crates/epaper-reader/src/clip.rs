// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Clip export: a PNG of part of a page at source resolution.

use chrono::NaiveDate;
use tracing::{info, instrument};

use epaper_core::error::Result;
use epaper_core::geometry::PixelRect;
use epaper_core::types::Page;
use epaper_imaging::PageImage;

/// An encoded clip ready to be saved or shared.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipOutput {
    /// PNG-encoded bytes.
    pub bytes: Vec<u8>,
    /// Suggested download name, `<prefix>-<date>-p<page_number>.png`.
    pub filename: String,
    /// Requested rectangle in natural pixels.
    pub rect: PixelRect,
    pub width: u32,
    pub height: u32,
}

/// Suggested filename for a clip of page `page_number` of the `date` edition.
pub fn clip_filename(prefix: &str, date: NaiveDate, page_number: u32) -> String {
    format!("{prefix}-{}-p{page_number}.png", date.format("%Y-%m-%d"))
}

/// Cut `rect` out of `image` and encode it as PNG.
///
/// Pure transform: no store access and no I/O.
#[instrument(skip(image, page), fields(page = %page.id, page_number = page.page_number))]
pub fn export_clip(
    image: &PageImage,
    rect: PixelRect,
    page: &Page,
    prefix: &str,
) -> Result<ClipOutput> {
    let clip = image.crop(rect)?;
    let bytes = clip.to_png_bytes()?;
    let filename = clip_filename(prefix, page.date, page.page_number);
    info!(filename = %filename, bytes = bytes.len(), "Clip exported");
    Ok(ClipOutput {
        bytes,
        filename,
        rect,
        width: clip.width(),
        height: clip.height(),
    })
}
