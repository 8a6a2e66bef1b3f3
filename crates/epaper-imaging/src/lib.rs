// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// epaper-imaging: raster side of the hotspot engine.
//
// Decodes scanned page images, reports their natural dimensions, crops clips
// at source resolution, encodes them as PNG and draws region outlines for
// editor previews. Loading is behind the async `ImageLoader` seam.

pub mod loader;
pub mod page_image;

pub use loader::{FsImageLoader, ImageLoader, MemoryImageLoader};
pub use page_image::PageImage;
