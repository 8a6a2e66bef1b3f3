// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// E-paper hotspots: core types, geometry and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod region;
pub mod types;

pub use config::{ClampPolicy, EpaperConfig};
pub use error::{EpaperError, Result};
pub use geometry::{ImageSize, PixelPoint, PixelRect};
pub use region::{
    FALLBACK_REGION_TITLE, NormalizedRect, READER_LABEL_FALLBACK, resolve_title, to_display_rect,
    to_normalized,
};
pub use types::*;
