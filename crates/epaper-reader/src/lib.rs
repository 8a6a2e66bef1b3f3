// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// epaper-reader: reader side of the hotspot engine.
//
// Reads pages and their regions only: projects overlays onto the rendered
// page, resolves clicks, offers article navigation and runs the clip flow
// that exports part of a page as a PNG.

pub mod activation;
pub mod clip;
pub mod flow;
pub mod overlay;
pub mod viewer;

pub use activation::{Activation, CropIntent, NavigationIntent, activate_region};
pub use clip::{ClipOutput, clip_filename, export_clip};
pub use flow::{ClipFlow, ClipJob, ClipState};
pub use overlay::{Overlay, hit_test, render_overlays};
pub use viewer::{EditionLoad, EditionViewer, LoadedEdition};
