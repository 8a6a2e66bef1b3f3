// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// epaper-editor: administrative side of the hotspot engine.
//
// An `Editor` opens one `EditorSession` per page. A session gates crop
// gestures on the page image being loaded, turns a committed pixel rectangle
// into a percentage region and persists the page's whole region list through
// the page store.

pub mod confirm;
pub mod engine;
pub mod gesture;
pub mod session;

pub use confirm::{ConfirmRequest, Confirmation};
pub use engine::{Editor, PageRemoval};
pub use gesture::{CropGesture, Handle};
pub use session::{EditorSession, ImageState, RegionDeletion, RegionLink, RegionOverlay};
