// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the e-paper hotspot engine.

use thiserror::Error;

use crate::types::{PageId, RegionId};

/// Top-level error type for all region, page and clip operations.
///
/// Every failure is scoped to the current session or operation; nothing here
/// is fatal to the process.
#[derive(Debug, Error)]
pub enum EpaperError {
    // -- Image errors --
    #[error("invalid image dimensions {width}x{height}: image has not finished loading")]
    InvalidImageDimensions { width: f64, height: f64 },

    #[error("page image is not ready yet")]
    ImageNotReady,

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("crop rectangle is empty")]
    EmptyCrop,

    #[error("invalid region rectangle: {0}")]
    InvalidRegion(String),

    #[error("no crop gesture in progress")]
    NoActiveCrop,

    // -- Store errors --
    /// Network/backend failure or timeout. The message is the store's own.
    #[error("{0}")]
    StoreUnavailable(String),

    /// The store rejected a write. The message is the store's own.
    #[error("{0}")]
    StoreWriteFailed(String),

    #[error("page {0} not found")]
    PageNotFound(PageId),

    #[error("region {0} not found")]
    RegionNotFound(RegionId),

    #[error("invalid page: {0}")]
    InvalidPage(String),

    #[error("database error: {0}")]
    Database(String),

    // -- Session errors --
    #[error("session has been closed")]
    SessionClosed,

    #[error("another region operation is still in flight for this session")]
    SessionBusy,

    #[error("invalid clip state: {0}")]
    InvalidClipState(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EpaperError {
    /// Whether the error came from the page store round-trip.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::StoreWriteFailed(_) | Self::Database(_)
        )
    }

    /// Whether the editing session that hit this error can no longer continue.
    ///
    /// The caller should drop the session and refresh its page list.
    pub fn terminates_session(&self) -> bool {
        matches!(self, Self::PageNotFound(_) | Self::SessionClosed)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EpaperError>;
