// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page image loading.
//
// Engines never fetch assets themselves; they ask an `ImageLoader` for the
// page's `image_url` and wait for it to finish before allowing gestures or
// crops.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tracing::{debug, instrument};

use epaper_core::config::EpaperConfig;
use epaper_core::error::{EpaperError, Result};

use crate::page_image::PageImage;

/// Resolves a page's `image_url` to a decoded image.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, image_url: &str) -> Result<PageImage>;
}

/// Loads page images from files under a root directory.
///
/// `image_url` is treated as a path relative to the root; `file://` prefixes
/// are stripped. Paths that escape the root are refused.
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loader rooted at the configured `image_root`.
    pub fn from_config(config: &EpaperConfig) -> Self {
        Self::new(config.image_root.clone())
    }

    fn resolve(&self, image_url: &str) -> Result<PathBuf> {
        let relative = Path::new(image_url.strip_prefix("file://").unwrap_or(image_url));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(EpaperError::Image(format!(
                "image path {image_url} is outside the image root"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageLoader for FsImageLoader {
    #[instrument(skip(self))]
    async fn load(&self, image_url: &str) -> Result<PageImage> {
        let path = self.resolve(image_url)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            EpaperError::Image(format!("failed to read {}: {e}", path.display()))
        })?;
        tokio::task::spawn_blocking(move || PageImage::from_bytes(&bytes))
            .await
            .map_err(|e| EpaperError::Image(format!("image decode task failed: {e}")))?
    }
}

/// Serves pre-decoded images by URL. Used by tests and previews.
#[derive(Default)]
pub struct MemoryImageLoader {
    images: HashMap<String, DynamicImage>,
    latency: Mutex<Option<Duration>>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image_url: impl Into<String>, image: DynamicImage) {
        self.images.insert(image_url.into(), image);
    }

    /// Delay each load by `latency` to simulate a slow asset fetch.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }
}

#[async_trait]
impl ImageLoader for MemoryImageLoader {
    async fn load(&self, image_url: &str) -> Result<PageImage> {
        let latency = self.latency.lock().ok().and_then(|l| *l);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let image = self
            .images
            .get(image_url)
            .cloned()
            .ok_or_else(|| EpaperError::Image(format!("no image available at {image_url}")))?;
        debug!(image_url, "Image served from memory");
        Ok(PageImage::from_dynamic(image))
    }
}
