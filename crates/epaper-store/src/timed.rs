// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Timeout decorator for page stores and article catalogs.
//
// A backend call that does not finish within the configured bound is abandoned
// and reported as `StoreUnavailable`. Calls are never retried here.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use epaper_core::error::{EpaperError, Result};
use epaper_core::types::{NewPage, Page, PageId, Region};

use crate::traits::{ArticleCatalog, PageStore};

/// Wraps a [`PageStore`] or [`ArticleCatalog`] and bounds every call by
/// `timeout`.
pub struct TimedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(&self, op: &'static str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Store call timed out");
                Err(EpaperError::StoreUnavailable(format!(
                    "store {op} timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl<S: PageStore> PageStore for TimedStore<S> {
    async fn get_pages(&self, date: Option<NaiveDate>) -> Result<Vec<Page>> {
        self.bounded("get_pages", self.inner.get_pages(date)).await
    }

    async fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        self.bounded("get_page", self.inner.get_page(id)).await
    }

    async fn add_page(&self, page: NewPage) -> Result<Page> {
        self.bounded("add_page", self.inner.add_page(page)).await
    }

    async fn replace_regions(&self, id: &PageId, regions: Vec<Region>) -> Result<Page> {
        self.bounded("replace_regions", self.inner.replace_regions(id, regions))
            .await
    }

    async fn delete_page(&self, id: &PageId) -> Result<()> {
        self.bounded("delete_page", self.inner.delete_page(id)).await
    }
}

#[async_trait]
impl<S: ArticleCatalog> ArticleCatalog for TimedStore<S> {
    async fn article_title(&self, article_id: &str) -> Result<Option<String>> {
        self.bounded("article_title", self.inner.article_title(article_id))
            .await
    }
}
