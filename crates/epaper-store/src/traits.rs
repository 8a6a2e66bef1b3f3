// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits consumed by the editor and reader engines.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use epaper_core::error::Result;
use epaper_core::types::{NewPage, Page, PageId, Region};

/// Persistence for e-paper pages.
///
/// The store is shared and externally synchronized. Callers must not assume
/// exclusive access: a page may change between a read and a later write.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Pages of one edition (or of every edition when `date` is `None`),
    /// ordered by `page_number` ascending.
    async fn get_pages(&self, date: Option<NaiveDate>) -> Result<Vec<Page>>;

    /// A single page, or `None` if no page has this id.
    async fn get_page(&self, id: &PageId) -> Result<Option<Page>>;

    /// Create a page. The store assigns the id and starts with no regions.
    async fn add_page(&self, page: NewPage) -> Result<Page>;

    /// Atomically replace the full region list of a page.
    ///
    /// Fails with `PageNotFound` when the page no longer exists.
    async fn replace_regions(&self, id: &PageId, regions: Vec<Region>) -> Result<Page>;

    /// Delete a page together with its regions. Deleting an unknown id succeeds.
    async fn delete_page(&self, id: &PageId) -> Result<()>;
}

/// Lookup of article titles for region linking.
#[async_trait]
pub trait ArticleCatalog: Send + Sync {
    /// Title of the article, or `None` if the id is unknown.
    async fn article_title(&self, article_id: &str) -> Result<Option<String>>;
}

#[async_trait]
impl<T: PageStore + ?Sized> PageStore for Arc<T> {
    async fn get_pages(&self, date: Option<NaiveDate>) -> Result<Vec<Page>> {
        (**self).get_pages(date).await
    }

    async fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        (**self).get_page(id).await
    }

    async fn add_page(&self, page: NewPage) -> Result<Page> {
        (**self).add_page(page).await
    }

    async fn replace_regions(&self, id: &PageId, regions: Vec<Region>) -> Result<Page> {
        (**self).replace_regions(id, regions).await
    }

    async fn delete_page(&self, id: &PageId) -> Result<()> {
        (**self).delete_page(id).await
    }
}

#[async_trait]
impl<T: ArticleCatalog + ?Sized> ArticleCatalog for Arc<T> {
    async fn article_title(&self, article_id: &str) -> Result<Option<String>> {
        (**self).article_title(article_id).await
    }
}
