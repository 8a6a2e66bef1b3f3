// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory page store and article index.
//
// Used by tests and demos in place of the hosted backend. Failures and
// latency can be injected to exercise rollback, timeout and serialization
// paths in the engines.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument};

use epaper_core::error::{EpaperError, Result};
use epaper_core::types::{NewPage, Page, PageId, Region};

use crate::traits::{ArticleCatalog, PageStore};

fn poisoned() -> EpaperError {
    EpaperError::StoreUnavailable("page store lock poisoned".into())
}

/// Page store holding every page in process memory.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: Mutex<Vec<Page>>,
    /// Messages returned by the next writes, consumed one per write.
    write_failures: Mutex<VecDeque<String>>,
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
    replace_calls: AtomicUsize,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `pages`.
    pub fn with_pages(pages: Vec<Page>) -> Self {
        Self {
            pages: Mutex::new(pages),
            ..Self::default()
        }
    }

    /// Make the next write fail with `message` as a `StoreWriteFailed`.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        if let Ok(mut failures) = self.write_failures.lock() {
            failures.push_back(message.into());
        }
    }

    /// Make every call fail with `StoreUnavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call by `latency` to simulate a network round-trip.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }

    /// Number of `replace_regions` calls received so far.
    pub fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    async fn round_trip(&self) -> Result<()> {
        let latency = *self.latency.lock().map_err(|_| poisoned())?;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EpaperError::StoreUnavailable("page store is unreachable".into()));
        }
        Ok(())
    }

    fn take_write_failure(&self) -> Result<()> {
        let mut failures = self.write_failures.lock().map_err(|_| poisoned())?;
        match failures.pop_front() {
            Some(message) => Err(EpaperError::StoreWriteFailed(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    #[instrument(skip(self))]
    async fn get_pages(&self, date: Option<NaiveDate>) -> Result<Vec<Page>> {
        self.round_trip().await?;
        let pages = self.pages.lock().map_err(|_| poisoned())?;
        let mut matching: Vec<Page> = pages
            .iter()
            .filter(|p| date.is_none_or(|d| p.date == d))
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.page_number);
        debug!(count = matching.len(), "Pages listed");
        Ok(matching)
    }

    #[instrument(skip(self), fields(page_id = %id))]
    async fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        self.round_trip().await?;
        let pages = self.pages.lock().map_err(|_| poisoned())?;
        Ok(pages.iter().find(|p| &p.id == id).cloned())
    }

    #[instrument(skip(self, page), fields(date = %page.date, page_number = page.page_number))]
    async fn add_page(&self, page: NewPage) -> Result<Page> {
        self.round_trip().await?;
        self.take_write_failure()?;
        let mut pages = self.pages.lock().map_err(|_| poisoned())?;
        if pages
            .iter()
            .any(|p| p.date == page.date && p.page_number == page.page_number)
        {
            return Err(EpaperError::InvalidPage(format!(
                "page {} already exists for edition {}",
                page.page_number, page.date
            )));
        }
        let created = Page {
            id: PageId::generate(),
            date: page.date,
            page_number: page.page_number,
            image_url: page.image_url,
            regions: Vec::new(),
            created_at: Utc::now(),
        };
        pages.push(created.clone());
        info!(page_id = %created.id, "Page added");
        Ok(created)
    }

    #[instrument(skip(self, regions), fields(page_id = %id, count = regions.len()))]
    async fn replace_regions(&self, id: &PageId, regions: Vec<Region>) -> Result<Page> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;
        self.take_write_failure()?;
        let mut pages = self.pages.lock().map_err(|_| poisoned())?;
        let page = pages
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| EpaperError::PageNotFound(id.clone()))?;
        page.regions = regions;
        debug!("Regions replaced");
        Ok(page.clone())
    }

    #[instrument(skip(self), fields(page_id = %id))]
    async fn delete_page(&self, id: &PageId) -> Result<()> {
        self.round_trip().await?;
        self.take_write_failure()?;
        let mut pages = self.pages.lock().map_err(|_| poisoned())?;
        pages.retain(|p| &p.id != id);
        info!("Page deleted");
        Ok(())
    }
}

/// Article titles keyed by article id.
#[derive(Debug, Default)]
pub struct ArticleIndex {
    titles: HashMap<String, String>,
}

impl ArticleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, article_id: impl Into<String>, title: impl Into<String>) {
        self.titles.insert(article_id.into(), title.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArticleIndex {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            titles: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl ArticleCatalog for ArticleIndex {
    async fn article_title(&self, article_id: &str) -> Result<Option<String>> {
        Ok(self.titles.get(article_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epaper_core::types::RegionId;

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("valid date")
    }

    fn new_page(d: &str, n: u32) -> NewPage {
        NewPage {
            date: date(d),
            page_number: n,
            image_url: format!("pages/{d}/{n}.png"),
        }
    }

    fn region(id: &str) -> Region {
        Region {
            id: RegionId::from(id),
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            article_id: None,
            title: id.into(),
        }
    }

    #[tokio::test]
    async fn get_pages_filters_by_date_and_sorts() {
        let store = MemoryPageStore::new();
        store.add_page(new_page("2024-01-01", 3)).await.unwrap();
        store.add_page(new_page("2024-01-02", 1)).await.unwrap();
        store.add_page(new_page("2024-01-01", 1)).await.unwrap();
        store.add_page(new_page("2024-01-01", 2)).await.unwrap();

        let pages = store.get_pages(Some(date("2024-01-01"))).await.unwrap();
        let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(pages.iter().all(|p| p.date == date("2024-01-01")));

        assert_eq!(store.get_pages(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn added_page_starts_empty() {
        let store = MemoryPageStore::new();
        let page = store.add_page(new_page("2024-01-01", 1)).await.unwrap();
        assert!(page.regions.is_empty());
        assert!(page.id.as_str().starts_with("ep-"));
        assert_eq!(store.get_page(&page.id).await.unwrap(), Some(page));
    }

    #[tokio::test]
    async fn duplicate_page_number_is_rejected() {
        let store = MemoryPageStore::new();
        store.add_page(new_page("2024-01-01", 1)).await.unwrap();
        let err = store.add_page(new_page("2024-01-01", 1)).await.unwrap_err();
        assert!(matches!(err, EpaperError::InvalidPage(_)));
    }

    #[tokio::test]
    async fn replace_regions_preserves_order() {
        let store = MemoryPageStore::new();
        let page = store.add_page(new_page("2024-01-01", 1)).await.unwrap();
        let regions = vec![region("c"), region("a"), region("b")];
        let updated = store.replace_regions(&page.id, regions.clone()).await.unwrap();
        assert_eq!(updated.regions, regions);
        assert_eq!(store.replace_calls(), 1);
    }

    #[tokio::test]
    async fn replace_regions_on_unknown_page() {
        let store = MemoryPageStore::new();
        let err = store
            .replace_regions(&PageId::from("ep-missing"), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, EpaperError::PageNotFound(_)));
    }

    #[tokio::test]
    async fn injected_write_failure_is_consumed_once() {
        let store = MemoryPageStore::new();
        let page = store.add_page(new_page("2024-01-01", 1)).await.unwrap();
        store.fail_next_write("permission denied for table epaper");

        let err = store.replace_regions(&page.id, vec![region("a")]).await.unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table epaper");
        assert!(store.get_page(&page.id).await.unwrap().unwrap().regions.is_empty());

        store.replace_regions(&page.id, vec![region("a")]).await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads() {
        let store = MemoryPageStore::new();
        store.set_unavailable(true);
        let err = store.get_pages(None).await.unwrap_err();
        assert!(matches!(err, EpaperError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn delete_page_is_idempotent() {
        let store = MemoryPageStore::new();
        let page = store.add_page(new_page("2024-01-01", 1)).await.unwrap();
        store.delete_page(&page.id).await.unwrap();
        store.delete_page(&page.id).await.unwrap();
        assert!(store.get_page(&page.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn article_index_lookup() {
        let index: ArticleIndex = [("art-7", "Budget passes")].into_iter().collect();
        assert_eq!(
            index.article_title("art-7").await.unwrap().as_deref(),
            Some("Budget passes")
        );
        assert!(index.article_title("art-8").await.unwrap().is_none());
    }
}
