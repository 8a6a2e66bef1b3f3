// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edition browsing: the pages of one date and the page being read.
//
// Loading is split in three steps so the view never blocks on the store:
// `switch_date` hands out an `EditionLoad` carrying a ticket, the caller
// awaits `EditionLoad::fetch` wherever it likes, and `apply` installs the
// result only if no newer load has been requested since.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use epaper_core::config::EpaperConfig;
use epaper_core::error::Result;
use epaper_core::types::Page;
use epaper_store::{PageStore, TimedStore};

/// A pending edition fetch.
pub struct EditionLoad {
    ticket: u64,
    date: NaiveDate,
    store: Arc<dyn PageStore>,
}

/// Pages returned for an [`EditionLoad`].
#[derive(Debug, Clone)]
pub struct LoadedEdition {
    ticket: u64,
    date: NaiveDate,
    pages: Vec<Page>,
}

impl EditionLoad {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[instrument(skip(self), fields(date = %self.date, ticket = self.ticket))]
    pub async fn fetch(self) -> Result<LoadedEdition> {
        let pages = self.store.get_pages(Some(self.date)).await?;
        debug!(count = pages.len(), "Edition fetched");
        Ok(LoadedEdition {
            ticket: self.ticket,
            date: self.date,
            pages,
        })
    }
}

/// Reader-side view of one edition.
pub struct EditionViewer {
    store: Arc<dyn PageStore>,
    date: NaiveDate,
    pages: Vec<Page>,
    current: usize,
    ticket: u64,
    loading: bool,
}

impl EditionViewer {
    pub fn new(store: Arc<dyn PageStore>, config: &EpaperConfig, date: NaiveDate) -> Self {
        let store: Arc<dyn PageStore> = Arc::new(TimedStore::new(store, config.store_timeout()));
        Self {
            store,
            date,
            pages: Vec::new(),
            current: 0,
            ticket: 0,
            loading: false,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// A load has been requested and not yet applied.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Pages of the shown edition, by page number.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Show another edition. The current pages are dropped straight away.
    pub fn switch_date(&mut self, date: NaiveDate) -> EditionLoad {
        self.date = date;
        self.pages.clear();
        self.current = 0;
        self.request()
    }

    /// Reload the current edition, keeping the page being read if it is
    /// still there.
    pub fn refresh(&mut self) -> EditionLoad {
        self.request()
    }

    fn request(&mut self) -> EditionLoad {
        self.ticket += 1;
        self.loading = true;
        EditionLoad {
            ticket: self.ticket,
            date: self.date,
            store: Arc::clone(&self.store),
        }
    }

    /// Install fetched pages. Returns `false` for a superseded load.
    pub fn apply(&mut self, loaded: LoadedEdition) -> bool {
        if loaded.ticket != self.ticket || loaded.date != self.date {
            warn!(ticket = loaded.ticket, current = self.ticket, "Stale edition load ignored");
            return false;
        }
        let reading = self.current_page().map(|p| p.page_number);
        let mut pages = loaded.pages;
        pages.sort_by_key(|p| p.page_number);
        self.current = reading
            .and_then(|n| pages.iter().position(|p| p.page_number == n))
            .unwrap_or(0);
        self.pages = pages;
        self.loading = false;
        info!(date = %self.date, pages = self.pages.len(), "Edition shown");
        true
    }

    /// Switch to `date` and wait for its pages. On failure the viewer is
    /// left on `date` with no pages and not loading.
    pub async fn show_date(&mut self, date: NaiveDate) -> Result<&[Page]> {
        match self.switch_date(date).fetch().await {
            Ok(loaded) => {
                self.apply(loaded);
                Ok(&self.pages)
            }
            Err(err) => {
                warn!(date = %date, error = %err, "Edition load failed");
                self.loading = false;
                Err(err)
            }
        }
    }

    /// Page being read, or `None` for an empty edition.
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Advance one page; stays on the last page.
    pub fn next(&mut self) -> Option<&Page> {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
        }
        self.current_page()
    }

    /// Go back one page; stays on the first page.
    pub fn previous(&mut self) -> Option<&Page> {
        self.current = self.current.saturating_sub(1);
        self.current_page()
    }

    /// Jump to page `page_number` if the edition has it.
    pub fn select_page(&mut self, page_number: u32) -> Option<&Page> {
        let index = self.pages.iter().position(|p| p.page_number == page_number)?;
        self.current = index;
        self.current_page()
    }

    /// `(page_number, hotspot count)` for every page, in page order.
    pub fn hotspot_counts(&self) -> Vec<(u32, usize)> {
        self.pages
            .iter()
            .map(|p| (p.page_number, p.hotspot_count()))
            .collect()
    }
}
