// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor entry point: page administration and session opening.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use epaper_core::config::EpaperConfig;
use epaper_core::error::{EpaperError, Result};
use epaper_core::types::{NewPage, Page, PageId};
use epaper_imaging::ImageLoader;
use epaper_store::{ArticleCatalog, PageStore, TimedStore};

use crate::confirm::{ConfirmRequest, Confirmation};
use crate::session::EditorSession;

/// Result of [`Editor::remove_page`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageRemoval {
    Removed,
    NotPresent,
    Cancelled,
}

/// Shared collaborators for every editing session.
///
/// Store and catalog calls made through the editor and its sessions are
/// bounded by `store_timeout_secs`.
pub struct Editor {
    store: Arc<dyn PageStore>,
    articles: Arc<dyn ArticleCatalog>,
    images: Arc<dyn ImageLoader>,
    config: EpaperConfig,
}

impl Editor {
    pub fn new(
        store: Arc<dyn PageStore>,
        articles: Arc<dyn ArticleCatalog>,
        images: Arc<dyn ImageLoader>,
        config: EpaperConfig,
    ) -> Result<Self> {
        config.validate()?;
        let store: Arc<dyn PageStore> = Arc::new(TimedStore::new(store, config.store_timeout()));
        let articles: Arc<dyn ArticleCatalog> =
            Arc::new(TimedStore::new(articles, config.store_timeout()));
        Ok(Self {
            store,
            articles,
            images,
            config,
        })
    }

    pub fn config(&self) -> &EpaperConfig {
        &self.config
    }

    /// Pages of one edition, or of all editions, by page number.
    pub async fn pages(&self, date: Option<NaiveDate>) -> Result<Vec<Page>> {
        self.store.get_pages(date).await
    }

    /// Create a page. The page number must be positive and free in its edition.
    #[instrument(skip(self, page), fields(date = %page.date, page_number = page.page_number))]
    pub async fn add_page(&self, page: NewPage) -> Result<Page> {
        if page.page_number == 0 {
            return Err(EpaperError::InvalidPage(
                "page number must be positive".into(),
            ));
        }
        if page.image_url.trim().is_empty() {
            return Err(EpaperError::InvalidPage("image url is required".into()));
        }
        let taken = self
            .store
            .get_pages(Some(page.date))
            .await?
            .iter()
            .any(|p| p.page_number == page.page_number);
        if taken {
            return Err(EpaperError::InvalidPage(format!(
                "page {} already exists for edition {}",
                page.page_number, page.date
            )));
        }
        let created = self.store.add_page(page).await?;
        info!(page = %created.id, "Page created");
        Ok(created)
    }

    /// Delete a page and its regions after confirmation.
    ///
    /// Sessions still open on the page fail with `PageNotFound` on their next
    /// write and close themselves.
    #[instrument(skip(self, confirmation), fields(page = %page_id))]
    pub async fn remove_page(
        &self,
        page_id: &PageId,
        confirmation: &dyn Confirmation,
    ) -> Result<PageRemoval> {
        let Some(page) = self.store.get_page(page_id).await? else {
            return Ok(PageRemoval::NotPresent);
        };
        let request = ConfirmRequest::DeletePage {
            page_id: page.id.clone(),
            date: page.date,
            page_number: page.page_number,
        };
        if !confirmation.confirm(&request).await {
            return Ok(PageRemoval::Cancelled);
        }
        self.store.delete_page(page_id).await?;
        info!(regions = page.regions.len(), "Page removed");
        Ok(PageRemoval::Removed)
    }

    /// Bind a session to `page_id` without loading its image.
    ///
    /// Gestures stay unavailable until the caller reports the image's natural
    /// size through [`EditorSession::attach_image_size`].
    pub async fn begin_session(&self, page_id: &PageId) -> Result<EditorSession> {
        let page = self
            .store
            .get_page(page_id)
            .await?
            .ok_or_else(|| EpaperError::PageNotFound(page_id.clone()))?;
        Ok(EditorSession::new(
            page,
            Arc::clone(&self.store),
            Arc::clone(&self.articles),
            self.config.clamp_policy,
            self.config.editor_auto_crop_ratio,
        ))
    }

    /// Bind a session to `page_id` and wait for its image to load.
    #[instrument(skip(self), fields(page = %page_id))]
    pub async fn open_session(&self, page_id: &PageId) -> Result<EditorSession> {
        let session = self.begin_session(page_id).await?;
        let image_url = session.page().image_url;
        match self.images.load(&image_url).await {
            Ok(image) => session.attach_image(image)?,
            Err(err) => {
                warn!(image_url = %image_url, error = %err, "Page image failed to load");
                session.mark_image_failed();
                return Err(err);
            }
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epaper_imaging::MemoryImageLoader;
    use epaper_store::{ArticleIndex, MemoryPageStore};
    use image::{DynamicImage, RgbaImage};

    use crate::session::ImageState;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    async fn editor_with_page() -> (Editor, Arc<MemoryPageStore>, Page) {
        let store = Arc::new(MemoryPageStore::new());
        let mut images = MemoryImageLoader::new();
        images.insert("p1.png", DynamicImage::ImageRgba8(RgbaImage::new(1000, 2000)));
        let editor = Editor::new(
            store.clone(),
            Arc::new(ArticleIndex::new()),
            Arc::new(images),
            EpaperConfig::default(),
        )
        .unwrap();
        let page = editor
            .add_page(NewPage {
                date: date(),
                page_number: 1,
                image_url: "p1.png".into(),
            })
            .await
            .unwrap();
        (editor, store, page)
    }

    #[tokio::test]
    async fn add_page_validates_number_and_uniqueness() {
        let (editor, _, _) = editor_with_page().await;
        let zero = NewPage {
            date: date(),
            page_number: 0,
            image_url: "p0.png".into(),
        };
        assert!(matches!(
            editor.add_page(zero).await.unwrap_err(),
            EpaperError::InvalidPage(_)
        ));

        let duplicate = NewPage {
            date: date(),
            page_number: 1,
            image_url: "other.png".into(),
        };
        assert!(matches!(
            editor.add_page(duplicate).await.unwrap_err(),
            EpaperError::InvalidPage(_)
        ));

        let next_day = NewPage {
            date: date().succ_opt().unwrap(),
            page_number: 1,
            image_url: "p1.png".into(),
        };
        editor.add_page(next_day).await.unwrap();
        assert_eq!(editor.pages(Some(date())).await.unwrap().len(), 1);
        assert_eq!(editor.pages(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn new_pages_default_to_todays_edition() {
        let (editor, _, _) = editor_with_page().await;
        let page = editor.add_page(NewPage::today(5, "p5.png")).await.unwrap();
        assert_eq!(page.date, chrono::Utc::now().date_naive());
        assert!(page.regions.is_empty());
        assert!(page.id.as_str().starts_with("ep-"));
    }

    #[tokio::test]
    async fn open_session_waits_for_image() {
        let (editor, _, page) = editor_with_page().await;
        let session = editor.open_session(&page.id).await.unwrap();
        assert!(matches!(session.image_state(), ImageState::Ready(_)));
        assert!(session.render_preview().is_ok());
    }

    #[tokio::test]
    async fn open_session_reports_missing_page_and_image() {
        let (editor, store, _) = editor_with_page().await;
        let err = editor.open_session(&PageId::from("ep-missing")).await.unwrap_err();
        assert!(matches!(err, EpaperError::PageNotFound(_)));

        let orphan = store
            .add_page(NewPage {
                date: date(),
                page_number: 2,
                image_url: "missing.png".into(),
            })
            .await
            .unwrap();
        let err = editor.open_session(&orphan.id).await.unwrap_err();
        assert!(matches!(err, EpaperError::Image(_)));
    }

    #[tokio::test]
    async fn remove_page_honours_confirmation() {
        let (editor, _, page) = editor_with_page().await;
        let declined = editor
            .remove_page(&page.id, &|_: &ConfirmRequest| false)
            .await
            .unwrap();
        assert_eq!(declined, PageRemoval::Cancelled);
        assert_eq!(editor.pages(None).await.unwrap().len(), 1);

        let removed = editor
            .remove_page(&page.id, &|_: &ConfirmRequest| true)
            .await
            .unwrap();
        assert_eq!(removed, PageRemoval::Removed);
        assert!(editor.pages(None).await.unwrap().is_empty());

        let again = editor
            .remove_page(&page.id, &|_: &ConfirmRequest| true)
            .await
            .unwrap();
        assert_eq!(again, PageRemoval::NotPresent);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let config = EpaperConfig {
            store_timeout_secs: 0,
            ..EpaperConfig::default()
        };
        let result = Editor::new(
            Arc::new(MemoryPageStore::new()),
            Arc::new(ArticleIndex::new()),
            Arc::new(MemoryImageLoader::new()),
            config,
        );
        assert!(matches!(result, Err(EpaperError::Config(_))));
    }
}
