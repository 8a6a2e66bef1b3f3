// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor session bound to one page.
//
// The session owns the last confirmed snapshot of the page. Every mutation
// builds a new region list from that snapshot, sends the whole list to the
// store and adopts the store's returned page only on success. Mutations are
// queued on an async mutex held for the full store round-trip, so each one
// sees the result of the previous.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, instrument, warn};

use epaper_core::config::ClampPolicy;
use epaper_core::error::{EpaperError, Result};
use epaper_core::geometry::{ImageSize, PixelPoint, PixelRect};
use epaper_core::region::{resolve_title, to_display_rect, to_normalized};
use epaper_core::types::{Page, PageId, Region, RegionId, SessionId};
use epaper_imaging::PageImage;
use epaper_store::{ArticleCatalog, PageStore};

use crate::confirm::{ConfirmRequest, Confirmation};
use crate::gesture::{CropGesture, Handle};

/// How a region is labelled and what it links to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionLink {
    /// Wins over the article's title when non-blank.
    pub manual_title: Option<String>,
    pub article_id: Option<String>,
}

impl RegionLink {
    /// A manual title with no linked article.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            manual_title: Some(title.into()),
            article_id: None,
        }
    }

    /// Link to `article_id` and take its title.
    pub fn article(article_id: impl Into<String>) -> Self {
        Self {
            manual_title: None,
            article_id: Some(article_id.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.manual_title = Some(title.into());
        self
    }

    fn linked_article(&self) -> Option<&str> {
        self.article_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Result of [`EditorSession::delete_region`].
#[derive(Debug, Clone, PartialEq)]
pub enum RegionDeletion {
    /// The region was removed; carries the confirmed page.
    Removed(Page),
    /// The id was not on the page. Nothing was asked or written.
    NotPresent(Page),
    /// The editor declined the confirmation.
    Cancelled,
}

/// Loading state of the page image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageState {
    Loading,
    Ready(ImageSize),
    Failed,
}

/// An existing region projected for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOverlay {
    pub region: Region,
    pub rect: PixelRect,
    /// Zero-area regions are kept but should be flagged.
    pub degenerate: bool,
}

#[derive(Debug)]
struct Canvas {
    image_state: ImageState,
    image: Option<Arc<PageImage>>,
    gesture: Option<CropGesture>,
}

/// Editing context for one page.
pub struct EditorSession {
    id: SessionId,
    page_id: PageId,
    store: Arc<dyn PageStore>,
    articles: Arc<dyn ArticleCatalog>,
    clamp_policy: ClampPolicy,
    auto_crop_ratio: f64,
    closed: AtomicBool,
    /// Serializes region mutations for the whole store round-trip.
    turn: AsyncMutex<()>,
    snapshot: Mutex<Page>,
    canvas: Mutex<Canvas>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EditorSession {
    pub(crate) fn new(
        page: Page,
        store: Arc<dyn PageStore>,
        articles: Arc<dyn ArticleCatalog>,
        clamp_policy: ClampPolicy,
        auto_crop_ratio: f64,
    ) -> Self {
        let id = SessionId::new();
        info!(session = %id, page = %page.id, regions = page.regions.len(), "Editor session opened");
        Self {
            id,
            page_id: page.id.clone(),
            store,
            articles,
            clamp_policy,
            auto_crop_ratio,
            closed: AtomicBool::new(false),
            turn: AsyncMutex::new(()),
            snapshot: Mutex::new(page),
            canvas: Mutex::new(Canvas {
                image_state: ImageState::Loading,
                image: None,
                gesture: None,
            }),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Unique id of this editing session.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Page this session is bound to.
    pub fn page_id(&self) -> &PageId {
        &self.page_id
    }

    /// The last confirmed snapshot of the page.
    pub fn page(&self) -> Page {
        relock(&self.snapshot).clone()
    }

    /// Regions of the last confirmed snapshot, in insertion order.
    pub fn regions(&self) -> Vec<Region> {
        relock(&self.snapshot).regions.clone()
    }

    /// Whether the page image is loading, ready or failed.
    pub fn image_state(&self) -> ImageState {
        relock(&self.canvas).image_state
    }

    /// Whether the session has been closed or lost its page.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Abandon the session. In-flight and later operations return
    /// `SessionClosed` and never touch the snapshot.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(session = %self.id, page = %self.page_id, "Editor session closed");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(EpaperError::SessionClosed)
        } else {
            Ok(())
        }
    }

    // -- Image readiness ------------------------------------------------------

    /// Report the natural dimensions of the page image once it has loaded.
    pub fn attach_image_size(&self, natural: ImageSize) -> Result<()> {
        self.ensure_open()?;
        if !natural.is_usable() {
            return Err(EpaperError::InvalidImageDimensions {
                width: natural.width,
                height: natural.height,
            });
        }
        let mut canvas = relock(&self.canvas);
        canvas.image_state = ImageState::Ready(natural);
        debug!(session = %self.id, width = natural.width, height = natural.height, "Page image ready");
        Ok(())
    }

    pub(crate) fn attach_image(&self, image: PageImage) -> Result<()> {
        self.attach_image_size(image.natural_size())?;
        relock(&self.canvas).image = Some(Arc::new(image));
        Ok(())
    }

    pub(crate) fn mark_image_failed(&self) {
        let mut canvas = relock(&self.canvas);
        canvas.image_state = ImageState::Failed;
        canvas.gesture = None;
    }

    /// Natural size used for normalization. Before the image is ready this is
    /// the zero size, which normalization rejects.
    fn natural_size(&self) -> ImageSize {
        match relock(&self.canvas).image_state {
            ImageState::Ready(size) => size,
            ImageState::Loading | ImageState::Failed => ImageSize::new(0.0, 0.0),
        }
    }

    // -- Gestures -------------------------------------------------------------

    /// Open a crop gesture seeded with the automatic centered box.
    pub fn begin_crop(&self) -> Result<PixelRect> {
        self.ensure_open()?;
        let mut canvas = relock(&self.canvas);
        let ImageState::Ready(natural) = canvas.image_state else {
            return Err(EpaperError::ImageNotReady);
        };
        let gesture = CropGesture::new(natural, self.auto_crop_ratio);
        let rect = gesture.rect();
        canvas.gesture = Some(gesture);
        Ok(rect)
    }

    fn with_gesture(&self, f: impl FnOnce(&mut CropGesture)) -> Result<PixelRect> {
        self.ensure_open()?;
        let mut canvas = relock(&self.canvas);
        let gesture = canvas.gesture.as_mut().ok_or(EpaperError::NoActiveCrop)?;
        f(gesture);
        Ok(gesture.rect())
    }

    pub fn start_drag(&self, point: PixelPoint) -> Result<PixelRect> {
        self.with_gesture(|g| g.start_drag(point))
    }

    pub fn drag_to(&self, point: PixelPoint) -> Result<PixelRect> {
        self.with_gesture(|g| g.drag_to(point))
    }

    pub fn move_by(&self, dx: f64, dy: f64) -> Result<PixelRect> {
        self.with_gesture(|g| g.move_by(dx, dy))
    }

    pub fn resize(&self, handle: Handle, point: PixelPoint) -> Result<PixelRect> {
        self.with_gesture(|g| g.resize(handle, point))
    }

    /// Replace the crop box. Rejects a rectangle with a NaN or infinite
    /// coordinate.
    pub fn set_crop(&self, rect: PixelRect) -> Result<PixelRect> {
        if !rect.is_finite() {
            return Err(EpaperError::InvalidRegion(format!("non-finite crop {rect:?}")));
        }
        self.with_gesture(|g| g.set_rect(rect))
    }

    pub fn reset_crop(&self) -> Result<PixelRect> {
        self.with_gesture(CropGesture::reset)
    }

    /// Rectangle of the active gesture, if any.
    pub fn current_crop(&self) -> Option<PixelRect> {
        relock(&self.canvas).gesture.as_ref().map(CropGesture::rect)
    }

    /// Drop the active gesture without committing it.
    pub fn cancel_crop(&self) {
        relock(&self.canvas).gesture = None;
    }

    // -- Region mutations -----------------------------------------------------

    /// Add a region drawn at `pixel_rect` (natural pixels).
    ///
    /// Waits for any mutation already in flight on this session.
    #[instrument(skip(self, link), fields(session = %self.id, page = %self.page_id))]
    pub async fn commit_region(&self, pixel_rect: PixelRect, link: RegionLink) -> Result<Page> {
        let _turn = self.turn.lock().await;
        self.commit_locked(pixel_rect, link).await
    }

    /// Like [`commit_region`](Self::commit_region) but fails with
    /// `SessionBusy` instead of waiting.
    pub async fn try_commit_region(&self, pixel_rect: PixelRect, link: RegionLink) -> Result<Page> {
        let _turn = self.turn.try_lock().map_err(|_| EpaperError::SessionBusy)?;
        self.commit_locked(pixel_rect, link).await
    }

    /// Commit the active gesture's rectangle. The gesture ends on success.
    pub async fn commit_current_crop(&self, link: RegionLink) -> Result<Page> {
        let rect = self.current_crop().ok_or(EpaperError::NoActiveCrop)?;
        let page = self.commit_region(rect, link).await?;
        self.cancel_crop();
        Ok(page)
    }

    async fn commit_locked(&self, pixel_rect: PixelRect, link: RegionLink) -> Result<Page> {
        self.ensure_open()?;
        let normalized = to_normalized(pixel_rect, self.natural_size())?;
        if normalized.overhangs() {
            debug!(policy = ?self.clamp_policy, "Region extends past the image");
        }
        let normalized = normalized.apply(self.clamp_policy);

        let title = self.resolve_link_title(&link).await?;
        self.ensure_open()?;
        let region = Region::new(normalized, link.linked_article().map(str::to_owned), title);
        if region.is_degenerate() {
            warn!(region = %region.id, "Committing zero-area region");
        }

        let mut regions = self.regions();
        let region_id = region.id.clone();
        regions.push(region);
        let page = self.write_regions(regions).await?;
        info!(region = %region_id, total = page.regions.len(), "Region added");
        Ok(page)
    }

    /// Relink or retitle an existing region. Id and geometry are unchanged.
    #[instrument(skip(self, link), fields(session = %self.id, page = %self.page_id))]
    pub async fn update_region(&self, region_id: &RegionId, link: RegionLink) -> Result<Page> {
        let _turn = self.turn.lock().await;
        self.ensure_open()?;
        let snapshot = self.page();
        if snapshot.region(region_id).is_none() {
            return Err(EpaperError::RegionNotFound(region_id.clone()));
        }

        let title = self.resolve_link_title(&link).await?;
        self.ensure_open()?;
        let article_id = link.linked_article().map(str::to_owned);
        let regions = snapshot
            .regions
            .into_iter()
            .map(|region| {
                if &region.id == region_id {
                    Region {
                        article_id: article_id.clone(),
                        title: title.clone(),
                        ..region
                    }
                } else {
                    region
                }
            })
            .collect();
        let page = self.write_regions(regions).await?;
        info!(region = %region_id, "Region updated");
        Ok(page)
    }

    /// Remove a region after confirmation.
    #[instrument(skip(self, confirmation), fields(session = %self.id, page = %self.page_id))]
    pub async fn delete_region(
        &self,
        region_id: &RegionId,
        confirmation: &dyn Confirmation,
    ) -> Result<RegionDeletion> {
        let _turn = self.turn.lock().await;
        self.ensure_open()?;
        let snapshot = self.page();
        let Some(title) = snapshot.region(region_id).map(|r| r.title.clone()) else {
            debug!(region = %region_id, "Region already absent");
            return Ok(RegionDeletion::NotPresent(snapshot));
        };

        let request = ConfirmRequest::DeleteRegion {
            page_id: self.page_id.clone(),
            region_id: region_id.clone(),
            title,
        };
        if !confirmation.confirm(&request).await {
            debug!(region = %region_id, "Region deletion cancelled");
            return Ok(RegionDeletion::Cancelled);
        }
        self.ensure_open()?;

        let regions = snapshot
            .regions
            .into_iter()
            .filter(|region| &region.id != region_id)
            .collect();
        let page = self.write_regions(regions).await?;
        info!(region = %region_id, total = page.regions.len(), "Region removed");
        Ok(RegionDeletion::Removed(page))
    }

    async fn resolve_link_title(&self, link: &RegionLink) -> Result<String> {
        let manual = link.manual_title.as_deref().unwrap_or("");
        let article_title = match link.linked_article() {
            Some(article_id) if manual.trim().is_empty() => {
                let title = self.articles.article_title(article_id).await?;
                if title.is_none() {
                    warn!(article_id, "Linked article not found in catalog");
                }
                title
            }
            _ => None,
        };
        Ok(resolve_title(manual, article_title.as_deref()))
    }

    /// Send the full list to the store and adopt the returned page.
    async fn write_regions(&self, regions: Vec<Region>) -> Result<Page> {
        match self.store.replace_regions(&self.page_id, regions).await {
            Ok(page) => {
                if self.is_closed() {
                    warn!(session = %self.id, "Store replied after session closed; result discarded");
                    return Err(EpaperError::SessionClosed);
                }
                *relock(&self.snapshot) = page.clone();
                Ok(page)
            }
            Err(EpaperError::PageNotFound(id)) => {
                warn!(page = %id, "Page deleted underneath session");
                self.close();
                Err(EpaperError::PageNotFound(id))
            }
            Err(err) => {
                error!(session = %self.id, error = %err, "Region write failed; snapshot kept");
                Err(err)
            }
        }
    }

    // -- Display --------------------------------------------------------------

    /// Existing regions projected onto the page rendered at `rendered`.
    pub fn overlays(&self, rendered: ImageSize) -> Vec<RegionOverlay> {
        relock(&self.snapshot)
            .regions
            .iter()
            .map(|region| RegionOverlay {
                region: region.clone(),
                rect: to_display_rect(region, rendered),
                degenerate: region.is_degenerate(),
            })
            .collect()
    }

    /// A copy of the page image with every confirmed region outlined.
    pub fn render_preview(&self) -> Result<PageImage> {
        let image = relock(&self.canvas)
            .image
            .clone()
            .ok_or(EpaperError::ImageNotReady)?;
        Ok(image.with_region_outlines(&self.regions()))
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("id", &self.id)
            .field("page_id", &self.page_id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
