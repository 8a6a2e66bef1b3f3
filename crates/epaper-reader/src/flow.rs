// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reader clip flow.
//
//   Idle -> RegionSelected -> Cropping -> Downloaded | Cancelled -> Idle
//
// `open_free_crop` enters Cropping directly. Cropping accepts any number of
// adjustments. Every entry into Cropping and every cancel bumps the flow's
// generation, so an export started before a cancel or restart cannot land.

use tracing::{debug, info, warn};

use epaper_core::config::EpaperConfig;
use epaper_core::error::{EpaperError, Result};
use epaper_core::geometry::{ImageSize, PixelRect};
use epaper_core::types::{Page, Region, RegionId};
use epaper_imaging::PageImage;

use crate::activation::{Activation, activate_region};
use crate::clip::{ClipOutput, export_clip};

/// Current step of a [`ClipFlow`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClipState {
    Idle,
    RegionSelected {
        activation: Activation,
        bounds: ImageSize,
    },
    Cropping {
        region_id: Option<RegionId>,
        rect: PixelRect,
        bounds: ImageSize,
    },
    Downloaded {
        filename: String,
    },
    Cancelled,
}

impl ClipState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RegionSelected { .. } => "region selected",
            Self::Cropping { .. } => "cropping",
            Self::Downloaded { .. } => "downloaded",
            Self::Cancelled => "cancelled",
        }
    }

    /// Idle, or finished and waiting to be dismissed.
    fn is_at_rest(&self) -> bool {
        matches!(self, Self::Idle | Self::Downloaded { .. } | Self::Cancelled)
    }
}

/// A snapshot of the crop taken when an export starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipJob {
    pub generation: u64,
    pub rect: PixelRect,
}

/// Clip flow for one reader view.
#[derive(Debug, Clone)]
pub struct ClipFlow {
    state: ClipState,
    generation: u64,
    free_crop_ratio: f64,
    filename_prefix: String,
}

impl ClipFlow {
    pub fn new(config: &EpaperConfig) -> Self {
        Self {
            state: ClipState::Idle,
            generation: 0,
            free_crop_ratio: config.reader_auto_crop_ratio,
            filename_prefix: config.clip_filename_prefix.clone(),
        }
    }

    /// Current step of the flow.
    pub fn state(&self) -> &ClipState {
        &self.state
    }

    /// Bumped on every entry into cropping and on cancel.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rectangle being cropped, in natural pixels.
    pub fn crop_rect(&self) -> Option<PixelRect> {
        match &self.state {
            ClipState::Cropping { rect, .. } => Some(*rect),
            _ => None,
        }
    }

    fn invalid(&self, action: &str) -> EpaperError {
        warn!(state = self.state.name(), action, "Clip flow transition rejected");
        EpaperError::InvalidClipState(format!("cannot {action} while {}", self.state.name()))
    }

    /// A reader clicked `region` on a page of `natural` size.
    ///
    /// The page image must have loaded: a zero or non-finite size is
    /// rejected with `InvalidImageDimensions`.
    pub fn select_region(&mut self, region: &Region, natural: ImageSize) -> Result<&Activation> {
        if !(self.state.is_at_rest() || matches!(self.state, ClipState::RegionSelected { .. })) {
            return Err(self.invalid("select a region"));
        }
        ensure_loaded(natural)?;
        self.state = ClipState::RegionSelected {
            activation: activate_region(region, natural),
            bounds: natural,
        };
        match &self.state {
            ClipState::RegionSelected { activation, .. } => Ok(activation),
            _ => Err(self.invalid("select a region")),
        }
    }

    /// Open the cropper seeded with the selected region.
    pub fn start_crop(&mut self) -> Result<PixelRect> {
        let ClipState::RegionSelected { activation, bounds } = &self.state else {
            return Err(self.invalid("start cropping"));
        };
        let region_id = activation.crop.region_id.clone();
        let rect = activation.crop.seed;
        let bounds = *bounds;
        self.enter_cropping(region_id, rect, bounds);
        Ok(rect)
    }

    /// Open the cropper on the whole page with the automatic box.
    pub fn open_free_crop(&mut self, natural: ImageSize) -> Result<PixelRect> {
        if !(self.state.is_at_rest() || matches!(self.state, ClipState::RegionSelected { .. })) {
            return Err(self.invalid("open a free crop"));
        }
        ensure_loaded(natural)?;
        let rect = PixelRect::centered(natural, self.free_crop_ratio);
        self.enter_cropping(None, rect, natural);
        Ok(rect)
    }

    fn enter_cropping(&mut self, region_id: Option<RegionId>, rect: PixelRect, bounds: ImageSize) {
        self.generation += 1;
        debug!(generation = self.generation, from_region = region_id.is_some(), "Cropping");
        self.state = ClipState::Cropping {
            region_id,
            rect,
            bounds,
        };
    }

    /// Replace the crop rectangle. Allowed any number of times while cropping.
    /// A rectangle with a NaN or infinite coordinate is rejected and the
    /// current crop kept.
    pub fn adjust(&mut self, rect: PixelRect) -> Result<PixelRect> {
        if !rect.is_finite() && self.crop_rect().is_some() {
            return Err(EpaperError::InvalidRegion(format!("non-finite crop {rect:?}")));
        }
        match &mut self.state {
            ClipState::Cropping {
                rect: current,
                bounds,
                ..
            } => {
                *current = rect.clamp_to(*bounds);
                Ok(*current)
            }
            _ => Err(self.invalid("adjust the crop")),
        }
    }

    /// Snapshot the crop for an export that may run elsewhere.
    pub fn begin_export(&self) -> Result<ClipJob> {
        match self.crop_rect() {
            Some(rect) => Ok(ClipJob {
                generation: self.generation,
                rect,
            }),
            None => Err(self.invalid("export")),
        }
    }

    /// Accept a finished export if the flow has not moved on since `job`.
    pub fn complete_export(&mut self, job: ClipJob, output: ClipOutput) -> Result<ClipOutput> {
        if job.generation != self.generation || self.crop_rect().is_none() {
            warn!(
                job = job.generation,
                current = self.generation,
                "Discarding clip from a cancelled or restarted crop"
            );
            return Err(EpaperError::InvalidClipState(
                "clip belongs to a crop that was cancelled or restarted".into(),
            ));
        }
        info!(filename = %output.filename, "Clip downloaded");
        self.state = ClipState::Downloaded {
            filename: output.filename.clone(),
        };
        Ok(output)
    }

    /// Export the current crop of `image` and finish the flow.
    pub fn download(&mut self, image: &PageImage, page: &Page) -> Result<ClipOutput> {
        let job = self.begin_export()?;
        let output = export_clip(image, job.rect, page, &self.filename_prefix)?;
        self.complete_export(job, output)
    }

    /// Abandon the flow. Nothing from it survives.
    pub fn cancel(&mut self) {
        if matches!(self.state, ClipState::Idle) {
            return;
        }
        self.generation += 1;
        debug!(from = self.state.name(), "Clip flow cancelled");
        self.state = ClipState::Cancelled;
    }

    /// Dismiss a finished or cancelled flow.
    pub fn reset(&mut self) {
        self.state = ClipState::Idle;
    }
}

fn ensure_loaded(natural: ImageSize) -> Result<()> {
    if natural.is_usable() {
        Ok(())
    } else {
        Err(EpaperError::InvalidImageDimensions {
            width: natural.width,
            height: natural.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use epaper_core::region::NormalizedRect;
    use epaper_core::types::PageId;
    use image::{DynamicImage, RgbaImage};

    fn natural() -> ImageSize {
        ImageSize::new(1000.0, 1500.0)
    }

    fn linked_region() -> Region {
        Region::new(
            NormalizedRect {
                x: 10.0,
                y: 20.0,
                width: 50.0,
                height: 40.0,
            },
            Some("art-7".into()),
            "Budget".into(),
        )
    }

    fn page() -> Page {
        Page {
            id: PageId::from("ep-1"),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            page_number: 2,
            image_url: "p2.png".into(),
            regions: vec![linked_region()],
            created_at: Utc::now(),
        }
    }

    fn image() -> PageImage {
        PageImage::from_dynamic(DynamicImage::ImageRgba8(RgbaImage::new(1000, 1500)))
    }

    #[test]
    fn region_flow_runs_to_download() {
        let mut flow = ClipFlow::new(&EpaperConfig::default());
        let activation = flow.select_region(&linked_region(), natural()).unwrap();
        assert_eq!(activation.navigate.as_ref().unwrap().article_id, "art-7");

        let seed = flow.start_crop().unwrap();
        assert_eq!(seed, PixelRect::new(100.0, 300.0, 500.0, 600.0));

        flow.adjust(PixelRect::new(100.0, 300.0, 200.0, 100.0)).unwrap();
        flow.adjust(PixelRect::new(900.0, 1400.0, 400.0, 400.0)).unwrap();
        assert_eq!(flow.crop_rect(), Some(PixelRect::new(900.0, 1400.0, 100.0, 100.0)));

        let clip = flow.download(&image(), &page()).unwrap();
        assert_eq!(clip.filename, "epaper-clip-2024-01-01-p2.png");
        assert_eq!((clip.width, clip.height), (100, 100));
        assert_eq!(
            flow.state(),
            &ClipState::Downloaded {
                filename: "epaper-clip-2024-01-01-p2.png".into()
            }
        );

        flow.reset();
        assert_eq!(flow.state(), &ClipState::Idle);
    }

    #[test]
    fn free_crop_uses_reader_box() {
        let mut flow = ClipFlow::new(&EpaperConfig::default());
        let rect = flow.open_free_crop(natural()).unwrap();
        assert_eq!(rect, PixelRect::new(100.0, 150.0, 800.0, 1200.0));
        assert!(matches!(flow.state(), ClipState::Cropping { region_id: None, .. }));
    }

    #[test]
    fn cancel_clears_everything() {
        let mut flow = ClipFlow::new(&EpaperConfig::default());
        flow.select_region(&linked_region(), natural()).unwrap();
        flow.start_crop().unwrap();
        flow.cancel();
        assert_eq!(flow.state(), &ClipState::Cancelled);
        assert_eq!(flow.crop_rect(), None);
        assert!(flow.adjust(PixelRect::new(0.0, 0.0, 10.0, 10.0)).is_err());
        assert!(flow.download(&image(), &page()).is_err());

        // A new selection starts fresh from a finished flow.
        flow.select_region(&linked_region(), natural()).unwrap();
        assert_eq!(flow.start_crop().unwrap(), PixelRect::new(100.0, 300.0, 500.0, 600.0));
    }

    #[test]
    fn late_export_after_restart_is_rejected() {
        let mut flow = ClipFlow::new(&EpaperConfig::default());
        flow.open_free_crop(natural()).unwrap();
        let job = flow.begin_export().unwrap();
        let output = export_clip(&image(), job.rect, &page(), "epaper-clip").unwrap();

        flow.cancel();
        flow.open_free_crop(natural()).unwrap();
        let err = flow.complete_export(job, output).unwrap_err();
        assert!(matches!(err, EpaperError::InvalidClipState(_)));
        assert!(flow.crop_rect().is_some());
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let mut flow = ClipFlow::new(&EpaperConfig::default());
        assert!(matches!(flow.start_crop(), Err(EpaperError::InvalidClipState(_))));
        assert!(flow.begin_export().is_err());

        flow.open_free_crop(natural()).unwrap();
        assert!(flow.select_region(&linked_region(), natural()).is_err());
        assert!(flow.open_free_crop(natural()).is_err());
    }

    #[test]
    fn crop_waits_for_image_dimensions() {
        let mut flow = ClipFlow::new(&EpaperConfig::default());
        let unloaded = ImageSize::new(0.0, 0.0);

        let err = flow.open_free_crop(unloaded).unwrap_err();
        assert!(matches!(err, EpaperError::InvalidImageDimensions { .. }));
        let err = flow.select_region(&linked_region(), unloaded).unwrap_err();
        assert!(matches!(err, EpaperError::InvalidImageDimensions { .. }));
        assert_eq!(flow.state(), &ClipState::Idle);
        assert_eq!(flow.generation(), 0);
    }

    #[test]
    fn non_finite_adjustment_keeps_current_crop() {
        let mut flow = ClipFlow::new(&EpaperConfig::default());
        let opened = flow.open_free_crop(natural()).unwrap();

        let err = flow
            .adjust(PixelRect::new(f64::NAN, 0.0, 10.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, EpaperError::InvalidRegion(_)));
        assert_eq!(flow.crop_rect(), Some(opened));
    }
}
