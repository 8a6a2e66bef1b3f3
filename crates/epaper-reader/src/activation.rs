// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// What a reader can do with a clicked region.

use tracing::debug;

use epaper_core::geometry::{ImageSize, PixelRect};
use epaper_core::region::to_display_rect;
use epaper_core::types::{Region, RegionId};

/// Open the linked article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub article_id: String,
}

impl NavigationIntent {
    /// Route of the article page.
    pub fn path(&self) -> String {
        format!("/article/{}", self.article_id)
    }
}

/// Open the clip flow seeded with a rectangle in natural pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CropIntent {
    /// Region the seed came from; `None` for a free crop.
    pub region_id: Option<RegionId>,
    pub seed: PixelRect,
}

/// Choices offered when a reader activates a region.
///
/// Clipping is always offered, whether or not the region links an article.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub label: String,
    pub navigate: Option<NavigationIntent>,
    pub crop: CropIntent,
}

/// Resolve the intents for `region` on an image of `natural` size.
///
/// The crop seed is the region in natural pixels so the clip is exported at
/// full resolution. It is kept inside the image.
pub fn activate_region(region: &Region, natural: ImageSize) -> Activation {
    let navigate = region
        .article_id
        .as_ref()
        .map(|article_id| NavigationIntent {
            article_id: article_id.clone(),
        });
    let seed = to_display_rect(region, natural).clamp_to(natural);
    debug!(region = %region.id, linked = navigate.is_some(), "Region activated");
    Activation {
        label: region.label().to_owned(),
        navigate,
        crop: CropIntent {
            region_id: Some(region.id.clone()),
            seed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epaper_core::region::NormalizedRect;

    fn rect(x: f64, y: f64, width: f64, height: f64) -> NormalizedRect {
        NormalizedRect {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn linked_region_offers_navigation_and_crop() {
        let region = Region::new(rect(10.0, 20.0, 50.0, 25.0), Some("art-7".into()), "Budget".into());
        let activation = activate_region(&region, ImageSize::new(2000.0, 3000.0));

        let navigate = activation.navigate.unwrap();
        assert_eq!(navigate.article_id, "art-7");
        assert_eq!(navigate.path(), "/article/art-7");
        assert_eq!(activation.crop.region_id, Some(region.id.clone()));
        assert_eq!(activation.crop.seed, PixelRect::new(200.0, 600.0, 1000.0, 750.0));
        assert_eq!(activation.label, "Budget");
    }

    #[test]
    fn manual_region_still_offers_crop() {
        let region = Region::new(rect(0.0, 0.0, 50.0, 50.0), None, String::new());
        let activation = activate_region(&region, ImageSize::new(100.0, 100.0));
        assert!(activation.navigate.is_none());
        assert_eq!(activation.crop.seed, PixelRect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(activation.label, "Story Detail");
    }

    #[test]
    fn overscanned_region_seed_stays_inside_image() {
        let region = Region::new(rect(90.0, 90.0, 20.0, 20.0), None, "edge".into());
        let activation = activate_region(&region, ImageSize::new(100.0, 200.0));
        assert_eq!(activation.crop.seed, PixelRect::new(90.0, 180.0, 10.0, 20.0));
    }
}
