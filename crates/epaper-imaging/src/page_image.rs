// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page image: a decoded scan of one e-paper page. Crops clips at natural
// resolution, encodes PNG output and draws region outlines using the `image`
// and `imageproc` crates.

use image::{DynamicImage, ImageFormat, Rgba};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, info, instrument};

use epaper_core::error::{EpaperError, Result};
use epaper_core::geometry::{ImageSize, PixelRect};
use epaper_core::region::to_display_rect;
use epaper_core::types::Region;

/// Outline colour used for region previews (newsroom red).
const OUTLINE_COLOR: Rgba<u8> = Rgba([220, 38, 38, 255]);

/// A decoded page image.
///
/// Operations are non-destructive: `crop` and `with_region_outlines` return a
/// new `PageImage` and leave `self` untouched.
#[derive(Debug, Clone)]
pub struct PageImage {
    image: DynamicImage,
}

impl PageImage {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            EpaperError::Image(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Page image loaded");
        Ok(Self { image: img })
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| EpaperError::Image(format!("failed to decode image: {err}")))?;
        debug!(width = img.width(), height = img.height(), "Page image decoded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Intrinsic pixel dimensions, independent of how the page is rendered.
    pub fn natural_size(&self) -> ImageSize {
        ImageSize::from_pixels(self.image.width(), self.image.height())
    }

    /// Natural image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Natural image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the decoded raster.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the page image and return the raster.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations --------------------------------------------------------

    /// Cut `rect` (natural pixels) out of the page.
    ///
    /// The rectangle is rounded outward to whole pixels and clipped to the
    /// image. A rectangle with no pixels left after clipping is `EmptyCrop`.
    #[instrument(skip(self), fields(x = rect.x, y = rect.y, width = rect.width, height = rect.height))]
    pub fn crop(&self, rect: PixelRect) -> Result<Self> {
        let (x, y, width, height) = rect.to_crop_bounds(self.natural_size());
        if width == 0 || height == 0 {
            return Err(EpaperError::EmptyCrop);
        }
        info!(x, y, width, height, "Cropping page image");
        Ok(Self {
            image: self.image.crop_imm(x, y, width, height),
        })
    }

    /// A copy of the page with every region outlined.
    ///
    /// Zero-area regions are drawn as one-pixel marks so they stay visible.
    pub fn with_region_outlines(&self, regions: &[Region]) -> Self {
        let natural = self.natural_size();
        let mut canvas = self.image.to_rgba8();
        for region in regions {
            let (x, y, width, height) = to_display_rect(region, natural).to_crop_bounds(natural);
            if x >= canvas.width() || y >= canvas.height() {
                continue;
            }
            let outline = Rect::at(x as i32, y as i32).of_size(width.max(1), height.max(1));
            draw_hollow_rect_mut(&mut canvas, outline, OUTLINE_COLOR);
        }
        debug!(count = regions.len(), "Region outlines drawn");
        Self {
            image: DynamicImage::ImageRgba8(canvas),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| EpaperError::Image(format!("image encoding failed: {err}")))?;
    Ok(buffer)
}
