use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::ConvertError;
use crate::rasterizer::RasterPage;

/// A rendered page wider than this aspect ratio (width / height) is treated
/// as a two-page spread and split down the middle.
pub const SPREAD_ASPECT_THRESHOLD: f64 = 1.2;

/// One page as it will appear in the flipbook, after spread detection.
#[derive(Debug, Clone)]
pub struct EmittedPage {
    /// 1-based position in the final flipbook, sequential with no gaps.
    pub page_number: u32,
    /// Filename within the document's pages directory, e.g. `page-003.jpg`.
    pub file: String,
    pub width: u32,
    pub height: u32,
    /// JPEG-encoded image bytes.
    pub data: Vec<u8>,
}

/// Turns rasterized PDF pages into flipbook pages, splitting wide spreads
/// into left and right halves. The first rendered page is the cover and is
/// never split, whatever its aspect ratio.
pub struct SpreadSplitter;

impl SpreadSplitter {
    pub fn new() -> Self {
        Self
    }

    pub fn split_all(&self, rasters: &[RasterPage]) -> Result<Vec<EmittedPage>, ConvertError> {
        let _span = tracing::info_span!("splitter.split_all", rasters = rasters.len()).entered();

        let mut pages = Vec::with_capacity(rasters.len());
        let mut ordinal: u32 = 0;

        for raster in rasters {
            let img = image::open(&raster.path).map_err(|e| ConvertError::ImageDecode {
                path: raster.path.clone(),
                reason: e.to_string(),
            })?;

            let is_cover = raster.pdf_page == 1;
            if !is_cover && is_spread(img.width(), img.height()) {
                let (left, right) = split_spread(&img);
                ordinal += 1;
                pages.push(encode_page(&left, ordinal)?);
                ordinal += 1;
                pages.push(encode_page(&right, ordinal)?);
            } else {
                ordinal += 1;
                pages.push(encode_page(&img, ordinal)?);
            }
        }

        tracing::debug!(
            "Split {} rasters into {} pages",
            rasters.len(),
            pages.len()
        );
        Ok(pages)
    }
}

impl Default for SpreadSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-height images get aspect 1 rather than dividing by zero, so they
/// pass through unsplit.
fn is_spread(width: u32, height: u32) -> bool {
    if height == 0 {
        return false;
    }
    width as f64 / height as f64 > SPREAD_ASPECT_THRESHOLD
}

/// Left half gets floor(width / 2) columns, right half the remainder, so an
/// odd-width spread loses no column.
fn split_spread(img: &DynamicImage) -> (DynamicImage, DynamicImage) {
    let (w, h) = (img.width(), img.height());
    let half = w / 2;
    let left = img.crop_imm(0, 0, half, h);
    let right = img.crop_imm(half, 0, w - half, h);
    (left, right)
}

fn encode_page(img: &DynamicImage, ordinal: u32) -> Result<EmittedPage, ConvertError> {
    let mut data = Vec::new();
    img.write_to(&mut Cursor::new(&mut data), ImageFormat::Jpeg)
        .map_err(|e| ConvertError::ImageEncode(e.to_string()))?;

    Ok(EmittedPage {
        page_number: ordinal,
        file: format!("page-{:03}.jpg", ordinal),
        width: img.width(),
        height: img.height(),
        data,
    })
}
