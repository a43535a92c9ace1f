use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ConvertError;
use crate::sanitize::redact_path;

/// Render resolution for page images. Fixed; there is no per-document
/// quality knob.
pub const RASTER_DPI: u32 = 150;

/// One rendered page, in PDF order.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-based position in the source PDF.
    pub pdf_page: u32,
    pub path: PathBuf,
}

/// Renders a PDF into per-page JPEG files with pdftoppm (poppler-utils).
pub struct Rasterizer;

impl Rasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Rasterizes every page of `pdf_path` into `output_dir` and returns
    /// the rendered files ordered by PDF page number. The returned list is
    /// the only record of page order downstream; nothing re-lists the
    /// directory.
    pub fn rasterize(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
    ) -> Result<Vec<RasterPage>, ConvertError> {
        let _span =
            tracing::info_span!("rasterizer.rasterize", pdf = %redact_path(pdf_path)).entered();

        let page_count = self.page_count(pdf_path)?;
        if page_count == 0 {
            return Err(ConvertError::NoPages);
        }

        let prefix = output_dir.join("raster");
        let output = Command::new("pdftoppm")
            .args(["-jpeg", "-r", &RASTER_DPI.to_string()])
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                ConvertError::Rasterize(format!(
                    "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ConvertError::Rasterize(format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let pad_width = page_count.to_string().len();
        let mut pages = Vec::with_capacity(page_count as usize);
        for pdf_page in 1..=page_count {
            let path = find_raster_output(&prefix, pdf_page, pad_width)
                .ok_or(ConvertError::MissingRaster { page: pdf_page })?;
            pages.push(RasterPage { pdf_page, path });
        }

        tracing::info!("Rasterized {} pages at {} DPI", pages.len(), RASTER_DPI);
        Ok(pages)
    }

    /// Page count via lopdf, falling back to pdfinfo when lopdf can't parse
    /// the PDF structure.
    pub fn page_count(&self, pdf_path: &Path) -> Result<u32, ConvertError> {
        let pdf_bytes = std::fs::read(pdf_path).map_err(|e| ConvertError::ReadDocument {
            path: pdf_path.to_path_buf(),
            source: e,
        })?;

        match lopdf::Document::load_mem(&pdf_bytes) {
            Ok(doc) => Ok(doc.get_pages().len() as u32),
            Err(e) => {
                tracing::warn!(
                    "lopdf failed to parse {}: {}. Falling back to pdfinfo.",
                    redact_path(pdf_path),
                    e
                );
                count_pages_with_pdfinfo(pdf_path)
            }
        }
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// pdftoppm pads the page-number suffix to the digit width of the last
/// page, so `pad_width` comes from the document's page count. Some builds
/// skip the padding; accept the bare suffix too.
fn find_raster_output(prefix: &Path, pdf_page: u32, pad_width: usize) -> Option<PathBuf> {
    let padded = PathBuf::from(format!(
        "{}-{:0width$}.jpg",
        prefix.display(),
        pdf_page,
        width = pad_width
    ));
    if padded.exists() {
        return Some(padded);
    }

    let bare = PathBuf::from(format!("{}-{}.jpg", prefix.display(), pdf_page));
    bare.exists().then_some(bare)
}

fn count_pages_with_pdfinfo(pdf_path: &Path) -> Result<u32, ConvertError> {
    let output = Command::new("pdfinfo")
        .arg(pdf_path)
        .output()
        .map_err(|e| {
            ConvertError::Rasterize(format!(
                "Failed to run pdfinfo: {}. Make sure poppler-utils is installed.",
                e
            ))
        })?;

    if !output.status.success() {
        return Err(ConvertError::Rasterize(format!(
            "pdfinfo failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if let Some(count_str) = line.strip_prefix("Pages:") {
            if let Ok(count) = count_str.trim().parse::<u32>() {
                return Ok(count);
            }
        }
    }

    Err(ConvertError::Rasterize(
        "pdfinfo output did not contain a page count".to_string(),
    ))
}
