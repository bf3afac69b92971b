//! Image → PDF packing: one full-bleed page per page image.
//!
//! Each page is sized to its image at the configured DPI, so a page comes
//! back at its original physical size with no margins, the way a flatbed scan
//! would. Pages whose render hit `max_rendered_pixels` come back
//! proportionally smaller. Built with `printpdf`'s data-oriented API:
//! decode → `RawImage` → `Op::UseXobject` → `PdfPage`.

use crate::config::RescanConfig;
use crate::error::RescanError;
use crate::paths;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pack page images into `scan_<stem>.pdf` next to `original_pdf`.
///
/// The images are re-sorted by the number in their file stem before packing;
/// the order of `image_paths` is not relied on.
///
/// # Returns
/// - `Ok(Some(path))` — the scan PDF was written
/// - `Ok(None)` — `image_paths` was empty; nothing was written
pub async fn create_pdf_from_images(
    image_paths: Vec<PathBuf>,
    original_pdf: &Path,
    config: &RescanConfig,
) -> Result<Option<PathBuf>, RescanError> {
    if image_paths.is_empty() {
        info!("No images found to create a new PDF");
        return Ok(None);
    }

    let ordered = paths::sort_by_page_number(image_paths)?;
    let out_path = paths::scan_pdf_path_for(original_pdf);
    config.overwrite.check(&out_path)?;

    info!(
        "Creating new PDF from {} images: '{}'…",
        ordered.len(),
        out_path.display()
    );

    let title = out_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dpi = config.dpi;

    let bytes = tokio::task::spawn_blocking(move || build_pdf(&ordered, &title, dpi))
        .await
        .map_err(|e| RescanError::Internal(format!("Assemble task panicked: {}", e)))??;

    write_atomic(&out_path, &bytes).await?;

    info!(
        "New PDF created: '{}' ({} bytes)",
        out_path.display(),
        bytes.len()
    );
    Ok(Some(out_path))
}

/// Build the PDF bytes, one page per image, in the given order.
fn build_pdf(images: &[PathBuf], title: &str, dpi: u32) -> Result<Vec<u8>, RescanError> {
    let mut doc = PdfDocument::new(title);
    let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());
    let dpi = dpi as f32;

    for path in images {
        let decoded = ::image::open(path).map_err(|e| RescanError::ImageReadFailed {
            path: path.clone(),
            detail: e.to_string(),
        })?;

        let width = decoded.width() as usize;
        let height = decoded.height() as usize;
        let raw = RawImage {
            pixels: RawImageData::U8(decoded.to_rgb8().into_raw()),
            width,
            height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let (page_w, page_h) = page_size_mm(width, height, dpi);
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(dpi),
                rotate: None,
            },
        }];

        debug!(
            "Page from {} → {:.1}×{:.1} mm",
            path.display(),
            page_w.0,
            page_h.0
        );
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        warn!("printpdf reported {} warnings while saving", warnings.len());
    }

    Ok(output)
}

/// Physical page size of a `width × height` px image at `dpi`.
fn page_size_mm(width: usize, height: usize, dpi: f32) -> (Mm, Mm) {
    let to_mm = |px: usize| Mm(px as f32 / dpi * 25.4);
    (to_mm(width), to_mm(height))
}

/// Write to a temp file beside `path`, then rename over it, so a crash never
/// leaves a truncated PDF under the final name.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RescanError> {
    let write_err = |e| RescanError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}
