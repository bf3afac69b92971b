//! PDF rasterisation: render every page to `<stem>_images/<n>.jpg` via pdfium.
//!
//! pdfium is CPU-bound and not async-safe, so the whole stage runs inside
//! `tokio::task::spawn_blocking`. Pages are written as they are rendered
//! rather than collected in memory first; a 300-page document at 200 DPI
//! would otherwise hold several gigabytes of bitmaps.
//!
//! The resolution is set by DPI (pdfium's native unit is 1/72 inch), with
//! `max_rendered_pixels` as a hard cap on either edge. A capped page keeps its
//! aspect ratio but has fewer pixels than the DPI alone would give.

use crate::config::RescanConfig;
use crate::error::RescanError;
use crate::paths;
use crate::progress::ProgressCallback;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything the blocking renderer needs, detached from the borrowed config.
struct RenderJob {
    pdf_path: PathBuf,
    image_dir: PathBuf,
    dpi: u32,
    max_pixels: u32,
    quality: u8,
    password: Option<String>,
    library: Option<PathBuf>,
    progress: Option<ProgressCallback>,
}

/// Rasterise every page of `pdf_path` into the sibling `<stem>_images`
/// directory, creating it once the PDF has been opened.
///
/// # Returns
/// The image paths `1.jpg … N.jpg` in page order. An empty vector means the
/// PDF has no pages.
pub async fn convert_pdf_to_images(
    pdf_path: &Path,
    config: &RescanConfig,
) -> Result<Vec<PathBuf>, RescanError> {
    let image_dir = paths::image_dir_for(pdf_path);
    config.overwrite.check(&image_dir)?;

    let job = RenderJob {
        pdf_path: pdf_path.to_path_buf(),
        image_dir,
        dpi: config.dpi,
        max_pixels: config.max_rendered_pixels,
        quality: config.jpeg_quality,
        password: config.password.clone(),
        library: config.pdfium_library_path.clone(),
        progress: config.progress_callback.clone(),
    };

    tokio::task::spawn_blocking(move || render_blocking(&job))
        .await
        .map_err(|e| RescanError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_blocking(job: &RenderJob) -> Result<Vec<PathBuf>, RescanError> {
    info!(
        "Converting '{}' to JPGs in '{}'…",
        job.pdf_path.display(),
        job.image_dir.display()
    );

    let pdfium = bind_pdfium(job.library.as_deref())?;
    let password = job.password.as_deref();

    let document = pdfium
        .load_pdf_from_file(&job.pdf_path, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    RescanError::WrongPassword {
                        path: job.pdf_path.clone(),
                    }
                } else {
                    RescanError::PasswordRequired {
                        path: job.pdf_path.clone(),
                    }
                }
            } else {
                RescanError::CorruptPdf {
                    path: job.pdf_path.clone(),
                    detail: err_str,
                }
            }
        })?;

    // A failed bind or load must leave no image directory behind.
    fs::create_dir_all(&job.image_dir).map_err(|e| RescanError::ImageDirFailed {
        path: job.image_dir.clone(),
        source: e,
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);
    if let Some(ref cb) = job.progress {
        cb.on_render_start(total_pages);
    }

    let max_pixels = i32::try_from(job.max_pixels).unwrap_or(i32::MAX);
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(job.dpi as f32 / 72.0)
        .set_maximum_width(max_pixels)
        .set_maximum_height(max_pixels);

    let mut written = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            RescanError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        let path = paths::page_image_path(&job.image_dir, page_num);
        write_jpeg(&image, &path, job.quality)?;

        debug!(
            "Rendered page {} → {}x{} px → {}",
            page_num,
            image.width(),
            image.height(),
            path.display()
        );
        if let Some(ref cb) = job.progress {
            cb.on_page_rendered(page_num, total_pages);
        }

        written.push(path);
    }

    remove_stale_pages(&job.image_dir, total_pages)?;

    info!("PDF to JPG conversion complete: {} images", written.len());
    Ok(written)
}

/// Bind pdfium from an explicit location or the system search path.
///
/// `library` may name the shared library itself or the directory holding it.
fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, RescanError> {
    let bindings = match library {
        Some(dir) if dir.is_dir() => Pdfium::bind_to_library(&dir.join(platform_library_name())),
        Some(file) => Pdfium::bind_to_library(file),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| RescanError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// File name of the pdfium shared library on this platform.
fn platform_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

/// Encode `image` as a baseline JPEG at `quality` and write it to `path`.
///
/// JPEG has no alpha channel; the image is flattened to RGB first.
pub(crate) fn write_jpeg(image: &DynamicImage, path: &Path, quality: u8) -> Result<(), RescanError> {
    let write_err = |detail: String| RescanError::ImageWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let file = File::create(path).map_err(|e| write_err(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| write_err(e.to_string()))?;
    writer.flush().map_err(|e| write_err(e.to_string()))?;
    Ok(())
}

/// Delete `k.jpg` for every `k > page_count` left over from an earlier run
/// of a longer document, so the directory holds exactly `1.jpg … N.jpg`.
///
/// Files that are not numbered page images are left alone.
pub(crate) fn remove_stale_pages(image_dir: &Path, page_count: usize) -> Result<(), RescanError> {
    let dir_err = |e: std::io::Error| RescanError::ImageDirFailed {
        path: image_dir.to_path_buf(),
        source: e,
    };

    for entry in fs::read_dir(image_dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        let is_page_image = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(paths::IMAGE_EXTENSION));
        if !is_page_image {
            continue;
        }
        if let Some(n) = paths::page_number_of(&path) {
            if n > page_count || n == 0 {
                warn!("Removing stale page image {}", path.display());
                fs::remove_file(&path).map_err(dir_err)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn write_jpeg_produces_decodable_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 24, Rgba([0, 0, 255, 128])));

        write_jpeg(&img, &path, 90).expect("write should succeed");

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (16, 24));
    }

    #[test]
    fn write_jpeg_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("1.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        let err = write_jpeg(&img, &path, 75).unwrap_err();
        assert!(matches!(err, RescanError::ImageWriteFailed { .. }));
    }

    #[test]
    fn stale_pages_beyond_count_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["1.jpg", "2.jpg", "3.jpg", "12.jpg", "notes.txt", "cover.jpg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        remove_stale_pages(dir.path(), 2).unwrap();

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["1.jpg", "2.jpg", "cover.jpg", "notes.txt"]);
    }

    #[test]
    fn platform_library_name_is_a_shared_library() {
        let name = platform_library_name();
        assert!(name.contains("pdfium"));
    }

    #[test]
    fn binding_missing_library_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(platform_library_name());
        let err = bind_pdfium(Some(missing.as_path())).err().expect("bind should fail");
        assert!(matches!(err, RescanError::PdfiumBindingFailed(_)));
    }
}
